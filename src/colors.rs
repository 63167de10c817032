// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Color definitions shared by the button renderer, the notifier and the
//! detail view.
//!
//! Two kinds of color live here:
//! - [`Rgb`] values parsed from `#RRGGBB` configuration strings, used by the
//!   draw commands the renderer produces
//! - ANSI escape constants for plain terminal output
//!
//! The status palette is fixed: successful downloads are shown in
//! [`SUCCESS`], failed downloads in [`FAILURE`].

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Reset all formatting
pub const RESET: &str = "\x1b[0m";

/// Bold text
pub const BOLD: &str = "\x1b[1m";

/// Dimmed/faint text
pub const DIM: &str = "\x1b[2m";

/// Red text (errors, failures)
pub const RED: &str = "\x1b[31m";

/// Yellow text (warnings)
pub const YELLOW: &str = "\x1b[33m";

/// Cyan text (info messages, prompts, branding)
pub const CYAN: &str = "\x1b[36m";

/// Color of a successful download status.
pub const SUCCESS: Rgb = Rgb::new(0x00, 0x43, 0x49);

/// Color of a failed download status.
pub const FAILURE: Rgb = Rgb::new(0xB0, 0x00, 0x20);

/// Box drawing characters for notification frames
pub mod box_chars {
    pub const HORIZONTAL: char = '─';
    pub const VERTICAL: char = '│';
    pub const TOP_LEFT: char = '┌';
    pub const TOP_RIGHT: char = '┐';
    pub const BOTTOM_LEFT: char = '└';
    pub const BOTTOM_RIGHT: char = '┘';
}

/// A 24-bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);
    pub const BLACK: Rgb = Rgb::new(0x00, 0x00, 0x00);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#RRGGBB` (or `RRGGBB`) string.
    pub fn from_hex(input: &str) -> Result<Self, ColorParseError> {
        let digits = input.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ColorParseError {
                input: input.to_string(),
            });
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| ColorParseError {
                input: input.to_string(),
            })
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Format as `#RRGGBB`.
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Rgb::from_hex(&raw).map_err(serde::de::Error::custom)
    }
}

/// A color string that is not `#RRGGBB`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorParseError {
    pub input: String,
}

impl fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid color {:?}, expected #RRGGBB", self.input)
    }
}

impl std::error::Error for ColorParseError {}

/// Format a boxed message (notification, warning, info)
pub fn boxed_message(title: &str, lines: &[String], border_color: &str) -> String {
    let content_width = lines
        .iter()
        .map(|l| unicode_width::UnicodeWidthStr::width(l.as_str()))
        .chain(std::iter::once(unicode_width::UnicodeWidthStr::width(title) + 2))
        .max()
        .unwrap_or(0)
        .max(40);
    let inner = content_width + 4;

    let title_fill = inner.saturating_sub(unicode_width::UnicodeWidthStr::width(title) + 3);
    let mut out = format!(
        "{}{}{} {} {}{}{}\n",
        border_color,
        box_chars::TOP_LEFT,
        box_chars::HORIZONTAL,
        title,
        box_chars::HORIZONTAL.to_string().repeat(title_fill),
        box_chars::TOP_RIGHT,
        RESET
    );
    for line in lines {
        let pad = content_width.saturating_sub(unicode_width::UnicodeWidthStr::width(line.as_str()));
        out.push_str(&format!(
            "{}{}{}  {}{}  {}{}{}\n",
            border_color,
            box_chars::VERTICAL,
            RESET,
            line,
            " ".repeat(pad),
            border_color,
            box_chars::VERTICAL,
            RESET
        ));
    }
    out.push_str(&format!(
        "{}{}{}{}{}",
        border_color,
        box_chars::BOTTOM_LEFT,
        box_chars::HORIZONTAL.to_string().repeat(inner),
        box_chars::BOTTOM_RIGHT,
        RESET
    ));
    out
}
