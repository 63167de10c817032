// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Read-only detail view opened from a completion notification.

use colored::Colorize;

use crate::colors::{Rgb, FAILURE, SUCCESS};
use crate::download::DownloadStatus;
use crate::notify::{DetailTarget, IconRef};

/// Shown for any field the view was opened without.
pub const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailAction {
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailView {
    file_label: String,
    status_text: String,
}

fn or_unknown(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => UNKNOWN.to_string(),
    }
}

impl DetailView {
    /// Blank values count as missing.
    pub fn new(file_label: Option<&str>, status_text: Option<&str>) -> Self {
        Self {
            file_label: or_unknown(file_label),
            status_text: or_unknown(status_text),
        }
    }

    pub fn from_target(target: &DetailTarget) -> Self {
        Self::new(Some(&target.file_label), Some(&target.status_text))
    }

    pub fn file_label(&self) -> &str {
        &self.file_label
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn status(&self) -> Option<DownloadStatus> {
        DownloadStatus::from_status_text(&self.status_text)
    }

    pub fn status_color(&self) -> Option<Rgb> {
        match self.status()? {
            DownloadStatus::Succeeded => Some(SUCCESS),
            DownloadStatus::Failed => Some(FAILURE),
            _ => None,
        }
    }

    pub fn status_icon(&self) -> Option<IconRef> {
        match self.status()? {
            DownloadStatus::Succeeded => Some(IconRef::CheckCircleOutline),
            DownloadStatus::Failed => Some(IconRef::Error),
            _ => None,
        }
    }

    /// Status text followed by its icon, if the status has one.
    fn status_label(&self) -> String {
        match self.status_icon() {
            Some(icon) => format!("{} {}", self.status_text, icon.glyph()),
            None => self.status_text.clone(),
        }
    }

    pub fn render(&self) -> String {
        let status = match self.status_color() {
            Some(c) => self.status_label().truecolor(c.r, c.g, c.b).bold().to_string(),
            None => self.status_label(),
        };
        format!(
            "{}\n  {} {}\n  {}    {}\n\n  {}",
            "Download detail".bold(),
            "File name:".dimmed(),
            self.file_label,
            "Status:".dimmed(),
            status,
            "[OK]".cyan()
        )
    }

    /// The single acknowledgement control.
    pub fn acknowledge(&self) -> DetailAction {
        DetailAction::Close
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_are_unknown() {
        let view = DetailView::new(None, None);
        assert_eq!(view.file_label(), UNKNOWN);
        assert_eq!(view.status_text(), UNKNOWN);
        assert_eq!(view.status_color(), None);
        assert_eq!(view.status_icon(), None);
        assert_eq!(view.acknowledge(), DetailAction::Close);
    }

    #[test]
    fn test_blank_label_is_unknown() {
        let view = DetailView::new(Some("  "), Some("Successful"));
        assert_eq!(view.file_label(), UNKNOWN);
    }

    #[test]
    fn test_status_palette() {
        let ok = DetailView::new(Some("Glide"), Some("Successful"));
        assert_eq!(ok.status_color(), Some(SUCCESS));
        assert_eq!(ok.status_icon(), Some(IconRef::CheckCircleOutline));
        assert_eq!(ok.status_color().map(|c| c.to_hex()).as_deref(), Some("#004349"));

        let failed = DetailView::new(Some("Glide"), Some("Failed"));
        assert_eq!(failed.status_color(), Some(FAILURE));
        assert_eq!(failed.status_icon(), Some(IconRef::Error));

        let paused = DetailView::new(Some("Glide"), Some("Paused"));
        assert_eq!(paused.status_color(), None);
    }

    #[test]
    fn test_render_shows_label_and_status_icon() {
        let view = DetailView::from_target(&DetailTarget {
            file_label: "Retrofit".to_string(),
            status_text: "Failed".to_string(),
        });
        let rendered = view.render();
        assert!(rendered.contains("Retrofit"));
        assert!(rendered.contains("Failed ✖"));

        let paused = DetailView::new(Some("Glide"), Some("Paused"));
        assert!(paused.render().contains("Paused"));
        assert!(!paused.render().contains('✖'));
    }
}
