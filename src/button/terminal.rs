// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Terminal host for the button: rasterizes a [`Frame`] into one row of
//! colored character cells.

use crossterm::style::{Color, Stylize};

use super::renderer::{DrawCommand, FixedAdvanceMeasurer, Frame};
use crate::colors::Rgb;

/// Width of one terminal cell in renderer pixels.
pub const CELL_WIDTH_PX: f32 = 8.0;

/// Height of the button row in renderer pixels.
pub const ROW_HEIGHT_PX: f32 = 16.0;

/// Progress arc glyphs, by filled quarter.
const ARC_GLYPHS: [char; 5] = ['○', '◔', '◑', '◕', '●'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Rgb,
    pub bg: Rgb,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Rgb::WHITE,
            bg: Rgb::BLACK,
        }
    }
}

fn to_color(rgb: Rgb) -> Color {
    Color::Rgb {
        r: rgb.r,
        g: rgb.g,
        b: rgb.b,
    }
}

/// Pixel size of a button spanning `columns` cells.
pub fn pixel_size(columns: usize) -> (f32, f32) {
    (columns as f32 * CELL_WIDTH_PX, ROW_HEIGHT_PX)
}

/// Measurer that gives every column of text one cell.
pub fn cell_measurer(text_size: f32) -> FixedAdvanceMeasurer {
    FixedAdvanceMeasurer {
        advance: CELL_WIDTH_PX / text_size.max(1.0),
    }
}

/// Glyph for an arc sweeping `sweep` degrees.
pub fn arc_glyph(sweep: f32) -> char {
    let quarter = (sweep.max(0.0) / 90.0) as usize;
    ARC_GLYPHS[quarter.min(ARC_GLYPHS.len() - 1)]
}

pub fn rasterize(frame: &Frame, columns: usize) -> Vec<Cell> {
    let mut cells = vec![Cell::default(); columns];
    let column_of = |px: f32| -> Option<usize> {
        if px < 0.0 {
            return None;
        }
        let column = (px / CELL_WIDTH_PX) as usize;
        (column < columns).then_some(column)
    };

    for command in &frame.commands {
        match command {
            DrawCommand::FillRect { rect, color } => {
                for (column, cell) in cells.iter_mut().enumerate() {
                    let center = (column as f32 + 0.5) * CELL_WIDTH_PX;
                    if center >= rect.left && center < rect.right {
                        cell.bg = *color;
                    }
                }
            }
            DrawCommand::Text { text, bounds, color, .. } => {
                let start = (bounds.left / CELL_WIDTH_PX).round() as isize;
                for (offset, ch) in text.chars().enumerate() {
                    let column = start + offset as isize;
                    if column >= 0 && (column as usize) < columns {
                        let cell = &mut cells[column as usize];
                        cell.ch = ch;
                        cell.fg = *color;
                    }
                }
            }
            DrawCommand::Arc {
                bounds,
                sweep_angle,
                color,
                ..
            } => {
                if let Some(column) = column_of(bounds.center_x()) {
                    cells[column].ch = arc_glyph(*sweep_angle);
                    cells[column].fg = *color;
                }
            }
        }
    }
    cells
}

/// Render cells as an ANSI-styled string.
pub fn paint(cells: &[Cell]) -> String {
    cells
        .iter()
        .map(|cell| {
            cell.ch
                .to_string()
                .with(to_color(cell.fg))
                .on(to_color(cell.bg))
                .to_string()
        })
        .collect()
}

/// Plain characters of a cell row, without styling.
pub fn plain(cells: &[Cell]) -> String {
    cells.iter().map(|cell| cell.ch).collect()
}
