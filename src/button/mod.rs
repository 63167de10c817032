// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Animated download button.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────┐ transition ┌──────────────────┐
//! │ DownloadMonitor    │───────────▶│ ButtonState-     │
//! │ (writer)           │            │ Machine          │
//! └────────────────────┘            └────────┬─────────┘
//!                                            │ listener (effects)
//!                                            ▼
//! ┌────────────────────┐   sample   ┌──────────────────┐
//! │ AnimatedRenderer   │◀──────────▶│ AnimationClock   │
//! │ (reader)           │            │                  │
//! └─────────┬──────────┘            └──────────────────┘
//!           │ Frame
//!           ▼
//!   terminal::rasterize
//! ```

pub mod clock;
pub mod renderer;
pub mod state;
pub mod terminal;

pub use clock::{AnimationClock, AnimationFrame, DEFAULT_CYCLE};
pub use renderer::{
    AnimatedRenderer, ButtonStyle, DrawCommand, FixedAdvanceMeasurer, Frame, RectF, TextMeasurer,
    TextSize,
};
pub use state::{ButtonState, ButtonStateMachine, Effect, ListenerId, TapRejected, Transition};
