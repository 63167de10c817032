// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! loadapp - single-file downloader with an animated progress button
//!
//! A user picks one file from a catalogue and taps the button. The download
//! runs in a background subsystem while the button sweeps its busy fill and
//! progress arc; when the transfer finishes a notification links to a detail
//! view with the outcome.
//!
//! # Core Modules
//!
//! - [`button`] - State machine, animation clock and frame renderer
//! - [`download`] - Download subsystems and the session monitor
//! - [`screen`] - Wiring of taps, change signals and frame ticks
//! - [`notify`] - Completion notifications
//! - [`detail`] - Detail view for a finished download
//! - [`config`] - JSON configuration
//! - [`error`] - Consistent error formatting utilities

pub mod button;
pub mod colors;
pub mod config;
pub mod detail;
pub mod download;
pub mod error;
pub mod notify;
pub mod screen;
pub mod sync;

pub use button::{AnimatedRenderer, AnimationClock, ButtonState, ButtonStateMachine, Frame};
pub use config::{load_config, load_config_from, AppConfig};
pub use detail::{DetailAction, DetailView};
pub use download::{
    DownloadCompleted, DownloadMonitor, DownloadRequest, DownloadStatus, DownloadSubsystem,
    HttpDownloadSubsystem, InMemorySubsystem, PollOutcome, RequestId,
};
pub use notify::{Notification, Notifier, TerminalNotifier};
pub use screen::{MainScreen, ScreenError, TapOutcome};
