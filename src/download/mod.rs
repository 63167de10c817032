// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Download tracking for the button.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐ enqueue/query ┌─────────────────────┐
//! │ DownloadMonitor  │──────────────▶│ DownloadSubsystem   │
//! │ (session owner)  │               │ (Http | InMemory)   │
//! └────────▲─────────┘               └──────────┬──────────┘
//!          │ ChangeSignal (mpsc)                │ observer callback
//!          └────────────────────────────────────┘ (any thread)
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use loadapp::button::ButtonStateMachine;
//! use loadapp::download::{DownloadMonitor, DownloadRequest, HttpDownloadSubsystem};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let subsystem = HttpDownloadSubsystem::new(loadapp::download::default_download_dir())?;
//! let machine = Rc::new(RefCell::new(ButtonStateMachine::new()));
//! let mut monitor = DownloadMonitor::new(subsystem, Rc::clone(&machine));
//!
//! monitor.start(DownloadRequest::new("https://example.com/a.zip", "a"))?;
//! while let Some(signal) = monitor.next_signal().await {
//!     if let loadapp::download::PollOutcome::Completed(event) = monitor.on_change(signal) {
//!         println!("{}: {}", event.file_label, event.status);
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod http;
pub mod memory;
pub mod monitor;
pub mod subsystem;
pub mod types;

pub use http::{default_download_dir, HttpDownloadSubsystem, TransferProgress};
pub use memory::InMemorySubsystem;
pub use monitor::{ChangeSignal, DownloadMonitor, DownloadSession, MonitorError, PollOutcome};
pub use subsystem::{ChangeCallback, DownloadSubsystem};
pub use types::{
    default_file_options, DownloadCompleted, DownloadRequest, DownloadStatus, FileOption,
    ObserverHandle, RequestId,
};
