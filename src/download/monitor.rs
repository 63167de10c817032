// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Download monitor: owns the single download session.
//!
//! Subsystem callbacks never touch the session or the button directly. They
//! push a [`ChangeSignal`] onto the monitor's queue, and the host drains the
//! queue on its own task through [`DownloadMonitor::next_signal`] or
//! [`DownloadMonitor::drain`], one [`DownloadMonitor::on_change`] at a time.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;

use super::subsystem::{ChangeCallback, DownloadSubsystem};
use super::types::{DownloadCompleted, DownloadRequest, DownloadStatus, ObserverHandle, RequestId};
use crate::button::{ButtonState, ButtonStateMachine};

/// A change notification, tagged with the request it was registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeSignal {
    pub request_id: RequestId,
}

/// Bookkeeping for the outstanding download.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadSession {
    pub request_id: Option<RequestId>,
    pub file_label: String,
    pub observer: Option<ObserverHandle>,
}

impl DownloadSession {
    pub fn is_active(&self) -> bool {
        self.request_id.is_some()
    }
}

/// Result of handling one change signal.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// No session, or the signal belongs to an earlier session
    Stale,
    /// The subsystem has no row for the request yet
    NotFound,
    /// Request is queued or running; the button shows progress
    Progressed(DownloadStatus),
    /// Status carries no state change (paused, unclassified)
    Unchanged(DownloadStatus),
    /// Terminal status reached; the session is gone
    Completed(DownloadCompleted),
}

#[derive(Debug)]
pub enum MonitorError {
    /// The subsystem refused the request
    Submit { url: String, source: anyhow::Error },
}

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorError::Submit { url, source } => {
                write!(f, "download subsystem rejected {}: {}", url, source)
            }
        }
    }
}

impl std::error::Error for MonitorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MonitorError::Submit { source, .. } => Some(&**source),
        }
    }
}

pub struct DownloadMonitor<S: DownloadSubsystem> {
    subsystem: S,
    machine: Rc<RefCell<ButtonStateMachine>>,
    session: DownloadSession,
    signal_tx: mpsc::UnboundedSender<ChangeSignal>,
    signal_rx: mpsc::UnboundedReceiver<ChangeSignal>,
}

impl<S: DownloadSubsystem> DownloadMonitor<S> {
    pub fn new(subsystem: S, machine: Rc<RefCell<ButtonStateMachine>>) -> Self {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        Self {
            subsystem,
            machine,
            session: DownloadSession::default(),
            signal_tx,
            signal_rx,
        }
    }

    pub fn subsystem(&self) -> &S {
        &self.subsystem
    }

    pub fn session(&self) -> &DownloadSession {
        &self.session
    }

    pub fn is_active(&self) -> bool {
        self.session.is_active()
    }

    /// Submit `request`, replacing any active session.
    ///
    /// The request title becomes the session's file label. On success the
    /// button moves to `Clicked`.
    pub fn start(&mut self, request: DownloadRequest) -> Result<RequestId, MonitorError> {
        let replaced = self.cancel_session();

        let id = match self.subsystem.enqueue(&request) {
            Ok(id) => id,
            Err(source) => {
                tracing::warn!(url = %request.url, error = %source, "Download request rejected");
                if replaced {
                    self.machine.borrow_mut().transition(ButtonState::Idle);
                }
                return Err(MonitorError::Submit {
                    url: request.url,
                    source,
                });
            }
        };

        let tx = self.signal_tx.clone();
        let callback: ChangeCallback = Arc::new(move || {
            // The receiver lives as long as the monitor.
            let _ = tx.send(ChangeSignal { request_id: id });
        });
        let observer = self.subsystem.register_observer(callback);

        self.session = DownloadSession {
            request_id: Some(id),
            file_label: request.title.clone(),
            observer: Some(observer),
        };
        tracing::info!(request = %id, url = %request.url, "Download started");

        self.machine.borrow_mut().transition(ButtonState::Clicked);
        Ok(id)
    }

    /// Cancel the active session at the subsystem, if any, and reset the
    /// button. Returns whether a session was active.
    pub fn cancel(&mut self) -> bool {
        let cancelled = self.cancel_session();
        if cancelled {
            self.machine.borrow_mut().transition(ButtonState::Idle);
        }
        cancelled
    }

    fn cancel_session(&mut self) -> bool {
        let Some(id) = self.session.request_id else {
            return false;
        };
        let removed = self.subsystem.remove(id);
        self.release_observer();
        self.session = DownloadSession::default();
        tracing::warn!(request = %id, removed, "Number of downloads cancelled");
        true
    }

    fn release_observer(&mut self) {
        if let Some(observer) = self.session.observer.take() {
            self.subsystem.unregister_observer(observer);
        }
    }

    /// Poll the subsystem for the session's request and update the button.
    pub fn on_change(&mut self, signal: ChangeSignal) -> PollOutcome {
        let Some(current) = self.session.request_id else {
            return PollOutcome::Stale;
        };
        if signal.request_id != current {
            tracing::debug!(signal = %signal.request_id, current = %current, "Ignoring stale change signal");
            return PollOutcome::Stale;
        }

        let Some(status) = self.subsystem.query(current) else {
            tracing::debug!(request = %current, "Download not indexed yet");
            return PollOutcome::NotFound;
        };

        match status {
            DownloadStatus::Running | DownloadStatus::Pending => {
                tracing::debug!(request = %current, %status, "Download in progress");
                self.machine.borrow_mut().transition(ButtonState::InProgress);
                PollOutcome::Progressed(status)
            }
            DownloadStatus::Paused | DownloadStatus::Unknown => {
                tracing::debug!(request = %current, %status, "Download status unchanged");
                PollOutcome::Unchanged(status)
            }
            DownloadStatus::Succeeded | DownloadStatus::Failed => {
                self.machine.borrow_mut().transition(ButtonState::Completed);
                self.release_observer();
                let session = std::mem::take(&mut self.session);
                tracing::info!(request = %current, %status, "Download finished");
                PollOutcome::Completed(DownloadCompleted {
                    request_id: current,
                    status,
                    file_label: session.file_label,
                    completed_at: Utc::now(),
                })
            }
        }
    }

    /// Wait for the next change signal.
    pub async fn next_signal(&mut self) -> Option<ChangeSignal> {
        self.signal_rx.recv().await
    }

    /// Handle every queued signal without waiting.
    pub fn drain(&mut self) -> Vec<PollOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(signal) = self.signal_rx.try_recv() {
            outcomes.push(self.on_change(signal));
        }
        outcomes
    }

    /// Deregister the observer. Safe to call repeatedly and without a session.
    pub fn teardown(&mut self) {
        self.release_observer();
    }
}

impl<S: DownloadSubsystem> Drop for DownloadMonitor<S> {
    fn drop(&mut self) {
        self.teardown();
    }
}
