// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The main screen: one file selection, one button, one download at a time.
//!
//! [`MainScreen`] wires the state machine, the renderer, the monitor and the
//! notifier together. The host feeds it three kinds of input, each handled
//! to completion before the next:
//! - taps ([`MainScreen::on_tap`])
//! - change signals from the monitor's queue ([`MainScreen::on_signal`])
//! - frame ticks ([`MainScreen::on_frame`])

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Instant;

use crate::button::{AnimatedRenderer, ButtonStateMachine, Frame, TextMeasurer};
use crate::config::AppConfig;
use crate::detail::DetailView;
use crate::download::{
    ChangeSignal, DownloadCompleted, DownloadMonitor, DownloadSubsystem, MonitorError, PollOutcome,
    RequestId,
};
use crate::notify::{build_completion_notification, Notifier};

/// Transient message shown for a tap without a selection.
pub const NO_SELECTION_MESSAGE: &str = "Please select the file to download";

#[derive(Debug)]
pub enum ScreenError {
    /// Tap with nothing selected
    NoSelection,
    /// Selection names no catalogue entry
    UnknownFile(String),
    /// The download could not be submitted
    Monitor(MonitorError),
}

impl fmt::Display for ScreenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScreenError::NoSelection => write!(f, "{}", NO_SELECTION_MESSAGE),
            ScreenError::UnknownFile(key) => write!(f, "unknown file: {}", key),
            ScreenError::Monitor(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ScreenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScreenError::Monitor(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MonitorError> for ScreenError {
    fn from(e: MonitorError) -> Self {
        ScreenError::Monitor(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    /// A new download was submitted
    Started(RequestId),
    /// The button is busy; nothing happened
    Ignored,
}

pub struct MainScreen<S: DownloadSubsystem, N: Notifier> {
    config: AppConfig,
    machine: Rc<RefCell<ButtonStateMachine>>,
    renderer: AnimatedRenderer,
    monitor: DownloadMonitor<S>,
    notifier: N,
    last_completed: Option<DownloadCompleted>,
}

impl<S: DownloadSubsystem, N: Notifier> MainScreen<S, N> {
    pub fn new(
        config: AppConfig,
        subsystem: S,
        notifier: N,
        measurer: Box<dyn TextMeasurer>,
    ) -> Self {
        let machine = Rc::new(RefCell::new(ButtonStateMachine::new()));
        let renderer = AnimatedRenderer::new(
            Rc::clone(&machine),
            config.button.style(),
            config.button.cycle(),
            measurer,
        );
        let monitor = DownloadMonitor::new(subsystem, Rc::clone(&machine));
        Self {
            config,
            machine,
            renderer,
            monitor,
            notifier,
            last_completed: None,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn machine(&self) -> &Rc<RefCell<ButtonStateMachine>> {
        &self.machine
    }

    pub fn monitor(&self) -> &DownloadMonitor<S> {
        &self.monitor
    }

    pub fn monitor_mut(&mut self) -> &mut DownloadMonitor<S> {
        &mut self.monitor
    }

    pub fn renderer(&self) -> &AnimatedRenderer {
        &self.renderer
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Event of the most recent finished download.
    pub fn last_completed(&self) -> Option<&DownloadCompleted> {
        self.last_completed.as_ref()
    }

    /// Handle a button tap with the current file selection.
    pub fn on_tap(&mut self, selection: Option<&str>) -> Result<TapOutcome, ScreenError> {
        if let Err(rejected) = self.machine.borrow().check_tap() {
            tracing::debug!(%rejected, "Tap rejected");
            return Ok(TapOutcome::Ignored);
        }

        let key = match selection.map(str::trim) {
            Some(key) if !key.is_empty() => key,
            _ => return Err(ScreenError::NoSelection),
        };
        let option = self
            .config
            .find_file(key)
            .ok_or_else(|| ScreenError::UnknownFile(key.to_string()))?;
        let request = self.config.request.request_for(option);

        self.notifier.cancel_all();
        let id = self.monitor.start(request)?;
        Ok(TapOutcome::Started(id))
    }

    /// Handle one change signal. A finished download is announced through
    /// the notifier.
    pub fn on_signal(&mut self, signal: ChangeSignal) -> PollOutcome {
        let outcome = self.monitor.on_change(signal);
        if let PollOutcome::Completed(event) = &outcome {
            self.announce(event);
        }
        outcome
    }

    /// Handle every change signal already queued.
    pub fn pump(&mut self) -> Vec<PollOutcome> {
        let outcomes = self.monitor.drain();
        for outcome in &outcomes {
            if let PollOutcome::Completed(event) = outcome {
                self.announce(event);
            }
        }
        outcomes
    }

    fn announce(&mut self, event: &DownloadCompleted) {
        let notification = build_completion_notification(event, &self.config.notification);
        if let Err(e) = self.notifier.notify(notification) {
            tracing::warn!(error = %e, "Failed to deliver notification");
        }
        self.last_completed = Some(event.clone());
    }

    /// Detail view for the most recent finished download.
    pub fn detail(&self) -> DetailView {
        match &self.last_completed {
            Some(event) => DetailView::new(Some(&event.file_label), Some(event.status.status_text())),
            None => DetailView::new(None, None),
        }
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.renderer.resize(width, height);
    }

    /// Frame for the display refresh at `now`.
    pub fn on_frame(&mut self, now: Instant) -> Frame {
        self.renderer.render(now)
    }

    /// Release the subsystem observer. The session itself is left to finish.
    pub fn teardown(&mut self) {
        self.monitor.teardown();
    }
}
