// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Completion notifications.
//!
//! A finished download is announced with a [`Notification`] whose action
//! opens the detail view for the file. Delivery goes through the
//! [`Notifier`] trait; [`TerminalNotifier`] prints a boxed message.

use std::io::Write;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::colors::{boxed_message, CYAN, RED};
use crate::download::{DownloadCompleted, DownloadStatus};

/// Identifier shared by every completion notification; a newer one replaces
/// the older.
pub const NOTIFICATION_ID: u32 = 0;

/// Small glyphs used by notifications and the detail view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IconRef {
    CloudDownload,
    CheckCircleOutline,
    Error,
}

impl IconRef {
    pub fn glyph(&self) -> &'static str {
        match self {
            IconRef::CloudDownload => "⇩",
            IconRef::CheckCircleOutline => "✔",
            IconRef::Error => "✖",
        }
    }
}

/// What the notification action opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailTarget {
    pub file_label: String,
    pub status_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: u32,
    pub title: String,
    pub body_text: String,
    pub small_icon: IconRef,
    pub action_label: String,
    pub action_target: DetailTarget,
}

/// Title and action label of completion notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub title: String,
    pub action_label: String,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            title: "LoadApp".to_string(),
            action_label: "See detail".to_string(),
        }
    }
}

pub fn build_completion_notification(
    event: &DownloadCompleted,
    settings: &NotificationSettings,
) -> Notification {
    Notification {
        id: NOTIFICATION_ID,
        title: settings.title.clone(),
        body_text: format!("Download complete for {}", event.file_label),
        small_icon: IconRef::CloudDownload,
        action_label: settings.action_label.clone(),
        action_target: DetailTarget {
            file_label: event.file_label.clone(),
            status_text: event.status.status_text().to_string(),
        },
    }
}

/// Notification delivery.
pub trait Notifier {
    fn notify(&mut self, notification: Notification) -> Result<()>;

    /// Withdraw every notification still showing.
    fn cancel_all(&mut self);
}

/// Prints notifications as boxed messages and remembers the ones still
/// pending.
pub struct TerminalNotifier<W: Write> {
    out: W,
    pending: Vec<Notification>,
}

impl TerminalNotifier<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> TerminalNotifier<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            pending: Vec::new(),
        }
    }

    pub fn pending(&self) -> &[Notification] {
        &self.pending
    }

    pub fn writer(&self) -> &W {
        &self.out
    }
}

fn border_for(status_text: &str) -> &'static str {
    match DownloadStatus::from_status_text(status_text) {
        Some(DownloadStatus::Failed) => RED,
        _ => CYAN,
    }
}

impl<W: Write> Notifier for TerminalNotifier<W> {
    fn notify(&mut self, notification: Notification) -> Result<()> {
        let lines = vec![
            notification.body_text.clone(),
            String::new(),
            format!(
                "[{}] {}",
                notification.action_label, notification.action_target.file_label
            ),
        ];
        let title = format!("{} {}", notification.small_icon.glyph(), notification.title);
        let border = border_for(&notification.action_target.status_text);
        writeln!(self.out, "\n{}", boxed_message(&title, &lines, border))
            .context("Failed to write notification")?;
        self.out.flush().context("Failed to write notification")?;

        tracing::debug!(id = notification.id, body = %notification.body_text, "Notification delivered");
        self.pending.retain(|n| n.id != notification.id);
        self.pending.push(notification);
        Ok(())
    }

    fn cancel_all(&mut self) {
        if !self.pending.is_empty() {
            tracing::debug!(count = self.pending.len(), "Cancelling notifications");
        }
        self.pending.clear();
    }
}
