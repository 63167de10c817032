// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Download types shared by the monitor and the subsystems.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a request as reported by the download subsystem.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DownloadStatus {
    /// The subsystem reported a status it does not classify
    Unknown,
    /// Transfer in progress
    Running,
    /// Accepted, waiting to start
    Pending,
    /// Held by the subsystem (network policy, storage, ...)
    Paused,
    /// Transfer finished and the file is in place
    Succeeded,
    /// Transfer gave up
    Failed,
}

impl DownloadStatus {
    /// Returns true if no further transitions are expected for the request.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DownloadStatus::Succeeded | DownloadStatus::Failed)
    }

    /// Returns true if the transfer is queued or moving.
    pub fn is_active(&self) -> bool {
        matches!(self, DownloadStatus::Running | DownloadStatus::Pending)
    }

    /// User-facing status text, as shown in the detail view.
    pub fn status_text(&self) -> &'static str {
        match self {
            DownloadStatus::Unknown => "Unknown",
            DownloadStatus::Running => "Running",
            DownloadStatus::Pending => "Pending",
            DownloadStatus::Paused => "Paused",
            DownloadStatus::Succeeded => "Successful",
            DownloadStatus::Failed => "Failed",
        }
    }

    /// Inverse of [`status_text`](Self::status_text), case-insensitive.
    pub fn from_status_text(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "unknown" => Some(Self::Unknown),
            "running" => Some(Self::Running),
            "pending" => Some(Self::Pending),
            "paused" => Some(Self::Paused),
            "successful" | "succeeded" => Some(Self::Succeeded),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.status_text())
    }
}

/// Opaque identifier the subsystem hands out for one submitted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle for a registered change observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverHandle(pub u64);

/// A download request as submitted to the subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub url: String,
    pub title: String,
    pub description: String,
    pub allow_metered: bool,
    pub allow_roaming: bool,
    pub require_charging: bool,
}

impl DownloadRequest {
    /// Create a request with the permissive defaults (metered and roaming
    /// allowed, charging not required).
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            description: String::new(),
            allow_metered: true,
            allow_roaming: true,
            require_charging: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// File name the transfer lands under: the last URL path segment,
    /// falling back to the title.
    pub fn file_name(&self) -> String {
        let without_scheme = self
            .url
            .split_once("://")
            .map_or(self.url.as_str(), |(_, rest)| rest);
        let location = without_scheme.split(['?', '#']).next().unwrap_or_default();
        let path = location.split_once('/').map_or("", |(_, path)| path);
        let segment = path.trim_end_matches('/').rsplit('/').next().unwrap_or_default();
        if segment.is_empty() {
            self.title.clone()
        } else {
            segment.to_string()
        }
    }
}

/// One entry of the selectable file catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOption {
    /// Short key used on the command line
    pub key: String,
    /// Label shown to the user and carried into the notification
    pub label: String,
    pub url: String,
}

impl FileOption {
    pub fn new(key: impl Into<String>, label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            url: url.into(),
        }
    }
}

/// The catalogue offered when the configuration does not override it.
pub fn default_file_options() -> Vec<FileOption> {
    vec![
        FileOption::new(
            "glide",
            "Glide - Image Loading Library by BumpTech",
            "https://github.com/bumptech/glide/archive/master.zip",
        ),
        FileOption::new(
            "udacity",
            "LoadApp - Current repository by Udacity",
            "https://github.com/udacity/nd940-c3-advanced-android-programming-project-starter/archive/master.zip",
        ),
        FileOption::new(
            "retrofit",
            "Retrofit - Type-safe HTTP client for Android and Java by Square, Inc",
            "https://github.com/square/retrofit/archive/master.zip",
        ),
    ]
}

/// Terminal event emitted once per session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadCompleted {
    pub request_id: RequestId,
    pub status: DownloadStatus,
    pub file_label: String,
    pub completed_at: DateTime<Utc>,
}
