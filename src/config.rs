// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Application configuration, stored as JSON in `~/.loadapp/config.json`.
//!
//! Every field has a default, so a partial file (or none at all) is valid.
//! Colors are `#RRGGBB` strings and are validated while parsing.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::button::{ButtonStyle, DEFAULT_CYCLE};
use crate::colors::Rgb;
use crate::download::{default_file_options, DownloadRequest, FileOption};
use crate::notify::NotificationSettings;

pub const CONFIG_DIR_NAME: &str = ".loadapp";
pub const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonConfig {
    pub start_label: String,
    pub busy_label: String,
    pub idle_background: Rgb,
    pub busy_background: Rgb,
    pub text_color: Rgb,
    pub progress_color: Rgb,
    pub text_size: f32,
    /// Animation cycle length in milliseconds
    pub cycle_ms: u64,
    /// Width of the button in terminal cells
    pub columns: usize,
}

impl Default for ButtonConfig {
    fn default() -> Self {
        let style = ButtonStyle::default();
        Self {
            start_label: style.start_label,
            busy_label: style.busy_label,
            idle_background: style.idle_background,
            busy_background: style.busy_background,
            text_color: style.text_color,
            progress_color: style.progress_color,
            text_size: style.text_size,
            cycle_ms: DEFAULT_CYCLE.as_millis() as u64,
            columns: 48,
        }
    }
}

impl ButtonConfig {
    pub fn style(&self) -> ButtonStyle {
        ButtonStyle {
            start_label: self.start_label.clone(),
            busy_label: self.busy_label.clone(),
            idle_background: self.idle_background,
            busy_background: self.busy_background,
            text_color: self.text_color,
            progress_color: self.progress_color,
            text_size: self.text_size,
        }
    }

    pub fn cycle(&self) -> Duration {
        Duration::from_millis(self.cycle_ms)
    }
}

/// Flags copied into every download request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    pub description: String,
    pub allow_metered: bool,
    pub allow_roaming: bool,
    pub require_charging: bool,
    /// Target directory for HTTP downloads; the user's download directory
    /// when unset
    pub download_dir: Option<PathBuf>,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            description: "The selected file is downloading".to_string(),
            allow_metered: true,
            allow_roaming: true,
            require_charging: false,
            download_dir: None,
        }
    }
}

impl RequestConfig {
    /// Request for `option`, titled with the option's label.
    pub fn request_for(&self, option: &FileOption) -> DownloadRequest {
        DownloadRequest {
            url: option.url.clone(),
            title: option.label.clone(),
            description: self.description.clone(),
            allow_metered: self.allow_metered,
            allow_roaming: self.allow_roaming,
            require_charging: self.require_charging,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub button: ButtonConfig,
    pub request: RequestConfig,
    pub notification: NotificationSettings,
    pub files: Vec<FileOption>,
    /// Display refresh interval in milliseconds
    pub frame_interval_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            button: ButtonConfig::default(),
            request: RequestConfig::default(),
            notification: NotificationSettings::default(),
            files: default_file_options(),
            frame_interval_ms: 16,
        }
    }
}

impl AppConfig {
    /// Look up a catalogue entry by key, case-insensitively.
    pub fn find_file(&self, key: &str) -> Option<&FileOption> {
        let key = key.trim();
        self.files.iter().find(|f| f.key.eq_ignore_ascii_case(key))
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.button.cycle_ms == 0 {
            bail!("button.cycle_ms must be greater than zero");
        }
        if self.frame_interval_ms == 0 {
            bail!("frame_interval_ms must be greater than zero");
        }
        if self.button.columns == 0 {
            bail!("button.columns must be greater than zero");
        }
        for (i, file) in self.files.iter().enumerate() {
            if file.key.trim().is_empty() {
                bail!("files[{}] has an empty key", i);
            }
            if self.files[..i].iter().any(|f| f.key.eq_ignore_ascii_case(&file.key)) {
                bail!("duplicate file key: {}", file.key);
            }
        }
        Ok(())
    }
}

/// Default configuration file location.
pub fn config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

pub fn load_config() -> Result<AppConfig> {
    load_config_from(&config_path()?)
}

/// Load and validate configuration from `path`. A missing file yields the
/// defaults.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let config: AppConfig = if path.exists() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file: {:?}", path))?
    } else {
        tracing::debug!(path = %path.display(), "No config file, using defaults");
        AppConfig::default()
    };
    config
        .validate()
        .with_context(|| format!("Invalid config file: {:?}", path))?;
    Ok(config)
}
