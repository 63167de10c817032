// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Consistent error formatting for loadapp.
//!
//! Provides utilities to format errors with actionable information including
//! possible causes, suggested fixes, and a help link.

use std::fmt;

use crate::download::MonitorError;
use crate::screen::ScreenError;

/// Issue tracker for support.
pub const ISSUES_URL: &str = "https://github.com/loadapp/loadapp/issues";

/// Formats an error message with title, causes, fixes, and help link.
///
/// # Example
///
/// ```
/// use loadapp::error::format_error;
///
/// let error = format_error(
///     "Download could not be started",
///     &["No network connection"],
///     &["Retry: loadapp download glide"],
/// );
/// println!("{}", error);
/// ```
pub fn format_error(title: &str, causes: &[&str], fixes: &[&str]) -> String {
    let mut output = format!("[✗] {}\n\n", title);

    if !causes.is_empty() {
        output.push_str("Possible causes:\n");
        for cause in causes {
            output.push_str(&format!("  - {}\n", cause));
        }
        output.push('\n');
    }

    if !fixes.is_empty() {
        output.push_str("Try these fixes:\n");
        for (i, fix) in fixes.iter().enumerate() {
            output.push_str(&format!("  {}. {}\n", i + 1, fix));
        }
        output.push('\n');
    }

    output.push_str(&format!("Need help? {}", ISSUES_URL));
    output
}

/// Builder for formatted error messages.
///
/// ```
/// use loadapp::error::ErrorBuilder;
///
/// let error = ErrorBuilder::new("Invalid configuration")
///     .cause("A color is not #RRGGBB")
///     .fix("Show the effective config: loadapp config show")
///     .build();
/// assert!(error.contains("Invalid configuration"));
/// ```
#[derive(Debug, Clone)]
pub struct ErrorBuilder {
    title: String,
    causes: Vec<String>,
    fixes: Vec<String>,
}

impl ErrorBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            causes: Vec::new(),
            fixes: Vec::new(),
        }
    }

    pub fn cause(mut self, cause: impl Into<String>) -> Self {
        self.causes.push(cause.into());
        self
    }

    pub fn fix(mut self, fix: impl Into<String>) -> Self {
        self.fixes.push(fix.into());
        self
    }

    pub fn build(self) -> String {
        let causes: Vec<&str> = self.causes.iter().map(|s| s.as_str()).collect();
        let fixes: Vec<&str> = self.fixes.iter().map(|s| s.as_str()).collect();
        format_error(&self.title, &causes, &fixes)
    }
}

impl fmt::Display for ErrorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.clone().build())
    }
}

fn monitor_error(e: &MonitorError) -> ErrorBuilder {
    match e {
        MonitorError::Submit { url, source } => ErrorBuilder::new("Download could not be started")
            .cause(format!("{:#}", source))
            .cause(format!("URL: {}", url))
            .fix("Check the URL in the file catalogue: loadapp files")
            .fix("Try without network access: loadapp download <FILE> --simulate"),
    }
}

/// Describe a command failure for the terminal.
pub fn describe(err: &anyhow::Error) -> String {
    let builder = if let Some(e) = err.downcast_ref::<ScreenError>() {
        match e {
            ScreenError::NoSelection => ErrorBuilder::new(e.to_string())
                .fix("List the files: loadapp files")
                .fix("Pick one: loadapp download glide"),
            ScreenError::UnknownFile(key) => ErrorBuilder::new(format!("Unknown file: {}", key))
                .fix("List the files: loadapp files"),
            ScreenError::Monitor(m) => monitor_error(m),
        }
    } else if let Some(m) = err.downcast_ref::<MonitorError>() {
        monitor_error(m)
    } else {
        let mut builder = ErrorBuilder::new(err.to_string());
        for cause in err.chain().skip(1) {
            builder = builder.cause(cause.to_string());
        }
        builder
            .fix("Show the effective config: loadapp config show")
            .fix("Run with -v for details")
    };
    builder.build()
}
