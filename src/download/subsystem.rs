// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Boundary of the external download subsystem.
//!
//! The subsystem performs the transfer and is the authority on its health.
//! The monitor only submits, queries, cancels and listens.

use std::sync::Arc;

use anyhow::Result;

use super::types::{DownloadRequest, DownloadStatus, ObserverHandle, RequestId};

/// Zero-argument change callback. Implementations may invoke it from any
/// thread, any number of times per actual change.
pub type ChangeCallback = Arc<dyn Fn() + Send + Sync>;

/// Capability interface over a download engine.
pub trait DownloadSubsystem {
    /// Accept a request and return its handle.
    fn enqueue(&self, request: &DownloadRequest) -> Result<RequestId>;

    /// Current status of a request, or `None` if the subsystem has no row for
    /// it (not indexed yet, or removed).
    fn query(&self, id: RequestId) -> Option<DownloadStatus>;

    /// Cancel a request. Returns the number of requests cancelled (0 or 1).
    fn remove(&self, id: RequestId) -> usize;

    /// Register a callback fired whenever the subsystem's state changes.
    fn register_observer(&self, callback: ChangeCallback) -> ObserverHandle;

    /// Deregister a callback. Unknown handles are ignored.
    fn unregister_observer(&self, handle: ObserverHandle);
}

impl<S: DownloadSubsystem + ?Sized> DownloadSubsystem for Arc<S> {
    fn enqueue(&self, request: &DownloadRequest) -> Result<RequestId> {
        (**self).enqueue(request)
    }

    fn query(&self, id: RequestId) -> Option<DownloadStatus> {
        (**self).query(id)
    }

    fn remove(&self, id: RequestId) -> usize {
        (**self).remove(id)
    }

    fn register_observer(&self, callback: ChangeCallback) -> ObserverHandle {
        (**self).register_observer(callback)
    }

    fn unregister_observer(&self, handle: ObserverHandle) {
        (**self).unregister_observer(handle)
    }
}
