// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! In-memory download subsystem.
//!
//! Statuses are scripted by the caller through [`InMemorySubsystem::set_status`];
//! nothing is transferred. Used by the test suite and by `loadapp download
//! --simulate`.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use anyhow::{bail, Result};

use super::subsystem::{ChangeCallback, DownloadSubsystem};
use super::types::{DownloadRequest, DownloadStatus, ObserverHandle, RequestId};
use crate::sync::{resilient_read, resilient_write};

#[derive(Default)]
struct Inner {
    next_request: u64,
    next_observer: u64,
    rows: HashMap<RequestId, DownloadStatus>,
    observers: BTreeMap<u64, ChangeCallback>,
    submitted: Vec<(RequestId, DownloadRequest)>,
    removed: Vec<RequestId>,
    index_on_enqueue: bool,
    fail_next_enqueue: Option<String>,
}

/// Scriptable subsystem keeping every row in a map.
pub struct InMemorySubsystem {
    inner: RwLock<Inner>,
}

impl Default for InMemorySubsystem {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySubsystem {
    /// Create a subsystem that indexes new requests as `Pending` right away.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                next_request: 1,
                next_observer: 1,
                index_on_enqueue: true,
                ..Inner::default()
            }),
        }
    }

    /// Create a subsystem whose new requests have no row until the first
    /// [`set_status`](Self::set_status).
    pub fn unindexed() -> Self {
        let subsystem = Self::new();
        resilient_write(&subsystem.inner).index_on_enqueue = false;
        subsystem
    }

    /// Make the next `enqueue` fail with `message`.
    pub fn fail_next_enqueue(&self, message: impl Into<String>) {
        resilient_write(&self.inner).fail_next_enqueue = Some(message.into());
    }

    /// Set the status row of `id` and fire every registered observer.
    pub fn set_status(&self, id: RequestId, status: DownloadStatus) {
        resilient_write(&self.inner).rows.insert(id, status);
        self.notify_observers();
    }

    /// Drop the row of `id` without firing observers.
    pub fn forget(&self, id: RequestId) {
        resilient_write(&self.inner).rows.remove(&id);
    }

    /// Fire every registered observer without changing any row.
    pub fn notify_observers(&self) {
        // Callbacks run outside the lock so they may call back into the subsystem.
        let callbacks: Vec<ChangeCallback> =
            resilient_read(&self.inner).observers.values().cloned().collect();
        for callback in callbacks {
            callback();
        }
    }

    pub fn observer_count(&self) -> usize {
        resilient_read(&self.inner).observers.len()
    }

    /// Requests accepted so far, in submission order.
    pub fn submitted(&self) -> Vec<(RequestId, DownloadRequest)> {
        resilient_read(&self.inner).submitted.clone()
    }

    /// Requests cancelled through `remove`, in order.
    pub fn removed(&self) -> Vec<RequestId> {
        resilient_read(&self.inner).removed.clone()
    }
}

impl DownloadSubsystem for InMemorySubsystem {
    fn enqueue(&self, request: &DownloadRequest) -> Result<RequestId> {
        let mut inner = resilient_write(&self.inner);
        if let Some(message) = inner.fail_next_enqueue.take() {
            bail!("{}", message);
        }
        let id = RequestId(inner.next_request);
        inner.next_request += 1;
        if inner.index_on_enqueue {
            inner.rows.insert(id, DownloadStatus::Pending);
        }
        inner.submitted.push((id, request.clone()));
        Ok(id)
    }

    fn query(&self, id: RequestId) -> Option<DownloadStatus> {
        resilient_read(&self.inner).rows.get(&id).copied()
    }

    fn remove(&self, id: RequestId) -> usize {
        let mut inner = resilient_write(&self.inner);
        match inner.rows.remove(&id) {
            Some(_) => {
                inner.removed.push(id);
                1
            }
            None => 0,
        }
    }

    fn register_observer(&self, callback: ChangeCallback) -> ObserverHandle {
        let mut inner = resilient_write(&self.inner);
        let key = inner.next_observer;
        inner.next_observer += 1;
        inner.observers.insert(key, callback);
        ObserverHandle(key)
    }

    fn unregister_observer(&self, handle: ObserverHandle) {
        resilient_write(&self.inner).observers.remove(&handle.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_enqueue_indexes_pending() {
        let subsystem = InMemorySubsystem::new();
        let id = subsystem
            .enqueue(&DownloadRequest::new("https://example.com/a.zip", "t"))
            .unwrap();
        assert_eq!(subsystem.query(id), Some(DownloadStatus::Pending));
        assert_eq!(subsystem.submitted().len(), 1);
    }

    #[test]
    fn test_unindexed_has_no_row_until_scripted() {
        let subsystem = InMemorySubsystem::unindexed();
        let id = subsystem
            .enqueue(&DownloadRequest::new("https://example.com/a.zip", "t"))
            .unwrap();
        assert_eq!(subsystem.query(id), None);
        subsystem.set_status(id, DownloadStatus::Running);
        assert_eq!(subsystem.query(id), Some(DownloadStatus::Running));
    }

    #[test]
    fn test_observers_fire_until_unregistered() {
        let subsystem = InMemorySubsystem::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let handle = subsystem.register_observer(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        subsystem.set_status(RequestId(1), DownloadStatus::Running);
        subsystem.unregister_observer(handle);
        subsystem.set_status(RequestId(1), DownloadStatus::Succeeded);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(subsystem.observer_count(), 0);
    }

    #[test]
    fn test_remove_counts() {
        let subsystem = InMemorySubsystem::new();
        let id = subsystem
            .enqueue(&DownloadRequest::new("https://example.com/a.zip", "t"))
            .unwrap();
        assert_eq!(subsystem.remove(id), 1);
        assert_eq!(subsystem.remove(id), 0);
        assert_eq!(subsystem.removed(), vec![id]);
    }

    #[test]
    fn test_fail_next_enqueue_is_one_shot() {
        let subsystem = InMemorySubsystem::new();
        subsystem.fail_next_enqueue("storage unavailable");
        let request = DownloadRequest::new("https://example.com/a.zip", "t");
        let err = subsystem.enqueue(&request).unwrap_err();
        assert!(err.to_string().contains("storage unavailable"));
        assert!(subsystem.enqueue(&request).is_ok());
    }
}
