// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Poison-recovering lock helpers.
//!
//! Download subsystems share their request table and observer registry with
//! background transfer tasks. A panic inside one of those tasks poisons the
//! lock; the screen keeps running on the last written data instead of
//! propagating the panic into the UI loop.
//!
//! ```no_run
//! use std::sync::RwLock;
//! use loadapp::sync::{resilient_read, resilient_write};
//!
//! let lock = RwLock::new(42);
//! *resilient_write(&lock) = 100;
//! assert_eq!(*resilient_read(&lock), 100);
//! ```

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Acquire a read lock, recovering the guard if the lock is poisoned.
#[inline]
pub fn resilient_read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::error!(
                target: "loadapp::sync",
                event = "LOCK_POISONED_READ",
                "RwLock was poisoned during read acquisition, recovering data. \
                 A transfer task panicked while holding this lock."
            );
            poisoned.into_inner()
        }
    }
}

/// Acquire a write lock, recovering the guard if the lock is poisoned.
#[inline]
pub fn resilient_write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::error!(
                target: "loadapp::sync",
                event = "LOCK_POISONED_WRITE",
                "RwLock was poisoned during write acquisition, recovering data. \
                 A transfer task panicked while holding this lock."
            );
            poisoned.into_inner()
        }
    }
}
