// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Supervised background task submission.
//!
//! Work handed off here (quota increments, message persistence, stream
//! accumulation) runs detached from the request that spawned it. Failures are
//! logged at the task boundary and never propagate back to the caller.

use std::future::Future;

use tokio_util::task::TaskTracker;
use tracing::error;

use crate::error::NeoaiError;

/// Cloneable handle for spawning tracked background work.
#[derive(Debug, Clone, Default)]
pub struct BackgroundTasks {
    tracker: TaskTracker,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a fallible task. An `Err` is logged with its error id and dropped.
    pub fn spawn<F>(&self, name: &'static str, fut: F)
    where
        F: Future<Output = Result<(), NeoaiError>> + Send + 'static,
    {
        self.tracker.spawn(async move {
            if let Err(e) = fut.await {
                error!(
                    task = name,
                    error_id = e.error_id(),
                    code = e.code(),
                    error = %e,
                    "background task failed"
                );
            }
        });
    }

    /// Number of tasks still running.
    pub fn len(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracker.is_empty()
    }

    /// Wait for every task spawned so far, then accept new work again.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Stop accepting new work and wait for in-flight tasks. Used on shutdown.
    pub async fn shutdown(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn drain_waits_for_spawned_work() {
        let tasks = BackgroundTasks::new();
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let counter = counter.clone();
            tasks.spawn("count", async move {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }
        tasks.drain().await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn failed_task_does_not_poison_the_tracker() {
        let tasks = BackgroundTasks::new();
        let counter = Arc::new(AtomicUsize::new(0));
        tasks.spawn("persist", async { Err(NeoaiError::internal("disk gone")) });
        let c = counter.clone();
        tasks.spawn("after", async move {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        tasks.drain().await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
