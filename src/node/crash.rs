//! Fault injection: a node can be made unavailable for a while.
//!
//! The flag lives behind its own mutex, separate from the store lock, and
//! is held only to check or flip it. Recovery is a Tokio task owned by the
//! crash state: it sleeps without holding the lock, and a generation number
//! keeps a stale timer from clearing a later crash. Dropping the state
//! aborts any pending timer.

use crate::error::{NodeError, NodeResult};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

#[derive(Debug, Default)]
struct CrashInner {
    crashed: bool,
    until: Option<DateTime<Utc>>,
    generation: u64,
    recovery: Option<JoinHandle<()>>,
}

#[derive(Debug, Default)]
pub struct CrashState {
    inner: Arc<Mutex<CrashInner>>,
}

impl CrashState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_crashed(&self) -> bool {
        self.inner.lock().crashed
    }

    /// Fail with [`NodeError::ServerCrash`] while crashed.
    pub fn ensure_available(&self) -> NodeResult<()> {
        if self.is_crashed() {
            Err(NodeError::ServerCrash)
        } else {
            Ok(())
        }
    }

    /// When the current crash is scheduled to end.
    pub fn crashed_until(&self) -> Option<DateTime<Utc>> {
        self.inner.lock().until
    }

    /// Become unavailable for `duration`.
    ///
    /// Crashes do not stack: calling this while crashed fails and leaves the
    /// running timer alone. Must be called from within a Tokio runtime.
    pub fn crash(&self, duration: Duration, node: &str) -> NodeResult<()> {
        let mut inner = self.inner.lock();
        if inner.crashed {
            return Err(NodeError::ServerCrash);
        }

        inner.crashed = true;
        inner.generation += 1;
        inner.until = chrono::Duration::from_std(duration)
            .ok()
            .and_then(|d| Utc::now().checked_add_signed(d));

        info!(
            node = %node,
            seconds = duration.as_secs(),
            until = ?inner.until,
            "Node crashed"
        );

        let state = Arc::downgrade(&self.inner);
        let generation = inner.generation;
        let node = node.to_string();
        inner.recovery = Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            recover(&state, generation, &node);
        }));
        Ok(())
    }
}

fn recover(state: &Weak<Mutex<CrashInner>>, generation: u64, node: &str) {
    let Some(state) = state.upgrade() else {
        return;
    };
    let mut inner = state.lock();
    if inner.generation == generation && inner.crashed {
        inner.crashed = false;
        inner.until = None;
        // Detaches this task's own handle.
        inner.recovery = None;
        info!(node = %node, "Node recovered from crash");
    }
}

impl Drop for CrashState {
    fn drop(&mut self) {
        if let Some(handle) = self.inner.lock().recovery.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_crash_then_recover() {
        let state = CrashState::new();
        assert!(state.ensure_available().is_ok());

        state.crash(Duration::from_secs(2), "n1").unwrap();
        assert!(state.is_crashed());
        assert!(state.crashed_until().is_some());
        assert_eq!(state.ensure_available(), Err(NodeError::ServerCrash));

        tokio::time::sleep(Duration::from_millis(2100)).await;
        assert!(!state.is_crashed());
        assert!(state.crashed_until().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_crashes_do_not_stack() {
        let state = CrashState::new();
        state.crash(Duration::from_secs(2), "n1").unwrap();
        assert_eq!(
            state.crash(Duration::from_secs(60), "n1"),
            Err(NodeError::ServerCrash)
        );

        // The first timer still governs recovery.
        tokio::time::sleep(Duration::from_millis(2100)).await;
        assert!(!state.is_crashed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_recrash_after_recovery_gets_fresh_timer() {
        let state = CrashState::new();
        state.crash(Duration::from_secs(1), "n1").unwrap();
        tokio::time::sleep(Duration::from_millis(1100)).await;

        state.crash(Duration::from_secs(5), "n1").unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(state.is_crashed());
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(!state.is_crashed());
    }
}
