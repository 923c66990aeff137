//! Keyed debouncing.
//!
//! Every submission for a key takes a ticket and waits out the window. When the window has
//! passed, only the holder of the newest ticket for that key goes ahead; earlier submissions
//! learn they were superseded. Nothing is cancelled and no timer outlives its caller.

use std::{
    hash::Hash,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use rustc_hash::FxHashMap;
use tokio::sync::Mutex;

/// Default debounce window.
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(350);

/// Collapses bursts of submissions per key into the last one.
#[derive(Debug)]
pub struct Debouncer<K> {
    window: Duration,
    latest: Mutex<FxHashMap<K, u64>>,
    tickets: AtomicU64,
}

impl<K> Default for Debouncer<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_WINDOW)
    }
}

impl<K> Debouncer<K>
where
    K: Eq + Hash + Clone,
{
    /// Create a debouncer with the given quiet window.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            latest: Mutex::new(FxHashMap::default()),
            tickets: AtomicU64::new(0),
        }
    }

    /// Wait out the window for `key`.
    ///
    /// Returns `true` if this submission is the latest for its key and should proceed.
    pub async fn settle(&self, key: K) -> bool {
        let ticket = self.tickets.fetch_add(1, Ordering::Relaxed);

        self.latest.lock().await.insert(key.clone(), ticket);

        tokio::time::sleep(self.window).await;

        let mut latest = self.latest.lock().await;

        if latest.get(&key) == Some(&ticket) {
            latest.remove(&key);

            true
        } else {
            false
        }
    }

    /// Number of keys with a submission still waiting.
    pub async fn pending(&self) -> usize {
        self.latest.lock().await.len()
    }
}
