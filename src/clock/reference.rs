use std::sync::{Arc, PoisonError, RwLock};

/// Server time captured at a known monotonic instant.
///
/// Adjusted time is extrapolated from this pair, so the render path never
/// needs to touch the network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeReference {
    pub synced_epoch_seconds: i64,
    pub synced_at_monotonic_ms: u64,
    pub initialized: bool,
}

impl TimeReference {
    pub fn new(synced_epoch_seconds: i64, synced_at_monotonic_ms: u64) -> Self {
        Self {
            synced_epoch_seconds,
            synced_at_monotonic_ms,
            initialized: true,
        }
    }

    /// Unix seconds at `monotonic_now_ms`, or `None` before the first sync.
    pub fn adjusted_epoch_seconds(&self, monotonic_now_ms: u64) -> Option<i64> {
        if !self.initialized {
            return None;
        }
        let elapsed_ms = monotonic_now_ms.saturating_sub(self.synced_at_monotonic_ms);
        Some(self.synced_epoch_seconds + (elapsed_ms / 1000) as i64)
    }
}

/// Reference cell shared between the sync task and readers.
///
/// Writers replace the whole snapshot under the lock and readers copy it
/// out, so the epoch and its monotonic sample are always seen together.
#[derive(Debug, Clone, Default)]
pub struct SharedReference {
    inner: Arc<RwLock<TimeReference>>,
}

impl SharedReference {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> TimeReference {
        *self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn publish(&self, reference: TimeReference) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = reference;
    }
}
