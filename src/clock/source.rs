use chrono::{DateTime, Local, NaiveDateTime};
use std::sync::{
    atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    Arc,
};
use std::time::Instant;

use super::{
    reference::{SharedReference, TimeReference},
    zones::{self, TimeZone},
};

/// Raw clock readings the time source is built on.
pub trait Clock: Send + Sync {
    /// Milliseconds on a clock that never jumps backwards.
    fn monotonic_ms(&self) -> u64;
    /// Host wall-clock time in the system time zone.
    fn local_now(&self) -> NaiveDateTime;
}

pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn monotonic_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn local_now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Hand-driven clock for deterministic tests and simulations.
pub struct ManualClock {
    monotonic_ms: AtomicU64,
    local: NaiveDateTime,
}

impl ManualClock {
    pub fn new(local: NaiveDateTime) -> Self {
        Self {
            monotonic_ms: AtomicU64::new(0),
            local,
        }
    }

    pub fn set_monotonic_ms(&self, value: u64) {
        self.monotonic_ms.store(value, Ordering::SeqCst);
    }

    pub fn advance_ms(&self, delta: u64) {
        self.monotonic_ms.fetch_add(delta, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn monotonic_ms(&self) -> u64 {
        self.monotonic_ms.load(Ordering::SeqCst)
    }

    fn local_now(&self) -> NaiveDateTime {
        self.local
    }
}

/// Answers "what time is it" for the render path.
///
/// Local mode reads the host clock directly. Network mode extrapolates the
/// last published [`TimeReference`] and shifts it into the selected zone,
/// falling back to the host clock until a sync lands or after network time
/// has been disabled. `now()` never blocks on I/O.
#[derive(Clone)]
pub struct TimeSource {
    clock: Arc<dyn Clock>,
    reference: SharedReference,
    network_enabled: Arc<AtomicBool>,
    zone_index: Arc<AtomicUsize>,
}

impl TimeSource {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            reference: SharedReference::new(),
            network_enabled: Arc::new(AtomicBool::new(false)),
            zone_index: Arc::new(AtomicUsize::new(zones::UTC_INDEX)),
        }
    }

    pub fn now(&self) -> NaiveDateTime {
        self.network_now().unwrap_or_else(|| self.clock.local_now())
    }

    /// Zone-shifted network time, if network time is usable right now.
    pub fn network_now(&self) -> Option<NaiveDateTime> {
        let epoch = self.adjusted_epoch_seconds()?;
        let shifted = epoch + self.zone().offset_seconds();
        DateTime::from_timestamp(shifted, 0).map(|utc| utc.naive_utc())
    }

    /// Unix seconds from the synced reference, before any zone shift.
    pub fn adjusted_epoch_seconds(&self) -> Option<i64> {
        if !self.is_network_enabled() {
            return None;
        }
        self.reference
            .snapshot()
            .adjusted_epoch_seconds(self.clock.monotonic_ms())
    }

    /// Records a fresh server time sampled at the current monotonic instant.
    pub fn publish(&self, epoch_seconds: i64) {
        let sampled_at = self.clock.monotonic_ms();
        self.reference.publish(TimeReference::new(epoch_seconds, sampled_at));
    }

    pub fn reference(&self) -> TimeReference {
        self.reference.snapshot()
    }

    pub fn enable_network(&self) {
        self.network_enabled.store(true, Ordering::Release);
    }

    pub fn disable_network(&self) {
        self.network_enabled.store(false, Ordering::Release);
    }

    pub fn is_network_enabled(&self) -> bool {
        self.network_enabled.load(Ordering::Acquire)
    }

    pub fn zone(&self) -> TimeZone {
        zones::zone(self.zone_index.load(Ordering::Relaxed))
    }

    pub fn set_zone(&self, index: usize) {
        self.zone_index.store(index, Ordering::Relaxed);
    }
}
