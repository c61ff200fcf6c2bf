use crate::core::geo::Region;
use std::time::{Duration, Instant};

/// Coalesces viewport changes arriving faster than a fixed interval.
///
/// Changes inside the interval replace one another; only the most recent is
/// released once the interval has passed.
#[derive(Debug, Clone)]
pub struct ViewportThrottle {
    interval: Duration,
    last_emit: Option<Instant>,
    pending: Option<Region>,
}

impl ViewportThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_emit: None,
            pending: None,
        }
    }

    fn is_open(&self, now: Instant) -> bool {
        match self.last_emit {
            Some(last) => now.saturating_duration_since(last) >= self.interval,
            None => true,
        }
    }

    /// Returns the region to act on now, or defers it
    pub fn offer(&mut self, region: Region, now: Instant) -> Option<Region> {
        if self.is_open(now) {
            self.last_emit = Some(now);
            self.pending = None;
            Some(region)
        } else {
            self.pending = Some(region);
            None
        }
    }

    /// Releases the deferred region once the interval has passed
    pub fn flush(&mut self, now: Instant) -> Option<Region> {
        if self.pending.is_some() && self.is_open(now) {
            self.last_emit = Some(now);
            self.pending.take()
        } else {
            None
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending region becomes releasable
    pub fn deadline(&self) -> Option<Instant> {
        self.pending?;
        Some(match self.last_emit {
            Some(last) => last + self.interval,
            None => Instant::now(),
        })
    }
}
