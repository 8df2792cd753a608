//! Refresh scheduling
//!
//! Two kinds of refresh are driven from the main loop:
//!
//! - **Tracked objects** (aircraft overhead): due whenever more than
//!   `current_update_interval` seconds passed since `last_update`. The interval
//!   is short while aircraft are being tracked and long otherwise.
//! - **Periodic** (weather, time sync): due once per ticker period, signalled
//!   through `ready_for_update`.

use core::sync::atomic::Ordering;

use log::info;

use crate::DeviceState;
use crate::config::{UPDATE_INTERVAL_SECS_LONG, UPDATE_INTERVAL_SECS_SHORT, UTC_OFFSET};
use crate::time::LocalTime;

/// What the main loop should refresh on this iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DueUpdates {
    /// Tracked-object interval elapsed
    pub tracked_objects: bool,
    /// Ticker fired since the last poll
    pub periodic: bool,
}

impl DueUpdates {
    pub const fn any(self) -> bool {
        self.tracked_objects || self.periodic
    }
}

/// Sole writer of `last_update` and `current_update_interval`, and consumer
/// of `ready_for_update`
pub struct UpdateScheduler<'a> {
    state: &'a DeviceState,
    utc_offset_hours: i8,
}

impl<'a> UpdateScheduler<'a> {
    pub(crate) const fn new(state: &'a DeviceState) -> Self {
        Self {
            state,
            utc_offset_hours: UTC_OFFSET,
        }
    }

    /// Refresh interval for the number of objects seen by the last refresh
    pub const fn interval_for(tracked_count: usize) -> u32 {
        if tracked_count > 0 {
            UPDATE_INTERVAL_SECS_SHORT
        } else {
            UPDATE_INTERVAL_SECS_LONG
        }
    }

    /// Check which refreshes are due. Consumes the ticker signal.
    pub fn poll(&mut self, now_ms: u32) -> DueUpdates {
        let periodic = self.state.ready_for_update.swap(false, Ordering::AcqRel);
        DueUpdates {
            tracked_objects: self.interval_elapsed(now_ms),
            periodic,
        }
    }

    /// Whether `current_update_interval` has passed since `last_update`
    pub fn interval_elapsed(&self, now_ms: u32) -> bool {
        let elapsed = now_ms.wrapping_sub(self.state.last_update());
        elapsed > self.state.current_update_interval().saturating_mul(1000)
    }

    /// Record a completed tracked-object refresh and pick the next interval.
    ///
    /// Returns the interval now in effect, in seconds.
    pub fn record_refresh(&mut self, now_ms: u32, tracked_count: usize) -> u32 {
        self.state.last_update.store(now_ms, Ordering::Release);

        let next = Self::interval_for(tracked_count);
        let previous = self
            .state
            .current_update_interval
            .swap(next, Ordering::AcqRel);
        if previous != next {
            info!(
                "{} tracked objects, refresh interval {}s -> {}s",
                tracked_count, previous, next
            );
        }
        next
    }

    /// Offset used for local time, normally taken from the stored settings
    pub fn set_utc_offset(&mut self, hours: i8) {
        self.utc_offset_hours = hours;
    }

    pub fn utc_offset(&self) -> i8 {
        self.utc_offset_hours
    }

    pub fn local_time(&self, utc_epoch_secs: u64) -> LocalTime {
        LocalTime::from_utc(utc_epoch_secs, self.utc_offset_hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_rule() {
        assert_eq!(UpdateScheduler::interval_for(0), UPDATE_INTERVAL_SECS_LONG);
        assert_eq!(UpdateScheduler::interval_for(1), UPDATE_INTERVAL_SECS_SHORT);
        assert_eq!(UpdateScheduler::interval_for(57), UPDATE_INTERVAL_SECS_SHORT);
    }

    #[test]
    fn test_due_strictly_after_interval() {
        let state = DeviceState::new();
        let mut roles = state.split().unwrap();
        let scheduler = &mut roles.scheduler;

        scheduler.record_refresh(10_000, 0);
        assert!(!scheduler.poll(10_000 + 15_000).tracked_objects);
        assert!(scheduler.poll(10_000 + 15_001).tracked_objects);
    }

    #[test]
    fn test_short_interval_while_tracking() {
        let state = DeviceState::new();
        let mut roles = state.split().unwrap();
        let scheduler = &mut roles.scheduler;

        assert_eq!(scheduler.record_refresh(0, 3), UPDATE_INTERVAL_SECS_SHORT);
        assert!(!scheduler.poll(3_000).tracked_objects);
        assert!(scheduler.poll(3_001).tracked_objects);

        assert_eq!(scheduler.record_refresh(3_001, 0), UPDATE_INTERVAL_SECS_LONG);
        assert!(!scheduler.poll(3_001 + 3_001).tracked_objects);
    }

    #[test]
    fn test_clock_wrap() {
        let state = DeviceState::new();
        let mut roles = state.split().unwrap();
        let scheduler = &mut roles.scheduler;

        let before_wrap = u32::MAX - 5_000;
        scheduler.record_refresh(before_wrap, 0);

        // 10s later the counter has wrapped
        assert!(!scheduler.poll(before_wrap.wrapping_add(10_000)).tracked_objects);
        assert!(scheduler.poll(before_wrap.wrapping_add(15_001)).tracked_objects);
    }

    #[test]
    fn test_periodic_consumed_once_per_tick() {
        let state = DeviceState::new();
        let mut roles = state.split().unwrap();

        assert!(!roles.scheduler.poll(0).periodic);
        roles.ticker.tick();
        let due = roles.scheduler.poll(0);
        assert!(due.periodic);
        assert!(due.any());
        assert!(!roles.scheduler.poll(0).any());
    }

    #[test]
    fn test_local_time_uses_offset() {
        let state = DeviceState::new();
        let mut roles = state.split().unwrap();

        assert_eq!(roles.scheduler.utc_offset(), UTC_OFFSET);
        // 1970-01-01 23:30:00 UTC
        let t = 23 * 3600 + 30 * 60;
        assert_eq!(roles.scheduler.local_time(t).hours, 1);

        roles.scheduler.set_utc_offset(-8);
        assert_eq!(roles.scheduler.local_time(t).hours, 15);
    }
}
