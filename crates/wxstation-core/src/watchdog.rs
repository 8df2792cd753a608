//! Main loop liveness
//!
//! The main loop feeds [`LoopHeartbeat`] on every iteration. A separate timer
//! context runs [`WatchdogMonitor::check`]; once the loop has been silent for
//! longer than [`OSWATCH_RESET_TIME`] seconds the device is considered hung and
//! the caller resets it.

use core::sync::atomic::Ordering;

use crate::DeviceState;
use crate::config::OSWATCH_RESET_TIME;

const RESET_THRESHOLD_MS: u32 = OSWATCH_RESET_TIME * 1000;

// A real stall resets long before this, so a larger gap means the heartbeat
// was fed after `now_ms` was sampled
const NEWER_HEARTBEAT_GAP: u32 = i32::MAX as u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogVerdict {
    Alive,
    /// No heartbeat for `stalled_ms`; reset the device
    Hung { stalled_ms: u32 },
}

/// Sole writer of `last_loop_timestamp`
pub struct LoopHeartbeat<'a> {
    state: &'a DeviceState,
}

impl<'a> LoopHeartbeat<'a> {
    pub(crate) const fn new(state: &'a DeviceState) -> Self {
        Self { state }
    }

    pub fn feed(&mut self, now_ms: u32) {
        self.state
            .last_loop_timestamp
            .store(now_ms, Ordering::Release);
    }
}

#[derive(Clone, Copy)]
pub struct WatchdogMonitor<'a> {
    state: &'a DeviceState,
}

impl<'a> WatchdogMonitor<'a> {
    pub(crate) const fn new(state: &'a DeviceState) -> Self {
        Self { state }
    }

    pub fn check(&self, now_ms: u32) -> WatchdogVerdict {
        let stalled_ms = now_ms.wrapping_sub(self.state.last_loop_timestamp());
        if stalled_ms > RESET_THRESHOLD_MS && stalled_ms <= NEWER_HEARTBEAT_GAP {
            WatchdogVerdict::Hung { stalled_ms }
        } else {
            WatchdogVerdict::Alive
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hung_strictly_after_threshold() {
        let state = DeviceState::new();
        let mut roles = state.split().unwrap();

        roles.heartbeat.feed(1_000);
        assert_eq!(roles.watchdog.check(1_000 + 300_000), WatchdogVerdict::Alive);
        assert_eq!(
            roles.watchdog.check(1_000 + 300_001),
            WatchdogVerdict::Hung {
                stalled_ms: 300_001
            }
        );
    }

    #[test]
    fn test_feeding_keeps_loop_alive() {
        let state = DeviceState::new();
        let mut roles = state.split().unwrap();

        for now in (0..1_000_000).step_by(100_000) {
            roles.heartbeat.feed(now);
            assert_eq!(roles.watchdog.check(now + 50_000), WatchdogVerdict::Alive);
        }
        assert_eq!(state.last_loop_timestamp(), 900_000);
    }

    #[test]
    fn test_heartbeat_newer_than_sample_is_alive() {
        let state = DeviceState::new();
        let mut roles = state.split().unwrap();

        roles.heartbeat.feed(120_001);
        assert_eq!(roles.watchdog.check(120_000), WatchdogVerdict::Alive);

        // Same race across the clock wrap
        roles.heartbeat.feed(5);
        assert_eq!(roles.watchdog.check(u32::MAX - 5), WatchdogVerdict::Alive);
    }

    #[test]
    fn test_clock_wrap() {
        let state = DeviceState::new();
        let mut roles = state.split().unwrap();

        let before_wrap = u32::MAX - 100;
        roles.heartbeat.feed(before_wrap);
        assert_eq!(
            roles.watchdog.check(before_wrap.wrapping_add(200_000)),
            WatchdogVerdict::Alive
        );
        assert!(matches!(
            roles.watchdog.check(before_wrap.wrapping_add(400_000)),
            WatchdogVerdict::Hung { .. }
        ));
    }
}
