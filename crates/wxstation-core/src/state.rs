//! Process-wide shared state for the station
//!
//! The flags that decouple the ticker, the provisioning portal, the refresh
//! scheduler and the loop watchdog live together in one [`DeviceState`].
//! Anyone holding a `&DeviceState` may read them. Writing is reserved to the
//! role handles in [`StateRoles`], which [`DeviceState::split`] hands out
//! exactly once:
//!
//! | Field                     | Writer                 | Readers             |
//! |---------------------------|------------------------|---------------------|
//! | `ready_for_update`        | [`UpdateTicker`]       | scheduler           |
//! | `should_save_config`      | [`ProvisioningSignal`] | persister           |
//! | `last_loop_timestamp`     | [`LoopHeartbeat`]      | [`WatchdogMonitor`] |
//! | `last_update`             | [`UpdateScheduler`]    | scheduler           |
//! | `current_update_interval` | [`UpdateScheduler`]    | scheduler, UI       |
//!
//! All fields are 32-bit or narrower atomics so a timer interrupt can set them
//! without the main loop ever seeing a torn value.
//!
//! ```rust,ignore
//! static DEVICE_STATE: DeviceState = DeviceState::new();
//!
//! let roles = DEVICE_STATE.split().expect("roles already taken");
//! spawner.spawn(ticker_task(roles.ticker))?;
//! ```

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::config::UPDATE_INTERVAL_SECS_LONG;
use crate::provisioning::{ProvisioningSignal, SettingsPersister};
use crate::scheduler::UpdateScheduler;
use crate::settings::StationSettings;
use crate::ticker::UpdateTicker;
use crate::watchdog::{LoopHeartbeat, WatchdogMonitor};

type PendingSettings = Mutex<CriticalSectionRawMutex, RefCell<Option<StationSettings>>>;

pub struct DeviceState {
    pub(crate) ready_for_update: AtomicBool,
    pub(crate) should_save_config: AtomicBool,
    pub(crate) last_loop_timestamp: AtomicU32,
    pub(crate) last_update: AtomicU32,
    pub(crate) current_update_interval: AtomicU32,
    /// Settings submitted through the portal, waiting to be persisted
    pub(crate) pending_settings: PendingSettings,
    roles_taken: AtomicBool,
}

/// Write handles for each collaborator, handed out once per [`DeviceState`]
pub struct StateRoles<'a> {
    pub ticker: UpdateTicker<'a>,
    pub provisioning: ProvisioningSignal<'a>,
    pub persister: SettingsPersister<'a>,
    pub scheduler: UpdateScheduler<'a>,
    pub heartbeat: LoopHeartbeat<'a>,
    pub watchdog: WatchdogMonitor<'a>,
}

impl DeviceState {
    /// Boot-time state: flags cleared, timestamps zero, long refresh interval
    pub const fn new() -> Self {
        Self {
            ready_for_update: AtomicBool::new(false),
            should_save_config: AtomicBool::new(false),
            last_loop_timestamp: AtomicU32::new(0),
            last_update: AtomicU32::new(0),
            current_update_interval: AtomicU32::new(UPDATE_INTERVAL_SECS_LONG),
            pending_settings: Mutex::new(RefCell::new(None)),
            roles_taken: AtomicBool::new(false),
        }
    }

    /// Take the write handles. Returns `None` if they were already taken.
    pub fn split(&self) -> Option<StateRoles<'_>> {
        if self.roles_taken.swap(true, Ordering::AcqRel) {
            return None;
        }

        Some(StateRoles {
            ticker: UpdateTicker::new(self),
            provisioning: ProvisioningSignal::new(self),
            persister: SettingsPersister::new(self),
            scheduler: UpdateScheduler::new(self),
            heartbeat: LoopHeartbeat::new(self),
            watchdog: WatchdogMonitor::new(self),
        })
    }

    pub fn ready_for_update(&self) -> bool {
        self.ready_for_update.load(Ordering::Acquire)
    }

    pub fn should_save_config(&self) -> bool {
        self.should_save_config.load(Ordering::Acquire)
    }

    /// Monotonic milliseconds of the last main loop iteration
    pub fn last_loop_timestamp(&self) -> u32 {
        self.last_loop_timestamp.load(Ordering::Acquire)
    }

    /// Monotonic milliseconds of the last successful tracked-object refresh
    pub fn last_update(&self) -> u32 {
        self.last_update.load(Ordering::Acquire)
    }

    /// Current refresh interval in seconds
    pub fn current_update_interval(&self) -> u32 {
        self.current_update_interval.load(Ordering::Acquire)
    }
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UPDATE_INTERVAL_SECS_SHORT;

    #[test]
    fn test_boot_state() {
        let state = DeviceState::new();
        assert_eq!(state.current_update_interval(), UPDATE_INTERVAL_SECS_LONG);
        assert_eq!(state.current_update_interval(), 15);
        assert!(!state.ready_for_update());
        assert!(!state.should_save_config());
        assert_eq!(state.last_update(), 0);
        assert_eq!(state.last_loop_timestamp(), 0);
    }

    #[test]
    fn test_roles_taken_once() {
        let state = DeviceState::new();
        assert!(state.split().is_some());
        assert!(state.split().is_none());
    }

    #[test]
    fn test_static_state() {
        static STATE: DeviceState = DeviceState::new();
        let roles = STATE.split().unwrap();
        roles.ticker.tick();
        assert!(STATE.ready_for_update());
    }

    #[test]
    fn test_interval_round_trip_leaves_constants_alone() {
        let state = DeviceState::new();
        let mut roles = state.split().unwrap();

        roles.scheduler.record_refresh(1_000, 4);
        assert_eq!(state.current_update_interval(), UPDATE_INTERVAL_SECS_SHORT);

        roles.scheduler.record_refresh(2_000, 0);
        assert_eq!(state.current_update_interval(), UPDATE_INTERVAL_SECS_LONG);

        assert_eq!(UPDATE_INTERVAL_SECS_SHORT, 3);
        assert_eq!(UPDATE_INTERVAL_SECS_LONG, 15);
        assert_eq!(state.last_update(), 2_000);
    }
}
