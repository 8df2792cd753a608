use core::sync::atomic::Ordering;

use crate::DeviceState;

/// Producer side of the periodic refresh signal.
///
/// Safe to call from a timer interrupt or a separate task. Ticks that arrive
/// before the scheduler consumed the previous one coalesce into one refresh.
#[derive(Clone, Copy)]
pub struct UpdateTicker<'a> {
    state: &'a DeviceState,
}

impl<'a> UpdateTicker<'a> {
    pub(crate) const fn new(state: &'a DeviceState) -> Self {
        Self { state }
    }

    pub fn tick(&self) {
        self.state.ready_for_update.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticks_coalesce() {
        let state = DeviceState::new();
        let mut roles = state.split().unwrap();

        roles.ticker.tick();
        roles.ticker.tick();
        assert!(state.ready_for_update());

        assert!(roles.scheduler.poll(0).periodic);
        assert!(!roles.scheduler.poll(0).periodic);
        assert!(!state.ready_for_update());
    }
}
