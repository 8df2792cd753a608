//! Hand-off between the captive configuration portal and persistence
//!
//! The portal calls [`ProvisioningSignal::submit`] when the user saves new
//! settings. Later in the main loop [`SettingsPersister::persist_pending`]
//! notices `should_save_config` and writes the settings to the store. After a
//! failed write the persister waits [`SETTINGS_RETRY_SECS`] before touching
//! the store again, so a faulty flash sector is not rewritten on every pass.

use core::sync::atomic::Ordering;

use log::{info, warn};

use crate::config::SETTINGS_RETRY_SECS;
use crate::settings::{self, SettingsStore, StationSettings};
use crate::{DeviceState, StationError};

/// Writer of `should_save_config`
#[derive(Clone, Copy)]
pub struct ProvisioningSignal<'a> {
    state: &'a DeviceState,
}

impl<'a> ProvisioningSignal<'a> {
    pub(crate) const fn new(state: &'a DeviceState) -> Self {
        Self { state }
    }

    /// Queue settings for saving. A newer submission replaces an unsaved one.
    pub fn submit(&self, settings: StationSettings) {
        self.state
            .pending_settings
            .lock(|pending| *pending.borrow_mut() = Some(settings));
        self.state.should_save_config.store(true, Ordering::Release);
    }
}

const RETRY_MS: u32 = SETTINGS_RETRY_SECS * 1000;

/// Consumer of `should_save_config`
pub struct SettingsPersister<'a> {
    state: &'a DeviceState,
    /// When the last write failed
    failed_at: Option<u32>,
}

impl<'a> SettingsPersister<'a> {
    pub(crate) const fn new(state: &'a DeviceState) -> Self {
        Self {
            state,
            failed_at: None,
        }
    }

    /// Write submitted settings, if any.
    ///
    /// Returns the settings that were saved, or `None` when nothing was pending
    /// or a retry is not yet due. A failed write leaves the submission pending
    /// and the next attempt happens once [`SETTINGS_RETRY_SECS`] have passed.
    pub fn persist_pending<S: SettingsStore>(
        &mut self,
        now_ms: u32,
        store: &mut S,
    ) -> Result<Option<StationSettings>, StationError> {
        if self
            .failed_at
            .is_some_and(|failed_at| now_ms.wrapping_sub(failed_at) <= RETRY_MS)
        {
            return Ok(None);
        }
        if !self.state.should_save_config.swap(false, Ordering::AcqRel) {
            return Ok(None);
        }

        let Some(settings) = self.state.pending_settings.lock(|pending| pending.take()) else {
            warn!("Save requested without submitted settings");
            return Ok(None);
        };

        match settings::save(store, &settings) {
            Ok(()) => {
                self.failed_at = None;
                info!("Saved settings for host {}", settings.hostname);
                Ok(Some(settings))
            }
            Err(e) => {
                // Keep a newer submission if one raced in
                self.state.pending_settings.lock(|pending| {
                    let mut pending = pending.borrow_mut();
                    if pending.is_none() {
                        *pending = Some(settings);
                    }
                });
                self.state.should_save_config.store(true, Ordering::Release);
                self.failed_at = Some(now_ms);
                Err(e)
            }
        }
    }
}
