//! User-editable station settings and their persisted record format
//!
//! The provisioning portal produces a [`StationSettings`] value; the persister
//! writes it through a [`SettingsStore`] as a single record:
//!
//! ```text
//! [version: u8][postcard payload ...]
//! ```
//!
//! On boot [`load`] restores the record, falling back to defaults built from
//! [`crate::config`] when nothing usable is stored.

use heapless::String;
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};

use crate::StationError;
use crate::config::{HOSTNAME, UTC_OFFSET};

/// Version byte leading every stored record
pub const SETTINGS_VERSION: u8 = 1;

/// Upper bound on an encoded record, version byte included
pub const SETTINGS_RECORD_LEN: usize = 192;

pub const HOSTNAME_CAPACITY: usize = 32;
pub const SSID_CAPACITY: usize = 32;
pub const PASSWORD_CAPACITY: usize = 64;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct WifiCredentials {
    pub ssid: String<SSID_CAPACITY>,
    pub password: String<PASSWORD_CAPACITY>,
}

impl WifiCredentials {
    pub fn new(ssid: &str, password: &str) -> Result<Self, StationError> {
        Ok(Self {
            ssid: bounded(ssid, "ssid")?,
            password: bounded(password, "password")?,
        })
    }
}

/// Settings submitted through the captive configuration portal
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StationSettings {
    pub hostname: String<HOSTNAME_CAPACITY>,
    pub utc_offset_hours: i8,
    pub wifi: WifiCredentials,
}

impl Default for StationSettings {
    fn default() -> Self {
        Self {
            hostname: String::try_from(HOSTNAME).unwrap_or_default(),
            utc_offset_hours: UTC_OFFSET,
            wifi: WifiCredentials::default(),
        }
    }
}

impl StationSettings {
    /// Default settings joined to the given network
    pub fn with_wifi(ssid: &str, password: &str) -> Result<Self, StationError> {
        Ok(Self {
            wifi: WifiCredentials::new(ssid, password)?,
            ..Self::default()
        })
    }

    pub fn set_hostname(&mut self, hostname: &str) -> Result<(), StationError> {
        self.hostname = bounded(hostname, "hostname")?;
        Ok(())
    }

    /// Encode into `buf`, returning the used prefix
    pub fn encode<'b>(
        &self,
        buf: &'b mut [u8; SETTINGS_RECORD_LEN],
    ) -> Result<&'b [u8], StationError> {
        buf[0] = SETTINGS_VERSION;
        let used = postcard::to_slice(self, &mut buf[1..])
            .map_err(StationError::Encode)?
            .len();
        Ok(&buf[..=used])
    }

    pub fn decode(record: &[u8]) -> Result<Self, StationError> {
        match record.split_first() {
            Some((&SETTINGS_VERSION, payload)) => {
                postcard::from_bytes(payload).map_err(StationError::Decode)
            }
            Some((&version, _)) => Err(StationError::UnsupportedVersion(version)),
            None => Err(StationError::Decode(postcard::Error::DeserializeUnexpectedEnd)),
        }
    }
}

fn bounded<const N: usize>(value: &str, field: &'static str) -> Result<String<N>, StationError> {
    String::try_from(value).map_err(|_| StationError::FieldTooLong(field))
}

/// Non-volatile backing for the settings record
pub trait SettingsStore {
    type Error: core::fmt::Debug;

    /// Copy the stored record into `buf`, returning its length (0 when empty)
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Replace the stored record
    fn write(&mut self, record: &[u8]) -> Result<(), Self::Error>;
}

pub fn save<S: SettingsStore>(
    store: &mut S,
    settings: &StationSettings,
) -> Result<(), StationError> {
    let mut buf = [0u8; SETTINGS_RECORD_LEN];
    let record = settings.encode(&mut buf)?;
    store.write(record).map_err(|e| {
        error!("Settings write failed: {:?}", e);
        StationError::Storage
    })?;
    debug!("Saved {} byte settings record", record.len());
    Ok(())
}

/// Stored settings, or defaults when the store holds nothing usable
pub fn load<S: SettingsStore>(store: &mut S) -> StationSettings {
    let mut buf = [0u8; SETTINGS_RECORD_LEN];
    let len = match store.read(&mut buf) {
        Ok(0) => {
            warn!("No stored settings, using defaults");
            return StationSettings::default();
        }
        Ok(len) => len.min(SETTINGS_RECORD_LEN),
        Err(e) => {
            error!("Settings read failed: {:?}, using defaults", e);
            return StationSettings::default();
        }
    };

    match StationSettings::decode(&buf[..len]) {
        Ok(settings) => settings,
        Err(e) => {
            warn!("Stored settings unusable ({}), using defaults", e);
            StationSettings::default()
        }
    }
}

/// RAM-backed store, lost on reset
#[derive(Debug, Default)]
pub struct RamSettingsStore {
    record: heapless::Vec<u8, SETTINGS_RECORD_LEN>,
}

impl RamSettingsStore {
    pub const fn new() -> Self {
        Self {
            record: heapless::Vec::new(),
        }
    }

    pub fn record(&self) -> &[u8] {
        &self.record
    }
}

impl SettingsStore for RamSettingsStore {
    type Error = StoreFull;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let len = self.record.len();
        buf.get_mut(..len)
            .ok_or(StoreFull)?
            .copy_from_slice(&self.record);
        Ok(len)
    }

    fn write(&mut self, record: &[u8]) -> Result<(), Self::Error> {
        self.record.clear();
        self.record.extend_from_slice(record).map_err(|_| StoreFull)
    }
}

/// Record does not fit the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreFull;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_follow_config() {
        let settings = StationSettings::default();
        assert_eq!(settings.hostname.as_str(), HOSTNAME);
        assert_eq!(settings.utc_offset_hours, UTC_OFFSET);
        assert!(settings.wifi.ssid.is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let mut store = RamSettingsStore::new();
        let mut settings = StationSettings::with_wifi("hangar", "hunter22").unwrap();
        settings.utc_offset_hours = -5;

        save(&mut store, &settings).unwrap();

        assert_eq!(store.record()[0], SETTINGS_VERSION);
        assert_eq!(load(&mut store), settings);
    }

    #[test]
    fn test_empty_store_loads_defaults() {
        let mut store = RamSettingsStore::new();
        assert_eq!(load(&mut store), StationSettings::default());
    }

    #[test]
    fn test_foreign_version_loads_defaults() {
        let mut store = RamSettingsStore::new();
        save(&mut store, &StationSettings::with_wifi("a", "b").unwrap()).unwrap();
        let mut record = [0u8; SETTINGS_RECORD_LEN];
        let len = store.read(&mut record).unwrap();
        record[0] = SETTINGS_VERSION + 1;
        store.write(&record[..len]).unwrap();

        assert!(matches!(
            StationSettings::decode(&record[..len]),
            Err(StationError::UnsupportedVersion(2))
        ));
        assert_eq!(load(&mut store), StationSettings::default());
    }

    #[test]
    fn test_truncated_record_loads_defaults() {
        let mut store = RamSettingsStore::new();
        store.write(&[SETTINGS_VERSION, 0xFF]).unwrap();
        assert_eq!(load(&mut store), StationSettings::default());
    }

    #[test]
    fn test_oversized_fields_rejected() {
        const LONG: &str = "a-very-long-network-name-that-overflows-the-field";
        assert!(matches!(
            WifiCredentials::new(LONG, "pw"),
            Err(StationError::FieldTooLong("ssid"))
        ));

        let mut settings = StationSettings::default();
        assert!(settings.set_hostname(LONG).is_err());
        assert!(settings.set_hostname("loft-station").is_ok());
        assert_eq!(settings.hostname.as_str(), "loft-station");
    }
}
