//! Fallback Wi-Fi credentials baked in by `build.rs` from `.env`

use wxstation_core::settings::StationSettings;

pub const WIFI_SSID: &str = env!("WIFI_SSID");
pub const WIFI_PASSWORD: &str = env!("WIFI_PASSWORD");

/// Fill in build-time credentials when the stored settings carry none
pub fn seed(settings: &mut StationSettings) {
    if !settings.wifi.ssid.is_empty() || WIFI_SSID.is_empty() {
        return;
    }

    match StationSettings::with_wifi(WIFI_SSID, WIFI_PASSWORD) {
        Ok(seeded) => settings.wifi = seeded.wifi,
        Err(e) => log::warn!("Ignoring build-time Wi-Fi credentials: {}", e),
    }
}
