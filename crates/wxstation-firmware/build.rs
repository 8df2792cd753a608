//! Bakes the fallback Wi-Fi credentials from `.env` into the firmware.
//!
//! ```text
//! WIFI_SSID=my-network
//! WIFI_PASSWORD=my-password
//! ```
//!
//! Both default to empty, in which case the station waits for the
//! configuration portal.

fn main() {
    println!("cargo:rerun-if-changed=.env");
    println!("cargo:rerun-if-env-changed=WIFI_SSID");
    println!("cargo:rerun-if-env-changed=WIFI_PASSWORD");

    // A missing .env is fine, values may come from the environment
    let _ = dotenvy::dotenv();

    for key in ["WIFI_SSID", "WIFI_PASSWORD"] {
        let value = std::env::var(key).unwrap_or_default();
        println!("cargo:rustc-env={key}={value}");
    }
}
