//! Hardware-independent core library for wxstation
//!
//! This crate holds the fixed board/network configuration of the weather
//! station and the small set of process-wide flags shared between the main
//! loop, the periodic ticker, the Wi-Fi provisioning portal, the refresh
//! scheduler and the loop watchdog.
//!
//! It is `#![no_std]` so it compiles on both the ESP32-S3 target and desktop
//! hosts (for the simulator and tests).

#![no_std]

pub mod config;
pub mod error;
pub mod ota;
pub mod provisioning;
pub mod scheduler;
pub mod settings;
pub mod state;
pub mod ticker;
pub mod time;
pub mod watchdog;

pub use error::StationError;
pub use state::{DeviceState, StateRoles};
