//! ESP32-S3 firmware-specific modules for wxstation
//!
//! This crate contains hardware-specific code that cannot compile on desktop
//! targets: peripheral initialization, the flash-backed settings store and
//! build-time Wi-Fi credentials.

#![no_std]

pub mod flash_store;
pub mod hardware;
pub mod wifi_secrets;
