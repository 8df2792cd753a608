//! Hardware initialization for the station
//!
//! This module sets up the diagnostic UART and the two-wire display bus from
//! the values in [`wxstation_core::config`].

use embedded_hal_async::i2c::I2c as AsyncI2c;
use esp_hal::Async;
use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::time::Rate;
use esp_hal::uart::{Config as UartConfig, Uart};
use log::info;
use thiserror_no_std::Error;
use wxstation_core::config::{BAUD_RATE, DISPLAY_BUS, HOSTNAME, SDA_PIN, SDC_PIN};

// The display bus pins are fixed peripherals below, keep them in step with config
const _: () = assert!(SDA_PIN.gpio() == 4 && SDC_PIN.gpio() == 5);

/// SSD1306 control byte for a command stream
const OLED_COMMAND: u8 = 0x00;
/// SSD1306 "display off", harmless as a presence probe
const OLED_DISPLAY_OFF: u8 = 0xAE;

#[derive(Error, Debug)]
pub enum HardwareError {
    #[error("I2C bus configuration rejected")]
    I2cConfig,
    #[error("Display not answering at {0:#04x}")]
    DisplayMissing(u8),
    #[error("UART configuration rejected")]
    UartConfig,
}

/// Create the display bus on the configured pins
pub fn create_display_bus(
    i2c0: esp_hal::peripherals::I2C0<'static>,
    sda: esp_hal::peripherals::GPIO4<'static>,
    scl: esp_hal::peripherals::GPIO5<'static>,
) -> Result<I2c<'static, Async>, HardwareError> {
    let bus = I2c::new(
        i2c0,
        I2cConfig::default().with_frequency(Rate::from_khz(DISPLAY_BUS.frequency_khz)),
    )
    .map_err(|_| HardwareError::I2cConfig)?
    .with_sda(sda)
    .with_scl(scl)
    .into_async();

    info!(
        "Display bus on {} (SDA) / {} (SCL) at {} kHz",
        DISPLAY_BUS.sda.label(),
        DISPLAY_BUS.scl.label(),
        DISPLAY_BUS.frequency_khz
    );
    Ok(bus)
}

/// Check that the display acknowledges its address
pub async fn probe_display(bus: &mut I2c<'static, Async>) -> Result<(), HardwareError> {
    AsyncI2c::write(bus, DISPLAY_BUS.address, &[OLED_COMMAND, OLED_DISPLAY_OFF])
        .await
        .map_err(|_| HardwareError::DisplayMissing(DISPLAY_BUS.address))?;
    info!("Display found at {:#04x}", DISPLAY_BUS.address);
    Ok(())
}

/// Open the diagnostic serial port and print the boot banner
pub fn init_serial(
    uart0: esp_hal::peripherals::UART0<'static>,
    tx: esp_hal::peripherals::GPIO43<'static>,
    rx: esp_hal::peripherals::GPIO44<'static>,
) -> Result<Uart<'static, esp_hal::Blocking>, HardwareError> {
    let mut uart = Uart::new(uart0, UartConfig::default().with_baudrate(BAUD_RATE))
        .map_err(|_| HardwareError::UartConfig)?
        .with_tx(tx)
        .with_rx(rx);

    for part in [HOSTNAME.as_bytes(), b" booting\r\n"] {
        // The banner is best effort, logging goes over RTT
        let _ = uart.write(part);
    }
    info!("Serial at {} baud", BAUD_RATE);
    Ok(uart)
}
