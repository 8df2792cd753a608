//! Board, network and timing constants
//!
//! Everything here is fixed at build time. Collaborators read these values;
//! nothing writes them.

/// Diagnostic serial rate in bits per second
pub const BAUD_RATE: u32 = 115_200;

/// Header pins as printed on the board silk screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoardPin {
    D0,
    D1,
    D2,
    D3,
    D4,
    D5,
    D6,
    D7,
    D8,
}

impl BoardPin {
    /// GPIO number behind the header label
    pub const fn gpio(self) -> u8 {
        match self {
            Self::D0 => 16,
            Self::D1 => 5,
            Self::D2 => 4,
            Self::D3 => 0,
            Self::D4 => 2,
            Self::D5 => 14,
            Self::D6 => 12,
            Self::D7 => 13,
            Self::D8 => 15,
        }
    }

    /// Header label for logs
    pub const fn label(self) -> &'static str {
        match self {
            Self::D0 => "D0",
            Self::D1 => "D1",
            Self::D2 => "D2",
            Self::D3 => "D3",
            Self::D4 => "D4",
            Self::D5 => "D5",
            Self::D6 => "D6",
            Self::D7 => "D7",
            Self::D8 => "D8",
        }
    }
}

/// Two-wire bus data pin
pub const SDA_PIN: BoardPin = BoardPin::D2;

/// Two-wire bus clock pin
pub const SDC_PIN: BoardPin = BoardPin::D1;

/// 7-bit bus address of the OLED display
pub const I2C_DISPLAY_ADDRESS: u8 = 0x3C;

/// Two-wire bus clock in kHz
pub const I2C_FREQUENCY_KHZ: u32 = 400;

/// Refresh interval when no aircraft are around, in seconds
pub const UPDATE_INTERVAL_SECS_LONG: u32 = 15;

/// Refresh interval while aircraft are being tracked, in seconds
pub const UPDATE_INTERVAL_SECS_SHORT: u32 = 3;

/// Cadence of the `ready_for_update` ticker, in seconds (10 minutes)
pub const TICKER_PERIOD_SECS: u32 = 600;

/// Local time offset from UTC, in hours
pub const UTC_OFFSET: i8 = 2;

/// Network hostname of the device
pub const HOSTNAME: &str = "weatherstation";

/// Password gating over-the-air firmware uploads
pub const OTA_PASSWORD: &str = "admin";

/// Network-operation timeout, in milliseconds
pub const WIFI_TIMEOUT: u32 = 30_000;

/// Maximum time between main loop iterations before the device resets, in seconds
pub const OSWATCH_RESET_TIME: u32 = 300;

/// Minimum time between attempts to save settings after a failed write, in seconds
pub const SETTINGS_RETRY_SECS: u32 = 60;

const _: () = assert!(UPDATE_INTERVAL_SECS_SHORT < UPDATE_INTERVAL_SECS_LONG);
const _: () = assert!(I2C_DISPLAY_ADDRESS <= 0x7F);
const _: () = assert!(SDA_PIN.gpio() != SDC_PIN.gpio());

/// Pins, address and clock of the display bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TwoWireBus {
    pub sda: BoardPin,
    pub scl: BoardPin,
    pub address: u8,
    pub frequency_khz: u32,
}

pub const DISPLAY_BUS: TwoWireBus = TwoWireBus {
    sda: SDA_PIN,
    scl: SDC_PIN,
    address: I2C_DISPLAY_ADDRESS,
    frequency_khz: I2C_FREQUENCY_KHZ,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_interval_below_long() {
        assert!(UPDATE_INTERVAL_SECS_SHORT < UPDATE_INTERVAL_SECS_LONG);
        assert_eq!(UPDATE_INTERVAL_SECS_SHORT, 3);
        assert_eq!(UPDATE_INTERVAL_SECS_LONG, 15);
    }

    #[test]
    fn test_display_bus_pins_do_not_alias() {
        assert_eq!(I2C_DISPLAY_ADDRESS, 0x3C);
        assert_ne!(SDA_PIN, SDC_PIN);
        assert_ne!(SDA_PIN.gpio(), SDC_PIN.gpio());
        assert_eq!(SDA_PIN.gpio(), 4);
        assert_eq!(SDC_PIN.gpio(), 5);
        assert_eq!(DISPLAY_BUS.sda, SDA_PIN);
        assert_eq!(DISPLAY_BUS.scl, SDC_PIN);
        assert_eq!(DISPLAY_BUS.address, I2C_DISPLAY_ADDRESS);
    }

    #[test]
    fn test_board_pins_map_to_unique_gpios() {
        let pins = [
            BoardPin::D0,
            BoardPin::D1,
            BoardPin::D2,
            BoardPin::D3,
            BoardPin::D4,
            BoardPin::D5,
            BoardPin::D6,
            BoardPin::D7,
            BoardPin::D8,
        ];
        for (i, a) in pins.iter().enumerate() {
            for b in &pins[i + 1..] {
                assert_ne!(a.gpio(), b.gpio(), "{} and {} alias", a.label(), b.label());
            }
        }
    }

    #[test]
    fn test_network_constants() {
        assert_eq!(BAUD_RATE, 115_200);
        assert_eq!(HOSTNAME, "weatherstation");
        assert_eq!(WIFI_TIMEOUT, 30_000);
        assert_eq!(OSWATCH_RESET_TIME, 300);
        assert_eq!(TICKER_PERIOD_SECS, 10 * 60);
    }
}
