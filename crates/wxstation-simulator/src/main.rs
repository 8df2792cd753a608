//! Desktop simulator for the wxstation main loop.
//!
//! Runs the same cooperative loop as the firmware against the host clock,
//! sped up so the ten-minute ticker fires within a short session:
//!
//! - a background thread plays the periodic timer and sets `ready_for_update`
//! - a second thread plays the loop watchdog
//! - a synthetic aircraft feed switches the refresh interval between short
//!   and long
//! - a scripted portal submission is persisted to a settings file
//!
//! ```text
//! wxstation-simulator [SETTINGS_FILE] [RUN_SECS]
//! ```
//!
//! Set `RUST_LOG=debug` for more output.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use log::{error, info, warn};

use wxstation_core::config::{
    BAUD_RATE, DISPLAY_BUS, OSWATCH_RESET_TIME, SETTINGS_RETRY_SECS, TICKER_PERIOD_SECS,
    WIFI_TIMEOUT,
};
use wxstation_core::ota::OtaGate;
use wxstation_core::settings::{self, SettingsStore, StationSettings};
use wxstation_core::watchdog::WatchdogVerdict;
use wxstation_core::{DeviceState, StateRoles, StationError};

// ---------------------------------------------------------------------------
// Simulation constants
// ---------------------------------------------------------------------------

/// Simulated milliseconds per real millisecond.
const TIME_SCALE: u32 = 60;

/// Real time between main loop iterations.
const LOOP_PERIOD: Duration = Duration::from_millis(50);

/// Simulated time between watchdog checks.
const WATCHDOG_CHECK_MS: u32 = 1_000;

/// Simulated time at which the scripted portal submission happens.
const PORTAL_SUBMIT_AT_MS: u32 = 90_000;

const DEFAULT_SETTINGS_FILE: &str = "wxstation-settings.bin";
const DEFAULT_RUN_SECS: u64 = 30;

static DEVICE_STATE: DeviceState = DeviceState::new();

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Scaled monotonic milliseconds, wrapping like the firmware's `u32` clock.
#[derive(Clone, Copy)]
struct SimClock {
    start: Instant,
}

impl SimClock {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    fn now_ms(&self) -> u32 {
        // Truncation to u32 is the wrap the firmware sees too
        (self.start.elapsed().as_millis() as u64).wrapping_mul(u64::from(TIME_SCALE)) as u32
    }

    /// Real duration covering `sim_ms` simulated milliseconds.
    fn real(sim_ms: u32) -> Duration {
        Duration::from_millis(u64::from(sim_ms / TIME_SCALE).max(1))
    }
}

// ---------------------------------------------------------------------------
// Aircraft feed
// ---------------------------------------------------------------------------

/// Synthetic count of aircraft within range.
struct MockAircraftFeed;

impl MockAircraftFeed {
    /// Aircraft come and go in waves a few simulated minutes long.
    fn aircraft_in_range(&self, now_ms: u32) -> usize {
        let t = f64::from(now_ms) / 1000.0;
        let wave = 3.0 * (t / 90.0).sin() + (t / 23.0).cos();
        wave.max(0.0).round() as usize
    }
}

// ---------------------------------------------------------------------------
// Settings file
// ---------------------------------------------------------------------------

/// Settings record kept in a single file, standing in for flash.
struct FileSettingsStore {
    path: PathBuf,
}

impl SettingsStore for FileSettingsStore {
    type Error = io::Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let record = match fs::read(&self.path) {
            Ok(record) => record,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };
        let dst = buf.get_mut(..record.len()).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidData, "settings record too large")
        })?;
        dst.copy_from_slice(&record);
        Ok(record.len())
    }

    fn write(&mut self, record: &[u8]) -> Result<(), Self::Error> {
        fs::write(&self.path, record)
    }
}

/// What a user would type into the captive portal.
fn portal_form(utc_offset_hours: i8) -> Result<StationSettings, StationError> {
    let mut submitted = StationSettings::with_wifi("simulated-ap", "not-a-secret")?;
    submitted.set_hostname("weatherstation-sim")?;
    submitted.utc_offset_hours = utc_offset_hours;
    Ok(submitted)
}

// ---------------------------------------------------------------------------
// Timer contexts
// ---------------------------------------------------------------------------

fn spawn_ticker(roles: &StateRoles<'static>) -> io::Result<()> {
    let ticker = roles.ticker;
    thread::Builder::new()
        .name("ticker".into())
        .spawn(move || {
            loop {
                thread::sleep(SimClock::real(TICKER_PERIOD_SECS * 1000));
                ticker.tick();
            }
        })?;
    Ok(())
}

fn spawn_watchdog(roles: &StateRoles<'static>, clock: SimClock) -> io::Result<()> {
    let watchdog = roles.watchdog;
    thread::Builder::new()
        .name("watchdog".into())
        .spawn(move || {
            loop {
                thread::sleep(SimClock::real(WATCHDOG_CHECK_MS));
                if let WatchdogVerdict::Hung { stalled_ms } = watchdog.check(clock.now_ms()) {
                    error!("Main loop silent for {stalled_ms} ms, resetting");
                    std::process::exit(1);
                }
            }
        })?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let mut store = FileSettingsStore {
        path: args
            .next()
            .unwrap_or_else(|| DEFAULT_SETTINGS_FILE.into())
            .into(),
    };
    let run_for = Duration::from_secs(match args.next() {
        Some(secs) => secs.parse()?,
        None => DEFAULT_RUN_SECS,
    });

    info!("Starting wxstation simulator ({}x time)", TIME_SCALE);
    info!("Serial at {} baud", BAUD_RATE);
    info!(
        "Display on SDA {} / SCL {} at {:#04x}",
        DISPLAY_BUS.sda.label(),
        DISPLAY_BUS.scl.label(),
        DISPLAY_BUS.address
    );
    info!(
        "WiFi timeout {} ms, watchdog threshold {} s",
        WIFI_TIMEOUT, OSWATCH_RESET_TIME
    );

    let Some(mut roles) = DEVICE_STATE.split() else {
        return Err("device state roles already taken".into());
    };

    let stored = settings::load(&mut store);
    info!("Hostname {}, UTC{:+}", stored.hostname, stored.utc_offset_hours);
    roles.scheduler.set_utc_offset(stored.utc_offset_hours);

    if let Ok(password) = std::env::var("WXSTATION_OTA_PASSWORD") {
        match OtaGate::default().authorize(&password) {
            Ok(()) => info!("OTA password accepted"),
            Err(e) => warn!("{e}"),
        }
    }

    let clock = SimClock::new();
    roles.heartbeat.feed(clock.now_ms());
    spawn_ticker(&roles)?;
    spawn_watchdog(&roles, clock)?;

    let feed = MockAircraftFeed;
    let mut portal_submitted = false;
    let started = Instant::now();

    // -----------------------------------------------------------------------
    // Main loop
    // -----------------------------------------------------------------------
    while started.elapsed() < run_for {
        let now_ms = clock.now_ms();
        roles.heartbeat.feed(now_ms);

        // --- Scripted portal ------------------------------------------------
        if !portal_submitted && now_ms >= PORTAL_SUBMIT_AT_MS {
            match portal_form(stored.utc_offset_hours) {
                Ok(submitted) => {
                    info!("Portal: user saved settings for {}", submitted.wifi.ssid);
                    roles.provisioning.submit(submitted);
                }
                Err(e) => warn!("Portal form rejected: {e}"),
            }
            portal_submitted = true;
        }

        // --- Persistence ----------------------------------------------------
        match roles.persister.persist_pending(now_ms, &mut store) {
            Ok(Some(saved)) => {
                info!("Settings written to {}", store.path.display());
                roles.scheduler.set_utc_offset(saved.utc_offset_hours);
            }
            Ok(None) => {}
            Err(e) => warn!("Settings not saved, retrying in {SETTINGS_RETRY_SECS} s: {e}"),
        }

        // --- Refreshes ------------------------------------------------------
        let due = roles.scheduler.poll(now_ms);
        if due.periodic {
            let utc = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs();
            info!(
                "Periodic refresh: weather and time, local {}",
                roles.scheduler.local_time(utc)
            );
        }
        if due.tracked_objects {
            let aircraft = feed.aircraft_in_range(now_ms);
            let interval = roles.scheduler.record_refresh(now_ms, aircraft);
            info!(
                "[{:>7.1}s] {} aircraft in range, next refresh in {}s",
                f64::from(now_ms) / 1000.0,
                aircraft,
                interval
            );
        }

        thread::sleep(LOOP_PERIOD);
    }

    info!("Simulator exiting");
    Ok(())
}
