#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use embassy_executor::Spawner;
use embassy_time::{Duration, Instant, Ticker, Timer};
use esp_hal::clock::CpuClock;
use esp_hal::timer::timg::TimerGroup;
use esp_storage::FlashStorage;
use log::{error, info, warn};

use wxstation_core::DeviceState;
use wxstation_core::config::{
    OSWATCH_RESET_TIME, SETTINGS_RETRY_SECS, TICKER_PERIOD_SECS, WIFI_TIMEOUT,
};
use wxstation_core::settings;
use wxstation_core::ticker::UpdateTicker;
use wxstation_core::watchdog::{WatchdogMonitor, WatchdogVerdict};
use wxstation_firmware::flash_store::FlashSettingsStore;
use wxstation_firmware::{hardware, wifi_secrets};

/// Pause between main loop iterations
const LOOP_PERIOD: Duration = Duration::from_millis(100);

/// How often the watchdog task looks at the loop heartbeat
const WATCHDOG_CHECK_PERIOD: Duration = Duration::from_secs(1);

static DEVICE_STATE: DeviceState = DeviceState::new();

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

/// Monotonic milliseconds, wrapping at `u32::MAX` like the state timestamps
fn now_ms() -> u32 {
    Instant::now().as_millis() as u32
}

#[embassy_executor::task]
async fn ticker_task(ticker: UpdateTicker<'static>) {
    let mut period = Ticker::every(Duration::from_secs(u64::from(TICKER_PERIOD_SECS)));
    loop {
        period.next().await;
        ticker.tick();
    }
}

#[embassy_executor::task]
async fn watchdog_task(watchdog: WatchdogMonitor<'static>) {
    info!("Watchdog armed, {} s without a loop resets", OSWATCH_RESET_TIME);
    loop {
        Timer::after(WATCHDOG_CHECK_PERIOD).await;
        if let WatchdogVerdict::Hung { stalled_ms } = watchdog.check(now_ms()) {
            error!("Main loop silent for {} ms, resetting", stalled_ms);
            Timer::after_millis(100).await;
            esp_hal::system::software_reset();
        }
    }
}

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!();

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    info!("Embassy initialized!");

    let _serial =
        match hardware::init_serial(peripherals.UART0, peripherals.GPIO43, peripherals.GPIO44) {
            Ok(uart) => Some(uart),
            Err(e) => {
                warn!("{}", e);
                None
            }
        };

    match hardware::create_display_bus(peripherals.I2C0, peripherals.GPIO4, peripherals.GPIO5) {
        Ok(mut bus) => {
            if let Err(e) = hardware::probe_display(&mut bus).await {
                warn!("{}", e);
            }
        }
        Err(e) => error!("{}", e),
    }

    let mut store = match FlashSettingsStore::new(FlashStorage::new(peripherals.FLASH)) {
        Ok(store) => Some(store),
        Err(e) => {
            error!("Settings storage unavailable, running on defaults: {:?}", e);
            None
        }
    };
    let mut station = store.as_mut().map(settings::load).unwrap_or_default();
    wifi_secrets::seed(&mut station);
    info!(
        "Hostname {}, UTC{:+}, network {:?}",
        station.hostname, station.utc_offset_hours, station.wifi.ssid
    );
    info!("Network operations time out after {} ms", WIFI_TIMEOUT);

    let Some(mut roles) = DEVICE_STATE.split() else {
        panic!("device state roles already taken");
    };
    roles.scheduler.set_utc_offset(station.utc_offset_hours);
    roles.heartbeat.feed(now_ms());

    spawner.spawn(ticker_task(roles.ticker).expect("ticker task already spawned"));
    spawner.spawn(watchdog_task(roles.watchdog).expect("watchdog task already spawned"));

    info!("Entering main loop...");
    loop {
        let now = now_ms();
        roles.heartbeat.feed(now);

        if let Some(store) = store.as_mut() {
            match roles.persister.persist_pending(now, store) {
                Ok(Some(saved)) => {
                    info!("Portal settings saved for {}", saved.wifi.ssid);
                    roles.scheduler.set_utc_offset(saved.utc_offset_hours);
                }
                Ok(None) => {}
                Err(e) => warn!(
                    "Settings not saved, retrying in {} s: {}",
                    SETTINGS_RETRY_SECS, e
                ),
            }
        }

        let due = roles.scheduler.poll(now);
        if due.periodic {
            info!("Periodic refresh due");
        }
        if due.tracked_objects {
            // No aircraft source on the device, the refresh always sees none
            let tracked = 0;
            let interval = roles.scheduler.record_refresh(now, tracked);
            info!("{} aircraft in range, next refresh in {} s", tracked, interval);
        }

        Timer::after(LOOP_PERIOD).await;
    }
}
