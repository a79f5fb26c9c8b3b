//! # Steady-state ranging
//! Measures the distance with a PING)))-style sensor every 100 ms and logs one record per cycle.
//!
//! ## Note
//!
//! The sensor has a single SIG line used for both the trigger and the echo. Connect it to GPIO 15.
//! The sensor is rated for 5V while the Pico is a 3.3V device: put a level shifter or a voltage divider on SIG,
//! the echo pulse will otherwise be driven at 5V into the controller.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::gpio::Flex;
use embassy_time::Delay;
use ping_ranger::{Config, DistanceUnit, Ranger, TemperatureUnit};
use ping_ranger_demos::{DefmtSink, SignalLine, UptimeCounter};
use {defmt_rtt as _, panic_probe as _};

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    info!("Running!");

    let line = SignalLine(Flex::new(p.PIN_15));

    // the uptime clock ticks at 1 MHz, so a 50 000 reload gives a 50 ms epoch
    let config = Config {
        reload: 50_000,
        prescale: 0,
        clock_hz: 1_000_000,
        distance_unit: DistanceUnit::Centimeters,
        temperature_unit: TemperatureUnit::Celsius,
        temperature: 24.0,
        ..Config::default()
    };

    let mut ranger = Ranger::new(line, UptimeCounter::new(), Delay, DefmtSink, config);
    ranger.run_async(&mut Delay, 100).await
}
