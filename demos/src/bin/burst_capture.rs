//! # Burst capture
//! Triggers the sensor once a second and logs the raw counter reading of every edge seen on the SIG line.
//! Useful to check the wiring and the sensor's hold-off before trusting the distances.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::gpio::Flex;
use embassy_time::{Delay, Duration, Timer};
use ping_ranger::{Config, Ranger, SampleBuffer};
use ping_ranger_demos::{DefmtSink, SignalLine, UptimeCounter};
use {defmt_rtt as _, panic_probe as _};

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    info!("Running!");

    let line = SignalLine(Flex::new(p.PIN_15));
    let config = Config {
        prescale: 0,
        clock_hz: 1_000_000,
        ..Config::default()
    };

    let mut ranger = Ranger::new(line, UptimeCounter::new(), Delay, DefmtSink, config);
    let mut edges: SampleBuffer = SampleBuffer::new();

    loop {
        match ranger.burst(&mut edges) {
            Ok(count) => info!("{} edges: {}", count, edges.as_slice()),
            Err(e) => info!("Burst error: {}", e),
        }
        Timer::after(Duration::from_secs(1)).await;
    }
}
