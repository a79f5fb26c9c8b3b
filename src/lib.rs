//! # ping_ranger
//!
//! This crate drives a single-pin ultrasonic ranger (PING)))-style sensor) from a
//! free-running, reloading down-counter.
//!
//! The sensor uses one line for both directions: the controller drives a short
//! trigger pulse on it, then turns the pin around and times the echo pulse the
//! sensor answers with. The echo length encodes the distance.
//!
//! A ranging cycle is
//!
//! 1. trigger: drive the line low, high for at least 5 µs, low again
//! 2. capture: switch the pin to input and busy-poll for the rising and the
//!    falling edge of the echo, reading the counter at each
//! 3. report: convert the tick count to a distance and write one line to the
//!    telemetry sink, or an `invalid <reason>` line if the cycle failed
//!
//! Every wait is bounded, so a missing or disconnected sensor produces an
//! `invalid no-echo` record instead of a hang. An echo that straddles a reload
//! of the counter is reported as `invalid wraparound` rather than as a wrong
//! distance.
//!
//! # Example
//!
//! ```rust, ignore
//! #![no_std]
//! #![no_main]
//!
//! use defmt::*;
//! use embassy_executor::Spawner;
//! use embassy_rp::gpio::Flex;
//! use embassy_time::Delay;
//! use ping_ranger::{Config, Ranger};
//! use ping_ranger_demos::{DefmtSink, SignalLine, UptimeCounter};
//! use {defmt_rtt as _, panic_probe as _};
//!
//! #[embassy_executor::main]
//! async fn main(_spawner: Spawner) {
//!     let p = embassy_rp::init(Default::default());
//!     info!("Running!");
//!
//!     // RP2040 impls of `RolePin` and `CountdownTimer`, from `demos/`
//!     let line = SignalLine(Flex::new(p.PIN_15));
//!     let counter = UptimeCounter::new();
//!
//!     let config = Config {
//!         clock_hz: 1_000_000,
//!         prescale: 0,
//!         ..Config::default()
//!     };
//!
//!     let mut ranger = Ranger::new(line, counter, Delay, DefmtSink, config);
//!     ranger.run_async(&mut Delay, 100).await
//! }
//! ```

#![no_std]

mod burst;
mod config;
mod echo;
mod error;
mod pin;
mod report;
mod timer;
mod trigger;

#[cfg(test)]
mod sim;

pub use burst::{SampleBuffer, DEFAULT_BURST_EDGES};
pub use config::{Config, DistanceUnit, TemperatureUnit, MIN_TRIGGER_HOLD_US};
pub use echo::{CapturePhase, EchoCapture, PulseWindow};
pub use error::RangingError;
pub use pin::{
    DriveStrength, EchoLine, Electrical, OutputType, PinModeController, PinRole, Pull, RolePin,
    TriggerLine,
};
pub use report::{
    speed_of_sound, DistanceScale, FmtSink, RangingSample, RangingStats, Reporter, TelemetrySink,
};
pub use timer::{CountdownTimer, TickWatch, TimerService, TimerTick};
pub use trigger::{TriggerPhase, TriggerSequencer};

use embedded_hal::delay::DelayNs;
use embedded_hal_async::delay::DelayNs as DelayNsAsync;

/// The ranging task: sole owner of the sensor line, the counter, the
/// blocking delay and the telemetry sink.
///
/// # Note
///
/// [`cycle`](Self::cycle) blocks for the whole measurement, which is bounded
/// by the trigger holds plus twice `echo_timeout_us`.
pub struct Ranger<PIN, TIMER, DELAY, SINK> {
    pins: PinModeController<PIN>,
    timer: TimerService<TIMER>,
    delay: DELAY,
    trigger: TriggerSequencer,
    echo: EchoCapture,
    reporter: Reporter<SINK>,
}

impl<PIN, TIMER, DELAY, SINK> Ranger<PIN, TIMER, DELAY, SINK>
where
    PIN: RolePin,
    TIMER: CountdownTimer,
    DELAY: DelayNs,
    SINK: TelemetrySink,
{
    /// Take ownership of the hardware and start the counter.
    ///
    /// The pin is parked in [`PinRole::Idle`] until the first cycle.
    pub fn new(pin: PIN, timer: TIMER, delay: DELAY, sink: SINK, config: Config) -> Self {
        let pins = PinModeController::new(pin, config.trigger_pin, config.echo_pin);
        let timer = TimerService::new(timer, config.reload, config.prescale, config.clock_hz);
        let echo = EchoCapture::new(timer.ticks_from_micros(config.echo_timeout_us));
        let trigger = TriggerSequencer::new(&config);
        let reporter = Reporter::new(sink, DistanceScale::new(&config));
        defmt::info!(
            "ranger ready: hold {=u32} us, timeout {=u32} ticks",
            trigger.hold_us(),
            echo.timeout_ticks()
        );
        Self {
            pins,
            timer,
            delay,
            trigger,
            echo,
            reporter,
        }
    }

    /// Run one trigger, capture and report cycle.
    ///
    /// Exactly one record is written to the sink whatever the outcome.
    pub fn cycle(&mut self) -> Result<RangingSample, RangingError> {
        let outcome = match self.trigger.fire(&mut self.pins, &mut self.delay) {
            Ok(()) => self.echo.capture(&mut self.pins.echo_line(), &self.timer),
            Err(error) => {
                self.echo.abandon();
                Err(error)
            }
        };
        self.reporter.report(outcome)
    }

    /// Trigger once and record the raw edge timestamps instead of a distance.
    ///
    /// Debugging aid; the record is written as `burst <n>: <ticks>...`, or
    /// `invalid <reason>` when the burst fails.
    pub fn burst<const N: usize>(
        &mut self,
        buffer: &mut SampleBuffer<N>,
    ) -> Result<usize, RangingError> {
        buffer.clear();
        let edges = match self.trigger.fire(&mut self.pins, &mut self.delay) {
            Ok(()) => self
                .echo
                .capture_edges(&mut self.pins.echo_line(), &self.timer, buffer),
            Err(error) => {
                self.echo.abandon();
                Err(error)
            }
        };
        self.reporter.report_burst(edges, buffer);
        edges
    }

    /// Range forever, waiting `interval_ms` between cycles with the blocking
    /// delay.
    pub fn run(&mut self, interval_ms: u32) -> ! {
        loop {
            let _ = self.cycle();
            self.delay.delay_ms(interval_ms);
        }
    }

    /// Range forever, yielding to the executor between cycles.
    ///
    /// The cycle itself still blocks; only the pause between cycles is
    /// awaited.
    pub async fn run_async<PACER: DelayNsAsync>(
        &mut self,
        pacer: &mut PACER,
        interval_ms: u32,
    ) -> ! {
        loop {
            let _ = self.cycle();
            pacer.delay_ms(interval_ms).await;
        }
    }

    pub fn stats(&self) -> &RangingStats {
        self.reporter.stats()
    }

    pub fn pin_role(&self) -> PinRole {
        self.pins.role()
    }

    pub fn trigger_phase(&self) -> TriggerPhase {
        self.trigger.phase()
    }

    pub fn capture_phase(&self) -> CapturePhase {
        self.echo.phase()
    }

    pub fn sink(&self) -> &SINK {
        self.reporter.sink()
    }

    /// Stop the counter and give the hardware back.
    pub fn release(self) -> (PIN, TIMER, DELAY, SINK) {
        let Ranger {
            pins,
            timer,
            delay,
            reporter,
            ..
        } = self;
        (pins.release(), timer.release(), delay, reporter.into_sink())
    }
}
