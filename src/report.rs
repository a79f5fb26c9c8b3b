//! Turning pulse windows into distances and telling someone about it.

use core::fmt::Write;

use heapless::String;
use libm::sqrt;

use crate::burst::SampleBuffer;
use crate::config::{Config, DistanceUnit, TemperatureUnit};
use crate::echo::PulseWindow;
use crate::error::RangingError;
use crate::timer::TimerTick;

const BURST_LINE: usize = 128;
// " 65535"
const BURST_TICK_MAX: usize = 6;
const BURST_CUT: &str = " ...";

/// Where the one-line cycle records go, usually a serial console.
///
/// Fire-and-forget: a write that fails is simply lost.
pub trait TelemetrySink {
    fn write(&mut self, text: &str);
}

/// Adapts anything implementing [`core::fmt::Write`] to a [`TelemetrySink`].
pub struct FmtSink<W>(pub W);

impl<W: Write> TelemetrySink for FmtSink<W> {
    fn write(&mut self, text: &str) {
        let _ = self.0.write_str(text);
    }
}

/// One successful reading.
#[derive(Debug, Clone, Copy, PartialEq, defmt::Format)]
pub struct RangingSample {
    /// Counter reading at the rising edge.
    pub start: TimerTick,
    /// Echo length in counter ticks.
    pub ticks: u32,
    /// One-way distance in the configured unit.
    pub distance: f64,
}

/// Fixed tick-to-distance conversion, worked out once at start-up.
#[derive(Debug, Clone, Copy, PartialEq, defmt::Format)]
pub struct DistanceScale {
    tick_hz: u32,
    speed_of_sound: f64,
    unit: DistanceUnit,
}

impl DistanceScale {
    pub fn new(config: &Config) -> Self {
        Self {
            tick_hz: config.tick_hz(),
            speed_of_sound: speed_of_sound(config.temperature, config.temperature_unit),
            unit: config.distance_unit,
        }
    }

    /// Speed of sound in meters per second.
    pub fn speed_of_sound(&self) -> f64 {
        self.speed_of_sound
    }

    pub fn unit(&self) -> DistanceUnit {
        self.unit
    }

    /// One-way distance for an echo of `ticks` counter ticks.
    pub fn distance(&self, ticks: u32) -> f64 {
        let duration_secs = ticks as f64 / self.tick_hz as f64;
        // round trip
        let centimeters = self.speed_of_sound * 100.0 * duration_secs / 2.0;
        match self.unit {
            DistanceUnit::Centimeters => centimeters,
            DistanceUnit::Inches => centimeters / 2.54,
        }
    }
}

/// Speed of sound in meters per second, adjusted for temperature.
pub fn speed_of_sound(temperature: f64, unit: TemperatureUnit) -> f64 {
    let celsius = match unit {
        TemperatureUnit::Celsius => temperature,
        TemperatureUnit::Fahrenheit => (temperature - 32.0) * 5.0 / 9.0,
    };
    331.5 * sqrt(1.0 + (celsius / 273.15))
}

/// Outcome counters since start-up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, defmt::Format)]
pub struct RangingStats {
    pub cycles: u32,
    pub valid: u32,
    pub no_echo: u32,
    pub incomplete_echo: u32,
    pub wraparound: u32,
    pub stuck_high: u32,
    pub pin_faults: u32,
}

impl RangingStats {
    fn record(&mut self, reading: &Result<RangingSample, RangingError>) {
        self.cycles = self.cycles.wrapping_add(1);
        let counter = match reading {
            Ok(_) => &mut self.valid,
            Err(RangingError::NoEcho) => &mut self.no_echo,
            Err(RangingError::IncompleteEcho) => &mut self.incomplete_echo,
            Err(RangingError::WraparoundCorruption) => &mut self.wraparound,
            Err(RangingError::EchoStuckHigh) => &mut self.stuck_high,
            Err(RangingError::Pin(_)) => &mut self.pin_faults,
        };
        *counter = counter.wrapping_add(1);
    }

    /// Cycles that produced no reading.
    pub fn invalid(&self) -> u32 {
        self.cycles.wrapping_sub(self.valid)
    }
}

/// Converts each cycle's outcome and writes exactly one record for it.
pub struct Reporter<S> {
    sink: S,
    scale: DistanceScale,
    stats: RangingStats,
}

impl<S: TelemetrySink> Reporter<S> {
    pub fn new(sink: S, scale: DistanceScale) -> Self {
        Self {
            sink,
            scale,
            stats: RangingStats::default(),
        }
    }

    pub fn scale(&self) -> &DistanceScale {
        &self.scale
    }

    pub fn stats(&self) -> &RangingStats {
        &self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Report the outcome of one cycle and hand back what was reported.
    ///
    /// A failed cycle is written as `invalid <reason>`, never as a zero.
    pub fn report(
        &mut self,
        outcome: Result<PulseWindow, RangingError>,
    ) -> Result<RangingSample, RangingError> {
        let reading = outcome.and_then(|window| self.sample(window));
        self.stats.record(&reading);

        let mut line: String<64> = String::new();
        let _ = match &reading {
            Ok(sample) => {
                defmt::debug!(
                    "echo at {=u16}: {=u32} ticks, {} {}",
                    sample.start,
                    sample.ticks,
                    sample.distance,
                    self.scale.unit
                );
                writeln!(
                    line,
                    "{} {:.1}{}",
                    sample.ticks,
                    sample.distance,
                    self.scale.unit.suffix()
                )
            }
            Err(error) => {
                defmt::warn!("no reading: {}", error);
                writeln!(line, "invalid {}", error.as_str())
            }
        };
        self.sink.write(&line);
        reading
    }

    /// Write the raw edges of a burst capture as one record, or
    /// `invalid <reason>` if the burst failed.
    ///
    /// Edges that do not fit the line are cut and the record ends in `...`.
    /// Bursts are not ranging cycles and leave the stats alone.
    pub fn report_burst<const N: usize>(
        &mut self,
        outcome: Result<usize, RangingError>,
        buffer: &SampleBuffer<N>,
    ) {
        let mut line: String<BURST_LINE> = String::new();
        let _ = match outcome {
            Ok(count) => {
                defmt::debug!("burst: {=usize} edges", count);
                Self::burst_line(&mut line, buffer)
            }
            Err(error) => {
                defmt::warn!("burst failed: {}", error);
                writeln!(line, "invalid {}", error.as_str())
            }
        };
        self.sink.write(&line);
    }

    fn burst_line<const N: usize>(
        line: &mut String<BURST_LINE>,
        buffer: &SampleBuffer<N>,
    ) -> core::fmt::Result {
        write!(line, "burst {}:", buffer.len())?;
        let mut listed = 0;
        for tick in buffer.as_slice() {
            if line.len() + BURST_TICK_MAX + BURST_CUT.len() + 1 > line.capacity() {
                break;
            }
            write!(line, " {}", tick)?;
            listed += 1;
        }
        if listed < buffer.len() {
            line.push_str(BURST_CUT).map_err(|_| core::fmt::Error)?;
        }
        line.push('\n').map_err(|_| core::fmt::Error)
    }

    fn sample(&self, window: PulseWindow) -> Result<RangingSample, RangingError> {
        let ticks = window.width().ok_or(RangingError::WraparoundCorruption)?;
        Ok(RangingSample {
            start: window.start,
            ticks,
            distance: self.scale.distance(ticks),
        })
    }
}
