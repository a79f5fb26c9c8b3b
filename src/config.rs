use crate::pin::{DriveStrength, Electrical, OutputType, Pull};
use crate::timer::TimerTick;

/// Shortest trigger pulse the sensor reliably answers, in microseconds.
/// Requested holds below this are clamped up.
pub const MIN_TRIGGER_HOLD_US: u32 = 5;

/// The distance unit to use for measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum DistanceUnit {
    Centimeters,
    Inches,
}

impl DistanceUnit {
    pub fn suffix(&self) -> &'static str {
        match self {
            DistanceUnit::Centimeters => "cm",
            DistanceUnit::Inches => "in",
        }
    }
}

/// The temperature unit to use for measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
}

/// The configuration for the ranger.
///
/// Everything here is consumed when the [`Ranger`](crate::Ranger) is built;
/// nothing can be changed while it runs.
#[derive(Debug, Clone, Copy, PartialEq, defmt::Format)]
pub struct Config {
    /// Value the down-counter reloads to after reaching zero.
    pub reload: TimerTick,
    /// Prescaler register value. The counter input clock is divided by
    /// `prescale + 1`.
    pub prescale: u8,
    /// Clock feeding the prescaler, in Hz.
    pub clock_hz: u32,
    /// Requested trigger pulse length. Never shorter than [`MIN_TRIGGER_HOLD_US`].
    pub trigger_hold_us: u32,
    /// How long the line is driven low before the trigger pulse starts.
    pub idle_low_us: u32,
    /// How long the line is held low after the trigger pulse before handing
    /// it to the echo side.
    pub settle_us: u32,
    /// Upper bound for each echo edge wait.
    pub echo_timeout_us: u32,
    /// Pad settings while driving the trigger pulse.
    pub trigger_pin: Electrical,
    /// Pad settings while sensing the echo.
    pub echo_pin: Electrical,
    pub distance_unit: DistanceUnit,
    pub temperature_unit: TemperatureUnit,
    /// Ambient temperature used to fix the speed of sound at start-up, in
    /// `temperature_unit`.
    pub temperature: f64,
}

impl Default for Config {
    /// Timer 0A of the reference board: 50 MHz system clock divided by ten,
    /// reloading at 50 000 (a 10 ms epoch of 0.2 µs ticks).
    fn default() -> Self {
        Self {
            reload: 50_000,
            prescale: 9,
            clock_hz: 50_000_000,
            trigger_hold_us: MIN_TRIGGER_HOLD_US,
            idle_low_us: 2,
            settle_us: 2,
            echo_timeout_us: 20_000,
            trigger_pin: Electrical {
                drive: DriveStrength::Ma2,
                pull: Pull::None,
                output: OutputType::PushPull,
            },
            echo_pin: Electrical {
                drive: DriveStrength::Ma2,
                pull: Pull::None,
                output: OutputType::OpenDrain,
            },
            distance_unit: DistanceUnit::Centimeters,
            temperature_unit: TemperatureUnit::Celsius,
            temperature: 20.0,
        }
    }
}

impl Config {
    /// Counter ticks per second after the prescaler.
    pub fn tick_hz(&self) -> u32 {
        self.clock_hz / (self.prescale as u32 + 1)
    }

    /// The trigger hold that will actually be used.
    pub fn effective_trigger_hold_us(&self) -> u32 {
        self.trigger_hold_us.max(MIN_TRIGGER_HOLD_US)
    }
}
