//! Board glue shared by the demo binaries: the RP2040 side of the
//! `ping_ranger` hardware traits.

#![no_std]

use core::convert::Infallible;

use defmt::info;
use embassy_rp::gpio::{Drive, Flex, Pull as RpPull};
use embassy_time::Instant;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use ping_ranger::{
    CountdownTimer, DriveStrength, Electrical, PinRole, Pull, RolePin, TelemetrySink, TimerTick,
};

/// The sensor's SIG line on a `Flex` pin.
///
/// RP2040 pads are push-pull only, so an open-drain request drives push-pull.
pub struct SignalLine<'d>(pub Flex<'d>);

impl ErrorType for SignalLine<'_> {
    type Error = Infallible;
}

impl InputPin for SignalLine<'_> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0.is_high())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0.is_low())
    }
}

impl OutputPin for SignalLine<'_> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.set_low();
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.set_high();
        Ok(())
    }
}

impl RolePin for SignalLine<'_> {
    fn apply_role(&mut self, role: PinRole, electrical: Electrical) {
        self.0.set_pull(match electrical.pull {
            Pull::None => RpPull::None,
            Pull::Up => RpPull::Up,
            Pull::Down => RpPull::Down,
        });
        self.0.set_drive_strength(match electrical.drive {
            DriveStrength::Ma2 => Drive::_2mA,
            DriveStrength::Ma4 => Drive::_4mA,
            DriveStrength::Ma8 => Drive::_8mA,
        });
        match role {
            PinRole::TriggerOutput => {
                self.0.set_low();
                self.0.set_as_output();
            }
            PinRole::EchoInput | PinRole::Idle => self.0.set_as_input(),
        }
    }
}

/// A reloading down-counter derived from the embassy uptime clock (1 MHz).
pub struct UptimeCounter {
    reload: TimerTick,
    divisor: u64,
    stopped_at: Option<TimerTick>,
}

impl UptimeCounter {
    pub fn new() -> Self {
        Self {
            reload: TimerTick::MAX,
            divisor: 1,
            stopped_at: Some(TimerTick::MAX),
        }
    }

    fn live(&self) -> TimerTick {
        let ticks = Instant::now().as_micros() / self.divisor;
        let epoch = self.reload as u64 + 1;
        self.reload - (ticks % epoch) as TimerTick
    }
}

impl Default for UptimeCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl CountdownTimer for UptimeCounter {
    fn configure(&mut self, reload: TimerTick, prescale: u8) {
        self.reload = reload;
        self.divisor = prescale as u64 + 1;
    }

    fn enable(&mut self) {
        self.stopped_at = None;
    }

    fn disable(&mut self) {
        self.stopped_at = Some(self.live());
    }

    fn current_tick(&self) -> TimerTick {
        self.stopped_at.unwrap_or_else(|| self.live())
    }
}

/// Sends every record to the defmt log.
pub struct DefmtSink;

impl TelemetrySink for DefmtSink {
    fn write(&mut self, text: &str) {
        info!("{=str}", text.trim_end());
    }
}
