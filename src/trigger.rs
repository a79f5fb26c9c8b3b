use embedded_hal::delay::DelayNs;

use crate::config::Config;
use crate::error::RangingError;
use crate::pin::{PinModeController, PinRole, RolePin};

/// Where the trigger sequence currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum TriggerPhase {
    Idle,
    AssertHigh,
    DeassertLow,
    HandoffToEcho,
}

/// Generates the start pulse of a ranging cycle.
///
/// All holds are blocking delays; the pulse is a few microseconds long and
/// would be lost in scheduling jitter otherwise.
pub struct TriggerSequencer {
    idle_low_us: u32,
    hold_us: u32,
    settle_us: u32,
    phase: TriggerPhase,
}

impl TriggerSequencer {
    pub fn new(config: &Config) -> Self {
        Self {
            idle_low_us: config.idle_low_us,
            hold_us: config.effective_trigger_hold_us(),
            settle_us: config.settle_us,
            phase: TriggerPhase::Idle,
        }
    }

    pub fn phase(&self) -> TriggerPhase {
        self.phase
    }

    /// The pulse length in use, never below the sensor minimum.
    pub fn hold_us(&self) -> u32 {
        self.hold_us
    }

    /// Run the sequence from idle to the echo hand-off.
    ///
    /// On return the line is in [`PinRole::EchoInput`].
    pub fn fire<P, D>(
        &mut self,
        pins: &mut PinModeController<P>,
        delay: &mut D,
    ) -> Result<(), RangingError>
    where
        P: RolePin,
        D: DelayNs,
    {
        self.phase = TriggerPhase::Idle;
        loop {
            self.phase = match self.phase {
                TriggerPhase::Idle => {
                    // an echo still in flight would be read as ours
                    if pins.role() == PinRole::EchoInput && pins.echo_line().is_high()? {
                        return Err(RangingError::EchoStuckHigh);
                    }
                    let mut line = pins.trigger_line();
                    line.set_low()?;
                    delay.delay_us(self.idle_low_us);
                    TriggerPhase::AssertHigh
                }
                TriggerPhase::AssertHigh => {
                    pins.trigger_line().set_high()?;
                    delay.delay_us(self.hold_us);
                    TriggerPhase::DeassertLow
                }
                TriggerPhase::DeassertLow => {
                    pins.trigger_line().set_low()?;
                    delay.delay_us(self.settle_us);
                    TriggerPhase::HandoffToEcho
                }
                TriggerPhase::HandoffToEcho => {
                    let _ = pins.echo_line();
                    return Ok(());
                }
            };
        }
    }
}
