//! Single-pin role switching.
//!
//! The sensor shares one line for the trigger pulse and the echo, so the pin
//! changes direction twice per cycle. [`PinModeController`] is the only place
//! that reconfigures it; the rest of the crate works through the short-lived
//! [`TriggerLine`] and [`EchoLine`] guards it hands out. A guard keeps the
//! controller mutably borrowed, so the role cannot change underneath an
//! ongoing capture.

use embedded_hal::digital::{InputPin, OutputPin};

use crate::error::RangingError;

/// What the shared line is currently used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum PinRole {
    /// Not driven and not sampled.
    Idle,
    /// Driving the trigger pulse.
    TriggerOutput,
    /// Sensing the echo.
    EchoInput,
}

/// Pad drive strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum DriveStrength {
    Ma2,
    Ma4,
    Ma8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum Pull {
    None,
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum OutputType {
    PushPull,
    OpenDrain,
}

/// Electrical pad configuration applied together with a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub struct Electrical {
    pub drive: DriveStrength,
    pub pull: Pull,
    pub output: OutputType,
}

/// A GPIO that can be switched between driving and sensing at runtime.
///
/// `apply_role` must have fully reconfigured the pad when it returns, any
/// edge sensed before that is not trustworthy. Combinations the hardware
/// cannot do are a wiring mistake, not a runtime error.
pub trait RolePin: InputPin + OutputPin {
    fn apply_role(&mut self, role: PinRole, electrical: Electrical);
}

/// Owner of the shared sensor line.
pub struct PinModeController<P> {
    pin: P,
    role: PinRole,
    trigger: Electrical,
    echo: Electrical,
}

impl<P: RolePin> PinModeController<P> {
    /// Take the pin and park it in [`PinRole::Idle`].
    pub fn new(mut pin: P, trigger: Electrical, echo: Electrical) -> Self {
        pin.apply_role(PinRole::Idle, echo);
        Self {
            pin,
            role: PinRole::Idle,
            trigger,
            echo,
        }
    }

    pub fn role(&self) -> PinRole {
        self.role
    }

    /// Reconfigure the line. Synchronous: done when this returns.
    pub fn set_role(&mut self, role: PinRole, electrical: Electrical) {
        self.pin.apply_role(role, electrical);
        self.role = role;
    }

    /// Switch to [`PinRole::TriggerOutput`] unless already there.
    pub fn trigger_line(&mut self) -> TriggerLine<'_, P> {
        if self.role != PinRole::TriggerOutput {
            self.set_role(PinRole::TriggerOutput, self.trigger);
        }
        TriggerLine { pin: &mut self.pin }
    }

    /// Switch to [`PinRole::EchoInput`] unless already there.
    pub fn echo_line(&mut self) -> EchoLine<'_, P> {
        if self.role != PinRole::EchoInput {
            self.set_role(PinRole::EchoInput, self.echo);
        }
        EchoLine { pin: &mut self.pin }
    }

    pub fn release(self) -> P {
        self.pin
    }
}

/// The line while it drives the trigger pulse.
pub struct TriggerLine<'a, P> {
    pin: &'a mut P,
}

impl<P: RolePin> TriggerLine<'_, P> {
    pub fn set_high(&mut self) -> Result<(), RangingError> {
        self.pin.set_high().map_err(RangingError::pin)
    }

    pub fn set_low(&mut self) -> Result<(), RangingError> {
        self.pin.set_low().map_err(RangingError::pin)
    }
}

/// The line while it senses the echo.
pub struct EchoLine<'a, P> {
    pin: &'a mut P,
}

impl<P: RolePin> EchoLine<'_, P> {
    pub fn is_high(&mut self) -> Result<bool, RangingError> {
        self.pin.is_high().map_err(RangingError::pin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::sim::{Event, Sim, SimPin};

    fn controller(sim: &Sim) -> PinModeController<SimPin<'_>> {
        let config = Config::default();
        PinModeController::new(SimPin::new(sim), config.trigger_pin, config.echo_pin)
    }

    #[test]
    fn starts_idle() {
        let sim = Sim::new(50_000, 5_000_000);
        let pins = controller(&sim);
        assert_eq!(pins.role(), PinRole::Idle);
        assert_eq!(sim.role(), PinRole::Idle);
    }

    #[test]
    fn guards_switch_roles_with_their_pad_settings() {
        let sim = Sim::new(50_000, 5_000_000);
        let config = Config::default();
        let mut pins = controller(&sim);

        pins.trigger_line().set_low().unwrap();
        assert_eq!(sim.role(), PinRole::TriggerOutput);
        assert_eq!(sim.electrical(), Some(config.trigger_pin));

        let _ = pins.echo_line();
        assert_eq!(pins.role(), PinRole::EchoInput);
        assert_eq!(sim.electrical(), Some(config.echo_pin));
    }

    #[test]
    fn repeated_guards_do_not_reconfigure() {
        let sim = Sim::new(50_000, 5_000_000);
        let mut pins = controller(&sim);

        pins.trigger_line().set_high().unwrap();
        pins.trigger_line().set_low().unwrap();
        let roles = sim
            .events()
            .iter()
            .filter(|e| matches!(e, Event::Role(PinRole::TriggerOutput)))
            .count();
        assert_eq!(roles, 1);
    }

    #[test]
    fn set_role_applies_explicit_settings() {
        let sim = Sim::new(50_000, 5_000_000);
        let mut pins = controller(&sim);
        let strong = Electrical {
            drive: DriveStrength::Ma8,
            pull: Pull::Down,
            output: OutputType::PushPull,
        };
        pins.set_role(PinRole::EchoInput, strong);
        assert_eq!(pins.role(), PinRole::EchoInput);
        assert_eq!(sim.electrical(), Some(strong));
    }
}
