//! Simulated hardware for the unit tests.
//!
//! One [`Sim`] holds a virtual clock in counter ticks. Every counter read
//! costs one tick, delays advance the clock by their length, and the pin
//! answers from a scripted echo measured from the moment it was switched to
//! [`PinRole::EchoInput`].

use core::cell::{Cell, RefCell};
use core::convert::Infallible;
use core::fmt::Write;
use core::sync::atomic::{AtomicU32, Ordering};

use defmt_rtt as _;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use heapless::{String, Vec};

use crate::pin::{Electrical, PinRole, RolePin};
use crate::report::TelemetrySink;
use crate::timer::{CountdownTimer, TimerTick};

// timestamp provider
static COUNT: AtomicU32 = AtomicU32::new(0);
defmt::timestamp!("{=u32:us}", COUNT.fetch_add(1, Ordering::Relaxed));

use critical_section::RawRestoreState;

struct CriticalSection;

unsafe impl critical_section::Impl for CriticalSection {
    unsafe fn acquire() -> RawRestoreState {}

    unsafe fn release(_state: RawRestoreState) {}
}
critical_section::set_impl!(CriticalSection);

/// What the sensor does after the line is handed to the echo side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Echo {
    Silent,
    StuckHigh,
    /// `count` pulses, the first rising `after` ticks after the hand-off.
    Train {
        after: u64,
        high: u64,
        low: u64,
        count: u64,
    },
}

impl Echo {
    pub fn pulse(after: u64, width: u64) -> Self {
        Echo::Train {
            after,
            high: width,
            low: 0,
            count: 1,
        }
    }

    fn level(&self, since_handoff: u64) -> bool {
        match *self {
            Echo::Silent => false,
            Echo::StuckHigh => true,
            Echo::Train {
                after,
                high,
                low,
                count,
            } => {
                if since_handoff < after {
                    return false;
                }
                let offset = since_handoff - after;
                let period = high + low;
                offset / period < count && offset % period < high
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Role(PinRole),
    Drive(bool),
    Delay(u32),
}

pub struct Sim {
    reload: TimerTick,
    tick_hz: u32,
    now: Cell<u64>,
    enabled: Cell<bool>,
    stale: Cell<TimerTick>,
    setup: Cell<Option<(TimerTick, u8)>>,
    role: Cell<PinRole>,
    electrical: Cell<Option<Electrical>>,
    driven: Cell<bool>,
    handoff: Cell<u64>,
    echo: Cell<Echo>,
    events: RefCell<Vec<Event, 64>>,
}

impl Sim {
    pub fn new(reload: TimerTick, tick_hz: u32) -> Self {
        Self {
            reload,
            tick_hz,
            now: Cell::new(0),
            enabled: Cell::new(false),
            stale: Cell::new(reload),
            setup: Cell::new(None),
            role: Cell::new(PinRole::Idle),
            electrical: Cell::new(None),
            driven: Cell::new(false),
            handoff: Cell::new(0),
            echo: Cell::new(Echo::Silent),
            events: RefCell::new(Vec::new()),
        }
    }

    pub fn set_echo(&self, echo: Echo) {
        self.echo.set(echo);
    }

    /// Ticks since the simulation started.
    pub fn now(&self) -> u64 {
        self.now.get()
    }

    pub fn advance(&self, ticks: u64) {
        self.now.set(self.now.get() + ticks);
    }

    pub fn role(&self) -> PinRole {
        self.role.get()
    }

    pub fn electrical(&self) -> Option<Electrical> {
        self.electrical.get()
    }

    pub fn timer_enabled(&self) -> bool {
        self.enabled.get()
    }

    pub fn timer_setup(&self) -> Option<(TimerTick, u8)> {
        self.setup.get()
    }

    pub fn events(&self) -> Vec<Event, 64> {
        self.events.borrow().clone()
    }

    pub fn clear_events(&self) {
        self.events.borrow_mut().clear();
    }

    fn log(&self, event: Event) {
        let _ = self.events.borrow_mut().push(event);
    }

    fn counter(&self) -> TimerTick {
        let epoch = self.reload as u64 + 1;
        self.reload - (self.now.get() % epoch) as TimerTick
    }

    fn line_level(&self) -> bool {
        match self.role.get() {
            PinRole::EchoInput => self
                .echo
                .get()
                .level(self.now.get() - self.handoff.get()),
            PinRole::TriggerOutput => self.driven.get(),
            PinRole::Idle => false,
        }
    }
}

pub struct SimTimer<'a> {
    sim: &'a Sim,
}

impl<'a> SimTimer<'a> {
    pub fn new(sim: &'a Sim) -> Self {
        Self { sim }
    }
}

impl CountdownTimer for SimTimer<'_> {
    fn configure(&mut self, reload: TimerTick, prescale: u8) {
        self.sim.setup.set(Some((reload, prescale)));
    }

    fn enable(&mut self) {
        self.sim.enabled.set(true);
    }

    fn disable(&mut self) {
        self.sim.stale.set(self.sim.counter());
        self.sim.enabled.set(false);
    }

    fn current_tick(&self) -> TimerTick {
        if !self.sim.enabled.get() {
            return self.sim.stale.get();
        }
        let tick = self.sim.counter();
        self.sim.advance(1);
        tick
    }
}

pub struct SimPin<'a> {
    sim: &'a Sim,
}

impl<'a> SimPin<'a> {
    pub fn new(sim: &'a Sim) -> Self {
        Self { sim }
    }
}

impl ErrorType for SimPin<'_> {
    type Error = Infallible;
}

impl InputPin for SimPin<'_> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.sim.line_level())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.sim.line_level())
    }
}

impl OutputPin for SimPin<'_> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.sim.driven.set(false);
        self.sim.log(Event::Drive(false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.sim.driven.set(true);
        self.sim.log(Event::Drive(true));
        Ok(())
    }
}

impl RolePin for SimPin<'_> {
    fn apply_role(&mut self, role: PinRole, electrical: Electrical) {
        if role == PinRole::EchoInput {
            self.sim.handoff.set(self.sim.now.get());
        }
        self.sim.role.set(role);
        self.sim.electrical.set(Some(electrical));
        self.sim.log(Event::Role(role));
    }
}

/// Busy-wait stand-in that moves the clock forward.
pub struct SimDelay<'a> {
    sim: &'a Sim,
}

impl<'a> SimDelay<'a> {
    pub fn new(sim: &'a Sim) -> Self {
        Self { sim }
    }
}

impl DelayNs for SimDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        self.sim.log(Event::Delay(ns));
        let ticks = (ns as u64 * self.sim.tick_hz as u64).div_ceil(1_000_000_000);
        self.sim.advance(ticks);
    }
}

/// Collects everything written to it.
pub struct RecordingSink {
    text: String<2048>,
    writes: usize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            writes: 0,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl TelemetrySink for RecordingSink {
    fn write(&mut self, text: &str) {
        self.writes += 1;
        let _ = self.text.write_str(text);
    }
}

/// A pin whose reads fail once it senses.
pub struct FaultyPin;

impl ErrorType for FaultyPin {
    type Error = embedded_hal::digital::ErrorKind;
}

impl InputPin for FaultyPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Err(embedded_hal::digital::ErrorKind::Other)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Err(embedded_hal::digital::ErrorKind::Other)
    }
}

impl OutputPin for FaultyPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl RolePin for FaultyPin {
    fn apply_role(&mut self, _role: PinRole, _electrical: Electrical) {}
}
