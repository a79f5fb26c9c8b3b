//! The free-running down-counter used to timestamp echo edges.

/// One reading of the reloading down-counter.
pub type TimerTick = u16;

/// A periodic down-counter.
///
/// Counts from the reload value down to zero, then reloads and keeps going.
/// Reading a disabled counter returns a stale value; callers must not rely on
/// it.
pub trait CountdownTimer {
    /// Set the reload value and the prescaler (input clock divided by
    /// `prescale + 1`).
    fn configure(&mut self, reload: TimerTick, prescale: u8);
    fn enable(&mut self);
    fn disable(&mut self);
    /// The live counter value.
    fn current_tick(&self) -> TimerTick;
}

/// Sole owner of the hardware counter.
///
/// The counter is configured and started once and then left running across
/// cycles.
pub struct TimerService<T> {
    timer: T,
    reload: TimerTick,
    tick_hz: u32,
}

impl<T: CountdownTimer> TimerService<T> {
    pub fn new(mut timer: T, reload: TimerTick, prescale: u8, clock_hz: u32) -> Self {
        timer.configure(reload, prescale);
        timer.enable();
        let tick_hz = clock_hz / (prescale as u32 + 1);
        defmt::info!("timer running: reload {=u16}, {=u32} Hz", reload, tick_hz);
        Self {
            timer,
            reload,
            tick_hz,
        }
    }

    pub fn now(&self) -> TimerTick {
        self.timer.current_tick()
    }

    pub fn reload(&self) -> TimerTick {
        self.reload
    }

    pub fn tick_hz(&self) -> u32 {
        self.tick_hz
    }

    /// Convert a duration in microseconds to counter ticks, rounding up.
    pub fn ticks_from_micros(&self, micros: u32) -> u32 {
        let ticks = (micros as u64 * self.tick_hz as u64).div_ceil(1_000_000);
        ticks.min(u32::MAX as u64) as u32
    }

    /// Start following the counter from a fresh reading.
    pub fn watch(&self) -> TickWatch {
        TickWatch::new(self.now(), self.reload)
    }

    /// Stop the counter and hand it back.
    pub fn release(mut self) -> T {
        self.timer.disable();
        self.timer
    }
}

/// Follows successive counter readings.
///
/// A reading above the previous one means the counter reloaded in between.
/// Elapsed ticks are accumulated across reloads, so waits longer than one
/// epoch still time out. Readings must be taken more often than once per
/// epoch, which any busy-poll loop does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub struct TickWatch {
    reload: TimerTick,
    last: TimerTick,
    elapsed: u32,
    reloads: u32,
}

impl TickWatch {
    pub fn new(now: TimerTick, reload: TimerTick) -> Self {
        Self {
            reload,
            last: now,
            elapsed: 0,
            reloads: 0,
        }
    }

    /// Take a new reading into account and return it.
    pub fn observe(&mut self, now: TimerTick) -> TimerTick {
        let step = if now > self.last {
            self.reloads = self.reloads.saturating_add(1);
            // down to zero, one tick to reload, then down from reload to `now`
            self.last as u32 + 1 + self.reload.saturating_sub(now) as u32
        } else {
            (self.last - now) as u32
        };
        self.elapsed = self.elapsed.saturating_add(step);
        self.last = now;
        now
    }

    /// Ticks elapsed since the watch started.
    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    /// Whether the counter reloaded since the watch started.
    pub fn reloaded(&self) -> bool {
        self.reloads > 0
    }
}
