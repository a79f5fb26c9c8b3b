use crate::burst::SampleBuffer;
use crate::error::RangingError;
use crate::pin::{EchoLine, RolePin};
use crate::timer::{CountdownTimer, TickWatch, TimerService, TimerTick};

/// Counter readings at the two echo edges of one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub struct PulseWindow {
    /// Reading when the line went high.
    pub start: TimerTick,
    /// Reading when the line went low again.
    pub end: TimerTick,
}

impl PulseWindow {
    /// Pulse width in ticks, `None` if the readings cannot belong to the
    /// same epoch of a down-counter.
    pub fn width(&self) -> Option<u32> {
        self.start.checked_sub(self.end).map(u32::from)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum CapturePhase {
    WaitForRisingEdge,
    WaitForFallingEdge,
    Captured,
    Invalid,
}

/// Busy-polls the echo line and timestamps its edges.
///
/// Polling rather than interrupts: at microsecond scale a tight loop is more
/// precise than interrupt latency on this class of hardware. Every wait is
/// bounded by the timeout.
pub struct EchoCapture {
    timeout_ticks: u32,
    phase: CapturePhase,
}

impl EchoCapture {
    /// `timeout_ticks` is capped one below `u32::MAX` so that a saturated
    /// elapsed count still ends the wait.
    pub fn new(timeout_ticks: u32) -> Self {
        Self {
            timeout_ticks: timeout_ticks.min(u32::MAX - 1),
            phase: CapturePhase::WaitForRisingEdge,
        }
    }

    pub fn phase(&self) -> CapturePhase {
        self.phase
    }

    pub fn timeout_ticks(&self) -> u32 {
        self.timeout_ticks
    }

    /// Mark the cycle invalid without listening, for when the trigger failed.
    pub fn abandon(&mut self) {
        self.phase = CapturePhase::Invalid;
    }

    /// Capture one echo pulse.
    pub fn capture<P, T>(
        &mut self,
        line: &mut EchoLine<'_, P>,
        timer: &TimerService<T>,
    ) -> Result<PulseWindow, RangingError>
    where
        P: RolePin,
        T: CountdownTimer,
    {
        let result = self.run(line, timer);
        self.phase = match result {
            Ok(_) => CapturePhase::Captured,
            Err(_) => CapturePhase::Invalid,
        };
        result
    }

    fn run<P, T>(
        &mut self,
        line: &mut EchoLine<'_, P>,
        timer: &TimerService<T>,
    ) -> Result<PulseWindow, RangingError>
    where
        P: RolePin,
        T: CountdownTimer,
    {
        self.phase = CapturePhase::WaitForRisingEdge;
        let mut watch = timer.watch();
        let start = loop {
            let high = line.is_high()?;
            let now = watch.observe(timer.now());
            if high {
                break now;
            }
            if watch.elapsed() > self.timeout_ticks {
                return Err(RangingError::NoEcho);
            }
        };

        self.phase = CapturePhase::WaitForFallingEdge;
        let mut watch = TickWatch::new(start, timer.reload());
        let end = loop {
            let high = line.is_high()?;
            let now = watch.observe(timer.now());
            if !high {
                break now;
            }
            if watch.elapsed() > self.timeout_ticks {
                return Err(RangingError::IncompleteEcho);
            }
        };

        let window = PulseWindow { start, end };
        if watch.reloaded() || window.width().is_none() {
            return Err(RangingError::WraparoundCorruption);
        }
        Ok(window)
    }

    /// Record the counter reading at every level change of the line.
    ///
    /// Stops when `buffer` is full or the line stays quiet for the timeout.
    /// Returns the number of edges recorded; the buffer is cleared first.
    pub fn capture_edges<P, T, const N: usize>(
        &mut self,
        line: &mut EchoLine<'_, P>,
        timer: &TimerService<T>,
        buffer: &mut SampleBuffer<N>,
    ) -> Result<usize, RangingError>
    where
        P: RolePin,
        T: CountdownTimer,
    {
        buffer.clear();
        let result = self.record_edges(line, timer, buffer);
        self.phase = match result {
            Ok(_) => CapturePhase::Captured,
            Err(_) => CapturePhase::Invalid,
        };
        result
    }

    fn record_edges<P, T, const N: usize>(
        &mut self,
        line: &mut EchoLine<'_, P>,
        timer: &TimerService<T>,
        buffer: &mut SampleBuffer<N>,
    ) -> Result<usize, RangingError>
    where
        P: RolePin,
        T: CountdownTimer,
    {
        let mut level = line.is_high()?;
        let mut watch = timer.watch();
        while !buffer.is_full() {
            self.phase = if level {
                CapturePhase::WaitForFallingEdge
            } else {
                CapturePhase::WaitForRisingEdge
            };
            let high = line.is_high()?;
            let now = watch.observe(timer.now());
            if high != level {
                level = high;
                buffer.push(now);
                watch = TickWatch::new(now, timer.reload());
            } else if watch.elapsed() > self.timeout_ticks {
                break;
            }
        }
        Ok(buffer.len())
    }
}
