use heapless::Vec;

use crate::timer::TimerTick;

/// Edges kept by the burst debugging mode unless told otherwise.
pub const DEFAULT_BURST_EDGES: usize = 10;

/// Raw edge timestamps of one burst capture.
///
/// Fixed capacity, overwritten by every burst. Not used for steady-state
/// ranging.
#[derive(Debug, Clone, Default, PartialEq, Eq, defmt::Format)]
pub struct SampleBuffer<const N: usize = DEFAULT_BURST_EDGES> {
    edges: Vec<TimerTick, N>,
}

impl<const N: usize> SampleBuffer<N> {
    pub fn new() -> Self {
        Self { edges: Vec::new() }
    }

    pub fn clear(&mut self) {
        self.edges.clear();
    }

    /// Append a reading; ignored once the buffer is full.
    pub fn push(&mut self, tick: TimerTick) -> bool {
        self.edges.push(tick).is_ok()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.edges.is_full()
    }

    pub fn as_slice(&self) -> &[TimerTick] {
        &self.edges
    }

    /// Ticks between consecutive edges. Only meaningful while the readings
    /// stay inside one reload epoch.
    pub fn intervals(&self) -> impl Iterator<Item = u32> + '_ {
        self.edges
            .windows(2)
            .map(|pair| pair[0].wrapping_sub(pair[1]) as u32)
    }
}
