use embedded_hal::digital::ErrorKind;

/// Why a ranging cycle produced no reading.
///
/// None of these are fatal, the next cycle starts again from idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum RangingError {
    /// The echo line never went high within the timeout.
    NoEcho,
    /// The echo line went high but never came back low within the timeout.
    IncompleteEcho,
    /// The counter reloaded between the rising and the falling edge, so the
    /// two timestamps do not share an epoch.
    WraparoundCorruption,
    /// The line was already high before the trigger pulse was sent.
    EchoStuckHigh,
    /// The pin HAL reported an error.
    Pin(ErrorKind),
}

impl RangingError {
    /// Short tag used in telemetry records.
    pub fn as_str(&self) -> &'static str {
        match self {
            RangingError::NoEcho => "no-echo",
            RangingError::IncompleteEcho => "incomplete-echo",
            RangingError::WraparoundCorruption => "wraparound",
            RangingError::EchoStuckHigh => "echo-stuck-high",
            RangingError::Pin(_) => "pin-fault",
        }
    }

    pub(crate) fn pin<E: embedded_hal::digital::Error>(error: E) -> Self {
        RangingError::Pin(error.kind())
    }
}

impl core::fmt::Display for RangingError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
