use crate::constants::{
    CONNECTION_TIMEOUT_MS, CONTROL_RESEND_MS, KEEPALIVE_INTERVAL_MS, ORDERED_RESEND_MS,
    UNORDERED_RESEND_MS,
};

/// Configuration options to tune connection behavior.
///
/// All intervals are expressed in milliseconds of the caller-supplied tick
/// clock, the same unit that travels in frame headers. Window sizes are
/// compile-time constants (`constants::UNORDERED_SLOTS`,
/// `constants::ORDERED_SLOTS`, `constants::ORDERED_ALLOWANCE`) because the
/// slot arrays are fixed-size by design.
#[derive(Clone, Debug)]
pub struct Config {
    /// Resend interval for in-flight control frames.
    pub control_resend_ms: u32,
    /// Resend interval for in-flight unordered-window frames.
    pub unordered_resend_ms: u32,
    /// Resend interval for in-flight ordered-window frames.
    pub ordered_resend_ms: u32,
    /// Interval between keepalive pings while the control slot is idle.
    pub keepalive_interval_ms: u32,
    /// Max silence before the connection is reported lost.
    pub connection_timeout_ms: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            control_resend_ms: CONTROL_RESEND_MS,
            unordered_resend_ms: UNORDERED_RESEND_MS,
            ordered_resend_ms: ORDERED_RESEND_MS,
            keepalive_interval_ms: KEEPALIVE_INTERVAL_MS,
            connection_timeout_ms: CONNECTION_TIMEOUT_MS,
        }
    }
}
