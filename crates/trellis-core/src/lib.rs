#![warn(missing_docs)]

//! trellis-core: foundational types shared across the workspace.
//!
//! This crate carries the minimal surface every other layer depends on:
//! - Configuration knobs with protocol defaults
//! - Error taxonomy and the crate-wide `Result`
//! - Protocol constants (window geometry, header widths)
//! - The datagram-transport boundary trait
//!
//! Protocol framing lives in `trellis-protocol`; the reliability modules and
//! the connection multiplexer live in `trellis-link`.

/// Protocol constants shared across layers.
pub mod constants {
    /// Width of the per-frame header: command (1) + slot (1) + timestamp (4).
    pub const HEADER_SIZE: usize = 6;
    /// Width of the channel tag prefixing every datagram.
    pub const CHANNEL_TAG_SIZE: usize = 1;
    /// Slot count of the unordered sliding window.
    pub const UNORDERED_SLOTS: usize = 32;
    /// Slot count of the ordered sliding window.
    pub const ORDERED_SLOTS: usize = 16;
    /// How many slots past the remote release pointer the ordered window may
    /// keep in flight.
    pub const ORDERED_ALLOWANCE: u8 = 8;
    /// Resend interval for the control (stop-and-wait) channel, milliseconds.
    pub const CONTROL_RESEND_MS: u32 = 300;
    /// Resend interval for the unordered window, milliseconds.
    pub const UNORDERED_RESEND_MS: u32 = 400;
    /// Resend interval for the ordered window, milliseconds.
    pub const ORDERED_RESEND_MS: u32 = 350;
    /// Keepalive ping interval, milliseconds.
    pub const KEEPALIVE_INTERVAL_MS: u32 = 1_000;
    /// Silence threshold after which a connection is reported lost,
    /// milliseconds.
    pub const CONNECTION_TIMEOUT_MS: u32 = 10_000;
}

/// Configuration options for a connection.
pub mod config;
/// Error types and results.
pub mod error;
/// Datagram transport boundary for pluggable I/O.
pub mod transport;

pub use config::Config;
pub use error::{ErrorKind, Result};
pub use transport::DatagramSocket;
