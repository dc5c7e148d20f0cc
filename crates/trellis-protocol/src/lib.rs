#![warn(missing_docs)]

//! trellis-protocol: the shared binary framing of the reliability layer.
//!
//! Every datagram opens with a one-byte channel tag; every reliable frame
//! continues with the fixed header (command, slot, timestamp), an optional
//! channel-specific sequence field, and the payload. This crate owns that
//! format plus the small bookkeeping types the reliability strategies share:
//! the per-slot transmit record and the acknowledgment bitmask.

/// Channel tags multiplexing one datagram stream.
pub mod channel;
/// Per-slot transmit records and last-accepted memos.
pub mod frame;
/// Fixed frame header and field codecs.
pub mod header;
/// Acknowledgment bitmask for the ordered window.
pub mod mask;
/// Wraparound-aware sequence and slot comparisons.
pub mod sequence;

pub use channel::Channel;
pub use frame::{Frame, Memo};
pub use header::{Command, Header};
pub use mask::Mask;
