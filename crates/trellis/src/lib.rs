#![warn(missing_docs)]

//! Trellis: a small public API facade for the workspace.
//!
//! This crate re-exports the surface needed to run a channel-multiplexed
//! reliable link over any datagram transport:
//!
//! - Connection and its events (`Connection`, `LinkEvent`, `LinkState`)
//! - Channels and their guarantees (`Channel`)
//! - Core configuration and the transport boundary (`Config`,
//!   `DatagramSocket`)
//!
//! The connection is sans-I/O: the owner feeds inbound datagrams, ticks a
//! millisecond clock, and drains outbound datagrams. See the `server` and
//! `client` examples for wiring it to a `std::net::UdpSocket`.
//!
//! Example
//! ```
//! use trellis::{Channel, Config, Connection, LinkEvent};
//!
//! let (mut a, _a_events) = Connection::new(Config::default());
//! let (mut b, b_events) = Connection::new(Config::default());
//!
//! // Handshake: a's connect frame out, b's acknowledgment back.
//! a.connect(0);
//! a.update(0);
//! while let Some(datagram) = a.poll_transmit() {
//!     b.input(1, &datagram).unwrap();
//! }
//! while let Some(datagram) = b.poll_transmit() {
//!     a.input(2, &datagram).unwrap();
//! }
//! assert!(a.is_active() && b.is_active());
//!
//! // An ordered payload reaches the peer as a Packet event.
//! a.output(3, Channel::Ordered, b"hello").unwrap();
//! while let Some(datagram) = a.poll_transmit() {
//!     b.input(4, &datagram).unwrap();
//! }
//! assert!(b_events
//!     .try_iter()
//!     .any(|event| matches!(event, LinkEvent::Packet { payload, .. } if payload == b"hello")));
//! ```

// Core config, errors, and the transport boundary
pub use trellis_core::{constants, Config, DatagramSocket, ErrorKind, Result};
// Link: the connection multiplexer and its events
pub use trellis_link::{
    CloseReason, Connection, LinkEvent, LinkObserver, LinkState, NullObserver, Signal,
};
// Protocol: channel tags
pub use trellis_protocol::Channel;

/// Convenience prelude with the most commonly used items.
pub mod prelude {
    pub use crate::{
        Channel, CloseReason, Config, Connection, DatagramSocket, ErrorKind, LinkEvent,
        LinkObserver, LinkState, Signal,
    };
}
