#![warn(missing_docs)]

//! trellis-link: the transmission/reliability layer.
//!
//! One [`Connection`] multiplexes four logical channels over a single
//! datagram stream, each with its own delivery guarantee:
//!
//! - `Control` — stop-and-wait, carries connect/disconnect/ping signals
//! - `Direct` — fire-and-forget pass-through
//! - `Unordered` — sliding window, reliable, delivered as slots complete
//! - `Ordered` — sliding window, reliable, released strictly in send order
//!
//! The layer performs no I/O and spawns no threads: the owner feeds inbound
//! datagrams into [`Connection::input`], ticks [`Connection::update`], drains
//! outbound datagrams with [`Connection::poll_transmit`], and receives
//! application events over the channel handed out at construction.

/// Connection multiplexer and link state machine.
pub mod connection;
/// Pass-through module for the direct channel.
pub mod direct;
/// Link events and control signals.
pub mod event;
/// Telemetry observer interface.
pub mod observer;
/// Ordered sliding-window module.
pub mod ordered;
/// Outbound transmit and delivery queues.
pub mod outbox;
/// Stop-and-wait module for the control channel.
pub mod stop_and_wait;
/// Unordered sliding-window module.
pub mod unordered;

pub use connection::{Connection, LinkState};
pub use event::{CloseReason, LinkEvent, Signal};
pub use observer::{LinkObserver, NullObserver};
