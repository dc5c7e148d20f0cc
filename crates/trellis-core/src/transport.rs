//! Datagram transport boundary for pluggable I/O.

use std::io::Result;

/// Connected datagram socket abstraction.
///
/// The core never performs raw I/O; the owner drives a socket implementing
/// this trait, feeding received datagrams into `Connection::input` and
/// flushing `Connection::poll_transmit` through `send_datagram`. Receives are
/// expected to be non-blocking: return `WouldBlock` when nothing is pending.
pub trait DatagramSocket {
    /// Sends a single datagram to the connected remote.
    fn send_datagram(&mut self, payload: &[u8]) -> Result<usize>;

    /// Receives a single datagram from the connected remote.
    fn receive_datagram<'a>(&mut self, buffer: &'a mut [u8]) -> Result<&'a [u8]>;
}
