use trellis_protocol::Channel;

/// Control-channel signals exchanged during handshake, teardown, and
/// keepalive. Travels as a one-byte control payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Signal {
    /// Open the connection.
    Connect = 1,
    /// Close the connection.
    Disconnect = 2,
    /// Liveness probe.
    Ping = 3,
}

impl Signal {
    /// Maps a wire byte back to a signal, if known.
    pub fn from_byte(byte: u8) -> Option<Signal> {
        match byte {
            1 => Some(Signal::Connect),
            2 => Some(Signal::Disconnect),
            3 => Some(Signal::Ping),
            _ => None,
        }
    }
}

/// Why a connection reached `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// A disconnect signal completed, locally or remotely initiated.
    Disconnected,
    /// Nothing was received within the configured timeout.
    TimedOut,
}

/// Events a connection emits to its owner.
///
/// Pushed through the `crossbeam_channel` receiver returned at construction;
/// the owner drains them after each input/update pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// A payload was delivered on a channel, with the sender's timestamp.
    /// Ordering guarantees depend on the channel.
    Packet {
        /// Channel the payload arrived on.
        channel: Channel,
        /// Sender's clock at send time.
        timestamp: u32,
        /// Application payload.
        payload: Vec<u8>,
    },
    /// The peer sent a control signal.
    Request {
        /// The signal received.
        signal: Signal,
        /// Sender's clock at send time.
        timestamp: u32,
    },
    /// The peer acknowledged a control signal we sent.
    Acknowledge {
        /// The signal that completed.
        signal: Signal,
        /// Round-trip delay from the last transmit to the ack, milliseconds.
        delay: u32,
        /// Retransmissions performed before the ack arrived.
        resends: u32,
    },
    /// The link reached `Active`.
    Connected,
    /// The link closed after a disconnect signal.
    Disconnected,
    /// The link closed after the silence threshold elapsed.
    TimedOut,
}
