//! Direct module: unreliable, unordered pass-through.
//!
//! Frames go straight to the wire with no retransmission state, and every
//! arriving push is delivered as-is. Duplicates and reordering introduced by
//! the network are visible to the application.

use std::io::Cursor;

use trellis_core::{
    constants::{CHANNEL_TAG_SIZE, HEADER_SIZE},
    Result,
};
use trellis_protocol::{
    header::{self, Command},
    Channel,
};

use crate::outbox::Outbox;

/// Stateless framing for the best-effort channel.
pub struct Direct {
    channel: Channel,
}

impl Direct {
    /// Creates the module bound to `channel`.
    pub fn new(channel: Channel) -> Self {
        Self { channel }
    }

    /// Frames `payload` and queues it for immediate transmission.
    pub fn output(&mut self, now: u32, payload: &[u8], outbox: &mut Outbox) {
        let mut buffer = Vec::with_capacity(CHANNEL_TAG_SIZE + HEADER_SIZE + payload.len());
        buffer.push(self.channel.tag());
        header::write_header(&mut buffer, Command::Push, 0, now);
        buffer.extend_from_slice(payload);
        outbox.transmit(buffer);
    }

    /// Handles a datagram for this channel, positioned after the channel tag.
    /// Pushes are delivered unconditionally; stray acks are dropped.
    pub fn input(&mut self, cursor: &mut Cursor<&[u8]>, outbox: &mut Outbox) -> Result<()> {
        let head = header::read_header(cursor)?;
        if head.command == Command::Push {
            let payload = header::payload(cursor);
            outbox.deliver(head.time, payload.to_vec());
        }
        Ok(())
    }
}
