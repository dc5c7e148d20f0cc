//! Stop-and-wait module.
//!
//! One frame in flight at a time, identified by a wrapping 8-bit serial.
//! The control channel serializes its connect/disconnect/ping signals through
//! this module by checking [`StopAndWait::sending`] before a new output.

use std::io::Cursor;

use trellis_core::{constants::{CHANNEL_TAG_SIZE, HEADER_SIZE}, Result};
use trellis_protocol::{
    header::{self, Command},
    Channel, Frame,
};

use crate::{observer::LinkObserver, outbox::Outbox};

/// Outcome of feeding a datagram into the module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlEvent {
    /// A push passed the duplicate filter; deliver its payload once.
    Delivered {
        /// Sender's clock at send time.
        timestamp: u32,
        /// Frame payload.
        payload: Vec<u8>,
    },
    /// The in-flight frame was acknowledged.
    Acknowledged {
        /// Delay since the last transmit of the frame, milliseconds.
        delay: u32,
        /// Retransmissions performed before the ack arrived.
        resends: u32,
        /// The ack's payload, echoing the original push payload.
        payload: Vec<u8>,
    },
}

/// Single-slot reliable sender/responder.
pub struct StopAndWait {
    channel: Channel,
    resend_ms: u32,
    frame: Frame<u8>,
    /// Serial of the frame currently (or last) in flight.
    serial: u8,
    /// Serial of the last push accepted from the peer.
    last_push_serial: u8,
}

impl StopAndWait {
    /// Creates the module bound to `channel` with the given resend interval.
    pub fn new(channel: Channel, resend_ms: u32) -> Self {
        Self {
            channel,
            resend_ms,
            frame: Frame::default(),
            serial: 0,
            last_push_serial: 0,
        }
    }

    /// Returns whether a frame is awaiting acknowledgment. Callers that need
    /// at-most-one-outstanding must check this before `output`.
    pub fn sending(&self) -> bool {
        self.frame.in_flight()
    }

    /// Frames `payload` as the single in-flight push. A prior unacknowledged
    /// frame, if any, is replaced. Transmission happens on the next `update`.
    ///
    /// The header is stamped `now + 1` so a frame sent at tick zero still
    /// beats the zero-initialized push filter on the receiving side.
    pub fn output(&mut self, now: u32, payload: &[u8]) {
        self.serial = self.serial.wrapping_add(1);

        let mut buffer = Vec::with_capacity(CHANNEL_TAG_SIZE + HEADER_SIZE + payload.len());
        buffer.push(self.channel.tag());
        header::write_header(&mut buffer, Command::Push, self.serial, now.wrapping_add(1));
        buffer.extend_from_slice(payload);

        self.frame.reset();
        self.frame.data = Some(buffer);
    }

    /// Handles a datagram for this channel, positioned after the channel tag.
    pub fn input(
        &mut self,
        now: u32,
        cursor: &mut Cursor<&[u8]>,
        outbox: &mut Outbox,
        observer: &mut dyn LinkObserver,
    ) -> Result<Option<ControlEvent>> {
        let head = header::read_header(cursor)?;
        let payload = header::payload(cursor);

        match head.command {
            Command::Push => {
                // Idempotent responder: every push gets an ack echoing the
                // header and payload, duplicates included.
                let mut ack = Vec::with_capacity(CHANNEL_TAG_SIZE + HEADER_SIZE + payload.len());
                ack.push(self.channel.tag());
                header::write_header(&mut ack, Command::Ack, head.slot, head.time);
                ack.extend_from_slice(payload);
                outbox.transmit(ack);

                // Deliver once: reject replays of the current serial and
                // reordered frames from older sends.
                if head.slot != self.last_push_serial && head.time > self.frame.push.time {
                    self.last_push_serial = head.slot;
                    self.frame.push.time = head.time;
                    return Ok(Some(ControlEvent::Delivered {
                        timestamp: head.time,
                        payload: payload.to_vec(),
                    }));
                }
                Ok(None)
            }
            Command::Ack => {
                // A stale ack can match an old serial by coincidence; the
                // timestamp filter removes that ambiguity.
                if self.frame.in_flight()
                    && head.slot == self.serial
                    && head.time > self.frame.ack.time
                {
                    let delay = now.wrapping_sub(self.frame.sent_at);
                    let resends = self.frame.resends();
                    self.frame.ack.time = head.time;
                    self.frame.reset();
                    observer.frame_acknowledged(self.channel, resends, delay);
                    return Ok(Some(ControlEvent::Acknowledged {
                        delay,
                        resends,
                        payload: payload.to_vec(),
                    }));
                }
                Ok(None)
            }
        }
    }

    /// Flushes or retransmits the in-flight frame when its deadline passes.
    pub fn update(&mut self, now: u32, outbox: &mut Outbox, observer: &mut dyn LinkObserver) {
        if self.frame.in_flight() && self.frame.due(now) {
            if let Some(data) = &self.frame.data {
                outbox.transmit(data.clone());
            }
            if !self.frame.post(now, self.resend_ms) {
                tracing::trace!(channel = ?self.channel, resends = self.frame.resends(), "retransmit");
                observer.frame_resent(self.channel);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::NullObserver;

    fn module() -> StopAndWait {
        StopAndWait::new(Channel::Control, 300)
    }

    fn feed(
        module: &mut StopAndWait,
        now: u32,
        datagram: &[u8],
        outbox: &mut Outbox,
    ) -> Option<ControlEvent> {
        // Skip the channel tag the connection would have consumed.
        let mut cursor = Cursor::new(&datagram[1..]);
        module.input(now, &mut cursor, outbox, &mut NullObserver).unwrap()
    }

    #[test]
    fn test_push_flushed_on_update() {
        let mut sender = module();
        let mut outbox = Outbox::new();

        sender.output(0, &[7]);
        assert!(sender.sending());
        assert_eq!(outbox.transmit_len(), 0);

        sender.update(0, &mut outbox, &mut NullObserver);
        let datagram = outbox.pop_transmit().unwrap();
        assert_eq!(datagram[0], Channel::Control.tag());
        assert_eq!(datagram[1], Command::Push as u8);
        assert_eq!(datagram[2], 1); // first serial
    }

    #[test]
    fn test_duplicate_push_delivers_once_but_acks_twice() {
        let mut sender = module();
        let mut receiver = module();
        let mut outbox = Outbox::new();

        sender.output(10, b"hi");
        sender.update(10, &mut outbox, &mut NullObserver);
        let push = outbox.pop_transmit().unwrap();

        let mut rx_outbox = Outbox::new();
        let first = feed(&mut receiver, 20, &push, &mut rx_outbox);
        assert!(matches!(first, Some(ControlEvent::Delivered { ref payload, .. }) if payload == b"hi"));
        assert_eq!(rx_outbox.transmit_len(), 1);

        // Exact replay: ack re-emitted, no second delivery.
        let second = feed(&mut receiver, 30, &push, &mut rx_outbox);
        assert!(second.is_none());
        assert_eq!(rx_outbox.transmit_len(), 2);
    }

    #[test]
    fn test_ack_reports_delay_and_resends() {
        let mut sender = module();
        let mut receiver = module();
        let mut outbox = Outbox::new();

        sender.output(0, b"ping");
        sender.update(0, &mut outbox, &mut NullObserver); // transmit 1
        sender.update(300, &mut outbox, &mut NullObserver); // resend
        sender.update(600, &mut outbox, &mut NullObserver); // resend
        assert_eq!(outbox.transmit_len(), 3);
        let push = outbox.pop_transmit().unwrap();

        let mut rx_outbox = Outbox::new();
        feed(&mut receiver, 610, &push, &mut rx_outbox);
        let ack = rx_outbox.pop_transmit().unwrap();

        let event = feed(&mut sender, 650, &ack, &mut outbox);
        match event {
            Some(ControlEvent::Acknowledged { delay, resends, payload }) => {
                assert_eq!(delay, 50); // 650 - last transmit at 600
                assert_eq!(resends, 2);
                assert_eq!(payload, b"ping");
            }
            other => panic!("expected ack, got {:?}", other),
        }
        assert!(!sender.sending());
    }

    #[test]
    fn test_stale_ack_rejected() {
        let mut sender = module();
        let mut receiver = module();
        let mut outbox = Outbox::new();

        sender.output(0, b"a");
        sender.update(0, &mut outbox, &mut NullObserver);
        let push_a = outbox.pop_transmit().unwrap();

        let mut rx_outbox = Outbox::new();
        feed(&mut receiver, 5, &push_a, &mut rx_outbox);
        let ack_a = rx_outbox.pop_transmit().unwrap();
        feed(&mut sender, 10, &ack_a, &mut outbox);

        // A new frame is in flight; the old ack must not clear it.
        sender.output(20, b"b");
        sender.update(20, &mut outbox, &mut NullObserver);
        assert!(feed(&mut sender, 30, &ack_a, &mut outbox).is_none());
        assert!(sender.sending());
    }

    #[test]
    fn test_no_retransmit_before_deadline() {
        let mut sender = module();
        let mut outbox = Outbox::new();

        sender.output(0, b"x");
        sender.update(0, &mut outbox, &mut NullObserver);
        sender.update(299, &mut outbox, &mut NullObserver);
        assert_eq!(outbox.transmit_len(), 1);
        sender.update(300, &mut outbox, &mut NullObserver);
        assert_eq!(outbox.transmit_len(), 2);
    }
}
