//! Unordered sliding-window module.
//!
//! A fixed pool of slots, each an independent stop-and-wait lane with its own
//! pending queue and 16-bit sequence counter. Payloads are delivered to the
//! application the moment their slot completes, so frames on different slots
//! may arrive out of send order while every frame is still delivered at
//! least once.

use std::{collections::VecDeque, io::Cursor};

use trellis_core::{
    constants::{CHANNEL_TAG_SIZE, HEADER_SIZE, UNORDERED_SLOTS},
    ErrorKind, Result,
};
use trellis_protocol::{
    header::{self, Command},
    sequence::sequence_greater_than,
    Channel, Frame,
};

use crate::{observer::LinkObserver, outbox::Outbox};

#[derive(Debug, Default)]
struct Slot {
    frame: Frame<u16>,
    pending: VecDeque<Vec<u8>>,
    /// Outbound sequence counter, incremented before use.
    seq: u16,
}

/// Fixed pool of independently reliable slots.
pub struct UnorderedWindow {
    channel: Channel,
    resend_ms: u32,
    slots: [Slot; UNORDERED_SLOTS],
}

impl UnorderedWindow {
    /// Creates the module bound to `channel` with the given resend interval.
    pub fn new(channel: Channel, resend_ms: u32) -> Self {
        Self {
            channel,
            resend_ms,
            slots: std::array::from_fn(|_| Slot::default()),
        }
    }

    /// Depth of a slot's backlog, counting the in-flight frame.
    fn depth(slot: &Slot) -> usize {
        slot.pending.len() + slot.frame.in_flight() as usize
    }

    /// Picks the slot with the shallowest backlog, tie-breaking toward the
    /// last slot so repeated ties still rotate traffic.
    fn shallowest_slot(&self) -> usize {
        let mut best = 0;
        for (index, slot) in self.slots.iter().enumerate() {
            if Self::depth(slot) <= Self::depth(&self.slots[best]) {
                best = index;
            }
        }
        best
    }

    /// Frames `payload` on the least-loaded slot; transmits immediately when
    /// that slot is idle, otherwise queues behind its prior traffic.
    pub fn output(&mut self, now: u32, payload: &[u8], outbox: &mut Outbox) {
        let index = self.shallowest_slot();
        let slot = &mut self.slots[index];
        slot.seq = slot.seq.wrapping_add(1);

        let mut buffer = Vec::with_capacity(CHANNEL_TAG_SIZE + HEADER_SIZE + 2 + payload.len());
        buffer.push(self.channel.tag());
        header::write_header(&mut buffer, Command::Push, index as u8, now);
        header::write_seq16(&mut buffer, slot.seq);
        buffer.extend_from_slice(payload);

        if !slot.frame.in_flight() && slot.pending.is_empty() {
            outbox.transmit(buffer.clone());
            slot.frame.reset();
            slot.frame.data = Some(buffer);
            slot.frame.post(now, self.resend_ms);
        } else {
            slot.pending.push_back(buffer);
        }
    }

    /// Handles a datagram for this channel, positioned after the channel tag.
    pub fn input(
        &mut self,
        now: u32,
        cursor: &mut Cursor<&[u8]>,
        outbox: &mut Outbox,
        observer: &mut dyn LinkObserver,
    ) -> Result<()> {
        let head = header::read_header(cursor)?;
        let seq = header::read_seq16(cursor)?;
        if head.slot as usize >= UNORDERED_SLOTS {
            return Err(ErrorKind::MalformedFrame);
        }
        let slot = &mut self.slots[head.slot as usize];

        match head.command {
            Command::Push => {
                let payload = header::payload(cursor);

                let mut ack = Vec::with_capacity(CHANNEL_TAG_SIZE + HEADER_SIZE + 2);
                ack.push(self.channel.tag());
                header::write_header(&mut ack, Command::Ack, head.slot, head.time);
                header::write_seq16(&mut ack, seq);
                outbox.transmit(ack);

                if sequence_greater_than(seq, slot.frame.push.seq) {
                    slot.frame.push.seq = seq;
                    slot.frame.push.time = head.time;
                    outbox.deliver(head.time, payload.to_vec());
                }
            }
            Command::Ack => {
                if slot.frame.in_flight() && sequence_greater_than(seq, slot.frame.ack.seq) {
                    let delay = now.wrapping_sub(slot.frame.sent_at);
                    observer.frame_acknowledged(self.channel, slot.frame.resends(), delay);
                    slot.frame.ack.seq = seq;
                    slot.frame.ack.time = head.time;
                    slot.frame.reset();
                }
            }
        }
        Ok(())
    }

    /// Retransmits due frames and starts queued payloads on idle slots.
    pub fn update(&mut self, now: u32, outbox: &mut Outbox, observer: &mut dyn LinkObserver) {
        for slot in self.slots.iter_mut() {
            if slot.frame.in_flight() {
                if slot.frame.due(now) {
                    if let Some(data) = &slot.frame.data {
                        outbox.transmit(data.clone());
                    }
                    if !slot.frame.post(now, self.resend_ms) {
                        observer.frame_resent(self.channel);
                    }
                }
            } else if let Some(buffer) = slot.pending.pop_front() {
                outbox.transmit(buffer.clone());
                slot.frame.reset();
                slot.frame.data = Some(buffer);
                slot.frame.post(now, self.resend_ms);
            }
        }
    }

    /// Number of slots currently awaiting acknowledgment.
    #[cfg(test)]
    fn in_flight(&self) -> usize {
        self.slots.iter().filter(|s| s.frame.in_flight()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::NullObserver;

    fn pair() -> (UnorderedWindow, UnorderedWindow) {
        (
            UnorderedWindow::new(Channel::Unordered, 400),
            UnorderedWindow::new(Channel::Unordered, 400),
        )
    }

    fn feed(module: &mut UnorderedWindow, now: u32, datagram: &[u8], outbox: &mut Outbox) {
        let mut cursor = Cursor::new(&datagram[1..]);
        module.input(now, &mut cursor, outbox, &mut NullObserver).unwrap();
    }

    #[test]
    fn test_outputs_spread_across_slots() {
        let (mut sender, _) = pair();
        let mut outbox = Outbox::new();

        for i in 0..4u8 {
            sender.output(0, &[i], &mut outbox);
        }
        assert_eq!(sender.in_flight(), 4);
        assert_eq!(outbox.transmit_len(), 4);

        // Four distinct slot ids.
        let mut slots: Vec<u8> = (0..4).map(|_| outbox.pop_transmit().unwrap()[2]).collect();
        slots.sort_unstable();
        slots.dedup();
        assert_eq!(slots.len(), 4);
    }

    #[test]
    fn test_out_of_order_arrival_delivers_immediately() {
        let (mut sender, mut receiver) = pair();
        let mut outbox = Outbox::new();

        sender.output(0, b"first", &mut outbox);
        sender.output(0, b"second", &mut outbox);
        let first = outbox.pop_transmit().unwrap();
        let second = outbox.pop_transmit().unwrap();

        let mut rx_outbox = Outbox::new();
        feed(&mut receiver, 5, &second, &mut rx_outbox);
        let delivery = rx_outbox.pop_delivery().unwrap();
        assert_eq!(delivery.payload, b"second");

        feed(&mut receiver, 6, &first, &mut rx_outbox);
        let delivery = rx_outbox.pop_delivery().unwrap();
        assert_eq!(delivery.payload, b"first");
    }

    #[test]
    fn test_duplicate_push_acked_not_redelivered() {
        let (mut sender, mut receiver) = pair();
        let mut outbox = Outbox::new();

        sender.output(0, b"data", &mut outbox);
        let push = outbox.pop_transmit().unwrap();

        let mut rx_outbox = Outbox::new();
        feed(&mut receiver, 1, &push, &mut rx_outbox);
        feed(&mut receiver, 2, &push, &mut rx_outbox);

        let mut acks = 0;
        while rx_outbox.pop_transmit().is_some() {
            acks += 1;
        }
        assert_eq!(acks, 2);
        assert!(rx_outbox.pop_delivery().is_some());
        assert!(rx_outbox.pop_delivery().is_none());
    }

    #[test]
    fn test_ack_frees_slot_and_drains_queue() {
        let (mut sender, mut receiver) = pair();
        let mut outbox = Outbox::new();

        // Saturate every slot, then one more to land in a pending queue.
        for i in 0..=UNORDERED_SLOTS {
            sender.output(0, &[i as u8], &mut outbox);
        }
        assert_eq!(sender.in_flight(), UNORDERED_SLOTS);
        let push = outbox.pop_transmit().unwrap();

        let mut rx_outbox = Outbox::new();
        feed(&mut receiver, 1, &push, &mut rx_outbox);
        let ack = rx_outbox.pop_transmit().unwrap();
        feed(&mut sender, 2, &ack, &mut outbox);

        // The acked slot restarts its queued payload on the next tick.
        while outbox.pop_transmit().is_some() {}
        sender.update(3, &mut outbox, &mut NullObserver);
        assert_eq!(outbox.transmit_len(), 1);
        assert_eq!(sender.in_flight(), UNORDERED_SLOTS);
    }

    #[test]
    fn test_retransmit_until_acked() {
        let (mut sender, _) = pair();
        let mut outbox = Outbox::new();

        sender.output(0, b"r", &mut outbox);
        outbox.pop_transmit();

        sender.update(399, &mut outbox, &mut NullObserver);
        assert_eq!(outbox.transmit_len(), 0);
        sender.update(400, &mut outbox, &mut NullObserver);
        sender.update(800, &mut outbox, &mut NullObserver);
        assert_eq!(outbox.transmit_len(), 2);
    }

    #[test]
    fn test_slot_out_of_range_is_malformed() {
        let (_, mut receiver) = pair();
        let mut outbox = Outbox::new();

        let mut datagram = Vec::new();
        header::write_header(&mut datagram, Command::Push, UNORDERED_SLOTS as u8, 1);
        header::write_seq16(&mut datagram, 1);
        let mut cursor = Cursor::new(datagram.as_slice());
        let result = receiver.input(1, &mut cursor, &mut outbox, &mut NullObserver);
        assert!(matches!(result, Err(ErrorKind::MalformedFrame)));
    }
}
