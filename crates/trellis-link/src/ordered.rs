//! Ordered sliding-window module.
//!
//! Sixteen slots form a circular sequence window over a monotonically
//! increasing 64-bit sequence. Outbound payloads take slots round-robin and
//! may complete out of order, but the receive side buffers each arrival and
//! releases strictly at the `here` pointer, so the application observes
//! sequence order exactly.
//!
//! Acks piggyback the receiver's full slot bitmask and its `here` pointer.
//! The sender gates new transmissions to an allowance of slots past the
//! peer's advertised release point, which bounds how far it can run ahead of
//! the peer's buffer.

use std::{collections::VecDeque, io::Cursor};

use byteorder::ReadBytesExt;
use trellis_core::{
    constants::{CHANNEL_TAG_SIZE, HEADER_SIZE, ORDERED_ALLOWANCE, ORDERED_SLOTS},
    ErrorKind, Result,
};
use trellis_protocol::{
    header::{self, Command},
    sequence::{next_slot, slot_within},
    Channel, Frame, Mask,
};

use crate::{observer::LinkObserver, outbox::Outbox};

#[derive(Debug, Default)]
struct Slot {
    frame: Frame<u64>,
    /// Framed payloads waiting for the slot to come free, oldest first.
    pending: VecDeque<(u64, Vec<u8>)>,
    /// Sequence of the payload currently in flight.
    sent_seq: u64,
}

/// Circular window with strict in-order release.
pub struct OrderedWindow {
    channel: Channel,
    resend_ms: u32,
    slots: [Slot; ORDERED_SLOTS],
    /// Outbound sequence counter, incremented before use.
    seq: u64,
    /// Next slot to frame an outbound payload on.
    next: u8,
    /// Slots received and buffered locally, awaiting release.
    local: Mask,
    /// Next slot expected for in-order release.
    here: u8,
    /// Buffered arrivals, released only at `here`.
    received: [Option<(u32, Vec<u8>)>; ORDERED_SLOTS],
    /// Peer's buffered slots, learned from ack payloads.
    remote: Mask,
    /// Peer's release pointer, learned from ack payloads.
    there: u8,
    /// Stamp of the freshest ack applied to `remote`/`there`.
    remote_time: u32,
}

impl OrderedWindow {
    /// Creates the module bound to `channel` with the given resend interval.
    pub fn new(channel: Channel, resend_ms: u32) -> Self {
        Self {
            channel,
            resend_ms,
            slots: std::array::from_fn(|_| Slot::default()),
            seq: 0,
            next: 0,
            local: Mask::default(),
            here: 0,
            received: std::array::from_fn(|_| None),
            remote: Mask::default(),
            there: 0,
            remote_time: 0,
        }
    }

    /// Frames `payload` on the next slot in sequence and transmits right away
    /// when that slot is free and inside the peer's acceptance window.
    pub fn output(&mut self, now: u32, payload: &[u8], outbox: &mut Outbox) {
        self.seq += 1;
        let index = self.next;
        self.next = next_slot(self.next, ORDERED_SLOTS as u8);

        let mut buffer = Vec::with_capacity(CHANNEL_TAG_SIZE + HEADER_SIZE + 8 + payload.len());
        buffer.push(self.channel.tag());
        header::write_header(&mut buffer, Command::Push, index, now);
        header::write_seq64(&mut buffer, self.seq);
        buffer.extend_from_slice(payload);

        self.slots[index as usize].pending.push_back((self.seq, buffer));
        self.try_start(index, now, outbox);
    }

    /// Begins sending the slot's oldest queued payload if the slot is free
    /// and lies within the advertised acceptance window.
    fn try_start(&mut self, index: u8, now: u32, outbox: &mut Outbox) {
        if !slot_within(self.there, ORDERED_ALLOWANCE, index, ORDERED_SLOTS as u8) {
            return;
        }
        let slot = &mut self.slots[index as usize];
        if slot.frame.in_flight() {
            return;
        }
        if let Some((seq, buffer)) = slot.pending.pop_front() {
            outbox.transmit(buffer.clone());
            slot.frame.reset();
            slot.frame.data = Some(buffer);
            slot.frame.post(now, self.resend_ms);
            slot.sent_seq = seq;
            // A stale bit from the slot's previous lap must not suppress
            // retransmits of the new payload.
            self.remote.set(index, false);
        }
    }

    /// Delivers buffered arrivals in strict sequence order, advancing `here`
    /// as far as contiguously received slots allow.
    fn release(&mut self, outbox: &mut Outbox) {
        while self.local.get(self.here) {
            if let Some((time, payload)) = self.received[self.here as usize].take() {
                outbox.deliver(time, payload);
            }
            self.local.set(self.here, false);
            self.here = next_slot(self.here, ORDERED_SLOTS as u8);
        }
    }

    /// Builds an ack echoing a push, carrying the post-release mask and
    /// release pointer.
    fn ack(&self, slot: u8, seq: u64, now: u32) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(CHANNEL_TAG_SIZE + HEADER_SIZE + 8 + 3);
        buffer.push(self.channel.tag());
        header::write_header(&mut buffer, Command::Ack, slot, now);
        header::write_seq64(&mut buffer, seq);
        buffer.extend_from_slice(&self.local.value().to_be_bytes());
        buffer.push(self.here);
        buffer
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
        let seq = header::read_seq64(cursor)?;
        if head.slot as usize >= ORDERED_SLOTS {
            return Err(ErrorKind::MalformedFrame);
        }

        match head.command {
            Command::Push => {
                let fresh = seq > self.slots[head.slot as usize].frame.push.seq;
                if fresh && self.local.get(head.slot) {
                    // Next lap of a slot still holding an unreleased payload.
                    // Drop without acking; the peer retries once we release.
                    tracing::trace!(channel = ?self.channel, slot = head.slot, seq, "early push dropped");
                    return Ok(());
                }
                if fresh {
                    let payload = header::payload(cursor).to_vec();
                    let slot = &mut self.slots[head.slot as usize];
                    slot.frame.push.seq = seq;
                    slot.frame.push.time = head.time;
                    self.received[head.slot as usize] = Some((head.time, payload));
                    self.local.set(head.slot, true);
                }
                // Release before acking so the mask and pointer reflect it.
                self.release(outbox);
                outbox.transmit(self.ack(head.slot, seq, now));
            }
            Command::Ack => {
                let mask = Mask::from_value(header::read_seq16(cursor)?);
                let there = cursor.read_u8().map_err(|_| ErrorKind::MalformedFrame)?;
                if there as usize >= ORDERED_SLOTS {
                    return Err(ErrorKind::MalformedFrame);
                }

                // Apply the piggybacked window state only in stamp order, so
                // a reordered older ack cannot roll the pointer back.
                if head.time >= self.remote_time {
                    self.remote_time = head.time;
                    self.remote = mask;
                    self.there = there;
                }

                let slot = &mut self.slots[head.slot as usize];
                if seq > slot.frame.ack.seq {
                    slot.frame.ack.seq = seq;
                    slot.frame.ack.time = head.time;
                    if slot.frame.in_flight() && slot.sent_seq == seq {
                        let delay = now.wrapping_sub(slot.frame.sent_at);
                        observer.frame_acknowledged(self.channel, slot.frame.resends(), delay);
                        slot.frame.reset();
                    }
                }

                // The freed slot or an advanced pointer may unblock sends.
                for index in 0..ORDERED_SLOTS as u8 {
                    self.try_start(index, now, outbox);
                }
            }
        }
        Ok(())
    }

    /// Releases any pending arrivals, retransmits due frames the peer has not
    /// reported holding, and starts queued payloads on eligible slots.
    pub fn update(&mut self, now: u32, outbox: &mut Outbox, observer: &mut dyn LinkObserver) {
        self.release(outbox);
        for index in 0..ORDERED_SLOTS as u8 {
            let slot = &mut self.slots[index as usize];
            if slot.frame.in_flight() {
                if slot.frame.due(now) && !self.remote.get(index) {
                    if let Some(data) = &slot.frame.data {
                        outbox.transmit(data.clone());
                    }
                    if !slot.frame.post(now, self.resend_ms) {
                        observer.frame_resent(self.channel);
                    }
                }
            } else {
                self.try_start(index, now, outbox);
            }
        }
    }

    /// Number of slots currently awaiting acknowledgment.
    #[cfg(test)]
    fn in_flight(&self) -> usize {
        self.slots.iter().filter(|s| s.frame.in_flight()).count()
    }
}
