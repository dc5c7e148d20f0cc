//! Per-slot transmit records.
//!
//! A `Frame` is the unit of in-flight state for every reliability strategy:
//! the buffered datagram awaiting acknowledgment plus its timing and retry
//! bookkeeping. The embedded `Memo`s remember the last accepted push and ack
//! per slot and survive `reset`, which is what lets the duplicate filters
//! reject stale retransmissions long after a slot has been reused.

/// Last-accepted record for one command direction of a slot.
///
/// `S` is the sequence width of the owning module (`u8` for the control
/// serial, `u16` for the unordered window, `u64` for the ordered window).
#[derive(Debug, Clone, Copy, Default)]
pub struct Memo<S> {
    /// Sequence of the last accepted frame.
    pub seq: S,
    /// Sender timestamp of the last accepted frame.
    pub time: u32,
}

/// Transmit state of one window slot.
#[derive(Debug, Default)]
pub struct Frame<S> {
    /// The framed datagram currently in flight; `None` means the slot is
    /// free. At most one unacknowledged payload per slot.
    pub data: Option<Vec<u8>>,
    /// Deadline of the next scheduled (re)send.
    pub send_at: u32,
    /// Tick of the last actual transmit, for round-trip measurement.
    pub sent_at: u32,
    /// Transmit count for the current payload; anything past the first is a
    /// retransmission.
    pub transmits: u32,
    /// Last accepted inbound push for this slot.
    pub push: Memo<S>,
    /// Last accepted inbound ack for this slot.
    pub ack: Memo<S>,
}

impl<S> Frame<S> {
    /// Frees the slot for a new payload. Memos are kept so the duplicate
    /// filters keep rejecting frames from earlier uses of the slot.
    pub fn reset(&mut self) {
        self.data = None;
        self.send_at = 0;
        self.sent_at = 0;
        self.transmits = 0;
    }

    /// Returns whether the slot holds an unacknowledged payload.
    pub fn in_flight(&self) -> bool {
        self.data.is_some()
    }

    /// Returns whether the scheduled (re)send deadline has elapsed.
    pub fn due(&self, now: u32) -> bool {
        now >= self.send_at
    }

    /// Records a transmit at `now` and schedules the next resend. Returns
    /// true on the first transmit of the current payload.
    pub fn post(&mut self, now: u32, resend: u32) -> bool {
        self.sent_at = now;
        self.send_at = now.wrapping_add(resend);
        self.transmits += 1;
        self.transmits == 1
    }

    /// Retransmissions performed for the current payload.
    pub fn resends(&self) -> u32 {
        self.transmits.saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_counts_resends() {
        let mut frame: Frame<u16> = Frame::default();
        frame.data = Some(vec![1, 2, 3]);

        assert!(frame.post(100, 300));
        assert_eq!(frame.resends(), 0);
        assert_eq!(frame.send_at, 400);
        assert_eq!(frame.sent_at, 100);

        assert!(!frame.post(400, 300));
        assert!(!frame.post(700, 300));
        assert_eq!(frame.resends(), 2);
        assert_eq!(frame.sent_at, 700);
    }

    #[test]
    fn test_due_at_deadline() {
        let mut frame: Frame<u16> = Frame::default();
        frame.post(100, 300);
        assert!(!frame.due(399));
        assert!(frame.due(400));
    }

    #[test]
    fn test_reset_keeps_memos() {
        let mut frame: Frame<u16> = Frame::default();
        frame.data = Some(vec![0]);
        frame.post(5, 300);
        frame.push.seq = 9;
        frame.ack.time = 42;

        frame.reset();
        assert!(!frame.in_flight());
        assert_eq!(frame.transmits, 0);
        assert_eq!(frame.push.seq, 9);
        assert_eq!(frame.ack.time, 42);
    }
}
