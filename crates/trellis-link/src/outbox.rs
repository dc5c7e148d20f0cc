use std::collections::VecDeque;

/// A payload ready for the application, tagged with the sender's timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Sender's clock at send time.
    pub timestamp: u32,
    /// Application payload.
    pub payload: Vec<u8>,
}

/// Staging queues between the reliability modules and the connection owner.
///
/// Modules append framed datagrams and in-order deliveries here instead of
/// performing I/O or invoking callbacks; the connection drains both after
/// each module call. This keeps every module synchronous, non-blocking, and
/// free of captured state.
#[derive(Debug, Default)]
pub struct Outbox {
    transmits: VecDeque<Vec<u8>>,
    deliveries: VecDeque<Delivery>,
}

impl Outbox {
    /// Creates empty queues.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a framed datagram for the wire.
    pub fn transmit(&mut self, datagram: Vec<u8>) {
        self.transmits.push_back(datagram);
    }

    /// Queues a payload for the application.
    pub fn deliver(&mut self, timestamp: u32, payload: Vec<u8>) {
        self.deliveries.push_back(Delivery { timestamp, payload });
    }

    /// Takes the next outbound datagram, if any.
    pub fn pop_transmit(&mut self) -> Option<Vec<u8>> {
        self.transmits.pop_front()
    }

    /// Takes the next application delivery, if any.
    pub fn pop_delivery(&mut self) -> Option<Delivery> {
        self.deliveries.pop_front()
    }

    /// Number of datagrams waiting for the wire.
    pub fn transmit_len(&self) -> usize {
        self.transmits.len()
    }
}
