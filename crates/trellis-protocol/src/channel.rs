/// Logical channels multiplexed over one peer connection.
///
/// The tag byte is the first byte of every datagram and selects the delivery
/// guarantee applied to the rest of the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Channel {
    /// Handshake and keepalive signals; stop-and-wait reliable.
    Control = 0,
    /// Fire-and-forget; no retries, no sequencing.
    Direct = 1,
    /// Reliable, delivered as soon as each slot completes, in any order.
    Unordered = 2,
    /// Reliable, released to the application strictly in send order.
    Ordered = 3,
}

impl Channel {
    /// Returns the wire tag for this channel.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Maps a wire tag back to a channel, if the tag is known.
    pub fn from_tag(tag: u8) -> Option<Channel> {
        match tag {
            0 => Some(Channel::Control),
            1 => Some(Channel::Direct),
            2 => Some(Channel::Unordered),
            3 => Some(Channel::Ordered),
            _ => None,
        }
    }
}
