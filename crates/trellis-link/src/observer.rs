use trellis_protocol::Channel;

/// Telemetry hooks for link activity, injected at construction.
///
/// Replaces process-wide sent/received/lost counters with an instance-scoped
/// observer. All methods default to no-ops so implementors pick only the
/// signals they care about. Called synchronously from the tick loop; keep
/// implementations cheap.
pub trait LinkObserver {
    /// A datagram was handed to the owner for the wire.
    fn datagram_sent(&mut self, bytes: usize) {
        let _ = bytes;
    }

    /// A datagram arrived from the wire.
    fn datagram_received(&mut self, bytes: usize) {
        let _ = bytes;
    }

    /// An in-flight frame was retransmitted.
    fn frame_resent(&mut self, channel: Channel) {
        let _ = channel;
    }

    /// An in-flight frame was acknowledged, with the retransmissions it took
    /// and the delay since its last transmit.
    fn frame_acknowledged(&mut self, channel: Channel, resends: u32, delay: u32) {
        let _ = (channel, resends, delay);
    }
}

/// Observer that ignores everything; the default.
#[derive(Debug, Default)]
pub struct NullObserver;

impl LinkObserver for NullObserver {}
