//! Connection multiplexer and link state machine.
//!
//! A [`Connection`] binds one reliability module per channel and routes
//! every datagram by its leading channel tag. It owns the link lifecycle:
//! the connect/disconnect handshake over the control channel, keepalive
//! pings while active, and the silence timeout. All time is the caller's
//! millisecond tick; the connection never reads a clock, performs I/O, or
//! spawns threads.

use std::io::Cursor;

use crossbeam_channel::{unbounded, Receiver, Sender};

use trellis_core::{Config, ErrorKind, Result};
use trellis_protocol::Channel;

use crate::{
    direct::Direct,
    event::{CloseReason, LinkEvent, Signal},
    observer::{LinkObserver, NullObserver},
    ordered::OrderedWindow,
    outbox::Outbox,
    stop_and_wait::{ControlEvent, StopAndWait},
    unordered::UnorderedWindow,
};

/// Lifecycle of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Created, no handshake attempted or received yet.
    Idle,
    /// A connect signal is in flight, awaiting acknowledgment.
    Connecting,
    /// Handshake complete; application traffic flows.
    Active,
    /// A disconnect signal is in flight, awaiting acknowledgment.
    Disconnecting,
    /// Terminal. The reason records how the link ended.
    Closed(CloseReason),
}

/// One peer link: four channel modules behind a single datagram stream.
pub struct Connection {
    config: Config,
    state: LinkState,
    control: StopAndWait,
    direct: Direct,
    unordered: UnorderedWindow,
    ordered: OrderedWindow,
    outbox: Outbox,
    events: Sender<LinkEvent>,
    observer: Box<dyn LinkObserver>,
    /// Tick of the last datagram accepted from the peer.
    last_received: u32,
    /// Tick of the last control signal we framed.
    last_signal: u32,
}

impl Connection {
    /// Creates a connection with the default observer. Returns the receiver
    /// the owner drains for link events.
    pub fn new(config: Config) -> (Self, Receiver<LinkEvent>) {
        Self::with_observer(config, Box::new(NullObserver))
    }

    /// Creates a connection with a caller-supplied telemetry observer.
    pub fn with_observer(
        config: Config,
        observer: Box<dyn LinkObserver>,
    ) -> (Self, Receiver<LinkEvent>) {
        let (events, receiver) = unbounded();
        let connection = Self {
            control: StopAndWait::new(Channel::Control, config.control_resend_ms),
            direct: Direct::new(Channel::Direct),
            unordered: UnorderedWindow::new(Channel::Unordered, config.unordered_resend_ms),
            ordered: OrderedWindow::new(Channel::Ordered, config.ordered_resend_ms),
            config,
            state: LinkState::Idle,
            outbox: Outbox::new(),
            events,
            observer,
            last_received: 0,
            last_signal: 0,
        };
        (connection, receiver)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Returns whether the handshake has completed.
    pub fn is_active(&self) -> bool {
        self.state == LinkState::Active
    }

    /// Starts the handshake. Only meaningful from `Idle`; the connect frame
    /// goes out on the next `update`.
    pub fn connect(&mut self, now: u32) {
        if self.state != LinkState::Idle {
            return;
        }
        self.state = LinkState::Connecting;
        self.last_received = now;
        self.signal(now, false, Signal::Connect);
    }

    /// Starts an orderly teardown. The link closes once the peer
    /// acknowledges, or times out if it never does.
    pub fn disconnect(&mut self, now: u32) {
        match self.state {
            LinkState::Connecting | LinkState::Active => {
                self.state = LinkState::Disconnecting;
                self.signal(now, false, Signal::Disconnect);
            }
            _ => {}
        }
    }

    /// Frames a control signal. With `wait` set the signal yields to an
    /// in-flight one instead of replacing it.
    fn signal(&mut self, now: u32, wait: bool, signal: Signal) {
        if wait && self.control.sending() {
            return;
        }
        self.control.output(now, &[signal as u8]);
        self.last_signal = now;
    }

    /// Sends `payload` on an application channel with that channel's
    /// delivery guarantee. The control channel is reserved for the link
    /// itself.
    pub fn output(&mut self, now: u32, channel: Channel, payload: &[u8]) -> Result<()> {
        if let LinkState::Closed(_) = self.state {
            tracing::trace!(?channel, "output on closed link dropped");
            return Ok(());
        }
        match channel {
            Channel::Control => Err(ErrorKind::UnknownChannel(Channel::Control.tag())),
            Channel::Direct => {
                self.direct.output(now, payload, &mut self.outbox);
                Ok(())
            }
            Channel::Unordered => {
                self.unordered.output(now, payload, &mut self.outbox);
                Ok(())
            }
            Channel::Ordered => {
                self.ordered.output(now, payload, &mut self.outbox);
                Ok(())
            }
        }
    }

    /// Feeds one datagram from the wire into the owning channel's module.
    pub fn input(&mut self, now: u32, datagram: &[u8]) -> Result<()> {
        if let LinkState::Closed(_) = self.state {
            tracing::trace!("input on closed link dropped");
            return Ok(());
        }
        self.observer.datagram_received(datagram.len());

        let tag = *datagram.first().ok_or(ErrorKind::MalformedFrame)?;
        let channel = Channel::from_tag(tag).ok_or(ErrorKind::UnknownChannel(tag))?;
        self.last_received = now;

        let mut cursor = Cursor::new(&datagram[1..]);
        match channel {
            Channel::Control => {
                let event = self.control.input(
                    now,
                    &mut cursor,
                    &mut self.outbox,
                    &mut *self.observer,
                )?;
                if let Some(event) = event {
                    self.handle_control(now, event)?;
                }
            }
            Channel::Direct => {
                self.direct.input(&mut cursor, &mut self.outbox)?;
            }
            Channel::Unordered => {
                self.unordered
                    .input(now, &mut cursor, &mut self.outbox, &mut *self.observer)?;
            }
            Channel::Ordered => {
                self.ordered
                    .input(now, &mut cursor, &mut self.outbox, &mut *self.observer)?;
            }
        }
        self.flush_deliveries(channel);
        Ok(())
    }

    fn handle_control(&mut self, now: u32, event: ControlEvent) -> Result<()> {
        match event {
            ControlEvent::Delivered { timestamp, payload } => {
                let byte = *payload.first().ok_or(ErrorKind::MalformedFrame)?;
                let signal = Signal::from_byte(byte).ok_or(ErrorKind::MalformedFrame)?;
                self.emit(LinkEvent::Request { signal, timestamp });
                match signal {
                    Signal::Connect => match self.state {
                        LinkState::Idle | LinkState::Connecting => {
                            self.activate(now);
                        }
                        _ => {}
                    },
                    Signal::Disconnect => {
                        self.close(CloseReason::Disconnected);
                    }
                    Signal::Ping => {}
                }
            }
            ControlEvent::Acknowledged { delay, resends, payload } => {
                let byte = *payload.first().ok_or(ErrorKind::MalformedFrame)?;
                let signal = Signal::from_byte(byte).ok_or(ErrorKind::MalformedFrame)?;
                self.emit(LinkEvent::Acknowledge { signal, delay, resends });
                match signal {
                    Signal::Connect => {
                        if self.state == LinkState::Connecting {
                            self.activate(now);
                        }
                    }
                    Signal::Disconnect => {
                        if self.state == LinkState::Disconnecting {
                            self.close(CloseReason::Disconnected);
                        }
                    }
                    Signal::Ping => {}
                }
            }
        }
        Ok(())
    }

    fn activate(&mut self, now: u32) {
        tracing::debug!("link active");
        self.state = LinkState::Active;
        self.last_signal = now;
        self.emit(LinkEvent::Connected);
    }

    fn close(&mut self, reason: CloseReason) {
        tracing::debug!(?reason, "link closed");
        self.state = LinkState::Closed(reason);
        self.emit(match reason {
            CloseReason::Disconnected => LinkEvent::Disconnected,
            CloseReason::TimedOut => LinkEvent::TimedOut,
        });
    }

    /// Advances timers: the silence timeout, the keepalive ping, and every
    /// module's retransmission schedule.
    pub fn update(&mut self, now: u32) {
        match self.state {
            LinkState::Idle | LinkState::Closed(_) => return,
            _ => {}
        }
        if now.wrapping_sub(self.last_received) >= self.config.connection_timeout_ms {
            self.close(CloseReason::TimedOut);
            return;
        }
        if self.state == LinkState::Active
            && now.wrapping_sub(self.last_signal) >= self.config.keepalive_interval_ms
        {
            self.signal(now, true, Signal::Ping);
        }

        self.control.update(now, &mut self.outbox, &mut *self.observer);
        self.unordered.update(now, &mut self.outbox, &mut *self.observer);
        self.flush_deliveries(Channel::Unordered);
        self.ordered.update(now, &mut self.outbox, &mut *self.observer);
        self.flush_deliveries(Channel::Ordered);
    }

    /// Takes the next datagram bound for the wire, if any.
    pub fn poll_transmit(&mut self) -> Option<Vec<u8>> {
        let datagram = self.outbox.pop_transmit()?;
        self.observer.datagram_sent(datagram.len());
        Some(datagram)
    }

    fn flush_deliveries(&mut self, channel: Channel) {
        while let Some(delivery) = self.outbox.pop_delivery() {
            self.emit(LinkEvent::Packet {
                channel,
                timestamp: delivery.timestamp,
                payload: delivery.payload,
            });
        }
    }

    fn emit(&mut self, event: LinkEvent) {
        if self.events.send(event).is_err() {
            tracing::trace!("event receiver dropped");
        }
    }
}
