//! Integration tests for the trellis-link crate.
//!
//! Two connections are run against each other over a simulated network that
//! drops, duplicates, and reorders datagrams under a seeded generator, and
//! the per-channel delivery guarantees are checked end to end.

use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

use trellis_core::Config;
use trellis_link::{Connection, LinkEvent, LinkState};
use trellis_protocol::Channel;

/// Drop, duplication, and reorder rates of the simulated network.
struct Conditions {
    loss: f64,
    duplicate: f64,
}

impl Conditions {
    fn clean() -> Self {
        Conditions { loss: 0.0, duplicate: 0.0 }
    }

    fn harsh() -> Self {
        Conditions { loss: 0.2, duplicate: 0.1 }
    }
}

/// Moves pending datagrams from `from` to `to`, applying the conditions.
/// Survivors are shuffled so arrival order never matches send order.
fn exchange(
    from: &mut Connection,
    to: &mut Connection,
    now: u32,
    conditions: &Conditions,
    rng: &mut StdRng,
) {
    let mut batch = Vec::new();
    while let Some(datagram) = from.poll_transmit() {
        if rng.random_bool(conditions.loss) {
            continue;
        }
        if rng.random_bool(conditions.duplicate) {
            batch.push(datagram.clone());
        }
        batch.push(datagram);
    }
    batch.shuffle(rng);
    for datagram in batch {
        to.input(now, &datagram).unwrap();
    }
}

/// Ticks both connections and exchanges traffic until `until` milliseconds.
fn run(
    a: &mut Connection,
    b: &mut Connection,
    until: u32,
    conditions: &Conditions,
    rng: &mut StdRng,
) {
    let mut now = 0;
    while now < until {
        a.update(now);
        b.update(now);
        exchange(a, b, now, conditions, rng);
        exchange(b, a, now, conditions, rng);
        now += 25;
    }
}

fn pair() -> (Connection, Connection) {
    let (a, _) = Connection::new(Config::default());
    let (b, _) = Connection::new(Config::default());
    (a, b)
}

fn payloads(events: impl Iterator<Item = LinkEvent>, channel: Channel) -> Vec<Vec<u8>> {
    events
        .filter_map(|event| match event {
            LinkEvent::Packet { channel: c, payload, .. } if c == channel => Some(payload),
            _ => None,
        })
        .collect()
}

#[test]
fn test_handshake_completes_under_loss() {
    let mut rng = StdRng::seed_from_u64(11);
    let (mut a, _a_events) = Connection::new(Config::default());
    let (mut b, _b_events) = Connection::new(Config::default());

    a.connect(0);
    run(&mut a, &mut b, 3_000, &Conditions::harsh(), &mut rng);

    assert_eq!(a.state(), LinkState::Active);
    assert_eq!(b.state(), LinkState::Active);
}

#[test]
fn test_ordered_releases_in_sequence_under_harsh_network() {
    let mut rng = StdRng::seed_from_u64(42);
    let (mut a, _a_events) = Connection::new(Config::default());
    let (mut b, b_events) = Connection::new(Config::default());

    a.connect(0);
    let sent: Vec<Vec<u8>> = (0..50u16).map(|i| i.to_be_bytes().to_vec()).collect();
    for payload in &sent {
        a.output(0, Channel::Ordered, payload).unwrap();
    }
    run(&mut a, &mut b, 60_000, &Conditions::harsh(), &mut rng);

    let received = payloads(b_events.try_iter(), Channel::Ordered);
    assert_eq!(received, sent);
}

#[test]
fn test_unordered_delivers_everything_at_least_once() {
    let mut rng = StdRng::seed_from_u64(7);
    let (mut a, _a_events) = Connection::new(Config::default());
    let (mut b, b_events) = Connection::new(Config::default());

    a.connect(0);
    for i in 0..40u16 {
        a.output(0, Channel::Unordered, &i.to_be_bytes()).unwrap();
    }
    run(&mut a, &mut b, 60_000, &Conditions::harsh(), &mut rng);

    let mut received = payloads(b_events.try_iter(), Channel::Unordered);
    received.sort();
    received.dedup();
    let expected: Vec<Vec<u8>> = (0..40u16).map(|i| i.to_be_bytes().to_vec()).collect();
    assert_eq!(received, expected);
}

#[test]
fn test_no_duplicate_deliveries_on_reliable_channels() {
    let mut rng = StdRng::seed_from_u64(99);
    let (mut a, _a_events) = Connection::new(Config::default());
    let (mut b, b_events) = Connection::new(Config::default());

    a.connect(0);
    for i in 0..30u16 {
        a.output(0, Channel::Unordered, &i.to_be_bytes()).unwrap();
        a.output(0, Channel::Ordered, &i.to_be_bytes()).unwrap();
    }
    // Duplication only; nothing is lost, so every duplicate reaches the peer.
    let conditions = Conditions { loss: 0.0, duplicate: 0.5 };
    run(&mut a, &mut b, 30_000, &conditions, &mut rng);

    let events: Vec<_> = b_events.try_iter().collect();
    for channel in [Channel::Unordered, Channel::Ordered] {
        let mut received = payloads(events.iter().cloned(), channel);
        let total = received.len();
        received.sort();
        received.dedup();
        assert_eq!(total, received.len(), "duplicate delivery on {:?}", channel);
        assert_eq!(total, 30);
    }
}

#[test]
fn test_keepalive_sustains_idle_link() {
    let mut rng = StdRng::seed_from_u64(3);
    let (mut a, mut b) = pair();

    a.connect(0);
    // Far longer than the connection timeout, with no application traffic.
    run(&mut a, &mut b, 30_000, &Conditions::clean(), &mut rng);

    assert_eq!(a.state(), LinkState::Active);
    assert_eq!(b.state(), LinkState::Active);
}

#[test]
fn test_one_sided_silence_times_out() {
    let mut rng = StdRng::seed_from_u64(5);
    let (mut a, mut b) = pair();

    a.connect(0);
    run(&mut a, &mut b, 2_000, &Conditions::clean(), &mut rng);
    assert_eq!(a.state(), LinkState::Active);

    // The peer goes dark: a keeps ticking but hears nothing.
    let mut now = 2_000;
    while now < 15_000 {
        a.update(now);
        while a.poll_transmit().is_some() {}
        now += 25;
    }
    assert!(matches!(a.state(), LinkState::Closed(_)));
}

#[test]
fn test_disconnect_under_loss_closes_cleanly() {
    let mut rng = StdRng::seed_from_u64(21);
    let (mut a, mut b) = pair();

    a.connect(0);
    run(&mut a, &mut b, 2_000, &Conditions::clean(), &mut rng);
    assert_eq!(a.state(), LinkState::Active);

    // Either the disconnect ack lands or the silence timeout finishes the
    // job; both end in Closed.
    a.disconnect(2_000);
    let conditions = Conditions::harsh();
    let mut now = 2_000;
    while now < 15_000 {
        a.update(now);
        b.update(now);
        exchange(&mut a, &mut b, now, &conditions, &mut rng);
        exchange(&mut b, &mut a, now, &conditions, &mut rng);
        now += 25;
    }

    assert!(matches!(a.state(), LinkState::Closed(_)));
    assert!(matches!(b.state(), LinkState::Closed(_)));
}
