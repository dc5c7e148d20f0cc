//! Echo server for a single trellis link.
//!
//! Run:
//! - cargo run -p trellis --example server
//! - cargo run -p trellis --example server -- 127.0.0.1:7777
//!
//! Waits for a client, completes the handshake, then echoes every payload
//! back on the channel it arrived on.

use std::{
    env,
    io::ErrorKind as IoErrorKind,
    net::{SocketAddr, UdpSocket},
    thread,
    time::{Duration, Instant},
};

use trellis::{Channel, Config, Connection, DatagramSocket, LinkEvent, LinkState};

struct UdpTransport {
    socket: UdpSocket,
}

impl DatagramSocket for UdpTransport {
    fn send_datagram(&mut self, datagram: &[u8]) -> std::io::Result<usize> {
        self.socket.send(datagram)
    }

    fn receive_datagram<'a>(&mut self, buffer: &'a mut [u8]) -> std::io::Result<&'a [u8]> {
        let len = self.socket.recv(buffer)?;
        Ok(&buffer[..len])
    }
}

fn parse_bind_addr() -> Option<SocketAddr> {
    let mut args = env::args().skip(1);
    args.next().and_then(|s| s.parse().ok())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let bind_addr = parse_bind_addr().unwrap_or_else(|| "127.0.0.1:9000".parse().unwrap());
    let socket = UdpSocket::bind(bind_addr)?;
    println!("trellis echo server listening on {}", socket.local_addr()?);

    // Block until the first client frame, then lock onto that peer.
    let mut buffer = [0u8; 2048];
    let (len, peer) = socket.recv_from(&mut buffer)?;
    socket.connect(peer)?;
    socket.set_nonblocking(true)?;
    println!("[peer] {}", peer);

    let mut transport = UdpTransport { socket };
    let (mut link, events) = Connection::new(Config::default());
    let start = Instant::now();

    let first = buffer[..len].to_vec();
    link.input(start.elapsed().as_millis() as u32, &first)?;

    loop {
        let now = start.elapsed().as_millis() as u32;

        loop {
            match transport.receive_datagram(&mut buffer) {
                Ok(datagram) => {
                    if let Err(e) = link.input(now, datagram) {
                        eprintln!("dropped frame: {}", e);
                    }
                }
                Err(e) if e.kind() == IoErrorKind::WouldBlock => break,
                Err(e) => return Err(e.into()),
            }
        }

        link.update(now);

        for event in events.try_iter() {
            match event {
                LinkEvent::Connected => println!("[connected]"),
                LinkEvent::Packet { channel, payload, .. } => {
                    let text = String::from_utf8_lossy(&payload);
                    println!("[packet] channel={:?} payload=\"{}\"", channel, text);
                    if channel != Channel::Control {
                        if let Err(e) = link.output(now, channel, &payload) {
                            eprintln!("failed to queue echo: {}", e);
                        }
                    }
                }
                LinkEvent::Disconnected => println!("[disconnected]"),
                LinkEvent::TimedOut => println!("[timeout]"),
                _ => {}
            }
        }

        while let Some(datagram) = link.poll_transmit() {
            transport.send_datagram(&datagram)?;
        }

        if let LinkState::Closed(reason) = link.state() {
            println!("link closed: {:?}", reason);
            return Ok(());
        }
        thread::sleep(Duration::from_millis(10));
    }
}
