//! Client that sends numbered messages to the echo server and prints what
//! comes back.
//!
//! Run the server first:
//! - cargo run -p trellis --example server -- 127.0.0.1:7777
//!
//! Then:
//! - cargo run -p trellis --example client -- 127.0.0.1:7777
//! - cargo run -p trellis --example client -- 127.0.0.1:7777 10 200
//!   (sends 10 messages, 200ms apart)

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

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    // Args: <server_addr> [count] [interval_ms]
    let mut args = env::args().skip(1);
    let server_addr: SocketAddr = args
        .next()
        .unwrap_or_else(|| "127.0.0.1:9000".to_string())
        .parse()?;
    let count: u32 = args.next().unwrap_or_else(|| "5".into()).parse().unwrap_or(5);
    let interval_ms: u32 = args
        .next()
        .unwrap_or_else(|| "300".into())
        .parse()
        .unwrap_or(300);

    let socket = UdpSocket::bind("0.0.0.0:0")?;
    socket.connect(server_addr)?;
    socket.set_nonblocking(true)?;
    println!(
        "trellis client {} -> {} ({} messages, every {}ms)",
        socket.local_addr()?,
        server_addr,
        count,
        interval_ms
    );

    let mut transport = UdpTransport { socket };
    let (mut link, events) = Connection::new(Config::default());
    let start = Instant::now();
    link.connect(0);

    let mut buffer = [0u8; 2048];
    let mut sent = 0;
    let mut next_send = 0u32;

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
                    println!(
                        "[reply] channel={:?} payload=\"{}\"",
                        channel,
                        String::from_utf8_lossy(&payload)
                    );
                }
                LinkEvent::Disconnected => println!("[disconnected]"),
                LinkEvent::TimedOut => println!("[timeout]"),
                _ => {}
            }
        }

        if link.is_active() && sent < count && now >= next_send {
            let msg = format!("hello {}", sent);
            link.output(now, Channel::Ordered, msg.as_bytes())?;
            sent += 1;
            next_send = now + interval_ms;
            if sent == count {
                // Give the last echoes a moment, then tear down.
                next_send = now + interval_ms.max(500);
            }
        }
        if sent == count && link.is_active() && now >= next_send {
            link.disconnect(now);
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
