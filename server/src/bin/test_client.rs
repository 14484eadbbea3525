//! Minimal headless client: connects, holds a few key combinations and prints
//! what the server reports back.

use shared::{InputState, Packet, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{sleep, timeout};

const SERVER_ADDR: &str = "127.0.0.1:8080";

async fn send(
    socket: &UdpSocket,
    packet: &Packet,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error>> {
    socket.send_to(&packet.encode()?, addr).await?;
    Ok(())
}

async fn recv(socket: &UdpSocket, buf: &mut [u8]) -> Option<Packet> {
    match timeout(Duration::from_secs(2), socket.recv_from(buf)).await {
        Ok(Ok((len, _))) => match Packet::decode(&buf[..len]) {
            Ok(packet) => Some(packet),
            Err(e) => {
                println!("Failed to decode packet: {}", e);
                None
            }
        },
        Ok(Err(e)) => {
            println!("Error receiving packet: {}", e);
            None
        }
        Err(_) => {
            println!("Timed out waiting for server");
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    println!("Client socket bound to {}", socket.local_addr()?);

    let server_addr: SocketAddr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| SERVER_ADDR.to_string())
        .parse()?;

    println!("Sending connection request to {}", server_addr);
    send(
        &socket,
        &Packet::Connect {
            client_version: PROTOCOL_VERSION,
        },
        server_addr,
    )
    .await?;

    let mut buf = [0u8; 4096];
    let body_id = match recv(&socket, &mut buf).await {
        Some(Packet::Connected { client_id, body_id }) => {
            println!("Connected as client {} controlling body {}", client_id, body_id);
            body_id
        }
        Some(other) => {
            println!("Expected Connected but got: {:?}", other);
            return Ok(());
        }
        None => return Ok(()),
    };

    let script = [
        (false, true, false, false),
        (false, true, true, false),
        (true, false, false, false),
        (false, false, false, true),
        (false, false, false, false),
    ];

    for (i, (left, right, up, down)) in script.into_iter().enumerate() {
        let input = InputState {
            sequence: i as u32 + 1,
            left,
            right,
            up,
            down,
        };
        println!("Sending input: {:?}", input);
        send(&socket, &Packet::Input(input), server_addr).await?;

        sleep(Duration::from_millis(500)).await;

        // Drain to the newest snapshot
        let mut latest = None;
        while let Ok(Ok((len, _))) =
            timeout(Duration::from_millis(50), socket.recv_from(&mut buf)).await
        {
            if let Ok(Packet::Snapshot { tick, snapshot }) = Packet::decode(&buf[..len]) {
                latest = Some((tick, snapshot));
            }
        }

        match latest {
            Some((tick, snapshot)) => {
                println!(
                    "Tick {}: {} players, {} obstacles, {} discs",
                    tick,
                    snapshot.players.len(),
                    snapshot.obstacles.len(),
                    snapshot.discs.len()
                );
                if let Some(state) = snapshot.players.get(&body_id) {
                    println!("  Own body at ({:.1}, {:.1})", state.x, state.y);
                }
                for (id, state) in &snapshot.discs {
                    println!("  Disc {} at ({:.1}, {:.1})", id, state.x, state.y);
                }
            }
            None => println!("No snapshot received"),
        }
    }

    println!("Sending disconnect request");
    send(&socket, &Packet::Disconnect, server_addr).await?;
    println!("Test client finished");

    Ok(())
}
