//! Performance benchmarks for critical simulation systems

use server::client_manager::ClientManager;
use server::game::{GameConfig, GameState};
use shared::{
    BodyId, BodyOptions, BodyState, InputState, Packet, Snapshot, Vector, World, DEFAULT_TIMESTEP,
};
use std::net::SocketAddr;
use std::time::Instant;

/// Fills a bounded world with a grid of boxes and discs that all collide with each other
fn crowded_world(columns: usize, rows: usize) -> World {
    let mut world = World::new(Vector::new(0.0, 500.0));
    let mut add = world.add();
    let _ = add.configure_world_bounds(800.0, 600.0);

    let mut ids = Vec::with_capacity(columns * rows);
    for row in 0..rows {
        for column in 0..columns {
            let x = 40.0 + column as f64 * 30.0;
            let y = 40.0 + row as f64 * 30.0;
            let options = BodyOptions {
                restitution: 0.3,
                friction: 0.05,
                ..Default::default()
            };
            let id = if (row + column) % 2 == 0 {
                add.spawn_box(x, y, x + 16.0, y + 16.0, options)
            } else {
                add.spawn_disc(x + 8.0, y + 8.0, 8.0, options)
            };
            if let Ok(id) = id {
                ids.push(id);
            }
        }
    }

    let everything = add.group(&ids);
    let _ = add.collider(everything, everything);
    world
}

/// Benchmarks a world step with a few hundred interacting bodies
#[test]
fn benchmark_world_step() {
    let mut world = crowded_world(20, 10);
    let steps = 300;
    let start = Instant::now();

    for _ in 0..steps {
        world.step(DEFAULT_TIMESTEP);
    }

    let duration = start.elapsed();
    println!(
        "World step: {} bodies, {} steps in {:?} ({:.2} ms/step)",
        world.body_count(),
        steps,
        duration,
        duration.as_secs_f64() * 1000.0 / steps as f64
    );

    // Five seconds of simulated time should not take longer than ten real ones
    assert!(duration.as_secs() < 10);
    assert_eq!(world.tick(), steps);
}

/// Benchmarks overlap detection on its own
#[test]
fn benchmark_overlap_detection() {
    let world = crowded_world(20, 10);
    let bodies: Vec<_> = world.bodies().collect();

    let start = Instant::now();
    let mut overlaps = 0;
    for a in &bodies {
        for b in &bodies {
            if a.contact_with(b).is_some() {
                overlaps += 1;
            }
        }
    }
    let duration = start.elapsed();

    println!(
        "Overlap detection: {} pairs in {:?}, {} overlapping",
        bodies.len() * bodies.len(),
        duration,
        overlaps
    );

    assert!(duration.as_millis() < 1000);
}

/// Benchmarks snapshot serialization for a busy arena
#[test]
fn benchmark_snapshot_serialization() {
    let world = crowded_world(20, 10);
    let mut snapshot = Snapshot::default();
    for body in world.bodies().filter(|b| !b.ignores_world_bounds()) {
        if body.is_disc() {
            snapshot.discs.insert(body.id(), BodyState::from(body));
        } else {
            snapshot.obstacles.insert(body.id(), BodyState::from(body));
        }
    }
    let packet = Packet::Snapshot { tick: 1, snapshot };

    let iterations = 1_000;
    let start = Instant::now();
    let mut total_bytes = 0;

    for _ in 0..iterations {
        let data = packet.encode().unwrap();
        total_bytes += data.len();
        let decoded = Packet::decode(&data).unwrap();
        assert!(matches!(decoded, Packet::Snapshot { .. }));
    }

    let duration = start.elapsed();
    println!(
        "Snapshot serialization: {} iterations, {} bytes each, in {:?}",
        iterations,
        total_bytes / iterations,
        duration
    );

    assert!(duration.as_millis() < 2000);
}

/// Benchmarks the server tick with many connected players holding keys
#[test]
fn benchmark_server_tick() {
    let mut game = GameState::new(GameConfig::default()).unwrap();
    let mut clients = ClientManager::new(32);

    for i in 0..32u16 {
        let addr: SocketAddr = format!("127.0.0.1:{}", 20_000 + i).parse().unwrap();
        let client_id = clients.add_client(addr).unwrap();
        let body = game.add_player().unwrap();
        clients.assign_body(client_id, body);
        clients.record_input(
            client_id,
            InputState {
                sequence: 1,
                left: i % 3 == 0,
                right: i % 3 == 1,
                up: i % 2 == 0,
                down: false,
            },
        );
    }

    let ticks = 600;
    let start = Instant::now();
    let mut snapshots = 0;

    for _ in 0..ticks {
        let outcome = game.advance(DEFAULT_TIMESTEP, clients.latest_inputs());
        if outcome.snapshot.is_some() {
            snapshots += 1;
        }
    }

    let duration = start.elapsed();
    println!(
        "Server tick: {} ticks with {} players in {:?}",
        ticks,
        clients.len(),
        duration
    );

    assert_eq!(snapshots, ticks);
    assert!(duration.as_secs() < 10);
}

/// Stress test for input bookkeeping under a flood of out-of-order packets
#[test]
fn stress_test_many_inputs() {
    let mut clients = ClientManager::new(4);
    let addr: SocketAddr = "127.0.0.1:9000".parse().unwrap();
    let client_id = clients.add_client(addr).unwrap();
    clients.assign_body(client_id, BodyId(1));

    let start = Instant::now();
    let mut accepted = 0;
    for i in 0..100_000u32 {
        // Every fourth packet arrives late
        let sequence = if i % 4 == 3 { i.saturating_sub(2) } else { i + 1 };
        let input = InputState {
            sequence,
            left: i % 2 == 0,
            ..Default::default()
        };
        if clients.record_input(client_id, input) {
            accepted += 1;
        }
    }
    let duration = start.elapsed();

    println!(
        "Input stress: {} accepted out of 100000 in {:?}",
        accepted, duration
    );

    assert_eq!(clients.latest_inputs()[0].1.sequence, 99_999);
    assert!(accepted < 100_000);
    assert!(duration.as_millis() < 1000);
}
