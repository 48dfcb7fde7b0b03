//! Scalability benchmarks for the realm server
//!
//! Measures command handling and world tick cost at various player counts.
//!
//! Run with: cargo bench --bench scalability

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::SeedableRng;
use realm_server::game::command;
use realm_server::game::interpreter::{Actor, Interpreter};
use realm_server::game::tick::{TickConfig, WorldTick};
use realm_server::metrics::Metrics;
use realm_server::net::outbox::{drain_lines, Outbox, OutboxReceiver};
use realm_server::world::content::WorldSpec;
use realm_server::world::graph::World;
use realm_server::world::player::{Player, PlayerTemplate};
use realm_server::world::room::Direction;
use uuid::Uuid;

/// Reference world with `count` players spread over the rooms
fn create_world_with_players(count: usize) -> (Arc<World>, Vec<(Actor, OutboxReceiver)>) {
    let world = Arc::new(World::from_spec(&WorldSpec::reference()).expect("reference world"));
    let routes = [
        vec![],
        vec![Direction::North],
        vec![Direction::South],
        vec![Direction::East],
        vec![Direction::West],
        vec![Direction::South, Direction::Down],
        vec![Direction::West, Direction::Down],
    ];

    let players = (0..count)
        .map(|i| {
            let (outbox, mut rx) = Outbox::channel(1024);
            let id = Uuid::new_v4();
            let name = format!("Player{}", i);
            world.add_player(Player::new(id, name.clone(), PlayerTemplate::default(), outbox.clone()));
            for direction in &routes[i % routes.len()] {
                let _ = world.move_player(id, *direction);
            }
            drain_lines(&mut rx);
            (Actor::new(id, name, outbox), rx)
        })
        .collect();

    (world, players)
}

fn bench_parse(c: &mut Criterion) {
    let lines = [
        "look",
        "n",
        "get wooden mug",
        "attack giant rat",
        "say hello there everyone",
        "equip iron sword",
        "dance",
    ];

    c.bench_function("parse_mixed_commands", |b| {
        b.iter(|| {
            for line in &lines {
                let _ = black_box(command::parse(black_box(line)));
            }
        });
    });
}

fn bench_commands(c: &mut Criterion) {
    let mut group = c.benchmark_group("commands");
    group.sample_size(50);

    for count in [10, 100, 500, 1000] {
        let (world, mut players) = create_world_with_players(count);
        let interpreter = Interpreter::new(world, Arc::new(Metrics::new()));

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("look_and_say", count), &count, |b, _| {
            b.iter(|| {
                for (actor, rx) in players.iter_mut() {
                    interpreter.handle_line(actor, "look");
                    interpreter.handle_line(actor, "say hi");
                    drain_lines(rx);
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("move_round_trip", count), &count, |b, _| {
            b.iter(|| {
                for (actor, rx) in players.iter_mut() {
                    interpreter.handle_line(actor, "n");
                    interpreter.handle_line(actor, "s");
                    drain_lines(rx);
                }
            });
        });
    }

    group.finish();
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("world_tick");
    group.sample_size(50);

    for count in [10, 100, 500, 1000] {
        let (world, mut players) = create_world_with_players(count);
        let tick = WorldTick::new(world, Arc::new(Metrics::new()), TickConfig::default());
        let mut rng = StdRng::seed_from_u64(42);

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("run_once", count), &count, |b, _| {
            b.iter(|| {
                black_box(tick.run_once(&mut rng));
                for (_, rx) in players.iter_mut() {
                    drain_lines(rx);
                }
            });
        });
    }

    group.finish();
}

fn bench_concurrent_moves(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_moves");
    group.sample_size(20);

    for threads in [2, 4, 8] {
        let (world, players) = create_world_with_players(threads * 25);
        let ids: Vec<_> = players.iter().map(|(actor, _)| actor.id).collect();

        group.bench_with_input(BenchmarkId::new("threads", threads), &threads, |b, &threads| {
            b.iter(|| {
                std::thread::scope(|scope| {
                    for chunk in ids.chunks(ids.len() / threads) {
                        let world = &world;
                        scope.spawn(move || {
                            for id in chunk {
                                let _ = world.move_player(*id, Direction::North);
                                let _ = world.move_player(*id, Direction::South);
                            }
                        });
                    }
                });
            });
        });

        drop(players);
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_parse,
    bench_commands,
    bench_tick,
    bench_concurrent_moves
);
criterion_main!(benches);
