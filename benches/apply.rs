// benches/apply.rs
use std::io;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use bookfeed::book::{Side, Symbol};
use bookfeed::engine::{Engine, Event};
use bookfeed::parser::encode;
use bookfeed::replay::{replay_bytes, ReplayOptions};

/// Seeded, well-formed event mix: every update, delete and execute targets
/// an order that is actually live at that point.
fn generate_events(count: usize, seed: u64) -> Vec<Event> {
    let symbols = [*b"AAA", *b"BBB", *b"CCC", *b"DDD"];
    let mut rng = StdRng::seed_from_u64(seed);
    let mut live: Vec<(u64, Side, Symbol, u64)> = Vec::new();
    let mut next_id = 1u64;
    let mut events = Vec::with_capacity(count);

    for _ in 0..count {
        let roll = rng.gen_range(0..100u32);
        if live.is_empty() || roll < 55 {
            let symbol = Symbol::new(symbols[rng.gen_range(0..symbols.len())]);
            let side = if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell };
            let size = rng.gen_range(1..=500u64);
            let price = rng.gen_range(900..1100i32);
            events.push(Event::Add { symbol, order_id: next_id, side, size, price });
            live.push((next_id, side, symbol, size));
            next_id += 1;
        } else if roll < 70 {
            let i = rng.gen_range(0..live.len());
            let (id, side, symbol, _) = live[i];
            let size = rng.gen_range(1..=500u64);
            let price = rng.gen_range(900..1100i32);
            events.push(Event::Update { symbol, order_id: id, side, size, price });
            live[i].3 = size;
        } else if roll < 85 {
            let i = rng.gen_range(0..live.len());
            let (id, side, symbol, size) = live[i];
            let traded = rng.gen_range(1..=size);
            events.push(Event::Execute { symbol, order_id: id, side, traded });
            if traded == size {
                live.swap_remove(i);
            } else {
                live[i].3 -= traded;
            }
        } else {
            let i = rng.gen_range(0..live.len());
            let (id, side, symbol, _) = live.swap_remove(i);
            events.push(Event::Delete { symbol, order_id: id, side });
        }
    }

    events
}

fn encode_stream(events: &[Event]) -> Vec<u8> {
    let mut out = Vec::new();
    for (i, ev) in events.iter().enumerate() {
        let body = match *ev {
            Event::Add { symbol, order_id, side, size, price } => {
                encode::add(symbol, order_id, side, size, price)
            }
            Event::Update { symbol, order_id, side, size, price } => {
                encode::update(symbol, order_id, side, size, price, 0)
            }
            Event::Delete { symbol, order_id, side } => encode::delete(symbol, order_id, side),
            Event::Execute { symbol, order_id, side, traded } => {
                encode::execute(symbol, order_id, side, traded)
            }
        };
        out.extend(encode::frame(i as u32 + 1, &body));
    }
    out
}

fn bench_apply(c: &mut Criterion) {
    let events = generate_events(100_000, 42);

    let mut group = c.benchmark_group("engine");
    group.throughput(Throughput::Elements(events.len() as u64));
    group.bench_function("apply_mixed_100k", |b| {
        b.iter_batched(
            || {
                let mut engine = Engine::new();
                engine.reserve_orders(events.len());
                engine
            },
            |mut engine| {
                for ev in &events {
                    engine.apply(*ev).unwrap();
                }
                engine
            },
            BatchSize::LargeInput,
        )
    });
    group.finish();
}

fn bench_replay(c: &mut Criterion) {
    let stream = encode_stream(&generate_events(100_000, 7));

    let mut group = c.benchmark_group("replay");
    group.throughput(Throughput::Bytes(stream.len() as u64));
    group.bench_function("replay_bytes_100k", |b| {
        b.iter(|| {
            let mut sink = io::sink();
            replay_bytes(black_box(&stream), &mut sink, ReplayOptions::default()).unwrap()
        })
    });
    group.finish();
}

criterion_group!(benches, bench_apply, bench_replay);
criterion_main!(benches);
