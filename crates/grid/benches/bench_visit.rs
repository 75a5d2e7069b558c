use std::collections::HashMap;
use std::convert::Infallible;
use std::hint::black_box;
use std::time::Instant;

use cellspace_common::ObjectCategory;
use cellspace_grid::{BucketKey, BucketStore, Dispatcher, GridConfig, GridLayout};
use glam::Vec2;

struct FlatStore {
    layout: GridLayout,
    buckets: HashMap<BucketKey, Vec<Vec2>>,
}

impl BucketStore for FlatStore {
    type Object = Vec2;
    type Objects<'a> = std::slice::Iter<'a, Vec2>;

    fn layout(&self) -> &GridLayout {
        &self.layout
    }

    fn objects(&self, key: BucketKey, category: ObjectCategory) -> Self::Objects<'_> {
        match category {
            ObjectCategory::GridBound => self.buckets.get(&key).map(Vec::as_slice).unwrap_or(&[]).iter(),
            ObjectCategory::WorldBound => Default::default(),
        }
    }
}

fn make_store(object_count: usize, spacing: f32) -> FlatStore {
    let layout = GridLayout::new(GridConfig::default()).expect("default layout is valid");
    let side = (object_count as f32).sqrt().ceil() as usize;
    let mut buckets: HashMap<BucketKey, Vec<Vec2>> = HashMap::new();
    for i in 0..object_count {
        let p = Vec2::new((i % side) as f32 * spacing, (i / side) as f32 * spacing);
        let key = layout.key_of(p).expect("bench positions lie inside the world");
        buckets.entry(key).or_default().push(p);
    }
    FlatStore { layout, buckets }
}

fn bench_resolve(iterations: usize) {
    let layout = GridLayout::new(GridConfig::default()).expect("default layout is valid");
    let start = Instant::now();
    for i in 0..iterations {
        let center = Vec2::new((i % 1000) as f32, 0.0);
        let _ = black_box(layout.resolve(black_box(center), black_box(40.0)));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!("  resolve ({iterations} iters): {per_iter:?}/iter, total {elapsed:?}");
}

fn bench_sweep(object_count: usize, radius: f32, iterations: usize) {
    let store = make_store(object_count, 4.0);
    let dispatcher = Dispatcher::new(&store);
    let start = Instant::now();
    let mut hits = 0usize;
    for _ in 0..iterations {
        hits += dispatcher
            .visit_grid_objects_at(black_box(Vec2::new(64.0, 64.0)), black_box(radius), |p| {
                black_box(p);
                Ok::<_, Infallible>(())
            })
            .unwrap_or_default();
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  sweep ({object_count} objects, r={radius}, {iterations} iters): {per_iter:?}/iter, {} hits/iter",
        hits / iterations
    );
}

fn main() {
    println!("=== Visit Benchmarks ===\n");

    println!("Resolve:");
    bench_resolve(100_000);

    println!("\nGrid sweep:");
    bench_sweep(1000, 10.0, 10000);
    bench_sweep(10000, 40.0, 10000);
    bench_sweep(10000, 150.0, 1000);

    println!("\n=== Done ===");
}
