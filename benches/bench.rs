// Criterion benchmarks for estate-match

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use estate_match::core::{merge_ranked, Geofence, RangeCatalog};
use estate_match::models::{Coordinate, OrderBy, Property};

fn create_property(id: i64, latitude: f64, longitude: f64) -> Property {
    Property {
        id,
        thumbnail: String::new(),
        name: format!("Property {}", id),
        description: String::new(),
        latitude,
        longitude,
        address: String::new(),
        rent: 50000 + id * 100,
        door_height: 200,
        door_width: 90,
        features: String::new(),
        popularity: id % 97,
        features_array: vec![],
        rent_range: 0,
        door_height_range: 0,
        door_width_range: 0,
    }
}

/// Star-shaped ring with `points` vertices around Tokyo station
fn create_polygon(points: usize) -> Vec<Coordinate> {
    (0..points)
        .map(|i| {
            let angle = i as f64 / points as f64 * std::f64::consts::TAU;
            let radius = if i % 2 == 0 { 0.05 } else { 0.02 };
            Coordinate {
                latitude: 35.68 + radius * angle.cos(),
                longitude: 139.76 + radius * angle.sin(),
            }
        })
        .collect()
}

fn bench_classify(c: &mut Criterion) {
    let ranges = RangeCatalog::load("config/item_conditions.json")
        .expect("item conditions should load");

    c.bench_function("classify_price", |b| {
        b.iter(|| ranges.classify(black_box("price"), black_box(10500)));
    });
}

fn bench_geofence(c: &mut Criterion) {
    let mut group = c.benchmark_group("geofence");

    for vertex_count in [4, 16, 64, 256].iter() {
        let fence = Geofence::new(&create_polygon(*vertex_count)).expect("polygon is not empty");
        let candidates: Vec<Property> = (0..1000)
            .map(|i| {
                let offset = (i as f64 * 0.0001) % 0.1;
                create_property(i, 35.63 + offset, 139.71 + offset)
            })
            .collect();

        group.bench_with_input(
            BenchmarkId::new("filter_1000_candidates", vertex_count),
            vertex_count,
            |b, _| {
                b.iter(|| fence.filter(black_box(candidates.clone()), black_box(50)));
            },
        );
    }

    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let first: Vec<Property> = (0..20).map(|i| create_property(i, 0.0, 0.0)).collect();
    let second: Vec<Property> = (10..30).map(|i| create_property(i, 0.0, 0.0)).collect();

    c.bench_function("merge_two_recommendation_lists", |b| {
        b.iter(|| {
            merge_ranked(
                black_box([first.clone(), second.clone()]),
                OrderBy::Popularity,
                20,
            )
        });
    });
}

criterion_group!(benches, bench_classify, bench_geofence, bench_merge);

criterion_main!(benches);
