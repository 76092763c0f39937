// Criterion benchmarks for Tunemap

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use tunemap::core::{
    distance::{calculate_bounding_box, haversine_distance, is_within_bounding_box},
    find_nearby, ProximityEngine,
};
use tunemap::models::{Coordinate, NearbyQuery, User};
use tunemap::services::{CacheManager, InMemoryUserStore, NearbyService, UserStore};

const NEW_YORK: Coordinate = Coordinate::new(40.7128, -74.0060);

fn create_user(id: usize, lat: f64, lon: f64) -> User {
    User {
        id: id as i64,
        username: format!("user{}", id),
        // every tenth user has no location
        latitude: (id % 10 != 0).then_some(lat),
        longitude: (id % 10 != 0).then_some(lon),
        music_preferences: vec![],
        created_at: None,
    }
}

fn create_candidates(count: usize) -> Vec<User> {
    (0..count)
        .map(|i| {
            let lat_offset = (i as f64 * 0.001) % 0.5;
            let lon_offset = (i as f64 * 0.0017) % 0.5;
            create_user(i, NEW_YORK.latitude + lat_offset, NEW_YORK.longitude + lon_offset)
        })
        .collect()
}

fn bench_haversine_distance(c: &mut Criterion) {
    c.bench_function("haversine_distance", |b| {
        b.iter(|| {
            haversine_distance(
                black_box(NEW_YORK),
                black_box(Coordinate::new(40.72, -74.01)),
            )
        });
    });
}

fn bench_bounding_box(c: &mut Criterion) {
    c.bench_function("bounding_box_calculation", |b| {
        b.iter(|| calculate_bounding_box(black_box(NEW_YORK), black_box(50.0)));
    });
}

fn bench_find_nearby(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_nearby");

    for candidate_count in [10, 50, 100, 500, 1000].iter() {
        let candidates = create_candidates(*candidate_count);

        group.bench_with_input(
            BenchmarkId::new("filter", candidate_count),
            candidate_count,
            |b, _| {
                b.iter(|| find_nearby(black_box(&candidates), black_box(NEW_YORK), black_box(20.0)));
            },
        );
    }

    group.finish();
}

fn bench_ranked_search(c: &mut Criterion) {
    let engine = ProximityEngine::new(true);
    let candidates = create_candidates(1000);
    let query = NearbyQuery { center: NEW_YORK, radius_km: 20.0 };

    c.bench_function("ranked_search_1000_candidates", |b| {
        b.iter(|| engine.search(black_box(&candidates), black_box(&query)));
    });
}

fn bench_prefiltered_pipeline(c: &mut Criterion) {
    let candidates = create_candidates(1000);

    c.bench_function("bbox_prefilter_1000_candidates", |b| {
        b.iter(|| {
            let bbox = calculate_bounding_box(NEW_YORK, 20.0);
            let prefiltered: Vec<User> = candidates
                .iter()
                .filter(|u| {
                    u.coordinate()
                        .map(|c| is_within_bounding_box(c, &bbox))
                        .unwrap_or(false)
                })
                .cloned()
                .collect();

            black_box(find_nearby(&prefiltered, NEW_YORK, 20.0))
        });
    });
}

fn bench_service_scan(c: &mut Criterion) {
    let store = Arc::new(InMemoryUserStore::new());
    tokio_test::block_on(async {
        for (i, user) in create_candidates(500).into_iter().enumerate() {
            let created = store
                .create_user(&format!("bench{}", i), "unused-hash")
                .await
                .unwrap();
            if let Some(coordinate) = user.coordinate() {
                store.update_location(created.id, coordinate).await.unwrap();
            }
        }
    });

    let service = NearbyService::new(
        store,
        Arc::new(CacheManager::local(100, 60)),
        ProximityEngine::default(),
        true,
    );
    let query = NearbyQuery { center: NEW_YORK, radius_km: 20.0 };

    c.bench_function("service_scan_500_users", |b| {
        b.iter(|| tokio_test::block_on(service.scan(black_box(&query))).unwrap());
    });
}

criterion_group!(
    benches,
    bench_haversine_distance,
    bench_bounding_box,
    bench_find_nearby,
    bench_ranked_search,
    bench_prefiltered_pipeline,
    bench_service_scan
);

criterion_main!(benches);
