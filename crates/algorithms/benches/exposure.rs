//! Benchmarks for the full per-point exposure pipeline

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use coastview_algorithms::exposure::{EvaluatorParams, ExposureEvaluator, OceanLayer, PointContext};
use coastview_core::{Extent, PropertyPoint, Raster};

/// Land/ocean codes with ocean (200) on the southern half
fn create_ocean(radius: f64) -> OceanLayer {
    let extent = Extent::around(0.0, 0.0, radius);
    let mut codes = Raster::for_extent(&extent, 10.0, 100.0).unwrap();
    let (rows, cols) = codes.shape();
    for row in rows / 2..rows {
        for col in 0..cols {
            codes.set(row, col, 200.0).unwrap();
        }
    }
    OceanLayer::Raster(codes)
}

/// Houses on a 50-unit lattice north of the target
fn create_neighbours(radius: f64) -> Vec<PropertyPoint> {
    let mut points = Vec::new();
    let steps = (radius / 50.0) as i64;
    for i in -steps..=steps {
        for j in 1..=steps {
            points.push(PropertyPoint::new(points.len() as u64 + 2, i as f64 * 50.0, j as f64 * 50.0));
        }
    }
    points
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("exposure/evaluate");
    group.sample_size(10);
    for radius in [250.0, 500.0, 1000.0] {
        let ocean = create_ocean(radius);
        let ctx = PointContext {
            target: PropertyPoint::new(1, 5.0, 5.0),
            nearby: create_neighbours(radius),
            ocean: &ocean,
        };
        let evaluator = ExposureEvaluator::new(EvaluatorParams {
            analysis_radius: radius,
            ..Default::default()
        });
        group.bench_with_input(BenchmarkId::from_parameter(radius as u64), &radius, |b, _| {
            b.iter(|| evaluator.evaluate(black_box(&ctx)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_evaluate);
criterion_main!(benches);
