use criterion::{criterion_group, criterion_main, Criterion};
use rand::Rng;
use std::hint::black_box;
use unwarp_camera::{distort_point, undistort_point_approx, CameraMatrix, DistortionCoefficients};

fn gen_pixel_points(n: usize, width: f64, height: f64) -> Vec<(f64, f64)> {
    let mut rng = rand::rng();
    (0..n)
        .map(|_| {
            (
                rng.random_range(0.0..width),
                rng.random_range(0.0..height),
            )
        })
        .collect()
}

fn bench_distort(c: &mut Criterion) {
    let camera = CameraMatrix::new(800.0, 800.0, 320.0, 240.0);
    let distortion = DistortionCoefficients {
        k1: -0.2,
        k2: 0.05,
        p1: 0.001,
        p2: -0.001,
        ..Default::default()
    };

    let pts = gen_pixel_points(10_000, 640.0, 480.0);

    c.bench_function("distort_point", |b| {
        b.iter(|| {
            for &(x, y) in &pts {
                black_box(distort_point(black_box(x), black_box(y), &camera, &distortion));
            }
        })
    });

    c.bench_function("undistort_point_approx", |b| {
        b.iter(|| {
            for &(x, y) in &pts {
                black_box(undistort_point_approx(
                    black_box(x),
                    black_box(y),
                    &camera,
                    &distortion,
                ));
            }
        })
    });
}

criterion_group!(benches, bench_distort);
criterion_main!(benches);
