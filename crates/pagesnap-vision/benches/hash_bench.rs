//! pagesnap-vision 성능 벤치마크
//!
//! 실행: cargo bench -p pagesnap-vision
//!
//! 벤치마크 대상:
//! - 지각 해시 (BlockMean / Gradient)

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pagesnap_core::models::capture::RawCapture;
use pagesnap_core::models::fingerprint::HashAlgorithm;
use pagesnap_core::models::scope::DocumentScope;
use pagesnap_core::ports::acquire::FingerprintEngine;
use pagesnap_vision::hash::PerceptualHasher;

/// 테스트용 페이지 이미지 생성
fn create_test_capture(width: u32, height: u32, seed: u8) -> RawCapture {
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            let r = (x as u8).wrapping_add(seed).wrapping_mul(17);
            let g = (y as u8).wrapping_add(seed).wrapping_mul(31);
            let b = (x as u8).wrapping_add(y as u8).wrapping_add(seed);
            pixels.extend_from_slice(&[r, g, b, 255]);
        }
    }
    RawCapture {
        scope: DocumentScope::named("bench"),
        width,
        height,
        pixels,
        captured_at: Utc::now(),
    }
}

/// 지각 해시 벤치마크
fn bench_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("perceptual_hash");

    let resolutions = [(640, 480), (1280, 720), (1920, 1080)];

    for (width, height) in resolutions {
        let pixels = width * height;
        group.throughput(Throughput::Elements(pixels as u64));

        let capture = create_test_capture(width, height, 42);

        for algorithm in [HashAlgorithm::BlockMean, HashAlgorithm::Gradient] {
            let hasher = PerceptualHasher::new(algorithm);
            group.bench_with_input(
                BenchmarkId::new(format!("{algorithm:?}"), format!("{width}x{height}")),
                &capture,
                |b, capture| {
                    b.iter(|| hasher.fingerprint(black_box(capture)).unwrap());
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_hash);
criterion_main!(benches);
