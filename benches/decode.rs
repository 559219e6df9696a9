use criterion::{black_box, criterion_group, criterion_main, Criterion};
use voxscene::kvx;
use voxscene::placer::mesh::MeshCubePlacer;
use voxscene::placer::points::PointCubePlacer;

/// A fully solid size^3 slab file, one full-height run per column.
fn filled_box_file(size: u32) -> Vec<u8> {
    let column = 3 + size;
    let tables = (size + 1) * 4 + size * (size + 1) * 2;
    let voxdata = size * size * column;
    let mut file = Vec::new();
    file.extend_from_slice(&(24 + tables + voxdata).to_le_bytes());
    for _ in 0..3 {
        file.extend_from_slice(&size.to_le_bytes());
    }
    for _ in 0..3 {
        file.extend_from_slice(&(size * 128).to_le_bytes());
    }
    for x in 0..=size {
        file.extend_from_slice(&(x * size * column).to_le_bytes());
    }
    for _ in 0..size {
        for y in 0..=size {
            file.extend_from_slice(&((y * column) as u16).to_le_bytes());
        }
    }
    for _ in 0..size * size {
        file.push(0);
        file.push(size as u8);
        file.push(0x3f);
        for z in 0..size {
            file.push((z % 255) as u8 + 1);
        }
    }
    for index in 0..=255u8 {
        file.extend_from_slice(&[index % 64, 63 - index % 64, 32]);
    }
    file
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let file = filled_box_file(32);
    let mut group = c.benchmark_group("slab decode");
    group.significance_level(0.001);
    group.sample_size(200);
    group.bench_function("mesh", |b| {
        b.iter(|| {
            let mut placer = MeshCubePlacer::new();
            kvx::decode(black_box(&file), &mut placer).unwrap();
            black_box(placer.into_buffer());
        })
    });
    group.bench_function("points", |b| {
        b.iter(|| {
            let mut placer = PointCubePlacer::new();
            kvx::decode(black_box(&file), &mut placer).unwrap();
            black_box(placer.into_buffer());
        })
    });
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
