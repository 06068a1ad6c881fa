//! Benchmarks for deck rendering

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use deck_service::dialects::{render_deck, DeckOptions, DialectKind};
use fea_model::prelude::*;

/// `nx × ny` grid extruded `nz` layers into hexahedra, corner columns pinned
fn create_deep_beam(nx: usize, ny: usize, nz: usize) -> Structure {
    let mut s = Structure::new("deep_beam", std::env::temp_dir());
    let node = |i: usize, j: usize, k: usize| k * (nx + 1) * (ny + 1) + j * (nx + 1) + i;

    for k in 0..=nz {
        for j in 0..=ny {
            for i in 0..=nx {
                s.add_node([i as f64 * 0.1, j as f64 * 0.1, k as f64 * 0.1]).unwrap();
            }
        }
    }
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                let nodes = vec![
                    node(i, j, k),
                    node(i + 1, j, k),
                    node(i + 1, j + 1, k),
                    node(i, j + 1, k),
                    node(i, j, k + 1),
                    node(i + 1, j, k + 1),
                    node(i + 1, j + 1, k + 1),
                    node(i, j + 1, k + 1),
                ];
                s.add_element(ElementType::Hexahedron, nodes).unwrap();
            }
        }
    }

    let columns: Vec<usize> = (0..=nz)
        .flat_map(|k| [(0, 0), (nx, 0), (nx, ny), (0, ny)].map(|(i, j)| node(i, j, k)))
        .collect();
    s.add(vec![
        Material::elastic_isotropic("concrete", 30e9, 0.2, 2400.0).into(),
        Section::solid("solid").into(),
        ElementProperties::new("ep", "concrete", "solid", "elset_all").into(),
        Set::nodes("columns", columns).into(),
        Displacement::pinned("pinned", "columns").into(),
        Load::point("push", vec![node(nx / 2, ny / 2, nz)], Dofs::xyz(0.0, 0.0, -1.0e5)).into(),
        Step::general("load", &["pinned"], &["push"]).into(),
    ])
    .unwrap();
    s
}

fn benchmark_extrusion(c: &mut Criterion) {
    let small = create_deep_beam(10, 20, 10);
    let full = create_deep_beam(20, 40, 20);
    let options = DeckOptions::default();

    c.bench_function("build_deep_beam_20x40x20", |b| {
        b.iter(|| create_deep_beam(black_box(20), black_box(40), black_box(20)))
    });

    c.bench_function("resolve_deep_beam_20x40x20", |b| {
        b.iter(|| resolve(black_box(&full)).unwrap())
    });

    let mut group = c.benchmark_group("render_deep_beam");
    group.sample_size(10);
    for kind in DialectKind::ALL {
        group.bench_function(format!("{kind}_10x20x10"), |b| {
            b.iter(|| render_deck(black_box(&small), kind, &options).unwrap())
        });
        group.bench_function(format!("{kind}_20x40x20"), |b| {
            b.iter(|| render_deck(black_box(&full), kind, &options).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_extrusion);
criterion_main!(benches);
