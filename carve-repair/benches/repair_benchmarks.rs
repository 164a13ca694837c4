//! Benchmarks for validation and repair of interactively mutated meshes.
//!
//! Run with: cargo bench -p carve-repair

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hashbrown::HashSet;

use carve_repair::{fix_mutated_mesh, is_valid_mesh, FixParams};
use carve_types::{FaceProperties, Mesh, MeshId, Point3, Vector3, VertexId};

/// Build a flat sheet of `n` x `n` quads in the XY plane.
fn quad_sheet(n: usize) -> Mesh {
    let mut mesh = Mesh::new(MeshId(0));
    let mut op = mesh.start_operation();

    let mut grid = vec![vec![VertexId(0); n + 1]; n + 1];
    for (i, row) in grid.iter_mut().enumerate() {
        for (j, slot) in row.iter_mut().enumerate() {
            let v = op.add_vertex_in_mesh_space(Point3::new(i as f64, j as f64, 0.0));
            *slot = v.id;
        }
    }
    for i in 0..n {
        for j in 0..n {
            op.add_face(
                &[
                    grid[i][j],
                    grid[i + 1][j],
                    grid[i + 1][j + 1],
                    grid[i][j + 1],
                ],
                FaceProperties::default(),
            )
            .expect("sheet face");
        }
    }
    op.commit();
    mesh
}

/// Displace every fourth vertex out of plane, returning the moved set.
fn perturb(mesh: &mut Mesh) -> HashSet<VertexId> {
    let targets: Vec<VertexId> = mesh
        .vertices()
        .filter(|v| v.id.0 % 4 == 0)
        .map(|v| v.id)
        .collect();
    let mut op = mesh.start_operation();
    for &id in &targets {
        let p = op.vertex_position(id).expect("vertex");
        op.modify_vertex(id, p + Vector3::new(0.0, 0.0, 0.2))
            .expect("move vertex");
    }
    op.commit();
    targets.into_iter().collect()
}

fn bench_validation(c: &mut Criterion) {
    let clean = quad_sheet(20);
    let mut bent = clean.clone();
    let moved = perturb(&mut bent);

    c.bench_function("validate_clean_sheet", |b| {
        b.iter(|| is_valid_mesh(black_box(&clean), None));
    });

    c.bench_function("validate_bent_sheet_scoped", |b| {
        b.iter(|| is_valid_mesh(black_box(&bent), Some(&moved)));
    });
}

fn bench_fix(c: &mut Criterion) {
    let original = quad_sheet(20);
    let mut bent = original.clone();
    let moved = perturb(&mut bent);
    let params = FixParams::default();

    c.bench_function("fix_bent_sheet", |b| {
        b.iter_batched(
            || bent.clone(),
            |mut mesh| fix_mutated_mesh(&original, &mut mesh, &moved, &params),
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_validation, bench_fix);
criterion_main!(benches);
