use std::iter::repeat_with;

use cdt2d::{Cdt, Geometry, HPoint};
use rand::Rng;

const N: usize = 1_000_000;
const SIZE: i64 = 1 << 24;

/// Set `RUST_LOG=cdt2d=debug` to trace constraint insertion.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut rng = rand::thread_rng();
    let points: Vec<_> = repeat_with(|| HPoint::new(rng.gen_range(1..SIZE), rng.gen_range(1..SIZE)))
        .take(N)
        .collect();

    let mut cdt = Cdt::default();
    cdt.create_enclosing_rectangle(0, 0, SIZE, SIZE)?;

    let now = std::time::Instant::now();
    let vertices = cdt.insert_vertices(points)?;
    let elapsed = now.elapsed();
    println!(
        "Triangulated {} points in {}.{:03}s.\nGenerated {} triangles.",
        N,
        elapsed.as_secs(),
        elapsed.subsec_millis(),
        cdt.nt()
    );

    // A star-shaped polygon through the first points, sorted by angle
    // around the center so that its edges never cross.
    let now = std::time::Instant::now();
    let center = (SIZE / 2) as f64;
    let angle = |v: usize| {
        let [x, y] = cdt.geometry().coordinates(v);
        (y - center).atan2(x - center)
    };
    let mut polyline = vertices[..1000].to_vec();
    polyline.sort_by(|&a, &b| angle(a).total_cmp(&angle(b)));
    polyline.dedup();
    for (i, &v) in polyline.iter().enumerate() {
        let w = polyline[(i + 1) % polyline.len()];
        if v != w {
            cdt.insert_constraint(v, w)?;
        }
    }
    cdt.classify_triangles();
    let elapsed = now.elapsed();
    let inside = (0..cdt.nt()).filter(|&t| cdt.is_inside(t)).count();
    println!(
        "Inserted {} constraints in {}.{:03}s.\n{} vertices, {} of {} triangles inside.",
        cdt.ncnstr(),
        elapsed.as_secs(),
        elapsed.subsec_millis(),
        cdt.nv(),
        inside,
        cdt.nt()
    );
    Ok(())
}
