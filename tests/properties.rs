//! Property-based tests for point and constraint insertion.
//!
//! Every test checks the structural invariants of the mesh (adjacency
//! symmetry, orientation, area of the enclosing rectangle), plus:
//! - the empty circle property with the exact incircle predicate
//! - idempotence of duplicate insertions
//! - persistence of constraints once inserted, also through nearly
//!   cocircular points
//! - the constrained empty circle property around a star polygon
//! - termination and correctness of point location

mod common;

use cdt2d::{CdtError, Geometry, HPoint, IncircleStrategy, Sign};
use common::{assert_constraint_chain, constrained_edges, inside_area, new_cdt, validate};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// =============================================================================
// STRATEGIES
// =============================================================================

/// Points strictly inside the square `[0, size]²`.
fn points(size: i64, max_len: usize) -> impl Strategy<Value = Vec<(i64, i64)>> {
    prop::collection::vec((1..size, 1..size), 1..max_len)
}

/// Points on or next to the diagonal of `[0, 100]²`.
fn near_diagonal() -> impl Strategy<Value = Vec<(i64, i64)>> {
    prop::collection::vec((1i64..98, -1i64..=1).prop_map(|(x, d)| (x, x + d)), 1..100)
}

/// Integer point at `radius` from `(CENTER, CENTER)` in direction `degrees`.
fn polar(degrees: f64, radius: f64) -> (i64, i64) {
    let angle = degrees.to_radians();
    (
        CENTER + (radius * angle.cos()).round() as i64,
        CENTER + (radius * angle.sin()).round() as i64,
    )
}

const CENTER: i64 = 2048;

/// Points rounded from circles of radius 999 to 1001, along with their
/// reflections around the center, so that many quadruples are exactly
/// cocircular and the others nearly are.
fn near_circle() -> impl Strategy<Value = Vec<(i64, i64)>> {
    prop::collection::vec((0u32..900, -1i32..=1), 1..16).prop_map(|samples| {
        let mut points = Vec::new();
        for (tenths, dr) in samples {
            let (x, y) = polar(f64::from(tenths) / 10.0, 1000.0 + f64::from(dr));
            let (dx, dy) = (x - CENTER, y - CENTER);
            for (sx, sy) in [(1, 1), (-1, 1), (-1, -1), (1, -1)] {
                points.push((CENTER + sx * dx, CENTER + sy * dy));
            }
        }
        points
    })
}

/// Vertices of a polygon that is star-shaped around the center, in
/// counter-clockwise order. Each octant holds one to three vertices at whole
/// degrees, so consecutive vertices are less than 90 degrees apart.
fn star() -> impl Strategy<Value = Vec<(i64, i64)>> {
    let octant = (
        prop::sample::subsequence((0..45).collect::<Vec<u32>>(), 1..4),
        prop::collection::vec(100u32..1000, 3),
    );
    prop::collection::vec(octant, 8).prop_map(|octants| {
        let mut points = Vec::new();
        for (k, (degrees, radii)) in (0u32..).zip(octants) {
            for (degree, radius) in degrees.into_iter().zip(radii) {
                points.push(polar(f64::from(45 * k + degree), f64::from(radius)));
            }
        }
        points
    })
}

fn polygon_area(points: &[(i64, i64)]) -> f64 {
    let twice: i64 = (0..points.len())
        .map(|i| {
            let ((x1, y1), (x2, y2)) = (points[i], points[(i + 1) % points.len()]);
            x1 * y2 - x2 * y1
        })
        .sum();
    twice.abs() as f64 / 2.0
}

// =============================================================================
// POINT INSERTION
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: random points give a valid Delaunay triangulation.
    #[test]
    fn prop_points_are_delaunay(points in points(1000, 200), seed in any::<u64>()) {
        let mut cdt = new_cdt(IncircleStrategy::Exact, seed);
        cdt.create_enclosing_rectangle(0, 0, 1000, 1000).unwrap();
        for (x, y) in points {
            cdt.insert(HPoint::new(x, y)).unwrap();
        }
        validate(&cdt, 1e6);
        // Euler: 2 triangles for the rectangle, 2 more per inner vertex.
        prop_assert_eq!(cdt.nt(), 2 + 2 * (cdt.nv() - 4));
    }

    /// Property: inserting the same points again changes nothing.
    #[test]
    fn prop_duplicates_are_idempotent(points in points(1000, 100), seed in any::<u64>()) {
        let mut cdt = new_cdt(IncircleStrategy::Exact, seed);
        cdt.create_enclosing_rectangle(0, 0, 1000, 1000).unwrap();
        let first: Vec<usize> = points
            .iter()
            .map(|&(x, y)| cdt.insert(HPoint::new(x, y)).unwrap())
            .collect();
        let (nv, nt) = (cdt.nv(), cdt.nt());

        for (&(x, y), &v) in points.iter().zip(&first) {
            prop_assert_eq!(cdt.insert(HPoint::homogeneous(3 * x, 3 * y, 3)).unwrap(), v);
        }
        prop_assert_eq!((cdt.nv(), cdt.nt()), (nv, nt));
        prop_assert_eq!(cdt.geometry().len(), nv);
        validate(&cdt, 1e6);
    }

    /// Property: nearly collinear points are handled exactly.
    #[test]
    fn prop_near_collinear(points in near_diagonal(), seed in any::<u64>()) {
        let mut cdt = new_cdt(IncircleStrategy::Exact, seed);
        cdt.create_enclosing_rectangle(0, 0, 100, 100).unwrap();
        let vertices = cdt.insert_vertices(points.into_iter().map(HPoint::from)).unwrap();
        validate(&cdt, 10000.0);
        for v in vertices {
            prop_assert!(v < cdt.nv());
        }
    }
}

// =============================================================================
// CONSTRAINT INSERTION
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Property: once inserted, a constraint stays in the mesh as a chain of
    /// constrained edges, even when later constraints cross it.
    #[test]
    fn prop_constraints_persist(
        points in points(4096, 40),
        pairs in prop::collection::vec((any::<prop::sample::Index>(), any::<prop::sample::Index>()), 1..12),
        seed in any::<u64>(),
    ) {
        let mut cdt = new_cdt(IncircleStrategy::Approximate, seed);
        cdt.create_enclosing_rectangle(0, 0, 4096, 4096).unwrap();
        let vertices: Vec<usize> = points
            .into_iter()
            .map(|(x, y)| cdt.insert(HPoint::new(x, y)).unwrap())
            .collect();

        // Intersections of segments between 12-bit points always fit.
        let mut inserted = Vec::new();
        for (i, j) in pairs {
            let (a, b) = (*i.get(&vertices), *j.get(&vertices));
            if a == b {
                continue;
            }
            if let Err(e) = cdt.insert_constraint(a, b) {
                prop_assert!(false, "constraint {}-{} failed: {}", a, b, e);
            }
            inserted.push((a, b));
        }

        validate(&cdt, 4096.0 * 4096.0);
        prop_assert_eq!(cdt.ncnstr(), inserted.len());
        for &(a, b) in &inserted {
            assert_constraint_chain(&cdt, a, b);
        }
        for (&(v1, v2), _) in constrained_edges(&cdt).iter() {
            prop_assert!(cdt.constraint_count(v1, v2) >= 1);
        }
    }

    /// Property: chords between nearly cocircular points, crossing each
    /// other, are inserted without error and flips terminate, even with the
    /// approximate incircle predicate on intersection points.
    #[test]
    fn prop_cocircular_crossing_chords(
        points in near_circle(),
        pairs in prop::collection::vec((any::<prop::sample::Index>(), any::<prop::sample::Index>()), 1..16),
        seed in any::<u64>(),
    ) {
        let mut cdt = new_cdt(IncircleStrategy::Approximate, seed);
        cdt.create_enclosing_rectangle(0, 0, 2 * CENTER, 2 * CENTER).unwrap();
        let vertices: Vec<usize> = points
            .into_iter()
            .map(|(x, y)| cdt.insert(HPoint::new(x, y)).unwrap())
            .collect();
        validate(&cdt, (4 * CENTER * CENTER) as f64);

        let mut inserted = Vec::new();
        for (i, j) in pairs {
            let (a, b) = (*i.get(&vertices), *j.get(&vertices));
            if a == b {
                continue;
            }
            if let Err(e) = cdt.insert_constraint(a, b) {
                prop_assert!(false, "constraint {}-{} failed: {}", a, b, e);
            }
            inserted.push((a, b));
        }

        validate(&cdt, (4 * CENTER * CENTER) as f64);
        prop_assert_eq!(cdt.ncnstr(), inserted.len());
        for &(a, b) in &inserted {
            assert_constraint_chain(&cdt, a, b);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: the boundary of a star polygon becomes constrained edges
    /// without new vertices, every other edge satisfies the empty circle
    /// property, and the polygon is classified as inside.
    #[test]
    fn prop_star_polygon_is_constrained_delaunay(points in star(), seed in any::<u64>()) {
        let mut cdt = new_cdt(IncircleStrategy::Exact, seed);
        cdt.create_enclosing_rectangle(0, 0, 2 * CENTER, 2 * CENTER).unwrap();
        let vertices: Vec<usize> = points
            .iter()
            .map(|&(x, y)| cdt.insert(HPoint::new(x, y)).unwrap())
            .collect();
        for (i, &v) in vertices.iter().enumerate() {
            cdt.insert_constraint(v, vertices[(i + 1) % vertices.len()]).unwrap();
        }

        prop_assert_eq!(cdt.nv(), 4 + points.len());
        prop_assert_eq!(constrained_edges(&cdt).len(), points.len());
        // Under the exact strategy this also checks the empty circle
        // property of every unconstrained edge.
        validate(&cdt, (4 * CENTER * CENTER) as f64);

        cdt.classify_triangles();
        let expected = polygon_area(&points);
        prop_assert!((inside_area(&cdt) - expected).abs() <= 1e-9 * expected);
    }
}

// =============================================================================
// POINT LOCATION
// =============================================================================

#[test]
fn locate_random_points() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut cdt = new_cdt(IncircleStrategy::Approximate, 7);
    cdt.create_enclosing_rectangle(0, 0, 10000, 10000).unwrap();
    for _ in 0..300 {
        let point = HPoint::new(rng.gen_range(1..10000), rng.gen_range(1..10000));
        cdt.insert(point).unwrap();
    }

    for _ in 0..1000 {
        // Rectangle borders included.
        let point = HPoint::new(rng.gen_range(0..=10000), rng.gen_range(0..=10000));
        let v = cdt.add_point(point).unwrap();
        let (t, signs) = cdt.locate(v, cdt.vertex_triangle(0)).unwrap();
        for le in 0..3 {
            let mut corners = cdt.mesh().vertices(t);
            corners[le] = v;
            let sign = cdt.geometry().orient2d(corners[0], corners[1], corners[2]) * cdt.orientation();
            assert_ne!(sign, Sign::Negative, "vertex {} is outside of triangle {}", v, t);
            assert_eq!(sign, signs[le]);
        }
    }

    let outside = cdt.add_point(HPoint::new(-1, 5000)).unwrap();
    assert_eq!(cdt.locate(outside, 0), Err(CdtError::OutsideDomain));
}
