#![allow(dead_code)]

use std::collections::HashMap;
use std::fs::File;

use cdt2d::{Cdt, CdtConfig, Geometry, HPoint, IncircleStrategy, IntegerGeometry, Sign, NONE};

pub struct Fixture {
    pub cdt: Cdt<IntegerGeometry>,
    /// Vertices of each polyline, degenerate ones included.
    pub polylines: Vec<Vec<usize>>,
    pub inside_area: Option<f64>,
}

pub fn new_cdt(strategy: IncircleStrategy, seed: u64) -> Cdt<IntegerGeometry> {
    let config = CdtConfig {
        seed: Some(seed),
        ..CdtConfig::default()
    };
    Cdt::with_config(IntegerGeometry::with_strategy(strategy), config)
}

/// Triangulates the polylines of a fixture file, skipping the degenerate
/// ones.
pub fn load_fixture(path: &str) -> Fixture {
    let file = File::open(path).unwrap();
    let value: serde_json::Value = serde_json::from_reader(file).unwrap();
    let rectangle: Vec<i64> = value["rectangle"].as_array().unwrap().iter().map(|c| c.as_i64().unwrap()).collect();

    let mut cdt = new_cdt(IncircleStrategy::Approximate, 42);
    cdt.create_enclosing_rectangle(rectangle[0], rectangle[1], rectangle[2], rectangle[3])
        .unwrap();

    let mut polylines = Vec::new();
    for polyline in value["polylines"].as_array().unwrap() {
        let vertices: Vec<usize> = polyline
            .as_array()
            .unwrap()
            .iter()
            .map(|p| {
                let point = HPoint::new(p[0].as_i64().unwrap(), p[1].as_i64().unwrap());
                cdt.insert(point).unwrap()
            })
            .collect();
        if !cdt.constraint_is_degenerate(&vertices) {
            for w in vertices.windows(2) {
                if w[0] != w[1] {
                    cdt.insert_constraint(w[0], w[1]).unwrap();
                }
            }
        }
        polylines.push(vertices);
    }

    Fixture {
        cdt,
        polylines,
        inside_area: value["inside_area"].as_f64(),
    }
}

/// Checks adjacency symmetry, orientation and that the triangles exactly
/// cover the enclosing polygon.
pub fn validate<G: Geometry>(cdt: &Cdt<G>, enclosing_area: f64) {
    for t in 0..cdt.nt() {
        for le in 0..3 {
            let t2 = cdt.adjacent(t, le);
            if t2 != NONE && !(0..3).any(|le2| cdt.adjacent(t2, le2) == t) {
                panic!("Invalid adjacency {}-{}", t, t2);
            }
        }
    }
    cdt.check_consistency();

    let areas: Vec<f64> = (0..cdt.nt()).map(|t| triangle_area(cdt, t)).collect();
    let err = ((sum(&areas) - enclosing_area) / enclosing_area).abs();
    if err > 1e-9 {
        panic!("Triangulation is broken: {} error", err);
    }
}

pub fn triangle_area<G: Geometry>(cdt: &Cdt<G>, t: usize) -> f64 {
    let [a, b, c] = [0, 1, 2].map(|lv| cdt.geometry().coordinates(cdt.vertex(t, lv)));
    ((b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])).abs() / 2.0
}

pub fn inside_area<G: Geometry>(cdt: &Cdt<G>) -> f64 {
    let areas: Vec<f64> = (0..cdt.nt())
        .filter(|&t| cdt.is_inside(t))
        .map(|t| triangle_area(cdt, t))
        .collect();
    sum(&areas)
}

/// Constrained edges, as undirected vertex pairs, with their tags.
pub fn constrained_edges<G: Geometry>(cdt: &Cdt<G>) -> HashMap<(usize, usize), usize> {
    let mut result = HashMap::new();
    for t in 0..cdt.nt() {
        for le in 0..3 {
            if let Some(c) = cdt.edge_constraint(t, le) {
                let v1 = cdt.vertex(t, (le + 1) % 3);
                let v2 = cdt.vertex(t, (le + 2) % 3);
                result.insert((v1.min(v2), v1.max(v2)), c);
            }
        }
    }
    result
}

/// Checks that a chain of constrained edges goes from `i` to `j` along the
/// segment `[i, j]`.
pub fn assert_constraint_chain<G: Geometry>(cdt: &Cdt<G>, i: usize, j: usize) {
    let edges = constrained_edges(cdt);
    let g = cdt.geometry();
    let dist2 = |a: usize, b: usize| {
        let [pa, pb] = [g.coordinates(a), g.coordinates(b)];
        (pa[0] - pb[0]).powi(2) + (pa[1] - pb[1]).powi(2)
    };
    let mut current = i;
    let mut steps = 0;
    while current != j {
        let next = edges
            .keys()
            .filter_map(|&(a, b)| match (a == current, b == current) {
                (true, _) => Some(b),
                (_, true) => Some(a),
                _ => None,
            })
            .filter(|&w| g.orient2d(i, j, w) == Sign::Zero && dist2(w, j) < dist2(current, j))
            .min_by(|&a, &b| dist2(a, j).total_cmp(&dist2(b, j)));
        current = next.unwrap_or_else(|| panic!("constraint {}-{} is broken at vertex {}", i, j, current));
        steps += 1;
        assert!(steps <= cdt.nv());
    }
}

// Kahan and Babuska summation, Neumaier variant; accumulates less FP error
pub fn sum(x: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut err: f64 = 0.0;
    for &k in x {
        let m = sum + k;
        err += if f64::abs(sum) >= k.abs() {
            sum - m + k
        } else {
            k - m + sum
        };
        sum = m;
    }
    sum + err
}
