//! Even/odd classification of the triangles and extraction of convex
//! polygons.
//!
//! An edge bounds the region when it was tagged by an odd number of
//! constraints, so that overlapping constraints cancel out. Triangles
//! touching the border of the enclosing polygon are outside.

use std::collections::VecDeque;

use crate::cdt::Cdt;
use crate::dlist::{DList, ListId};
use crate::geometry::{Geometry, Sign};
use crate::mesh::TriangleFlag;
use crate::NONE;

/// Maximum number of vertices of a polygon built by [`Cdt::convex_polygon`].
pub const MAX_POLYGON_VERTICES: usize = 15;

/// A convex polygon made of triangles of the same region.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Polygon {
    pub inside: bool,
    /// Vertices, oriented like the triangles.
    pub vertices: Vec<usize>,
}

impl<G: Geometry> Cdt<G> {
    /// Whether edge `le` of `t` separates the inside from the outside.
    pub fn is_region_boundary(&self, t: usize, le: usize) -> bool {
        if !self.mesh.is_constrained(t, le) {
            return false;
        }
        let v1 = self.mesh.vertex(t, (le + 1) % 3);
        let v2 = self.mesh.vertex(t, (le + 2) % 3);
        self.constraint_count(v1, v2) % 2 == 1
    }

    /// Sets [`TriangleFlag::Region`] on the triangles inside the region.
    pub fn classify_triangles(&mut self) {
        let nt = self.mesh.nt();
        let mut inside: Vec<Option<bool>> = vec![None; nt];
        let mut queue = VecDeque::new();
        for t in 0..nt {
            if (0..3).any(|le| self.mesh.adjacent(t, le) == NONE) {
                inside[t] = Some(false);
                queue.push_back(t);
            }
        }
        while let Some(t) = queue.pop_front() {
            let region = inside[t].unwrap_or(false);
            for le in 0..3 {
                let t2 = self.mesh.adjacent(t, le);
                if t2 == NONE || inside[t2].is_some() {
                    continue;
                }
                inside[t2] = Some(region ^ self.is_region_boundary(t, le));
                queue.push_back(t2);
            }
        }
        for (t, inside) in inside.into_iter().enumerate() {
            if inside == Some(true) {
                self.mesh.set_triangle_flag(t, TriangleFlag::Region);
            } else {
                self.mesh.reset_triangle_flag(t, TriangleFlag::Region);
            }
        }
    }

    /// Whether `t` was classified inside by [`Cdt::classify_triangles`].
    pub fn is_inside(&self, t: usize) -> bool {
        self.mesh.flag(t, TriangleFlag::Region)
    }

    /// Classifies the triangles and removes the ones outside of the region.
    pub fn remove_external_triangles(&mut self) {
        self.classify_triangles();
        for t in 0..self.mesh.nt() {
            if self.is_inside(t) {
                self.mesh.reset_triangle_flag(t, TriangleFlag::Marked);
            } else {
                self.mesh.set_triangle_flag(t, TriangleFlag::Marked);
            }
        }
        self.mesh.remove_marked();
    }

    /// Greedily merges `t` with the unmarked neighbors of the same region
    /// while the result stays convex and has at most
    /// [`MAX_POLYGON_VERTICES`] vertices. The merged triangles, `t`
    /// included, are flagged [`TriangleFlag::Marked`].
    pub fn convex_polygon(&mut self, t: usize, polygon: &mut Vec<usize>) {
        polygon.clear();
        polygon.extend_from_slice(&self.mesh.vertices(t));
        let mut s = DList::new(ListId::S);
        self.mesh.set_triangle_flag(t, TriangleFlag::Marked);
        s.push_back(&mut self.mesh, t);

        while polygon.len() < MAX_POLYGON_VERTICES {
            let Some(t1) = s.pop_front(&mut self.mesh) else {
                break;
            };
            for le1 in 0..3 {
                if polygon.len() >= MAX_POLYGON_VERTICES {
                    break;
                }
                let t2 = self.mesh.adjacent(t1, le1);
                if t2 == NONE || self.mesh.flag(t2, TriangleFlag::Marked) || self.is_inside(t1) != self.is_inside(t2) {
                    continue;
                }
                let v1 = self.mesh.vertex(t1, (le1 + 1) % 3);
                let v2 = self.mesh.vertex(t1, (le1 + 2) % 3);
                let v3 = self.mesh.vertex(t2, self.mesh.find_adjacent(t2, t1));

                // [v1, v2] is on the border of the polygon since t2 is not in
                // it yet.
                let len = polygon.len();
                let Some(i1) = polygon.iter().position(|&v| v == v1) else {
                    continue;
                };
                let i2 = (i1 + 1) % len;
                debug_assert_eq!(polygon[i2], v2);
                let before = polygon[(i1 + len - 1) % len];
                let after = polygon[(i2 + 1) % len];
                let convex = |a, b, c| self.geometry.orient2d(a, b, c) * self.orientation != Sign::Negative;
                if convex(before, v1, v3) && convex(v3, v2, after) {
                    self.mesh.set_triangle_flag(t2, TriangleFlag::Marked);
                    s.push_back(&mut self.mesh, t2);
                    polygon.insert(i2, v3);
                }
            }
        }
        s.clear(&mut self.mesh);
    }

    /// Covers the whole mesh with convex polygons, see
    /// [`Cdt::convex_polygon`]. Call [`Cdt::classify_triangles`] first.
    pub fn polygons(&mut self) -> Vec<Polygon> {
        for t in 0..self.mesh.nt() {
            self.mesh.reset_triangle_flag(t, TriangleFlag::Marked);
        }
        let mut result = Vec::new();
        let mut vertices = Vec::with_capacity(MAX_POLYGON_VERTICES);
        for t in 0..self.mesh.nt() {
            if self.mesh.flag(t, TriangleFlag::Marked) {
                continue;
            }
            self.convex_polygon(t, &mut vertices);
            result.push(Polygon {
                inside: self.is_inside(t),
                vertices: vertices.clone(),
            });
        }
        for t in 0..self.mesh.nt() {
            self.mesh.reset_triangle_flag(t, TriangleFlag::Marked);
        }
        result
    }
}
