//! Vertex insertion, edge flips and local Delaunay restoration.
//!
//! New triangles are always created with the new vertex as corner 0, so the
//! edge to examine for flipping is always edge 0.

use tracing::debug;

use crate::cdt::Cdt;
use crate::dlist::{DList, ListId};
use crate::error::CdtError;
use crate::geometry::{Geometry, Sign};
use crate::NONE;

impl<G: Geometry> Cdt<G> {
    /// Inserts vertex `v`, already stored with [`Cdt::add_point`], in the
    /// triangulation.
    ///
    /// If it coincides with an existing vertex, returns that vertex and `v`
    /// stays out of the mesh.
    pub fn insert_vertex(&mut self, v: usize, hint: usize) -> Result<usize, CdtError> {
        self.ensure_initialized()?;
        self.check_vertex(v)?;
        debug_assert_eq!(self.mesh.vertex_triangle(v), NONE, "vertex {v} is already inserted");

        let (t, signs) = self.walk(v, hint).ok_or(CdtError::OutsideDomain)?;
        let zeros = signs.iter().filter(|s| s.is_zero()).count();
        debug_assert!(zeros < 3);

        if zeros == 2 {
            let lv = signs.iter().position(|s| !s.is_zero()).unwrap_or(0);
            let existing = self.mesh.vertex(t, lv);
            debug!(vertex = v, existing, "duplicated vertex");
            return Ok(existing);
        }

        let mut s = self.delaunay.then(|| DList::new(ListId::S));
        if zeros == 1 {
            let le = signs.iter().position(|s| s.is_zero()).unwrap_or(0);
            self.insert_vertex_in_edge(v, t, le, s.as_mut());
        } else {
            self.insert_vertex_in_triangle(v, t, s.as_mut());
        }
        if let Some(s) = s.as_mut() {
            self.delaunayize_vertex_neighbors(v, s);
        }
        Ok(v)
    }

    /// Splits edge `le1` of `t` with `v`. The two (or one, on the border)
    /// triangles sharing the edge are replaced with four (or two) triangles.
    /// A constraint on the split edge carries over to both halves.
    pub(crate) fn insert_vertex_in_edge(&mut self, v: usize, t: usize, le1: usize, s: Option<&mut DList>) {
        let cnstr = self.mesh.edge_constraint(t, le1);
        let t1 = t;
        let t2 = self.mesh.adjacent(t1, le1);
        let v1 = self.mesh.vertex(t1, le1);
        let v2 = self.mesh.vertex(t1, (le1 + 1) % 3);
        let v3 = self.mesh.vertex(t1, (le1 + 2) % 3);
        let t1_adj2 = self.mesh.adjacent(t1, (le1 + 1) % 3);
        let t1_adj3 = self.mesh.adjacent(t1, (le1 + 2) % 3);
        let t1_cnstr2 = self.mesh.edge_constraint(t1, (le1 + 1) % 3);
        let t1_cnstr3 = self.mesh.edge_constraint(t1, (le1 + 2) % 3);

        if cnstr != NONE {
            self.split_parity(v2, v3, v);
        }

        if t2 != NONE {
            let le2 = self.mesh.find_adjacent(t2, t1);
            debug_assert_eq!(self.mesh.vertex(t2, (le2 + 1) % 3), v3);
            debug_assert_eq!(self.mesh.vertex(t2, (le2 + 2) % 3), v2);
            let v4 = self.mesh.vertex(t2, le2);
            let t2_adj2 = self.mesh.adjacent(t2, (le2 + 1) % 3);
            let t2_adj3 = self.mesh.adjacent(t2, (le2 + 2) % 3);
            let t2_cnstr2 = self.mesh.edge_constraint(t2, (le2 + 1) % 3);
            let t2_cnstr3 = self.mesh.edge_constraint(t2, (le2 + 2) % 3);
            let t3 = self.mesh.new_triangle();
            let t4 = self.mesh.new_triangle();
            self.set_triangle(t1, [v, v1, v2], [t1_adj3, t2, t4], [t1_cnstr3, cnstr, NONE]);
            self.set_triangle(t2, [v, v2, v4], [t2_adj2, t3, t1], [t2_cnstr2, NONE, cnstr]);
            self.set_triangle(t3, [v, v4, v3], [t2_adj3, t4, t2], [t2_cnstr3, cnstr, NONE]);
            self.set_triangle(t4, [v, v3, v1], [t1_adj2, t1, t3], [t1_cnstr2, NONE, cnstr]);
            self.mesh.back_connect(t1, 0, t1);
            self.mesh.back_connect(t2, 0, t2);
            self.mesh.back_connect(t3, 0, t2);
            self.mesh.back_connect(t4, 0, t1);
            if let Some(s) = s {
                for t in [t1, t2, t3, t4] {
                    s.push_back(&mut self.mesh, t);
                }
            }
        } else {
            let t2 = self.mesh.new_triangle();
            self.set_triangle(t1, [v, v1, v2], [t1_adj3, NONE, t2], [t1_cnstr3, cnstr, NONE]);
            self.set_triangle(t2, [v, v3, v1], [t1_adj2, t1, NONE], [t1_cnstr2, NONE, cnstr]);
            self.mesh.back_connect(t1, 0, t1);
            self.mesh.back_connect(t2, 0, t1);
            if let Some(s) = s {
                s.push_back(&mut self.mesh, t1);
                s.push_back(&mut self.mesh, t2);
            }
        }
    }

    /// Replaces `t` with three triangles fanning out from `v`.
    pub(crate) fn insert_vertex_in_triangle(&mut self, v: usize, t: usize, s: Option<&mut DList>) {
        let t1 = t;
        let [v1, v2, v3] = self.mesh.vertices(t1);
        let adj1 = self.mesh.adjacent(t1, 0);
        let adj2 = self.mesh.adjacent(t1, 1);
        let adj3 = self.mesh.adjacent(t1, 2);
        let [c1, c2, c3] = [0, 1, 2].map(|le| self.mesh.edge_constraint(t1, le));
        let t2 = self.mesh.new_triangle();
        let t3 = self.mesh.new_triangle();
        self.set_triangle(t1, [v, v2, v3], [adj1, t2, t3], [c1, NONE, NONE]);
        self.set_triangle(t2, [v, v3, v1], [adj2, t3, t1], [c2, NONE, NONE]);
        self.set_triangle(t3, [v, v1, v2], [adj3, t1, t2], [c3, NONE, NONE]);
        self.mesh.back_connect(t1, 0, t1);
        self.mesh.back_connect(t2, 0, t1);
        self.mesh.back_connect(t3, 0, t1);
        if let Some(s) = s {
            for t in [t1, t2, t3] {
                s.push_back(&mut self.mesh, t);
            }
        }
    }

    /// Flips edge 0 of `t1`, shared with `t2 = adjacent(t1, 0)`.
    ///
    /// Both new triangles have corner 0 of `t1` as their corner 0. With
    /// `swap_roles == false`, the new `t1` is the one on the side of `t1`'s
    /// corner 2 and the new `t2` the one on the side of its corner 1; with
    /// `swap_roles == true` it is the other way round.
    pub(crate) fn swap_edge(&mut self, t1: usize, swap_roles: bool) {
        debug_assert!(!self.mesh.is_constrained(t1, 0));
        let [v1, v2, v3] = self.mesh.vertices(t1);
        let t1_adj2 = self.mesh.adjacent(t1, 1);
        let t1_adj3 = self.mesh.adjacent(t1, 2);
        let t2 = self.mesh.adjacent(t1, 0);
        let le2 = self.mesh.find_adjacent(t2, t1);
        let v4 = self.mesh.vertex(t2, le2);
        debug_assert_eq!(self.mesh.vertex(t2, (le2 + 1) % 3), v3);
        debug_assert_eq!(self.mesh.vertex(t2, (le2 + 2) % 3), v2);
        let t2_adj2 = self.mesh.adjacent(t2, (le2 + 1) % 3);
        let t2_adj3 = self.mesh.adjacent(t2, (le2 + 2) % 3);
        let t1_cnstr2 = self.mesh.edge_constraint(t1, 1);
        let t1_cnstr3 = self.mesh.edge_constraint(t1, 2);
        let t2_cnstr2 = self.mesh.edge_constraint(t2, (le2 + 1) % 3);
        let t2_cnstr3 = self.mesh.edge_constraint(t2, (le2 + 2) % 3);

        let (top, bottom) = if swap_roles { (t2, t1) } else { (t1, t2) };
        self.set_triangle(top, [v1, v4, v3], [t2_adj3, t1_adj2, bottom], [t2_cnstr3, t1_cnstr2, NONE]);
        self.set_triangle(bottom, [v1, v2, v4], [t2_adj2, top, t1_adj3], [t2_cnstr2, NONE, t1_cnstr3]);
        self.mesh.back_connect(top, 0, t2);
        self.mesh.back_connect(top, 1, t1);
        self.mesh.back_connect(bottom, 0, t2);
        self.mesh.back_connect(bottom, 2, t1);
    }

    /// Whether `t` and its neighbor across edge 0 form a strictly convex
    /// quad, that is, whether edge 0 can be flipped.
    pub(crate) fn is_convex_quad(&self, t: usize) -> bool {
        let [v1, v2, v3] = self.mesh.vertices(t);
        let t2 = self.mesh.adjacent(t, 0);
        debug_assert_ne!(t2, NONE);
        let v4 = self.mesh.vertex(t2, self.mesh.find_adjacent(t2, t));
        // Both triangles are correctly oriented, so only the two triangles
        // that a flip would create need checking.
        self.geometry.orient2d(v1, v4, v3) == self.orientation && self.geometry.orient2d(v4, v1, v2) == self.orientation
    }

    /// Whether edge 0 of `t1` should be flipped to restore the empty circle
    /// property. `v4` is the corner of the neighbor opposite to the edge.
    ///
    /// Both circles are tested: they always agree with an exact predicate,
    /// and requiring agreement keeps an approximate one from flipping back
    /// and forth.
    fn should_flip(&self, t1: usize, t2: usize, v4: usize) -> bool {
        if !self.geometry.is_incircle_exact() && !self.is_convex_quad(t1) {
            return false;
        }
        let [v0, v1, v2] = self.mesh.vertices(t1);
        let [w0, w1, w2] = self.mesh.vertices(t2);
        self.geometry.incircle(v0, v1, v2, v4) == Sign::Positive
            && self.geometry.incircle(w0, w1, w2, v0) == Sign::Positive
    }

    /// Flips edges until all the triangles of `s` (all having `v` as corner
    /// 0) satisfy the empty circle property across their edge 0.
    pub(crate) fn delaunayize_vertex_neighbors(&mut self, v: usize, s: &mut DList) {
        while let Some(t1) = s.pop_back(&mut self.mesh) {
            debug_assert_eq!(self.mesh.vertex(t1, 0), v);
            if self.mesh.is_constrained(t1, 0) {
                continue;
            }
            let t2 = self.mesh.adjacent(t1, 0);
            if t2 == NONE {
                continue;
            }
            let v4 = self.mesh.vertex(t2, self.mesh.find_adjacent(t2, t1));
            if self.should_flip(t1, t2, v4) {
                self.swap_edge(t1, false);
                s.push_back(&mut self.mesh, t1);
                s.push_back(&mut self.mesh, t2);
            }
        }
    }

    /// Flips the edges 0 of the triangles of `n` until none of them violates
    /// the empty circle property, then clears `n`.
    pub(crate) fn delaunayize_new_edges(&mut self, n: &mut DList) {
        let mut swapped = true;
        while swapped {
            swapped = false;
            let mut t1 = n.front();
            while t1 != NONE {
                if self.flip_new_edge(t1) {
                    swapped = true;
                }
                t1 = n.next(&self.mesh, t1);
            }
        }
        n.clear(&mut self.mesh);
    }

    fn flip_new_edge(&mut self, t1: usize) -> bool {
        if self.mesh.is_constrained(t1, 0) {
            return false;
        }
        let t2 = self.mesh.adjacent(t1, 0);
        if t2 == NONE {
            return false;
        }
        let v1 = self.mesh.vertex(t1, 1);
        let v4 = self.mesh.vertex(t2, self.mesh.find_adjacent(t2, t1));
        if !self.should_flip(t1, t2, v4) {
            return false;
        }
        // t2 may itself hold a new edge as edge 0: keep it there.
        if self.mesh.vertex(t2, 0) == v1 {
            self.swap_edge(t1, true);
            self.mesh.rotate(t1, 1);
        } else {
            self.swap_edge(t1, false);
            self.mesh.rotate(t1, 2);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::{Cdt, CdtConfig, HPoint, IncircleStrategy, IntegerGeometry, NONE};

    fn cdt(delaunay: bool) -> Cdt<IntegerGeometry> {
        let config = CdtConfig {
            delaunay,
            seed: Some(1),
        };
        let mut cdt = Cdt::with_config(IntegerGeometry::with_strategy(IncircleStrategy::Exact), config);
        cdt.create_enclosing_rectangle(0, 0, 100, 100).unwrap();
        cdt
    }

    #[test]
    fn split_triangle() {
        let mut cdt = cdt(false);
        let v = cdt.insert(HPoint::new(10, 20)).unwrap();
        assert_eq!(v, 4);
        assert_eq!(cdt.nt(), 4);
        cdt.check_consistency();
    }

    #[test]
    fn split_inner_and_border_edges() {
        let mut cdt = cdt(false);
        // On the diagonal, whichever diagonal the quad has.
        cdt.insert(HPoint::new(50, 50)).unwrap();
        assert_eq!(cdt.nt(), 4);
        cdt.insert(HPoint::new(50, 0)).unwrap();
        assert_eq!(cdt.nt(), 5);
        cdt.check_consistency();
        let border = (0..cdt.nt())
            .flat_map(|t| (0..3).map(move |le| (t, le)))
            .filter(|&(t, le)| cdt.adjacent(t, le) == NONE)
            .count();
        assert_eq!(border, 5);
    }

    #[test]
    fn flips_restore_delaunay() {
        let mut cdt = cdt(true);
        for (x, y) in [(50, 50), (51, 3), (97, 52), (49, 96), (4, 51), (30, 70)] {
            cdt.insert(HPoint::new(x, y)).unwrap();
            cdt.check_consistency();
        }
        assert_eq!(cdt.nv(), 10);
    }
}
