//! Constraint insertion.
//!
//! Inserting the constraint `[i, j]` repeats three steps until `j` is
//! reached:
//! 1. walk along `[i, j]` from `i`, queuing the triangles whose edge 0
//!    crosses it, and stop at the first vertex `k` lying on it (an existing
//!    vertex, `j`, or the intersection with another constraint, which is
//!    inserted on the fly),
//! 2. flip the queued edges until `[i, k]` is an edge of the mesh,
//! 3. restore the empty circle property on the edges created by the flips.
//!
//! Step 2 uses a variation of Sloan's method. After a flip, the new diagonal
//! either still crosses the constraint (and goes back to the queue) or does
//! not. Which one is deduced from the triangles already in the queue and a
//! single orientation test, instead of a segment intersection test.

use tracing::{debug, trace};

use crate::cdt::Cdt;
use crate::dlist::{DList, ListId};
use crate::error::CdtError;
use crate::geometry::{Geometry, Segment, Sign};
use crate::NONE;

/// Where the walk along a constraint currently stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    /// On a vertex lying on the constraint.
    Vertex(usize),
    /// In a triangle whose edge 0 crosses the constraint, about to cross it.
    Triangle(usize),
}

/// State of the walk along `[i, j]`, see [`Cdt::find_intersected_edges`].
#[derive(Debug)]
struct Walker {
    i: usize,
    j: usize,
    /// Previous positions, to never walk backwards.
    previous_triangle: usize,
    previous_vertex: usize,
    at: Step,
}

impl Walker {
    fn new(i: usize, j: usize) -> Self {
        Self {
            i,
            j,
            previous_triangle: NONE,
            previous_vertex: NONE,
            at: Step::Vertex(i),
        }
    }

    fn advance(&mut self, next: Step) {
        (self.previous_triangle, self.previous_vertex) = match self.at {
            Step::Vertex(v) => (NONE, v),
            Step::Triangle(t) => (t, NONE),
        };
        self.at = next;
    }
}

/// What [`Cdt::walk_from_vertex`] found around a vertex.
enum Exit {
    /// Edge `le` of the triangle crosses the constraint.
    Crossing { t: usize, le: usize },
    /// Edge `le` of the triangle lies on the constraint and ends at `v`.
    Embedded { t: usize, le: usize, v: usize },
}

impl<G: Geometry> Cdt<G> {
    /// Inserts a constraint between vertices `i` and `j`.
    ///
    /// The constraint is split where it passes exactly through a vertex, and
    /// where it crosses a previously inserted constraint, at a new vertex.
    ///
    /// If the intersection with another constraint cannot be represented,
    /// returns [`CdtError::CoordinateOverflow`]. The mesh is then valid, with
    /// the constraint partially inserted.
    pub fn insert_constraint(&mut self, i: usize, j: usize) -> Result<(), CdtError> {
        self.ensure_initialized()?;
        self.check_vertex(i)?;
        self.check_vertex(j)?;
        if i == j || self.mesh.vertex_triangle(i) == NONE || self.mesh.vertex_triangle(j) == NONE {
            return Err(CdtError::InvalidConstraint { from: i, to: j });
        }

        debug!(id = self.constraints.len(), i, j, "insert constraint");
        self.constraints.push((i, j));
        let first_intersection = self.mesh.nv();

        let mut q = DList::new(ListId::Q);
        let mut n = self.delaunay.then(|| DList::new(ListId::N));
        let mut from = i;
        while from != j {
            let k = match self.find_intersected_edges(from, j, &mut q) {
                Ok(k) => k,
                Err(error) => {
                    q.clear(&mut self.mesh);
                    return Err(error);
                }
            };
            trace!(from, to = k, crossed = q.len(&self.mesh), "flip crossed edges");
            self.constrain_edges(from, k, &mut q, n.as_mut());
            if let Some(n) = n.as_mut() {
                self.delaunayize_new_edges(n);
            }
            from = k;
        }

        if self.delaunay {
            self.delaunayize_intersections(first_intersection);
        }
        Ok(())
    }

    /// Restores the empty circle property around the vertices created at
    /// constraint intersections.
    ///
    /// Such vertices are never on the border, so their fan is a closed loop
    /// that can be walked while rotating each triangle to have the vertex as
    /// corner 0.
    fn delaunayize_intersections(&mut self, first: usize) {
        let mut s = DList::new(ListId::S);
        for v in first..self.mesh.nv() {
            let t0 = self.mesh.vertex_triangle(v);
            let mut t = t0;
            loop {
                let lv = self.mesh.find_vertex(t, v);
                self.mesh.rotate(t, lv);
                s.push_back(&mut self.mesh, t);
                t = self.mesh.adjacent(t, 1);
                assert_ne!(t, NONE, "intersection vertex {v} is on the border");
                if t == t0 {
                    break;
                }
            }
            self.delaunayize_vertex_neighbors(v, &mut s);
        }
    }

    /// Tags edge `le` of `t`, and the same edge in the neighbor, with
    /// constraint `c`, and counts the tag for even/odd classification.
    pub(crate) fn set_edge_constraint_with_neighbor(&mut self, t: usize, le: usize, c: usize) {
        self.mesh.set_edge_constraint(t, le, c);
        let t2 = self.mesh.adjacent(t, le);
        if t2 != NONE {
            let le2 = self.mesh.find_adjacent(t2, t);
            self.mesh.set_edge_constraint(t2, le2, c);
        }
        let v1 = self.mesh.vertex(t, (le + 1) % 3);
        let v2 = self.mesh.vertex(t, (le + 2) % 3);
        *self.parity.entry(edge_key(v1, v2)).or_insert(0) += 1;
    }

    /// Moves the tag count of the constrained edge `[v1, v2]` to its two
    /// halves when `v` splits it.
    pub(crate) fn split_parity(&mut self, v1: usize, v2: usize, v: usize) {
        if let Some(count) = self.parity.remove(&edge_key(v1, v2)) {
            *self.parity.entry(edge_key(v1, v)).or_insert(0) += count;
            *self.parity.entry(edge_key(v, v2)).or_insert(0) += count;
        }
    }

    /// Number of times the edge `[v1, v2]` was tagged by a constraint.
    pub fn constraint_count(&self, v1: usize, v2: usize) -> usize {
        self.parity.get(&edge_key(v1, v2)).copied().unwrap_or(0)
    }

    /// Walks from `i` toward `j`, pushes the triangles whose edge 0 crosses
    /// `[i, j]` on `q` in order, and returns the first vertex reached on the
    /// segment.
    fn find_intersected_edges(&mut self, i: usize, j: usize, q: &mut DList) -> Result<usize, CdtError> {
        trace!(i, j, "find intersected edges");
        let mut walker = Walker::new(i, j);
        loop {
            trace!(
                at = ?walker.at,
                previous_triangle = walker.previous_triangle,
                previous_vertex = walker.previous_vertex,
                "walk step"
            );
            let next = match walker.at {
                Step::Vertex(v) if v != i => return Ok(v),
                Step::Vertex(v) => self.walk_from_vertex(&walker, v),
                Step::Triangle(t) => self.walk_from_triangle(&walker, t, q)?,
            };
            walker.advance(next);
        }
    }

    /// Finds, around vertex `v`, where the constraint leaves it.
    fn walk_from_vertex(&mut self, walker: &Walker, v: usize) -> Step {
        let (i, j) = (walker.i, walker.j);
        let mut exit = None;
        let mut fan = self.mesh.fan(v);
        while let Some((t, lv)) = fan.next(&self.mesh) {
            if t == walker.previous_triangle {
                continue;
            }
            let v1 = self.mesh.vertex(t, (lv + 1) % 3);
            let v2 = self.mesh.vertex(t, (lv + 2) % 3);
            if v1 == j || v2 == j {
                let le = if v1 == j { (lv + 2) % 3 } else { (lv + 1) % 3 };
                exit = Some(Exit::Embedded { t, le, v: j });
                break;
            }
            let o1 = self.geometry.orient2d(i, j, v1);
            let o2 = self.geometry.orient2d(i, j, v2);
            // Whether j is beyond [v1, v2], seen from v.
            let beyond = self.geometry.orient2d(v1, v2, j) * self.orientation == Sign::Negative;
            if o1 * o2 == Sign::Negative && beyond {
                exit = Some(Exit::Crossing { t, le: lv });
                break;
            }
            debug_assert!(!(o1.is_zero() && o2.is_zero()));
            if o1.is_zero() && beyond && v1 != walker.previous_vertex {
                exit = Some(Exit::Embedded { t, le: (lv + 2) % 3, v: v1 });
                break;
            }
            if o2.is_zero() && beyond && v2 != walker.previous_vertex {
                exit = Some(Exit::Embedded { t, le: (lv + 1) % 3, v: v2 });
                break;
            }
        }

        let id = self.constraints.len() - 1;
        match exit {
            Some(Exit::Crossing { t, le }) => {
                self.mesh.rotate(t, le);
                Step::Triangle(t)
            }
            // The flips will not see this edge, tag it now.
            Some(Exit::Embedded { t, le, v: next }) => {
                trace!(from = v, to = next, "edge on constraint");
                self.set_edge_constraint_with_neighbor(t, le, id);
                Step::Vertex(next)
            }
            None => panic!("constraint {i}-{j} does not leave vertex {v}"),
        }
    }

    /// Crosses edge 0 of `t`, or stops on a vertex of its far side.
    fn walk_from_triangle(&mut self, walker: &Walker, t: usize, q: &mut DList) -> Result<Step, CdtError> {
        let (i, j) = (walker.i, walker.j);
        if self.mesh.vertices(t).contains(&j) {
            return Ok(Step::Vertex(j));
        }
        for le in 0..3 {
            if self.mesh.adjacent(t, le) == walker.previous_triangle {
                continue;
            }
            // The line enters t through the previous edge and does not end
            // in t, so it is enough to test the line, not the segment.
            let v1 = self.mesh.vertex(t, (le + 1) % 3);
            let v2 = self.mesh.vertex(t, (le + 2) % 3);
            let o1 = self.geometry.orient2d(i, j, v1);
            let o2 = self.geometry.orient2d(i, j, v2);
            if o1 * o2 == Sign::Negative {
                self.mesh.rotate(t, le);
                if self.mesh.is_constrained(t, 0) {
                    return self.cross_constraint(walker, t, v1, v2).map(Step::Vertex);
                }
                trace!(t, v1, v2, "intersected edge");
                q.push_back(&mut self.mesh, t);
                return Ok(Step::Triangle(self.mesh.adjacent(t, 0)));
            }
            debug_assert!(!(o1.is_zero() && o2.is_zero()));
            if o1.is_zero() {
                return Ok(Step::Vertex(v1));
            }
            if o2.is_zero() {
                return Ok(Step::Vertex(v2));
            }
        }
        panic!("constraint {i}-{j} does not leave triangle {t}");
    }

    /// Inserts the intersection of the constraint being inserted with the
    /// constrained edge 0 `[v1, v2]` of `t`.
    fn cross_constraint(&mut self, walker: &Walker, t: usize, v1: usize, v2: usize) -> Result<usize, CdtError> {
        let id = self.constraints.len() - 1;
        let other = self.mesh.edge_constraint(t, 0);
        debug!(id, other, v1, v2, "constraints intersect");
        let a = Segment {
            constraint: id,
            from: walker.i,
            to: walker.j,
            origin: self.constraints[id],
        };
        let b = Segment {
            constraint: other,
            from: v1,
            to: v2,
            origin: self.constraints[other],
        };
        let v = self.geometry.create_intersection(&a, &b)?;
        self.mesh.add_vertex();
        self.insert_vertex_in_edge(v, t, 0, None);
        // Coming from a vertex, the edge from it to v was not queued.
        if walker.previous_vertex != NONE {
            self.set_edge_constraint_with_neighbor(t, 2, id);
        }
        Ok(v)
    }

    /// Flips the edges in `q` until `[i, j]` is an edge of the mesh. The
    /// edges created on the way that do not lie on `[i, j]` go to `n`.
    fn constrain_edges(&mut self, i: usize, j: usize, q: &mut DList, mut n: Option<&mut DList>) {
        let id = self.constraints.len() - 1;
        while let Some(t1) = q.pop_back(&mut self.mesh) {
            if !self.is_convex_quad(t1) {
                // Flipping it must wait for other flips. If it is the last
                // one, flips would go on forever.
                assert!(!q.is_empty(), "cannot flip the edges crossed by constraint {i}-{j}");
                q.push_front(&mut self.mesh, t1);
                continue;
            }
            let t2 = self.mesh.adjacent(t1, 0);
            if !q.contains(&self.mesh, t2) {
                self.swap_edge(t1, false);
                self.new_edge(i, j, t1, 2, id, n.as_deref_mut());
                continue;
            }

            // t2 is next in the queue, so its edge 0 is the other edge of t2
            // crossed by [i, j]. Where the new diagonal lies is given by
            // which corner of t1 it shares and the side of v0.
            let v0 = self.mesh.vertex(t1, 0);
            let o = self.geometry.orient2d(i, j, v0) * self.orientation;
            if self.mesh.vertex(t2, 0) == self.mesh.vertex(t1, 2) {
                self.swap_edge(t1, false);
                if o != Sign::Negative {
                    self.new_edge(i, j, t1, 2, id, n.as_deref_mut());
                } else {
                    self.intersected_edge(t1, 2, q);
                }
            } else {
                debug_assert_eq!(self.mesh.vertex(t2, 0), self.mesh.vertex(t1, 1));
                self.swap_edge(t1, true);
                if o == Sign::Positive {
                    self.intersected_edge(t1, 1, q);
                } else {
                    self.new_edge(i, j, t1, 1, id, n.as_deref_mut());
                }
            }
        }
    }

    /// Edge `le` of `t` no longer crosses `[i, j]`: tag it if it is `[i, j]`,
    /// otherwise remember it for Delaunay restoration.
    fn new_edge(&mut self, i: usize, j: usize, t: usize, le: usize, id: usize, n: Option<&mut DList>) {
        self.mesh.rotate(t, le);
        let (v1, v2) = (self.mesh.vertex(t, 1), self.mesh.vertex(t, 2));
        if (v1 == i && v2 == j) || (v1 == j && v2 == i) {
            self.set_edge_constraint_with_neighbor(t, 0, id);
        } else if let Some(n) = n {
            n.push_back(&mut self.mesh, t);
        }
    }

    /// Edge `le` of `t` still crosses the constraint: queue it again.
    fn intersected_edge(&mut self, t: usize, le: usize, q: &mut DList) {
        self.mesh.rotate(t, le);
        q.push_front(&mut self.mesh, t);
    }
}

fn edge_key(v1: usize, v2: usize) -> (usize, usize) {
    (v1.min(v2), v1.max(v2))
}

#[cfg(test)]
mod tests {
    use crate::{Cdt, CdtConfig, CdtError, HPoint, IntegerGeometry, NONE};

    fn cdt() -> Cdt<IntegerGeometry> {
        let config = CdtConfig {
            seed: Some(3),
            ..CdtConfig::default()
        };
        let mut cdt = Cdt::with_config(IntegerGeometry::new(), config);
        cdt.create_enclosing_rectangle(0, 0, 100, 100).unwrap();
        cdt
    }

    fn is_edge(cdt: &Cdt<IntegerGeometry>, a: usize, b: usize) -> Option<usize> {
        (0..cdt.nt()).flat_map(|t| (0..3).map(move |le| (t, le))).find_map(|(t, le)| {
            let (v1, v2) = (cdt.vertex(t, (le + 1) % 3), cdt.vertex(t, (le + 2) % 3));
            ((v1, v2) == (a, b)).then(|| cdt.edge_constraint(t, le).unwrap_or(NONE))
        })
    }

    #[test]
    fn constraint_through_existing_vertex() {
        let mut cdt = cdt();
        let a = cdt.insert(HPoint::new(10, 10)).unwrap();
        let m = cdt.insert(HPoint::new(50, 50)).unwrap();
        let b = cdt.insert(HPoint::new(90, 90)).unwrap();
        for (x, y) in [(30, 60), (60, 30), (20, 80), (80, 20)] {
            cdt.insert(HPoint::new(x, y)).unwrap();
        }
        cdt.insert_constraint(a, b).unwrap();
        cdt.check_consistency();
        assert_eq!(cdt.nv(), 11);
        for (u, v) in [(a, m), (m, b)] {
            let tag = is_edge(&cdt, u, v).or_else(|| is_edge(&cdt, v, u));
            assert_eq!(tag, Some(0));
        }
        assert_eq!(cdt.constraint_count(a, m), 1);
        assert_eq!(cdt.constraint_count(a, b), 0);
    }

    #[test]
    fn rejects_invalid_constraints() {
        let mut cdt = cdt();
        assert_eq!(cdt.insert_constraint(1, 1), Err(CdtError::InvalidConstraint { from: 1, to: 1 }));
        assert_eq!(cdt.insert_constraint(0, 9), Err(CdtError::VertexOutOfRange { vertex: 9, count: 4 }));
        assert_eq!(cdt.ncnstr(), 0);
    }
}
