//! Indexed triangle mesh.
//!
//! Triangles are stored in parallel arrays addressed by a triangle index.
//! For triangle `t` and local index `l` in `0..3`:
//! - `vertex(t, l)` is its `l`-th corner,
//! - `adjacent(t, l)` is the triangle across the edge opposite to corner `l`
//!   (or [`NONE`] on the border),
//! - `edge_constraint(t, l)` is the constraint embedded in that edge (or
//!   [`NONE`]).
//!
//! All the operations here are purely combinatorial. Whenever one side of an
//! adjacency changes, the other side is fixed with [`Mesh::back_connect`].

use crate::dlist::LIST_COUNT;
use crate::NONE;

/// Constraint tags of a triangle whose edges are all unconstrained.
pub const UNCONSTRAINED: [usize; 3] = [NONE; 3];

/// User-visible triangle flags. The lowest bits are reserved for list
/// membership.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TriangleFlag {
    /// Scratch mark, used by polygon extraction and triangle removal.
    Marked,
    /// Set on triangles inside the region bounded by the constraints.
    Region,
}

impl TriangleFlag {
    pub(crate) fn bit(self) -> u8 {
        match self {
            TriangleFlag::Marked => LIST_COUNT,
            TriangleFlag::Region => LIST_COUNT + 1,
        }
    }
}

const LIST_MASK: u8 = (1 << LIST_COUNT) - 1;

/// Triangle to vertex incidence, adjacency, edge constraints, flags and list
/// links.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    corners: Vec<usize>,
    adjacent: Vec<usize>,
    constraints: Vec<usize>,
    flags: Vec<u8>,
    pub(crate) next: Vec<usize>,
    pub(crate) prev: Vec<usize>,
    vertex_triangle: Vec<usize>,
}

impl Mesh {
    /// Number of triangles.
    pub fn nt(&self) -> usize {
        self.flags.len()
    }

    /// Number of vertices.
    pub fn nv(&self) -> usize {
        self.vertex_triangle.len()
    }

    pub(crate) fn clear(&mut self) {
        *self = Mesh::default();
    }

    pub(crate) fn add_vertex(&mut self) -> usize {
        self.vertex_triangle.push(NONE);
        self.vertex_triangle.len() - 1
    }

    pub(crate) fn pop_vertex(&mut self) {
        debug_assert_eq!(self.vertex_triangle.last(), Some(&NONE));
        self.vertex_triangle.pop();
    }

    pub fn vertex(&self, t: usize, lv: usize) -> usize {
        debug_assert!(t < self.nt() && lv < 3);
        self.corners[3 * t + lv]
    }

    pub fn vertices(&self, t: usize) -> [usize; 3] {
        [self.corners[3 * t], self.corners[3 * t + 1], self.corners[3 * t + 2]]
    }

    pub fn adjacent(&self, t: usize, le: usize) -> usize {
        debug_assert!(t < self.nt() && le < 3);
        self.adjacent[3 * t + le]
    }

    pub fn edge_constraint(&self, t: usize, le: usize) -> usize {
        debug_assert!(t < self.nt() && le < 3);
        self.constraints[3 * t + le]
    }

    pub fn is_constrained(&self, t: usize, le: usize) -> bool {
        self.edge_constraint(t, le) != NONE
    }

    /// A triangle incident to `v`, or [`NONE`] if `v` is not in the mesh.
    pub fn vertex_triangle(&self, v: usize) -> usize {
        debug_assert!(v < self.nv());
        self.vertex_triangle[v]
    }

    /// Local index of vertex `v` in triangle `t`.
    pub fn find_vertex(&self, t: usize, v: usize) -> usize {
        find_3(&self.corners[3 * t..3 * t + 3], v)
    }

    /// Local index of the edge of `t1` shared with `t2`.
    pub fn find_adjacent(&self, t1: usize, t2: usize) -> usize {
        find_3(&self.adjacent[3 * t1..3 * t1 + 3], t2)
    }

    /// Raw flag byte of a triangle.
    pub fn flags(&self, t: usize) -> u8 {
        self.flags[t]
    }

    pub fn flag(&self, t: usize, flag: TriangleFlag) -> bool {
        self.has_flag(t, flag.bit())
    }

    pub(crate) fn set_triangle_flag(&mut self, t: usize, flag: TriangleFlag) {
        self.set_flag(t, flag.bit());
    }

    pub(crate) fn reset_triangle_flag(&mut self, t: usize, flag: TriangleFlag) {
        self.reset_flag(t, flag.bit());
    }

    pub(crate) fn has_flag(&self, t: usize, bit: u8) -> bool {
        debug_assert!(bit < 8);
        self.flags[t] & (1 << bit) != 0
    }

    pub(crate) fn set_flag(&mut self, t: usize, bit: u8) {
        debug_assert!(bit < 8);
        self.flags[t] |= 1 << bit;
    }

    pub(crate) fn reset_flag(&mut self, t: usize, bit: u8) {
        debug_assert!(bit < 8);
        self.flags[t] &= !(1 << bit);
    }

    /// Whether `t` currently belongs to a triangle list.
    pub fn is_in_list(&self, t: usize) -> bool {
        self.flags[t] & LIST_MASK != 0
    }

    /// Allocates a new triangle. Its record is undefined until [`Mesh::set`].
    pub(crate) fn new_triangle(&mut self) -> usize {
        let t = self.nt();
        self.corners.extend_from_slice(&[NONE; 3]);
        self.adjacent.extend_from_slice(&[NONE; 3]);
        self.constraints.extend_from_slice(&[NONE; 3]);
        self.flags.push(0);
        self.next.push(NONE);
        self.prev.push(NONE);
        t
    }

    /// Overwrites the vertices, adjacencies and edge constraints of `t`.
    ///
    /// Does not touch the neighbors: see [`Mesh::back_connect`].
    pub(crate) fn set(&mut self, t: usize, v: [usize; 3], adj: [usize; 3], cnstr: [usize; 3]) {
        debug_assert!(t < self.nt());
        debug_assert!(v.iter().all(|&v| v < self.nv()));
        debug_assert!(adj.iter().all(|&a| a == NONE || a < self.nt()));
        debug_assert!(v[0] != v[1] && v[1] != v[2] && v[2] != v[0]);
        debug_assert!(
            (0..3).all(|e| adj[e] == NONE || adj[e] != adj[(e + 1) % 3]),
            "triangle {t} has twice the same neighbor"
        );
        self.corners[3 * t..3 * t + 3].copy_from_slice(&v);
        self.adjacent[3 * t..3 * t + 3].copy_from_slice(&adj);
        self.constraints[3 * t..3 * t + 3].copy_from_slice(&cnstr);
        for v in v {
            self.vertex_triangle[v] = t;
        }
    }

    pub(crate) fn set_adjacent(&mut self, t: usize, le: usize, adj: usize) {
        debug_assert!(t < self.nt() && le < 3);
        self.adjacent[3 * t + le] = adj;
    }

    pub(crate) fn set_edge_constraint(&mut self, t: usize, le: usize, cnstr: usize) {
        debug_assert!(t < self.nt() && le < 3);
        self.constraints[3 * t + le] = cnstr;
    }

    /// Relabels `t` so that its local vertex `lv` becomes vertex 0.
    pub(crate) fn rotate(&mut self, t: usize, lv: usize) {
        debug_assert!(lv < 3);
        if lv == 0 {
            return;
        }
        let i = 3 * t + lv;
        let j = 3 * t + (lv + 1) % 3;
        let k = 3 * t + (lv + 2) % 3;
        self.set(
            t,
            [self.corners[i], self.corners[j], self.corners[k]],
            [self.adjacent[i], self.adjacent[j], self.adjacent[k]],
            [self.constraints[i], self.constraints[j], self.constraints[k]],
        );
    }

    /// After `t1` got a new neighbor `t2` across `le1`, makes `t2` point back
    /// to `t1` in the slot that used to point to `previous`, and copies
    /// `t2`'s constraint tag of that edge into `t1`.
    pub(crate) fn back_connect(&mut self, t1: usize, le1: usize, previous: usize) {
        let t2 = self.adjacent(t1, le1);
        if t2 == NONE {
            return;
        }
        let le2 = self.find_adjacent(t2, previous);
        self.set_adjacent(t2, le2, t1);
        self.set_edge_constraint(t1, le1, self.edge_constraint(t2, le2));
    }

    /// Walks the triangles incident to `v`.
    pub fn fan(&self, v: usize) -> Fan {
        let start = self.vertex_triangle(v);
        Fan {
            v,
            start,
            current: start,
            backward: false,
        }
    }

    /// Removes the triangles flagged [`TriangleFlag::Marked`] and renumbers
    /// the others.
    ///
    /// The renumbering table lives in the `next` array, so no triangle may
    /// be in a list.
    pub(crate) fn remove_marked(&mut self) {
        debug_assert!((0..self.nt()).all(|t| !self.is_in_list(t)));
        let nt = self.nt();
        let marked = TriangleFlag::Marked.bit();
        let mut old_to_new = std::mem::take(&mut self.next);
        let mut kept = 0;
        for t in 0..nt {
            if self.has_flag(t, marked) {
                old_to_new[t] = NONE;
            } else {
                old_to_new[t] = kept;
                kept += 1;
            }
        }

        // New indices never exceed old ones, so moving forward is safe.
        for t in 0..nt {
            let t_new = old_to_new[t];
            if t_new == NONE {
                continue;
            }
            for le in 0..3 {
                let adj = self.adjacent[3 * t + le];
                self.adjacent[3 * t_new + le] = if adj == NONE { NONE } else { old_to_new[adj] };
                self.corners[3 * t_new + le] = self.corners[3 * t + le];
                self.constraints[3 * t_new + le] = self.constraints[3 * t + le];
            }
            self.flags[t_new] = self.flags[t] & (1 << TriangleFlag::Region.bit());
        }

        self.corners.truncate(3 * kept);
        self.adjacent.truncate(3 * kept);
        self.constraints.truncate(3 * kept);
        self.flags.truncate(kept);
        old_to_new.clear();
        old_to_new.resize(kept, NONE);
        self.next = old_to_new;
        self.prev.clear();
        self.prev.resize(kept, NONE);

        self.vertex_triangle.fill(NONE);
        for t in 0..kept {
            for lv in 0..3 {
                self.vertex_triangle[self.corners[3 * t + lv]] = t;
            }
        }
    }

    /// Checks the combinatorial consistency of `t`, panics otherwise.
    pub fn check_triangle(&self, t: usize) {
        for e in 0..3 {
            assert_ne!(self.vertex(t, e), self.vertex(t, (e + 1) % 3), "triangle {t} is degenerate");
            let t2 = self.adjacent(t, e);
            if t2 == NONE {
                continue;
            }
            assert_ne!(t2, self.adjacent(t, (e + 1) % 3), "triangle {t} has twice the same neighbor");
            let e2 = self.find_adjacent(t2, t);
            assert_eq!(self.adjacent(t2, e2), t, "adjacency {t}-{t2} is not symmetric");
            let (a, b) = (self.vertex(t, (e + 1) % 3), self.vertex(t, (e + 2) % 3));
            assert!(
                self.vertex(t2, (e2 + 1) % 3) == b && self.vertex(t2, (e2 + 2) % 3) == a,
                "triangles {t} and {t2} do not share edge {a}-{b}"
            );
            assert_eq!(
                self.edge_constraint(t, e),
                self.edge_constraint(t2, e2),
                "edge {a}-{b} has different constraints on both sides"
            );
        }
    }

    /// Checks all the triangles and the vertex to triangle map.
    pub fn check_combinatorics(&self) {
        for t in 0..self.nt() {
            self.check_triangle(t);
        }
        for v in 0..self.nv() {
            let t = self.vertex_triangle[v];
            if t != NONE {
                assert!(self.vertices(t).contains(&v), "vertex {v} is not in triangle {t}");
            }
        }
    }
}

/// Iteration over the triangles around a vertex, see [`Mesh::fan`].
///
/// Turns around the vertex starting from the triangle of the vertex to
/// triangle map. When it meets the border, it walks the other way from the
/// start. Yields `(triangle, local index of the vertex)`.
#[derive(Clone, Debug)]
pub struct Fan {
    v: usize,
    start: usize,
    current: usize,
    backward: bool,
}

impl Fan {
    pub fn next(&mut self, mesh: &Mesh) -> Option<(usize, usize)> {
        let t = self.current;
        if t == NONE {
            return None;
        }
        let lv = mesh.find_vertex(t, self.v);
        if self.backward {
            self.current = mesh.adjacent(t, (lv + 2) % 3);
        } else {
            let next = mesh.adjacent(t, (lv + 1) % 3);
            if next == self.start {
                self.current = NONE;
            } else if next == NONE {
                self.backward = true;
                let ls = mesh.find_vertex(self.start, self.v);
                self.current = mesh.adjacent(self.start, (ls + 2) % 3);
            } else {
                self.current = next;
            }
        }
        Some((t, lv))
    }
}

/// Index of `v` in a three-element slice. `v` must be one of them.
fn find_3(slots: &[usize], v: usize) -> usize {
    let result = usize::from(slots[1] == v) | (usize::from(slots[2] == v) << 1);
    debug_assert_eq!(slots[result], v, "{v} not found in {slots:?}");
    result
}
