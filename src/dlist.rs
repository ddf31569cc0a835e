//! Doubly linked lists of triangles threaded through the mesh.
//!
//! A [`DList`] does not own any storage: the links live in the mesh's `next`
//! and `prev` arrays and membership is a flag bit of the triangle. This gives
//! O(1) push, pop, removal and membership test. Since the links are shared,
//! a triangle can belong to at most one list at a time.
//!
//! The triangulation uses three roles:
//! - `S`, the stack of triangles to examine for flipping after a vertex
//!   insertion,
//! - `Q`, the queue of edges intersected by a constraint,
//! - `N`, the new edges to re-Delaunayize after enforcing a constraint.

use crate::mesh::Mesh;
use crate::NONE;

/// Identifies a list, and thus the triangle flag bit used for membership.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum ListId {
    S = 0,
    Q = 1,
    N = 2,
}

/// Number of list flag bits, the first bits of the triangle flags.
pub(crate) const LIST_COUNT: u8 = 3;

impl ListId {
    pub(crate) fn flag(self) -> u8 {
        self as u8
    }
}

/// A doubly linked list of triangles, see the [module documentation](self).
#[derive(Debug)]
pub(crate) struct DList {
    id: ListId,
    front: usize,
    back: usize,
}

impl DList {
    pub(crate) fn new(id: ListId) -> Self {
        Self {
            id,
            front: NONE,
            back: NONE,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        debug_assert_eq!(self.front == NONE, self.back == NONE);
        self.back == NONE
    }

    pub(crate) fn contains(&self, mesh: &Mesh, t: usize) -> bool {
        mesh.has_flag(t, self.id.flag())
    }

    /// First triangle, or [`NONE`].
    pub(crate) fn front(&self) -> usize {
        self.front
    }

    pub(crate) fn next(&self, mesh: &Mesh, t: usize) -> usize {
        debug_assert!(self.contains(mesh, t));
        mesh.next[t]
    }

    pub(crate) fn len(&self, mesh: &Mesh) -> usize {
        let mut result = 0;
        let mut t = self.front;
        while t != NONE {
            result += 1;
            t = mesh.next[t];
        }
        result
    }

    pub(crate) fn clear(&mut self, mesh: &mut Mesh) {
        let mut t = self.front;
        while t != NONE {
            mesh.reset_flag(t, self.id.flag());
            t = mesh.next[t];
        }
        self.front = NONE;
        self.back = NONE;
    }

    pub(crate) fn push_back(&mut self, mesh: &mut Mesh, t: usize) {
        assert!(
            !mesh.is_in_list(t),
            "triangle {t} is already in a list ({:?} push)",
            self.id
        );
        mesh.set_flag(t, self.id.flag());
        mesh.next[t] = NONE;
        if self.is_empty() {
            mesh.prev[t] = NONE;
            self.front = t;
        } else {
            mesh.next[self.back] = t;
            mesh.prev[t] = self.back;
        }
        self.back = t;
    }

    pub(crate) fn push_front(&mut self, mesh: &mut Mesh, t: usize) {
        assert!(
            !mesh.is_in_list(t),
            "triangle {t} is already in a list ({:?} push)",
            self.id
        );
        mesh.set_flag(t, self.id.flag());
        mesh.prev[t] = NONE;
        if self.is_empty() {
            mesh.next[t] = NONE;
            self.back = t;
        } else {
            mesh.prev[self.front] = t;
            mesh.next[t] = self.front;
        }
        self.front = t;
    }

    pub(crate) fn pop_back(&mut self, mesh: &mut Mesh) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let t = self.back;
        self.back = mesh.prev[t];
        if self.back == NONE {
            debug_assert_eq!(self.front, t);
            self.front = NONE;
        } else {
            mesh.next[self.back] = NONE;
        }
        debug_assert!(self.contains(mesh, t));
        mesh.reset_flag(t, self.id.flag());
        Some(t)
    }

    pub(crate) fn pop_front(&mut self, mesh: &mut Mesh) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let t = self.front;
        self.front = mesh.next[t];
        if self.front == NONE {
            debug_assert_eq!(self.back, t);
            self.back = NONE;
        } else {
            mesh.prev[self.front] = NONE;
        }
        debug_assert!(self.contains(mesh, t));
        mesh.reset_flag(t, self.id.flag());
        Some(t)
    }

    #[allow(dead_code)]
    pub(crate) fn remove(&mut self, mesh: &mut Mesh, t: usize) {
        assert!(self.contains(mesh, t), "triangle {t} is not in {:?}", self.id);
        if t == self.front {
            self.pop_front(mesh);
        } else if t == self.back {
            self.pop_back(mesh);
        } else {
            let prev = mesh.prev[t];
            let next = mesh.next[t];
            mesh.prev[next] = prev;
            mesh.next[prev] = next;
            mesh.reset_flag(t, self.id.flag());
        }
    }
}
