//! Point location by randomized walk.

use rand::Rng;

use crate::cdt::Cdt;
use crate::error::CdtError;
use crate::geometry::{Geometry, Sign};
use crate::NONE;

impl<G: Geometry> Cdt<G> {
    /// Finds the triangle containing vertex `v`, starting from `hint` (or a
    /// random triangle if `hint` is [`NONE`] or not a triangle).
    ///
    /// Returns the triangle and, for each of its edges, the orientation of
    /// the triangle obtained by replacing the opposite corner with `v`,
    /// relative to the mesh orientation. All three are non-negative; one
    /// zero means `v` is on that edge, two zeros mean `v` coincides with the
    /// third corner.
    pub fn locate(&mut self, v: usize, hint: usize) -> Result<(usize, [Sign; 3]), CdtError> {
        self.ensure_initialized()?;
        if v >= self.geometry.len() {
            return Err(CdtError::VertexOutOfRange {
                vertex: v,
                count: self.geometry.len(),
            });
        }
        self.walk(v, hint).ok_or(CdtError::OutsideDomain)
    }

    /// Locates a point that is not part of the triangulation.
    pub fn locate_point(&mut self, point: G::Point) -> Result<(usize, [Sign; 3]), CdtError> {
        self.ensure_initialized()?;
        let v = self.geometry.push(point)?;
        let result = self.walk(v, NONE).ok_or(CdtError::OutsideDomain);
        self.geometry.pop();
        result
    }

    /// The walk behind [`Cdt::locate`]. Returns `None` when it leaves the
    /// mesh, which means that `v` is outside of the enclosing polygon.
    pub(crate) fn walk(&mut self, v: usize, hint: usize) -> Option<(usize, [Sign; 3])> {
        let nt = self.mesh.nt();
        let mut t = if hint < nt { hint } else { self.rng.gen_range(0..nt) };
        // Differs from NONE, so that a border edge is never taken for the
        // edge we came from.
        let mut previous = nt;
        let mut signs = [Sign::Zero; 3];
        let mut steps = 0;

        'walk: loop {
            steps += 1;
            assert!(
                steps <= 4 * nt + 16,
                "point location of vertex {v} does not terminate"
            );
            if t == NONE {
                return None;
            }

            let mut corners = self.mesh.vertices(t);
            let first = self.rng.gen_range(0..3);
            for de in 0..3 {
                let le = (first + de) % 3;
                let next = self.mesh.adjacent(t, le);
                // We already know that v is on the inner side of this edge.
                if next == previous {
                    signs[le] = Sign::Positive;
                    continue;
                }
                let corner = corners[le];
                corners[le] = v;
                signs[le] = self.orientation * self.geometry.orient2d(corners[0], corners[1], corners[2]);
                corners[le] = corner;
                if signs[le] == Sign::Negative {
                    previous = t;
                    t = next;
                    continue 'walk;
                }
            }
            return Some((t, signs));
        }
    }
}
