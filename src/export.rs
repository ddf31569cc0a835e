use std::io::{self, Write};

use crate::cdt::Cdt;
use crate::geometry::Geometry;

impl<G: Geometry> Cdt<G> {
    /// Writes the mesh as a Wavefront OBJ file: one `v` line per vertex
    /// (y axis flipped), one `f` line per triangle and one `l` line per
    /// constrained edge side.
    pub fn write_obj<W: Write>(&self, mut out: W) -> io::Result<()> {
        for v in 0..self.geometry.len() {
            let [x, y] = self.geometry.coordinates(v);
            writeln!(out, "v {} {} 0", x, 0.0 - y)?;
        }
        for t in 0..self.mesh.nt() {
            let [v0, v1, v2] = self.mesh.vertices(t);
            writeln!(out, "f {} {} {}", v0 + 1, v1 + 1, v2 + 1)?;
        }
        for t in 0..self.mesh.nt() {
            for le in 0..3 {
                if self.mesh.is_constrained(t, le) {
                    let v1 = self.mesh.vertex(t, (le + 1) % 3);
                    let v2 = self.mesh.vertex(t, (le + 2) % 3);
                    writeln!(out, "l {} {}", v1 + 1, v2 + 1)?;
                }
            }
        }
        Ok(())
    }
}
