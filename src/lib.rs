/*!
Incremental 2D [constrained Delaunay triangulation](https://en.wikipedia.org/wiki/Constrained_Delaunay_triangulation)
with exact integer predicates.

Points are inserted one by one inside an enclosing triangle or quad, and
constraints (edges that must appear in the triangulation) are inserted
between existing vertices with Sloan's method. Crossing constraints are
split at their exact intersection point.

# Example

```rust
use cdt2d::{Cdt, HPoint};

let mut cdt = Cdt::default();
cdt.create_enclosing_rectangle(0, 0, 100, 100).unwrap();

let a = cdt.insert(HPoint::new(20, 20)).unwrap();
let b = cdt.insert(HPoint::new(80, 20)).unwrap();
let c = cdt.insert(HPoint::new(50, 80)).unwrap();
cdt.insert_constraint(a, c).unwrap();

assert_eq!(cdt.nv(), 7);
assert_eq!(cdt.nt(), 8);
assert_eq!(cdt.ncnstr(), 1);
assert_ne!(a, b);
```
*/

mod cdt;
mod classify;
mod constrain;
mod dlist;
mod error;
mod export;
mod geometry;
mod insert;
mod locate;
mod mesh;

pub use crate::cdt::{Cdt, CdtConfig};
pub use crate::classify::{Polygon, MAX_POLYGON_VERTICES};
pub use crate::error::CdtError;
pub use crate::geometry::{
    Geometry, HPoint, IncircleStrategy, IntegerGeometry, Segment, Sign, MAX_COORDINATE, MAX_EXACT_COORDINATE,
};
pub use crate::mesh::{Fan, Mesh, TriangleFlag, UNCONSTRAINED};

/// Marks a missing vertex, triangle or constraint, e.g. the neighbor across
/// a border edge.
pub const NONE: usize = usize::MAX;
