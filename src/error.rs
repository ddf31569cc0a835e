use thiserror::Error;

/// Errors reported to the caller of the triangulation.
///
/// Broken mesh invariants are not represented here: they indicate a bug and
/// panic.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CdtError {
    /// An enclosing triangle or quad was created twice.
    #[error("the enclosing polygon has already been created")]
    AlreadyInitialized,

    /// A vertex or constraint was inserted before the enclosing polygon.
    #[error("create_enclosing_triangle() or create_enclosing_quad() must be called first")]
    NotInitialized,

    /// The enclosing polygon is flat, has repeated vertices or is not convex.
    #[error("degenerate enclosing polygon")]
    DegenerateEnclosing,

    /// A point has a zero homogeneous weight.
    #[error("point has a zero homogeneous weight")]
    InvalidPoint,

    /// A point lies outside of the enclosing polygon.
    #[error("point lies outside of the enclosing polygon")]
    OutsideDomain,

    /// A vertex index does not refer to an inserted vertex.
    #[error("vertex {vertex} is out of range (number of vertices: {count})")]
    VertexOutOfRange { vertex: usize, count: usize },

    /// A constraint joins a vertex to itself.
    #[error("constraint {from}-{to} is degenerate")]
    InvalidConstraint { from: usize, to: usize },

    /// The exact coordinates of a point, inserted or built at a constraint
    /// intersection, exceed the limit of the geometry's predicates.
    #[error("coordinates overflow the exact integer representation")]
    CoordinateOverflow,
}
