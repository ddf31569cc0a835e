use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::error::CdtError;
use crate::geometry::{Geometry, IntegerGeometry, Sign};
use crate::mesh::{Mesh, TriangleFlag, UNCONSTRAINED};
use crate::NONE;

/// Options of a [`Cdt`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CdtConfig {
    /// Restore the Delaunay property after each insertion. When `false`,
    /// the result is a plain constrained triangulation.
    pub delaunay: bool,
    /// Seed of the point location walk. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for CdtConfig {
    fn default() -> Self {
        Self {
            delaunay: true,
            seed: None,
        }
    }
}

/// An incremental constrained Delaunay triangulation.
///
/// The triangulation must first be given an enclosing triangle or quad with
/// [`Cdt::create_enclosing_triangle`] or [`Cdt::create_enclosing_quad`]; all
/// subsequent points must lie inside it.
#[derive(Debug)]
pub struct Cdt<G: Geometry> {
    pub(crate) mesh: Mesh,
    pub(crate) geometry: G,
    pub(crate) constraints: Vec<(usize, usize)>,
    /// Number of times each undirected edge was tagged by a constraint.
    pub(crate) parity: HashMap<(usize, usize), usize>,
    /// Orientation shared by all the triangles, `Zero` until initialized.
    pub(crate) orientation: Sign,
    pub(crate) delaunay: bool,
    pub(crate) rng: StdRng,
}

impl Default for Cdt<IntegerGeometry> {
    fn default() -> Self {
        Cdt::new(IntegerGeometry::new())
    }
}

impl<G: Geometry> Cdt<G> {
    pub fn new(geometry: G) -> Self {
        Self::with_config(geometry, CdtConfig::default())
    }

    pub fn with_config(geometry: G, config: CdtConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            mesh: Mesh::default(),
            geometry,
            constraints: Vec::new(),
            parity: HashMap::new(),
            orientation: Sign::Zero,
            delaunay: config.delaunay,
            rng,
        }
    }

    /// Removes all the vertices, triangles and constraints.
    pub fn clear(&mut self) {
        self.mesh.clear();
        self.geometry.clear();
        self.constraints.clear();
        self.parity.clear();
        self.orientation = Sign::Zero;
    }

    /// Starts the triangulation with a single triangle. Its orientation
    /// becomes the orientation of all the triangles.
    pub fn create_enclosing_triangle(
        &mut self,
        p0: G::Point,
        p1: G::Point,
        p2: G::Point,
    ) -> Result<(), CdtError> {
        self.push_enclosing([p0, p1, p2])?;
        let orientation = self.geometry.orient2d(0, 1, 2);
        if orientation.is_zero() {
            self.clear();
            return Err(CdtError::DegenerateEnclosing);
        }
        self.orientation = orientation;
        let t0 = self.mesh.new_triangle();
        self.set_triangle(t0, [0, 1, 2], [NONE; 3], UNCONSTRAINED);
        debug!(?orientation, "created enclosing triangle");
        Ok(())
    }

    /// Starts the triangulation with a strictly convex quad, split in two
    /// triangles along its Delaunay diagonal.
    pub fn create_enclosing_quad(
        &mut self,
        p0: G::Point,
        p1: G::Point,
        p2: G::Point,
        p3: G::Point,
    ) -> Result<(), CdtError> {
        self.push_enclosing([p0, p1, p2, p3])?;
        let orientation = self.geometry.orient2d(0, 1, 2);
        let convex = !orientation.is_zero()
            && (0..4).all(|i| self.geometry.orient2d(i, (i + 1) % 4, (i + 2) % 4) == orientation);
        if !convex {
            self.clear();
            return Err(CdtError::DegenerateEnclosing);
        }
        self.orientation = orientation;
        let t0 = self.mesh.new_triangle();
        let t1 = self.mesh.new_triangle();
        self.set_triangle(t0, [0, 1, 3], [t1, NONE, NONE], UNCONSTRAINED);
        self.set_triangle(t1, [3, 1, 2], [NONE, NONE, t0], UNCONSTRAINED);
        debug_assert!(self.is_convex_quad(t0));
        if self.geometry.incircle(0, 1, 2, 3) == Sign::Positive {
            self.swap_edge(t0, false);
        }
        debug!(?orientation, "created enclosing quad");
        Ok(())
    }

    fn push_enclosing<const N: usize>(&mut self, points: [G::Point; N]) -> Result<(), CdtError> {
        if self.mesh.nv() != 0 || self.mesh.nt() != 0 {
            return Err(CdtError::AlreadyInitialized);
        }
        for point in points {
            if let Err(error) = self.geometry.push(point) {
                self.clear();
                return Err(error);
            }
            self.mesh.add_vertex();
        }
        Ok(())
    }

    pub(crate) fn ensure_initialized(&self) -> Result<(), CdtError> {
        if self.mesh.nt() == 0 {
            Err(CdtError::NotInitialized)
        } else {
            Ok(())
        }
    }

    pub(crate) fn check_vertex(&self, v: usize) -> Result<(), CdtError> {
        if v < self.mesh.nv() {
            Ok(())
        } else {
            Err(CdtError::VertexOutOfRange {
                vertex: v,
                count: self.mesh.nv(),
            })
        }
    }

    /// Inserts a point and returns its vertex index. A point that coincides
    /// with an existing vertex returns that vertex and allocates nothing.
    pub fn insert(&mut self, point: G::Point) -> Result<usize, CdtError> {
        self.insert_with_hint(point, NONE)
    }

    /// Same as [`Cdt::insert`], starting point location from triangle `hint`
    /// (or a random triangle if `hint` is [`NONE`]).
    pub fn insert_with_hint(&mut self, point: G::Point, hint: usize) -> Result<usize, CdtError> {
        let v = self.add_point(point)?;
        match self.insert_vertex(v, hint) {
            Ok(result) if result == v => Ok(v),
            result => {
                self.mesh.pop_vertex();
                self.geometry.pop();
                result
            }
        }
    }

    /// Stores a point without triangulating it. It becomes part of the mesh
    /// once given to [`Cdt::insert_vertex`].
    pub fn add_point(&mut self, point: G::Point) -> Result<usize, CdtError> {
        self.ensure_initialized()?;
        let v = self.geometry.push(point)?;
        debug_assert_eq!(v, self.mesh.nv());
        self.mesh.add_vertex();
        Ok(v)
    }

    /// Inserts all the points. Unlike [`Cdt::insert`], duplicates keep their
    /// own (unused) vertex index, so that the `n`-th point is vertex
    /// `nv() + n`. Returns the vertex of each point in the mesh.
    ///
    /// If a point lies outside of the domain, the points that follow it are
    /// stored but not triangulated.
    pub fn insert_vertices<I>(&mut self, points: I) -> Result<Vec<usize>, CdtError>
    where
        I: IntoIterator<Item = G::Point>,
    {
        let first = self.mesh.nv();
        for point in points {
            self.add_point(point)?;
        }
        let mut result = Vec::with_capacity(self.mesh.nv() - first);
        let mut hint = NONE;
        for v in first..self.mesh.nv() {
            let inserted = self.insert_vertex(v, hint)?;
            hint = self.mesh.vertex_triangle(inserted);
            result.push(inserted);
        }
        Ok(result)
    }

    pub fn set_delaunay(&mut self, delaunay: bool) {
        self.delaunay = delaunay;
    }

    pub fn is_delaunay(&self) -> bool {
        self.delaunay
    }

    /// Number of triangles.
    pub fn nt(&self) -> usize {
        self.mesh.nt()
    }

    /// Number of vertices.
    pub fn nv(&self) -> usize {
        self.mesh.nv()
    }

    /// Number of constraints.
    pub fn ncnstr(&self) -> usize {
        self.constraints.len()
    }

    pub fn vertex(&self, t: usize, lv: usize) -> usize {
        self.mesh.vertex(t, lv)
    }

    pub fn adjacent(&self, t: usize, le: usize) -> usize {
        self.mesh.adjacent(t, le)
    }

    /// Constraint embedded in edge `le` of triangle `t`, if any.
    pub fn edge_constraint(&self, t: usize, le: usize) -> Option<usize> {
        match self.mesh.edge_constraint(t, le) {
            NONE => None,
            c => Some(c),
        }
    }

    pub fn vertex_triangle(&self, v: usize) -> usize {
        self.mesh.vertex_triangle(v)
    }

    pub fn flag(&self, t: usize, flag: TriangleFlag) -> bool {
        self.mesh.flag(t, flag)
    }

    pub fn set_flag(&mut self, t: usize, flag: TriangleFlag) {
        self.mesh.set_triangle_flag(t, flag);
    }

    pub fn reset_flag(&mut self, t: usize, flag: TriangleFlag) {
        self.mesh.reset_triangle_flag(t, flag);
    }

    /// Endpoints of constraint `c`, as given to [`Cdt::insert_constraint`].
    pub fn constraint(&self, c: usize) -> (usize, usize) {
        self.constraints[c]
    }

    /// Orientation of all the triangles.
    pub fn orientation(&self) -> Sign {
        self.orientation
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn geometry(&self) -> &G {
        &self.geometry
    }

    /// Removes the triangles flagged [`TriangleFlag::Marked`].
    pub fn remove_marked_triangles(&mut self) {
        self.mesh.remove_marked();
    }

    /// Whether the edge `le` of `t` satisfies the empty circle property.
    /// Constrained and border edges always do.
    pub fn is_edge_delaunay(&self, t: usize, le: usize) -> bool {
        if self.mesh.is_constrained(t, le) {
            return true;
        }
        let t2 = self.mesh.adjacent(t, le);
        if t2 == NONE {
            return true;
        }
        let v4 = self.mesh.vertex(t2, self.mesh.find_adjacent(t2, t));
        let [v1, v2, v3] = self.mesh.vertices(t);
        self.geometry.incircle(v1, v2, v3, v4) != Sign::Positive
    }

    /// Whether all the points of a polyline are aligned. Such a polyline
    /// encloses no area and breaks even/odd classification.
    pub fn constraint_is_degenerate(&self, vertices: &[usize]) -> bool {
        for (i, &a) in vertices.iter().enumerate() {
            for (j, &b) in vertices.iter().enumerate().skip(i + 1) {
                for &c in &vertices[j + 1..] {
                    if !self.geometry.orient2d(a, b, c).is_zero() {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Checks adjacency, orientation and, with an exact incircle predicate
    /// in Delaunay mode, the empty circle property. Panics on failure.
    pub fn check_consistency(&self) {
        self.mesh.check_combinatorics();
        for t in 0..self.mesh.nt() {
            let [v0, v1, v2] = self.mesh.vertices(t);
            assert_eq!(
                self.geometry.orient2d(v0, v1, v2),
                self.orientation,
                "triangle {t} is not oriented like the mesh"
            );
        }
        if self.delaunay && self.geometry.is_incircle_exact() {
            for t in 0..self.mesh.nt() {
                for le in 0..3 {
                    assert!(self.is_edge_delaunay(t, le), "edge {le} of triangle {t} is not Delaunay");
                }
            }
        }
    }

    /// [`Mesh::set`] checking the orientation of the new triangle.
    pub(crate) fn set_triangle(&mut self, t: usize, v: [usize; 3], adj: [usize; 3], cnstr: [usize; 3]) {
        debug_assert_eq!(
            self.geometry.orient2d(v[0], v[1], v[2]),
            self.orientation,
            "triangle {t} {v:?} has the wrong orientation"
        );
        self.mesh.set(t, v, adj, cnstr);
    }
}

impl Cdt<IntegerGeometry> {
    /// Starts the triangulation with the axis-aligned rectangle
    /// `[x1, x2] × [y1, y2]`.
    pub fn create_enclosing_rectangle(&mut self, x1: i64, y1: i64, x2: i64, y2: i64) -> Result<(), CdtError> {
        self.create_enclosing_quad(
            (x1, y1).into(),
            (x2, y1).into(),
            (x2, y2).into(),
            (x1, y2).into(),
        )
    }
}
