//! Geometric predicates and constructions.
//!
//! The triangulation only manipulates vertex indices. Everything that needs
//! coordinates goes through the [`Geometry`] trait: two predicates
//! (`orient2d`, `incircle`) and one construction (`create_intersection`).
//! [`IntegerGeometry`] implements it over integer homogeneous coordinates.

use std::fmt;
use std::ops::{Mul, Neg};

use robust::Coord;

use crate::error::CdtError;

/// Largest magnitude accepted for a homogeneous coordinate of a stored point.
///
/// Keeps the orientation determinant inside `i128`: three products of three
/// entries below `2^40` stay below `2^123`.
pub const MAX_COORDINATE: i64 = 1 << 40;

/// Largest coordinate magnitude accepted with [`IncircleStrategy::Exact`].
///
/// That strategy only stores unit-weight points, and the lifted incircle
/// determinant of points below `2^28` stays below `2^120`.
pub const MAX_EXACT_COORDINATE: i64 = 1 << 28;

/// Sign of a predicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Sign {
    Negative = -1,
    Zero = 0,
    Positive = 1,
}

impl Sign {
    /// Sign of `value` compared to its type's default (zero).
    pub fn of<T: PartialOrd + Default>(value: T) -> Self {
        let zero = T::default();
        if value > zero {
            Sign::Positive
        } else if value < zero {
            Sign::Negative
        } else {
            Sign::Zero
        }
    }

    pub fn is_zero(self) -> bool {
        self == Sign::Zero
    }
}

impl Mul for Sign {
    type Output = Sign;

    fn mul(self, rhs: Sign) -> Sign {
        Sign::of(self as i8 * rhs as i8)
    }
}

impl Neg for Sign {
    type Output = Sign;

    fn neg(self) -> Sign {
        Sign::of(-(self as i8))
    }
}

/// A piece of a constraint, as seen by [`Geometry::create_intersection`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segment {
    /// Constraint identifier (its insertion ordinal).
    pub constraint: usize,
    /// Current extremities. They can be earlier intersection vertices.
    pub from: usize,
    pub to: usize,
    /// Extremities given when the constraint was inserted. All the pieces of
    /// a constraint lie exactly on the line through these two vertices.
    pub origin: (usize, usize),
}

/// Coordinate storage and predicates used by the triangulation.
///
/// Vertices are dense indices `0..len()`.
pub trait Geometry {
    /// Point type accepted by [`Geometry::push`].
    type Point;

    /// Number of stored points.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stores a new point and returns its index.
    fn push(&mut self, point: Self::Point) -> Result<usize, CdtError>;

    /// Removes the last stored point.
    fn pop(&mut self);

    /// Removes all the points.
    fn clear(&mut self);

    /// Approximate cartesian coordinates, for export and rendering.
    fn coordinates(&self, v: usize) -> [f64; 2];

    /// Sign of `det(pj - pi, pk - pi)`. Must be exact.
    fn orient2d(&self, i: usize, j: usize, k: usize) -> Sign;

    /// [`Sign::Positive`] if `l` is strictly inside the circle through
    /// `i`, `j`, `k`, whatever the orientation of `(i, j, k)`.
    fn incircle(&self, i: usize, j: usize, k: usize, l: usize) -> Sign;

    /// Whether [`Geometry::incircle`] is exact. When it is not, the
    /// triangulation only flips edges of strictly convex quads.
    fn is_incircle_exact(&self) -> bool;

    /// Stores the intersection of two crossing constraint pieces and returns
    /// its index.
    fn create_intersection(&mut self, a: &Segment, b: &Segment) -> Result<usize, CdtError>;
}

/// A point with integer homogeneous coordinates, meaning `(x / w, y / w)`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HPoint {
    pub x: i64,
    pub y: i64,
    pub w: i64,
}

impl fmt::Debug for HPoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.w == 1 {
            write!(f, "[{}, {}]", self.x, self.y)
        } else {
            write!(f, "[{}, {}, {}]", self.x, self.y, self.w)
        }
    }
}

impl From<(i64, i64)> for HPoint {
    fn from((x, y): (i64, i64)) -> Self {
        HPoint::new(x, y)
    }
}

impl HPoint {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y, w: 1 }
    }

    pub fn homogeneous(x: i64, y: i64, w: i64) -> Self {
        Self { x, y, w }
    }

    pub fn to_f64(&self) -> [f64; 2] {
        [self.x as f64 / self.w as f64, self.y as f64 / self.w as f64]
    }

    /// Divides out the common factor and makes `w` positive.
    ///
    /// Returns `None` if `w` is zero or if the result exceeds
    /// [`MAX_COORDINATE`].
    fn normalize(x: i128, y: i128, w: i128) -> Option<HPoint> {
        if w == 0 {
            return None;
        }
        let (x, y, w) = if w < 0 {
            (x.checked_neg()?, y.checked_neg()?, w.checked_neg()?)
        } else {
            (x, y, w)
        };
        let d = gcd(gcd(x.unsigned_abs(), y.unsigned_abs()), w.unsigned_abs()) as i128;
        let fit = |c: i128| {
            i64::try_from(c / d)
                .ok()
                .filter(|c| c.unsigned_abs() <= MAX_COORDINATE as u64)
        };
        Some(HPoint {
            x: fit(x)?,
            y: fit(y)?,
            w: fit(w)?,
        })
    }

    fn wide(&self) -> [i128; 3] {
        [self.x as i128, self.y as i128, self.w as i128]
    }
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

fn det2(a11: i128, a12: i128, a21: i128, a22: i128) -> Option<i128> {
    a11.checked_mul(a22)?.checked_sub(a12.checked_mul(a21)?)
}

#[allow(clippy::too_many_arguments)]
#[rustfmt::skip]
fn det3(
    a11: i128, a12: i128, a13: i128,
    a21: i128, a22: i128, a23: i128,
    a31: i128, a32: i128, a33: i128,
) -> Option<i128> {
    let m1 = a11.checked_mul(det2(a22, a23, a32, a33)?)?;
    let m2 = a21.checked_mul(det2(a12, a13, a32, a33)?)?;
    let m3 = a31.checked_mul(det2(a12, a13, a22, a23)?)?;
    m1.checked_sub(m2)?.checked_add(m3)
}

/// Homogeneous cross product: the line through two points, or the point
/// common to two lines.
fn cross(u: [i128; 3], v: [i128; 3]) -> Option<[i128; 3]> {
    Some([
        det2(u[1], u[2], v[1], v[2])?,
        det2(u[2], u[0], v[2], v[0])?,
        det2(u[0], u[1], v[0], v[1])?,
    ])
}

/// How [`IntegerGeometry`] evaluates the incircle predicate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IncircleStrategy {
    /// Exact `i128` evaluation. Points must have unit weight and coordinates
    /// within [`MAX_EXACT_COORDINATE`]; any other point, including most
    /// constraint intersections, is rejected with
    /// [`CdtError::CoordinateOverflow`].
    Exact,
    /// Adaptive-precision evaluation (`robust` crate) on the `f64`
    /// approximation of the points. Never overflows, but is not exact for
    /// intersection points, so edges are only flipped in convex quads.
    #[default]
    Approximate,
}

/// Integer homogeneous point storage with exact orientation predicate.
#[derive(Clone, Debug, Default)]
pub struct IntegerGeometry {
    points: Vec<HPoint>,
    strategy: IncircleStrategy,
}

impl IntegerGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategy(strategy: IncircleStrategy) -> Self {
        Self {
            points: Vec::new(),
            strategy,
        }
    }

    pub fn strategy(&self) -> IncircleStrategy {
        self.strategy
    }

    pub fn point(&self, v: usize) -> &HPoint {
        &self.points[v]
    }

    pub fn points(&self) -> &[HPoint] {
        &self.points
    }

    /// Whether the incircle predicate of the current strategy can use `point`.
    fn accepts(&self, point: &HPoint) -> bool {
        match self.strategy {
            IncircleStrategy::Exact => {
                point.w == 1
                    && point.x.abs() <= MAX_EXACT_COORDINATE
                    && point.y.abs() <= MAX_EXACT_COORDINATE
            }
            IncircleStrategy::Approximate => true,
        }
    }

    /// Stores an already normalized point.
    fn store(&mut self, point: HPoint) -> Result<usize, CdtError> {
        if !self.accepts(&point) {
            return Err(CdtError::CoordinateOverflow);
        }
        self.points.push(point);
        Ok(self.points.len() - 1)
    }

    fn incircle_exact(&self, i: usize, j: usize, k: usize, l: usize) -> Sign {
        let pl = self.points[l].wide();
        // Each row is `p - l` lifted on the paraboloid, scaled by the square
        // of its (positive) weight.
        let row = |v: usize| -> Option<[i128; 3]> {
            let p = self.points[v].wide();
            let ux = det2(p[0], p[2], pl[0], pl[2])?;
            let uy = det2(p[1], p[2], pl[1], pl[2])?;
            let uw = p[2].checked_mul(pl[2])?;
            Some([
                ux.checked_mul(uw)?,
                uy.checked_mul(uw)?,
                ux.checked_mul(ux)?.checked_add(uy.checked_mul(uy)?)?,
            ])
        };
        let det = (|| {
            let [a, b, c] = [row(i)?, row(j)?, row(k)?];
            det3(a[0], a[1], a[2], b[0], b[1], b[2], c[0], c[1], c[2])
        })();
        match det {
            Some(det) => Sign::of(det),
            None => panic!("exact incircle predicate overflows i128 for vertices {i} {j} {k} {l}"),
        }
    }

    fn incircle_approximate(&self, i: usize, j: usize, k: usize, l: usize) -> Sign {
        let coord = |v: usize| {
            let [x, y] = self.points[v].to_f64();
            Coord { x, y }
        };
        Sign::of(robust::incircle(coord(i), coord(j), coord(k), coord(l)))
    }
}

impl Geometry for IntegerGeometry {
    type Point = HPoint;

    fn len(&self) -> usize {
        self.points.len()
    }

    fn push(&mut self, point: HPoint) -> Result<usize, CdtError> {
        if point.w == 0 {
            return Err(CdtError::InvalidPoint);
        }
        let [x, y, w] = point.wide();
        let point = HPoint::normalize(x, y, w).ok_or(CdtError::CoordinateOverflow)?;
        self.store(point)
    }

    fn pop(&mut self) {
        self.points.pop();
    }

    fn clear(&mut self) {
        self.points.clear();
    }

    fn coordinates(&self, v: usize) -> [f64; 2] {
        self.points[v].to_f64()
    }

    fn orient2d(&self, i: usize, j: usize, k: usize) -> Sign {
        let [a, b, c] = [self.points[i].wide(), self.points[j].wide(), self.points[k].wide()];
        // Weights are positive, so the sign of the homogeneous determinant
        // is the orientation.
        match det3(a[0], a[1], a[2], b[0], b[1], b[2], c[0], c[1], c[2]) {
            Some(det) => Sign::of(det),
            None => panic!("orientation predicate overflows i128 for vertices {i} {j} {k}"),
        }
    }

    fn incircle(&self, i: usize, j: usize, k: usize, l: usize) -> Sign {
        let orient = self.orient2d(i, j, k);
        let raw = match self.strategy {
            IncircleStrategy::Exact => self.incircle_exact(i, j, k, l),
            IncircleStrategy::Approximate => self.incircle_approximate(i, j, k, l),
        };
        raw * orient
    }

    fn is_incircle_exact(&self) -> bool {
        self.strategy == IncircleStrategy::Exact
    }

    fn create_intersection(&mut self, a: &Segment, b: &Segment) -> Result<usize, CdtError> {
        let line = |(p, q): (usize, usize)| cross(self.points[p].wide(), self.points[q].wide());
        let point = line(a.origin)
            .zip(line(b.origin))
            .and_then(|(la, lb)| cross(la, lb));
        let Some([x, y, w]) = point else {
            return Err(CdtError::CoordinateOverflow);
        };
        assert!(
            w != 0,
            "constraints {} and {} are parallel and cannot intersect",
            a.constraint,
            b.constraint
        );
        let point = HPoint::normalize(x, y, w).ok_or(CdtError::CoordinateOverflow)?;
        self.store(point)
    }
}
