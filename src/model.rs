//! Plain entity data: points, segments, and the model that groups them.
//!
//! Nothing here has solver behavior. Entities are identified by opaque
//! string ids minted by the editor; the solver only resolves them.

use std::fmt;

/// Opaque id of a point. The editor owns id generation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PointId(String);

impl PointId {
    /// Wrap an editor-supplied id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for PointId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PointId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Opaque id of a segment. Distinct from [`PointId`] so that a segment
/// reference can't be handed to a constraint expecting a point.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SegmentId(String);

impl SegmentId {
    /// Wrap an editor-supplied id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for SegmentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SegmentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A 2D point with current coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    /// Identity, unique within a model.
    pub id: PointId,
    /// Current X coordinate.
    pub x: f64,
    /// Current Y coordinate.
    pub y: f64,
    /// Advisory hint that the editor treats this point as pinned.
    /// The solver ignores it: actual fixing is expressed with
    /// [`crate::ConstraintKind::FixPoint`].
    pub fixed: bool,
}

impl Point {
    /// A free (non-fixed) point at the given coordinates.
    pub fn new(id: impl Into<PointId>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            fixed: false,
        }
    }
}

/// A finite line segment between two points in the same model.
///
/// Segments carry no coordinates of their own; their geometry is derived
/// from their endpoints. Endpoints should be distinct ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Identity, unique within a model.
    pub id: SegmentId,
    /// First endpoint.
    pub p1: PointId,
    /// Second endpoint.
    pub p2: PointId,
}

impl Segment {
    /// A segment between two existing points.
    pub fn new(id: impl Into<SegmentId>, p1: impl Into<PointId>, p2: impl Into<PointId>) -> Self {
        Self {
            id: id.into(),
            p1: p1.into(),
            p2: p2.into(),
        }
    }
}

/// The unit of solver input and output: all points and segments of one
/// sketch. The solver never mutates a model it is given; each solve call
/// produces a fresh one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    /// All points, in editor order. Point order determines variable
    /// packing order and must not change during a solve.
    pub points: Vec<Point>,
    /// All segments.
    pub segments: Vec<Segment>,
}

impl Model {
    /// Build a model from its parts.
    pub fn new(points: Vec<Point>, segments: Vec<Segment>) -> Self {
        Self { points, segments }
    }

    /// Look up a point by id.
    pub fn point(&self, id: &PointId) -> Option<&Point> {
        self.points.iter().find(|p| &p.id == id)
    }

    /// Look up a segment by id.
    pub fn segment(&self, id: &SegmentId) -> Option<&Segment> {
        self.segments.iter().find(|s| &s.id == id)
    }
}
