//! Bijection between a model's point coordinates and the flat vector of
//! scalar unknowns the linear-algebra layer works on.
//!
//! Built once per solve from the base model and reused for every
//! iteration. Coordinates are interleaved: point i owns slots 2i (x) and
//! 2i+1 (y).

use indexmap::IndexMap;

use crate::model::{Model, PointId};

/// Stable point-id → index mapping for one solve call.
pub(crate) struct Packing {
    /// Indexed in order of first appearance in the point set.
    point_index_by_id: IndexMap<PointId, usize>,
    /// Every point gets a slot, even a duplicate id that [`Self::index_of`]
    /// can never name. Keeps slot arithmetic aligned with the point list.
    num_points: usize,
}

impl Packing {
    pub fn new(model: &Model) -> Self {
        let mut point_index_by_id = IndexMap::with_capacity(model.points.len());
        for (i, point) in model.points.iter().enumerate() {
            point_index_by_id.entry(point.id.clone()).or_insert(i);
        }
        Self {
            point_index_by_id,
            num_points: model.points.len(),
        }
    }

    /// Index of the given point, or None for a dangling reference.
    /// Duplicate ids resolve to their first occurrence.
    pub fn index_of(&self, id: &PointId) -> Option<usize> {
        self.point_index_by_id.get(id).copied()
    }

    /// Number of packed points.
    pub fn num_points(&self) -> usize {
        self.num_points
    }

    /// Number of scalar coordinate unknowns (2 per point).
    pub fn num_coords(&self) -> usize {
        2 * self.num_points()
    }

    /// Pack the model's current coordinates as (x0, y0, x1, y1, ...).
    pub fn to_vector(&self, model: &Model) -> Vec<f64> {
        let mut vec = Vec::with_capacity(model.points.len() * 2);
        for point in &model.points {
            vec.push(point.x);
            vec.push(point.y);
        }
        vec
    }

    /// Produce a new model whose points take coordinates from `coords`.
    ///
    /// Points whose slots fall beyond the vector's length keep their old
    /// coordinates. That's a defensive default, not a normal path: the
    /// solver always supplies a full-length vector.
    pub fn apply(&self, model: &Model, coords: &[f64]) -> Model {
        let mut out = model.clone();
        for (i, point) in out.points.iter_mut().enumerate() {
            if let Some(&x) = coords.get(2 * i) {
                point.x = x;
            }
            if let Some(&y) = coords.get(2 * i + 1) {
                point.y = y;
            }
        }
        out
    }
}
