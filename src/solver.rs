//! Assembly of the KKT stationarity system.
//!
//! At each Newton iteration we solve, for the current accumulated
//! unknowns z = [λ₁..λ_m, dx₁..dx_n], the linearization of
//!
//!   F_λk(z) = g_k(base + dx)                    (one row per residual)
//!   F_dp(z) = Σ_k λ_k dg_k/dx_p + dx_p          (one row per coordinate)
//!
//! which are the stationarity conditions of "minimize 0.5·‖dx‖² subject
//! to g(base + dx) = 0". The square Jacobian of F couples multiplier
//! rows to coordinate columns through dg/dx (symmetric by construction),
//! and coordinate rows to each other through λ·d²g/dx² plus the identity
//! from the quadratic objective.

use crate::{
    Error,
    constraints::{Constraint, CoordVar, DerivRow},
    model::{Model, PointId, SegmentId},
    packing::Packing,
    vector::V,
};
use faer::Mat;

/// Solver options.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Cap on Newton iterations. Non-convergence within the cap is
    /// reported, not an error.
    pub max_iterations: usize,
    /// Convergence threshold on the squared norm of the coordinate
    /// portion of each Newton step.
    pub tolerance: f64,
    /// Small constant added to the coordinate diagonal block of the
    /// stationarity Jacobian for conditioning.
    pub regularization: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            tolerance: 1e-6,
            regularization: 1e-12,
        }
    }
}

/// What a solve call produced.
#[derive(Clone, Debug)]
pub struct SolveResult {
    /// The solved model: base coordinates plus the accumulated increment.
    /// Best-effort if `converged` is false.
    pub model: Model,
    /// How many Newton iterations actually ran.
    pub iterations: usize,
    /// 0.5 times the squared norm of the stationarity residual at the
    /// final state. Near zero at a true solution.
    pub cost: f64,
    /// Whether the step-norm convergence test passed within the
    /// iteration cap.
    pub converged: bool,
}

/// All flat-offset arithmetic for the unknown vector [λ, dx], in one
/// place. Constraint code only ever names a multiplier row or a
/// (point, axis) coordinate role; nothing else computes offsets.
pub(crate) struct Layout {
    /// m: total residual rows across all constraints.
    num_rows: usize,
    /// n: 2 per packed point.
    num_coords: usize,
}

impl Layout {
    /// Size of the square stationarity system, m + n.
    pub fn dim(&self) -> usize {
        self.num_rows + self.num_coords
    }

    /// Slot of the Lagrange multiplier for residual row `row`.
    pub fn multiplier(&self, row: usize) -> usize {
        row
    }

    /// Slot of a coordinate unknown named by role.
    pub fn coord(&self, var: CoordVar) -> usize {
        self.num_rows + 2 * var.point + var.axis
    }

    /// Slot of the k-th coordinate unknown (packing order).
    pub fn coord_slot(&self, k: usize) -> usize {
        self.num_rows + k
    }

    /// m: total residual rows.
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// n: total coordinate unknowns.
    pub fn num_coords(&self) -> usize {
        self.num_coords
    }
}

/// A constraint reference resolved against the packing: the packed point
/// index (None for a dangling reference) and the current trial position.
/// Dangling references read as the origin and write nowhere.
#[derive(Clone, Copy)]
pub(crate) struct ResolvedPoint {
    /// Packed index, if the point exists.
    pub index: Option<usize>,
    /// Trial position (base plus accumulated increment), or the origin.
    pub pos: V,
}

/// Everything a constraint needs to evaluate itself at the current trial
/// state.
pub(crate) struct EvalContext<'a> {
    /// Base model, for segment topology and fix-point defaults.
    model: &'a Model,
    packing: &'a Packing,
    /// Trial coordinates: base plus accumulated dx, packed.
    trial: &'a [f64],
}

impl EvalContext<'_> {
    pub fn point(&self, id: &PointId) -> ResolvedPoint {
        match self.packing.index_of(id) {
            Some(i) => ResolvedPoint {
                index: Some(i),
                pos: V::new(self.trial[2 * i], self.trial[2 * i + 1]),
            },
            // Dangling reference: degrade to the origin rather than fail.
            None => ResolvedPoint {
                index: None,
                pos: V::ZERO,
            },
        }
    }

    pub fn segment_endpoints(&self, id: &SegmentId) -> (ResolvedPoint, ResolvedPoint) {
        match self.model.segment(id) {
            Some(segment) => (self.point(&segment.p1), self.point(&segment.p2)),
            None => {
                let missing = ResolvedPoint {
                    index: None,
                    pos: V::ZERO,
                };
                (missing, missing)
            }
        }
    }

    /// Target position for a fix-point constraint: explicit coordinates
    /// where given, otherwise the point's base-model position.
    pub fn fix_target(&self, id: &PointId, x: Option<f64>, y: Option<f64>) -> V {
        let base = self.model.point(id).map_or(V::ZERO, |p| V::new(p.x, p.y));
        V::new(x.unwrap_or(base.x), y.unwrap_or(base.y))
    }
}

/// One solve call's worth of state: the packing and layout are built
/// once from the base model and reused for every iteration.
pub(crate) struct System<'c> {
    pub(crate) model: &'c Model,
    pub(crate) constraints: &'c [Constraint],
    pub(crate) config: Config,
    pub(crate) packing: Packing,
    pub(crate) layout: Layout,
    /// Base coordinates, packed. The unknowns are increments on these.
    pub(crate) base: Vec<f64>,
    /// First residual row of each constraint.
    row_base: Vec<usize>,
    /// Scratch: base + accumulated dx.
    trial: Vec<f64>,
}

impl<'c> System<'c> {
    pub fn new(model: &'c Model, constraints: &'c [Constraint], config: Config) -> Self {
        let packing = Packing::new(model);
        let base = packing.to_vector(model);

        let mut row_base = Vec::with_capacity(constraints.len());
        let mut num_rows = 0;
        for constraint in constraints {
            row_base.push(num_rows);
            num_rows += constraint.kind.residual_dim();
        }

        let layout = Layout {
            num_rows,
            num_coords: packing.num_coords(),
        };
        let trial = base.clone();

        Self {
            model,
            constraints,
            config,
            packing,
            layout,
            base,
            row_base,
            trial,
        }
    }

    /// Recompute the trial coordinates from the accumulated increment.
    fn refresh_trial(&mut self, z: &[f64]) {
        let m = self.layout.num_rows;
        for (i, (t, b)) in self.trial.iter_mut().zip(self.base.iter()).enumerate() {
            *t = b + z[m + i];
        }
    }

    /// Evaluate the stationarity residual F at z, writing into `out`
    /// (length m + n).
    pub fn residual(&mut self, z: &[f64], out: &mut [f64]) {
        self.refresh_trial(z);
        out.fill(0.0);

        let ctx = EvalContext {
            model: self.model,
            packing: &self.packing,
            trial: &self.trial,
        };
        let mut row0 = DerivRow::default();
        let mut row1 = DerivRow::default();

        for (k, constraint) in self.constraints.iter().enumerate() {
            let base_row = self.row_base[k];
            let weight = constraint.weight;

            // Constraint rows: the (weighted) residuals themselves.
            let (mut r0, mut r1) = (0.0, 0.0);
            constraint.kind.residual(&ctx, &mut r0, &mut r1);
            out[self.layout.multiplier(base_row)] = weight * r0;
            if constraint.kind.residual_dim() > 1 {
                out[self.layout.multiplier(base_row + 1)] = weight * r1;
            }

            // Coordinate rows: accumulate Σ λ_k dg_k/dx.
            row0.clear();
            row1.clear();
            constraint.kind.derivative_rows(&ctx, &mut row0, &mut row1);
            for (offset, row) in [&row0, &row1]
                .into_iter()
                .take(constraint.kind.residual_dim())
                .enumerate()
            {
                let lambda = z[self.layout.multiplier(base_row + offset)];
                for jv in &row.grad {
                    out[self.layout.coord(jv.var)] += lambda * weight * jv.partial_derivative;
                }
            }
        }

        // Gradient of the 0.5·‖dx‖² objective.
        for k in 0..self.layout.num_coords {
            let slot = self.layout.coord_slot(k);
            out[slot] += z[slot];
        }
    }

    /// Assemble the exact Jacobian of the stationarity residual at z.
    pub fn jacobian(&mut self, z: &[f64], jac: &mut Mat<f64>) {
        self.refresh_trial(z);
        jac.as_mut().fill(0.0);

        let ctx = EvalContext {
            model: self.model,
            packing: &self.packing,
            trial: &self.trial,
        };
        let mut row0 = DerivRow::default();
        let mut row1 = DerivRow::default();

        for (k, constraint) in self.constraints.iter().enumerate() {
            let base_row = self.row_base[k];
            let weight = constraint.weight;

            row0.clear();
            row1.clear();
            constraint.kind.derivative_rows(&ctx, &mut row0, &mut row1);
            for (offset, row) in [&row0, &row1]
                .into_iter()
                .take(constraint.kind.residual_dim())
                .enumerate()
            {
                let row_slot = self.layout.multiplier(base_row + offset);
                let lambda = z[row_slot];

                // dg/dx couples the multiplier row to the coordinate
                // columns, and symmetrically the coordinate rows to the
                // multiplier column.
                for jv in &row.grad {
                    let coord_slot = self.layout.coord(jv.var);
                    let value = weight * jv.partial_derivative;
                    jac[(row_slot, coord_slot)] += value;
                    jac[(coord_slot, row_slot)] += value;
                }

                // λ·d²g/dx² curvature, coordinate block only.
                for cv in &row.curvature {
                    jac[(self.layout.coord(cv.row), self.layout.coord(cv.col))] +=
                        lambda * weight * cv.value;
                }
            }
        }

        // Identity from the quadratic objective, plus conditioning.
        for k in 0..self.layout.num_coords {
            let slot = self.layout.coord_slot(k);
            jac[(slot, slot)] += 1.0 + self.config.regularization;
        }
    }

    /// Produce the output model from the final trial coordinates.
    pub fn final_model(&mut self, z: &[f64]) -> Model {
        self.refresh_trial(z);
        self.packing.apply(self.model, &self.trial)
    }

    pub fn run(self) -> Result<SolveResult, Error> {
        newton::run(self)
    }
}

mod newton;
