//! 2D geometric constraint solver for parametric sketching.
//!
//! Given a set of points, segments connecting them, and geometric or
//! dimensional constraints between them, [`solve`] computes new point
//! coordinates satisfying the constraints. It is meant to be re-run by a
//! sketch editor after every interactive edit.
//!
//! Each call finds a minimal-displacement solution: at every Newton
//! iteration it solves the full KKT stationarity system of
//! "minimize 0.5·‖dx‖² subject to all constraint residuals = 0" for the
//! coordinate increment `dx` jointly with one Lagrange multiplier per
//! residual row. The Jacobian of that system is assembled from exact
//! analytic first and second derivatives of each constraint.

pub use crate::constraints::{Constraint, ConstraintKind};
pub use crate::model::{Model, Point, PointId, Segment, SegmentId};
pub use crate::solver::{Config, SolveResult};

/// Each kind of constraint we support, and its derivatives.
mod constraints;
/// Geometric data (points, segments, models).
mod model;
/// Mapping between a model's points and a flat vector of unknowns.
mod packing;
/// Numeric solver for the KKT stationarity system.
mod solver;
mod vector;

/// Fatal errors from a solve call.
///
/// Note that failing to converge is *not* an error: it's reported via
/// [`SolveResult`]'s `converged` flag along with the best-effort model, so
/// the caller can decide whether to accept or discard it.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The stationarity system could not be factorized, even after adding
    /// diagonal damping and retrying. Usually means the constraint set is
    /// wildly redundant or the geometry collapsed.
    #[error("linear system was singular at iteration {iteration}, even after regularization")]
    SingularSystem {
        /// Which Newton iteration hit the singular factorization.
        iteration: usize,
    },
}

/// Solve the given constraints, producing a new model.
///
/// The input model is never mutated; on success the caller typically
/// replaces its working model with the result's `model`. The call is a
/// pure synchronous computation bounded by [`Config`]'s `max_iterations`;
/// callers wanting responsiveness should debounce invocation.
pub fn solve(
    model: &Model,
    constraints: &[Constraint],
    config: Config,
) -> Result<SolveResult, Error> {
    solver::System::new(model, constraints, config).run()
}
