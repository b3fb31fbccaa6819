//! The Newton loop over the stationarity system, and the dense linear
//! solve backing each step.

use faer::{Col, Mat, prelude::Solve};

use crate::{
    Error,
    solver::{SolveResult, System},
};

/// Extra diagonal damping applied on a second solve attempt when the
/// factorization of the plain system yields a non-finite step.
const FALLBACK_DAMPING: f64 = 1e-9;

pub(super) fn run(mut system: System<'_>) -> Result<SolveResult, Error> {
    let dim = system.layout.dim();

    // Nothing to solve at all.
    if dim == 0 {
        return Ok(SolveResult {
            model: system.final_model(&[]),
            iterations: 0,
            cost: 0.0,
            converged: true,
        });
    }

    let mut z = vec![0.0; dim];
    let mut f = vec![0.0; dim];
    let mut jac = Mat::zeros(dim, dim);

    let mut iterations = 0;
    let mut converged = false;

    for i in 0..system.config.max_iterations {
        system.residual(&z, &mut f);
        system.jacobian(&z, &mut jac);

        let step = newton_step(&jac, &f, i)?;
        for (zk, sk) in z.iter_mut().zip(step.iter()) {
            *zk += sk;
        }
        iterations = i + 1;

        // Converge on the coordinate portion of the step: multipliers
        // can move without the geometry moving.
        let coord_step_sq: f64 = (system.layout.num_rows()..dim)
            .map(|k| step[k] * step[k])
            .sum();
        if coord_step_sq < system.config.tolerance {
            converged = true;
            break;
        }
    }

    system.residual(&z, &mut f);
    let cost = 0.5 * f.iter().map(|v| v * v).sum::<f64>();

    Ok(SolveResult {
        model: system.final_model(&z),
        iterations,
        cost,
        converged,
    })
}

/// Solve jac · step = −f by dense LU with full pivoting. If the plain
/// factorization produces a non-finite step the system is (numerically)
/// singular at this iterate; retry once with extra diagonal damping
/// before giving up.
fn newton_step(jac: &Mat<f64>, f: &[f64], iteration: usize) -> Result<Vec<f64>, Error> {
    let dim = f.len();
    let rhs = Col::from_fn(dim, |i| -f[i]);

    let step = jac.full_piv_lu().solve(&rhs);
    if step.iter().all(|v| v.is_finite()) {
        return Ok(step.iter().copied().collect());
    }

    let mut damped = jac.clone();
    for k in 0..dim {
        damped[(k, k)] += FALLBACK_DAMPING;
    }
    let step = damped.full_piv_lu().solve(&rhs);
    if step.iter().all(|v| v.is_finite()) {
        return Ok(step.iter().copied().collect());
    }

    Err(Error::SingularSystem { iteration })
}
