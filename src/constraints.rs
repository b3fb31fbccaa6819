use crate::{
    model::{PointId, SegmentId},
    solver::{EvalContext, ResolvedPoint},
    vector::V,
};
use std::f64::consts::PI;

/// Floor for norm denominators. A zero-length segment divides by this
/// instead of by zero, yielding a large-but-finite residual.
pub(crate) const NORM_FLOOR: f64 = 1e-12;

#[inline(always)]
fn floored(norm: f64) -> f64 {
    libm::fmax(norm, NORM_FLOOR)
}

/// Normalize an angle into [-pi, pi] by repeated 2*pi shifts.
pub(crate) fn wrap_to_pi(angle: f64) -> f64 {
    let mut a = angle;
    while a > PI {
        a -= 2.0 * PI;
    }
    while a < -PI {
        a += 2.0 * PI;
    }
    a
}

/// A geometric constraint as the editor hands it to the solver.
#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    /// Identity, minted by the editor.
    pub id: String,
    /// What the constraint demands.
    pub kind: ConstraintKind,
    /// Scales every residual row of this constraint (and therefore its
    /// derivatives). 1.0 for an ordinary constraint.
    pub weight: f64,
}

impl Constraint {
    /// A constraint with the default weight of 1.0.
    pub fn new(id: impl Into<String>, kind: ConstraintKind) -> Self {
        Self {
            id: id.into(),
            kind,
            weight: 1.0,
        }
    }

    /// Override the weight.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }
}

/// Each geometric constraint we support.
///
/// References are typed: a variant that needs a segment holds a
/// [`SegmentId`], so arity and kind are enforced at construction rather
/// than checked positionally at evaluation time.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum ConstraintKind {
    /// These two points must coincide.
    Coincident {
        /// First point.
        a: PointId,
        /// Second point.
        b: PointId,
    },
    /// These two points should be a given distance apart.
    Distance {
        /// First point.
        a: PointId,
        /// Second point.
        b: PointId,
        /// Desired Euclidean distance.
        distance: f64,
    },
    /// Pin a point to a target position.
    FixPoint {
        /// The point to pin.
        p: PointId,
        /// Target X. Defaults to the point's position at solve time.
        x: Option<f64>,
        /// Target Y. Defaults to the point's position at solve time.
        y: Option<f64>,
    },
    /// These two segments should be parallel.
    Parallel {
        /// First segment.
        a: SegmentId,
        /// Second segment.
        b: SegmentId,
    },
    /// These two segments should meet at a right angle.
    Perpendicular {
        /// First segment.
        a: SegmentId,
        /// Second segment.
        b: SegmentId,
    },
    /// The segment's endpoints should share an X value.
    Vertical {
        /// The segment.
        segment: SegmentId,
    },
    /// The segment's endpoints should share a Y value.
    Horizontal {
        /// The segment.
        segment: SegmentId,
    },
    /// These two segments should meet at the given angle.
    Angle {
        /// First segment; the angle is measured from its direction.
        a: SegmentId,
        /// Second segment.
        b: SegmentId,
        /// Desired angle in radians, counterclockwise from `a` to `b`.
        angle: f64,
    },
    /// The point should lie on the (infinite extension of the) segment.
    PointOnLine {
        /// The point.
        p: PointId,
        /// The segment whose carrier line the point should lie on.
        segment: SegmentId,
    },
}

/// One first-order partial derivative: which coordinate unknown, and the
/// value of dg/dx for it. Corresponds to one entry of a constraint row of
/// the stationarity Jacobian (and, transposed, one entry of the matching
/// column).
#[derive(Clone, Copy)]
pub(crate) struct JacobianVar {
    /// Which coordinate unknown.
    pub var: CoordVar,
    /// Value of the partial derivative.
    pub partial_derivative: f64,
}

/// One second-order partial derivative d2g/(dx_row dx_col). Scaled by the
/// row's Lagrange multiplier when scattered into the coordinate block of
/// the stationarity Jacobian.
#[derive(Clone, Copy)]
pub(crate) struct CurvatureVar {
    /// Row coordinate unknown.
    pub row: CoordVar,
    /// Column coordinate unknown.
    pub col: CoordVar,
    /// Value of the second partial derivative.
    pub value: f64,
}

/// A coordinate unknown named by role: point index (from the packing) and
/// axis (0 = x, 1 = y). Only [`crate::solver::Layout`] turns this into a
/// flat slot.
#[derive(Clone, Copy)]
pub(crate) struct CoordVar {
    /// Packed point index.
    pub point: usize,
    /// 0 for x, 1 for y.
    pub axis: usize,
}

/// All derivative contributions of one residual row, written against
/// named coordinate roles. Entries for dangling references are simply
/// absent: a missing entity is a constant origin and nothing flows
/// through it.
#[derive(Default)]
pub(crate) struct DerivRow {
    /// First derivatives dg/dx.
    pub grad: Vec<JacobianVar>,
    /// Second derivatives d2g/dx2, emitted as full (not just upper
    /// triangle) 2x2 point-pair blocks so the assembler can scatter with
    /// plain accumulation.
    pub curvature: Vec<CurvatureVar>,
}

/// 2x2 block of second derivatives between the coordinates of two points.
type M2 = [[f64; 2]; 2];

const M2_ZERO: M2 = [[0.0; 2]; 2];

fn m2_scale(m: M2, k: f64) -> M2 {
    [[m[0][0] * k, m[0][1] * k], [m[1][0] * k, m[1][1] * k]]
}

fn m2_transpose(m: M2) -> M2 {
    [[m[0][0], m[1][0]], [m[0][1], m[1][1]]]
}

impl DerivRow {
    pub fn clear(&mut self) {
        self.grad.clear();
        self.curvature.clear();
    }

    fn push_grad(&mut self, point: &ResolvedPoint, axis: usize, value: f64) {
        if let Some(point) = point.index {
            self.grad.push(JacobianVar {
                var: CoordVar { point, axis },
                partial_derivative: value,
            });
        }
    }

    /// Push the full 2x2 curvature block between two points' coordinates,
    /// block[i][j] = d2g / d(row point, axis i) d(col point, axis j).
    fn push_block(&mut self, row: &ResolvedPoint, col: &ResolvedPoint, block: M2) {
        let (Some(row), Some(col)) = (row.index, col.index) else {
            return;
        };
        for (i, block_row) in block.iter().enumerate() {
            for (j, &value) in block_row.iter().enumerate() {
                self.curvature.push(CurvatureVar {
                    row: CoordVar {
                        point: row,
                        axis: i,
                    },
                    col: CoordVar { point: col, axis: j },
                    value,
                });
            }
        }
    }
}

/// Derivatives of an expression of two segment direction vectors u, v
/// with respect to u and v. The endpoint chain rule (u = B - A flips the
/// sign for A) is applied by [`scatter_two_segments`].
struct SegmentPairDerivs {
    grad_u: V,
    grad_v: V,
    h_uu: M2,
    h_uv: M2,
    h_vv: M2,
}

/// Scatter [`SegmentPairDerivs`] onto the four endpoints of the two
/// segments. Shared endpoints accumulate, which is exactly the chain
/// rule for e.g. two segments meeting at a vertex.
fn scatter_two_segments(
    row: &mut DerivRow,
    u_ends: (&ResolvedPoint, &ResolvedPoint),
    v_ends: (&ResolvedPoint, &ResolvedPoint),
    d: &SegmentPairDerivs,
) {
    let u_side = [(u_ends.0, -1.0), (u_ends.1, 1.0)];
    let v_side = [(v_ends.0, -1.0), (v_ends.1, 1.0)];

    for (p, sign) in u_side {
        row.push_grad(p, 0, sign * d.grad_u.x);
        row.push_grad(p, 1, sign * d.grad_u.y);
    }
    for (p, sign) in v_side {
        row.push_grad(p, 0, sign * d.grad_v.x);
        row.push_grad(p, 1, sign * d.grad_v.y);
    }

    for (p, sp) in u_side {
        for (q, sq) in u_side {
            row.push_block(p, q, m2_scale(d.h_uu, sp * sq));
        }
    }
    for (p, sp) in v_side {
        for (q, sq) in v_side {
            row.push_block(p, q, m2_scale(d.h_vv, sp * sq));
        }
    }
    for (p, sp) in u_side {
        for (q, sq) in v_side {
            row.push_block(p, q, m2_scale(d.h_uv, sp * sq));
            row.push_block(q, p, m2_scale(m2_transpose(d.h_uv), sp * sq));
        }
    }
}

enum ProductKind {
    Cross,
    Dot,
}

/// Derivatives of g = s(u,v) / (|u| |v|) where s is the 2D cross product
/// (parallel) or dot product (perpendicular).
///
/// With a = 1/(|u||v|), s bilinear in u and v, and da/du_i = -a u_i/|u|²:
///   dg/du_i      = a (s_u_i - s u_i/|u|²)
///   d²g/du_i du_j = a ( -(s_u_i u_j + s_u_j u_i)/|u|²
///                       + s (3 u_i u_j/|u|⁴ - δij/|u|²) )
///   d²g/du_i dv_j = a ( s_u_i_v_j - s_u_i v_j/|v|² - s_v_j u_i/|u|²
///                       + s u_i v_j/(|u|²|v|²) )
/// and symmetrically for v.
fn normalized_product_derivs(u: V, v: V, kind: ProductKind) -> (f64, SegmentPairDerivs) {
    let nu = floored(u.magnitude());
    let nv = floored(v.magnitude());
    let nu2 = nu * nu;
    let nv2 = nv * nv;
    let a = 1.0 / (nu * nv);

    // s, ds/du, ds/dv, and the constant d²s/du_i dv_j matrix.
    let (s, s_u, s_v, s_uv): (f64, V, V, M2) = match kind {
        ProductKind::Cross => (
            u.cross_2d(&v),
            V::new(v.y, -v.x),
            V::new(-u.y, u.x),
            [[0.0, 1.0], [-1.0, 0.0]],
        ),
        ProductKind::Dot => (u.dot(&v), v, u, [[1.0, 0.0], [0.0, 1.0]]),
    };

    let g = s * a;

    let grad_u = V::new(
        a * (s_u.x - s * u.x / nu2),
        a * (s_u.y - s * u.y / nu2),
    );
    let grad_v = V::new(
        a * (s_v.x - s * v.x / nv2),
        a * (s_v.y - s * v.y / nv2),
    );

    let mut h_uu = M2_ZERO;
    let mut h_vv = M2_ZERO;
    let mut h_uv = M2_ZERO;
    for i in 0..2 {
        for j in 0..2 {
            let delta = if i == j { 1.0 } else { 0.0 };
            let (ui, uj) = (u.component(i), u.component(j));
            let (vi, vj) = (v.component(i), v.component(j));
            h_uu[i][j] = a
                * (-(s_u.component(i) * uj + s_u.component(j) * ui) / nu2
                    + s * (3.0 * ui * uj / (nu2 * nu2) - delta / nu2));
            h_vv[i][j] = a
                * (-(s_v.component(i) * vj + s_v.component(j) * vi) / nv2
                    + s * (3.0 * vi * vj / (nv2 * nv2) - delta / nv2));
            h_uv[i][j] = a
                * (s_uv[i][j] - s_u.component(i) * vj / nv2 - s_v.component(j) * ui / nu2
                    + s * ui * vj / (nu2 * nv2));
        }
    }

    (
        g,
        SegmentPairDerivs {
            grad_u,
            grad_v,
            h_uu,
            h_uv,
            h_vv,
        },
    )
}

/// Derivatives of g = u[axis] / |u| (vertical uses axis = 0, horizontal
/// axis = 1).
///
/// With basis vector e for the axis and c = u[axis]:
///   dg/du_j       = (e_j - c u_j/|u|²) / |u|
///   d²g/du_i du_j = -(e_j u_i + e_i u_j + c δij)/|u|³ + 3 c u_i u_j/|u|⁵
fn normalized_component_derivs(u: V, axis: usize) -> (f64, V, M2) {
    let nu = floored(u.magnitude());
    let nu2 = nu * nu;
    let nu3 = nu2 * nu;
    let nu5 = nu3 * nu2;
    let c = u.component(axis);

    let g = c / nu;
    let e = |i: usize| if i == axis { 1.0 } else { 0.0 };

    let grad_u = V::new(
        (e(0) - c * u.x / nu2) / nu,
        (e(1) - c * u.y / nu2) / nu,
    );

    let mut h_uu = M2_ZERO;
    for i in 0..2 {
        for j in 0..2 {
            let delta = if i == j { 1.0 } else { 0.0 };
            let (ui, uj) = (u.component(i), u.component(j));
            h_uu[i][j] = -(e(j) * ui + e(i) * uj + c * delta) / nu3 + 3.0 * c * ui * uj / nu5;
        }
    }

    (g, grad_u, h_uu)
}

impl ConstraintKind {
    /// How many residual rows (equations) this constraint contributes.
    pub(crate) fn residual_dim(&self) -> usize {
        match self {
            ConstraintKind::Coincident { .. } | ConstraintKind::FixPoint { .. } => 2,
            ConstraintKind::Distance { .. }
            | ConstraintKind::Parallel { .. }
            | ConstraintKind::Perpendicular { .. }
            | ConstraintKind::Vertical { .. }
            | ConstraintKind::Horizontal { .. }
            | ConstraintKind::Angle { .. }
            | ConstraintKind::PointOnLine { .. } => 1,
        }
    }

    /// How close is this constraint to being satisfied at the current
    /// trial coordinates? Writes one value per residual row; rows beyond
    /// [`Self::residual_dim`] are left untouched. Unweighted: the caller
    /// applies the constraint's weight.
    pub(crate) fn residual(&self, ctx: &EvalContext<'_>, residual0: &mut f64, residual1: &mut f64) {
        match self {
            ConstraintKind::Coincident { a, b } => {
                let a = ctx.point(a);
                let b = ctx.point(b);
                *residual0 = a.pos.x - b.pos.x;
                *residual1 = a.pos.y - b.pos.y;
            }
            ConstraintKind::Distance { a, b, distance } => {
                let a = ctx.point(a);
                let b = ctx.point(b);
                *residual0 = (a.pos - b.pos).magnitude() - distance;
            }
            ConstraintKind::FixPoint { p, x, y } => {
                let target = ctx.fix_target(p, *x, *y);
                let p = ctx.point(p);
                *residual0 = p.pos.x - target.x;
                *residual1 = p.pos.y - target.y;
            }
            ConstraintKind::Parallel { a, b } => {
                let (a1, a2) = ctx.segment_endpoints(a);
                let (b1, b2) = ctx.segment_endpoints(b);
                let u = a2.pos - a1.pos;
                let v = b2.pos - b1.pos;
                *residual0 = u.cross_2d(&v) / (floored(u.magnitude()) * floored(v.magnitude()));
            }
            ConstraintKind::Perpendicular { a, b } => {
                let (a1, a2) = ctx.segment_endpoints(a);
                let (b1, b2) = ctx.segment_endpoints(b);
                let u = a2.pos - a1.pos;
                let v = b2.pos - b1.pos;
                *residual0 = u.dot(&v) / (floored(u.magnitude()) * floored(v.magnitude()));
            }
            ConstraintKind::Vertical { segment } => {
                let (p1, p2) = ctx.segment_endpoints(segment);
                let u = p2.pos - p1.pos;
                *residual0 = u.x / floored(u.magnitude());
            }
            ConstraintKind::Horizontal { segment } => {
                let (p1, p2) = ctx.segment_endpoints(segment);
                let u = p2.pos - p1.pos;
                *residual0 = u.y / floored(u.magnitude());
            }
            ConstraintKind::Angle { a, b, angle } => {
                let (a1, a2) = ctx.segment_endpoints(a);
                let (b1, b2) = ctx.segment_endpoints(b);
                let u = a2.pos - a1.pos;
                let v = b2.pos - b1.pos;
                let current = libm::atan2(u.cross_2d(&v), u.dot(&v));
                *residual0 = wrap_to_pi(current - angle);
            }
            ConstraintKind::PointOnLine { p, segment } => {
                let p = ctx.point(p);
                let (a, b) = ctx.segment_endpoints(segment);
                let u = b.pos - a.pos;
                let w = p.pos - a.pos;
                *residual0 = u.cross_2d(&w) / floored(u.magnitude());
            }
        }
    }

    /// Exact first and second derivatives of each residual row with
    /// respect to the coordinate unknowns, at the current trial
    /// coordinates. One [`DerivRow`] per residual row; rows beyond
    /// [`Self::residual_dim`] are left empty. Unweighted, like
    /// [`Self::residual`].
    pub(crate) fn derivative_rows(
        &self,
        ctx: &EvalContext<'_>,
        row0: &mut DerivRow,
        row1: &mut DerivRow,
    ) {
        match self {
            ConstraintKind::Coincident { a, b } => {
                // R0 = ax - bx, R1 = ay - by. Linear, no curvature.
                let a = ctx.point(a);
                let b = ctx.point(b);
                row0.push_grad(&a, 0, 1.0);
                row0.push_grad(&b, 0, -1.0);
                row1.push_grad(&a, 1, 1.0);
                row1.push_grad(&b, 1, -1.0);
            }
            ConstraintKind::Distance { a, b, .. } => {
                // R = ‖A - B‖ - d. With e = A - B, L = ‖e‖, ê = e/L:
                // dR/dA = ê, dR/dB = -ê
                // d²R/dA² = (I - êêᵀ)/L, with the A-B cross blocks negated.
                let a = ctx.point(a);
                let b = ctx.point(b);
                let e = a.pos - b.pos;
                let l = floored(e.magnitude());
                let ex = e.x / l;
                let ey = e.y / l;

                row0.push_grad(&a, 0, ex);
                row0.push_grad(&a, 1, ey);
                row0.push_grad(&b, 0, -ex);
                row0.push_grad(&b, 1, -ey);

                let proj: M2 = [
                    [(1.0 - ex * ex) / l, -ex * ey / l],
                    [-ex * ey / l, (1.0 - ey * ey) / l],
                ];
                row0.push_block(&a, &a, proj);
                row0.push_block(&a, &b, m2_scale(proj, -1.0));
                row0.push_block(&b, &a, m2_scale(proj, -1.0));
                row0.push_block(&b, &b, proj);
            }
            ConstraintKind::FixPoint { p, .. } => {
                // R0 = px - x0, R1 = py - y0. Linear, no curvature.
                let p = ctx.point(p);
                row0.push_grad(&p, 0, 1.0);
                row1.push_grad(&p, 1, 1.0);
            }
            ConstraintKind::Parallel { a, b } => {
                let (a1, a2) = ctx.segment_endpoints(a);
                let (b1, b2) = ctx.segment_endpoints(b);
                let u = a2.pos - a1.pos;
                let v = b2.pos - b1.pos;
                let (_, derivs) = normalized_product_derivs(u, v, ProductKind::Cross);
                scatter_two_segments(row0, (&a1, &a2), (&b1, &b2), &derivs);
            }
            ConstraintKind::Perpendicular { a, b } => {
                let (a1, a2) = ctx.segment_endpoints(a);
                let (b1, b2) = ctx.segment_endpoints(b);
                let u = a2.pos - a1.pos;
                let v = b2.pos - b1.pos;
                let (_, derivs) = normalized_product_derivs(u, v, ProductKind::Dot);
                scatter_two_segments(row0, (&a1, &a2), (&b1, &b2), &derivs);
            }
            ConstraintKind::Vertical { segment } => {
                let (p1, p2) = ctx.segment_endpoints(segment);
                let (_, grad_u, h_uu) = normalized_component_derivs(p2.pos - p1.pos, 0);
                scatter_one_segment(row0, (&p1, &p2), grad_u, h_uu);
            }
            ConstraintKind::Horizontal { segment } => {
                let (p1, p2) = ctx.segment_endpoints(segment);
                let (_, grad_u, h_uu) = normalized_component_derivs(p2.pos - p1.pos, 1);
                scatter_one_segment(row0, (&p1, &p2), grad_u, h_uu);
            }
            ConstraintKind::Angle { a, b, .. } => {
                // R = atan2(u x v, u · v) - θ (wrapped). The target angle
                // has zero derivative, and wrapping shifts by constants.
                // dR/du = ( uy, -ux)/|u|²
                // dR/dv = (-vy,  vx)/|v|²
                // d²R/du² = [[-2 ux uy, ux² - uy²], [ux² - uy², 2 ux uy]]/|u|⁴
                // d²R/dv² is the same pattern in v, negated; d²R/du dv = 0.
                let (a1, a2) = ctx.segment_endpoints(a);
                let (b1, b2) = ctx.segment_endpoints(b);
                let u = a2.pos - a1.pos;
                let v = b2.pos - b1.pos;
                let nu = floored(u.magnitude());
                let nv = floored(v.magnitude());
                let nu2 = nu * nu;
                let nv2 = nv * nv;
                let nu4 = nu2 * nu2;
                let nv4 = nv2 * nv2;

                let derivs = SegmentPairDerivs {
                    grad_u: V::new(u.y / nu2, -u.x / nu2),
                    grad_v: V::new(-v.y / nv2, v.x / nv2),
                    h_uu: [
                        [-2.0 * u.x * u.y / nu4, (u.x * u.x - u.y * u.y) / nu4],
                        [(u.x * u.x - u.y * u.y) / nu4, 2.0 * u.x * u.y / nu4],
                    ],
                    h_uv: M2_ZERO,
                    h_vv: [
                        [2.0 * v.x * v.y / nv4, (v.y * v.y - v.x * v.x) / nv4],
                        [(v.y * v.y - v.x * v.x) / nv4, -2.0 * v.x * v.y / nv4],
                    ],
                };
                scatter_two_segments(row0, (&a1, &a2), (&b1, &b2), &derivs);
            }
            ConstraintKind::PointOnLine { p, segment } => {
                // R = (u x w)/‖u‖ with u = B - A, w = P - A.
                // With c = u x w, c_u = (wy, -wx), q = (-uy, ux):
                // dR/dw   = q/‖u‖
                // dR/du_j = c_u_j/‖u‖ - c u_j/‖u‖³
                // d²R/dw² = 0
                // d²R/du_i du_j = -(c_u_j u_i + c_u_i u_j + c δij)/‖u‖³
                //                 + 3 c u_i u_j/‖u‖⁵
                // d²R/du_i dw_j = (dq_j/du_i)/‖u‖ - q_j u_i/‖u‖³
                // A appears in both u and w, so its chain-rule
                // coefficients are (-1, -1); B is (+1, 0); P is (0, +1).
                let p = ctx.point(p);
                let (a, b) = ctx.segment_endpoints(segment);
                let u = b.pos - a.pos;
                let w = p.pos - a.pos;
                let nu = floored(u.magnitude());
                let nu2 = nu * nu;
                let nu3 = nu2 * nu;
                let nu5 = nu3 * nu2;
                let c = u.cross_2d(&w);
                let c_u = V::new(w.y, -w.x);
                let q = V::new(-u.y, u.x);

                let grad_u = V::new(
                    c_u.x / nu - c * u.x / nu3,
                    c_u.y / nu - c * u.y / nu3,
                );
                let grad_w = V::new(q.x / nu, q.y / nu);

                let mut h_uu = M2_ZERO;
                let mut h_uw = M2_ZERO;
                // dq_j/du_i: q = (-uy, ux), so dq_x/du_y = -1, dq_y/du_x = 1.
                let q_u: M2 = [[0.0, 1.0], [-1.0, 0.0]];
                for i in 0..2 {
                    for j in 0..2 {
                        let delta = if i == j { 1.0 } else { 0.0 };
                        let (ui, uj) = (u.component(i), u.component(j));
                        h_uu[i][j] = -(c_u.component(j) * ui + c_u.component(i) * uj + c * delta)
                            / nu3
                            + 3.0 * c * ui * uj / nu5;
                        h_uw[i][j] = q_u[i][j] / nu - q.component(j) * ui / nu3;
                    }
                }

                // (point, u coefficient, w coefficient)
                let involved = [(&a, -1.0, -1.0), (&b, 1.0, 0.0), (&p, 0.0, 1.0)];
                for (pt, cu, cw) in involved {
                    row0.push_grad(pt, 0, cu * grad_u.x + cw * grad_w.x);
                    row0.push_grad(pt, 1, cu * grad_u.y + cw * grad_w.y);
                }
                for (pt, cu_p, cw_p) in involved {
                    for (qt, cu_q, cw_q) in involved {
                        let mut block = m2_scale(h_uu, cu_p * cu_q);
                        for i in 0..2 {
                            for j in 0..2 {
                                block[i][j] += cu_p * cw_q * h_uw[i][j];
                                block[i][j] += cw_p * cu_q * h_uw[j][i];
                            }
                        }
                        row0.push_block(pt, qt, block);
                    }
                }
            }
        }
    }
}

/// Scatter single-segment derivatives (vertical/horizontal) onto the
/// segment's endpoints, applying the u = P2 - P1 chain-rule signs.
fn scatter_one_segment(
    row: &mut DerivRow,
    ends: (&ResolvedPoint, &ResolvedPoint),
    grad_u: V,
    h_uu: M2,
) {
    let side = [(ends.0, -1.0), (ends.1, 1.0)];
    for (p, sign) in side {
        row.push_grad(p, 0, sign * grad_u.x);
        row.push_grad(p, 1, sign * grad_u.y);
    }
    for (p, sp) in side {
        for (q, sq) in side {
            row.push_block(p, q, m2_scale(h_uu, sp * sq));
        }
    }
}
