//! MPDATA kernels
//!
//! Every kernel evaluates one stage over the whole grid from inputs that are
//! fixed for the duration of the stage, so cells and faces are computed
//! independently (rows in parallel through [`Layout`]).
//!
//! # Notation
//!
//! Face `f` of the component normal to axis `a` separates cells `L = f - 1`
//! and `R = f`. `c` is the generalised Courant number on that face from the
//! previous pass, `g` the g-factor averaged onto the face (1 without a
//! g-factor) and `frac(n, d)` is `n / d`, or zero when `d <= epsilon`.
//!
//! # References
//!
//! - Smolarkiewicz (1984) "A fully multidimensional positive definite advection
//!   transport algorithm with small implicit diffusion"
//! - Smolarkiewicz & Grabowski (1990) "The multidimensional positive definite
//!   advection transport algorithm: nonoscillatory option"
//! - Margolin & Smolarkiewicz (1998) "Antidiffusive velocities for
//!   multipass donor cell advection"

use crate::arakawa_c::{shift, Layout, ScalarField, VectorField};

/// Which optional terms enter an antidiffusive pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CorrectionTerms {
    /// Divergent-flow term
    pub divergent_flow: bool,
    /// Third-order terms
    pub third_order_terms: bool,
    /// Scale by the face-averaged g-factor
    pub non_unit_g_factor: bool,
}

/// Donor-cell flux through a face
#[inline]
pub(crate) fn donor_flux(c: f64, psi_l: f64, psi_r: f64) -> f64 {
    c.max(0.0) * psi_l + c.min(0.0) * psi_r
}

/// Ratio with a clamped denominator
#[inline]
pub(crate) fn frac(num: f64, den: f64, epsilon: f64) -> f64 {
    if den > epsilon {
        num / den
    } else {
        0.0
    }
}

/// Donor-cell update: `psi - div(F) / G` written into the physical part of `out`
pub(crate) fn upwind(psi: &ScalarField, gc: &VectorField, g_factor: Option<&ScalarField>, out: &mut [f64]) {
    let ndim = psi.grid().ndim();
    psi.layout().fill_region(out, 0, |i, j| {
        let centre = psi.at(i, j);
        let mut flux_divergence = 0.0;
        for axis in 0..ndim {
            let component = gc.comp(axis);
            let (ri, rj) = shift(i, j, axis, 1);
            let (li, lj) = shift(i, j, axis, -1);
            let right = donor_flux(component.at(ri, rj), centre, psi.at(ri, rj));
            let left = donor_flux(component.at(i, j), psi.at(li, lj), centre);
            flux_divergence += right - left;
        }
        let g = g_factor.map_or(1.0, |g| g.at(i, j));
        centre - flux_divergence / g
    });
}

/// Face-averaged g-factor between cells `(li, lj)` and `(i, j)`
#[inline]
fn g_bar(g_factor: Option<&ScalarField>, terms: CorrectionTerms, l: (isize, isize), r: (isize, isize)) -> f64 {
    match g_factor {
        Some(g) if terms.non_unit_g_factor => 0.5 * (g.at(l.0, l.1) + g.at(r.0, r.1)),
        _ => 1.0,
    }
}

/// Antidiffusive pseudo-velocity on face `(i, j)` of the component normal to `axis`
///
/// ```text
/// v = (|c| - c^2/g) A                                   (along-axis)
///   - 0.5 c/g cbar B                                    (2D cross term)
///   - 0.25 c/g (c[f+1] - c[f-1] + transverse div)       (divergent flow)
///   + (3c|c|/g - 2c^3/g^2 - c)/3 A3                     (third order)
/// ```
#[inline]
fn antidiffusive_face(
    psi: &ScalarField,
    gc: &VectorField,
    g_factor: Option<&ScalarField>,
    terms: CorrectionTerms,
    epsilon: f64,
    axis: usize,
    i: isize,
    j: isize,
) -> f64 {
    let ndim = psi.grid().ndim();
    let own = gc.comp(axis);
    let c = own.at(i, j);
    let right = (i, j);
    let left = shift(i, j, axis, -1);
    let psi_r = psi.at(right.0, right.1);
    let psi_l = psi.at(left.0, left.1);
    let g = g_bar(g_factor, terms, left, right);

    let a = frac(psi_r - psi_l, psi_r + psi_l, epsilon);
    let mut v = (c.abs() - c * c / g) * a;

    if ndim == 2 {
        let b = 1 - axis;
        let cross = gc.comp(b);
        let lp = shift(left.0, left.1, b, 1);
        let lm = shift(left.0, left.1, b, -1);
        let rp = shift(right.0, right.1, b, 1);
        let rm = shift(right.0, right.1, b, -1);
        let (psi_lp, psi_lm) = (psi.at(lp.0, lp.1), psi.at(lm.0, lm.1));
        let (psi_rp, psi_rm) = (psi.at(rp.0, rp.1), psi.at(rm.0, rm.1));
        let b_ratio = frac(
            psi_rp + psi_lp - psi_rm - psi_lm,
            psi_rp + psi_lp + psi_rm + psi_lm,
            epsilon,
        );
        // Transverse faces bounding L and R: lower face shares the cell index
        let c_bar = 0.25
            * (cross.at(left.0, left.1)
                + cross.at(lp.0, lp.1)
                + cross.at(right.0, right.1)
                + cross.at(rp.0, rp.1));
        v -= 0.5 * c / g * c_bar * b_ratio;
    }

    if terms.divergent_flow {
        let next = shift(i, j, axis, 1);
        let mut div = own.at(next.0, next.1) - own.at(left.0, left.1);
        if ndim == 2 {
            let b = 1 - axis;
            let cross = gc.comp(b);
            let lp = shift(left.0, left.1, b, 1);
            let rp = shift(right.0, right.1, b, 1);
            div += cross.at(rp.0, rp.1) - cross.at(right.0, right.1) + cross.at(lp.0, lp.1)
                - cross.at(left.0, left.1);
        }
        v -= 0.25 * c / g * div;
    }

    if terms.third_order_terms {
        let rr = shift(right.0, right.1, axis, 1);
        let ll = shift(left.0, left.1, axis, -1);
        let psi_rr = psi.at(rr.0, rr.1);
        let psi_ll = psi.at(ll.0, ll.1);
        let coeff = (3.0 * c * c.abs() / g - 2.0 * c.powi(3) / (g * g) - c) / 3.0;
        v += coeff
            * frac(
                psi_rr - psi_r - psi_l + psi_ll,
                psi_rr + psi_r + psi_l + psi_ll,
                epsilon,
            );
    }

    v
}

/// Antidiffusive velocity for the next pass, written into the physical faces of `out`
pub(crate) fn antidiffusive_velocity(
    psi: &ScalarField,
    gc: &VectorField,
    g_factor: Option<&ScalarField>,
    terms: CorrectionTerms,
    epsilon: f64,
    out: &mut VectorField,
) {
    for axis in 0..psi.grid().ndim() {
        let component = out.comp_mut(axis);
        let layout = *component.layout();
        layout.fill_region(component.data_mut(), 0, |i, j| {
            antidiffusive_face(psi, gc, g_factor, terms, epsilon, axis, i, j)
        });
    }
}

/// Add the diffusive pseudo-velocity `-2 mu frac(psi_R - psi_L, psi_R + psi_L)`
pub(crate) fn add_diffusive_velocity(psi: &ScalarField, mu_coeff: f64, epsilon: f64, gc: &mut VectorField) {
    for axis in 0..psi.grid().ndim() {
        let component = gc.comp_mut(axis);
        let layout = *component.layout();
        layout.update_region(component.data_mut(), |i, j, c| {
            let (li, lj) = shift(i, j, axis, -1);
            let psi_r = psi.at(i, j);
            let psi_l = psi.at(li, lj);
            c - 2.0 * mu_coeff * frac(psi_r - psi_l, psi_r + psi_l, epsilon)
        });
    }
}

/// Min and max over the cross-shaped neighbourhood of `(i, j)` in both fields
#[inline]
fn local_extrema(psi: &ScalarField, psi_initial: &ScalarField, i: isize, j: isize) -> (f64, f64) {
    let mut lo = psi.at(i, j).min(psi_initial.at(i, j));
    let mut hi = psi.at(i, j).max(psi_initial.at(i, j));
    for axis in 0..psi.grid().ndim() {
        for d in [-1, 1] {
            let (ni, nj) = shift(i, j, axis, d);
            for v in [psi.at(ni, nj), psi_initial.at(ni, nj)] {
                lo = lo.min(v);
                hi = hi.max(v);
            }
        }
    }
    (lo, hi)
}

/// Total donor-cell flux into and out of cell `(i, j)`
#[inline]
fn cell_fluxes(psi: &ScalarField, gc: &VectorField, i: isize, j: isize) -> (f64, f64) {
    let centre = psi.at(i, j);
    let mut inflow = 0.0;
    let mut outflow = 0.0;
    for axis in 0..psi.grid().ndim() {
        let component = gc.comp(axis);
        let (li, lj) = shift(i, j, axis, -1);
        let (ri, rj) = shift(i, j, axis, 1);
        let left = donor_flux(component.at(i, j), psi.at(li, lj), centre);
        let right = donor_flux(component.at(ri, rj), centre, psi.at(ri, rj));
        inflow += left.max(0.0) - right.min(0.0);
        outflow += right.max(0.0) - left.min(0.0);
    }
    (inflow, outflow)
}

/// Scratch buffers for the limiter coefficients
#[derive(Debug, Clone)]
pub(crate) struct LimiterBuffers {
    pub(crate) beta_up: Vec<f64>,
    pub(crate) beta_dn: Vec<f64>,
}

impl LimiterBuffers {
    pub(crate) fn new(len: usize) -> Self {
        Self {
            beta_up: vec![1.0; len],
            beta_dn: vec![1.0; len],
        }
    }
}

/// Limiter coefficients `beta_up` / `beta_dn` on physical cells plus one halo layer
///
/// `beta_up` is the fraction of the incoming flux a cell can take without
/// exceeding its local maximum, `beta_dn` the fraction of outgoing flux it can
/// give without dropping below its local minimum. Both are non-negative; a
/// cell with (numerically) no incoming or outgoing flux gets 1.
pub(crate) fn limiter_coefficients(
    psi: &ScalarField,
    psi_initial: &ScalarField,
    gc: &VectorField,
    g_factor: Option<&ScalarField>,
    epsilon: f64,
    buffers: &mut LimiterBuffers,
) {
    let layout = psi.layout();
    let g_at = |i: isize, j: isize| g_factor.map_or(1.0, |g| g.at(i, j));
    layout.fill_region(&mut buffers.beta_up, 1, |i, j| {
        let (_, hi) = local_extrema(psi, psi_initial, i, j);
        let (inflow, _) = cell_fluxes(psi, gc, i, j);
        if inflow > epsilon {
            ((hi - psi.at(i, j)) * g_at(i, j) / inflow).max(0.0)
        } else {
            1.0
        }
    });
    layout.fill_region(&mut buffers.beta_dn, 1, |i, j| {
        let (lo, _) = local_extrema(psi, psi_initial, i, j);
        let (_, outflow) = cell_fluxes(psi, gc, i, j);
        if outflow > epsilon {
            ((psi.at(i, j) - lo) * g_at(i, j) / outflow).max(0.0)
        } else {
            1.0
        }
    });
}

/// Scale each face velocity by `min(1, beta_dn(donor), beta_up(receiver))`
pub(crate) fn limit_fluxes(gc: &mut VectorField, scalar_layout: &Layout, buffers: &LimiterBuffers) {
    let ndim = gc.grid().ndim();
    for axis in 0..ndim {
        let component = gc.comp_mut(axis);
        let layout = *component.layout();
        layout.update_region(component.data_mut(), |i, j, c| {
            let (li, lj) = shift(i, j, axis, -1);
            let l = scalar_layout.idx(li, lj);
            let r = scalar_layout.idx(i, j);
            let factor = if c > 0.0 {
                buffers.beta_dn[l].min(buffers.beta_up[r])
            } else {
                buffers.beta_up[l].min(buffers.beta_dn[r])
            };
            c * factor.min(1.0)
        });
    }
}
