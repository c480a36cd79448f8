//! Single-qubit gate algebra shared by translation and optimization.
//!
//! Every one-qubit standard gate is `e^{i*phase} * U(theta, phi, lambda)`
//! for some angles; passes work in that canonical form and re-emit
//! either a `u` gate or the rz/sx sequence
//!
//! ```text
//! U(t, p, l) = e^{i(pi+p+l)/2} RZ(p+pi) SX RZ(t+pi) SX RZ(l)
//! ```
//!
//! depending on the basis.

use num_complex::Complex64;
use std::f64::consts::PI;
use svalin_ir::StandardGate;

pub(crate) const ANGLE_TOL: f64 = 1e-10;

/// 2x2 complex matrix, row major.
pub(crate) type Matrix2 = [[Complex64; 2]; 2];

/// Canonical `(theta, phi, lambda, phase)` form of a one-qubit gate.
pub(crate) fn u_params(gate: &StandardGate) -> Option<(f64, f64, f64, f64)> {
    let half = PI / 2.0;
    Some(match *gate {
        StandardGate::I => (0.0, 0.0, 0.0, 0.0),
        StandardGate::X => (PI, 0.0, PI, 0.0),
        StandardGate::Y => (PI, half, half, 0.0),
        StandardGate::Z => (0.0, 0.0, PI, 0.0),
        StandardGate::H => (half, 0.0, PI, 0.0),
        StandardGate::S => (0.0, 0.0, half, 0.0),
        StandardGate::Sdg => (0.0, 0.0, -half, 0.0),
        StandardGate::T => (0.0, 0.0, PI / 4.0, 0.0),
        StandardGate::Tdg => (0.0, 0.0, -PI / 4.0, 0.0),
        StandardGate::SX => (half, -half, half, PI / 4.0),
        StandardGate::SXdg => (-half, -half, half, -PI / 4.0),
        StandardGate::Rx(t) => (t, -half, half, 0.0),
        StandardGate::Ry(t) => (t, 0.0, 0.0, 0.0),
        StandardGate::Rz(t) => (0.0, 0.0, t, -t / 2.0),
        StandardGate::P(t) => (0.0, 0.0, t, 0.0),
        StandardGate::U(t, p, l) => (t, p, l, 0.0),
        _ => return None,
    })
}

/// Matrix of `U(theta, phi, lambda)`.
pub(crate) fn u_matrix(theta: f64, phi: f64, lambda: f64) -> Matrix2 {
    let c = Complex64::new((theta / 2.0).cos(), 0.0);
    let s = Complex64::new((theta / 2.0).sin(), 0.0);
    let el = Complex64::from_polar(1.0, lambda);
    let ep = Complex64::from_polar(1.0, phi);
    [[c, -el * s], [ep * s, ep * el * c]]
}

/// Full matrix of a one-qubit gate, global phase included.
pub(crate) fn gate_matrix(gate: &StandardGate) -> Option<Matrix2> {
    let (t, p, l, phase) = u_params(gate)?;
    let g = Complex64::from_polar(1.0, phase);
    let m = u_matrix(t, p, l);
    Some([[g * m[0][0], g * m[0][1]], [g * m[1][0], g * m[1][1]]])
}

/// Matrix product `a * b`.
pub(crate) fn matmul(a: &Matrix2, b: &Matrix2) -> Matrix2 {
    let mut out = [[Complex64::new(0.0, 0.0); 2]; 2];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = a[i][0] * b[0][j] + a[i][1] * b[1][j];
        }
    }
    out
}

/// Decompose a unitary matrix back to `(theta, phi, lambda, phase)`.
pub(crate) fn params_from_matrix(m: &Matrix2) -> (f64, f64, f64, f64) {
    let abs00 = m[0][0].norm();
    let abs10 = m[1][0].norm();
    let theta = 2.0 * abs10.atan2(abs00);

    if abs10 < ANGLE_TOL {
        // Diagonal: phases only.
        let phase = m[0][0].arg();
        let lambda = m[1][1].arg() - phase;
        return (0.0, 0.0, wrap_angle(lambda), phase);
    }
    if abs00 < ANGLE_TOL {
        // Anti-diagonal: theta = pi, lambda folded to zero.
        let phase = (-m[0][1]).arg();
        let phi = m[1][0].arg() - phase;
        return (PI, wrap_angle(phi), 0.0, phase);
    }

    let phase = m[0][0].arg();
    let phi = m[1][0].arg() - phase;
    let lambda = m[1][1].arg() - phase - phi;
    (theta, wrap_angle(phi), wrap_angle(lambda), phase)
}

/// Wrap an angle into `(-pi, pi]`.
pub(crate) fn wrap_angle(angle: f64) -> f64 {
    let two_pi = 2.0 * PI;
    let mut a = angle % two_pi;
    if a <= -PI {
        a += two_pi;
    } else if a > PI {
        a -= two_pi;
    }
    a
}

/// Express `e^{i*phase} U(theta, phi, lambda)` in the given basis.
///
/// Returns the gate sequence in circuit order and the global phase the
/// caller must add, or `None` when the basis has neither `u` nor the
/// rz/sx pair.
pub(crate) fn emit_1q(
    theta: f64,
    phi: f64,
    lambda: f64,
    phase: f64,
    basis_has: impl Fn(&str) -> bool,
) -> Option<(Vec<StandardGate>, f64)> {
    if theta.abs() < ANGLE_TOL {
        let total = wrap_angle(phi + lambda);
        if total.abs() < ANGLE_TOL {
            return Some((vec![], phase));
        }
        if basis_has("rz") {
            return Some((vec![StandardGate::Rz(total)], phase + total / 2.0));
        }
        if basis_has("u") {
            return Some((vec![StandardGate::U(0.0, 0.0, total)], phase));
        }
        return None;
    }

    if basis_has("u") {
        return Some((vec![StandardGate::U(theta, phi, lambda)], phase));
    }
    if basis_has("rz") && basis_has("sx") {
        let gates = vec![
            StandardGate::Rz(lambda),
            StandardGate::SX,
            StandardGate::Rz(theta + PI),
            StandardGate::SX,
            StandardGate::Rz(phi + PI),
        ];
        return Some((gates, phase + (PI + phi + lambda) / 2.0));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: &Matrix2, b: &Matrix2) -> bool {
        a.iter()
            .flatten()
            .zip(b.iter().flatten())
            .all(|(x, y)| (x - y).norm() < 1e-9)
    }

    fn sequence_matrix(gates: &[StandardGate], phase: f64) -> Matrix2 {
        let mut m = [
            [Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)],
            [Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0)],
        ];
        // Circuit order: later gates multiply from the left.
        for g in gates {
            m = matmul(&gate_matrix(g).unwrap(), &m);
        }
        let p = Complex64::from_polar(1.0, phase);
        [[p * m[0][0], p * m[0][1]], [p * m[1][0], p * m[1][1]]]
    }

    #[test]
    fn test_gate_matrices_are_unitary() {
        let gates = [
            StandardGate::H,
            StandardGate::SX,
            StandardGate::SXdg,
            StandardGate::T,
            StandardGate::Rx(0.3),
            StandardGate::Rz(1.1),
            StandardGate::U(0.5, 1.0, -0.7),
        ];
        for g in &gates {
            let m = gate_matrix(g).unwrap();
            let det = m[0][0] * m[1][1] - m[0][1] * m[1][0];
            assert!((det.norm() - 1.0).abs() < 1e-9, "{g:?}");
        }
    }

    #[test]
    fn test_zsx_identity() {
        for &(t, p, l) in &[
            (0.4, 0.9, -1.3),
            (PI / 2.0, 0.0, PI),
            (PI, 0.5, 0.0),
            (2.0, -2.0, 2.5),
        ] {
            let target = u_matrix(t, p, l);
            let (gates, phase) = emit_1q(t, p, l, 0.0, |n| n == "rz" || n == "sx").unwrap();
            let got = sequence_matrix(&gates, phase);
            assert!(approx(&got, &target), "theta={t} phi={p} lambda={l}");
        }
    }

    #[test]
    fn test_diagonal_shortcut() {
        let (gates, phase) = emit_1q(0.0, 0.3, 0.4, 0.0, |n| n == "rz").unwrap();
        assert_eq!(gates.len(), 1);
        let got = sequence_matrix(&gates, phase);
        assert!(approx(&got, &u_matrix(0.0, 0.3, 0.4)));
    }

    #[test]
    fn test_roundtrip_through_matrix() {
        for g in [
            StandardGate::H,
            StandardGate::X,
            StandardGate::SX,
            StandardGate::Ry(0.8),
            StandardGate::Rz(-2.1),
        ] {
            let m = gate_matrix(&g).unwrap();
            let (t, p, l, phase) = params_from_matrix(&m);
            let g2 = Complex64::from_polar(1.0, phase);
            let rebuilt = u_matrix(t, p, l);
            let rebuilt = [
                [g2 * rebuilt[0][0], g2 * rebuilt[0][1]],
                [g2 * rebuilt[1][0], g2 * rebuilt[1][1]],
            ];
            assert!(approx(&rebuilt, &m), "{g:?}");
        }
    }

    #[test]
    fn test_identity_collapses_to_nothing() {
        let (gates, _) = emit_1q(0.0, 0.0, 0.0, 0.5, |_| true).unwrap();
        assert!(gates.is_empty());
    }
}
