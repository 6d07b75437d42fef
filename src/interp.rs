//! Constraint curve interpolation.
//!
//! Requirement tables express each continuous constraint as sampled
//! (property_value, score) points. Monotonic curves are evaluated with a
//! shape-preserving piecewise cubic Hermite (PCHIP, Fritsch–Carlson
//! derivatives); non-monotonic curves (pH optima and the like) fall back to
//! piecewise linear. Both extrapolate linearly off the ends using the
//! nearest interval's secant, and every evaluation is clamped to [0, 100].
//!
//! GAEZ v4 reference: Model Documentation, ch. 4 (soil quality evaluation
//! of profile attributes).

use crate::error::{Result, ScoringError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CurveKind {
    /// Shape-preserving cubic, used when y is monotonic in x.
    Pchip,
    /// Piecewise linear fallback for non-monotonic tables.
    Linear,
}

/// A callable score-vs-property curve.
#[derive(Debug, Clone)]
pub struct ConstraintCurve {
    xs: Vec<f64>,
    ys: Vec<f64>,
    kind: CurveKind,
    /// Hermite endpoint derivatives, one per knot (PCHIP only).
    derivs: Vec<f64>,
}

impl ConstraintCurve {
    /// Build a curve from points sorted ascending by x.
    pub fn new(points: &[(f64, f64)]) -> Result<ConstraintCurve> {
        if points.is_empty() {
            return Err(ScoringError::InvalidRequirement(
                "constraint curve has no points".to_string(),
            ));
        }
        if points.len() < 2 {
            return Err(ScoringError::InvalidRequirement(
                "constraint curve needs at least 2 points".to_string(),
            ));
        }
        for pair in points.windows(2) {
            if pair[1].0 <= pair[0].0 {
                return Err(ScoringError::InvalidRequirement(format!(
                    "constraint curve x values not strictly increasing ({} then {})",
                    pair[0].0, pair[1].0
                )));
            }
        }

        let xs: Vec<f64> = points.iter().map(|p| p.0).collect();
        let ys: Vec<f64> = points.iter().map(|p| p.1).collect();

        let secants: Vec<f64> = (0..xs.len() - 1)
            .map(|i| (ys[i + 1] - ys[i]) / (xs[i + 1] - xs[i]))
            .collect();
        let monotonic =
            secants.iter().all(|d| *d >= 0.0) || secants.iter().all(|d| *d <= 0.0);

        let (kind, derivs) = if monotonic {
            (CurveKind::Pchip, pchip_derivatives(&xs, &secants))
        } else {
            (CurveKind::Linear, Vec::new())
        };

        Ok(ConstraintCurve { xs, ys, kind, derivs })
    }

    /// Evaluate at an arbitrary property value; result clamped to [0, 100].
    pub fn evaluate(&self, x: f64) -> f64 {
        let n = self.xs.len();

        // Linear extrapolation off either end with the end interval's secant.
        let raw = if x <= self.xs[0] {
            let slope = (self.ys[1] - self.ys[0]) / (self.xs[1] - self.xs[0]);
            self.ys[0] + slope * (x - self.xs[0])
        } else if x >= self.xs[n - 1] {
            let slope = (self.ys[n - 1] - self.ys[n - 2]) / (self.xs[n - 1] - self.xs[n - 2]);
            self.ys[n - 1] + slope * (x - self.xs[n - 1])
        } else {
            // xs is strictly increasing, so this lands on a real interval.
            let i = self.xs.partition_point(|&knot| knot <= x) - 1;
            let i = i.min(n - 2);
            match self.kind {
                CurveKind::Linear => {
                    let t = (x - self.xs[i]) / (self.xs[i + 1] - self.xs[i]);
                    self.ys[i] + t * (self.ys[i + 1] - self.ys[i])
                }
                CurveKind::Pchip => self.hermite(i, x),
            }
        };

        raw.clamp(0.0, 100.0)
    }

    fn hermite(&self, i: usize, x: f64) -> f64 {
        let h = self.xs[i + 1] - self.xs[i];
        let t = (x - self.xs[i]) / h;
        let t2 = t * t;
        let t3 = t2 * t;

        let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
        let h10 = t3 - 2.0 * t2 + t;
        let h01 = -2.0 * t3 + 3.0 * t2;
        let h11 = t3 - t2;

        h00 * self.ys[i]
            + h10 * h * self.derivs[i]
            + h01 * self.ys[i + 1]
            + h11 * h * self.derivs[i + 1]
    }
}

/// Fritsch–Carlson knot derivatives for a monotonic sample set.
///
/// Interior knots take the weighted harmonic mean of the adjacent secants
/// when those agree in sign, zero otherwise; end knots use the non-centred
/// three-point formula with the standard monotonicity guards.
fn pchip_derivatives(xs: &[f64], secants: &[f64]) -> Vec<f64> {
    let n = xs.len();
    let mut d = vec![0.0; n];

    if n == 2 {
        // Two points: the cubic degenerates to the chord.
        d[0] = secants[0];
        d[1] = secants[0];
        return d;
    }

    for k in 1..n - 1 {
        let s0 = secants[k - 1];
        let s1 = secants[k];
        if s0 * s1 > 0.0 {
            let h0 = xs[k] - xs[k - 1];
            let h1 = xs[k + 1] - xs[k];
            let w1 = 2.0 * h1 + h0;
            let w2 = h1 + 2.0 * h0;
            d[k] = (w1 + w2) / (w1 / s0 + w2 / s1);
        }
    }

    d[0] = edge_derivative(xs[1] - xs[0], xs[2] - xs[1], secants[0], secants[1]);
    d[n - 1] = edge_derivative(
        xs[n - 1] - xs[n - 2],
        xs[n - 2] - xs[n - 3],
        secants[n - 2],
        secants[n - 3],
    );

    d
}

/// Non-centred three-point end derivative with monotonicity guards.
fn edge_derivative(h0: f64, h1: f64, s0: f64, s1: f64) -> f64 {
    let mut d = ((2.0 * h0 + h1) * s0 - h0 * s1) / (h0 + h1);
    if d * s0 <= 0.0 {
        d = 0.0;
    } else if s0 * s1 < 0.0 && d.abs() > 3.0 * s0.abs() {
        d = 3.0 * s0;
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rejects_degenerate_tables() {
        assert!(ConstraintCurve::new(&[]).is_err());
        assert!(ConstraintCurve::new(&[(1.0, 50.0)]).is_err());
        assert!(ConstraintCurve::new(&[(1.0, 50.0), (1.0, 60.0)]).is_err());
        assert!(ConstraintCurve::new(&[(2.0, 50.0), (1.0, 60.0)]).is_err());
    }

    #[test]
    fn test_exact_on_knots() {
        let pts = [(0.0, 0.0), (1.0, 2.0), (2.0, 3.0), (3.0, 5.0), (4.0, 8.0)];
        let curve = ConstraintCurve::new(&pts).unwrap();
        for (x, y) in pts {
            assert_relative_eq!(curve.evaluate(x), y, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_pchip_monotone_between_knots() {
        let pts = [(0.0, 0.0), (1.0, 2.0), (2.0, 3.0), (3.0, 5.0), (4.0, 8.0)];
        let curve = ConstraintCurve::new(&pts).unwrap();

        let mut prev = curve.evaluate(0.0);
        for step in 1..=400 {
            let x = step as f64 * 0.01;
            let y = curve.evaluate(x);
            assert!(y >= prev - 1e-9, "not monotone at x={}", x);
            prev = y;
        }

        // Midpoints stay bracketed by their knots
        for (i, x) in [0.5, 1.5, 2.5, 3.5].iter().enumerate() {
            let y = curve.evaluate(*x);
            assert!(y > pts[i].1 && y < pts[i + 1].1, "x={} y={}", x, y);
        }
    }

    #[test]
    fn test_decreasing_curve() {
        let pts = [(1.1, 100.0), (1.4, 90.0), (1.6, 55.0), (1.8, 20.0)];
        let curve = ConstraintCurve::new(&pts).unwrap();
        assert_relative_eq!(curve.evaluate(1.4), 90.0, epsilon = 1e-9);
        let mid = curve.evaluate(1.5);
        assert!(mid < 90.0 && mid > 55.0);
    }

    #[test]
    fn test_non_monotonic_falls_back_to_linear() {
        // A pH-style optimum curve
        let pts = [(3.5, 0.0), (5.5, 70.0), (6.5, 100.0), (8.5, 45.0)];
        let curve = ConstraintCurve::new(&pts).unwrap();
        // Exactly linear between knots
        assert_relative_eq!(curve.evaluate(4.5), 35.0, epsilon = 1e-9);
        assert_relative_eq!(curve.evaluate(7.5), 72.5, epsilon = 1e-9);
    }

    #[test]
    fn test_extrapolation_and_clamping() {
        let pts = [(0.2, 30.0), (0.6, 55.0), (1.0, 75.0), (2.0, 100.0)];
        let curve = ConstraintCurve::new(&pts).unwrap();
        // Below the first knot: slope 62.5/unit, clamped at 0
        assert_relative_eq!(curve.evaluate(0.1), 30.0 - 62.5 * 0.1, epsilon = 1e-9);
        assert_relative_eq!(curve.evaluate(-1.0), 0.0, epsilon = 1e-9);
        // Above the last knot, clamped at 100
        assert_relative_eq!(curve.evaluate(5.0), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_flat_segments_stay_flat() {
        let pts = [(0.0, 50.0), (1.0, 50.0), (2.0, 80.0)];
        let curve = ConstraintCurve::new(&pts).unwrap();
        assert_relative_eq!(curve.evaluate(0.5), 50.0, epsilon = 1e-9);
    }
}
