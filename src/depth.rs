//! Depth-weighted aggregation of per-horizon scores.
//!
//! Each SQI collapses its per-horizon scores into one component score with
//! a policy-specific weight series over the profile, capped at a depth `D`
//! (100 cm for topsoil-oriented indices, the rooting depth otherwise).
//!
//! GAEZ v4 reference: Model Documentation, ch. 4 (profile attribute
//! weighting).

use smallvec::SmallVec;

use crate::error::{Result, ScoringError};
use crate::soil::Horizon;

/// Weight series; profiles rarely exceed eight horizons.
pub type WeightSeries = SmallVec<[f64; 8]>;

/// Horizon weighting policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightPolicy {
    /// Policy 1: weight by thickness alone.
    Uniform,
    /// Policy 2: thickness scaled by a topsoil-emphasis ramp (1 at the
    /// surface, 0.25 at 100 cm, 0 beyond).
    Topsoil,
    /// Policy 3: mirror of policy 2, rising to 100 cm then constant.
    Subsoil,
    /// Policy 4: thickness scaled by the Gale–Grigal root-density profile
    /// for the component's rooting depth.
    RootZone,
}

impl WeightPolicy {
    pub fn id(&self) -> u8 {
        match self {
            WeightPolicy::Uniform => 1,
            WeightPolicy::Topsoil => 2,
            WeightPolicy::Subsoil => 3,
            WeightPolicy::RootZone => 4,
        }
    }
}

/// Compute normalised weights for depth spans `(top, bottom)` under `policy`.
///
/// Spans not intersecting `[0, cap]` get weight 0. The returned series is
/// aligned with the input and sums to 1. `rd` only matters for
/// [`WeightPolicy::RootZone`].
pub fn depth_weights(
    spans: &[(f64, f64)],
    policy: WeightPolicy,
    cap: f64,
    rd: f64,
) -> Result<WeightSeries> {
    if spans.is_empty() {
        return Err(ScoringError::EmptyProfile);
    }

    // Gale–Grigal: cumulative root fraction 1 - beta^d, with beta chosen so
    // 95 % of roots sit above the rooting depth.
    let beta = 0.05_f64.powf(1.0 / rd.max(1.0));

    let mut weights: WeightSeries = SmallVec::with_capacity(spans.len());
    let mut total = 0.0;

    for &(top, bot) in spans {
        let t = top.max(0.0);
        let b = bot.min(cap);
        if b <= t {
            weights.push(0.0);
            continue;
        }
        let thickness = b - t;
        let mid = (t + b) / 2.0;

        let factor = match policy {
            WeightPolicy::Uniform => 1.0,
            WeightPolicy::Topsoil => {
                if mid <= 100.0 {
                    1.0 - 0.75 * mid / 100.0
                } else {
                    0.0
                }
            }
            WeightPolicy::Subsoil => {
                if mid <= 100.0 {
                    0.25 + 0.75 * mid / 100.0
                } else {
                    1.0
                }
            }
            WeightPolicy::RootZone => beta.powf(mid),
        };

        let w = thickness * factor;
        weights.push(w);
        total += w;
    }

    if total <= 0.0 {
        return Err(ScoringError::EmptyProfile);
    }
    for w in weights.iter_mut() {
        *w /= total;
    }

    Ok(weights)
}

/// Convenience wrapper over a horizon list.
pub fn horizon_weights(
    horizons: &[Horizon],
    policy: WeightPolicy,
    cap: f64,
    rd: f64,
) -> Result<WeightSeries> {
    let spans: Vec<(f64, f64)> = horizons
        .iter()
        .map(|h| (f64::from(h.hzdept), f64::from(h.hzdepb)))
        .collect();
    depth_weights(&spans, policy, cap, rd)
}
