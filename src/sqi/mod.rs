//! Soil Quality Indices SQ1..SQ7.
//!
//! One module per index, sharing the sub-score machinery below: constraint
//! curves for continuous properties, table lookups for texture, phase and
//! drainage, depth-weighted collapse of per-horizon scores, and the
//! multiplicative limiting-factor combination.

pub mod sq1_nutrient_availability;
pub mod sq2_nutrient_retention;
pub mod sq3_rooting_conditions;
pub mod sq4_oxygen_availability;
pub mod sq5_excess_salts;
pub mod sq6_toxicity;
pub mod sq7_workability;

pub use sq1_nutrient_availability::calculate_sq1;
pub use sq2_nutrient_retention::calculate_sq2;
pub use sq3_rooting_conditions::calculate_sq3;
pub use sq4_oxygen_availability::calculate_sq4;
pub use sq5_excess_salts::calculate_sq5;
pub use sq6_toxicity::calculate_sq6;
pub use sq7_workability::calculate_sq7;

use crate::depth::{horizon_weights, WeightPolicy};
use crate::error::Result;
use crate::phase::{PhaseCategory, PhaseClassification};
use crate::requirements::{CropTables, InputLevel, Property};
use crate::soil::{Component, ParticleSizeClass};

/// Exponent of the geometric-mean term in the within-SQI combination.
pub const SUBSCORE_ALPHA: f64 = 0.5;

/// One sub-score feeding an SQI.
#[derive(Debug, Clone)]
pub struct SqiFactor {
    pub label: String,
    pub score: f64,
}

/// Result of one index calculation.
#[derive(Debug, Clone)]
pub struct SqiResult {
    /// SQI code 1..7.
    pub code: u8,
    /// Combined score in [0, 100].
    pub score: f64,
    /// The sub-scores that went into the combination.
    pub factors: Vec<SqiFactor>,
}

/// Depth cap for a weighting policy: 100 cm for topsoil emphasis, the
/// rooting depth otherwise. Floored at 10 cm so a surface restriction
/// still leaves a scoreable profile.
fn policy_cap(policy: WeightPolicy, component: &Component) -> f64 {
    match policy {
        WeightPolicy::Topsoil => 100.0,
        _ => component.rd.max(10.0),
    }
}

/// Sub-scores for every continuous property the profile table references
/// under `sqi`.
pub(crate) fn profile_subscores(
    component: &Component,
    tables: &CropTables,
    sqi: u8,
    level: InputLevel,
    policy: WeightPolicy,
) -> Result<Vec<SqiFactor>> {
    let mut factors = Vec::new();

    for prop in tables.profile_properties(sqi) {
        let Some(curve) = tables.curve(sqi, *prop, level) else {
            continue;
        };

        if *prop == Property::Rd {
            factors.push(SqiFactor {
                label: prop.as_str().to_string(),
                score: curve.evaluate(component.rd),
            });
            continue;
        }

        let weights = horizon_weights(
            &component.horizons,
            policy,
            policy_cap(policy, component),
            component.rd,
        )?;

        // Depth-weighted mean over the horizons that carry this property,
        // renormalising the weights over what is measured.
        let mut acc = 0.0;
        let mut total_w = 0.0;
        for (h, w) in component.horizons.iter().zip(weights.iter()) {
            if let Some(value) = prop.horizon_value(h) {
                acc += curve.evaluate(value) * w;
                total_w += w;
            }
        }
        if total_w > 0.0 {
            factors.push(SqiFactor {
                label: prop.as_str().to_string(),
                score: acc / total_w,
            });
        }
    }

    Ok(factors)
}

/// Depth-weighted texture sub-score, or `None` when the SQI has no texture
/// rows for this input level. Horizons without a texture class score 100.
pub(crate) fn texture_subscore(
    component: &Component,
    tables: &CropTables,
    sqi: u8,
    level: InputLevel,
    policy: WeightPolicy,
) -> Result<Option<SqiFactor>> {
    if !tables.has_texture(sqi, level) {
        return Ok(None);
    }

    let weights = horizon_weights(
        &component.horizons,
        policy,
        policy_cap(policy, component),
        component.rd,
    )?;

    let mut acc = 0.0;
    for (h, w) in component.horizons.iter().zip(weights.iter()) {
        let score = h
            .texture_class
            .and_then(|t| tables.texture_score(sqi, t.id(), level))
            .unwrap_or(100.0);
        acc += score * w;
    }

    Ok(Some(SqiFactor {
        label: "texture".to_string(),
        score: acc,
    }))
}

/// Sub-scores for every phase category the phase table lists under `sqi`,
/// looked up against the component's classification.
pub(crate) fn phase_subscores(
    classification: &PhaseClassification,
    tables: &CropTables,
    sqi: u8,
    level: InputLevel,
) -> Vec<SqiFactor> {
    let mut factors = Vec::new();

    for cat_name in tables.phase_categories(sqi) {
        let Some(category) = PhaseCategory::from_str(cat_name) else {
            continue;
        };
        let phase_id = classification.category_id(category);
        if let Some(score) = tables.phase_score(sqi, cat_name, phase_id, level) {
            factors.push(SqiFactor {
                label: format!("phase:{}", cat_name),
                score,
            });
        }
    }

    factors
}

/// Drainage sub-score by `(PSCL_ID, DrainNum)`, keyed on the surface
/// horizon's particle-size class.
pub(crate) fn drainage_subscore(
    component: &Component,
    tables: &CropTables,
    sqi: u8,
    level: InputLevel,
) -> Option<SqiFactor> {
    let pscl = component
        .horizons
        .iter()
        .find_map(|h| h.pscl)
        .unwrap_or(ParticleSizeClass::Medium);

    tables
        .drainage_score(sqi, pscl.id(), i64::from(component.drain_num), level)
        .map(|score| SqiFactor {
            label: "drainage".to_string(),
            score,
        })
}

/// Multiplicative limiting-factor combination:
/// `min(subs) · (geomean(subs)/100)^α`, clamped to [0, 100].
/// No applicable sub-scores means no constraint (100).
pub(crate) fn combine(factors: &[SqiFactor]) -> f64 {
    if factors.is_empty() {
        return 100.0;
    }

    let mut min = f64::INFINITY;
    let mut log_sum = 0.0;
    for f in factors {
        let s = f.score.clamp(0.0, 100.0);
        if s <= 0.0 {
            return 0.0;
        }
        min = min.min(s);
        log_sum += (s / 100.0).ln();
    }

    let geomean_ratio = (log_sum / factors.len() as f64).exp();
    (min * geomean_ratio.powf(SUBSCORE_ALPHA)).clamp(0.0, 100.0)
}
