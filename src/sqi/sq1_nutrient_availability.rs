//! SQ1: NUTRIENT AVAILABILITY
//!
//! Scores the topsoil nutrient supply: organic carbon, soil reaction (pH)
//! and total exchangeable bases, plus the texture class. Horizon scores
//! collapse under topsoil-emphasis weighting, so the plough layer carries
//! most of the result.
//!
//! GAEZ v4 reference: Model Documentation, table 4-10 (SQ1).

use crate::depth::WeightPolicy;
use crate::error::Result;
use crate::phase::PhaseClassification;
use crate::requirements::{CropTables, InputLevel};
use crate::soil::Component;

use super::{combine, phase_subscores, profile_subscores, texture_subscore, SqiResult};

const POLICY: WeightPolicy = WeightPolicy::Topsoil;

pub fn calculate_sq1(
    component: &Component,
    classification: &PhaseClassification,
    tables: &CropTables,
    level: InputLevel,
) -> Result<SqiResult> {
    let mut factors = profile_subscores(component, tables, 1, level, POLICY)?;
    if let Some(texture) = texture_subscore(component, tables, 1, level, POLICY)? {
        factors.push(texture);
    }
    factors.extend(phase_subscores(classification, tables, 1, level));

    let score = combine(&factors);
    Ok(SqiResult {
        code: 1,
        score,
        factors,
    })
}
