//! SQ4: OXYGEN AVAILABILITY
//!
//! Scores aeration of the root zone from the drainage table, keyed by
//! particle-size class and drainage number, together with the soil water
//! regime phase.
//!
//! GAEZ v4 reference: Model Documentation, table 4-13 (SQ4).

use crate::depth::WeightPolicy;
use crate::error::Result;
use crate::phase::PhaseClassification;
use crate::requirements::{CropTables, InputLevel};
use crate::soil::Component;

use super::{
    combine, drainage_subscore, phase_subscores, profile_subscores, texture_subscore, SqiResult,
};

const POLICY: WeightPolicy = WeightPolicy::Uniform;

pub fn calculate_sq4(
    component: &Component,
    classification: &PhaseClassification,
    tables: &CropTables,
    level: InputLevel,
) -> Result<SqiResult> {
    let mut factors = profile_subscores(component, tables, 4, level, POLICY)?;
    if let Some(texture) = texture_subscore(component, tables, 4, level, POLICY)? {
        factors.push(texture);
    }
    if let Some(drainage) = drainage_subscore(component, tables, 4, level) {
        factors.push(drainage);
    }
    factors.extend(phase_subscores(classification, tables, 4, level));

    let score = combine(&factors);
    Ok(SqiResult {
        code: 4,
        score,
        factors,
    })
}
