//! SQ2: NUTRIENT RETENTION
//!
//! Scores the soil's capacity to hold applied nutrients: base saturation,
//! cation exchange capacity of the soil and of the clay fraction, and pH,
//! plus texture. Topsoil-emphasis weighting, as for SQ1.
//!
//! GAEZ v4 reference: Model Documentation, table 4-11 (SQ2).

use crate::depth::WeightPolicy;
use crate::error::Result;
use crate::phase::PhaseClassification;
use crate::requirements::{CropTables, InputLevel};
use crate::soil::Component;

use super::{combine, phase_subscores, profile_subscores, texture_subscore, SqiResult};

const POLICY: WeightPolicy = WeightPolicy::Topsoil;

pub fn calculate_sq2(
    component: &Component,
    classification: &PhaseClassification,
    tables: &CropTables,
    level: InputLevel,
) -> Result<SqiResult> {
    let mut factors = profile_subscores(component, tables, 2, level, POLICY)?;
    if let Some(texture) = texture_subscore(component, tables, 2, level, POLICY)? {
        factors.push(texture);
    }
    factors.extend(phase_subscores(classification, tables, 2, level));

    let score = combine(&factors);
    Ok(SqiResult {
        code: 2,
        score,
        factors,
    })
}
