//! SQ5: EXCESS SALTS
//!
//! Scores salinity (electrical conductivity) and sodicity (exchangeable
//! sodium percentage) over the root zone, with the saline and sodic phase
//! penalties on top.
//!
//! GAEZ v4 reference: Model Documentation, table 4-14 (SQ5).

use crate::depth::WeightPolicy;
use crate::error::Result;
use crate::phase::PhaseClassification;
use crate::requirements::{CropTables, InputLevel};
use crate::soil::Component;

use super::{combine, phase_subscores, profile_subscores, texture_subscore, SqiResult};

const POLICY: WeightPolicy = WeightPolicy::Uniform;

pub fn calculate_sq5(
    component: &Component,
    classification: &PhaseClassification,
    tables: &CropTables,
    level: InputLevel,
) -> Result<SqiResult> {
    let mut factors = profile_subscores(component, tables, 5, level, POLICY)?;
    if let Some(texture) = texture_subscore(component, tables, 5, level, POLICY)? {
        factors.push(texture);
    }
    factors.extend(phase_subscores(classification, tables, 5, level));

    let score = combine(&factors);
    Ok(SqiResult {
        code: 5,
        score,
        factors,
    })
}
