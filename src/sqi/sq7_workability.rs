//! SQ7: WORKABILITY
//!
//! Scores ease of cultivation: effective rooting depth plus the physical
//! phases that interfere with tillage (stony/petric/skeletic, vertic,
//! gelic, phreatic, rooting limitation).
//!
//! GAEZ v4 reference: Model Documentation, table 4-16 (SQ7).

use crate::depth::WeightPolicy;
use crate::error::Result;
use crate::phase::PhaseClassification;
use crate::requirements::{CropTables, InputLevel};
use crate::soil::Component;

use super::{combine, phase_subscores, profile_subscores, texture_subscore, SqiResult};

const POLICY: WeightPolicy = WeightPolicy::Uniform;

pub fn calculate_sq7(
    component: &Component,
    classification: &PhaseClassification,
    tables: &CropTables,
    level: InputLevel,
) -> Result<SqiResult> {
    let mut factors = profile_subscores(component, tables, 7, level, POLICY)?;
    if let Some(texture) = texture_subscore(component, tables, 7, level, POLICY)? {
        factors.push(texture);
    }
    factors.extend(phase_subscores(classification, tables, 7, level));

    let score = combine(&factors);
    Ok(SqiResult {
        code: 7,
        score,
        factors,
    })
}
