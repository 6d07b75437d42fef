//! SQ6: TOXICITY
//!
//! Scores calcium carbonate and gypsum excess over the root zone, with the
//! related phase penalties.
//!
//! GAEZ v4 reference: Model Documentation, table 4-15 (SQ6).

use crate::depth::WeightPolicy;
use crate::error::Result;
use crate::phase::PhaseClassification;
use crate::requirements::{CropTables, InputLevel};
use crate::soil::Component;

use super::{combine, phase_subscores, profile_subscores, texture_subscore, SqiResult};

const POLICY: WeightPolicy = WeightPolicy::Uniform;

pub fn calculate_sq6(
    component: &Component,
    classification: &PhaseClassification,
    tables: &CropTables,
    level: InputLevel,
) -> Result<SqiResult> {
    let mut factors = profile_subscores(component, tables, 6, level, POLICY)?;
    if let Some(texture) = texture_subscore(component, tables, 6, level, POLICY)? {
        factors.push(texture);
    }
    factors.extend(phase_subscores(classification, tables, 6, level));

    let score = combine(&factors);
    Ok(SqiResult {
        code: 6,
        score,
        factors,
    })
}
