//! SQ3: ROOTING CONDITIONS
//!
//! Scores the physical root environment: bulk density, coarse fragments
//! and effective rooting depth, plus texture and the rooting-related
//! phases (roots, impermeable layer, vertic, gelic). Horizon scores
//! collapse under Gale–Grigal root-zone weighting.
//!
//! GAEZ v4 reference: Model Documentation, table 4-12 (SQ3).

use crate::depth::WeightPolicy;
use crate::error::Result;
use crate::phase::PhaseClassification;
use crate::requirements::{CropTables, InputLevel};
use crate::soil::Component;

use super::{combine, phase_subscores, profile_subscores, texture_subscore, SqiResult};

const POLICY: WeightPolicy = WeightPolicy::RootZone;

pub fn calculate_sq3(
    component: &Component,
    classification: &PhaseClassification,
    tables: &CropTables,
    level: InputLevel,
) -> Result<SqiResult> {
    let mut factors = profile_subscores(component, tables, 3, level, POLICY)?;
    if let Some(texture) = texture_subscore(component, tables, 3, level, POLICY)? {
        factors.push(texture);
    }
    factors.extend(phase_subscores(classification, tables, 3, level));

    let score = combine(&factors);
    Ok(SqiResult {
        code: 3,
        score,
        factors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::classify;
    use crate::sqi::fixtures;

    #[test]
    fn test_deep_profile_scores_well() {
        let reqs = fixtures::requirements();
        let tables = reqs.crop("4").unwrap();
        let c = fixtures::silt_loam_component();
        let cls = classify(&c);

        let result = calculate_sq3(&c, &cls, tables, InputLevel::Low).unwrap();
        assert!(result.score > 50.0, "score = {}", result.score);

        let labels: Vec<&str> = result.factors.iter().map(|f| f.label.as_str()).collect();
        assert!(labels.contains(&"db"));
        assert!(labels.contains(&"cf"));
        assert!(labels.contains(&"rd"));
        assert!(labels.contains(&"phase:roots"));
        assert!(labels.contains(&"phase:il"));
    }

    #[test]
    fn test_shallow_restriction_hurts_sq3() {
        let reqs = fixtures::requirements();
        let tables = reqs.crop("4").unwrap();
        let deep = fixtures::silt_loam_component();
        let mut shallow = deep.clone();
        shallow.restriction_depth = Some(45.0);
        shallow.derive_rooting_depth();

        let deep_cls = classify(&deep);
        let shallow_cls = classify(&shallow);

        let deep_sq3 = calculate_sq3(&deep, &deep_cls, tables, InputLevel::Low).unwrap();
        let shallow_sq3 = calculate_sq3(&shallow, &shallow_cls, tables, InputLevel::Low).unwrap();
        assert!(shallow_sq3.score < deep_sq3.score);
    }

    #[test]
    fn test_compaction_hurts_sq3() {
        let reqs = fixtures::requirements();
        let tables = reqs.crop("4").unwrap();
        let loose = fixtures::silt_loam_component();
        let mut compact = loose.clone();
        for h in &mut compact.horizons {
            h.db = Some(1.75);
            h.rederive();
        }
        let loose_cls = classify(&loose);
        let compact_cls = classify(&compact);

        let a = calculate_sq3(&loose, &loose_cls, tables, InputLevel::Low).unwrap();
        let b = calculate_sq3(&compact, &compact_cls, tables, InputLevel::Low).unwrap();
        assert!(b.score < a.score);
    }
}
