//! Soil scorer - coordinator for scoring a component against a crop.
//!
//! Integrates the phase classifier and all 7 indices, then blends them
//! into the overall Soil Rating. Includes both sequential and parallel
//! (Rayon) implementations; the two agree bit-for-bit since every index
//! is a pure function of the component and the frozen tables.

use rayon::prelude::*;

use crate::error::{Result, ScoringError};
use crate::phase::{classify, PhaseClassification};
use crate::requirements::{CropTables, InputLevel, Requirements};
use crate::soil::Component;
use crate::sqi::{
    calculate_sq1, calculate_sq2, calculate_sq3, calculate_sq4, calculate_sq5, calculate_sq6,
    calculate_sq7, SqiResult,
};

/// SR weights for SQ1..SQ7 (rainfed).
pub const SR_WEIGHTS: [f64; 7] = [0.25, 0.25, 0.25, 0.10, 0.05, 0.05, 0.05];

/// Main component scorer.
pub struct SoilScorer {
    requirements: Requirements,
}

/// Score result for one component.
#[derive(Debug, Clone)]
pub struct ComponentScore {
    pub cokey: String,
    pub compname: String,
    /// SQ1..SQ7 in order.
    pub sqis: [f64; 7],
    /// Overall soil rating in [0, 100].
    pub sr: f64,
    /// Per-index detail, ordered SQ1..SQ7.
    pub results: Vec<SqiResult>,
    pub classification: PhaseClassification,
}

impl SoilScorer {
    pub fn new(requirements: Requirements) -> SoilScorer {
        SoilScorer { requirements }
    }

    pub fn requirements(&self) -> &Requirements {
        &self.requirements
    }

    fn crop_tables(&self, crop_id: &str) -> Result<&CropTables> {
        self.requirements
            .crop(crop_id)
            .ok_or_else(|| ScoringError::InvalidRequest(format!("unknown crop_id '{}'", crop_id)))
    }

    /// Score a component's seven indices and overall rating.
    ///
    /// The component is expected to be post-overlay with derived columns
    /// and rooting depth recomputed.
    pub fn score_component(
        &self,
        component: &Component,
        crop_id: &str,
        level: InputLevel,
    ) -> Result<ComponentScore> {
        let tables = self.crop_tables(crop_id)?;
        if component.horizons.is_empty() {
            return Err(ScoringError::EmptyProfile);
        }

        let classification = classify(component);

        let results = vec![
            calculate_sq1(component, &classification, tables, level)?,
            calculate_sq2(component, &classification, tables, level)?,
            calculate_sq3(component, &classification, tables, level)?,
            calculate_sq4(component, &classification, tables, level)?,
            calculate_sq5(component, &classification, tables, level)?,
            calculate_sq6(component, &classification, tables, level)?,
            calculate_sq7(component, &classification, tables, level)?,
        ];

        Ok(Self::assemble(component, classification, results))
    }

    /// Score a component with the seven indices computed in parallel.
    ///
    /// Each index only reads the component and the frozen tables, so the
    /// fan-out needs no synchronisation.
    pub fn score_component_parallel(
        &self,
        component: &Component,
        crop_id: &str,
        level: InputLevel,
    ) -> Result<ComponentScore> {
        let tables = self.crop_tables(crop_id)?;
        if component.horizons.is_empty() {
            return Err(ScoringError::EmptyProfile);
        }

        let classification = classify(component);

        let results: Result<Vec<SqiResult>> = (1..=7u8)
            .into_par_iter()
            .map(|code| match code {
                1 => calculate_sq1(component, &classification, tables, level),
                2 => calculate_sq2(component, &classification, tables, level),
                3 => calculate_sq3(component, &classification, tables, level),
                4 => calculate_sq4(component, &classification, tables, level),
                5 => calculate_sq5(component, &classification, tables, level),
                6 => calculate_sq6(component, &classification, tables, level),
                7 => calculate_sq7(component, &classification, tables, level),
                _ => unreachable!(),
            })
            .collect();

        Ok(Self::assemble(component, classification, results?))
    }

    fn assemble(
        component: &Component,
        classification: PhaseClassification,
        results: Vec<SqiResult>,
    ) -> ComponentScore {
        let mut sqis = [0.0; 7];
        for (i, r) in results.iter().enumerate() {
            sqis[i] = r.score;
        }
        let sr = aggregate_sr(&sqis);

        ComponentScore {
            cokey: component.cokey.clone(),
            compname: component.compname.clone(),
            sqis,
            sr,
            results,
            classification,
        }
    }
}

/// Constrained geometric blend of SQ1..SQ7:
/// `SR = Π SQk^wk / 100^(Σwk − 1)`, clamped to [0, 100].
/// Any zero index with positive weight zeroes the rating.
pub fn aggregate_sr(sqis: &[f64; 7]) -> f64 {
    let mut log_sum = 0.0;
    for (sq, w) in sqis.iter().zip(SR_WEIGHTS.iter()) {
        if *w <= 0.0 {
            continue;
        }
        let s = sq.clamp(0.0, 100.0);
        if s <= 0.0 {
            return 0.0;
        }
        log_sum += w * (s / 100.0).ln();
    }
    (100.0 * log_sum.exp()).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqi::fixtures;
    use approx::assert_relative_eq;

    #[test]
    fn test_sr_all_perfect() {
        assert_relative_eq!(aggregate_sr(&[100.0; 7]), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_sr_zero_is_limiting() {
        let mut sqis = [100.0; 7];
        sqis[3] = 0.0;
        assert_relative_eq!(aggregate_sr(&sqis), 0.0);
    }

    #[test]
    fn test_sr_weighted_blend() {
        // Only SQ1 at 50: SR = 100 · 0.5^0.25
        let mut sqis = [100.0; 7];
        sqis[0] = 50.0;
        assert_relative_eq!(
            aggregate_sr(&sqis),
            100.0 * 0.5_f64.powf(0.25),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_sr_monotonic_in_each_index() {
        let base = [70.0, 65.0, 80.0, 90.0, 100.0, 95.0, 85.0];
        let sr0 = aggregate_sr(&base);
        for i in 0..7 {
            let mut better = base;
            better[i] += 10.0;
            assert!(aggregate_sr(&better) >= sr0, "index {} not monotone", i);
        }
    }

    #[test]
    fn test_score_component_full_pipeline() {
        let scorer = SoilScorer::new(fixtures::requirements());
        let c = fixtures::silt_loam_component();

        let score = scorer.score_component(&c, "4", InputLevel::Low).unwrap();

        for (i, sq) in score.sqis.iter().enumerate() {
            assert!(
                (0.0..=100.0).contains(sq),
                "SQ{} = {} out of range",
                i + 1,
                sq
            );
        }
        assert!(score.sr > 0.0 && score.sr < 100.0, "SR = {}", score.sr);
        assert_eq!(score.results.len(), 7);
        assert!(!score.classification.phase_ids.is_empty());
    }

    #[test]
    fn test_parallel_matches_sequential_exactly() {
        let scorer = SoilScorer::new(fixtures::requirements());
        let c = fixtures::silt_loam_component();

        let seq = scorer.score_component(&c, "4", InputLevel::Low).unwrap();
        let par = scorer
            .score_component_parallel(&c, "4", InputLevel::Low)
            .unwrap();

        assert_eq!(seq.sqis, par.sqis);
        assert_eq!(seq.sr.to_bits(), par.sr.to_bits());
    }

    #[test]
    fn test_unknown_crop_rejected() {
        let scorer = SoilScorer::new(fixtures::requirements());
        let c = fixtures::silt_loam_component();
        assert!(matches!(
            scorer.score_component(&c, "999", InputLevel::Low),
            Err(ScoringError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_empty_profile_rejected() {
        let scorer = SoilScorer::new(fixtures::requirements());
        let mut c = fixtures::silt_loam_component();
        c.horizons.clear();
        assert!(matches!(
            scorer.score_component(&c, "4", InputLevel::Low),
            Err(ScoringError::EmptyProfile)
        ));
    }
}
