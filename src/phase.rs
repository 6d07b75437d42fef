//! Phase classification.
//!
//! Maps a component's measured attributes to discrete GAEZ phase codes and
//! the categorical limitation flags (`roots`, `il`, `swr`) the phase
//! requirement table scores against. The classifier is total: every
//! component yields at least phase 0 ("no phase limitation").
//!
//! GAEZ v4 reference: Model Documentation, ch. 4 (soil phase ratings).

use crate::depth::{horizon_weights, WeightPolicy};
use crate::soil::Component;

// GAEZ phase codes carried in `phase_ids`.
pub const PHASE_NONE: i64 = 0;
pub const PHASE_STONY: i64 = 3;
pub const PHASE_PETRIC: i64 = 6;
pub const PHASE_SALINE: i64 = 9;
pub const PHASE_SODIC: i64 = 10;
pub const PHASE_GELIC: i64 = 12;
pub const PHASE_VERTIC: i64 = 13;
pub const PHASE_PHREATIC: i64 = 16;
pub const PHASE_SKELETIC: i64 = 25;

/// Coarse-fragment thresholds, % volume in the top 100 cm.
const STONY_CF: f64 = 15.0;
const PETRIC_CF: f64 = 35.0;
const SKELETIC_CF: f64 = 40.0;

/// Phase category, keyed by the `property` column of the phase table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseCategory {
    Stony,
    Saline,
    Sodic,
    Vertic,
    Gelic,
    Phreatic,
    Roots,
    Il,
    Swr,
}

impl PhaseCategory {
    pub fn from_str(s: &str) -> Option<PhaseCategory> {
        match s {
            "stony" => Some(PhaseCategory::Stony),
            "saline" => Some(PhaseCategory::Saline),
            "sodic" => Some(PhaseCategory::Sodic),
            "vertic" => Some(PhaseCategory::Vertic),
            "gelic" => Some(PhaseCategory::Gelic),
            "phreatic" => Some(PhaseCategory::Phreatic),
            "roots" => Some(PhaseCategory::Roots),
            "il" => Some(PhaseCategory::Il),
            "swr" => Some(PhaseCategory::Swr),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseCategory::Stony => "stony",
            PhaseCategory::Saline => "saline",
            PhaseCategory::Sodic => "sodic",
            PhaseCategory::Vertic => "vertic",
            PhaseCategory::Gelic => "gelic",
            PhaseCategory::Phreatic => "phreatic",
            PhaseCategory::Roots => "roots",
            PhaseCategory::Il => "il",
            PhaseCategory::Swr => "swr",
        }
    }
}

/// Classification result: GAEZ phase codes plus per-category ids.
#[derive(Debug, Clone)]
pub struct PhaseClassification {
    /// GAEZ phase codes; never empty.
    pub phase_ids: Vec<i64>,
    /// Per-category id, one entry per category, in a fixed order.
    pub categories: Vec<(PhaseCategory, i64)>,
    /// Rooting limitation 0..6.
    pub roots: u8,
    /// Impermeable-layer severity 0..4.
    pub il: u8,
    /// Soil water regime 0..4.
    pub swr: u8,
}

impl PhaseClassification {
    pub fn category_id(&self, category: PhaseCategory) -> i64 {
        self.categories
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, id)| *id)
            .unwrap_or(0)
    }
}

/// Classify a component. Horizons are expected to be rederived and the
/// rooting depth set.
pub fn classify(component: &Component) -> PhaseClassification {
    let stony_id = stony_phase(component);
    let saline = any_topsoil(component, |h| h.ec, |ec| ec >= 4.0);
    let sodic = any_topsoil(component, |h| h.esp, |esp| esp >= 6.0);
    let vertic = vertic_phase(component);
    let gelic = gelic_phase(component);
    let phreatic = component.drain_num <= 2;

    let roots = roots_flag(component);
    let il = il_flag(component);
    let swr = swr_flag(component);

    let mut phase_ids = Vec::new();
    match stony_id {
        1 => phase_ids.push(PHASE_STONY),
        2 => phase_ids.push(PHASE_PETRIC),
        3 => phase_ids.push(PHASE_SKELETIC),
        _ => {}
    }
    if saline {
        phase_ids.push(PHASE_SALINE);
    }
    if sodic {
        phase_ids.push(PHASE_SODIC);
    }
    if gelic {
        phase_ids.push(PHASE_GELIC);
    }
    if vertic {
        phase_ids.push(PHASE_VERTIC);
    }
    if phreatic {
        phase_ids.push(PHASE_PHREATIC);
    }
    if phase_ids.is_empty() {
        phase_ids.push(PHASE_NONE);
    }

    let categories = vec![
        (PhaseCategory::Stony, stony_id),
        (PhaseCategory::Saline, i64::from(saline)),
        (PhaseCategory::Sodic, i64::from(sodic)),
        (PhaseCategory::Vertic, i64::from(vertic)),
        (PhaseCategory::Gelic, i64::from(gelic)),
        (PhaseCategory::Phreatic, i64::from(phreatic)),
        (PhaseCategory::Roots, i64::from(roots)),
        (PhaseCategory::Il, i64::from(il)),
        (PhaseCategory::Swr, i64::from(swr)),
    ];

    PhaseClassification {
        phase_ids,
        categories,
        roots,
        il,
        swr,
    }
}

/// Stony category id: 0 none, 1 stony, 2 petric, 3 skeletic.
fn stony_phase(component: &Component) -> i64 {
    let Some(cf) = weighted_topsoil_cf(component) else {
        return 0;
    };
    if cf >= SKELETIC_CF {
        3
    } else if cf >= PETRIC_CF {
        2
    } else if cf > STONY_CF {
        1
    } else {
        0
    }
}

/// Thickness-weighted coarse fragment volume in the top 100 cm.
fn weighted_topsoil_cf(component: &Component) -> Option<f64> {
    let weights = horizon_weights(&component.horizons, WeightPolicy::Uniform, 100.0, 100.0).ok()?;

    let mut total_w = 0.0;
    let mut acc = 0.0;
    for (h, w) in component.horizons.iter().zip(weights.iter()) {
        if let Some(cf) = h.cf {
            acc += cf * w;
            total_w += w;
        }
    }
    if total_w > 0.0 {
        Some(acc / total_w)
    } else {
        None
    }
}

/// True when any horizon starting above 100 cm satisfies the predicate.
fn any_topsoil<F, P>(component: &Component, value: F, pred: P) -> bool
where
    F: Fn(&crate::soil::Horizon) -> Option<f64>,
    P: Fn(f64) -> bool,
{
    component
        .horizons
        .iter()
        .filter(|h| h.hzdept < 100)
        .filter_map(|h| value(h))
        .any(pred)
}

fn vertic_phase(component: &Component) -> bool {
    let smectitic = component
        .mineralogy
        .as_deref()
        .map(|m| {
            let lower = m.to_lowercase();
            lower.contains("smectit") || lower.contains("montmorillonit")
        })
        .unwrap_or(false);
    let top_clay = component
        .horizons
        .first()
        .and_then(|h| h.clay)
        .unwrap_or(0.0);
    smectitic && top_clay >= 30.0
}

fn gelic_phase(component: &Component) -> bool {
    component
        .temp_regime
        .as_deref()
        .map(|t| {
            let lower = t.to_lowercase();
            lower.contains("pergelic") || lower.contains("cryic")
        })
        .unwrap_or(false)
}

/// Rooting limitation from effective rooting depth, stepped up once when a
/// resistant layer is present.
fn roots_flag(component: &Component) -> u8 {
    let rd = component.rd;
    let base: u8 = if rd >= 100.0 {
        0
    } else if rd >= 80.0 {
        1
    } else if rd >= 60.0 {
        2
    } else if rd >= 40.0 {
        3
    } else if rd >= 20.0 {
        4
    } else if rd >= 10.0 {
        5
    } else {
        6
    };

    if component.restriction_depth.is_some() {
        (base + 1).min(6)
    } else {
        base
    }
}

/// Impermeable-layer severity from the shallowest restriction.
fn il_flag(component: &Component) -> u8 {
    match component.restriction_depth {
        None => 0,
        Some(d) if d > 100.0 => 1,
        Some(d) if d > 60.0 => 2,
        Some(d) if d > 30.0 => 3,
        Some(_) => 4,
    }
}

/// Soil water regime from the drainage class.
fn swr_flag(component: &Component) -> u8 {
    match component.drain_num {
        1 => 4,
        2 => 3,
        3 => 2,
        4 => 1,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::soil::Horizon;

    fn test_component() -> Component {
        let mut h1 = Horizon::with_depths(0, 30);
        h1.clay = Some(20.0);
        h1.cf = Some(5.0);
        let mut h2 = Horizon::with_depths(30, 100);
        h2.clay = Some(25.0);
        h2.cf = Some(8.0);
        let mut h3 = Horizon::with_depths(100, 150);
        h3.clay = Some(25.0);
        h3.cf = Some(10.0);

        Component {
            cokey: "c1".to_string(),
            compname: "Test".to_string(),
            comppct: 80.0,
            drain_num: 5,
            rd: 150.0,
            bedrock_depth: None,
            restriction_depth: None,
            slope: Some(1.0),
            temp_regime: Some("Mesic".to_string()),
            mineralogy: Some("Mixed".to_string()),
            horizons: vec![h1, h2, h3],
        }
    }

    #[test]
    fn test_unconstrained_component_gets_phase_zero() {
        let c = test_component();
        let cls = classify(&c);
        assert_eq!(cls.phase_ids, vec![PHASE_NONE]);
        assert_eq!(cls.roots, 0);
        assert_eq!(cls.il, 0);
        assert_eq!(cls.swr, 0);
    }

    #[test]
    fn test_stony_grades() {
        let mut c = test_component();
        for h in &mut c.horizons {
            h.cf = Some(20.0);
        }
        assert_eq!(classify(&c).category_id(PhaseCategory::Stony), 1);
        assert!(classify(&c).phase_ids.contains(&PHASE_STONY));

        for h in &mut c.horizons {
            h.cf = Some(37.0);
        }
        assert_eq!(classify(&c).category_id(PhaseCategory::Stony), 2);

        for h in &mut c.horizons {
            h.cf = Some(55.0);
        }
        assert_eq!(classify(&c).category_id(PhaseCategory::Stony), 3);
        assert!(classify(&c).phase_ids.contains(&PHASE_SKELETIC));
    }

    #[test]
    fn test_saline_only_counts_topsoil() {
        let mut c = test_component();
        // Salinity below 100 cm does not set the phase
        c.horizons[2].ec = Some(8.0);
        assert_eq!(classify(&c).category_id(PhaseCategory::Saline), 0);

        c.horizons[0].ec = Some(4.0);
        let cls = classify(&c);
        assert_eq!(cls.category_id(PhaseCategory::Saline), 1);
        assert!(cls.phase_ids.contains(&PHASE_SALINE));
    }

    #[test]
    fn test_sodic_threshold() {
        let mut c = test_component();
        c.horizons[1].esp = Some(6.0);
        let cls = classify(&c);
        assert_eq!(cls.category_id(PhaseCategory::Sodic), 1);
        assert!(cls.phase_ids.contains(&PHASE_SODIC));
    }

    #[test]
    fn test_vertic_needs_both_mineralogy_and_clay() {
        let mut c = test_component();
        c.mineralogy = Some("Smectitic".to_string());
        assert_eq!(classify(&c).category_id(PhaseCategory::Vertic), 0);

        c.horizons[0].clay = Some(35.0);
        assert_eq!(classify(&c).category_id(PhaseCategory::Vertic), 1);
    }

    #[test]
    fn test_gelic_regimes() {
        let mut c = test_component();
        c.temp_regime = Some("Cryic".to_string());
        let cls = classify(&c);
        assert_eq!(cls.category_id(PhaseCategory::Gelic), 1);
        assert!(cls.phase_ids.contains(&PHASE_GELIC));
    }

    #[test]
    fn test_phreatic_and_swr_from_drainage() {
        let mut c = test_component();
        c.drain_num = 2;
        let cls = classify(&c);
        assert_eq!(cls.category_id(PhaseCategory::Phreatic), 1);
        assert_eq!(cls.swr, 3);

        c.drain_num = 1;
        assert_eq!(classify(&c).swr, 4);
        c.drain_num = 4;
        assert_eq!(classify(&c).swr, 1);
    }

    #[test]
    fn test_roots_and_il_flags() {
        let mut c = test_component();
        c.restriction_depth = Some(55.0);
        c.rd = 55.0;
        let cls = classify(&c);
        // rd 55 → base 3, stepped to 4 by the resistant layer
        assert_eq!(cls.roots, 4);
        assert_eq!(cls.il, 3);
    }
}
