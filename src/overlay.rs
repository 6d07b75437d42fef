//! User-data overlay.
//!
//! Field (plot), laboratory and site measurements replace the map-derived
//! values where they overlap in depth, leaving deeper SSURGO horizons and
//! unsupplied properties untouched. Only raw measurement columns are
//! written; derived columns (texture class, oc, pscl) are recomputed by the
//! caller afterwards, so they can never disagree with the raw set.

use serde::{Deserialize, Serialize};

use crate::soil::{Horizon, OM_TO_OC};

/// One user-described horizon from a soil pit or auger sample.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlotHorizon {
    pub hzdept: i32,
    pub hzdepb: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sand_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub silt_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clay_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organic_matter_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ph_h2o: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cec_cmol_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ec_ds_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caco3_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gypsum_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bulk_density_g_cm3: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coarse_fragment_pct: Option<f64>,
}

/// One laboratory point measurement at a sampling depth.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabSample {
    pub depth_cm: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ph_h2o: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organic_carbon_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cec_cmol_kg: Option<f64>,
}

/// Merge user data onto map horizons.
///
/// The result keeps the map's horizon count and boundaries, except for
/// bedrock truncation. Applying the same overlay twice is a no-op the
/// second time.
pub fn apply_overlay(
    map: &[Horizon],
    plot: &[PlotHorizon],
    lab: &[LabSample],
    bedrock_depth: Option<f64>,
) -> Vec<Horizon> {
    let mut merged: Vec<Horizon> = map.to_vec();

    // Bedrock truncation: drop horizons starting at or below bedrock and
    // clamp the remaining bottom.
    if let Some(bedrock) = bedrock_depth {
        if bedrock < 200.0 {
            merged.retain(|h| f64::from(h.hzdept) < bedrock);
            let floor = bedrock.round() as i32;
            for h in &mut merged {
                if h.hzdepb > floor {
                    h.hzdepb = floor;
                }
            }
        }
    }

    for u in plot {
        for r in &mut merged {
            if u.hzdept < r.hzdepb && u.hzdepb > r.hzdept {
                overwrite_raw(r, u);
            }
        }
    }

    for sample in lab {
        for r in &mut merged {
            if f64::from(r.hzdept) <= sample.depth_cm && sample.depth_cm < f64::from(r.hzdepb) {
                if let Some(ph) = sample.ph_h2o {
                    r.ph = Some(ph);
                }
                if let Some(cec) = sample.cec_cmol_kg {
                    r.cec = Some(cec);
                }
                // Lab reports carbon; the raw column is organic matter.
                if let Some(oc) = sample.organic_carbon_pct {
                    r.om = Some(oc * OM_TO_OC);
                }
            }
        }
    }

    merged
}

fn overwrite_raw(r: &mut Horizon, u: &PlotHorizon) {
    if let Some(v) = u.sand_pct {
        r.sand = Some(v);
    }
    if let Some(v) = u.silt_pct {
        r.silt = Some(v);
    }
    if let Some(v) = u.clay_pct {
        r.clay = Some(v);
    }
    if let Some(v) = u.organic_matter_pct {
        r.om = Some(v);
    }
    if let Some(v) = u.ph_h2o {
        r.ph = Some(v);
    }
    if let Some(v) = u.cec_cmol_kg {
        r.cec = Some(v);
    }
    if let Some(v) = u.ec_ds_m {
        r.ec = Some(v);
    }
    if let Some(v) = u.caco3_pct {
        r.caco3 = Some(v);
    }
    if let Some(v) = u.gypsum_pct {
        r.gypsum = Some(v);
    }
    if let Some(v) = u.bulk_density_g_cm3 {
        r.db = Some(v);
    }
    if let Some(v) = u.coarse_fragment_pct {
        r.cf = Some(v);
    }
}
