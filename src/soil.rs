//! Soil data model: horizons, components, map units.
//!
//! Horizons carry the raw SSURGO measurements plus the derived attributes
//! (organic carbon, texture class, particle-size class) that the scorer
//! recomputes after a user-data overlay.

use serde::{Deserialize, Serialize};

/// Van Bemmelen factor: organic matter → organic carbon.
pub const OM_TO_OC: f64 = 1.724;

/// GAEZ 12-class texture code (USDA triangle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureClass {
    Sand,
    LoamySand,
    SandyLoam,
    Loam,
    SiltLoam,
    Silt,
    SandyClayLoam,
    ClayLoam,
    SiltyClayLoam,
    SandyClay,
    SiltyClay,
    Clay,
}

impl TextureClass {
    /// Numeric id used by the texture requirement table.
    pub fn id(&self) -> i64 {
        match self {
            TextureClass::Sand => 1,
            TextureClass::LoamySand => 2,
            TextureClass::SandyLoam => 3,
            TextureClass::Loam => 4,
            TextureClass::SiltLoam => 5,
            TextureClass::Silt => 6,
            TextureClass::SandyClayLoam => 7,
            TextureClass::ClayLoam => 8,
            TextureClass::SiltyClayLoam => 9,
            TextureClass::SandyClay => 10,
            TextureClass::SiltyClay => 11,
            TextureClass::Clay => 12,
        }
    }

    pub fn display_text(&self) -> &'static str {
        match self {
            TextureClass::Sand => "sand",
            TextureClass::LoamySand => "loamy sand",
            TextureClass::SandyLoam => "sandy loam",
            TextureClass::Loam => "loam",
            TextureClass::SiltLoam => "silt loam",
            TextureClass::Silt => "silt",
            TextureClass::SandyClayLoam => "sandy clay loam",
            TextureClass::ClayLoam => "clay loam",
            TextureClass::SiltyClayLoam => "silty clay loam",
            TextureClass::SandyClay => "sandy clay",
            TextureClass::SiltyClay => "silty clay",
            TextureClass::Clay => "clay",
        }
    }

    /// Classify sand/silt/clay percentages on the USDA triangle.
    ///
    /// Fractions are accepted as-is; callers are expected to pass values
    /// summing to roughly 100.
    pub fn from_fractions(sand: f64, silt: f64, clay: f64) -> Option<TextureClass> {
        if !(sand.is_finite() && silt.is_finite() && clay.is_finite()) {
            return None;
        }
        let total = sand + silt + clay;
        if total <= 0.0 {
            return None;
        }

        let class = if clay >= 40.0 {
            if sand > 45.0 {
                TextureClass::SandyClay
            } else if silt >= 40.0 {
                TextureClass::SiltyClay
            } else {
                TextureClass::Clay
            }
        } else if clay >= 35.0 && sand > 45.0 {
            TextureClass::SandyClay
        } else if clay >= 27.0 {
            if sand <= 20.0 {
                TextureClass::SiltyClayLoam
            } else if sand <= 45.0 {
                TextureClass::ClayLoam
            } else {
                TextureClass::SandyClayLoam
            }
        } else if clay >= 20.0 && sand > 45.0 && silt < 28.0 {
            TextureClass::SandyClayLoam
        } else if silt >= 80.0 && clay < 12.0 {
            TextureClass::Silt
        } else if silt >= 50.0 {
            TextureClass::SiltLoam
        } else if clay >= 7.0 && sand <= 52.0 && silt >= 28.0 {
            TextureClass::Loam
        } else if sand - clay * 1.5 >= 85.0 {
            TextureClass::Sand
        } else if sand - clay >= 70.0 {
            TextureClass::LoamySand
        } else {
            TextureClass::SandyLoam
        };

        Some(class)
    }

    /// GAEZ particle-size class grouping.
    pub fn particle_size_class(&self) -> ParticleSizeClass {
        match self {
            TextureClass::Sand | TextureClass::LoamySand | TextureClass::SandyLoam => {
                ParticleSizeClass::Coarse
            }
            TextureClass::Clay | TextureClass::SiltyClay | TextureClass::SandyClay => {
                ParticleSizeClass::Fine
            }
            _ => ParticleSizeClass::Medium,
        }
    }
}

/// Particle-size class (PSCL) used by the drainage requirement table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticleSizeClass {
    Coarse,
    Medium,
    Fine,
}

impl ParticleSizeClass {
    pub fn id(&self) -> i64 {
        match self {
            ParticleSizeClass::Coarse => 1,
            ParticleSizeClass::Medium => 2,
            ParticleSizeClass::Fine => 3,
        }
    }
}

/// One depth stratum of a soil component.
///
/// `hzdept < hzdepb`; horizons within a component are ordered by depth,
/// non-overlapping and contiguous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Horizon {
    /// Top depth, cm.
    pub hzdept: i32,
    /// Bottom depth, cm.
    pub hzdepb: i32,

    // Raw measurement columns (overlay may overwrite these).
    pub sand: Option<f64>,
    pub silt: Option<f64>,
    pub clay: Option<f64>,
    /// Organic matter, %.
    pub om: Option<f64>,
    pub ph: Option<f64>,
    /// CEC of the soil, cmol+/kg.
    pub cec: Option<f64>,
    /// Total exchangeable bases, cmol+/kg.
    pub teb: Option<f64>,
    /// Electrical conductivity, dS/m.
    pub ec: Option<f64>,
    /// Exchangeable sodium percentage, %.
    pub esp: Option<f64>,
    /// Carbonate, %.
    pub caco3: Option<f64>,
    /// Gypsum, %.
    pub gypsum: Option<f64>,
    /// Bulk density, g/cm³.
    pub db: Option<f64>,
    /// Coarse fragment volume, %.
    pub cf: Option<f64>,

    // Derived columns, recomputed by `rederive` after overlay.
    /// Organic carbon (om / 1.724), %.
    pub oc: Option<f64>,
    /// Base saturation (100·teb/cec), %.
    pub bs: Option<f64>,
    /// Clay-basis CEC, cmol+/kg clay.
    pub cecc: Option<f64>,
    pub texture_class: Option<TextureClass>,
    pub pscl: Option<ParticleSizeClass>,
}

impl Horizon {
    /// Bare horizon with only depths set.
    pub fn with_depths(hzdept: i32, hzdepb: i32) -> Horizon {
        Horizon {
            hzdept,
            hzdepb,
            sand: None,
            silt: None,
            clay: None,
            om: None,
            ph: None,
            cec: None,
            teb: None,
            ec: None,
            esp: None,
            caco3: None,
            gypsum: None,
            db: None,
            cf: None,
            oc: None,
            bs: None,
            cecc: None,
            texture_class: None,
            pscl: None,
        }
    }

    pub fn thickness(&self) -> f64 {
        f64::from(self.hzdepb - self.hzdept)
    }

    pub fn mid_depth(&self) -> f64 {
        f64::from(self.hzdept + self.hzdepb) / 2.0
    }

    /// Recompute every derived column from the raw measurements.
    ///
    /// Called after construction and again after a user-data overlay, so the
    /// derived set never disagrees with the raw set.
    pub fn rederive(&mut self) {
        self.oc = self.om.map(|om| om / OM_TO_OC);

        self.bs = match (self.teb, self.cec) {
            (Some(teb), Some(cec)) if cec > 0.0 => Some((100.0 * teb / cec).min(100.0)),
            _ => None,
        };

        self.cecc = match (self.cec, self.clay) {
            (Some(cec), Some(clay)) if clay > 0.0 => Some(cec / (clay / 100.0)),
            _ => None,
        };

        self.texture_class = match (self.sand, self.silt, self.clay) {
            (Some(sand), Some(silt), Some(clay)) => TextureClass::from_fractions(sand, silt, clay),
            _ => None,
        };
        self.pscl = self.texture_class.map(|t| t.particle_size_class());
    }
}

/// Drainage class, mapped onto GAEZ drainNum 1 (very poorly drained) .. 7
/// (excessively drained).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrainageClass(pub i32);

impl DrainageClass {
    /// Loose parse of SSURGO `drainagecl` strings.
    pub fn from_str_loose(s: &str) -> Option<DrainageClass> {
        let lower = s.trim().to_lowercase();
        let num = if lower.contains("very poorly") {
            1
        } else if lower.contains("poorly") && lower.contains("somewhat") {
            3
        } else if lower.contains("poorly") {
            2
        } else if lower.contains("moderately well") {
            4
        } else if lower.contains("somewhat excessively") {
            6
        } else if lower.contains("excessively") {
            7
        } else if lower.contains("well") {
            5
        } else {
            return None;
        };
        Some(DrainageClass(num))
    }
}

/// A taxonomic soil body within a map unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component {
    pub cokey: String,
    pub compname: String,
    /// Percentage of the parent map unit.
    pub comppct: f64,
    /// GAEZ drainNum 1..7.
    pub drain_num: i32,
    /// Effective rooting depth, cm.
    pub rd: f64,
    /// Depth to bedrock (lithic/paralithic), cm.
    pub bedrock_depth: Option<f64>,
    /// Depth to the shallowest root-restricting layer of any kind, cm.
    pub restriction_depth: Option<f64>,
    /// Slope, %.
    pub slope: Option<f64>,
    pub temp_regime: Option<String>,
    pub mineralogy: Option<String>,
    pub horizons: Vec<Horizon>,
}

impl Component {
    /// Bottom depth of the deepest horizon, cm.
    pub fn profile_depth(&self) -> f64 {
        self.horizons
            .last()
            .map(|h| f64::from(h.hzdepb))
            .unwrap_or(0.0)
    }

    /// Effective rooting depth: the shallowest of restriction, bedrock and
    /// the described profile.
    pub fn derive_rooting_depth(&mut self) {
        let mut rd = self.profile_depth();
        if let Some(res) = self.restriction_depth {
            rd = rd.min(res);
        }
        if let Some(bed) = self.bedrock_depth {
            rd = rd.min(bed);
        }
        self.rd = rd;
    }

    /// Recompute every horizon's derived columns.
    pub fn rederive_horizons(&mut self) {
        for h in &mut self.horizons {
            h.rederive();
        }
    }
}

/// A SSURGO map unit: components ordered by `comppct` descending; the
/// dominant component is the first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapUnit {
    pub mukey: String,
    pub components: Vec<Component>,
}

/// USDA Handbook 60 relation: estimate ESP from SAR.
pub fn esp_from_sar(sar: f64) -> f64 {
    let x = -0.0126 + 0.01475 * sar;
    (100.0 * x / (1.0 + x)).max(0.0)
}
