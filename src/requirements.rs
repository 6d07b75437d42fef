//! Crop requirement tables.
//!
//! The five CSVs under `data/raw_data/` are loaded once at process start
//! with Polars and frozen into keyed lookup maps, so the scoring path never
//! touches a DataFrame. Constraint curves are built (and validated) here,
//! at load time.
//!
//! Table shapes:
//! - profile:  `(CROP_ID, input_level, SQI_code, property) → [(value, score)]`
//! - texture:  `(CROP_ID, input_level, SQI_code, text_class_id) → score`
//! - phase:    `(CROP_ID, input_level, SQI_code, property, phase_id) → score`
//! - drainage: `(CROP_ID, input_level, SQI_code, PSCL_ID, DrainNum) → score`
//! - terrain:  `(crop_group, FM_class, slope_class_id) → rating`

use std::path::Path;

use polars::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{Result, ScoringError};
use crate::interp::ConstraintCurve;
use crate::soil::Horizon;

/// Management input level. Selects which requirement rows apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputLevel {
    Low,
    Intermediate,
    High,
}

impl InputLevel {
    pub fn parse(s: &str) -> Result<InputLevel> {
        match s {
            "L" => Ok(InputLevel::Low),
            "I" => Ok(InputLevel::Intermediate),
            "H" => Ok(InputLevel::High),
            other => Err(ScoringError::InvalidRequest(format!(
                "input_level must be L, I or H (got '{}')",
                other
            ))),
        }
    }

    /// Table levels this input level may read, ascending.
    pub fn allowed_levels(&self) -> &'static [u8] {
        match self {
            InputLevel::Low => &[1, 3, 4],
            InputLevel::Intermediate => &[2, 3, 4],
            InputLevel::High => &[4, 5],
        }
    }

    /// Farming-system class used by the terrain table.
    pub fn fm_class(&self) -> i64 {
        match self {
            InputLevel::Low => 1,
            InputLevel::Intermediate => 2,
            InputLevel::High => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InputLevel::Low => "L",
            InputLevel::Intermediate => "I",
            InputLevel::High => "H",
        }
    }
}

/// Continuous profile property referenced by the profile table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Property {
    Oc,
    Ph,
    Teb,
    Bs,
    Cecs,
    Cecc,
    Db,
    Cf,
    Esp,
    Ec,
    Ca,
    Gy,
    Rd,
}

impl Property {
    pub fn from_str(s: &str) -> Option<Property> {
        match s {
            "oc" => Some(Property::Oc),
            "ph" => Some(Property::Ph),
            "teb" => Some(Property::Teb),
            "bs" => Some(Property::Bs),
            "cecs" => Some(Property::Cecs),
            "cecc" => Some(Property::Cecc),
            "db" => Some(Property::Db),
            "cf" => Some(Property::Cf),
            "esp" => Some(Property::Esp),
            "ec" => Some(Property::Ec),
            "ca" => Some(Property::Ca),
            "gy" => Some(Property::Gy),
            "rd" => Some(Property::Rd),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Property::Oc => "oc",
            Property::Ph => "ph",
            Property::Teb => "teb",
            Property::Bs => "bs",
            Property::Cecs => "cecs",
            Property::Cecc => "cecc",
            Property::Db => "db",
            Property::Cf => "cf",
            Property::Esp => "esp",
            Property::Ec => "ec",
            Property::Ca => "ca",
            Property::Gy => "gy",
            Property::Rd => "rd",
        }
    }

    /// Read this property's measured value off a horizon.
    ///
    /// `rd` is component-level and has no per-horizon value.
    pub fn horizon_value(&self, h: &Horizon) -> Option<f64> {
        match self {
            Property::Oc => h.oc,
            Property::Ph => h.ph,
            Property::Teb => h.teb,
            Property::Bs => h.bs,
            Property::Cecs => h.cec,
            Property::Cecc => h.cecc,
            Property::Db => h.db,
            Property::Cf => h.cf,
            Property::Esp => h.esp,
            Property::Ec => h.ec,
            Property::Ca => h.caco3,
            Property::Gy => h.gypsum,
            Property::Rd => None,
        }
    }
}

/// Requirement lookups for a single crop.
#[derive(Debug, Default)]
pub struct CropTables {
    /// `(SQI_code, property, level)` → validated constraint curve.
    profile: FxHashMap<(u8, Property, u8), ConstraintCurve>,
    /// Properties referenced by each SQI (union over levels).
    profile_props: FxHashMap<u8, Vec<Property>>,
    /// `(SQI_code, text_class_id, level)` → score.
    texture: FxHashMap<(u8, i64, u8), f64>,
    /// Levels that carry texture rows per SQI.
    texture_levels: FxHashSet<(u8, u8)>,
    /// `(SQI_code, category, phase_id, level)` → score.
    phase: FxHashMap<(u8, String, i64, u8), f64>,
    phase_levels: FxHashSet<(u8, String, u8)>,
    /// Phase categories listed under each SQI (union over levels).
    phase_cats: FxHashMap<u8, Vec<String>>,
    /// `(SQI_code, PSCL_ID, DrainNum, level)` → score.
    drainage: FxHashMap<(u8, i64, i64, u8), f64>,
    drainage_levels: FxHashSet<(u8, u8)>,
}

impl CropTables {
    /// Properties the profile table references for an SQI.
    pub fn profile_properties(&self, sqi: u8) -> &[Property] {
        self.profile_props
            .get(&sqi)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Constraint curve for `(sqi, property)`; the highest level available
    /// to the input level wins.
    pub fn curve(&self, sqi: u8, prop: Property, level: InputLevel) -> Option<&ConstraintCurve> {
        for lvl in level.allowed_levels().iter().rev() {
            if let Some(curve) = self.profile.get(&(sqi, prop, *lvl)) {
                return Some(curve);
            }
        }
        None
    }

    /// Whether the SQI has texture rows readable at this input level.
    pub fn has_texture(&self, sqi: u8, level: InputLevel) -> bool {
        level
            .allowed_levels()
            .iter()
            .any(|lvl| self.texture_levels.contains(&(sqi, *lvl)))
    }

    /// Texture score for a horizon's texture class. `None` means the SQI has
    /// no texture rows for this input level; an unlisted class id scores 100.
    pub fn texture_score(&self, sqi: u8, texture_id: i64, level: InputLevel) -> Option<f64> {
        for lvl in level.allowed_levels().iter().rev() {
            if self.texture_levels.contains(&(sqi, *lvl)) {
                return Some(
                    self.texture
                        .get(&(sqi, texture_id, *lvl))
                        .copied()
                        .unwrap_or(100.0),
                );
            }
        }
        None
    }

    /// Phase categories listed under an SQI.
    pub fn phase_categories(&self, sqi: u8) -> &[String] {
        self.phase_cats
            .get(&sqi)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Score for a classified `(category, phase_id)` under an SQI.
    /// Unrecognised phase ids score 100 (no constraint).
    pub fn phase_score(
        &self,
        sqi: u8,
        category: &str,
        phase_id: i64,
        level: InputLevel,
    ) -> Option<f64> {
        for lvl in level.allowed_levels().iter().rev() {
            if self
                .phase_levels
                .contains(&(sqi, category.to_string(), *lvl))
            {
                return Some(
                    self.phase
                        .get(&(sqi, category.to_string(), phase_id, *lvl))
                        .copied()
                        .unwrap_or(100.0),
                );
            }
        }
        None
    }

    /// Drainage score by `(PSCL_ID, DrainNum)`. Combinations outside the
    /// table score 100.
    pub fn drainage_score(
        &self,
        sqi: u8,
        pscl_id: i64,
        drain_num: i64,
        level: InputLevel,
    ) -> Option<f64> {
        for lvl in level.allowed_levels().iter().rev() {
            if self.drainage_levels.contains(&(sqi, *lvl)) {
                return Some(
                    self.drainage
                        .get(&(sqi, pscl_id, drain_num, *lvl))
                        .copied()
                        .unwrap_or(100.0),
                );
            }
        }
        None
    }
}

/// All requirement tables, frozen after load.
#[derive(Debug)]
pub struct Requirements {
    crops: FxHashMap<String, CropTables>,
    /// `(crop_group, FM_class, slope_class_id)` → rating.
    terrain: FxHashMap<(String, i64, i64), f64>,
}

impl Requirements {
    /// Load the five CSVs from a `raw_data` directory.
    pub fn load(dir: &Path) -> Result<Requirements> {
        tracing::info!("Loading requirement tables from {:?}", dir);

        let mut crops: FxHashMap<String, CropTables> = FxHashMap::default();

        // Profile curves
        {
            let df = read_csv(&dir.join("profile_reqs.csv"))?;
            let crop = str_column(&df, "CROP_ID")?;
            let level = u8_column(&df, "input_level")?;
            let sqi = u8_column(&df, "SQI_code")?;
            let prop = str_column(&df, "property")?;
            let value = f64_column(&df, "property_value")?;
            let score = f64_column(&df, "score")?;

            let mut points: FxHashMap<(String, u8, Property, u8), Vec<(f64, f64)>> =
                FxHashMap::default();
            for i in 0..df.height() {
                let property = Property::from_str(&prop[i]).ok_or_else(|| {
                    ScoringError::InvalidRequirement(format!(
                        "profile_reqs.csv row {}: unknown property '{}'",
                        i + 1,
                        prop[i]
                    ))
                })?;
                points
                    .entry((crop[i].clone(), sqi[i], property, level[i]))
                    .or_default()
                    .push((value[i], score[i]));
            }

            for ((crop_id, sqi_code, property, lvl), mut pts) in points {
                pts.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
                let curve = ConstraintCurve::new(&pts).map_err(|e| {
                    ScoringError::InvalidRequirement(format!(
                        "profile_reqs.csv crop {} SQ{} {}: {}",
                        crop_id,
                        sqi_code,
                        property.as_str(),
                        e
                    ))
                })?;
                let tables = crops.entry(crop_id).or_default();
                tables.profile.insert((sqi_code, property, lvl), curve);
                let props = tables.profile_props.entry(sqi_code).or_default();
                if !props.contains(&property) {
                    props.push(property);
                }
            }
            for tables in crops.values_mut() {
                for props in tables.profile_props.values_mut() {
                    props.sort();
                }
            }
        }

        // Texture scores
        {
            let df = read_csv(&dir.join("texture_reqs.csv"))?;
            let crop = str_column(&df, "CROP_ID")?;
            let level = u8_column(&df, "input_level")?;
            let sqi = u8_column(&df, "SQI_code")?;
            let class = i64_column(&df, "text_class_id")?;
            let score = f64_column(&df, "score")?;

            for i in 0..df.height() {
                let tables = crops.entry(crop[i].clone()).or_default();
                tables.texture.insert((sqi[i], class[i], level[i]), score[i]);
                tables.texture_levels.insert((sqi[i], level[i]));
            }
        }

        // Phase scores
        {
            let df = read_csv(&dir.join("phase_reqs.csv"))?;
            let crop = str_column(&df, "CROP_ID")?;
            let level = u8_column(&df, "input_level")?;
            let sqi = u8_column(&df, "SQI_code")?;
            let prop = str_column(&df, "property")?;
            let phase_id = i64_column(&df, "phase_id")?;
            let score = f64_column(&df, "score")?;

            for i in 0..df.height() {
                let tables = crops.entry(crop[i].clone()).or_default();
                tables
                    .phase
                    .insert((sqi[i], prop[i].clone(), phase_id[i], level[i]), score[i]);
                tables
                    .phase_levels
                    .insert((sqi[i], prop[i].clone(), level[i]));
                let cats = tables.phase_cats.entry(sqi[i]).or_default();
                if !cats.contains(&prop[i]) {
                    cats.push(prop[i].clone());
                }
            }
            for tables in crops.values_mut() {
                for cats in tables.phase_cats.values_mut() {
                    cats.sort();
                }
            }
        }

        // Drainage scores
        {
            let df = read_csv(&dir.join("drainage_reqs.csv"))?;
            let crop = str_column(&df, "CROP_ID")?;
            let level = u8_column(&df, "input_level")?;
            let sqi = u8_column(&df, "SQI_code")?;
            let pscl = i64_column(&df, "PSCL_ID")?;
            let drain = i64_column(&df, "DrainNum")?;
            let score = f64_column(&df, "score")?;

            for i in 0..df.height() {
                let tables = crops.entry(crop[i].clone()).or_default();
                tables
                    .drainage
                    .insert((sqi[i], pscl[i], drain[i], level[i]), score[i]);
                tables.drainage_levels.insert((sqi[i], level[i]));
            }
        }

        // Terrain ratings
        let mut terrain = FxHashMap::default();
        {
            let df = read_csv(&dir.join("terrain_reqs.csv"))?;
            let group = str_column(&df, "crop_group")?;
            let fm = i64_column(&df, "FM_class")?;
            let slope_class = i64_column(&df, "slope_class_id")?;
            let rating = f64_column(&df, "rating")?;

            for i in 0..df.height() {
                terrain.insert((group[i].clone(), fm[i], slope_class[i]), rating[i]);
            }
        }

        if crops.is_empty() {
            return Err(ScoringError::InvalidRequirement(
                "requirement tables contain no crops".to_string(),
            ));
        }

        tracing::info!(
            "Requirement tables loaded: {} crops, {} terrain ratings",
            crops.len(),
            terrain.len()
        );

        Ok(Requirements { crops, terrain })
    }

    pub fn crop(&self, crop_id: &str) -> Option<&CropTables> {
        self.crops.get(crop_id)
    }

    pub fn has_crop(&self, crop_id: &str) -> bool {
        self.crops.contains_key(crop_id)
    }

    /// Terrain rating for `(crop_group, FM_class, slope_class_id)`.
    /// Absent rows rate 100 (no terrain constraint).
    pub fn terrain_rating(&self, crop_group: &str, fm_class: i64, slope_class: i64) -> f64 {
        self.terrain
            .get(&(crop_group.to_string(), fm_class, slope_class))
            .copied()
            .unwrap_or(100.0)
    }
}

/// GAEZ slope class from a slope percentage.
pub fn slope_class(slope_pct: f64) -> i64 {
    if slope_pct <= 2.0 {
        1
    } else if slope_pct <= 5.0 {
        2
    } else if slope_pct <= 8.0 {
        3
    } else if slope_pct <= 16.0 {
        4
    } else if slope_pct <= 30.0 {
        5
    } else {
        6
    }
}

fn read_csv(path: &Path) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.into()))
        .map_err(|e| {
            ScoringError::InvalidRequirement(format!("failed to open {:?}: {}", path, e))
        })?
        .finish()
        .map_err(|e| {
            ScoringError::InvalidRequirement(format!("failed to read {:?}: {}", path, e))
        })?;
    Ok(df)
}

fn str_column(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let col = df.column(name)?.cast(&DataType::String)?;
    let ca = col.str()?;
    let mut out = Vec::with_capacity(df.height());
    for (i, v) in ca.into_iter().enumerate() {
        match v {
            Some(s) => out.push(s.to_string()),
            None => {
                return Err(ScoringError::InvalidRequirement(format!(
                    "column '{}' row {} is empty",
                    name,
                    i + 1
                )))
            }
        }
    }
    Ok(out)
}

fn f64_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let col = df.column(name)?.cast(&DataType::Float64)?;
    let ca = col.f64()?;
    let mut out = Vec::with_capacity(df.height());
    for (i, v) in ca.into_iter().enumerate() {
        match v {
            Some(x) if x.is_finite() => out.push(x),
            _ => {
                return Err(ScoringError::InvalidRequirement(format!(
                    "column '{}' row {} is not a number",
                    name,
                    i + 1
                )))
            }
        }
    }
    Ok(out)
}

fn i64_column(df: &DataFrame, name: &str) -> Result<Vec<i64>> {
    let col = df.column(name)?.cast(&DataType::Int64)?;
    let ca = col.i64()?;
    let mut out = Vec::with_capacity(df.height());
    for (i, v) in ca.into_iter().enumerate() {
        match v {
            Some(x) => out.push(x),
            None => {
                return Err(ScoringError::InvalidRequirement(format!(
                    "column '{}' row {} is not an integer",
                    name,
                    i + 1
                )))
            }
        }
    }
    Ok(out)
}

fn u8_column(df: &DataFrame, name: &str) -> Result<Vec<u8>> {
    i64_column(df, name)?
        .into_iter()
        .map(|v| {
            u8::try_from(v).map_err(|_| {
                ScoringError::InvalidRequirement(format!("column '{}' value {} out of range", name, v))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_level_parse() {
        assert_eq!(InputLevel::parse("L").unwrap(), InputLevel::Low);
        assert_eq!(InputLevel::parse("I").unwrap(), InputLevel::Intermediate);
        assert_eq!(InputLevel::parse("H").unwrap(), InputLevel::High);
        assert!(InputLevel::parse("X").is_err());
        assert!(InputLevel::parse("l").is_err());
    }

    #[test]
    fn test_allowed_levels() {
        assert_eq!(InputLevel::Low.allowed_levels(), &[1, 3, 4]);
        assert_eq!(InputLevel::Intermediate.allowed_levels(), &[2, 3, 4]);
        assert_eq!(InputLevel::High.allowed_levels(), &[4, 5]);
    }

    #[test]
    fn test_slope_class_boundaries() {
        assert_eq!(slope_class(0.0), 1);
        assert_eq!(slope_class(2.0), 1);
        assert_eq!(slope_class(2.5), 2);
        assert_eq!(slope_class(8.0), 3);
        assert_eq!(slope_class(16.1), 5);
        assert_eq!(slope_class(45.0), 6);
    }

    #[test]
    fn test_highest_level_wins() {
        let mut tables = CropTables::default();
        let low = ConstraintCurve::new(&[(0.0, 0.0), (1.0, 50.0)]).unwrap();
        let high = ConstraintCurve::new(&[(0.0, 0.0), (1.0, 100.0)]).unwrap();
        tables.profile.insert((1, Property::Oc, 1), low);
        tables.profile.insert((1, Property::Oc, 4), high);

        // L allows {1,3,4}; level 4 must win over level 1
        let curve = tables.curve(1, Property::Oc, InputLevel::Low).unwrap();
        assert_eq!(curve.evaluate(1.0), 100.0);
    }

    #[test]
    fn test_unlisted_texture_class_scores_100() {
        let mut tables = CropTables::default();
        tables.texture.insert((1, 4, 4), 80.0);
        tables.texture_levels.insert((1, 4));

        assert_eq!(tables.texture_score(1, 4, InputLevel::Low), Some(80.0));
        assert_eq!(tables.texture_score(1, 12, InputLevel::Low), Some(100.0));
        // SQI with no texture rows at all
        assert_eq!(tables.texture_score(5, 4, InputLevel::Low), None);
    }

    #[test]
    fn test_loads_shipped_tables() {
        let reqs = Requirements::load(Path::new("data/raw_data")).unwrap();
        assert!(reqs.has_crop("4"));
        let maize = reqs.crop("4").unwrap();

        // SQ1 references oc, ph and teb
        let props = maize.profile_properties(1);
        assert!(props.contains(&Property::Oc));
        assert!(props.contains(&Property::Ph));
        assert!(props.contains(&Property::Teb));

        // Curves exist for every input level
        for level in [InputLevel::Low, InputLevel::Intermediate, InputLevel::High] {
            assert!(maize.curve(1, Property::Oc, level).is_some());
        }

        // Drainage table covers SQ4
        assert!(maize
            .drainage_score(4, 2, 5, InputLevel::Low)
            .is_some());

        // Terrain rating falls off with slope class
        let flat = reqs.terrain_rating("4", 1, 1);
        let steep = reqs.terrain_rating("4", 1, 6);
        assert!(flat > steep);
    }
}
