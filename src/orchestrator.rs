//! Request orchestration.
//!
//! Drives the full pipeline for one scoring request: resolve map units at
//! the point, walk candidate components in `comppct` order, overlay user
//! data, re-derive, classify, score, and apply the terrain rating. A
//! component whose horizon fetch or scoring fails is skipped in favour of
//! the next; the request only fails when nothing scores.

use serde::{Deserialize, Serialize};

use crate::elevation::{estimate_slope_pct, ElevationSource};
use crate::error::{Result, ScoringError};
use crate::overlay::{apply_overlay, LabSample, PlotHorizon};
use crate::requirements::{slope_class, InputLevel};
use crate::scorer::{ComponentScore, SoilScorer};
use crate::soil::{Component, DrainageClass};
use crate::ssurgo::SoilDataSource;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// Site-level observations: drainage, slope, bedrock.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drainage_cl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slope: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedrock_depth: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plot_data: Option<Vec<PlotHorizon>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_data: Option<SiteData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lab_data: Option<Vec<LabSample>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingRequest {
    pub location: Location,
    pub crop_id: String,
    pub input_level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_data: Option<UserData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoilQualityIndices {
    #[serde(rename = "SQ1")]
    pub sq1: f64,
    #[serde(rename = "SQ2")]
    pub sq2: f64,
    #[serde(rename = "SQ3")]
    pub sq3: f64,
    #[serde(rename = "SQ4")]
    pub sq4: f64,
    #[serde(rename = "SQ5")]
    pub sq5: f64,
    #[serde(rename = "SQ6")]
    pub sq6: f64,
    #[serde(rename = "SQ7")]
    pub sq7: f64,
    #[serde(rename = "SR")]
    pub sr: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSources {
    /// Name and cokey of the component actually scored.
    pub ssurgo_component: Option<String>,
    pub user_plot_data_used: bool,
    pub user_site_data_used: bool,
    pub user_lab_data_used: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingResponse {
    pub soil_quality_indices: SoilQualityIndices,
    pub data_sources: DataSources,
}

/// End-to-end driver over a soil data source and an elevation source.
pub struct Orchestrator<S, E> {
    scorer: SoilScorer,
    soil: S,
    elevation: E,
}

impl<S: SoilDataSource, E: ElevationSource> Orchestrator<S, E> {
    pub fn new(scorer: SoilScorer, soil: S, elevation: E) -> Orchestrator<S, E> {
        Orchestrator {
            scorer,
            soil,
            elevation,
        }
    }

    pub fn scorer(&self) -> &SoilScorer {
        &self.scorer
    }

    /// Score a point for a crop and input level.
    pub async fn score_point(&self, request: &RatingRequest) -> Result<RatingResponse> {
        let level = self.validate(request)?;
        let lat = request.location.latitude;
        let lon = request.location.longitude;

        let mukeys = self.soil.mukeys_at_point(lat, lon).await?;
        if mukeys.is_empty() {
            return Err(ScoringError::DataUnavailable(format!(
                "no SSURGO map unit at ({}, {})",
                lat, lon
            )));
        }
        tracing::debug!("Resolved {} map unit(s) at ({}, {})", mukeys.len(), lat, lon);

        let components = self.resolve_components(&mukeys).await?;

        let user = request.user_data.clone().unwrap_or_default();
        let plot = user.plot_data.clone().unwrap_or_default();
        let lab = user.lab_data.clone().unwrap_or_default();
        let site = user.site_data.clone().unwrap_or_default();

        let mut scored: Option<(Component, ComponentScore)> = None;
        for mut component in components {
            match self.soil.horizons(&component.cokey).await {
                Ok(horizons) if !horizons.is_empty() => component.horizons = horizons,
                Ok(_) => {
                    tracing::warn!("Component {} has no horizons, skipping", component.cokey);
                    continue;
                }
                Err(err) => {
                    tracing::warn!(
                        "Horizon fetch failed for component {} ({}), skipping",
                        component.cokey,
                        err
                    );
                    continue;
                }
            }

            self.apply_user_data(&mut component, &plot, &lab, &site);

            match self.scorer.score_component(&component, &request.crop_id, level) {
                Ok(score) => {
                    tracing::debug!(
                        "Component {} ({}) scored SR {:.1}",
                        component.cokey,
                        component.compname,
                        score.sr
                    );
                    scored = Some((component, score));
                    break;
                }
                Err(err @ ScoringError::InvalidRequest(_)) => return Err(err),
                Err(err) => {
                    tracing::warn!(
                        "Scoring failed for component {} ({}), skipping",
                        component.cokey,
                        err
                    );
                }
            }
        }

        let Some((component, score)) = scored else {
            return Err(ScoringError::DataUnavailable(
                "every candidate component failed".to_string(),
            ));
        };

        let sr = self
            .terrain_adjusted_sr(&request.crop_id, level, lat, lon, &component, &site, score.sr)
            .await;

        Ok(RatingResponse {
            soil_quality_indices: SoilQualityIndices {
                sq1: score.sqis[0],
                sq2: score.sqis[1],
                sq3: score.sqis[2],
                sq4: score.sqis[3],
                sq5: score.sqis[4],
                sq6: score.sqis[5],
                sq7: score.sqis[6],
                sr,
            },
            data_sources: DataSources {
                ssurgo_component: Some(format!("{} ({})", score.compname, score.cokey)),
                user_plot_data_used: !plot.is_empty(),
                user_site_data_used: site.drainage_cl.is_some()
                    || site.slope.is_some()
                    || site.bedrock_depth.is_some(),
                user_lab_data_used: !lab.is_empty(),
            },
        })
    }

    fn validate(&self, request: &RatingRequest) -> Result<InputLevel> {
        let lat = request.location.latitude;
        let lon = request.location.longitude;
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(ScoringError::InvalidRequest(format!(
                "latitude {} out of range",
                lat
            )));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(ScoringError::InvalidRequest(format!(
                "longitude {} out of range",
                lon
            )));
        }

        let level = InputLevel::parse(&request.input_level)?;

        if !self.scorer.requirements().has_crop(&request.crop_id) {
            return Err(ScoringError::InvalidRequest(format!(
                "unknown crop_id '{}'",
                request.crop_id
            )));
        }
        Ok(level)
    }

    /// Candidate components from the first map unit that has any, in
    /// `comppct` descending order with cokey as the stable tie-break.
    async fn resolve_components(&self, mukeys: &[String]) -> Result<Vec<Component>> {
        let mut last_err: Option<ScoringError> = None;
        for mukey in mukeys {
            match self.soil.components(mukey).await {
                Ok(mut components) if !components.is_empty() => {
                    components.sort_by(|a, b| {
                        b.comppct
                            .partial_cmp(&a.comppct)
                            .unwrap_or(std::cmp::Ordering::Equal)
                            .then_with(|| a.cokey.cmp(&b.cokey))
                    });
                    return Ok(components);
                }
                Ok(_) => tracing::warn!("Map unit {} has no components", mukey),
                Err(err) => {
                    tracing::warn!("Component fetch failed for map unit {} ({})", mukey, err);
                    last_err = Some(err);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| {
            ScoringError::DataUnavailable("no components in any resolved map unit".to_string())
        }))
    }

    /// Overlay user data onto the component, then re-derive everything the
    /// overlay may have invalidated.
    fn apply_user_data(
        &self,
        component: &mut Component,
        plot: &[PlotHorizon],
        lab: &[LabSample],
        site: &SiteData,
    ) {
        if let Some(cl) = site
            .drainage_cl
            .as_deref()
            .and_then(DrainageClass::from_str_loose)
        {
            component.drain_num = cl.0;
        }
        if let Some(slope) = site.slope {
            component.slope = Some(slope);
        }
        if let Some(bedrock) = site.bedrock_depth {
            component.bedrock_depth = Some(bedrock);
        }

        component.horizons =
            apply_overlay(&component.horizons, plot, lab, site.bedrock_depth);
        component.rederive_horizons();
        component.derive_rooting_depth();
    }

    /// Scale SR by the terrain rating for the slope. User site slope wins,
    /// then the SSURGO component slope, then a USGS estimate at the
    /// request point. Falls back to the unadjusted SR when no slope can be
    /// determined.
    async fn terrain_adjusted_sr(
        &self,
        crop_id: &str,
        level: InputLevel,
        lat: f64,
        lon: f64,
        component: &Component,
        site: &SiteData,
        sr: f64,
    ) -> f64 {
        let slope = match (site.slope, component.slope) {
            (Some(s), _) => Some(s),
            (None, Some(s)) => Some(s),
            (None, None) => match estimate_slope_pct(&self.elevation, lat, lon).await {
                Ok(s) => s,
                Err(err) => {
                    tracing::warn!("Slope estimation failed ({}), skipping terrain", err);
                    None
                }
            },
        };

        let Some(slope) = slope else {
            return sr;
        };

        let rating = self.scorer.requirements().terrain_rating(
            crop_id,
            level.fm_class(),
            slope_class(slope),
        );
        (sr * rating / 100.0).clamp(0.0, 100.0)
    }
}
