//! GAEZ Soil Quality Index engine.
//!
//! Computes the seven FAO GAEZ v4 soil quality indices (SQ1..SQ7) and the
//! overall Soil Rating for a point in the United States, from SSURGO
//! tabular data optionally overlaid with field, lab and site measurements.
//!
//! - `soil`: horizons, components, derived-attribute recomputation
//! - `requirements`: crop requirement tables loaded once with Polars
//! - `interp` / `depth` / `phase` / `overlay`: the scoring kernels
//! - `sqi`: one module per index (SQ1..SQ7)
//! - `scorer`: component scoring and SR aggregation
//! - `ssurgo` / `elevation` / `net`: external collaborators
//! - `orchestrator`: the request pipeline
//!
//! GAEZ v4 reference: FAO GAEZ v4 Model Documentation, ch. 4.

pub mod depth;
pub mod elevation;
pub mod error;
pub mod interp;
pub mod net;
pub mod orchestrator;
pub mod overlay;
pub mod phase;
pub mod requirements;
pub mod scorer;
pub mod soil;
pub mod sqi;
pub mod ssurgo;

#[cfg(feature = "api")]
pub mod api_server;

// Re-export commonly used types
pub use error::ScoringError;
pub use orchestrator::{Orchestrator, RatingRequest, RatingResponse};
pub use requirements::{InputLevel, Requirements};
pub use scorer::{aggregate_sr, ComponentScore, SoilScorer};
pub use sqi::SqiResult;

#[cfg(feature = "api")]
pub use api_server::{create_router, AppState};
