// Ad-hoc CLI runner: score a point for a crop against the live services.
//
// Usage: cargo run --bin score_point -- <lat> <lon> <crop_id> <L|I|H>

use std::path::Path;

use sqi_scorer_rust::elevation::EpqsClient;
use sqi_scorer_rust::orchestrator::{Location, Orchestrator, RatingRequest};
use sqi_scorer_rust::requirements::Requirements;
use sqi_scorer_rust::scorer::SoilScorer;
use sqi_scorer_rust::ssurgo::SdaClient;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sqi_scorer_rust=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 5 {
        eprintln!("Usage: {} <lat> <lon> <crop_id> <L|I|H>", args[0]);
        std::process::exit(1);
    }

    let latitude: f64 = args[1].parse()?;
    let longitude: f64 = args[2].parse()?;
    let crop_id = args[3].clone();
    let input_level = args[4].clone();

    let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "data/raw_data".to_string());
    let requirements = Requirements::load(Path::new(&data_dir))?;

    let orchestrator = Orchestrator::new(
        SoilScorer::new(requirements),
        SdaClient::new_default()?,
        EpqsClient::new_default()?,
    );

    let request = RatingRequest {
        location: Location {
            latitude,
            longitude,
        },
        crop_id,
        input_level,
        user_data: None,
    };

    let response = orchestrator.score_point(&request).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}
