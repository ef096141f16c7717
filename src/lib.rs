pub mod boxscore;
pub mod config;
pub mod derive;
pub mod error;
pub mod franchise;
pub mod ingest;
pub mod loader;
pub mod matchup;
pub mod nba_stats;
pub mod pipeline;
pub mod player;
pub mod schema;
pub mod season;
pub mod split;
pub mod store;
pub mod window;

pub use error::{PipelineError, Result};

pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
