use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use nba_features::config::{PipelineConfig, arg_value};
use nba_features::ingest;
use nba_features::nba_stats::JsonDirSource;
use nba_features::{init_tracing, store};

fn main() -> Result<()> {
    init_tracing();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let dir = arg_value(&args, "dir")
        .or_else(|| std::env::var("NBA_SOURCE_DIR").ok())
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("--dir <saved stats responses> is required"))?;

    let mut cfg = PipelineConfig::from_env().context("read NBA_* environment")?;
    cfg.apply_args(&args).context("parse arguments")?;
    cfg.validate()?;

    let mut conn = store::open_db(&cfg.db_path)
        .with_context(|| format!("open {}", cfg.db_path.display()))?;
    let mut source = JsonDirSource::new(dir);
    let summary = ingest::ingest_seasons(&mut conn, &mut source, cfg.seasons, cfg.write_mode)?;

    println!("Box score ingest complete");
    println!("DB: {}", cfg.db_path.display());
    println!("Source: {}", source.dir().display());
    println!("Rows upserted: {}", summary.rows_upserted());
    for item in &summary.seasons {
        println!(
            "season {}: basic={} advanced={} scoring={} players={} skipped={}",
            item.season,
            item.basic_rows,
            item.advanced_rows,
            item.scoring_rows,
            item.player_rows,
            item.games_skipped
        );
    }
    if !summary.games_not_added.is_empty() {
        println!("Games not added: {}", summary.games_not_added.len());
        for game_id in summary.games_not_added.iter().take(10) {
            println!("   - {game_id}");
        }
    }
    if !summary.errors.is_empty() {
        println!("errors: {}", summary.errors.len());
        for err in summary.errors.iter().take(6) {
            println!("   - {err}");
        }
    }
    Ok(())
}
