use anyhow::{Context, Result};

use nba_features::config::PipelineConfig;
use nba_features::{init_tracing, pipeline, store};

fn main() -> Result<()> {
    init_tracing();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut cfg = PipelineConfig::from_env().context("read NBA_* environment")?;
    cfg.apply_args(&args).context("parse arguments")?;
    cfg.validate()?;

    let mut conn = store::open_db(&cfg.db_path)
        .with_context(|| format!("open {}", cfg.db_path.display()))?;
    let output = pipeline::run(&conn, &cfg).context("transform box scores")?;
    let table = cfg.table_name().to_string();
    let written = pipeline::persist(
        &mut conn,
        &output,
        cfg.output,
        cfg.perspective,
        &table,
        cfg.write_mode,
    )
    .with_context(|| format!("write {table}"))?;

    println!("Transform complete");
    println!("DB: {}", cfg.db_path.display());
    println!(
        "Seasons: {}..{}",
        cfg.seasons.first_label(),
        cfg.seasons.last_label()
    );
    println!("Output: {:?} -> {table} ({:?})", cfg.output, cfg.write_mode);
    println!("Team games: {}", output.team_games.len());
    if !output.matchups.is_empty() {
        println!("Matchups: {}", output.matchups.len());
    }
    if !output.players.is_empty() {
        println!("Player rows: {}", output.players.len());
    }
    if !output.features.is_empty() {
        println!("Team games with player aggregates: {}", output.features.len());
    }
    println!("Rows written: {written}");
    Ok(())
}
