use std::collections::HashSet;

use rusqlite::Connection;
use tracing::{info, warn};

use crate::boxscore::{AdvancedBoxscore, BasicBoxscore, ScoringBoxscore};
use crate::error::Result;
use crate::player::PlayerGameLog;
use crate::schema::{PLAYER_LOGS, TEAM_ADVANCED, TEAM_BASIC, TEAM_SCORING};
use crate::season::{SeasonRange, season_label};
use crate::store::{self, WriteMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameType {
    RegularSeason,
    Playoffs,
}

impl GameType {
    pub const ALL: [GameType; 2] = [GameType::RegularSeason, GameType::Playoffs];

    pub fn as_str(self) -> &'static str {
        match self {
            GameType::RegularSeason => "Regular Season",
            GameType::Playoffs => "Playoffs",
        }
    }
}

// Where raw box scores come from. Rate limiting and retries are the
// source's business; a failed call here is recorded and skipped.
pub trait GameSource {
    fn league_game_log(&mut self, season: &str, game_type: GameType) -> Result<Vec<BasicBoxscore>>;

    fn advanced_boxscore(&mut self, game_id: &str) -> Result<Vec<AdvancedBoxscore>>;

    fn scoring_boxscore(&mut self, game_id: &str) -> Result<Vec<ScoringBoxscore>>;

    fn player_game_logs(&mut self, season: &str) -> Result<Vec<PlayerGameLog>>;
}

#[derive(Debug, Clone, Default)]
pub struct SeasonIngestSummary {
    pub season: String,
    pub basic_rows: usize,
    pub advanced_rows: usize,
    pub scoring_rows: usize,
    pub player_rows: usize,
    pub games_skipped: usize,
}

#[derive(Debug, Clone, Default)]
pub struct IngestSummary {
    pub seasons: Vec<SeasonIngestSummary>,
    pub games_not_added: Vec<String>,
    pub errors: Vec<String>,
}

impl IngestSummary {
    pub fn rows_upserted(&self) -> usize {
        self.seasons
            .iter()
            .map(|s| s.basic_rows + s.advanced_rows + s.scoring_rows + s.player_rows)
            .sum()
    }
}

pub fn ingest_seasons(
    conn: &mut Connection,
    source: &mut dyn GameSource,
    seasons: SeasonRange,
    mode: WriteMode,
) -> Result<IngestSummary> {
    if mode == WriteMode::Replace {
        store::reset_raw_tables(conn)?;
    } else {
        store::init_raw_schema(conn)?;
    }

    let mut summary = IngestSummary::default();
    for year in seasons.years() {
        let season = season_label(year);
        let mut item = SeasonIngestSummary {
            season: season.clone(),
            ..Default::default()
        };

        let mut basic = Vec::new();
        for game_type in GameType::ALL {
            match source.league_game_log(&season, game_type) {
                Ok(rows) => basic.extend(rows),
                Err(err) => summary
                    .errors
                    .push(format!("{season} {}: {err}", game_type.as_str())),
            }
        }
        for row in &mut basic {
            row.season = season.clone();
        }

        let mut game_ids = Vec::new();
        let mut seen = HashSet::new();
        for row in &basic {
            if seen.insert(row.game_id.clone()) {
                game_ids.push(row.game_id.clone());
            }
        }

        let have_advanced = store::stored_game_ids(conn, &TEAM_ADVANCED)?;
        let have_scoring = store::stored_game_ids(conn, &TEAM_SCORING)?;
        let mut advanced = Vec::new();
        let mut scoring = Vec::new();
        for game_id in &game_ids {
            let mut failed = false;
            if !have_advanced.contains(game_id) {
                match source.advanced_boxscore(game_id) {
                    Ok(rows) => advanced.extend(rows),
                    Err(err) => {
                        warn!(%game_id, %err, "advanced box score not added");
                        failed = true;
                    }
                }
            }
            if !have_scoring.contains(game_id) {
                match source.scoring_boxscore(game_id) {
                    Ok(rows) => scoring.extend(rows),
                    Err(err) => {
                        warn!(%game_id, %err, "scoring box score not added");
                        failed = true;
                    }
                }
            }
            if failed {
                item.games_skipped += 1;
                summary.games_not_added.push(game_id.clone());
            }
        }

        let players = match source.player_game_logs(&season) {
            Ok(rows) => rows,
            Err(err) => {
                summary.errors.push(format!("{season} player logs: {err}"));
                Vec::new()
            }
        };

        let tx = conn.transaction()?;
        item.basic_rows = store::upsert_raw(&tx, &TEAM_BASIC, basic.iter().map(store::basic_values))?;
        item.advanced_rows =
            store::upsert_raw(&tx, &TEAM_ADVANCED, advanced.iter().map(store::advanced_values))?;
        item.scoring_rows =
            store::upsert_raw(&tx, &TEAM_SCORING, scoring.iter().map(store::scoring_values))?;
        item.player_rows =
            store::upsert_raw(&tx, &PLAYER_LOGS, players.iter().map(store::player_values))?;
        tx.commit()?;

        info!(
            season = %item.season,
            basic = item.basic_rows,
            advanced = item.advanced_rows,
            scoring = item.scoring_rows,
            players = item.player_rows,
            skipped = item.games_skipped,
            "ingested season"
        );
        summary.seasons.push(item);
    }
    Ok(summary)
}
