use std::collections::{BTreeMap, HashMap};

use rusqlite::Connection;
use tracing::{info, warn};

use crate::boxscore::{AdvancedBoxscore, BasicBoxscore, JoinedTeamGame, ScoringBoxscore};
use crate::error::{PipelineError, Result};
use crate::player::PlayerGameLog;
use crate::schema::{TEAM_ADVANCED_TABLE, TEAM_BASIC_TABLE, TEAM_SCORING_TABLE};
use crate::season::SeasonRange;
use crate::store;

#[derive(Debug, Default, Clone, Copy)]
struct SeasonCoverage {
    basic: usize,
    advanced: usize,
    scoring: usize,
}

fn index_by_key<T>(rows: Vec<T>, key: impl Fn(&T) -> (String, i64)) -> HashMap<(String, i64), T> {
    let mut out = HashMap::with_capacity(rows.len());
    for row in rows {
        out.entry(key(&row)).or_insert(row);
    }
    out
}

pub fn join_team_tables(
    basic: Vec<BasicBoxscore>,
    advanced: Vec<AdvancedBoxscore>,
    scoring: Vec<ScoringBoxscore>,
    seasons: SeasonRange,
) -> Result<Vec<JoinedTeamGame>> {
    let advanced = index_by_key(advanced, |r| (r.game_id.clone(), r.team_id));
    let scoring = index_by_key(scoring, |r| (r.game_id.clone(), r.team_id));

    let mut coverage: BTreeMap<String, SeasonCoverage> = BTreeMap::new();
    let mut out = Vec::new();
    for row in basic {
        if !seasons.contains_label(&row.season) {
            continue;
        }
        let key = (row.game_id.clone(), row.team_id);
        let adv = advanced.get(&key).cloned();
        let sco = scoring.get(&key).cloned();
        let cov = coverage.entry(row.season.clone()).or_default();
        cov.basic += 1;
        cov.advanced += usize::from(adv.is_some());
        cov.scoring += usize::from(sco.is_some());
        out.push(JoinedTeamGame {
            basic: row,
            advanced: adv,
            scoring: sco,
        });
    }

    if out.is_empty() {
        return Err(PipelineError::EmptyResult(format!(
            "no team box scores between {} and {}",
            seasons.first_label(),
            seasons.last_label()
        )));
    }

    for label in seasons.labels() {
        let cov = coverage.get(&label).copied().unwrap_or_default();
        let missing_table = if cov.basic == 0 {
            Some(TEAM_BASIC_TABLE)
        } else if cov.advanced == 0 {
            Some(TEAM_ADVANCED_TABLE)
        } else if cov.scoring == 0 {
            Some(TEAM_SCORING_TABLE)
        } else {
            None
        };
        if let Some(table) = missing_table {
            return Err(PipelineError::SourceDataIncomplete {
                table: table.to_string(),
                season: label,
            });
        }
        let partial = cov.basic - cov.advanced.min(cov.scoring);
        if partial > 0 {
            warn!(season = %label, rows = partial, "team rows missing advanced or scoring box score");
        }
    }

    info!(rows = out.len(), seasons = coverage.len(), "joined team box scores");
    Ok(out)
}

pub fn load_team_games(conn: &Connection, seasons: SeasonRange) -> Result<Vec<JoinedTeamGame>> {
    let basic = store::load_basic(conn)?;
    let advanced = store::load_advanced(conn)?;
    let scoring = store::load_scoring(conn)?;
    join_team_tables(basic, advanced, scoring, seasons)
}

pub fn load_player_logs(conn: &Connection, seasons: SeasonRange) -> Result<Vec<PlayerGameLog>> {
    let rows = store::load_player_logs(conn)?
        .into_iter()
        .filter(|r| seasons.contains_label(&r.season_year))
        .collect::<Vec<_>>();
    if rows.is_empty() {
        return Err(PipelineError::EmptyResult(format!(
            "no player game logs between {} and {}",
            seasons.first_label(),
            seasons.last_label()
        )));
    }
    info!(rows = rows.len(), "loaded player game logs");
    Ok(rows)
}
