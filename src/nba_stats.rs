use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::boxscore::{
    ADVANCED_STAT_COLUMNS, AdvancedBoxscore, BASIC_STAT_COLUMNS, BasicBoxscore,
    SCORING_STAT_COLUMNS, ScoringBoxscore, StatLine, canonical_game_id,
};
use crate::error::{PipelineError, Result};
use crate::ingest::{GameSource, GameType};
use crate::player::{PLAYER_RANK_COLUMNS, PLAYER_STAT_COLUMNS, PlayerGameLog};

#[derive(Debug, Deserialize)]
struct StatsResponse {
    #[serde(rename = "resultSets")]
    result_sets: Vec<ResultSet>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResultSet {
    #[serde(default)]
    pub name: String,
    pub headers: Vec<String>,
    #[serde(rename = "rowSet")]
    pub row_set: Vec<Vec<Value>>,
}

pub struct ResultRow<'a> {
    columns: &'a HashMap<&'a str, usize>,
    values: &'a [Value],
}

impl ResultRow<'_> {
    fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .get(name)
            .and_then(|idx| self.values.get(*idx))
            .filter(|v| !v.is_null())
    }

    pub fn text(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            Value::Bool(b) => Some(f64::from(u8::from(*b))),
            _ => None,
        }
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    fn line<L: StatLine<Option<f64>>>(&self, columns: &[&str]) -> Option<L> {
        L::from_values(columns.iter().map(|c| self.number(c)))
    }

    fn required_text(&self, name: &str) -> Result<String> {
        self.text(name)
            .ok_or_else(|| PipelineError::Source(format!("result row missing {name}")))
    }

    fn required_int(&self, name: &str) -> Result<i64> {
        self.int(name)
            .ok_or_else(|| PipelineError::Source(format!("result row missing {name}")))
    }
}

impl ResultSet {
    pub fn rows<T>(&self, mut map: impl FnMut(&ResultRow<'_>) -> Result<T>) -> Result<Vec<T>> {
        let columns = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.as_str(), i))
            .collect::<HashMap<_, _>>();
        self.row_set
            .iter()
            .map(|values| {
                map(&ResultRow {
                    columns: &columns,
                    values,
                })
            })
            .collect()
    }
}

pub fn parse_result_sets(raw: &str) -> Result<Vec<ResultSet>> {
    let parsed = serde_json::from_str::<StatsResponse>(raw.trim())?;
    Ok(parsed.result_sets)
}

fn result_set(raw: &str, index: usize) -> Result<ResultSet> {
    parse_result_sets(raw)?
        .into_iter()
        .nth(index)
        .ok_or_else(|| PipelineError::Source(format!("response has no result set {index}")))
}

fn game_id(row: &ResultRow<'_>) -> Result<String> {
    row.required_text("GAME_ID").map(|id| canonical_game_id(&id))
}

pub fn parse_league_game_log(raw: &str, season: &str) -> Result<Vec<BasicBoxscore>> {
    result_set(raw, 0)?.rows(|row| {
        Ok(BasicBoxscore {
            season: season.to_string(),
            team_id: row.required_int("TEAM_ID")?,
            team_abbreviation: row.text("TEAM_ABBREVIATION"),
            team_name: row.text("TEAM_NAME"),
            game_id: game_id(row)?,
            game_date: row.text("GAME_DATE"),
            matchup: row.text("MATCHUP"),
            wl: row.text("WL"),
            line: row.line(BASIC_STAT_COLUMNS).unwrap_or_default(),
        })
    })
}

pub fn parse_advanced_boxscore(raw: &str) -> Result<Vec<AdvancedBoxscore>> {
    result_set(raw, 1)?.rows(|row| {
        Ok(AdvancedBoxscore {
            game_id: game_id(row)?,
            team_id: row.required_int("TEAM_ID")?,
            team_name: row.text("TEAM_NAME"),
            team_abbreviation: row.text("TEAM_ABBREVIATION"),
            team_city: row.text("TEAM_CITY"),
            min: row.text("MIN"),
            line: row.line(ADVANCED_STAT_COLUMNS).unwrap_or_default(),
        })
    })
}

pub fn parse_scoring_boxscore(raw: &str) -> Result<Vec<ScoringBoxscore>> {
    result_set(raw, 1)?.rows(|row| {
        Ok(ScoringBoxscore {
            game_id: game_id(row)?,
            team_id: row.required_int("TEAM_ID")?,
            team_name: row.text("TEAM_NAME"),
            team_abbreviation: row.text("TEAM_ABBREVIATION"),
            team_city: row.text("TEAM_CITY"),
            min: row.text("MIN"),
            line: row.line(SCORING_STAT_COLUMNS).unwrap_or_default(),
        })
    })
}

pub fn parse_player_game_logs(raw: &str) -> Result<Vec<PlayerGameLog>> {
    result_set(raw, 0)?.rows(|row| {
        Ok(PlayerGameLog {
            season_year: row.required_text("SEASON_YEAR")?,
            player_id: row.required_int("PLAYER_ID")?,
            player_name: row.text("PLAYER_NAME"),
            nickname: row.text("NICKNAME"),
            team_id: row.required_int("TEAM_ID")?,
            team_abbreviation: row.text("TEAM_ABBREVIATION"),
            team_name: row.text("TEAM_NAME"),
            game_id: game_id(row)?,
            game_date: row.text("GAME_DATE"),
            matchup: row.text("MATCHUP"),
            wl: row.text("WL"),
            line: row.line(PLAYER_STAT_COLUMNS).unwrap_or_default(),
            ranks: PLAYER_RANK_COLUMNS.iter().map(|c| row.number(c)).collect(),
            wnba_fantasy_pts: row.number("WNBA_FANTASY_PTS"),
            available_flag: row.number("AVAILABLE_FLAG"),
        })
    })
}

// Saved stats-API responses in one directory:
// `leaguegamelog_{season}_{regular|playoffs}.json`,
// `boxscoreadvancedv2_{game_id}.json`, `boxscorescoringv2_{game_id}.json`,
// `playergamelogs_{season}.json`.
#[derive(Debug, Clone)]
pub struct JsonDirSource {
    dir: PathBuf,
}

impl JsonDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read(&self, file: String) -> Result<String> {
        let path = self.dir.join(file);
        fs::read_to_string(&path)
            .map_err(|err| PipelineError::Source(format!("{}: {err}", path.display())))
    }
}

impl GameSource for JsonDirSource {
    fn league_game_log(&mut self, season: &str, game_type: GameType) -> Result<Vec<BasicBoxscore>> {
        let kind = match game_type {
            GameType::RegularSeason => "regular",
            GameType::Playoffs => "playoffs",
        };
        let raw = self.read(format!("leaguegamelog_{season}_{kind}.json"))?;
        parse_league_game_log(&raw, season)
    }

    fn advanced_boxscore(&mut self, game_id: &str) -> Result<Vec<AdvancedBoxscore>> {
        parse_advanced_boxscore(&self.read(format!("boxscoreadvancedv2_{game_id}.json"))?)
    }

    fn scoring_boxscore(&mut self, game_id: &str) -> Result<Vec<ScoringBoxscore>> {
        parse_scoring_boxscore(&self.read(format!("boxscorescoringv2_{game_id}.json"))?)
    }

    fn player_game_logs(&mut self, season: &str) -> Result<Vec<PlayerGameLog>> {
        parse_player_game_logs(&self.read(format!("playergamelogs_{season}.json"))?)
    }
}
