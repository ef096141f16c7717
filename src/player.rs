use std::collections::HashMap;

use chrono::NaiveDate;
use rusqlite::types::Value;
use tracing::{debug, info};

use crate::boxscore::{StatLine, stat_line};
use crate::derive::DerivedTeamGame;
use crate::error::{PipelineError, Result};

stat_line! {
    PlayerLine, PLAYER_STAT_COLUMNS {
        min => "MIN",
        fgm => "FGM",
        fga => "FGA",
        fg_pct => "FG_PCT",
        fg3m => "FG3M",
        fg3a => "FG3A",
        fg3_pct => "FG3_PCT",
        ftm => "FTM",
        fta => "FTA",
        ft_pct => "FT_PCT",
        oreb => "OREB",
        dreb => "DREB",
        reb => "REB",
        ast => "AST",
        tov => "TOV",
        stl => "STL",
        blk => "BLK",
        blka => "BLKA",
        pf => "PF",
        pfd => "PFD",
        pts => "PTS",
        plus_minus => "PLUS_MINUS",
        nba_fantasy_pts => "NBA_FANTASY_PTS",
        dd2 => "DD2",
        td3 => "TD3",
    }
}

// Ordinal league ranks. Stored, never averaged.
pub const PLAYER_RANK_COLUMNS: &[&str] = &[
    "GP_RANK",
    "W_RANK",
    "L_RANK",
    "W_PCT_RANK",
    "MIN_RANK",
    "FGM_RANK",
    "FGA_RANK",
    "FG_PCT_RANK",
    "FG3M_RANK",
    "FG3A_RANK",
    "FG3_PCT_RANK",
    "FTM_RANK",
    "FTA_RANK",
    "FT_PCT_RANK",
    "OREB_RANK",
    "DREB_RANK",
    "REB_RANK",
    "AST_RANK",
    "TOV_RANK",
    "STL_RANK",
    "BLK_RANK",
    "BLKA_RANK",
    "PF_RANK",
    "PFD_RANK",
    "PTS_RANK",
    "PLUS_MINUS_RANK",
    "NBA_FANTASY_PTS_RANK",
    "DD2_RANK",
    "TD3_RANK",
    "WNBA_FANTASY_PTS_RANK",
];

pub const PLAYER_NON_NBA_COLUMNS: &[&str] = &["WNBA_FANTASY_PTS", "AVAILABLE_FLAG"];

const PLAYER_SUFFIX: &str = "_players";

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerGameLog {
    pub season_year: String,
    pub player_id: i64,
    pub player_name: Option<String>,
    pub nickname: Option<String>,
    pub team_id: i64,
    pub team_abbreviation: Option<String>,
    pub team_name: Option<String>,
    pub game_id: String,
    pub game_date: Option<String>,
    pub matchup: Option<String>,
    pub wl: Option<String>,
    pub line: PlayerLine<Option<f64>>,
    pub ranks: Vec<Option<f64>>,
    pub wnba_fantasy_pts: Option<f64>,
    pub available_flag: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerGameRecord {
    pub season: String,
    pub player_id: i64,
    pub player_name: String,
    pub team_id: i64,
    pub team_abbreviation: String,
    pub team_name: String,
    pub game_id: String,
    pub game_date: NaiveDate,
    pub matchup: String,
    pub home_game: u8,
    pub wl: u8,
    pub line: PlayerLine,
    pub ranks: Vec<Option<f64>>,
    pub wnba_fantasy_pts: Option<f64>,
    pub available_flag: Option<f64>,
}

impl PlayerGameRecord {
    pub fn sql_columns() -> Vec<&'static str> {
        let mut out = vec![
            "SEASON",
            "PLAYER_ID",
            "PLAYER_NAME",
            "TEAM_ID",
            "TEAM_ABBREVIATION",
            "TEAM_NAME",
            "GAME_ID",
            "GAME_DATE",
            "MATCHUP",
            "HOME_GAME",
            "WL",
        ];
        out.extend_from_slice(PLAYER_STAT_COLUMNS);
        out
    }

    pub fn sql_values(&self) -> Vec<Value> {
        let mut out = vec![
            Value::Text(self.season.clone()),
            Value::Integer(self.player_id),
            Value::Text(self.player_name.clone()),
            Value::Integer(self.team_id),
            Value::Text(self.team_abbreviation.clone()),
            Value::Text(self.team_name.clone()),
            Value::Text(self.game_id.clone()),
            Value::Text(self.game_date.format("%Y-%m-%d").to_string()),
            Value::Text(self.matchup.clone()),
            Value::Integer(i64::from(self.home_game)),
            Value::Integer(i64::from(self.wl)),
        ];
        out.extend(self.line.into_values().into_iter().map(Value::Real));
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamPlayerAggregate {
    pub team_id: i64,
    pub game_id: String,
    pub players: usize,
    pub line: PlayerLine,
}

impl TeamPlayerAggregate {
    pub fn numeric_columns() -> Vec<String> {
        PLAYER_STAT_COLUMNS
            .iter()
            .map(|c| format!("{c}{PLAYER_SUFFIX}"))
            .collect()
    }

    pub fn numeric_values(&self) -> Vec<f64> {
        self.line.into_values()
    }
}

// Groups by (team_id, game_id) in order of first appearance and averages
// every player stat. Minutes are rounded to the nearest whole minute.
pub fn aggregate_players(records: &[PlayerGameRecord]) -> Vec<TeamPlayerAggregate> {
    let width = PLAYER_STAT_COLUMNS.len();
    let mut index: HashMap<(i64, &str), usize> = HashMap::new();
    let mut groups: Vec<(i64, &str, usize, Vec<f64>)> = Vec::new();

    for record in records {
        let key = (record.team_id, record.game_id.as_str());
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push((key.0, key.1, 0, vec![0.0; width]));
            groups.len() - 1
        });
        let (_, _, n, sums) = &mut groups[slot];
        *n += 1;
        for (sum, v) in sums.iter_mut().zip(record.line.into_values()) {
            *sum += v;
        }
    }

    let out = groups
        .into_iter()
        .filter_map(|(team_id, game_id, n, sums)| {
            let mean = sums.into_iter().map(|s| s / n as f64);
            let mut line = PlayerLine::from_values(mean)?;
            line.min = line.min.round();
            Some(TeamPlayerAggregate {
                team_id,
                game_id: game_id.to_string(),
                players: n,
                line,
            })
        })
        .collect::<Vec<_>>();
    debug!(groups = out.len(), players = records.len(), "aggregated player logs");
    out
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamGameFeatures {
    pub team: DerivedTeamGame,
    pub players: TeamPlayerAggregate,
}

impl TeamGameFeatures {
    pub fn sql_columns() -> Vec<String> {
        let mut out = DerivedTeamGame::sql_columns()
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        out.push("N_PLAYERS".to_string());
        out.extend(TeamPlayerAggregate::numeric_columns());
        out
    }

    pub fn sql_values(&self) -> Vec<Value> {
        let mut out = self.team.sql_values();
        out.push(Value::Integer(self.players.players as i64));
        out.extend(self.players.numeric_values().into_iter().map(Value::Real));
        out
    }
}

pub fn merge_player_features(
    team_games: &[DerivedTeamGame],
    aggregates: &[TeamPlayerAggregate],
) -> Result<Vec<TeamGameFeatures>> {
    let by_key: HashMap<(i64, &str), &TeamPlayerAggregate> = aggregates
        .iter()
        .map(|a| ((a.team_id, a.game_id.as_str()), a))
        .collect();

    let out = team_games
        .iter()
        .filter_map(|team| {
            let players = by_key.get(&(team.team_id, team.game_id.as_str()))?;
            Some(TeamGameFeatures {
                team: team.clone(),
                players: (*players).clone(),
            })
        })
        .collect::<Vec<_>>();

    if out.is_empty() {
        return Err(PipelineError::EmptyResult(
            "no team game has matching player logs".to_string(),
        ));
    }
    let unmatched = team_games.len() - out.len();
    info!(rows = out.len(), unmatched, "merged player aggregates");
    Ok(out)
}
