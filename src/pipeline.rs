use rusqlite::Connection;
use rusqlite::types::Value;
use tracing::info;

use crate::config::PipelineConfig;
use crate::derive::{DerivedTeamGame, derive_team_games};
use crate::error::{PipelineError, Result};
use crate::franchise::{normalize_player_logs, normalize_team_games};
use crate::loader;
use crate::matchup::{MatchupRecord, Perspective, build_matchups};
use crate::player::{PlayerGameRecord, TeamGameFeatures, aggregate_players, merge_player_features};
use crate::store::{self, WriteMode};
use crate::window::{WindowSet, build_windows, sort_chronologically};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputKind {
    TeamBoxscores,
    PlayerBoxscores,
    AggBoxscores,
    #[default]
    MatchupBoxscores,
}

impl OutputKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "team_boxscores" | "team" => Some(Self::TeamBoxscores),
            "player_boxscores" | "player" => Some(Self::PlayerBoxscores),
            "agg_boxscores" | "agg" => Some(Self::AggBoxscores),
            "matchup_boxscores" | "matchup" => Some(Self::MatchupBoxscores),
            _ => None,
        }
    }

    pub fn default_table(self) -> &'static str {
        match self {
            OutputKind::TeamBoxscores => "team_features",
            OutputKind::PlayerBoxscores => "player_features",
            OutputKind::AggBoxscores => "team_player_features",
            OutputKind::MatchupBoxscores => "matchup_features",
        }
    }

    fn needs_players(self) -> bool {
        matches!(self, OutputKind::PlayerBoxscores | OutputKind::AggBoxscores)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransformOutput {
    pub team_games: Vec<DerivedTeamGame>,
    pub matchups: Vec<MatchupRecord>,
    pub players: Vec<PlayerGameRecord>,
    pub features: Vec<TeamGameFeatures>,
}

pub fn run(conn: &Connection, cfg: &PipelineConfig) -> Result<TransformOutput> {
    cfg.validate()?;
    let joined = loader::load_team_games(conn, cfg.seasons)?;
    let normalized = normalize_team_games(joined);
    if normalized.is_empty() {
        return Err(PipelineError::EmptyResult(
            "every team row was dropped by normalization".to_string(),
        ));
    }
    let mut team_games = derive_team_games(&normalized, cfg.truncation)?;
    sort_chronologically(&mut team_games);

    let mut out = TransformOutput::default();
    if cfg.output == OutputKind::MatchupBoxscores {
        out.matchups = build_matchups(&team_games, cfg.perspective, cfg.perspective.filter())?;
    }
    if cfg.output.needs_players() {
        let players = normalize_player_logs(loader::load_player_logs(conn, cfg.seasons)?);
        if cfg.output == OutputKind::AggBoxscores {
            let aggregates = aggregate_players(&players);
            out.features = merge_player_features(&team_games, &aggregates)?;
        }
        out.players = players;
    }
    out.team_games = team_games;

    info!(
        output = ?cfg.output,
        team_games = out.team_games.len(),
        matchups = out.matchups.len(),
        players = out.players.len(),
        features = out.features.len(),
        "transform finished"
    );
    Ok(out)
}

fn to_strings<S: AsRef<str>>(columns: Vec<S>) -> Vec<String> {
    columns.into_iter().map(|c| c.as_ref().to_string()).collect()
}

pub fn output_rows(
    output: &TransformOutput,
    kind: OutputKind,
    perspective: Perspective,
) -> (Vec<String>, Vec<Vec<Value>>) {
    match kind {
        OutputKind::TeamBoxscores => (
            to_strings(DerivedTeamGame::sql_columns()),
            output.team_games.iter().map(DerivedTeamGame::sql_values).collect(),
        ),
        OutputKind::PlayerBoxscores => (
            to_strings(PlayerGameRecord::sql_columns()),
            output.players.iter().map(PlayerGameRecord::sql_values).collect(),
        ),
        OutputKind::AggBoxscores => (
            TeamGameFeatures::sql_columns(),
            output.features.iter().map(TeamGameFeatures::sql_values).collect(),
        ),
        OutputKind::MatchupBoxscores => (
            MatchupRecord::sql_columns(perspective),
            output.matchups.iter().map(MatchupRecord::sql_values).collect(),
        ),
    }
}

pub fn persist(
    conn: &mut Connection,
    output: &TransformOutput,
    kind: OutputKind,
    perspective: Perspective,
    table: &str,
    mode: WriteMode,
) -> Result<usize> {
    let (columns, rows) = output_rows(output, kind, perspective);
    store::write_table(conn, table, &columns, &rows, mode)
}

pub fn build_windows_for(output: &TransformOutput, cfg: &PipelineConfig) -> Result<WindowSet> {
    match cfg.output {
        OutputKind::TeamBoxscores => build_windows(&output.team_games, cfg.window_len, cfg.window_scope),
        OutputKind::AggBoxscores => build_windows(&output.features, cfg.window_len, cfg.window_scope),
        OutputKind::MatchupBoxscores => build_windows(&output.matchups, cfg.window_len, cfg.window_scope),
        OutputKind::PlayerBoxscores => Err(PipelineError::InvalidConfig(
            "player box scores are not windowed; use agg_boxscores".to_string(),
        )),
    }
}
