use std::collections::HashMap;

use rusqlite::types::Value;
use tracing::debug;

use crate::derive::{DerivedTeamGame, IDENTITY_COLUMNS};
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Perspective {
    #[default]
    TeamOpponent,
    HomeAway,
}

impl Perspective {
    pub fn suffixes(self) -> (&'static str, &'static str) {
        match self {
            Perspective::TeamOpponent => ("_team", "_opp"),
            Perspective::HomeAway => ("_home", "_away"),
        }
    }

    pub fn filter(self) -> MatchupFilter {
        match self {
            Perspective::TeamOpponent => MatchupFilter::BothSides,
            Perspective::HomeAway => MatchupFilter::HomeOnly,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "team" | "team_opponent" => Some(Self::TeamOpponent),
            "home_away" | "home" => Some(Self::HomeAway),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchupFilter {
    BothSides,
    HomeOnly,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchupRecord {
    pub perspective: Perspective,
    pub game_id: String,
    pub side: DerivedTeamGame,
    pub other: DerivedTeamGame,
}

impl MatchupRecord {
    pub fn numeric_columns(perspective: Perspective) -> Vec<String> {
        let (left, right) = perspective.suffixes();
        let numeric = DerivedTeamGame::numeric_columns();
        numeric
            .iter()
            .map(|c| format!("{c}{left}"))
            .chain(numeric.iter().map(|c| format!("{c}{right}")))
            .collect()
    }

    pub fn numeric_values(&self) -> Vec<f64> {
        let mut out = self.side.numeric_values();
        out.extend(self.other.numeric_values());
        out
    }

    pub fn sql_columns(perspective: Perspective) -> Vec<String> {
        let (left, right) = perspective.suffixes();
        let identity = IDENTITY_COLUMNS
            .iter()
            .filter(|c| **c != "GAME_ID")
            .collect::<Vec<_>>();
        let mut out = vec!["GAME_ID".to_string()];
        out.extend(identity.iter().map(|c| format!("{c}{left}")));
        out.extend(identity.iter().map(|c| format!("{c}{right}")));
        out.extend(Self::numeric_columns(perspective));
        out
    }

    pub fn sql_values(&self) -> Vec<Value> {
        let (side_identity, side_numeric) = split_identity(&self.side);
        let (other_identity, other_numeric) = split_identity(&self.other);
        let mut out = vec![Value::Text(self.game_id.clone())];
        out.extend(side_identity);
        out.extend(other_identity);
        out.extend(side_numeric);
        out.extend(other_numeric);
        out
    }
}

// Identity values without GAME_ID, then the typed numeric values.
fn split_identity(row: &DerivedTeamGame) -> (Vec<Value>, Vec<Value>) {
    let mut identity = row.sql_values();
    let numeric = identity.split_off(IDENTITY_COLUMNS.len());
    identity.remove(4);
    (identity, numeric)
}

/// Self-join on GAME_ID. Each game holds at most two team rows, so the
/// output has at most two rows per game; a third row for the same game is a
/// `DuplicateKey` error rather than a fan-out. Pairs of the same franchise
/// are dropped. Output follows the input order of the left side.
pub fn build_matchups(
    rows: &[DerivedTeamGame],
    perspective: Perspective,
    filter: MatchupFilter,
) -> Result<Vec<MatchupRecord>> {
    let mut by_game: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, row) in rows.iter().enumerate() {
        by_game.entry(row.game_id.as_str()).or_default().push(idx);
    }
    if let Some((game_id, members)) = by_game.iter().find(|(_, m)| m.len() > 2) {
        return Err(PipelineError::DuplicateKey {
            game_id: game_id.to_string(),
            rows: members.len(),
        });
    }

    let mut out = Vec::with_capacity(rows.len());
    for (idx, side) in rows.iter().enumerate() {
        if filter == MatchupFilter::HomeOnly && side.home_game != 1 {
            continue;
        }
        for &other_idx in &by_game[side.game_id.as_str()] {
            let other = &rows[other_idx];
            if other_idx == idx || other.team_abbreviation == side.team_abbreviation {
                continue;
            }
            out.push(MatchupRecord {
                perspective,
                game_id: side.game_id.clone(),
                side: side.clone(),
                other: other.clone(),
            });
        }
    }
    debug!(games = by_game.len(), rows = out.len(), ?filter, "built matchups");
    Ok(out)
}
