use std::collections::HashMap;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use tracing::{debug, warn};

use crate::boxscore::{JoinedTeamGame, TeamGameRecord, complete};
use crate::player::{PlayerGameLog, PlayerGameRecord};

pub const FRANCHISE_RENAMES: &[(&str, &str)] = &[
    ("NJN", "BKN"),
    ("CHH", "CHA"),
    ("VAN", "MEM"),
    ("NOH", "NOP"),
    ("NOK", "NOP"),
    ("SEA", "OKC"),
    ("WSB", "WAS"),
];

static CANONICAL: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| FRANCHISE_RENAMES.iter().copied().collect());

pub fn canonical_abbreviation(abbreviation: &str) -> &str {
    CANONICAL
        .get(abbreviation.trim())
        .copied()
        .unwrap_or(abbreviation)
}

// Rewrites old codes in "SEA vs. LAL" / "SEA @ LAL". Token-wise, so
// a second pass changes nothing.
pub fn normalize_matchup(matchup: &str) -> String {
    matchup
        .split_whitespace()
        .map(canonical_abbreviation)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn is_home_matchup(matchup: &str) -> bool {
    matchup.contains("vs")
}

pub fn win_flag(wl: Option<&str>) -> u8 {
    u8::from(wl.map(str::trim) == Some("W"))
}

pub fn parse_game_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .ok()
        .or_else(|| NaiveDate::parse_from_str(raw, "%b %d, %Y").ok())
}

impl TeamGameRecord {
    pub fn normalized(mut self) -> Self {
        self.team_abbreviation = canonical_abbreviation(&self.team_abbreviation).to_string();
        self.matchup = normalize_matchup(&self.matchup);
        self.home_game = u8::from(is_home_matchup(&self.matchup));
        self
    }
}

impl PlayerGameRecord {
    pub fn normalized(mut self) -> Self {
        self.team_abbreviation = canonical_abbreviation(&self.team_abbreviation).to_string();
        self.matchup = normalize_matchup(&self.matchup);
        self.home_game = u8::from(is_home_matchup(&self.matchup));
        self
    }
}

fn team_record(joined: JoinedTeamGame) -> Option<TeamGameRecord> {
    let JoinedTeamGame {
        basic,
        advanced,
        scoring,
    } = joined;
    let game_date = parse_game_date(basic.game_date.as_deref()?)?;
    Some(TeamGameRecord {
        wl: win_flag(basic.wl.as_deref()),
        season: basic.season,
        team_id: basic.team_id,
        team_abbreviation: basic.team_abbreviation?,
        team_name: basic.team_name?,
        game_id: basic.game_id,
        game_date,
        matchup: basic.matchup?,
        home_game: 0,
        basic: complete(basic.line)?,
        advanced: complete(advanced?.line)?,
        scoring: complete(scoring?.line)?,
    })
}

pub fn normalize_team_games(rows: Vec<JoinedTeamGame>) -> Vec<TeamGameRecord> {
    let total = rows.len();
    let out = rows
        .into_iter()
        .filter_map(team_record)
        .map(TeamGameRecord::normalized)
        .collect::<Vec<_>>();
    let dropped = total - out.len();
    if dropped > 0 {
        warn!(dropped, total, "dropped team rows with missing fields");
    }
    debug!(rows = out.len(), "normalized team box scores");
    out
}

fn player_record(log: PlayerGameLog) -> Option<PlayerGameRecord> {
    let game_date = parse_game_date(log.game_date.as_deref()?)?;
    Some(PlayerGameRecord {
        wl: win_flag(log.wl.as_deref()),
        season: log.season_year,
        player_id: log.player_id,
        player_name: log.player_name?,
        team_id: log.team_id,
        team_abbreviation: log.team_abbreviation?,
        team_name: log.team_name?,
        game_id: log.game_id,
        game_date,
        matchup: log.matchup?,
        home_game: 0,
        line: complete(log.line)?,
        ranks: log.ranks,
        wnba_fantasy_pts: log.wnba_fantasy_pts,
        available_flag: log.available_flag,
    })
}

pub fn normalize_player_logs(rows: Vec<PlayerGameLog>) -> Vec<PlayerGameRecord> {
    let total = rows.len();
    let out = rows
        .into_iter()
        .filter_map(player_record)
        .map(PlayerGameRecord::normalized)
        .collect::<Vec<_>>();
    let dropped = total - out.len();
    if dropped > 0 {
        warn!(dropped, total, "dropped player rows with missing fields");
    }
    out
}
