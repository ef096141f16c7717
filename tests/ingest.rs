use std::collections::HashMap;

use rusqlite::Connection;

use nba_features::boxscore::{
    AdvancedBoxscore, AdvancedLine, BasicBoxscore, BasicLine, ScoringBoxscore, ScoringLine, present,
};
use nba_features::ingest::{GameSource, GameType, ingest_seasons};
use nba_features::player::PlayerGameLog;
use nba_features::schema::{TEAM_ADVANCED, TEAM_BASIC, TEAM_SCORING};
use nba_features::season::SeasonRange;
use nba_features::store::{self, WriteMode};
use nba_features::{PipelineError, Result};

#[derive(Default)]
struct FakeSource {
    games: HashMap<String, Vec<(String, i64)>>,
    broken_games: Vec<String>,
    box_score_calls: Vec<String>,
}

impl FakeSource {
    fn with_season(mut self, season: &str, games: &[&str]) -> Self {
        let rows = games
            .iter()
            .flat_map(|g| [(g.to_string(), 1), (g.to_string(), 2)])
            .collect();
        self.games.insert(season.to_string(), rows);
        self
    }
}

impl GameSource for FakeSource {
    fn league_game_log(&mut self, season: &str, game_type: GameType) -> Result<Vec<BasicBoxscore>> {
        if game_type == GameType::Playoffs {
            return Ok(Vec::new());
        }
        let rows = self.games.get(season).cloned().unwrap_or_default();
        Ok(rows
            .into_iter()
            .map(|(game_id, team_id)| BasicBoxscore {
                // The source does not fill SEASON; ingestion does.
                season: String::new(),
                team_id,
                team_abbreviation: Some(if team_id == 1 { "DEN" } else { "UTA" }.to_string()),
                team_name: None,
                game_id,
                game_date: Some("2020-12-23T00:00:00".to_string()),
                matchup: None,
                wl: Some("W".to_string()),
                line: present(BasicLine::<f64>::default()),
            })
            .collect())
    }

    fn advanced_boxscore(&mut self, game_id: &str) -> Result<Vec<AdvancedBoxscore>> {
        self.box_score_calls.push(game_id.to_string());
        if self.broken_games.iter().any(|g| g == game_id) {
            return Err(PipelineError::Source(format!("timeout for {game_id}")));
        }
        Ok([1, 2]
            .into_iter()
            .map(|team_id| AdvancedBoxscore {
                game_id: game_id.to_string(),
                team_id,
                team_name: None,
                team_abbreviation: None,
                team_city: None,
                min: Some("240:00".to_string()),
                line: present(AdvancedLine::<f64>::default()),
            })
            .collect())
    }

    fn scoring_boxscore(&mut self, game_id: &str) -> Result<Vec<ScoringBoxscore>> {
        Ok([1, 2]
            .into_iter()
            .map(|team_id| ScoringBoxscore {
                game_id: game_id.to_string(),
                team_id,
                team_name: None,
                team_abbreviation: None,
                team_city: None,
                min: None,
                line: present(ScoringLine::<f64>::default()),
            })
            .collect())
    }

    fn player_game_logs(&mut self, _season: &str) -> Result<Vec<PlayerGameLog>> {
        Ok(Vec::new())
    }
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
        .unwrap()
}

#[test]
fn seasons_are_ingested_with_their_label() {
    let mut conn = Connection::open_in_memory().unwrap();
    let mut source = FakeSource::default()
        .with_season("2020-21", &["0022000001", "0022000002"])
        .with_season("2021-22", &["0022100001"]);

    let summary = ingest_seasons(
        &mut conn,
        &mut source,
        SeasonRange::new(2020, 2021).unwrap(),
        WriteMode::Replace,
    )
    .unwrap();

    assert_eq!(summary.seasons.len(), 2);
    assert_eq!(summary.seasons[0].basic_rows, 4);
    assert_eq!(summary.seasons[1].basic_rows, 2);
    assert!(summary.games_not_added.is_empty());
    assert_eq!(count(&conn, TEAM_BASIC.name), 6);
    assert_eq!(count(&conn, TEAM_SCORING.name), 6);

    let seasons = store::load_basic(&conn)
        .unwrap()
        .into_iter()
        .map(|r| r.season)
        .collect::<Vec<_>>();
    assert!(seasons.iter().all(|s| s == "2020-21" || s == "2021-22"));
}

#[test]
fn append_only_requests_games_not_yet_stored() {
    let mut conn = Connection::open_in_memory().unwrap();
    let range = SeasonRange::new(2020, 2020).unwrap();

    let mut first = FakeSource::default().with_season("2020-21", &["0022000001"]);
    ingest_seasons(&mut conn, &mut first, range, WriteMode::Replace).unwrap();

    let mut second = FakeSource::default().with_season("2020-21", &["0022000001", "0022000002"]);
    let summary = ingest_seasons(&mut conn, &mut second, range, WriteMode::Append).unwrap();

    assert_eq!(second.box_score_calls, vec!["0022000002".to_string()]);
    assert_eq!(summary.seasons[0].advanced_rows, 2);
    assert_eq!(count(&conn, TEAM_BASIC.name), 4);
    assert_eq!(count(&conn, TEAM_ADVANCED.name), 4);
}

#[test]
fn replace_starts_from_empty_tables() {
    let mut conn = Connection::open_in_memory().unwrap();
    let range = SeasonRange::new(2020, 2020).unwrap();

    let mut first = FakeSource::default().with_season("2020-21", &["0022000001", "0022000002"]);
    ingest_seasons(&mut conn, &mut first, range, WriteMode::Replace).unwrap();

    let mut second = FakeSource::default().with_season("2020-21", &["0022000003"]);
    ingest_seasons(&mut conn, &mut second, range, WriteMode::Replace).unwrap();
    assert_eq!(count(&conn, TEAM_BASIC.name), 2);
    assert_eq!(second.box_score_calls.len(), 1);
}

#[test]
fn failed_games_are_reported_not_fatal() {
    let mut conn = Connection::open_in_memory().unwrap();
    let mut source = FakeSource {
        broken_games: vec!["0022000002".to_string()],
        ..Default::default()
    }
    .with_season("2020-21", &["0022000001", "0022000002"]);

    let summary = ingest_seasons(
        &mut conn,
        &mut source,
        SeasonRange::new(2020, 2020).unwrap(),
        WriteMode::Replace,
    )
    .unwrap();
    assert_eq!(summary.games_not_added, vec!["0022000002".to_string()]);
    assert_eq!(summary.seasons[0].games_skipped, 1);
    assert_eq!(count(&conn, TEAM_ADVANCED.name), 2);
    assert_eq!(count(&conn, TEAM_SCORING.name), 4);
}
