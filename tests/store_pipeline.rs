use rusqlite::Connection;
use rusqlite::types::Value;

use nba_features::PipelineError;
use nba_features::boxscore::{
    AdvancedBoxscore, AdvancedLine, BasicBoxscore, BasicLine, ScoringBoxscore, ScoringLine, present,
};
use nba_features::config::PipelineConfig;
use nba_features::matchup::Perspective;
use nba_features::pipeline::{self, OutputKind};
use nba_features::player::{PLAYER_RANK_COLUMNS, PlayerGameLog, PlayerLine};
use nba_features::schema::{PLAYER_LOGS, TEAM_ADVANCED, TEAM_BASIC, TEAM_SCORING};
use nba_features::season::SeasonRange;
use nba_features::store::{self, WriteMode};

fn basic(game_id: &str, team_id: i64, abbr: &str, matchup: &str, wl: &str, date: &str) -> BasicBoxscore {
    BasicBoxscore {
        season: "2019-20".to_string(),
        team_id,
        team_abbreviation: Some(abbr.to_string()),
        team_name: Some(abbr.to_string()),
        game_id: game_id.to_string(),
        game_date: Some(date.to_string()),
        matchup: Some(matchup.to_string()),
        wl: Some(wl.to_string()),
        line: present(BasicLine {
            fgm: 41.0,
            fga: 87.0,
            fg3m: 13.0,
            fg3a: 36.0,
            pts: 112.0,
            ..Default::default()
        }),
    }
}

fn advanced(game_id: &str, team_id: i64) -> AdvancedBoxscore {
    AdvancedBoxscore {
        game_id: game_id.to_string(),
        team_id,
        team_name: None,
        team_abbreviation: None,
        team_city: None,
        min: Some("240:00".to_string()),
        line: present(AdvancedLine {
            off_rating: 112.0,
            def_rating: 108.0,
            net_rating: 4.0,
            poss: 100.0,
            ..Default::default()
        }),
    }
}

fn scoring(game_id: &str, team_id: i64) -> ScoringBoxscore {
    ScoringBoxscore {
        game_id: game_id.to_string(),
        team_id,
        team_name: None,
        team_abbreviation: None,
        team_city: None,
        min: Some("240:00".to_string()),
        line: present(ScoringLine {
            pct_pts_fb: 0.1,
            pct_pts_paint: 0.45,
            pct_ast_2pm: 0.5,
            pct_ast_3pm: 0.8,
            ..Default::default()
        }),
    }
}

fn player(game_id: &str, team_id: i64, abbr: &str, player_id: i64, pts: f64) -> PlayerGameLog {
    PlayerGameLog {
        season_year: "2019-20".to_string(),
        player_id,
        player_name: Some(format!("Player {player_id}")),
        nickname: None,
        team_id,
        team_abbreviation: Some(abbr.to_string()),
        team_name: Some(abbr.to_string()),
        game_id: game_id.to_string(),
        game_date: Some("2019-10-22T00:00:00".to_string()),
        matchup: Some(format!("{abbr} vs. NOP")),
        wl: Some("W".to_string()),
        line: present(PlayerLine {
            min: 30.0,
            pts,
            ..Default::default()
        }),
        ranks: vec![None; PLAYER_RANK_COLUMNS.len()],
        wnba_fantasy_pts: None,
        available_flag: Some(1.0),
    }
}

fn seeded() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    store::init_raw_schema(&conn).unwrap();
    let basics = vec![
        basic("0021900001", 1, "TOR", "TOR vs. NOH", "W", "2019-10-22T00:00:00"),
        basic("0021900001", 2, "NOH", "NOH @ TOR", "L", "2019-10-22T00:00:00"),
        basic("0021900002", 3, "LAC", "LAC vs. LAL", "W", "2019-10-22T00:00:00"),
        basic("0021900002", 4, "LAL", "LAL @ LAC", "L", "2019-10-22T00:00:00"),
        // Never got its advanced or scoring box score.
        basic("0021900003", 5, "BOS", "BOS @ PHI", "L", "2019-10-23T00:00:00"),
    ];
    let keys = [
        ("0021900001", 1),
        ("0021900001", 2),
        ("0021900002", 3),
        ("0021900002", 4),
    ];
    let tx = conn.transaction().unwrap();
    store::upsert_raw(&tx, &TEAM_BASIC, basics.iter().map(store::basic_values)).unwrap();
    store::upsert_raw(
        &tx,
        &TEAM_ADVANCED,
        keys.iter().map(|(g, t)| store::advanced_values(&advanced(g, *t))),
    )
    .unwrap();
    store::upsert_raw(
        &tx,
        &TEAM_SCORING,
        keys.iter().map(|(g, t)| store::scoring_values(&scoring(g, *t))),
    )
    .unwrap();
    let players = vec![
        player("0021900001", 1, "TOR", 10, 20.0),
        player("0021900001", 1, "TOR", 11, 10.0),
    ];
    store::upsert_raw(&tx, &PLAYER_LOGS, players.iter().map(store::player_values)).unwrap();
    tx.commit().unwrap();
    conn
}

fn config(output: OutputKind) -> PipelineConfig {
    PipelineConfig {
        seasons: SeasonRange::new(2019, 2019).unwrap(),
        output,
        ..PipelineConfig::default()
    }
}

#[test]
fn raw_rows_survive_a_store_round_trip() {
    let conn = seeded();
    let rows = store::load_basic(&conn).unwrap();
    assert_eq!(rows.len(), 5);
    let tor = rows.iter().find(|r| r.team_id == 1).unwrap();
    assert_eq!(tor.game_id, "0021900001");
    assert_eq!(tor.line.fgm, Some(41.0));
    assert_eq!(tor.line.fg_pct, Some(0.0));

    let ids = store::stored_game_ids(&conn, &TEAM_ADVANCED).unwrap();
    assert_eq!(ids.len(), 2);
    assert!(!ids.contains("0021900003"));
}

#[test]
fn upserts_replace_rows_with_the_same_key() {
    let mut conn = seeded();
    let tx = conn.transaction().unwrap();
    let again = basic("0021900001", 1, "TOR", "TOR vs. NOH", "L", "2019-10-22T00:00:00");
    store::upsert_raw(&tx, &TEAM_BASIC, std::iter::once(store::basic_values(&again))).unwrap();
    tx.commit().unwrap();

    let rows = store::load_basic(&conn).unwrap();
    assert_eq!(rows.len(), 5);
    let tor = rows.iter().find(|r| r.team_id == 1).unwrap();
    assert_eq!(tor.wl.as_deref(), Some("L"));
}

#[test]
fn integer_game_ids_are_read_back_padded() {
    let conn = seeded();
    conn.execute(
        "UPDATE team_advanced_boxscores SET GAME_ID = 21900001 WHERE TEAM_ID = 1",
        [],
    )
    .unwrap();
    let rows = store::load_advanced(&conn).unwrap();
    assert!(rows.iter().any(|r| r.team_id == 1 && r.game_id == "0021900001"));
}

#[test]
fn matchup_transform_end_to_end() {
    let mut conn = seeded();
    let cfg = PipelineConfig {
        perspective: Perspective::HomeAway,
        ..config(OutputKind::MatchupBoxscores)
    };
    let output = pipeline::run(&conn, &cfg).unwrap();
    // BOS has no advanced or scoring row and is dropped by normalization.
    assert_eq!(output.team_games.len(), 4);
    assert_eq!(output.matchups.len(), 2);
    let tor = &output.matchups[0];
    assert_eq!(tor.side.team_abbreviation, "TOR");
    assert_eq!(tor.other.team_abbreviation, "NOP");
    assert_eq!(tor.side.counts.fg2m, 28);
    assert_eq!(tor.side.recovered.pts_fb, 11);

    let written = pipeline::persist(
        &mut conn,
        &output,
        OutputKind::MatchupBoxscores,
        cfg.perspective,
        "matchup_features",
        WriteMode::Replace,
    )
    .unwrap();
    assert_eq!(written, 2);
    let (home, away): (String, String) = conn
        .query_row(
            "SELECT TEAM_ABBREVIATION_home, TEAM_ABBREVIATION_away FROM matchup_features WHERE GAME_ID = '0021900001'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!((home.as_str(), away.as_str()), ("TOR", "NOP"));

    let types: (String, String, String, String) = conn
        .query_row(
            "SELECT typeof(FG2M_home), typeof(WL_home), typeof(AST_2PM_away), typeof(OFF_RATING_home) FROM matchup_features LIMIT 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .unwrap();
    assert_eq!(types.0, "integer");
    assert_eq!(types.1, "integer");
    assert_eq!(types.2, "integer");
    assert_eq!(types.3, "real");
}

#[test]
fn aggregate_transform_joins_player_means() {
    let mut conn = seeded();
    let cfg = config(OutputKind::AggBoxscores);
    let output = pipeline::run(&conn, &cfg).unwrap();
    assert_eq!(output.players.len(), 2);
    assert_eq!(output.features.len(), 1);
    assert_eq!(output.features[0].players.line.pts, 15.0);

    pipeline::persist(
        &mut conn,
        &output,
        OutputKind::AggBoxscores,
        cfg.perspective,
        cfg.table_name(),
        WriteMode::Replace,
    )
    .unwrap();
    let pts: f64 = conn
        .query_row("SELECT PTS_players FROM team_player_features", [], |row| row.get(0))
        .unwrap();
    assert_eq!(pts, 15.0);
}

#[test]
fn missing_column_is_a_schema_mismatch() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE team_basic_boxscores (SEASON TEXT, TEAM_ID INTEGER, GAME_ID TEXT);",
    )
    .unwrap();
    let err = store::load_basic(&conn).unwrap_err();
    assert!(matches!(err, PipelineError::SchemaMismatch { .. }));

    let empty = Connection::open_in_memory().unwrap();
    assert!(matches!(
        store::validate_schema(&empty, &TEAM_SCORING),
        Err(PipelineError::SchemaMismatch { .. })
    ));
}

#[test]
fn season_without_advanced_rows_is_incomplete() {
    let mut conn = seeded();
    let tx = conn.transaction().unwrap();
    let late = basic("0022000001", 1, "TOR", "TOR vs. BOS", "W", "2020-12-22T00:00:00");
    let late = BasicBoxscore {
        season: "2020-21".to_string(),
        ..late
    };
    store::upsert_raw(&tx, &TEAM_BASIC, std::iter::once(store::basic_values(&late))).unwrap();
    tx.commit().unwrap();

    let cfg = PipelineConfig {
        seasons: SeasonRange::new(2019, 2020).unwrap(),
        ..config(OutputKind::TeamBoxscores)
    };
    let err = pipeline::run(&conn, &cfg).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::SourceDataIncomplete { ref table, ref season }
            if table == "team_advanced_boxscores" && season == "2020-21"
    ));
}

#[test]
fn season_range_without_rows_is_empty() {
    let conn = seeded();
    let cfg = PipelineConfig {
        seasons: SeasonRange::new(2005, 2006).unwrap(),
        ..config(OutputKind::TeamBoxscores)
    };
    assert!(matches!(
        pipeline::run(&conn, &cfg),
        Err(PipelineError::EmptyResult(_))
    ));
}

#[test]
fn player_output_is_not_windowed() {
    let conn = seeded();
    let cfg = config(OutputKind::PlayerBoxscores);
    let output = pipeline::run(&conn, &cfg).unwrap();
    assert_eq!(output.players.len(), 2);
    assert!(matches!(
        pipeline::build_windows_for(&output, &cfg),
        Err(PipelineError::InvalidConfig(_))
    ));
}

fn row(n: i64) -> Vec<Value> {
    vec![Value::Integer(n), Value::Text(format!("r{n}"))]
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
        .unwrap()
}

#[test]
fn output_writes_replace_or_append() {
    let mut conn = Connection::open_in_memory().unwrap();
    let columns = vec!["ID".to_string(), "NAME".to_string()];

    store::write_table(&mut conn, "scratch", &columns, &[row(1), row(2)], WriteMode::Replace).unwrap();
    store::write_table(&mut conn, "scratch", &columns, &[row(3)], WriteMode::Append).unwrap();
    assert_eq!(count(&conn, "scratch"), 3);

    store::write_table(&mut conn, "scratch", &columns, &[row(9)], WriteMode::Replace).unwrap();
    assert_eq!(count(&conn, "scratch"), 1);
}

#[test]
fn failed_writes_leave_the_table_untouched() {
    let mut conn = Connection::open_in_memory().unwrap();
    let columns = vec!["ID".to_string(), "NAME".to_string()];
    store::write_table(&mut conn, "scratch", &columns, &[row(1), row(2)], WriteMode::Replace).unwrap();

    let other = vec!["ID".to_string(), "LABEL".to_string()];
    let err = store::write_table(&mut conn, "scratch", &other, &[row(3)], WriteMode::Append).unwrap_err();
    assert!(matches!(err, PipelineError::SchemaMismatch { .. }));

    let err = store::write_table(&mut conn, "scratch", &columns, &[], WriteMode::Replace).unwrap_err();
    assert!(matches!(err, PipelineError::EmptyResult(_)));

    let ragged = vec![row(4), vec![Value::Integer(5)]];
    let err = store::write_table(&mut conn, "scratch", &columns, &ragged, WriteMode::Replace).unwrap_err();
    assert!(matches!(err, PipelineError::SchemaMismatch { .. }));

    assert_eq!(count(&conn, "scratch"), 2);
}

#[test]
fn replace_that_fails_mid_transaction_keeps_the_old_table() {
    let mut conn = Connection::open_in_memory().unwrap();
    let columns = vec!["ID".to_string(), "NAME".to_string()];
    store::write_table(&mut conn, "scratch", &columns, &[row(1)], WriteMode::Replace).unwrap();

    // The table is dropped and recreated before the insert fails to parse.
    let broken = vec!["ID".to_string(), "BAD NAME".to_string()];
    let err = store::write_table(&mut conn, "scratch", &broken, &[row(2), row(3)], WriteMode::Replace)
        .unwrap_err();
    assert!(matches!(err, PipelineError::Storage(_)));

    assert_eq!(count(&conn, "scratch"), 1);
    let name: String = conn
        .query_row("SELECT NAME FROM scratch", [], |r| r.get(0))
        .unwrap();
    assert_eq!(name, "r1");
}
