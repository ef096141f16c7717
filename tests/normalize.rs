use chrono::NaiveDate;

use nba_features::boxscore::{
    AdvancedBoxscore, AdvancedLine, BasicBoxscore, BasicLine, JoinedTeamGame, ScoringBoxscore,
    ScoringLine, TeamGameRecord, present,
};
use nba_features::franchise::{canonical_abbreviation, normalize_matchup, normalize_team_games};

fn basic(abbr: &str, matchup: &str, wl: &str, date: &str) -> BasicBoxscore {
    BasicBoxscore {
        season: "2007-08".to_string(),
        team_id: 1610612760,
        team_abbreviation: Some(abbr.to_string()),
        team_name: Some("Seattle SuperSonics".to_string()),
        game_id: "0020700001".to_string(),
        game_date: Some(date.to_string()),
        matchup: Some(matchup.to_string()),
        wl: Some(wl.to_string()),
        line: present(BasicLine {
            fgm: 40.0,
            fga: 85.0,
            fg3m: 6.0,
            fg3a: 18.0,
            pts: 98.0,
            ..Default::default()
        }),
    }
}

fn joined(basic: BasicBoxscore) -> JoinedTeamGame {
    JoinedTeamGame {
        advanced: Some(AdvancedBoxscore {
            game_id: basic.game_id.clone(),
            team_id: basic.team_id,
            team_name: None,
            team_abbreviation: None,
            team_city: None,
            min: Some("240:00".to_string()),
            line: present(AdvancedLine::<f64>::default()),
        }),
        scoring: Some(ScoringBoxscore {
            game_id: basic.game_id.clone(),
            team_id: basic.team_id,
            team_name: None,
            team_abbreviation: None,
            team_city: None,
            min: Some("240:00".to_string()),
            line: present(ScoringLine::<f64>::default()),
        }),
        basic,
    }
}

#[test]
fn historical_codes_are_rewritten_everywhere() {
    let rows = normalize_team_games(vec![joined(basic(
        "SEA",
        "SEA vs. NJN",
        "W",
        "2007-10-31",
    ))]);
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.team_abbreviation, "OKC");
    assert_eq!(row.matchup, "OKC vs. BKN");
    assert_eq!(row.home_game, 1);
    assert_eq!(row.wl, 1);
    assert_eq!(row.game_date, NaiveDate::from_ymd_opt(2007, 10, 31).unwrap());
}

#[test]
fn away_games_and_losses_map_to_zero() {
    let rows = normalize_team_games(vec![joined(basic(
        "NOK",
        "NOK @ CHH",
        "L",
        "2007-11-02T00:00:00",
    ))]);
    let row = &rows[0];
    assert_eq!(row.team_abbreviation, "NOP");
    assert_eq!(row.matchup, "NOP @ CHA");
    assert_eq!(row.home_game, 0);
    assert_eq!(row.wl, 0);
}

#[test]
fn normalization_is_idempotent() {
    let once = normalize_team_games(vec![
        joined(basic("SEA", "SEA vs. VAN", "W", "2007-10-31")),
        joined(basic("BOS", "BOS @ NOH", "L", "2007-11-01")),
    ]);
    let twice = once
        .clone()
        .into_iter()
        .map(TeamGameRecord::normalized)
        .collect::<Vec<_>>();
    assert_eq!(once, twice);
    assert_eq!(normalize_matchup("OKC vs. BKN"), "OKC vs. BKN");
    assert_eq!(canonical_abbreviation("OKC"), "OKC");
}

#[test]
fn unrelated_substrings_are_left_alone() {
    assert_eq!(normalize_matchup("SEAX vs. LAL"), "SEAX vs. LAL");
    assert_eq!(canonical_abbreviation("LAL"), "LAL");
}

#[test]
fn rows_with_missing_fields_are_dropped() {
    let mut no_date = basic("SEA", "SEA vs. LAL", "W", "2007-10-31");
    no_date.game_date = None;

    let mut no_points = basic("SEA", "SEA vs. LAL", "W", "2007-10-31");
    no_points.line.pts = None;

    let mut no_scoring = joined(basic("SEA", "SEA vs. LAL", "W", "2007-10-31"));
    no_scoring.scoring = None;

    let rows = normalize_team_games(vec![
        joined(no_date),
        joined(no_points),
        no_scoring,
        joined(basic("SEA", "SEA vs. LAL", "W", "2007-10-31")),
    ]);
    assert_eq!(rows.len(), 1);
}
