use chrono::NaiveDate;
use rusqlite::types::Value;
use tracing::debug;

use crate::boxscore::{StatLine, TeamGameRecord, stat_line};
use crate::error::{PipelineError, Result};

stat_line! {
    CountLine, COUNT_COLUMNS {
        fg2m => "FG2M",
        fg2a => "FG2A",
        fg3m => "FG3M",
        fg3a => "FG3A",
        ftm => "FTM",
        fta => "FTA",
        oreb => "OREB",
        dreb => "DREB",
        reb => "REB",
        ast => "AST",
        stl => "STL",
        blk => "BLK",
        tov => "TOV",
        pf => "PF",
        pts => "PTS",
        plus_minus => "PLUS_MINUS",
    }
}

stat_line! {
    RatingLine, RATING_COLUMNS {
        e_off_rating => "E_OFF_RATING",
        off_rating => "OFF_RATING",
        e_def_rating => "E_DEF_RATING",
        def_rating => "DEF_RATING",
        e_net_rating => "E_NET_RATING",
        net_rating => "NET_RATING",
        poss => "POSS",
        pie => "PIE",
    }
}

stat_line! {
    RecoveredLine, RECOVERED_COLUMNS {
        pts_2pt_mr => "PTS_2PT_MR",
        pts_fb => "PTS_FB",
        pts_off_tov => "PTS_OFF_TOV",
        pts_paint => "PTS_PAINT",
        ast_2pm => "AST_2PM",
        ast_3pm => "AST_3PM",
        uast_2pm => "UAST_2PM",
        uast_3pm => "UAST_3PM",
    }
}

pub const IDENTITY_COLUMNS: &[&str] = &[
    "SEASON",
    "TEAM_ID",
    "TEAM_ABBREVIATION",
    "TEAM_NAME",
    "GAME_ID",
    "GAME_DATE",
    "MATCHUP",
];

// Absorbs float error like 100.0 * 0.29 == 28.999999999999996.
const TRUNCATION_EPSILON: f64 = 1e-9;

/// What to do when `count * share` leaves `0..=min(count, u8::MAX)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TruncationPolicy {
    #[default]
    Reject,
    Clamp,
}

impl TruncationPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "reject" => Some(Self::Reject),
            "clamp" => Some(Self::Clamp),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DerivedTeamGame {
    pub season: String,
    pub team_id: i64,
    pub team_abbreviation: String,
    pub team_name: String,
    pub game_id: String,
    pub game_date: NaiveDate,
    pub matchup: String,
    pub home_game: u8,
    pub wl: u8,
    pub counts: CountLine<i32>,
    pub ratings: RatingLine,
    pub recovered: RecoveredLine<u8>,
}

impl DerivedTeamGame {
    pub fn fgm(&self) -> i32 {
        self.counts.fg2m + self.counts.fg3m
    }

    pub fn fga(&self) -> i32 {
        self.counts.fg2a + self.counts.fg3a
    }

    pub fn numeric_columns() -> Vec<&'static str> {
        let mut out = vec!["HOME_GAME", "WL"];
        out.extend_from_slice(COUNT_COLUMNS);
        out.extend_from_slice(RATING_COLUMNS);
        out.extend_from_slice(RECOVERED_COLUMNS);
        out
    }

    pub fn numeric_values(&self) -> Vec<f64> {
        let mut out = vec![f64::from(self.home_game), f64::from(self.wl)];
        out.extend(self.counts.into_values().into_iter().map(f64::from));
        out.extend(self.ratings.into_values());
        out.extend(self.recovered.into_values().into_iter().map(f64::from));
        out
    }

    pub fn sql_columns() -> Vec<&'static str> {
        let mut out = IDENTITY_COLUMNS.to_vec();
        out.extend(Self::numeric_columns());
        out
    }

    pub fn sql_values(&self) -> Vec<Value> {
        let mut out = vec![
            Value::Text(self.season.clone()),
            Value::Integer(self.team_id),
            Value::Text(self.team_abbreviation.clone()),
            Value::Text(self.team_name.clone()),
            Value::Text(self.game_id.clone()),
            Value::Text(self.game_date.format("%Y-%m-%d").to_string()),
            Value::Text(self.matchup.clone()),
            Value::Integer(i64::from(self.home_game)),
            Value::Integer(i64::from(self.wl)),
        ];
        out.extend(
            self.counts
                .into_values()
                .into_iter()
                .map(|v| Value::Integer(i64::from(v))),
        );
        out.extend(self.ratings.into_values().into_iter().map(Value::Real));
        out.extend(
            self.recovered
                .into_values()
                .into_iter()
                .map(|v| Value::Integer(i64::from(v))),
        );
        out
    }
}

struct Deriver<'a> {
    record: &'a TeamGameRecord,
    policy: TruncationPolicy,
}

impl Deriver<'_> {
    fn inconsistent(&self, detail: String) -> PipelineError {
        PipelineError::InconsistentRecord {
            game_id: self.record.game_id.clone(),
            team_id: self.record.team_id,
            detail,
        }
    }

    fn count(&self, column: &str, value: f64) -> Result<i32> {
        let rounded = value.round();
        if !rounded.is_finite() || rounded < 0.0 || rounded > f64::from(i32::MAX) {
            return Err(self.inconsistent(format!("{column} = {value} is not a count")));
        }
        Ok(rounded as i32)
    }

    fn difference(&self, column: &str, total: i32, part: i32) -> Result<i32> {
        if part > total {
            return Err(self.inconsistent(format!("{column}: {part} of {total}")));
        }
        Ok(total - part)
    }

    fn recover(&self, column: &'static str, base: i32, share: f64) -> Result<u8> {
        let bound = base.clamp(0, i32::from(u8::MAX)) as u8;
        let raw = f64::from(base) * share;
        let overflow = PipelineError::OverflowInTruncation {
            column,
            value: raw,
            bound,
            game_id: self.record.game_id.clone(),
            team_id: self.record.team_id,
        };
        if raw.is_nan() {
            return Err(overflow);
        }
        let truncated = (raw + TRUNCATION_EPSILON).trunc();
        if (0.0..=f64::from(bound)).contains(&truncated) {
            return Ok(truncated as u8);
        }
        match self.policy {
            TruncationPolicy::Reject => Err(overflow),
            TruncationPolicy::Clamp => Ok(truncated.clamp(0.0, f64::from(bound)) as u8),
        }
    }

    fn derive(&self) -> Result<DerivedTeamGame> {
        let r = self.record;
        let b = &r.basic;
        let fgm = self.count("FGM", b.fgm)?;
        let fga = self.count("FGA", b.fga)?;
        let fg3m = self.count("FG3M", b.fg3m)?;
        let fg3a = self.count("FG3A", b.fg3a)?;
        let fg2m = self.difference("FG2M", fgm, fg3m)?;
        let fg2a = self.difference("FG2A", fga, fg3a)?;
        let pts = self.count("PTS", b.pts)?;
        let plus_minus = b.plus_minus.round() as i32;

        let counts = CountLine {
            fg2m,
            fg2a,
            fg3m,
            fg3a,
            ftm: self.count("FTM", b.ftm)?,
            fta: self.count("FTA", b.fta)?,
            oreb: self.count("OREB", b.oreb)?,
            dreb: self.count("DREB", b.dreb)?,
            reb: self.count("REB", b.reb)?,
            ast: self.count("AST", b.ast)?,
            stl: self.count("STL", b.stl)?,
            blk: self.count("BLK", b.blk)?,
            tov: self.count("TOV", b.tov)?,
            pf: self.count("PF", b.pf)?,
            pts,
            plus_minus,
        };

        let a = &r.advanced;
        let ratings = RatingLine {
            e_off_rating: a.e_off_rating,
            off_rating: a.off_rating,
            e_def_rating: a.e_def_rating,
            def_rating: a.def_rating,
            e_net_rating: a.e_net_rating,
            net_rating: a.net_rating,
            poss: a.poss,
            pie: a.pie,
        };

        let s = &r.scoring;
        let recovered = RecoveredLine {
            pts_2pt_mr: self.recover("PTS_2PT_MR", pts, s.pct_pts_2pt_mr)?,
            pts_fb: self.recover("PTS_FB", pts, s.pct_pts_fb)?,
            pts_off_tov: self.recover("PTS_OFF_TOV", pts, s.pct_pts_off_tov)?,
            pts_paint: self.recover("PTS_PAINT", pts, s.pct_pts_paint)?,
            ast_2pm: self.recover("AST_2PM", fg2m, s.pct_ast_2pm)?,
            ast_3pm: self.recover("AST_3PM", fg3m, s.pct_ast_3pm)?,
            uast_2pm: self.recover("UAST_2PM", fg2m, s.pct_uast_2pm)?,
            uast_3pm: self.recover("UAST_3PM", fg3m, s.pct_uast_3pm)?,
        };

        Ok(DerivedTeamGame {
            season: r.season.clone(),
            team_id: r.team_id,
            team_abbreviation: r.team_abbreviation.clone(),
            team_name: r.team_name.clone(),
            game_id: r.game_id.clone(),
            game_date: r.game_date,
            matchup: r.matchup.clone(),
            home_game: r.home_game,
            wl: r.wl,
            counts,
            ratings,
            recovered,
        })
    }
}

pub fn derive_team_game(record: &TeamGameRecord, policy: TruncationPolicy) -> Result<DerivedTeamGame> {
    Deriver { record, policy }.derive()
}

pub fn derive_team_games(
    records: &[TeamGameRecord],
    policy: TruncationPolicy,
) -> Result<Vec<DerivedTeamGame>> {
    let out = records
        .iter()
        .map(|r| derive_team_game(r, policy))
        .collect::<Result<Vec<_>>>()?;
    debug!(rows = out.len(), ?policy, "derived team features");
    Ok(out)
}
