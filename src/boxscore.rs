use chrono::NaiveDate;

/// A fixed, ordered group of numeric columns. `Option<f64>` lines are raw
/// rows straight from storage; `f64` lines have passed the null check.
pub trait StatLine<T>: Sized {
    const COLUMNS: &'static [&'static str];

    fn from_values<I: IntoIterator<Item = T>>(values: I) -> Option<Self>;

    fn into_values(self) -> Vec<T>;
}

pub fn complete<Raw, Done>(raw: Raw) -> Option<Done>
where
    Raw: StatLine<Option<f64>>,
    Done: StatLine<f64>,
{
    let values = raw.into_values().into_iter().collect::<Option<Vec<f64>>>()?;
    Done::from_values(values)
}

pub fn present<Done, Raw>(line: Done) -> Raw
where
    Done: StatLine<f64>,
    Raw: StatLine<Option<f64>>,
{
    // Both sides share one column list, so the lengths always agree.
    Raw::from_values(line.into_values().into_iter().map(Some))
        .unwrap_or_else(|| unreachable!("stat line width mismatch"))
}

macro_rules! stat_line {
    (
        $(#[$meta:meta])*
        $name:ident, $columns:ident { $($field:ident => $column:literal),+ $(,)? }
    ) => {
        pub const $columns: &[&str] = &[$($column),+];

        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Default)]
        pub struct $name<T = f64> {
            $(pub $field: T,)+
        }

        impl<T> $crate::boxscore::StatLine<T> for $name<T> {
            const COLUMNS: &'static [&'static str] = $columns;

            fn from_values<I: IntoIterator<Item = T>>(values: I) -> Option<Self> {
                let mut it = values.into_iter();
                Some(Self {
                    $($field: it.next()?,)+
                })
            }

            fn into_values(self) -> Vec<T> {
                vec![$(self.$field),+]
            }
        }
    };
}

pub(crate) use stat_line;

// Provider game ids are ten digits; ids that went through a numeric type
// lost their leading zeros and get them back here.
pub fn canonical_game_id(raw: &str) -> String {
    let raw = raw.trim();
    if !raw.is_empty() && raw.len() < 10 && raw.bytes().all(|b| b.is_ascii_digit()) {
        format!("{raw:0>10}")
    } else {
        raw.to_string()
    }
}

stat_line! {
    BasicLine, BASIC_STAT_COLUMNS {
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
        stl => "STL",
        blk => "BLK",
        tov => "TOV",
        pf => "PF",
        pts => "PTS",
        plus_minus => "PLUS_MINUS",
    }
}

stat_line! {
    AdvancedLine, ADVANCED_STAT_COLUMNS {
        e_off_rating => "E_OFF_RATING",
        off_rating => "OFF_RATING",
        e_def_rating => "E_DEF_RATING",
        def_rating => "DEF_RATING",
        e_net_rating => "E_NET_RATING",
        net_rating => "NET_RATING",
        ast_pct => "AST_PCT",
        ast_tov => "AST_TOV",
        ast_ratio => "AST_RATIO",
        oreb_pct => "OREB_PCT",
        dreb_pct => "DREB_PCT",
        reb_pct => "REB_PCT",
        e_tm_tov_pct => "E_TM_TOV_PCT",
        tm_tov_pct => "TM_TOV_PCT",
        efg_pct => "EFG_PCT",
        ts_pct => "TS_PCT",
        usg_pct => "USG_PCT",
        e_usg_pct => "E_USG_PCT",
        e_pace => "E_PACE",
        pace => "PACE",
        pace_per40 => "PACE_PER40",
        poss => "POSS",
        pie => "PIE",
    }
}

stat_line! {
    ScoringLine, SCORING_STAT_COLUMNS {
        pct_fga_2pt => "PCT_FGA_2PT",
        pct_fga_3pt => "PCT_FGA_3PT",
        pct_pts_2pt => "PCT_PTS_2PT",
        pct_pts_2pt_mr => "PCT_PTS_2PT_MR",
        pct_pts_3pt => "PCT_PTS_3PT",
        pct_pts_fb => "PCT_PTS_FB",
        pct_pts_ft => "PCT_PTS_FT",
        pct_pts_off_tov => "PCT_PTS_OFF_TOV",
        pct_pts_paint => "PCT_PTS_PAINT",
        pct_ast_2pm => "PCT_AST_2PM",
        pct_uast_2pm => "PCT_UAST_2PM",
        pct_ast_3pm => "PCT_AST_3PM",
        pct_uast_3pm => "PCT_UAST_3PM",
        pct_ast_fgm => "PCT_AST_FGM",
        pct_uast_fgm => "PCT_UAST_FGM",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BasicBoxscore {
    pub season: String,
    pub team_id: i64,
    pub team_abbreviation: Option<String>,
    pub team_name: Option<String>,
    pub game_id: String,
    pub game_date: Option<String>,
    pub matchup: Option<String>,
    pub wl: Option<String>,
    pub line: BasicLine<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdvancedBoxscore {
    pub game_id: String,
    pub team_id: i64,
    pub team_name: Option<String>,
    pub team_abbreviation: Option<String>,
    pub team_city: Option<String>,
    pub min: Option<String>,
    pub line: AdvancedLine<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoringBoxscore {
    pub game_id: String,
    pub team_id: i64,
    pub team_name: Option<String>,
    pub team_abbreviation: Option<String>,
    pub team_city: Option<String>,
    pub min: Option<String>,
    pub line: ScoringLine<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinedTeamGame {
    pub basic: BasicBoxscore,
    pub advanced: Option<AdvancedBoxscore>,
    pub scoring: Option<ScoringBoxscore>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamGameRecord {
    pub season: String,
    pub team_id: i64,
    pub team_abbreviation: String,
    pub team_name: String,
    pub game_id: String,
    pub game_date: NaiveDate,
    pub matchup: String,
    pub home_game: u8,
    pub wl: u8,
    pub basic: BasicLine,
    pub advanced: AdvancedLine,
    pub scoring: ScoringLine,
}
