use crate::boxscore::{ADVANCED_STAT_COLUMNS, BASIC_STAT_COLUMNS, SCORING_STAT_COLUMNS};
use crate::player::{PLAYER_NON_NBA_COLUMNS, PLAYER_RANK_COLUMNS, PLAYER_STAT_COLUMNS};

pub const TEAM_BASIC_TABLE: &str = "team_basic_boxscores";
pub const TEAM_ADVANCED_TABLE: &str = "team_advanced_boxscores";
pub const TEAM_SCORING_TABLE: &str = "team_scoring_boxscores";
pub const PLAYER_LOG_TABLE: &str = "player_game_logs";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
    Real,
}

impl SqlType {
    pub fn as_sql(self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub ty: SqlType,
    pub required: bool,
}

impl Column {
    const fn key(name: &'static str, ty: SqlType) -> Self {
        Self {
            name,
            ty,
            required: true,
        }
    }

    const fn text(name: &'static str) -> Self {
        Self {
            name,
            ty: SqlType::Text,
            required: false,
        }
    }
}

#[derive(Debug)]
pub struct TableSchema {
    pub name: &'static str,
    pub identity: &'static [Column],
    pub stat_groups: &'static [&'static [&'static str]],
    pub unique_key: &'static [&'static str],
}

impl TableSchema {
    pub fn columns(&self) -> Vec<Column> {
        let mut out = self.identity.to_vec();
        for group in self.stat_groups {
            out.extend(group.iter().map(|&name| Column {
                name,
                ty: SqlType::Real,
                required: false,
            }));
        }
        out
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns().iter().map(|c| c.name).collect()
    }

    pub fn create_sql(&self) -> String {
        let cols = self
            .columns()
            .iter()
            .map(|c| {
                let null = if c.required { " NOT NULL" } else { "" };
                format!("{} {}{}", c.name, c.ty.as_sql(), null)
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({cols});\n\
             CREATE UNIQUE INDEX IF NOT EXISTS idx_{}_key ON {}({});",
            self.name,
            self.name,
            self.name,
            self.unique_key.join(", ")
        )
    }

    pub fn select_sql(&self) -> String {
        format!("SELECT {} FROM {}", self.column_names().join(", "), self.name)
    }

    pub fn insert_sql(&self) -> String {
        let names = self.column_names();
        let placeholders = (1..=names.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "INSERT OR REPLACE INTO {} ({}) VALUES ({placeholders})",
            self.name,
            names.join(", ")
        )
    }
}

pub static TEAM_BASIC: TableSchema = TableSchema {
    name: TEAM_BASIC_TABLE,
    identity: &[
        Column::key("SEASON", SqlType::Text),
        Column::key("TEAM_ID", SqlType::Integer),
        Column::text("TEAM_ABBREVIATION"),
        Column::text("TEAM_NAME"),
        Column::key("GAME_ID", SqlType::Text),
        Column::text("GAME_DATE"),
        Column::text("MATCHUP"),
        Column::text("WL"),
    ],
    stat_groups: &[BASIC_STAT_COLUMNS],
    unique_key: &["GAME_ID", "TEAM_ID"],
};

pub static TEAM_ADVANCED: TableSchema = TableSchema {
    name: TEAM_ADVANCED_TABLE,
    identity: &[
        Column::key("GAME_ID", SqlType::Text),
        Column::key("TEAM_ID", SqlType::Integer),
        Column::text("TEAM_NAME"),
        Column::text("TEAM_ABBREVIATION"),
        Column::text("TEAM_CITY"),
        Column::text("MIN"),
    ],
    stat_groups: &[ADVANCED_STAT_COLUMNS],
    unique_key: &["GAME_ID", "TEAM_ID"],
};

pub static TEAM_SCORING: TableSchema = TableSchema {
    name: TEAM_SCORING_TABLE,
    identity: &[
        Column::key("GAME_ID", SqlType::Text),
        Column::key("TEAM_ID", SqlType::Integer),
        Column::text("TEAM_NAME"),
        Column::text("TEAM_ABBREVIATION"),
        Column::text("TEAM_CITY"),
        Column::text("MIN"),
    ],
    stat_groups: &[SCORING_STAT_COLUMNS],
    unique_key: &["GAME_ID", "TEAM_ID"],
};

pub static PLAYER_LOGS: TableSchema = TableSchema {
    name: PLAYER_LOG_TABLE,
    identity: &[
        Column::key("SEASON_YEAR", SqlType::Text),
        Column::key("PLAYER_ID", SqlType::Integer),
        Column::text("PLAYER_NAME"),
        Column::text("NICKNAME"),
        Column::key("TEAM_ID", SqlType::Integer),
        Column::text("TEAM_ABBREVIATION"),
        Column::text("TEAM_NAME"),
        Column::key("GAME_ID", SqlType::Text),
        Column::text("GAME_DATE"),
        Column::text("MATCHUP"),
        Column::text("WL"),
    ],
    stat_groups: &[
        PLAYER_STAT_COLUMNS,
        PLAYER_RANK_COLUMNS,
        PLAYER_NON_NBA_COLUMNS,
    ],
    unique_key: &["GAME_ID", "TEAM_ID", "PLAYER_ID"],
};

pub fn raw_tables() -> [&'static TableSchema; 4] {
    [&TEAM_BASIC, &TEAM_ADVANCED, &TEAM_SCORING, &PLAYER_LOGS]
}
