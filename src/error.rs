use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("source data incomplete: {table} has no rows for season {season}")]
    SourceDataIncomplete { table: String, season: String },

    #[error("schema mismatch in {table}: {detail}")]
    SchemaMismatch { table: String, detail: String },

    #[error("empty result: {0}")]
    EmptyResult(String),

    #[error("{column} = {value} does not fit 0..={bound} (game {game_id}, team {team_id})")]
    OverflowInTruncation {
        column: &'static str,
        value: f64,
        bound: u8,
        game_id: String,
        team_id: i64,
    },

    #[error("inconsistent record (game {game_id}, team {team_id}): {detail}")]
    InconsistentRecord {
        game_id: String,
        team_id: i64,
        detail: String,
    },

    #[error("game {game_id} has {rows} team rows, expected at most 2")]
    DuplicateKey { game_id: String, rows: usize },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid season label: {0}")]
    InvalidSeason(String),

    #[error("data source error: {0}")]
    Source(String),

    #[error("sqlite error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
