use std::collections::HashSet;
use std::path::Path;

use rusqlite::types::{Value, ValueRef};
use rusqlite::{Connection, Row, Transaction, params_from_iter};
use tracing::{debug, info};

use crate::boxscore::{
    AdvancedBoxscore, AdvancedLine, BasicBoxscore, BasicLine, ScoringBoxscore, ScoringLine,
    StatLine, canonical_game_id,
};
use crate::error::{PipelineError, Result};
use crate::player::{PLAYER_RANK_COLUMNS, PlayerGameLog, PlayerLine};
use crate::schema::{PLAYER_LOGS, TEAM_ADVANCED, TEAM_BASIC, TEAM_SCORING, TableSchema, raw_tables};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    #[default]
    Replace,
    Append,
}

impl WriteMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "replace" => Some(Self::Replace),
            "append" => Some(Self::Append),
            _ => None,
        }
    }
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    init_raw_schema(&conn)?;
    Ok(conn)
}

pub fn init_raw_schema(conn: &Connection) -> Result<()> {
    for schema in raw_tables() {
        conn.execute_batch(&schema.create_sql())?;
    }
    Ok(())
}

pub fn reset_raw_tables(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;
    for schema in raw_tables() {
        tx.execute_batch(&format!("DROP TABLE IF EXISTS {};", schema.name))?;
        tx.execute_batch(&schema.create_sql())?;
    }
    tx.commit()?;
    Ok(())
}

pub fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
    let rows = stmt.query_map([table], |row| row.get::<_, String>(0))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn validate_schema(conn: &Connection, schema: &TableSchema) -> Result<()> {
    let present = table_columns(conn, schema.name)?;
    if present.is_empty() {
        return Err(PipelineError::SchemaMismatch {
            table: schema.name.to_string(),
            detail: "table does not exist".to_string(),
        });
    }
    let present = present.into_iter().collect::<HashSet<_>>();
    let missing = schema
        .column_names()
        .into_iter()
        .filter(|c| !present.contains(*c))
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(PipelineError::SchemaMismatch {
            table: schema.name.to_string(),
            detail: format!("missing columns {}", missing.join(", ")),
        });
    }
    Ok(())
}

// GAME_ID may come back as an integer, or as text without its leading
// zeros.
fn game_id_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<String> {
    match row.get_ref(idx)? {
        ValueRef::Integer(n) => Ok(format!("{n:010}")),
        ValueRef::Real(f) => Ok(format!("{:010}", f as i64)),
        ValueRef::Text(t) => Ok(canonical_game_id(&String::from_utf8_lossy(t))),
        other => Err(rusqlite::Error::FromSqlConversionFailure(
            idx,
            other.data_type(),
            "GAME_ID must be text or integer".into(),
        )),
    }
}

fn text_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<String>> {
    match row.get_ref(idx)? {
        ValueRef::Null => Ok(None),
        ValueRef::Text(t) => Ok(Some(String::from_utf8_lossy(t).to_string())),
        ValueRef::Integer(n) => Ok(Some(n.to_string())),
        ValueRef::Real(f) => Ok(Some(f.to_string())),
        ValueRef::Blob(_) => Err(rusqlite::Error::InvalidColumnType(
            idx,
            "text".to_string(),
            rusqlite::types::Type::Blob,
        )),
    }
}

fn line_at<L: StatLine<Option<f64>>>(row: &Row<'_>, offset: usize) -> rusqlite::Result<L> {
    let values = (0..L::COLUMNS.len())
        .map(|i| row.get::<_, Option<f64>>(offset + i))
        .collect::<rusqlite::Result<Vec<_>>>()?;
    L::from_values(values).ok_or(rusqlite::Error::InvalidColumnIndex(offset))
}

fn load_rows<T>(
    conn: &Connection,
    schema: &TableSchema,
    map: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Vec<T>> {
    validate_schema(conn, schema)?;
    let mut stmt = conn.prepare(&schema.select_sql())?;
    let rows = stmt.query_map([], map)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    debug!(table = schema.name, rows = out.len(), "loaded raw table");
    Ok(out)
}

pub fn load_basic(conn: &Connection) -> Result<Vec<BasicBoxscore>> {
    load_rows(conn, &TEAM_BASIC, |row| {
        Ok(BasicBoxscore {
            season: row.get(0)?,
            team_id: row.get(1)?,
            team_abbreviation: text_at(row, 2)?,
            team_name: text_at(row, 3)?,
            game_id: game_id_at(row, 4)?,
            game_date: text_at(row, 5)?,
            matchup: text_at(row, 6)?,
            wl: text_at(row, 7)?,
            line: line_at(row, 8)?,
        })
    })
}

pub fn load_advanced(conn: &Connection) -> Result<Vec<AdvancedBoxscore>> {
    load_rows(conn, &TEAM_ADVANCED, |row| {
        Ok(AdvancedBoxscore {
            game_id: game_id_at(row, 0)?,
            team_id: row.get(1)?,
            team_name: text_at(row, 2)?,
            team_abbreviation: text_at(row, 3)?,
            team_city: text_at(row, 4)?,
            min: text_at(row, 5)?,
            line: line_at(row, 6)?,
        })
    })
}

pub fn load_scoring(conn: &Connection) -> Result<Vec<ScoringBoxscore>> {
    load_rows(conn, &TEAM_SCORING, |row| {
        Ok(ScoringBoxscore {
            game_id: game_id_at(row, 0)?,
            team_id: row.get(1)?,
            team_name: text_at(row, 2)?,
            team_abbreviation: text_at(row, 3)?,
            team_city: text_at(row, 4)?,
            min: text_at(row, 5)?,
            line: line_at(row, 6)?,
        })
    })
}

pub fn load_player_logs(conn: &Connection) -> Result<Vec<PlayerGameLog>> {
    let ranks_at = 11 + PlayerLine::<f64>::COLUMNS.len();
    let extras_at = ranks_at + PLAYER_RANK_COLUMNS.len();
    load_rows(conn, &PLAYER_LOGS, |row| {
        let ranks = (0..PLAYER_RANK_COLUMNS.len())
            .map(|i| row.get::<_, Option<f64>>(ranks_at + i))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(PlayerGameLog {
            season_year: row.get(0)?,
            player_id: row.get(1)?,
            player_name: text_at(row, 2)?,
            nickname: text_at(row, 3)?,
            team_id: row.get(4)?,
            team_abbreviation: text_at(row, 5)?,
            team_name: text_at(row, 6)?,
            game_id: game_id_at(row, 7)?,
            game_date: text_at(row, 8)?,
            matchup: text_at(row, 9)?,
            wl: text_at(row, 10)?,
            line: line_at(row, 11)?,
            ranks,
            wnba_fantasy_pts: row.get(extras_at)?,
            available_flag: row.get(extras_at + 1)?,
        })
    })
}

fn reals<L: StatLine<Option<f64>>>(line: L) -> impl Iterator<Item = Value> {
    line.into_values().into_iter().map(Value::from)
}

fn text(v: &Option<String>) -> Value {
    Value::from(v.clone())
}

pub fn basic_values(r: &BasicBoxscore) -> Vec<Value> {
    let mut out = vec![
        Value::Text(r.season.clone()),
        Value::Integer(r.team_id),
        text(&r.team_abbreviation),
        text(&r.team_name),
        Value::Text(r.game_id.clone()),
        text(&r.game_date),
        text(&r.matchup),
        text(&r.wl),
    ];
    out.extend(reals::<BasicLine<Option<f64>>>(r.line));
    out
}

pub fn advanced_values(r: &AdvancedBoxscore) -> Vec<Value> {
    let mut out = vec![
        Value::Text(r.game_id.clone()),
        Value::Integer(r.team_id),
        text(&r.team_name),
        text(&r.team_abbreviation),
        text(&r.team_city),
        text(&r.min),
    ];
    out.extend(reals::<AdvancedLine<Option<f64>>>(r.line));
    out
}

pub fn scoring_values(r: &ScoringBoxscore) -> Vec<Value> {
    let mut out = vec![
        Value::Text(r.game_id.clone()),
        Value::Integer(r.team_id),
        text(&r.team_name),
        text(&r.team_abbreviation),
        text(&r.team_city),
        text(&r.min),
    ];
    out.extend(reals::<ScoringLine<Option<f64>>>(r.line));
    out
}

pub fn player_values(r: &PlayerGameLog) -> Vec<Value> {
    let mut out = vec![
        Value::Text(r.season_year.clone()),
        Value::Integer(r.player_id),
        text(&r.player_name),
        text(&r.nickname),
        Value::Integer(r.team_id),
        text(&r.team_abbreviation),
        text(&r.team_name),
        Value::Text(r.game_id.clone()),
        text(&r.game_date),
        text(&r.matchup),
        text(&r.wl),
    ];
    out.extend(reals::<PlayerLine<Option<f64>>>(r.line));
    let mut ranks = r.ranks.clone();
    ranks.resize(PLAYER_RANK_COLUMNS.len(), None);
    out.extend(ranks.into_iter().map(Value::from));
    out.push(Value::from(r.wnba_fantasy_pts));
    out.push(Value::from(r.available_flag));
    out
}

pub fn upsert_raw(
    tx: &Transaction<'_>,
    schema: &TableSchema,
    rows: impl IntoIterator<Item = Vec<Value>>,
) -> Result<usize> {
    let mut stmt = tx.prepare_cached(&schema.insert_sql())?;
    let mut n = 0usize;
    for values in rows {
        stmt.execute(params_from_iter(values))?;
        n += 1;
    }
    Ok(n)
}

pub fn stored_game_ids(conn: &Connection, schema: &TableSchema) -> Result<HashSet<String>> {
    let mut stmt = conn.prepare(&format!("SELECT DISTINCT GAME_ID FROM {}", schema.name))?;
    let rows = stmt.query_map([], |row| game_id_at(row, 0))?;
    let mut out = HashSet::new();
    for row in rows {
        out.insert(row?);
    }
    Ok(out)
}

fn check_table_name(table: &str) -> Result<()> {
    let valid = !table.is_empty()
        && table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !table.starts_with(|c: char| c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(PipelineError::InvalidConfig(format!(
            "invalid output table name {table:?}"
        )))
    }
}

fn output_type(value: &Value) -> &'static str {
    match value {
        Value::Integer(_) => "INTEGER",
        Value::Real(_) => "REAL",
        Value::Text(_) => "TEXT",
        Value::Blob(_) => "BLOB",
        Value::Null => "",
    }
}

/// Writes a whole output table in one transaction. Replace drops and
/// recreates the table inside it, so a failed write leaves the previous
/// table untouched. Append requires the existing columns to match.
pub fn write_table(
    conn: &mut Connection,
    table: &str,
    columns: &[String],
    rows: &[Vec<Value>],
    mode: WriteMode,
) -> Result<usize> {
    check_table_name(table)?;
    let Some(first) = rows.first() else {
        return Err(PipelineError::EmptyResult(format!(
            "refusing to write empty table {table}"
        )));
    };
    if let Some(bad) = rows.iter().find(|r| r.len() != columns.len()) {
        return Err(PipelineError::SchemaMismatch {
            table: table.to_string(),
            detail: format!("row has {} values for {} columns", bad.len(), columns.len()),
        });
    }

    let tx = conn.transaction()?;
    match mode {
        WriteMode::Replace => {
            tx.execute_batch(&format!("DROP TABLE IF EXISTS {table};"))?;
        }
        WriteMode::Append => {
            let existing = table_columns(&tx, table)?;
            if !existing.is_empty() && existing != columns {
                return Err(PipelineError::SchemaMismatch {
                    table: table.to_string(),
                    detail: "existing columns differ from the output schema".to_string(),
                });
            }
        }
    }

    let defs = columns
        .iter()
        .zip(first)
        .map(|(name, value)| format!("{name} {}", output_type(value)).trim_end().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    tx.execute_batch(&format!("CREATE TABLE IF NOT EXISTS {table} ({defs});"))?;

    let placeholders = (1..=columns.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO {table} ({}) VALUES ({placeholders})",
        columns.join(", ")
    );
    {
        let mut stmt = tx.prepare(&sql)?;
        for row in rows {
            stmt.execute(params_from_iter(row.iter()))?;
        }
    }
    tx.commit()?;
    info!(table, rows = rows.len(), ?mode, "wrote output table");
    Ok(rows.len())
}
