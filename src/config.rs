use std::path::PathBuf;

use crate::derive::TruncationPolicy;
use crate::error::{PipelineError, Result};
use crate::matchup::Perspective;
use crate::pipeline::OutputKind;
use crate::season::SeasonRange;
use crate::store::WriteMode;
use crate::window::WindowScope;

const CACHE_DIR: &str = "nba_features";
const DB_FILE: &str = "nba_boxscores.sqlite";

pub const DEFAULT_START_SEASON: i32 = 2003;
pub const DEFAULT_END_SEASON: i32 = 2023;
pub const DEFAULT_WINDOW_LEN: usize = 10;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub db_path: PathBuf,
    pub seasons: SeasonRange,
    pub window_len: usize,
    pub perspective: Perspective,
    pub window_scope: WindowScope,
    pub write_mode: WriteMode,
    pub truncation: TruncationPolicy,
    pub output: OutputKind,
    pub output_table: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path().unwrap_or_else(|| PathBuf::from(DB_FILE)),
            seasons: SeasonRange {
                start: DEFAULT_START_SEASON,
                end: DEFAULT_END_SEASON,
            },
            window_len: DEFAULT_WINDOW_LEN,
            perspective: Perspective::default(),
            window_scope: WindowScope::default(),
            write_mode: WriteMode::default(),
            truncation: TruncationPolicy::default(),
            output: OutputKind::default(),
            output_table: None,
        }
    }
}

pub fn default_db_path() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(CACHE_DIR).join(DB_FILE));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR).join(DB_FILE))
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn invalid(key: &str, raw: &str) -> PipelineError {
    PipelineError::InvalidConfig(format!("{key}: unrecognised value {raw:?}"))
}

fn parse_with<T>(key: &str, raw: &str, parse: impl Fn(&str) -> Option<T>) -> Result<T> {
    parse(raw).ok_or_else(|| invalid(key, raw))
}

// `--name=value` or `--name value`; the last occurrence wins.
pub fn arg_value(args: &[String], name: &str) -> Option<String> {
    let prefix = format!("--{name}=");
    let flag = format!("--{name}");
    let mut found = None;
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                found = Some(trimmed.to_string());
            }
        } else if *arg == flag {
            if let Some(next) = args.get(idx + 1) {
                if !next.trim().is_empty() && !next.starts_with("--") {
                    found = Some(next.trim().to_string());
                }
            }
        }
    }
    found
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        let mut cfg = Self::default();
        cfg.apply(|key| env_value(&format!("NBA_{key}")))?;
        Ok(cfg)
    }

    pub fn apply_args(&mut self, args: &[String]) -> Result<()> {
        self.apply(|key| arg_value(args, &key.to_ascii_lowercase()))
    }

    fn apply(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let db = lookup("DB_PATH").or_else(|| lookup("DB"));
        if let Some(path) = db {
            self.db_path = PathBuf::from(path);
        }
        let start = lookup("START_SEASON").or_else(|| lookup("START"));
        if let Some(raw) = start {
            self.seasons.start = parse_year(&raw)?;
        }
        let end = lookup("END_SEASON").or_else(|| lookup("END"));
        if let Some(raw) = end {
            self.seasons.end = parse_year(&raw)?;
        }
        let window = lookup("WINDOW_LEN").or_else(|| lookup("WINDOW"));
        if let Some(raw) = window {
            self.window_len = parse_with("window", &raw, |s| s.parse::<usize>().ok())?;
        }
        if let Some(raw) = lookup("PERSPECTIVE") {
            self.perspective = parse_with("perspective", &raw, Perspective::parse)?;
        }
        let scope = lookup("WINDOW_SCOPE").or_else(|| lookup("SCOPE"));
        if let Some(raw) = scope {
            self.window_scope = parse_with("window scope", &raw, WindowScope::parse)?;
        }
        let mode = lookup("WRITE_MODE").or_else(|| lookup("MODE"));
        if let Some(raw) = mode {
            self.write_mode = parse_with("write mode", &raw, WriteMode::parse)?;
        }
        if let Some(raw) = lookup("TRUNCATION") {
            self.truncation = parse_with("truncation", &raw, TruncationPolicy::parse)?;
        }
        if let Some(raw) = lookup("OUTPUT") {
            self.output = parse_with("output", &raw, OutputKind::parse)?;
        }
        let table = lookup("OUTPUT_TABLE").or_else(|| lookup("TABLE"));
        if let Some(name) = table {
            self.output_table = Some(name);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        SeasonRange::new(self.seasons.start, self.seasons.end)
            .map_err(|err| PipelineError::InvalidConfig(err.to_string()))?;
        if self.window_len == 0 {
            return Err(PipelineError::InvalidConfig(
                "window length must be positive".to_string(),
            ));
        }
        if let Some(table) = &self.output_table {
            if table.trim().is_empty() {
                return Err(PipelineError::InvalidConfig(
                    "output table name is empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn table_name(&self) -> &str {
        self.output_table
            .as_deref()
            .unwrap_or_else(|| self.output.default_table())
    }
}

fn parse_year(raw: &str) -> Result<i32> {
    if raw.contains('-') {
        return crate::season::parse_season_label(raw);
    }
    raw.parse::<i32>()
        .map_err(|_| PipelineError::InvalidSeason(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn flags_accept_both_forms() {
        let argv = args(&["--start=2010", "--end", "2012-13", "--window", "5"]);
        let mut cfg = PipelineConfig::default();
        cfg.apply_args(&argv).unwrap();
        assert_eq!(cfg.seasons.start, 2010);
        assert_eq!(cfg.seasons.end, 2012);
        assert_eq!(cfg.window_len, 5);
        cfg.validate().unwrap();
    }

    #[test]
    fn output_selects_default_table() {
        let mut cfg = PipelineConfig::default();
        cfg.apply_args(&args(&["--output=team_boxscores"])).unwrap();
        assert_eq!(cfg.output, OutputKind::TeamBoxscores);
        assert_eq!(cfg.table_name(), OutputKind::TeamBoxscores.default_table());
        cfg.apply_args(&args(&["--table", "custom"])).unwrap();
        assert_eq!(cfg.table_name(), "custom");
    }

    #[test]
    fn bad_settings_are_rejected() {
        let mut cfg = PipelineConfig::default();
        assert!(matches!(
            cfg.apply_args(&args(&["--perspective=sideways"])),
            Err(PipelineError::InvalidConfig(_))
        ));

        let mut cfg = PipelineConfig::default();
        cfg.seasons.start = 2020;
        cfg.seasons.end = 2019;
        assert!(matches!(cfg.validate(), Err(PipelineError::InvalidConfig(_))));

        let mut cfg = PipelineConfig::default();
        cfg.window_len = 0;
        assert!(matches!(cfg.validate(), Err(PipelineError::InvalidConfig(_))));
    }
}
