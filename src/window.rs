use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::derive::DerivedTeamGame;
use crate::error::{PipelineError, Result};
use crate::matchup::MatchupRecord;
use crate::player::{TeamGameFeatures, TeamPlayerAggregate};

pub trait FeatureRow {
    fn feature_names(&self) -> Vec<String>;
    fn feature_values(&self) -> Vec<f64>;
    fn label_name(&self) -> String;
    fn label(&self) -> f64;
    fn partition_key(&self) -> &str;
    fn game_id(&self) -> &str;
    fn season(&self) -> &str;
    fn game_date(&self) -> NaiveDate;
}

impl FeatureRow for DerivedTeamGame {
    fn feature_names(&self) -> Vec<String> {
        Self::numeric_columns()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    fn feature_values(&self) -> Vec<f64> {
        self.numeric_values()
    }

    fn label_name(&self) -> String {
        "WL".to_string()
    }

    fn label(&self) -> f64 {
        f64::from(self.wl)
    }

    fn partition_key(&self) -> &str {
        &self.team_abbreviation
    }

    fn game_id(&self) -> &str {
        &self.game_id
    }

    fn season(&self) -> &str {
        &self.season
    }

    fn game_date(&self) -> NaiveDate {
        self.game_date
    }
}

impl FeatureRow for MatchupRecord {
    fn feature_names(&self) -> Vec<String> {
        Self::numeric_columns(self.perspective)
    }

    fn feature_values(&self) -> Vec<f64> {
        self.numeric_values()
    }

    fn label_name(&self) -> String {
        format!("WL{}", self.perspective.suffixes().0)
    }

    fn label(&self) -> f64 {
        f64::from(self.side.wl)
    }

    fn partition_key(&self) -> &str {
        &self.side.team_abbreviation
    }

    fn game_id(&self) -> &str {
        &self.game_id
    }

    fn season(&self) -> &str {
        &self.side.season
    }

    fn game_date(&self) -> NaiveDate {
        self.side.game_date
    }
}

impl FeatureRow for TeamGameFeatures {
    fn feature_names(&self) -> Vec<String> {
        let mut out = self.team.feature_names();
        out.extend(TeamPlayerAggregate::numeric_columns());
        out
    }

    fn feature_values(&self) -> Vec<f64> {
        let mut out = self.team.numeric_values();
        out.extend(self.players.numeric_values());
        out
    }

    fn label_name(&self) -> String {
        self.team.label_name()
    }

    fn label(&self) -> f64 {
        self.team.label()
    }

    fn partition_key(&self) -> &str {
        self.team.partition_key()
    }

    fn game_id(&self) -> &str {
        &self.team.game_id
    }

    fn season(&self) -> &str {
        &self.team.season
    }

    fn game_date(&self) -> NaiveDate {
        self.team.game_date
    }
}

pub fn sort_chronologically<R: FeatureRow>(rows: &mut [R]) {
    rows.sort_by(|a, b| {
        a.season()
            .cmp(b.season())
            .then(a.game_date().cmp(&b.game_date()))
            .then_with(|| a.game_id().cmp(b.game_id()))
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowScope {
    #[default]
    PerTeam,
    SingleSeries,
}

impl WindowScope {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "per_team" | "team" => Some(Self::PerTeam),
            "single" | "single_series" => Some(Self::SingleSeries),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowSample {
    pub partition: String,
    pub label_game_id: String,
    pub inputs: Vec<Vec<f64>>,
    pub label: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowSet {
    pub window_len: usize,
    pub feature_names: Vec<String>,
    pub label_name: String,
    pub samples: Vec<WindowSample>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tensor {
    pub shape: [usize; 3],
    pub data: Vec<f32>,
}

impl WindowSet {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn to_tensor(&self) -> Tensor {
        let features = self.feature_names.len();
        let mut data = Vec::with_capacity(self.samples.len() * self.window_len * features);
        for sample in &self.samples {
            for row in &sample.inputs {
                data.extend(row.iter().map(|v| *v as f32));
            }
        }
        Tensor {
            shape: [self.samples.len(), self.window_len, features],
            data,
        }
    }

    pub fn labels(&self) -> Vec<f32> {
        self.samples.iter().map(|s| s.label as f32).collect()
    }
}

fn windows_for_series<R: FeatureRow>(
    partition: &str,
    series: &[&R],
    window_len: usize,
    out: &mut Vec<WindowSample>,
) {
    if series.len() <= window_len {
        return;
    }
    let values = series.iter().map(|r| r.feature_values()).collect::<Vec<_>>();
    for end in window_len..series.len() {
        out.push(WindowSample {
            partition: partition.to_string(),
            label_game_id: series[end].game_id().to_string(),
            inputs: values[end - window_len..end].to_vec(),
            label: series[end].label(),
        });
    }
}

/// Slides a window of `window_len` rows over chronologically ordered rows,
/// labelling each window with the outcome of the next row. A series of
/// length L yields `max(0, L - window_len)` samples. Per-team partitions
/// are visited in order of first appearance.
pub fn build_windows<R: FeatureRow>(
    rows: &[R],
    window_len: usize,
    scope: WindowScope,
) -> Result<WindowSet> {
    if window_len == 0 {
        return Err(PipelineError::InvalidConfig(
            "window length must be positive".to_string(),
        ));
    }
    let Some(first) = rows.first() else {
        return Err(PipelineError::EmptyResult("no rows to window".to_string()));
    };

    let mut samples = Vec::new();
    match scope {
        WindowScope::SingleSeries => {
            let series = rows.iter().collect::<Vec<_>>();
            windows_for_series(first.partition_key(), &series, window_len, &mut samples);
        }
        WindowScope::PerTeam => {
            let mut order: Vec<&str> = Vec::new();
            let mut partitions: HashMap<&str, Vec<&R>> = HashMap::new();
            for row in rows {
                let key = row.partition_key();
                partitions
                    .entry(key)
                    .or_insert_with(|| {
                        order.push(key);
                        Vec::new()
                    })
                    .push(row);
            }
            for key in order {
                windows_for_series(key, &partitions[key], window_len, &mut samples);
            }
        }
    }

    if samples.is_empty() {
        return Err(PipelineError::EmptyResult(format!(
            "no partition has more than {window_len} rows"
        )));
    }
    info!(samples = samples.len(), window_len, ?scope, "built sequence windows");
    Ok(WindowSet {
        window_len,
        feature_names: first.feature_names(),
        label_name: first.label_name(),
        samples,
    })
}
