use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitRatios {
    pub train: f64,
    pub test: f64,
    pub val: f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            train: 0.7,
            test: 0.15,
            val: 0.15,
        }
    }
}

impl SplitRatios {
    pub fn parse(raw: &str) -> Result<Self> {
        let parts = raw
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| PipelineError::InvalidConfig(format!("bad split ratios {raw:?}")))?;
        let [train, test, val] = parts[..] else {
            return Err(PipelineError::InvalidConfig(format!(
                "split needs three ratios, got {raw:?}"
            )));
        };
        let ratios = Self { train, test, val };
        ratios.validate()?;
        Ok(ratios)
    }

    pub fn validate(&self) -> Result<()> {
        let all = [self.train, self.test, self.val];
        if all.iter().any(|r| !r.is_finite() || *r <= 0.0) {
            return Err(PipelineError::InvalidConfig(
                "split ratios must be positive".to_string(),
            ));
        }
        if (all.iter().sum::<f64>() - 1.0).abs() > 1e-6 {
            return Err(PipelineError::InvalidConfig(
                "split ratios must sum to 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSplit<T> {
    pub train: Vec<T>,
    pub test: Vec<T>,
    pub val: Vec<T>,
}

pub fn split_samples<T>(mut samples: Vec<T>, ratios: SplitRatios, seed: u64) -> Result<DatasetSplit<T>> {
    ratios.validate()?;
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let n = samples.len();
    let n_train = (n as f64 * ratios.train).floor() as usize;
    let n_test = ((n as f64 * ratios.test).floor() as usize).min(n - n_train);
    let val = samples.split_off(n_train + n_test);
    let test = samples.split_off(n_train);
    info!(train = samples.len(), test = test.len(), val = val.len(), seed, "split dataset");
    Ok(DatasetSplit {
        train: samples,
        test,
        val,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetVersion {
    pub name: String,
    pub number: u32,
}

impl DatasetVersion {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            number: 1,
        }
    }

    pub fn next_for(&self, name: &str) -> Self {
        if self.name == name {
            Self {
                name: self.name.clone(),
                number: self.number + 1,
            }
        } else {
            Self::new(name)
        }
    }

    pub fn label(&self) -> String {
        format!("{}_v{}", self.name, self.number)
    }
}
