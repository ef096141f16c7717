use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use nba_features::config::{PipelineConfig, arg_value};
use nba_features::split::{DatasetSplit, DatasetVersion, SplitRatios, split_samples};
use nba_features::window::{Tensor, WindowSample};
use nba_features::{init_tracing, pipeline, store};

#[derive(Serialize)]
struct DatasetFile<'a> {
    version: &'a DatasetVersion,
    window_len: usize,
    feature_names: &'a [String],
    label_name: &'a str,
    seed: u64,
    split: DatasetSplit<WindowSample>,
}

#[derive(Serialize)]
struct TensorFile {
    tensor: Tensor,
    labels: Vec<f32>,
}

#[derive(Deserialize)]
struct StoredVersion {
    version: DatasetVersion,
}

// Version recorded in an earlier export at the same path, if any.
fn previous_version(path: &Path) -> Option<DatasetVersion> {
    let raw = fs::read_to_string(path).ok()?;
    serde_json::from_str::<StoredVersion>(&raw)
        .ok()
        .map(|stored| stored.version)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string(value).context("serialize json")?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(path, json).with_context(|| format!("write {}", path.display()))
}

fn main() -> Result<()> {
    init_tracing();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut cfg = PipelineConfig::from_env().context("read NBA_* environment")?;
    cfg.apply_args(&args).context("parse arguments")?;
    cfg.validate()?;

    let out_path = arg_value(&args, "out")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("windows.json"));
    let seed = match arg_value(&args, "seed") {
        Some(raw) => raw.parse::<u64>().context("--seed must be an integer")?,
        None => 42,
    };
    let ratios = match arg_value(&args, "split") {
        Some(raw) => SplitRatios::parse(&raw)?,
        None => SplitRatios::default(),
    };
    let name = arg_value(&args, "name").unwrap_or_else(|| cfg.table_name().to_string());
    let version = match arg_value(&args, "version") {
        Some(raw) => DatasetVersion {
            name,
            number: raw.parse::<u32>().context("--version must be an integer")?,
        },
        None => match previous_version(&out_path) {
            Some(previous) => previous.next_for(&name),
            None => DatasetVersion::new(name),
        },
    };
    let tensor_path = arg_value(&args, "tensor").map(PathBuf::from);

    let conn = store::open_db(&cfg.db_path)
        .with_context(|| format!("open {}", cfg.db_path.display()))?;
    let output = pipeline::run(&conn, &cfg).context("transform box scores")?;
    let windows = pipeline::build_windows_for(&output, &cfg)?;
    let split = split_samples(windows.samples.clone(), ratios, seed)?;

    let file = DatasetFile {
        version: &version,
        window_len: windows.window_len,
        feature_names: &windows.feature_names,
        label_name: &windows.label_name,
        seed,
        split,
    };
    write_json(&out_path, &file)?;
    if let Some(path) = &tensor_path {
        let tensor = TensorFile {
            tensor: windows.to_tensor(),
            labels: windows.labels(),
        };
        write_json(path, &tensor)?;
        println!("Tensor file: {}", path.display());
    }

    println!("Windows written");
    println!("Dataset: {}", version.label());
    println!("Out: {}", out_path.display());
    println!(
        "Tensor: [{}, {}, {}]",
        windows.len(),
        windows.window_len,
        windows.feature_names.len()
    );
    println!(
        "Split: train={} test={} val={}",
        file.split.train.len(),
        file.split.test.len(),
        file.split.val.len()
    );
    Ok(())
}
