//! Runs one full federation round against an in-memory store: trains a
//! contribution per CSV file in the data directory, aggregates them into a
//! global model, then assesses one patient record and prints the assessment
//! as JSON.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cardiomesh_core::{FederationHub, MemoryStore, PatientRecord, TrainerConfig};
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct EngineConfig {
    data_dir: String,
    /// Optional JSON file with the patient record to assess; a built-in
    /// sample is used when unset.
    record_file: Option<String>,
    trees: usize,
    max_depth: usize,
    seed: u64,
}

fn load_config() -> Result<EngineConfig> {
    let cfg = config::Config::builder()
        .set_default("data_dir", "./data")?
        .set_default("trees", 100_i64)?
        .set_default("max_depth", 10_i64)?
        .set_default("seed", 42_i64)?
        .add_source(config::Environment::with_prefix("CARDIOMESH").separator("__"))
        .build()?;
    Ok(cfg.try_deserialize()?)
}

fn site_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("reading data directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "csv"))
        .collect();
    files.sort();
    Ok(files)
}

fn sample_record(path: Option<&str>) -> Result<PatientRecord> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading record file {path}"))?;
            Ok(serde_json::from_str(&text).context("parsing patient record")?)
        }
        None => Ok(PatientRecord {
            age: 57,
            sex: 1,
            cp: 2,
            trestbps: 130,
            chol: 236,
            fbs: 0,
            restecg: 1,
            thalach: 174,
            exang: 0,
            oldpeak: 0.0,
            slope: 1,
            ca: 1,
            thal: 2,
        }),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cfg = load_config()?;
    info!(data_dir = %cfg.data_dir, trees = cfg.trees, "Starting risk-engine service");

    let store = MemoryStore::new();
    let trainer = TrainerConfig { trees: cfg.trees, max_depth: cfg.max_depth, seed: cfg.seed };
    let hub = FederationHub::new(store.clone(), store.clone(), trainer);

    for file in site_files(Path::new(&cfg.data_dir))? {
        let text = std::fs::read_to_string(&file)
            .with_context(|| format!("reading {}", file.display()))?;
        // One bad site submission does not block the rest of the round.
        match hub.submit_training(&text) {
            Ok(contribution) => {
                info!(site = %file.display(), samples = contribution.sample_count, "site_trained")
            }
            Err(error) => warn!(site = %file.display(), %error, "site_training_failed"),
        }
    }

    let model = hub.aggregate()?;
    info!(version = model.version, contributions = model.contribution_count, "round_complete");

    let record = sample_record(cfg.record_file.as_deref())?;
    let assessment = hub.assess(&record)?;
    println!("{}", serde_json::to_string_pretty(&assessment)?);
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
