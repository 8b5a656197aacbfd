use std::path::PathBuf;

// ---------------------------------------------------------------------------
// File locations – supplied by the environment, not the core
// ---------------------------------------------------------------------------

const DATA_DIR_VAR: &str = "CO2_LENS_DATA_DIR";
const DEFAULT_DATA_DIR: &str = "data";

const CONSOLIDATED_FILE: &str = "consolidated.parquet";
const REFERENCE_FILE: &str = "processed.parquet";
const MODEL_FILE: &str = "model.json";

/// Paths of the three input artifacts. The data directory comes from
/// `CO2_LENS_DATA_DIR`, defaulting to `data/` next to the binary's
/// working directory; file names are fixed.
#[derive(Debug, Clone)]
pub struct Config {
    pub consolidated_path: PathBuf,
    pub reference_path: PathBuf,
    pub model_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        let dir = std::env::var(DATA_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));
        Config {
            consolidated_path: dir.join(CONSOLIDATED_FILE),
            reference_path: dir.join(REFERENCE_FILE),
            model_path: dir.join(MODEL_FILE),
        }
    }
}
