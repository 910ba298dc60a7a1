//! Observation rows of the ablation results table.

use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::SeedGapError;

/// One row of the results table: a (seed, query count, strategy) measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub seed_idx: i64,
    pub num_queries: i64,
    pub strategy: String,
    /// First Beta shape parameter of the latent state.
    #[serde(rename = "A_t")]
    pub a_t: f64,
    /// Second Beta shape parameter of the latent state.
    #[serde(rename = "B_t")]
    pub b_t: f64,
    /// Missing when the cell is empty.
    pub mse: Option<f64>,
}

impl Observation {
    /// The error value if present and not NaN.
    pub fn valid_mse(&self) -> Option<f64> {
        self.mse.filter(|v| !v.is_nan())
    }
}

/// Parse observations from any CSV source with a header row.
pub fn read_observations<R: Read>(reader: R) -> Result<Vec<Observation>, SeedGapError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let row: Observation = result?;
        rows.push(row);
    }
    Ok(rows)
}

/// Read the full results table from disk.
pub fn load_observations<P: AsRef<Path>>(path: P) -> Result<Vec<Observation>, SeedGapError> {
    let file = std::fs::File::open(path)?;
    read_observations(std::io::BufReader::new(file))
}

/// Pick the first existing input path.
///
/// On failure the error names the fallback, which is the last path tried.
pub fn resolve_input(primary: &Path, fallback: &Path) -> Result<PathBuf, SeedGapError> {
    [primary, fallback]
        .into_iter()
        .find(|p| p.exists())
        .map(Path::to_path_buf)
        .ok_or_else(|| SeedGapError::MissingInput(fallback.display().to_string()))
}
