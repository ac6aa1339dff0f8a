//! Pipeline configuration, stored as JSON

use crate::aggregate::AggregationKey;
use crate::columns::{SimilarityMetric, DEFAULT_SIMILARITY_FLOOR};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Placeholders substituted for missing model/type data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sentinels {
    pub model_missing: String,
    pub type_missing: String,
}

impl Default for Sentinels {
    fn default() -> Self {
        Self {
            model_missing: "MODEL MISSING".to_string(),
            type_missing: "TYPE MISSING".to_string(),
        }
    }
}

/// Knobs for one reorganization run. Every field has a default, so a
/// config file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// How duplicate part listings within a model are merged
    pub aggregation_key: AggregationKey,
    /// Minimum header similarity for a column match
    pub similarity_floor: f64,
    pub similarity_metric: SimilarityMetric,
    pub sentinels: Sentinels,
    /// Sheet to read from a reference workbook
    pub reference_sheet: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            aggregation_key: AggregationKey::default(),
            similarity_floor: DEFAULT_SIMILARITY_FLOOR,
            similarity_metric: SimilarityMetric::default(),
            sentinels: Sentinels::default(),
            reference_sheet: "EquipmentDB".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load a config file from JSON
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Save the config to JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
