use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::report::AnalysisReport;
use super::scoring::NeedWeights;

/// Identifier wrapper for stored weighting configurations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WeightingConfigId(pub String);

/// School owning a set of weighting configurations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchoolId(pub String);

/// Identifier wrapper for persisted analysis results.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResultId(pub String);

macro_rules! display_id {
    ($($name:ident),+) => {
        $(
            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }
        )+
    };
}

display_id!(WeightingConfigId, SchoolId, ResultId);

/// Named weighting configuration as held by the config store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightingConfig {
    pub id: WeightingConfigId,
    pub school_id: SchoolId,
    pub name: String,
    pub is_default: bool,
    pub weights: NeedWeights,
    pub created_at: DateTime<Utc>,
}

/// Unsaved configuration submitted by a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightingConfigDraft {
    pub school_id: SchoolId,
    pub name: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub weights: NeedWeights,
}

impl WeightingConfigDraft {
    pub fn default_for(school_id: SchoolId) -> Self {
        Self {
            school_id,
            name: "Default weighting".to_string(),
            is_default: true,
            weights: NeedWeights::default(),
        }
    }
}

/// Result body handed to the result store; the report fields are inlined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub weighting_config_id: WeightingConfigId,
    pub weighting_config_name: String,
    pub snapshot_version: u64,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub report: AnalysisReport,
}

/// A persisted result paired with the id the store assigned it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredAnalysis {
    pub result_id: ResultId,
    #[serde(flatten)]
    pub result: AnalysisResult,
}
