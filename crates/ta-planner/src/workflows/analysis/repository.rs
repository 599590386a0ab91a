use std::sync::Arc;

use super::domain::{
    AnalysisResult, ResultId, SchoolId, WeightingConfig, WeightingConfigDraft, WeightingConfigId,
};
use crate::workflows::datasets::{NormalizedDataset, StagedDatasets};

/// Storage for weighting configurations, enforcing one default per school.
pub trait WeightingConfigStore: Send + Sync {
    /// `Removed` for ids that were deleted, `None` for ids never issued.
    fn get(&self, id: &WeightingConfigId) -> Result<Option<WeightingConfig>, RepositoryError>;
    fn list(&self, school_id: &SchoolId) -> Result<Vec<WeightingConfig>, RepositoryError>;
    fn save(&self, draft: WeightingConfigDraft) -> Result<WeightingConfig, RepositoryError>;
    fn remove(&self, id: &WeightingConfigId) -> Result<(), RepositoryError>;
}

/// Holder of the current copy-on-write dataset snapshot.
pub trait DatasetStore: Send + Sync {
    /// Install a dataset into a fresh snapshot and return its version.
    fn install(&self, dataset: NormalizedDataset) -> Result<u64, RepositoryError>;
    fn clear(&self) -> Result<u64, RepositoryError>;
    fn current(&self) -> Result<Arc<StagedDatasets>, RepositoryError>;
}

/// Storage for completed analysis runs.
pub trait ResultStore: Send + Sync {
    fn save(&self, result: AnalysisResult) -> Result<ResultId, RepositoryError>;
    fn get(&self, id: &ResultId) -> Result<Option<AnalysisResult>, RepositoryError>;
    fn latest(&self) -> Result<Option<(ResultId, AnalysisResult)>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record has been removed")]
    Removed,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
