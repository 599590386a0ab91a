use std::io::Read;
use std::sync::Arc;

use chrono::Utc;

use super::aggregation::AggregationPolicy;
use super::compute_report;
use super::domain::{
    AnalysisResult, ResultId, SchoolId, StoredAnalysis, WeightingConfig, WeightingConfigDraft,
    WeightingConfigId,
};
use super::repository::{DatasetStore, RepositoryError, ResultStore, WeightingConfigStore};
use super::scoring::WeightingError;
use crate::workflows::datasets::{
    DatasetError, DatasetImporter, DatasetKind, DatasetSummary, StagedDatasets,
};

/// Service composing the dataset, config and result stores around the analysis pipeline.
pub struct NeedAnalysisService<C, D, R> {
    configs: Arc<C>,
    datasets: Arc<D>,
    results: Arc<R>,
    policy: AggregationPolicy,
}

impl<C, D, R> NeedAnalysisService<C, D, R>
where
    C: WeightingConfigStore + 'static,
    D: DatasetStore + 'static,
    R: ResultStore + 'static,
{
    pub fn new(configs: Arc<C>, datasets: Arc<D>, results: Arc<R>) -> Self {
        Self::with_policy(configs, datasets, results, AggregationPolicy::default())
    }

    pub fn with_policy(
        configs: Arc<C>,
        datasets: Arc<D>,
        results: Arc<R>,
        policy: AggregationPolicy,
    ) -> Self {
        Self {
            configs,
            datasets,
            results,
            policy,
        }
    }

    pub fn policy(&self) -> &AggregationPolicy {
        &self.policy
    }

    /// Normalize one upload and install it into a new snapshot.
    ///
    /// A rejected upload leaves the current snapshot untouched.
    pub fn ingest<In: Read>(
        &self,
        kind: DatasetKind,
        reader: In,
    ) -> Result<DatasetSummary, AnalysisError> {
        let (dataset, rows) = DatasetImporter::from_reader(kind, reader).map_err(|error| {
            tracing::warn!(dataset = %kind, kind = error.kind(), %error, "dataset rejected");
            error
        })?;
        let records = dataset.len();
        let snapshot_version = self.datasets.install(dataset)?;

        tracing::info!(dataset = %kind, rows, records, snapshot_version, "dataset installed");
        Ok(DatasetSummary {
            dataset: kind,
            rows,
            records,
            snapshot_version,
        })
    }

    pub fn clear_datasets(&self) -> Result<u64, AnalysisError> {
        let version = self.datasets.clear()?;
        tracing::info!(snapshot_version = version, "datasets cleared");
        Ok(version)
    }

    pub fn dataset_status(&self) -> Result<Arc<StagedDatasets>, AnalysisError> {
        Ok(self.datasets.current()?)
    }

    /// Validate and store a weighting configuration.
    pub fn save_config(
        &self,
        mut draft: WeightingConfigDraft,
    ) -> Result<WeightingConfig, AnalysisError> {
        draft.name = draft.name.trim().to_string();
        if draft.name.is_empty() {
            return Err(WeightingError::BlankName.into());
        }
        draft.weights.validate()?;

        let config = self.configs.save(draft)?;
        tracing::info!(
            config_id = %config.id,
            school_id = %config.school_id,
            is_default = config.is_default,
            "weighting config saved"
        );
        Ok(config)
    }

    pub fn list_configs(&self, school_id: &SchoolId) -> Result<Vec<WeightingConfig>, AnalysisError> {
        Ok(self.configs.list(school_id)?)
    }

    pub fn remove_config(&self, id: &WeightingConfigId) -> Result<(), AnalysisError> {
        self.configs.remove(id).map_err(|error| match error {
            RepositoryError::NotFound => AnalysisError::ConfigNotFound(id.clone()),
            RepositoryError::Removed => AnalysisError::StaleReference(id.clone()),
            other => other.into(),
        })?;
        tracing::info!(config_id = %id, "weighting config removed");
        Ok(())
    }

    /// Score, aggregate and rank the current snapshot under one configuration.
    ///
    /// Either the full result is persisted and returned, or nothing is stored.
    pub fn run(&self, config_id: &WeightingConfigId) -> Result<StoredAnalysis, AnalysisError> {
        let config = match self.configs.get(config_id) {
            Ok(Some(config)) => config,
            Ok(None) | Err(RepositoryError::NotFound) => {
                return Err(AnalysisError::ConfigNotFound(config_id.clone()))
            }
            Err(RepositoryError::Removed) => {
                return Err(AnalysisError::StaleReference(config_id.clone()))
            }
            Err(other) => return Err(other.into()),
        };

        let staged = self.datasets.current()?;
        let snapshot = staged
            .snapshot()
            .map_err(AnalysisError::MissingDataset)?;

        tracing::info!(
            config_id = %config.id,
            snapshot_version = snapshot.version,
            students = snapshot.enrolments.len(),
            "analysis run started"
        );

        let report = compute_report(&snapshot, &config.weights, &self.policy);
        let result = AnalysisResult {
            weighting_config_id: config.id.clone(),
            weighting_config_name: config.name.clone(),
            snapshot_version: snapshot.version,
            created_at: Utc::now(),
            report,
        };

        let result_id = self.results.save(result.clone())?;
        tracing::info!(
            result_id = %result_id,
            students = result.report.statistics.total_students,
            classes = result.report.statistics.total_classes,
            high_needs = result.report.statistics.high_needs,
            "analysis run completed"
        );

        Ok(StoredAnalysis { result_id, result })
    }

    pub fn result(&self, id: &ResultId) -> Result<StoredAnalysis, AnalysisError> {
        let result = self
            .results
            .get(id)?
            .ok_or_else(|| AnalysisError::ResultNotFound(id.clone()))?;
        Ok(StoredAnalysis {
            result_id: id.clone(),
            result,
        })
    }

    pub fn latest(&self) -> Result<StoredAnalysis, AnalysisError> {
        let (result_id, result) = self.results.latest()?.ok_or(AnalysisError::NoResults)?;
        Ok(StoredAnalysis { result_id, result })
    }
}

fn kind_list(kinds: &[DatasetKind]) -> String {
    kinds
        .iter()
        .map(|kind| kind.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Error raised by the analysis service.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("weighting config '{0}' does not exist")]
    ConfigNotFound(WeightingConfigId),
    #[error("weighting config '{0}' has been removed")]
    StaleReference(WeightingConfigId),
    #[error("dataset(s) not yet uploaded: {}", kind_list(.0))]
    MissingDataset(Vec<DatasetKind>),
    #[error("analysis result '{0}' does not exist")]
    ResultNotFound(ResultId),
    #[error("no analysis has been run yet")]
    NoResults,
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Weighting(#[from] WeightingError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl AnalysisError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigNotFound(_) => "ConfigNotFound",
            Self::StaleReference(_) => "StaleReferenceError",
            Self::MissingDataset(_) => "MissingDataset",
            Self::ResultNotFound(_) | Self::NoResults => "ResultNotFound",
            Self::Dataset(error) => error.kind(),
            Self::Weighting(_) => "InvalidWeighting",
            Self::Repository(RepositoryError::Conflict) => "Conflict",
            Self::Repository(RepositoryError::NotFound) => "NotFound",
            Self::Repository(RepositoryError::Removed) => "StaleReferenceError",
            Self::Repository(RepositoryError::Unavailable(_)) => "StoreUnavailable",
        }
    }
}
