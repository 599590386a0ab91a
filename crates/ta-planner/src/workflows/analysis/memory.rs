//! Process-local store implementations backing the HTTP service and the tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use chrono::Utc;

use super::domain::{
    AnalysisResult, ResultId, SchoolId, WeightingConfig, WeightingConfigDraft, WeightingConfigId,
};
use super::repository::{DatasetStore, RepositoryError, ResultStore, WeightingConfigStore};
use crate::workflows::datasets::{NormalizedDataset, StagedDatasets};

fn poisoned(store: &str) -> RepositoryError {
    RepositoryError::Unavailable(format!("{store} lock poisoned"))
}

#[derive(Default)]
struct ConfigTable {
    records: Vec<WeightingConfig>,
    removed: HashSet<WeightingConfigId>,
}

#[derive(Default)]
pub struct InMemoryWeightingConfigs {
    table: Mutex<ConfigTable>,
    sequence: AtomicU64,
}

impl InMemoryWeightingConfigs {
    fn next_id(&self) -> WeightingConfigId {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        WeightingConfigId(format!("cfg-{id:06}"))
    }
}

impl WeightingConfigStore for InMemoryWeightingConfigs {
    fn get(&self, id: &WeightingConfigId) -> Result<Option<WeightingConfig>, RepositoryError> {
        let table = self.table.lock().map_err(|_| poisoned("config"))?;
        if table.removed.contains(id) {
            return Err(RepositoryError::Removed);
        }
        Ok(table.records.iter().find(|config| &config.id == id).cloned())
    }

    fn list(&self, school_id: &SchoolId) -> Result<Vec<WeightingConfig>, RepositoryError> {
        let table = self.table.lock().map_err(|_| poisoned("config"))?;
        let mut configs: Vec<WeightingConfig> = table
            .records
            .iter()
            .filter(|config| &config.school_id == school_id)
            .cloned()
            .collect();
        configs.sort_by(|a, b| {
            b.is_default
                .cmp(&a.is_default)
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(configs)
    }

    fn save(&self, draft: WeightingConfigDraft) -> Result<WeightingConfig, RepositoryError> {
        let mut table = self.table.lock().map_err(|_| poisoned("config"))?;
        let duplicate_name = table.records.iter().any(|config| {
            config.school_id == draft.school_id && config.name.eq_ignore_ascii_case(&draft.name)
        });
        if duplicate_name {
            return Err(RepositoryError::Conflict);
        }

        if draft.is_default {
            for config in table
                .records
                .iter_mut()
                .filter(|config| config.school_id == draft.school_id)
            {
                config.is_default = false;
            }
        }

        let config = WeightingConfig {
            id: self.next_id(),
            school_id: draft.school_id,
            name: draft.name,
            is_default: draft.is_default,
            weights: draft.weights,
            created_at: Utc::now(),
        };
        table.records.push(config.clone());
        Ok(config)
    }

    fn remove(&self, id: &WeightingConfigId) -> Result<(), RepositoryError> {
        let mut table = self.table.lock().map_err(|_| poisoned("config"))?;
        if table.removed.contains(id) {
            return Err(RepositoryError::Removed);
        }
        let position = table
            .records
            .iter()
            .position(|config| &config.id == id)
            .ok_or(RepositoryError::NotFound)?;
        table.records.remove(position);
        table.removed.insert(id.clone());
        Ok(())
    }
}

/// Dataset store swapping whole snapshots under a short write lock.
#[derive(Default)]
pub struct InMemoryDatasets {
    current: RwLock<Arc<StagedDatasets>>,
}

impl DatasetStore for InMemoryDatasets {
    fn install(&self, dataset: NormalizedDataset) -> Result<u64, RepositoryError> {
        let mut current = self.current.write().map_err(|_| poisoned("dataset"))?;
        let next = current.with_dataset(dataset);
        let version = next.version();
        *current = Arc::new(next);
        Ok(version)
    }

    fn clear(&self) -> Result<u64, RepositoryError> {
        let mut current = self.current.write().map_err(|_| poisoned("dataset"))?;
        let next = current.cleared();
        let version = next.version();
        *current = Arc::new(next);
        Ok(version)
    }

    fn current(&self) -> Result<Arc<StagedDatasets>, RepositoryError> {
        let current = self.current.read().map_err(|_| poisoned("dataset"))?;
        Ok(Arc::clone(&current))
    }
}

#[derive(Default)]
struct ResultTable {
    records: HashMap<ResultId, AnalysisResult>,
    latest: Option<ResultId>,
}

#[derive(Default)]
pub struct InMemoryResults {
    table: Mutex<ResultTable>,
    sequence: AtomicU64,
}

impl ResultStore for InMemoryResults {
    fn save(&self, result: AnalysisResult) -> Result<ResultId, RepositoryError> {
        let mut table = self.table.lock().map_err(|_| poisoned("result"))?;
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let result_id = ResultId(format!("run-{id:06}"));
        if table.records.contains_key(&result_id) {
            return Err(RepositoryError::Conflict);
        }
        table.records.insert(result_id.clone(), result);
        table.latest = Some(result_id.clone());
        Ok(result_id)
    }

    fn get(&self, id: &ResultId) -> Result<Option<AnalysisResult>, RepositoryError> {
        let table = self.table.lock().map_err(|_| poisoned("result"))?;
        Ok(table.records.get(id).cloned())
    }

    fn latest(&self) -> Result<Option<(ResultId, AnalysisResult)>, RepositoryError> {
        let table = self.table.lock().map_err(|_| poisoned("result"))?;
        Ok(table.latest.as_ref().and_then(|id| {
            table
                .records
                .get(id)
                .map(|result| (id.clone(), result.clone()))
        }))
    }
}
