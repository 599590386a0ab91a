use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use ta_planner::workflows::analysis::{
    AnalysisError, InMemoryDatasets, InMemoryResults, InMemoryWeightingConfigs,
    NeedAnalysisService, SchoolId, WeightingConfig, WeightingConfigDraft,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type InMemoryAnalysisService =
    NeedAnalysisService<InMemoryWeightingConfigs, InMemoryDatasets, InMemoryResults>;

/// Ensure the school has a default weighting before the first run request arrives.
pub(crate) fn seed_default_config(
    service: &InMemoryAnalysisService,
    school_id: &str,
) -> Result<WeightingConfig, AnalysisError> {
    let school = SchoolId(school_id.to_string());
    if let Some(existing) = service
        .list_configs(&school)?
        .into_iter()
        .find(|config| config.is_default)
    {
        return Ok(existing);
    }

    service.save_config(WeightingConfigDraft::default_for(school))
}
