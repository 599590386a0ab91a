use crate::cli::ServeArgs;
use crate::infra::{seed_default_config, AppState};
use crate::routes::with_analysis_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use ta_planner::config::AppConfig;
use ta_planner::error::AppError;
use ta_planner::telemetry;
use ta_planner::workflows::analysis::{
    InMemoryDatasets, InMemoryResults, InMemoryWeightingConfigs, NeedAnalysisService,
};
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let analysis_service = Arc::new(NeedAnalysisService::with_policy(
        Arc::new(InMemoryWeightingConfigs::default()),
        Arc::new(InMemoryDatasets::default()),
        Arc::new(InMemoryResults::default()),
        config.analysis.aggregation_policy(),
    ));
    let seeded = seed_default_config(&analysis_service, &config.analysis.school_id)?;
    info!(
        config_id = %seeded.id,
        school_id = %seeded.school_id,
        "default weighting available"
    );

    let app = with_analysis_routes(analysis_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "ta deployment planner ready");

    axum::serve(listener, app).await?;
    Ok(())
}
