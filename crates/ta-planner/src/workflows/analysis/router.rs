use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ResultId, SchoolId, WeightingConfigDraft, WeightingConfigId};
use super::repository::{DatasetStore, RepositoryError, ResultStore, WeightingConfigStore};
use super::service::{AnalysisError, NeedAnalysisService};
use crate::workflows::datasets::DatasetKind;

type SharedService<C, D, R> = Arc<NeedAnalysisService<C, D, R>>;

/// Router builder exposing dataset upload, weighting management, and analysis runs.
pub fn analysis_router<C, D, R>(service: SharedService<C, D, R>) -> Router
where
    C: WeightingConfigStore + 'static,
    D: DatasetStore + 'static,
    R: ResultStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/datasets",
            get(dataset_status_handler::<C, D, R>).delete(clear_datasets_handler::<C, D, R>),
        )
        .route("/api/v1/datasets/:kind", post(upload_handler::<C, D, R>))
        .route(
            "/api/v1/weightings",
            get(list_configs_handler::<C, D, R>).post(save_config_handler::<C, D, R>),
        )
        .route(
            "/api/v1/weightings/:config_id",
            delete(remove_config_handler::<C, D, R>),
        )
        .route("/api/v1/analysis/run", post(run_handler::<C, D, R>))
        .route(
            "/api/v1/analysis/results/:result_id",
            get(result_handler::<C, D, R>),
        )
        .route(
            "/api/v1/analysis/latest/students",
            get(latest_students_handler::<C, D, R>),
        )
        .route(
            "/api/v1/analysis/latest/classes",
            get(latest_classes_handler::<C, D, R>),
        )
        .route(
            "/api/v1/analysis/latest/grid",
            get(latest_grid_handler::<C, D, R>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub struct RunRequest {
    pub weighting_config_id: WeightingConfigId,
}

#[derive(Debug, Deserialize)]
pub struct SchoolQuery {
    pub school_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

pub(crate) fn status_for(error: &AnalysisError) -> StatusCode {
    match error {
        AnalysisError::Dataset(_) | AnalysisError::Weighting(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        AnalysisError::ConfigNotFound(_)
        | AnalysisError::ResultNotFound(_)
        | AnalysisError::NoResults
        | AnalysisError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        AnalysisError::StaleReference(_) | AnalysisError::Repository(RepositoryError::Removed) => {
            StatusCode::GONE
        }
        AnalysisError::MissingDataset(_) | AnalysisError::Repository(RepositoryError::Conflict) => {
            StatusCode::CONFLICT
        }
        AnalysisError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

pub(crate) fn error_response(error: AnalysisError) -> Response {
    let status = status_for(&error);
    if status.is_server_error() {
        tracing::error!(kind = error.kind(), %error, "analysis request failed");
    }
    let payload = json!({
        "error": {
            "kind": error.kind(),
            "detail": error.to_string(),
        }
    });
    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn upload_handler<C, D, R>(
    State(service): State<SharedService<C, D, R>>,
    Path(kind): Path<String>,
    body: String,
) -> Response
where
    C: WeightingConfigStore + 'static,
    D: DatasetStore + 'static,
    R: ResultStore + 'static,
{
    let Some(dataset) = DatasetKind::parse(&kind) else {
        let payload = json!({
            "error": {
                "kind": "UnknownDataset",
                "detail": format!(
                    "unknown dataset '{kind}', expected one of students_classes, students_sen, timetable"
                ),
            }
        });
        return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
    };

    match service.ingest(dataset, body.as_bytes()) {
        Ok(summary) => (StatusCode::CREATED, axum::Json(summary)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn dataset_status_handler<C, D, R>(
    State(service): State<SharedService<C, D, R>>,
) -> Response
where
    C: WeightingConfigStore + 'static,
    D: DatasetStore + 'static,
    R: ResultStore + 'static,
{
    match service.dataset_status() {
        Ok(staged) => {
            let payload = json!({
                "snapshot_version": staged.version(),
                "installed": staged.installed(),
                "missing": staged.missing(),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn clear_datasets_handler<C, D, R>(
    State(service): State<SharedService<C, D, R>>,
) -> Response
where
    C: WeightingConfigStore + 'static,
    D: DatasetStore + 'static,
    R: ResultStore + 'static,
{
    match service.clear_datasets() {
        Ok(version) => {
            let payload = json!({ "snapshot_version": version });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_configs_handler<C, D, R>(
    State(service): State<SharedService<C, D, R>>,
    Query(query): Query<SchoolQuery>,
) -> Response
where
    C: WeightingConfigStore + 'static,
    D: DatasetStore + 'static,
    R: ResultStore + 'static,
{
    match service.list_configs(&SchoolId(query.school_id)) {
        Ok(configs) => (StatusCode::OK, axum::Json(configs)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn save_config_handler<C, D, R>(
    State(service): State<SharedService<C, D, R>>,
    axum::Json(draft): axum::Json<WeightingConfigDraft>,
) -> Response
where
    C: WeightingConfigStore + 'static,
    D: DatasetStore + 'static,
    R: ResultStore + 'static,
{
    match service.save_config(draft) {
        Ok(config) => (StatusCode::CREATED, axum::Json(config)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn remove_config_handler<C, D, R>(
    State(service): State<SharedService<C, D, R>>,
    Path(config_id): Path<String>,
) -> Response
where
    C: WeightingConfigStore + 'static,
    D: DatasetStore + 'static,
    R: ResultStore + 'static,
{
    match service.remove_config(&WeightingConfigId(config_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn run_handler<C, D, R>(
    State(service): State<SharedService<C, D, R>>,
    axum::Json(request): axum::Json<RunRequest>,
) -> Response
where
    C: WeightingConfigStore + 'static,
    D: DatasetStore + 'static,
    R: ResultStore + 'static,
{
    let worker = Arc::clone(&service);
    let outcome =
        tokio::task::spawn_blocking(move || worker.run(&request.weighting_config_id)).await;

    match outcome {
        Ok(Ok(stored)) => (StatusCode::OK, axum::Json(stored)).into_response(),
        Ok(Err(error)) => error_response(error),
        Err(join_error) => {
            tracing::error!(error = %join_error, "analysis run task aborted");
            let payload = json!({
                "error": {
                    "kind": "RunAborted",
                    "detail": join_error.to_string(),
                }
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn result_handler<C, D, R>(
    State(service): State<SharedService<C, D, R>>,
    Path(result_id): Path<String>,
) -> Response
where
    C: WeightingConfigStore + 'static,
    D: DatasetStore + 'static,
    R: ResultStore + 'static,
{
    match service.result(&ResultId(result_id)) {
        Ok(stored) => (StatusCode::OK, axum::Json(stored)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn latest_students_handler<C, D, R>(
    State(service): State<SharedService<C, D, R>>,
    Query(query): Query<LimitQuery>,
) -> Response
where
    C: WeightingConfigStore + 'static,
    D: DatasetStore + 'static,
    R: ResultStore + 'static,
{
    match service.latest() {
        Ok(stored) => {
            let report = &stored.result.report;
            let payload = json!({
                "result_id": stored.result_id,
                "total": report.top_students.len(),
                "students": report.student_prefix(query.limit),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn latest_classes_handler<C, D, R>(
    State(service): State<SharedService<C, D, R>>,
    Query(query): Query<LimitQuery>,
) -> Response
where
    C: WeightingConfigStore + 'static,
    D: DatasetStore + 'static,
    R: ResultStore + 'static,
{
    match service.latest() {
        Ok(stored) => {
            let report = &stored.result.report;
            let payload = json!({
                "result_id": stored.result_id,
                "total": report.top_classes.len(),
                "classes": report.class_prefix(query.limit),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn latest_grid_handler<C, D, R>(
    State(service): State<SharedService<C, D, R>>,
) -> Response
where
    C: WeightingConfigStore + 'static,
    D: DatasetStore + 'static,
    R: ResultStore + 'static,
{
    match service.latest() {
        Ok(stored) => {
            let payload = json!({
                "result_id": stored.result_id,
                "timetable_grid": stored.result.report.timetable_grid,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}
