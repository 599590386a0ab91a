use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use ta_planner::workflows::analysis::{
    analysis_router, DatasetStore, NeedAnalysisService, ResultStore, WeightingConfigStore,
};

pub(crate) fn with_analysis_routes<C, D, R>(
    service: Arc<NeedAnalysisService<C, D, R>>,
) -> axum::Router
where
    C: WeightingConfigStore + 'static,
    D: DatasetStore + 'static,
    R: ResultStore + 'static,
{
    analysis_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{seed_default_config, InMemoryAnalysisService};
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value;
    use std::sync::atomic::{AtomicBool, Ordering};
    use ta_planner::workflows::analysis::{
        InMemoryDatasets, InMemoryResults, InMemoryWeightingConfigs,
    };
    use tower::ServiceExt;

    const ENROLMENT: &str = "Name,Courses/classes\nAda Byron,\"Maths: Year 8: 8A/Ma1\"\nAlan Turing,\"Maths: Year 8: 8A/Ma1, Science: Year 8: 8A/Sc2\"\n";
    const NEEDS: &str = "Name,Pupil Premium,SEN,SEN need(s),EAL,Reading Score,Spelling Score,BOXALL,Medical Information,Stage 1\nAda Byron,Yes,No,,No,80,,,,\nAlan Turing,No,Yes,Autism,No,,,,,Yes\n";
    const TIMETABLE: &str = "Day,Time Slot,Course/Class,Staff,Room\nMonday,09:00 - 10:00,Maths: 8A/Ma1,JDI,M1\nMonday,10:00 - 11:00,Science: 8A/Sc2,PRT,S1\n";

    fn app(ready: bool) -> (axum::Router, Arc<InMemoryAnalysisService>) {
        let service = Arc::new(NeedAnalysisService::new(
            Arc::new(InMemoryWeightingConfigs::default()),
            Arc::new(InMemoryDatasets::default()),
            Arc::new(InMemoryResults::default()),
        ));
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        let router = with_analysis_routes(service.clone()).layer(Extension(state));
        (router, service)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("json body")
    }

    fn upload(kind: &str, body: &'static str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(format!("/api/v1/datasets/{kind}"))
            .body(Body::from(body))
            .expect("request")
    }

    #[tokio::test]
    async fn readiness_reflects_the_startup_flag() {
        let (router, _) = app(false);
        let response = router
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let state = AppState {
            readiness: Arc::new(AtomicBool::new(false)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        state.readiness.store(true, Ordering::Release);
        let response = readiness_endpoint(Extension(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn upload_and_run_through_the_service_router() {
        let (router, service) = app(true);
        let config = seed_default_config(&service, "default-school").expect("seeded");

        for (kind, body) in [
            ("students_classes", ENROLMENT),
            ("students_sen", NEEDS),
            ("timetable", TIMETABLE),
        ] {
            let response = router
                .clone()
                .oneshot(upload(kind, body))
                .await
                .expect("response");
            assert_eq!(response.status(), StatusCode::CREATED, "upload {kind}");
        }

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/v1/analysis/run")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({ "weighting_config_id": config.id.0 }).to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["top_students"][0]["name"], "Ada Byron");
        assert_eq!(body["top_students"][0]["score"], 4.0);
        assert_eq!(body["top_classes"][0]["class_code"], "8A/Ma1");

        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(body_json(response).await["status"], "ok");
    }
}
