use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{TimeZone, Utc};
use reporting_application::{ReportDefinitionClient, ReportGenerator, SaveOutcome};
use reporting_core::AppError;
use reporting_domain::{
    OnDemandReportRequest, ReportDefinition, ReportDefinitionId, StatusAction,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use super::HttpReportingClient;

#[derive(Clone, Default)]
struct BackendState {
    received: Arc<Mutex<Vec<(String, Value)>>>,
}

fn document() -> Value {
    json!({
        "report_params": {
            "report_name": "Daily errors",
            "description": "Error saved search",
            "report_source": "Saved search",
            "core_params": {
                "base_url": "http://localhost:5601/app/discover#/view/errors",
                "report_format": "csv",
                "time_duration": "PT30M",
                "saved_search_id": "errors",
                "limit": 10000
            }
        },
        "trigger": {
            "trigger_type": "Schedule",
            "trigger_params": {
                "enabled": true,
                "schedule_type": "Recurring",
                "schedule": {
                    "interval": { "period": 1, "unit": "Days", "start_time": 1_704_067_200_000_i64 }
                },
                "enabled_time": 1_704_067_200_000_i64
            }
        },
        "delivery": { "delivery_type": "Kibana user", "delivery_params": {} },
        "status": "Active",
        "time_created": 1_704_067_200_000_i64,
        "last_updated": 1_704_067_200_000_i64
    })
}

fn definition() -> ReportDefinition {
    ReportDefinition::from_value(document()).unwrap_or_else(|error| panic!("{error}"))
}

fn report_id() -> ReportDefinitionId {
    ReportDefinitionId::new("daily-errors").unwrap_or_else(|_| unreachable!())
}

async fn spawn_backend(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap_or_else(|error| panic!("failed to bind fake backend: {error}"));
    let address = listener
        .local_addr()
        .unwrap_or_else(|error| panic!("failed to read fake backend address: {error}"));

    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    format!("http://{address}/api/reporting")
}

fn client(base_url: &str) -> HttpReportingClient {
    HttpReportingClient::new(reqwest::Client::new(), base_url)
        .unwrap_or_else(|error| panic!("{error}"))
}

async fn fetch_definition(Path(id): Path<String>) -> (StatusCode, Json<Value>) {
    if id == "daily-errors" {
        (StatusCode::OK, Json(json!({ "report_definition": document() })))
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": format!("{id} not found") })),
        )
    }
}

async fn echo_update(
    State(state): State<BackendState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let mut stored = body.clone();
    stored["last_updated"] = json!(1_704_070_800_000_i64);
    state.received.lock().await.push((id, body));
    Json(json!({ "report_definition": stored }))
}

async fn record_generate(
    State(state): State<BackendState>,
    Json(body): Json<Value>,
) -> Json<Value> {
    state
        .received
        .lock()
        .await
        .push(("generateReport".to_owned(), body));
    Json(json!({ "filename": "daily-errors.csv", "data": "timestamp,message\n" }))
}

#[tokio::test]
async fn get_decodes_report_definition_envelope() {
    let router = Router::new().route(
        "/api/reporting/reportDefinitions/{id}",
        get(fetch_definition),
    );
    let base_url = spawn_backend(router).await;

    let fetched = client(base_url.as_str())
        .get_report_definition(&report_id())
        .await;

    assert_eq!(fetched, Ok(definition()));
}

#[tokio::test]
async fn get_missing_definition_maps_to_not_found() {
    let router = Router::new().route(
        "/api/reporting/reportDefinitions/{id}",
        get(fetch_definition),
    );
    let base_url = spawn_backend(router).await;
    let missing = ReportDefinitionId::new("missing").unwrap_or_else(|_| unreachable!());

    let fetched = client(base_url.as_str())
        .get_report_definition(&missing)
        .await;

    assert!(matches!(fetched, Err(AppError::NotFound(message)) if message.contains("404")));
}

#[tokio::test]
async fn get_malformed_document_maps_to_validation() {
    let router = Router::new().route(
        "/api/reporting/reportDefinitions/{id}",
        get(|| async {
            let mut broken = document();
            broken["trigger"]["trigger_params"]["schedule"] = json!({});
            Json(json!({ "report_definition": broken }))
        }),
    );
    let base_url = spawn_backend(router).await;

    let fetched = client(base_url.as_str())
        .get_report_definition(&report_id())
        .await;

    assert!(matches!(fetched, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn update_sends_full_document_and_returns_echo() {
    let state = BackendState::default();
    let router = Router::new()
        .route(
            "/api/reporting/reportDefinitions/{id}",
            axum::routing::put(echo_update),
        )
        .with_state(state.clone());
    let base_url = spawn_backend(router).await;
    let disabled = definition()
        .with_status(StatusAction::Disable)
        .unwrap_or_else(|error| panic!("{error}"));

    let outcome = client(base_url.as_str())
        .update_report_definition(&report_id(), &disabled)
        .await
        .unwrap_or_else(|error| panic!("{error}"));

    let SaveOutcome::Echoed(accepted) = outcome else {
        panic!("backend echoed the stored document");
    };
    assert!(!accepted.is_enabled());
    assert_eq!(
        accepted.last_updated(),
        Utc.timestamp_millis_opt(1_704_070_800_000)
            .single()
            .unwrap_or_else(|| unreachable!())
    );

    let received = state.received.lock().await;
    assert_eq!(received.len(), 1);
    let (id, body) = &received[0];
    assert_eq!(id, "daily-errors");
    assert_eq!(body["status"], json!("Disabled"));
    assert_eq!(body["trigger"]["trigger_params"]["enabled"], json!(false));
    assert_eq!(
        body["trigger"]["trigger_params"]["enabled_time"],
        json!(1_704_067_200_000_i64)
    );
    assert_eq!(body["report_params"]["core_params"]["limit"], json!(10000));
}

#[tokio::test]
async fn update_without_document_is_acknowledged() {
    let empty_router = Router::new().route(
        "/api/reporting/reportDefinitions/{id}",
        axum::routing::put(|| async { StatusCode::OK }),
    );
    let summary_router = Router::new().route(
        "/api/reporting/reportDefinitions/{id}",
        axum::routing::put(|| async { Json(json!({ "acknowledged": true })) }),
    );
    let text_router = Router::new().route(
        "/api/reporting/reportDefinitions/{id}",
        axum::routing::put(|| async { "Report definition updated" }),
    );

    for router in [empty_router, summary_router, text_router] {
        let base_url = spawn_backend(router).await;

        let outcome = client(base_url.as_str())
            .update_report_definition(&report_id(), &definition())
            .await;

        assert_eq!(outcome, Ok(SaveOutcome::Acknowledged));
    }
}

#[tokio::test]
async fn update_status_codes_map_to_error_categories() {
    let cases = [
        (StatusCode::CONFLICT, "conflict"),
        (StatusCode::PRECONDITION_FAILED, "conflict"),
        (StatusCode::UNPROCESSABLE_ENTITY, "validation"),
        (StatusCode::BAD_REQUEST, "validation"),
        (StatusCode::SERVICE_UNAVAILABLE, "network"),
        (StatusCode::TOO_MANY_REQUESTS, "network"),
        (StatusCode::FORBIDDEN, "internal"),
    ];

    for (status, category) in cases {
        let router = Router::new().route(
            "/api/reporting/reportDefinitions/{id}",
            axum::routing::put(move || async move { (status, "rejected") }),
        );
        let base_url = spawn_backend(router).await;

        let result = client(base_url.as_str())
            .update_report_definition(&report_id(), &definition())
            .await;

        let error = result.err().unwrap_or_else(|| panic!("{status} should fail"));
        assert_eq!(error.category(), category, "status {status}");
    }
}

#[tokio::test]
async fn delete_succeeds_on_success_status() {
    let state = BackendState::default();
    let router = Router::new()
        .route(
            "/api/reporting/reportDefinitions/{id}",
            axum::routing::delete(
                |State(state): State<BackendState>, Path(id): Path<String>| async move {
                    state.received.lock().await.push((id, Value::Null));
                    StatusCode::NO_CONTENT
                },
            ),
        )
        .with_state(state.clone());
    let base_url = spawn_backend(router).await;

    let deleted = client(base_url.as_str())
        .delete_report_definition(&report_id())
        .await;

    assert_eq!(deleted, Ok(()));
    assert_eq!(
        state.received.lock().await.as_slice(),
        &[("daily-errors".to_owned(), Value::Null)]
    );
}

#[tokio::test]
async fn generate_posts_request_and_decodes_report() {
    let state = BackendState::default();
    let router = Router::new()
        .route("/api/reporting/generateReport", post(record_generate))
        .with_state(state.clone());
    let base_url = spawn_backend(router).await;
    let now = Utc
        .timestamp_millis_opt(1_704_070_800_000)
        .single()
        .unwrap_or_else(|| unreachable!());
    let request = OnDemandReportRequest::build(&definition(), now)
        .unwrap_or_else(|error| panic!("{error}"));

    let report = client(base_url.as_str())
        .generate_report(request.clone())
        .await
        .unwrap_or_else(|error| panic!("{error}"));

    assert_eq!(report.filename, "daily-errors.csv");
    assert_eq!(report.data, "timestamp,message\n");

    let received = state.received.lock().await;
    let (_, body) = &received[0];
    assert_eq!(body["query_url"], json!(request.query_url));
    assert_eq!(body["time_from"], json!(1_704_069_000_000_i64));
    assert_eq!(body["time_to"], json!(1_704_070_800_000_i64));
}

#[tokio::test]
async fn unreachable_backend_maps_to_network() {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap_or_else(|error| panic!("{error}"));
    let address = listener
        .local_addr()
        .unwrap_or_else(|error| panic!("{error}"));
    drop(listener);

    let fetched = client(format!("http://{address}/api/reporting").as_str())
        .get_report_definition(&report_id())
        .await;

    assert!(matches!(fetched, Err(AppError::Network(_))));
}

#[test]
fn new_rejects_non_http_base_urls() {
    for base_url in ["not a url", "mailto:reports@example.com", "ftp://example.com/api"] {
        let result = HttpReportingClient::new(reqwest::Client::new(), base_url);
        assert!(
            matches!(result, Err(AppError::Validation(_))),
            "{base_url} should be rejected"
        );
    }
}

#[tokio::test]
async fn trailing_slash_in_base_url_is_ignored() {
    let router = Router::new().route(
        "/api/reporting/reportDefinitions/{id}",
        get(fetch_definition),
    );
    let base_url = spawn_backend(router).await;

    let fetched = client(format!("{base_url}/").as_str())
        .get_report_definition(&report_id())
        .await;

    assert!(fetched.is_ok());
}

#[tokio::test]
async fn update_echo_with_invalid_document_maps_to_validation() {
    let router = Router::new().route(
        "/api/reporting/reportDefinitions/{id}",
        axum::routing::put(|| async {
            let mut broken = document();
            broken["report_params"]["report_name"] = json!("");
            Json(json!({ "report_definition": broken }))
        }),
    );
    let base_url = spawn_backend(router).await;

    let outcome = client(base_url.as_str())
        .update_report_definition(&report_id(), &definition())
        .await;

    assert!(matches!(outcome, Err(AppError::Validation(_))));
}
