use std::{collections::HashMap, sync::Arc};

use super::*;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use shared::{domain::AccountId, protocol::FacilityResult};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct BackendState {
    search_bodies: Arc<Mutex<Vec<Value>>>,
    hours_queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

async fn handle_nearby(
    State(state): State<BackendState>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state.search_bodies.lock().await.push(body.clone());
    match body["accountId"].as_str() {
        Some("001") => (
            StatusCode::OK,
            Json(json!([
                { "name": "Sunrise Care", "city": "Fresno", "state": "CA", "distanceMiles": 3.14 }
            ])),
        ),
        Some("partial") => (
            StatusCode::OK,
            Json(json!([
                { "name": "Valley Rehab", "state": "CA", "distanceMiles": 7.25 },
                { "name": "Oak Manor", "city": "Visalia", "state": "CA" }
            ])),
        ),
        Some("empty") => (StatusCode::OK, Json(Value::Null)),
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Account has no geolocation" })),
        ),
    }
}

async fn handle_hours(
    State(state): State<BackendState>,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    state.hours_queries.lock().await.push(query.clone());
    match query.get("accountId").map(String::as_str) {
        Some("001") => (
            StatusCode::OK,
            json!([
                { "quarter": "2024Q1", "cnaHours": 100.0, "lpnHours": null, "rnHours": 50.5 },
                { "quarter": "2024Q2", "cnaHours": 80.0 }
            ])
            .to_string(),
        ),
        Some("blank") => (StatusCode::OK, String::new()),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded".to_string()),
    }
}

async fn spawn_backend(prefix: &str) -> (Url, BackendState) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let state = BackendState::default();
    let app = Router::new()
        .route(&format!("{prefix}/facilities/nearby"), post(handle_nearby))
        .route(
            &format!("{prefix}/staffing/quarterly-contract-hours"),
            get(handle_hours),
        )
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    let url = Url::parse(&format!("http://{addr}{prefix}")).expect("url");
    (url, state)
}

fn search(account_id: &str, radius_miles: f64) -> SearchRequest {
    SearchRequest {
        account_id: AccountId::from(account_id),
        radius_miles,
    }
}

#[tokio::test]
async fn search_posts_camel_case_body_and_decodes_results() {
    let (url, state) = spawn_backend("").await;
    let backend = HttpBackend::new(url);

    let results: FacilityResponse = backend.call(search("001", 25.0)).await.expect("search");

    assert_eq!(
        results,
        Some(vec![FacilityResult {
            name: "Sunrise Care".into(),
            city: "Fresno".into(),
            state: "CA".into(),
            distance_miles: Some(3.14),
        }])
    );
    let bodies = state.search_bodies.lock().await;
    assert_eq!(bodies[0], json!({ "accountId": "001", "radiusMiles": 25.0 }));
}

#[tokio::test]
async fn rows_missing_fields_still_decode() {
    let (url, _) = spawn_backend("").await;
    let backend = HttpBackend::new(url);

    let results: FacilityResponse = backend.call(search("partial", 10.0)).await.expect("search");

    let rows = results.expect("rows");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].city, "");
    assert_eq!(rows[0].distance_miles, Some(7.25));
    assert_eq!(rows[1].city, "Visalia");
    assert_eq!(rows[1].distance_miles, None);
}

#[tokio::test]
async fn null_search_body_decodes_as_absent() {
    let (url, _) = spawn_backend("").await;
    let backend = HttpBackend::new(url);

    let results: FacilityResponse = backend.call(search("empty", 50.0)).await.expect("search");
    assert_eq!(results, None);
}

#[tokio::test]
async fn search_error_status_keeps_json_body_message() {
    let (url, _) = spawn_backend("").await;
    let backend = HttpBackend::new(url);

    let err = RemoteCall::<SearchRequest, FacilityResponse>::call(&backend, search("bad", 1.0))
        .await
        .expect_err("must fail");

    assert_eq!(err.payload()["status"], 400);
    assert_eq!(err.message(), "Account has no geolocation");
}

#[tokio::test]
async fn hours_fetch_sends_account_query_under_base_path() {
    let (url, state) = spawn_backend("/api/v1").await;
    let backend = HttpBackend::new(url);

    let records: StaffingResponse = backend
        .call(ContractHoursRequest {
            account_id: AccountId::from("001"),
        })
        .await
        .expect("fetch");

    let records = records.expect("records");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].lpn_hours, None);
    assert_eq!(records[0].rn_hours, Some(50.5));
    assert_eq!(records[1].rn_hours, None);
    assert_eq!(
        state.hours_queries.lock().await[0].get("accountId").map(String::as_str),
        Some("001")
    );
}

#[tokio::test]
async fn blank_hours_body_decodes_as_absent() {
    let (url, _) = spawn_backend("").await;
    let backend = HttpBackend::new(url);

    let records: StaffingResponse = backend
        .call(ContractHoursRequest {
            account_id: AccountId::from("blank"),
        })
        .await
        .expect("fetch");
    assert_eq!(records, None);
}

#[tokio::test]
async fn non_json_error_body_is_wrapped() {
    let (url, _) = spawn_backend("").await;
    let backend = HttpBackend::new(url);

    let err = RemoteCall::<ContractHoursRequest, StaffingResponse>::call(
        &backend,
        ContractHoursRequest {
            account_id: AccountId::from("boom"),
        },
    )
    .await
    .expect_err("must fail");

    assert_eq!(err.payload()["status"], 500);
    assert_eq!(err.message(), "upstream exploded");
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let backend = HttpBackend::new(Url::parse(&format!("http://{addr}")).expect("url"));

    let err = RemoteCall::<SearchRequest, FacilityResponse>::call(&backend, search("001", 5.0))
        .await
        .expect_err("must fail");

    assert_eq!(err.payload()["status"], 0);
    assert!(err.nested_message().is_some());
}

#[test]
fn base_url_gets_trailing_slash() {
    let backend = HttpBackend::new(Url::parse("http://example.test/api").expect("url"));
    assert_eq!(backend.base_url().as_str(), "http://example.test/api/");
}
