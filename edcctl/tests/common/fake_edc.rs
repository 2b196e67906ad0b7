//! In-process fake of the EDC Management API and a data plane.
//!
//! One server can play both connectors, or each connector gets its own
//! server bound to its own API key. Every request is logged as
//! `METHOD /path` (without the `/management/v3` prefix) so tests can
//! count probes and creations.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

pub const DATA_BODY: &str = r#"{"userId":1,"id":1,"title":"delectus aut autem","completed":false}"#;
pub const EDR_TOKEN: &str = "edr-token-123";
pub const TRANSFER_PROCESS_ID: &str = "tp-1";

#[derive(Default)]
struct Inner {
    existing: HashSet<String>,
    calls: Vec<String>,
    edr_polls: u32,
    edr_ready_after: u32,
    probe_status: Option<u16>,
    api_key: Option<String>,
    base_url: String,
}

type Shared = Arc<Mutex<Inner>>;

pub struct FakeEdc {
    pub base_url: String,
    state: Shared,
}

#[derive(Default)]
pub struct FakeEdcBuilder {
    existing: Vec<String>,
    edr_ready_after: u32,
    probe_status: Option<u16>,
    api_key: Option<String>,
}

impl FakeEdcBuilder {
    /// Pre-create a resource, e.g. `assets/asset-1`.
    pub fn existing(mut self, key: &str) -> Self {
        self.existing.push(key.to_string());
        self
    }

    /// Number of empty EDR query responses before the entry appears.
    pub fn edr_ready_after(mut self, polls: u32) -> Self {
        self.edr_ready_after = polls;
        self
    }

    /// Answer every resource probe with this status.
    pub fn probe_status(mut self, status: u16) -> Self {
        self.probe_status = Some(status);
        self
    }

    /// Reject Management API calls whose `X-Api-Key` differs with 401.
    pub fn api_key(mut self, key: &str) -> Self {
        self.api_key = Some(key.to_string());
        self
    }

    pub async fn start(self) -> FakeEdc {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake EDC");
        let addr = listener.local_addr().expect("No local address");
        let base_url = format!("http://{addr}");

        let state: Shared = Arc::new(Mutex::new(Inner {
            existing: self.existing.into_iter().collect(),
            edr_ready_after: self.edr_ready_after,
            probe_status: self.probe_status,
            api_key: self.api_key,
            base_url: base_url.clone(),
            ..Default::default()
        }));

        let app = router().with_state(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Fake EDC failed");
        });
        crate::test_log!("FIXTURE: Fake EDC listening on {}", base_url);

        FakeEdc { base_url, state }
    }
}

impl FakeEdc {
    pub fn builder() -> FakeEdcBuilder {
        FakeEdcBuilder::default()
    }

    pub async fn start() -> Self {
        Self::builder().start().await
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn posts(&self) -> usize {
        self.calls().iter().filter(|c| c.starts_with("POST ")).count()
    }

    pub fn edr_polls(&self) -> u32 {
        self.state.lock().unwrap().edr_polls
    }
}

fn record(state: &Shared, call: String) {
    state.lock().unwrap().calls.push(call);
}

fn authorized(state: &Shared, headers: &HeaderMap) -> bool {
    let presented = headers.get("x-api-key").and_then(|v| v.to_str().ok());
    match (&state.lock().unwrap().api_key, presented) {
        (_, None) => false,
        (Some(expected), Some(key)) => key == expected,
        (None, Some(key)) => !key.is_empty(),
    }
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (StatusCode::UNAUTHORIZED, Json(json!([{"message": "invalid api key"}])))
}

fn probe(state: &Shared, headers: &HeaderMap, collection: &str, id: &str) -> (StatusCode, Json<Value>) {
    record(state, format!("GET /{collection}/{id}"));
    if !authorized(state, headers) {
        return unauthorized();
    }
    let inner = state.lock().unwrap();
    if let Some(status) = inner.probe_status {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, Json(json!([{"message": "forced"}])));
    }
    if inner.existing.contains(&format!("{collection}/{id}")) {
        (StatusCode::OK, Json(json!({"@id": id})))
    } else {
        (StatusCode::NOT_FOUND, Json(json!([{"message": "not found"}])))
    }
}

fn create(state: &Shared, headers: &HeaderMap, collection: &str, body: &Value) -> (StatusCode, Json<Value>) {
    record(state, format!("POST /{collection}"));
    if !authorized(state, headers) {
        return unauthorized();
    }
    let Some(id) = body.get("@id").and_then(Value::as_str) else {
        return (StatusCode::BAD_REQUEST, Json(json!([{"message": "missing @id"}])));
    };
    let key = format!("{collection}/{id}");
    let mut inner = state.lock().unwrap();
    if !inner.existing.insert(key) {
        return (StatusCode::CONFLICT, Json(json!([{"message": "already exists"}])));
    }
    (StatusCode::OK, Json(json!({"@id": id, "createdAt": 1_700_000_000_000u64})))
}

fn router() -> Router<Shared> {
    let mut router = Router::new();
    for collection in ["assets", "policydefinitions", "contractdefinitions"] {
        router = router
            .route(
                &format!("/management/v3/{collection}/{{id}}"),
                get(
                    move |State(state): State<Shared>, headers: HeaderMap, Path(id): Path<String>| async move {
                        probe(&state, &headers, collection, &id)
                    },
                ),
            )
            .route(
                &format!("/management/v3/{collection}"),
                post(
                    move |State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>| async move {
                        create(&state, &headers, collection, &body)
                    },
                ),
            );
    }

    router
        .route("/management/v3/catalog/request", post(catalog))
        .route("/management/v3/edrs", post(negotiate))
        .route("/management/v3/edrs/request", post(query_edrs))
        .route("/management/v3/edrs/{id}/dataaddress", get(data_address))
        .route("/public/data", get(data))
}

async fn catalog(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    record(&state, "POST /catalog/request".to_string());
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    let asset = body
        .pointer("/querySpec/filterExpression/0/operandRight")
        .and_then(Value::as_str)
        .unwrap_or("asset-1")
        .to_string();
    (StatusCode::OK, Json(json!({
        "@id": "catalog-1",
        "@type": "dcat:Catalog",
        "dcat:dataset": {
            "@id": asset,
            "odrl:hasPolicy": {
                "@id": "offer-1",
                "@type": "odrl:Offer",
                "odrl:permission": {"odrl:action": {"@id": "odrl:use"}},
                "odrl:prohibition": [],
                "odrl:obligation": []
            }
        }
    })))
}

async fn negotiate(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    record(&state, "POST /edrs".to_string());
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    let offer = body.pointer("/policy/@id").and_then(Value::as_str);
    if offer != Some("offer-1") {
        return (StatusCode::BAD_REQUEST, Json(json!([{"message": "unknown offer"}])));
    }
    (StatusCode::OK, Json(json!({"@type": "IdResponse", "@id": "neg-1"})))
}

async fn query_edrs(State(state): State<Shared>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    record(&state, "POST /edrs/request".to_string());
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    let mut inner = state.lock().unwrap();
    inner.edr_polls += 1;
    let body = if inner.edr_polls > inner.edr_ready_after {
        json!([{
            "@id": TRANSFER_PROCESS_ID,
            "transferProcessId": TRANSFER_PROCESS_ID,
            "contractNegotiationId": "neg-1",
            "assetId": "asset-1"
        }])
    } else {
        json!([])
    };
    (StatusCode::OK, Json(body))
}

async fn data_address(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> (StatusCode, Json<Value>) {
    record(&state, format!("GET /edrs/{id}/dataaddress"));
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    if id != TRANSFER_PROCESS_ID {
        return (StatusCode::NOT_FOUND, Json(json!([{"message": "no such transfer"}])));
    }
    let base_url = state.lock().unwrap().base_url.clone();
    (
        StatusCode::OK,
        Json(json!({
            "@type": "DataAddress",
            "type": "https://w3id.org/idsa/v4.1/HTTP",
            "endpoint": format!("{base_url}/public/data"),
            "authorization": EDR_TOKEN
        })),
    )
}

async fn data(State(state): State<Shared>, headers: HeaderMap) -> (StatusCode, String) {
    record(&state, "GET /public/data".to_string());
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if token != EDR_TOKEN {
        return (StatusCode::FORBIDDEN, "forbidden".to_string());
    }
    (StatusCode::OK, DATA_BODY.to_string())
}
