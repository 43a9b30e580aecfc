//! Shared fixtures: one mock upstream server (Keycloak introspection, licence
//! registry, Vault KV v2) and a fully wired gateway pointed at it.
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Form, Json, Router,
    body::Body,
    Extension,
    extract::{Path, State},
    http::{HeaderMap, Request, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower::ServiceExt;

use credential_gateway::app;
use credential_gateway::config::Config;
use credential_gateway::middleware::http::HttpLimits;
use credential_gateway::services::auth::RequestCtx;

pub const AUDIENCE: &str = "credential";
pub const REALM: &str = "ledger";
pub const CLIENT_ID: &str = "credential-api";
pub const CLIENT_SECRET: &str = "client-secret";
pub const VAULT_TOKEN: &str = "vault-root";
pub const VAULT_MOUNT: &str = "secret";

/// The mock introspection endpoint answers this token with a 500.
pub const FAILING_TOKEN: &str = "explode";

#[derive(Default)]
pub struct MockState {
    pub tokens: Mutex<HashMap<String, Value>>,
    pub licences: Mutex<HashMap<String, Vec<Value>>>,
    pub secrets: Mutex<HashMap<String, Value>>,
    pub introspections: AtomicUsize,
    pub licence_fetches: AtomicUsize,
    pub vault_writes: AtomicUsize,
    pub introspection_delay: Mutex<Option<Duration>>,
    pub licence_delay: Mutex<Option<Duration>>,
    pub licence_status: Mutex<Option<StatusCode>>,
}

#[derive(Clone)]
pub struct MockUpstreams {
    pub addr: SocketAddr,
    pub state: Arc<MockState>,
}

impl MockUpstreams {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());

        let router = Router::new()
            .route(
                "/realms/{realm}/protocol/openid-connect/token/introspect",
                post(introspect),
            )
            .route("/license/v1/mine", get(mine))
            .route("/v1/{mount}/data/{*path}", get(vault_read).post(vault_write))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn grant_token(&self, token: &str, record: Value) {
        self.state
            .tokens
            .lock()
            .unwrap()
            .insert(token.to_string(), record);
    }

    pub fn grant_licences(&self, token: &str, licences: Vec<Value>) {
        self.state
            .licences
            .lock()
            .unwrap()
            .insert(token.to_string(), licences);
    }

    pub fn stored_secret(&self, path: &str) -> Option<Value> {
        self.state.secrets.lock().unwrap().get(path).cloned()
    }

    /// Hold every introspection answer back by `delay`.
    pub fn stall_introspection(&self, delay: Duration) {
        *self.state.introspection_delay.lock().unwrap() = Some(delay);
    }

    /// Hold every licence registry answer back by `delay`.
    pub fn stall_licences(&self, delay: Duration) {
        *self.state.licence_delay.lock().unwrap() = Some(delay);
    }

    /// Answer every licence registry call with `status` and no body.
    pub fn fail_licences(&self, status: StatusCode) {
        *self.state.licence_status.lock().unwrap() = Some(status);
    }

    pub fn introspections(&self) -> usize {
        self.state.introspections.load(Ordering::SeqCst)
    }

    pub fn licence_fetches(&self) -> usize {
        self.state.licence_fetches.load(Ordering::SeqCst)
    }

    pub fn vault_writes(&self) -> usize {
        self.state.vault_writes.load(Ordering::SeqCst)
    }
}

async fn introspect(
    State(state): State<Arc<MockState>>,
    Path(realm): Path<String>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    state.introspections.fetch_add(1, Ordering::SeqCst);
    let delay = *state.introspection_delay.lock().unwrap();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    if realm != REALM
        || form.get("client_id").map(String::as_str) != Some(CLIENT_ID)
        || form.get("client_secret").map(String::as_str) != Some(CLIENT_SECRET)
    {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let token = form.get("token").cloned().unwrap_or_default();
    if token == FAILING_TOKEN {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let record = state
        .tokens
        .lock()
        .unwrap()
        .get(&token)
        .cloned()
        .unwrap_or_else(|| json!({"active": false}));
    Json(record).into_response()
}

async fn mine(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.licence_fetches.fetch_add(1, Ordering::SeqCst);
    let delay = *state.licence_delay.lock().unwrap();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    let failure = *state.licence_status.lock().unwrap();
    if let Some(status) = failure {
        return status.into_response();
    }

    let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    else {
        return StatusCode::UNAUTHORIZED.into_response();
    };

    let licences = state
        .licences
        .lock()
        .unwrap()
        .get(token)
        .cloned()
        .unwrap_or_default();
    Json(json!({"data": licences})).into_response()
}

fn vault_authorized(headers: &HeaderMap, mount: &str) -> bool {
    mount == VAULT_MOUNT
        && headers.get("x-vault-token").and_then(|v| v.to_str().ok()) == Some(VAULT_TOKEN)
}

async fn vault_read(
    State(state): State<Arc<MockState>>,
    Path((mount, path)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if !vault_authorized(&headers, &mount) {
        return StatusCode::FORBIDDEN.into_response();
    }

    match state.secrets.lock().unwrap().get(&path) {
        Some(data) => Json(json!({"data": {"data": data, "metadata": {"version": 1}}})).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"errors": []}))).into_response(),
    }
}

async fn vault_write(
    State(state): State<Arc<MockState>>,
    Path((mount, path)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !vault_authorized(&headers, &mount) {
        return StatusCode::FORBIDDEN.into_response();
    }

    state.vault_writes.fetch_add(1, Ordering::SeqCst);
    state
        .secrets
        .lock()
        .unwrap()
        .insert(path, body["data"].clone());
    Json(json!({"data": {"version": 1}})).into_response()
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub fn new_token() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn active_record() -> Value {
    let now = now();
    json!({
        "active": true,
        "aud": [AUDIENCE, "account"],
        "iat": now - 60,
        "exp": now + 3600,
        "sub": "user-1",
        "preferred_username": "alice",
        "email": "alice@example.com",
    })
}

pub fn licence(uuid: &str, entity_uuid: &str) -> Value {
    let now = now();
    json!({
        "uuid": uuid,
        "type_uuid": "type-1",
        "name": "Pro",
        "iat": now - 60,
        "exp": now + 3600,
        "entity_uuid": entity_uuid,
        "api_roles": ["credential:read"],
        "app_roles": [],
        "apps": [],
    })
}

pub fn config_for(mock: &MockUpstreams) -> Config {
    config_with(mock, &[])
}

/// Test configuration with `overrides` applied on top.
pub fn config_with(mock: &MockUpstreams, overrides: &[(&'static str, &str)]) -> Config {
    let mut vars: HashMap<&str, String> = HashMap::from([
        ("AUTH_AUDIENCE", AUDIENCE.to_string()),
        ("KEYCLOAK_HOST", mock.url()),
        ("KEYCLOAK_REALM", REALM.to_string()),
        ("KEYCLOAK_CLIENT_ID", CLIENT_ID.to_string()),
        ("KEYCLOAK_CLIENT_SECRET", CLIENT_SECRET.to_string()),
        ("LICENSE_REGISTRY_URL", mock.url()),
        ("CACHE_BACKEND", "memory".to_string()),
        ("VAULT_HOST", "http://127.0.0.1".to_string()),
        ("VAULT_PORT", mock.addr.port().to_string()),
        ("VAULT_TOKEN", VAULT_TOKEN.to_string()),
        ("VAULT_SECRET_PATH", VAULT_MOUNT.to_string()),
        ("UPSTREAM_TIMEOUT_SECONDS", "2".to_string()),
        ("FORCED_REFRESH_INTERVAL_SECONDS", "0".to_string()),
    ]);
    for &(key, value) in overrides {
        vars.insert(key, value.to_string());
    }

    Config::from_lookup(|k| vars.get(k).cloned()).unwrap()
}

/// Gateway wired against `mock`, plus a bare `/docs` route standing in for an
/// unprotected page and `/whoami` echoing the authenticated identity.
pub async fn gateway(mock: &MockUpstreams) -> Router {
    gateway_with(mock, &[]).await
}

pub async fn gateway_with(mock: &MockUpstreams, overrides: &[(&'static str, &str)]) -> Router {
    let config = config_with(mock, overrides);
    let state = app::build_state(&config).await.unwrap();

    async fn docs() -> &'static str {
        "docs"
    }

    async fn whoami(Extension(ctx): Extension<RequestCtx>) -> Json<Value> {
        Json(json!({"user": ctx.user_uuid(), "licence": ctx.license_uuid}))
    }

    let routes = credential_gateway::api::v1::routes()
        .route("/docs", get(docs))
        .route("/whoami", get(whoami));
    app::compose(
        routes,
        state,
        HttpLimits {
            request_timeout: Duration::from_secs(10),
            body_limit_bytes: config.request_body_limit_bytes,
        },
    )
}

pub struct RequestBuilder {
    inner: axum::http::request::Builder,
    body: Body,
}

pub fn request(method: &str, uri: &str) -> RequestBuilder {
    RequestBuilder {
        inner: Request::builder().method(method).uri(uri),
        body: Body::empty(),
    }
}

impl RequestBuilder {
    pub fn bearer(mut self, token: &str) -> Self {
        self.inner = self
            .inner
            .header(header::AUTHORIZATION, format!("Bearer {token}"));
        self
    }

    pub fn licence(mut self, uuid: &str) -> Self {
        self.inner = self.inner.header("x-license-key", uuid);
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.inner = self.inner.header(name, value);
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.inner = self
            .inner
            .header(header::CONTENT_TYPE, "application/json");
        self.body = Body::from(body.to_string());
        self
    }

    pub async fn send(self, app: &Router) -> (StatusCode, HeaderMap, Value) {
        let request = self.inner.body(self.body).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        (status, headers, body)
    }
}
