use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use apsviz_settings::api::{self, ApiState};
use apsviz_settings::auth::{BearerGuard, Claims};
use apsviz_settings::config::{Config, DbParams};
use apsviz_settings::db::RetryPolicy;
use apsviz_settings::settings::job_order::DefaultJobOrder;
use apsviz_settings::settings::repo::{APSVIZ, ASGS, ASGS_BATCH};
use apsviz_settings::{DbRegistry, SettingsRepo};

pub const TEST_SECRET: &str = "router-test-secret";

fn unreachable_db() -> DbParams {
    // port 1 refuses immediately; combined with a single-attempt retry
    // policy, statements fail fast instead of blocking the test run
    DbParams {
        host: "127.0.0.1".to_string(),
        port: 1,
        database: "none".to_string(),
        username: "nobody".to_string(),
        password: "nothing".to_string(),
    }
}

fn one_shot_retry() -> RetryPolicy {
    RetryPolicy {
        base_seconds: 0,
        max_seconds: 0,
        jitter_pct: 0.0,
        max_attempts: Some(1),
    }
}

pub fn temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("settings-test-{tag}-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

/// Router state wired to an unreachable database: auth, path validation,
/// freeze mode, and log-file handling are all exercisable without Postgres,
/// and anything that does reach the database comes back as a 500.
pub fn test_state(log_path: PathBuf, freeze_path: PathBuf) -> ApiState {
    let db = unreachable_db();
    let cfg = Arc::new(Config {
        bind_addr: "127.0.0.1:0".to_string(),
        system: "test".to_string(),
        asgs_db: db.clone(),
        apsviz_db: db.clone(),
        retry: one_shot_retry(),
        log_path,
        temp_file_path: std::env::temp_dir(),
        freeze_path,
        jwt_secret: TEST_SECRET.to_string(),
        job_order_path: None,
        peers: Vec::new(),
    });

    let mut registry = DbRegistry::new();
    registry
        .register(ASGS, &db.url(), true, cfg.retry.clone())
        .expect("register asgs");
    registry
        .register(ASGS_BATCH, &db.url(), false, cfg.retry.clone())
        .expect("register asgs-batch");
    registry
        .register(APSVIZ, &db.url(), true, cfg.retry.clone())
        .expect("register apsviz");

    let job_order = Arc::new(DefaultJobOrder::load(None).expect("builtin job order"));
    let repo = SettingsRepo::new(Arc::new(registry), job_order);

    ApiState {
        repo,
        cfg: cfg.clone(),
        guard: Arc::new(BearerGuard::new(&cfg.jwt_secret)),
        http: reqwest::Client::new(),
    }
}

pub fn test_router() -> axum::Router {
    let state = test_state(temp_dir("logs"), temp_dir("freeze").join("absent"));
    api::router(state)
}

pub fn mint_token(secret: &str) -> String {
    let claims = Claims {
        sub: "router-tests".to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("mint token")
}

pub async fn send(
    app: axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
) -> Response<axum::body::Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::HOST, "settings.test:4000");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    app.oneshot(builder.body(Body::empty()).expect("request"))
        .await
        .expect("router never errors")
}

pub async fn body_json(response: Response<axum::body::Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

#[allow(dead_code)]
pub async fn body_text(response: Response<axum::body::Body>) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}

#[allow(dead_code)]
pub fn assert_status(response: &Response<axum::body::Body>, expected: StatusCode) {
    assert_eq!(response.status(), expected);
}
