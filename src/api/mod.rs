//! HTTP routing layer: path/query validation against the closed enums, one
//! domain-repository call per endpoint, JSON shaping, and the error mapping
//! (500 statement failure with a generic body, 400 validation, 401 auth,
//! 404 missing log file).

use std::sync::Arc;

use axum::extract::{Host, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::middleware;
use axum::routing::{get, put};
use axum::{Json, Router};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::auth::BearerGuard;
use crate::config::Config;
use crate::logs;
use crate::settings::types::{ImageRepo, JobTypeName, NextJobTypeName, RunStatus, WorkflowTypeName};
use crate::settings::SettingsRepo;
use crate::versions;

pub mod models;

use models::{LogFileQuery, TerriaFileQuery};

/// Image version labels must look like v<int>.<int>.<int>.
static VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^v\d+\.\d+\.\d+$").expect("version pattern"));

#[derive(Clone)]
pub struct ApiState {
    pub repo: SettingsRepo,
    pub cfg: Arc<Config>,
    pub guard: Arc<BearerGuard>,
    pub http: reqwest::Client,
}

type ApiError = (StatusCode, Json<Value>);

pub fn router(state: ApiState) -> Router {
    let protected = Router::new()
        .route("/get_job_order/:workflow_type_name", get(get_job_order))
        .route("/reset_job_order/:workflow_type_name", get(reset_job_order))
        .route("/get_job_defs", get(get_job_defs))
        .route("/get_run_list", get(get_run_list))
        .route("/get_run_props/:instance_id/:uid", get(get_run_props))
        .route("/get_terria_map_data", get(get_terria_map_data))
        .route("/get_terria_map_data_file", get(get_terria_map_data_file))
        .route("/get_log_file_list", get(get_log_file_list))
        .route("/get_log_file", get(get_log_file))
        .route("/get_sv_component_versions", get(get_component_versions))
        .route(
            "/instance_id/:instance_id/uid/:uid/status/:status",
            put(set_run_status),
        )
        .route(
            "/image_repo/:image_repo/job_type_name/:job_type_name/image_version/:version",
            put(set_image_version),
        )
        .route(
            "/workflow_type_name/:workflow_type_name/job_type_name/:job_type_name/next_job_type/:next_job_type_name",
            put(set_next_job),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            crate::auth::require_bearer,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(protected)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Log the failure server-side and hand the client a generic message; SQL
/// detail never leaves the process.
fn internal_err(action: &str, e: anyhow::Error) -> ApiError {
    tracing::error!(error = %format!("{e:#}"), "exception detected trying to {action}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "Response": format!("Exception detected trying to {action}.") })),
    )
}

fn bad_request(msg: String) -> ApiError {
    tracing::error!("{msg}");
    (StatusCode::BAD_REQUEST, Json(json!({ "Response": msg })))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn get_job_order(
    State(state): State<ApiState>,
    Path(workflow): Path<WorkflowTypeName>,
) -> Result<Json<Value>, ApiError> {
    state
        .repo
        .get_job_order(workflow)
        .await
        .map(Json)
        .map_err(|e| internal_err("get the job order", e))
}

async fn reset_job_order(
    State(state): State<ApiState>,
    Path(workflow): Path<WorkflowTypeName>,
) -> Result<Json<Value>, ApiError> {
    state
        .repo
        .reset_job_order(workflow)
        .await
        .map_err(|e| internal_err("reset the job order", e))?;

    let job_order = state
        .repo
        .get_job_order(workflow)
        .await
        .map_err(|e| internal_err("reset the job order", e))?;

    Ok(Json(reset_envelope(job_order)))
}

fn reset_envelope(job_order: Value) -> Value {
    json!([
        { "message": "The job order has been reset to the default." },
        { "job_order": job_order }
    ])
}

async fn get_job_defs(State(state): State<ApiState>) -> Result<Json<Value>, ApiError> {
    state
        .repo
        .get_job_defs()
        .await
        .map(Json)
        .map_err(|e| internal_err("get the job definitions", e))
}

async fn get_run_list(State(state): State<ApiState>) -> Result<Json<Value>, ApiError> {
    let mut runs = state
        .repo
        .get_run_list()
        .await
        .map_err(|e| internal_err("gather run data", e))?;

    if let Value::Array(items) = &mut runs {
        for item in items.iter_mut() {
            append_final_status(item);
        }
    }

    Ok(Json(json!({ "Response": runs })))
}

/// Derived field for the UI: a case-sensitive "Error" substring in the
/// status marks the run as failed, anything else as successful.
fn append_final_status(run: &mut Value) {
    let failed = run
        .get("status")
        .and_then(Value::as_str)
        .is_some_and(|s| s.contains("Error"));

    if let Value::Object(fields) = run {
        fields.insert(
            "final_status".to_string(),
            Value::String(if failed { "Error" } else { "Success" }.to_string()),
        );
    }
}

async fn get_run_props(
    State(state): State<ApiState>,
    Path((instance_id, uid)): Path<(i64, String)>,
) -> Result<Json<Value>, ApiError> {
    if instance_id <= 0 {
        return Err(bad_request(format!(
            "Error: The instance id {instance_id} is invalid. An instance id must be a positive integer."
        )));
    }

    state
        .repo
        .get_run_props(instance_id, &uid)
        .await
        .map(|props| Json(json!({ "Response": props })))
        .map_err(|e| internal_err("get the run properties", e))
}

async fn set_run_status(
    State(state): State<ApiState>,
    Path((instance_id, uid, status)): Path<(i64, String, RunStatus)>,
) -> Result<Json<Value>, ApiError> {
    if instance_id <= 0 {
        return Err(bad_request(format!(
            "Error: The instance id {instance_id} is invalid. An instance id must be a positive integer."
        )));
    }

    state
        .repo
        .update_run_status(instance_id, &uid, status)
        .await
        .map_err(|e| internal_err("update the run status", e))?;

    Ok(Json(json!({
        "Response": format!("The status of run {instance_id}/{uid} has been set to {status}")
    })))
}

async fn set_image_version(
    State(state): State<ApiState>,
    Path((image_repo, job_type_name, version)): Path<(ImageRepo, JobTypeName, String)>,
) -> Result<Json<Value>, ApiError> {
    if state.cfg.freeze_active() {
        return Err(bad_request(
            "Error: Image version updates are currently frozen.".to_string(),
        ));
    }

    if !VERSION_RE.is_match(&version) {
        return Err(bad_request(format!(
            "Error: The version {version} is invalid. Please use a value in the form of v<int>.<int>.<int>"
        )));
    }

    let image = format!(
        "{}{}{}",
        image_repo.repo_path(),
        job_type_name.image_suffix(),
        version
    );

    state
        .repo
        .update_job_image_version(&job_type_name.db_key(), &image)
        .await
        .map_err(|e| internal_err("update the image version", e))?;

    Ok(Json(json!({
        "Response": format!(
            "The docker repo/image:version for job name {job_type_name} has been set to {image}"
        )
    })))
}

async fn set_next_job(
    State(state): State<ApiState>,
    Path((workflow, job_type_name, next_job_type_name)): Path<(
        WorkflowTypeName,
        JobTypeName,
        NextJobTypeName,
    )>,
) -> Result<Json<Value>, ApiError> {
    // self-loop guard: reject before any database call
    if job_type_name.as_str() == next_job_type_name.as_str() {
        return Err(bad_request(format!(
            "Error: You cannot specify a next job type equal to the target job type ({job_type_name})."
        )));
    }

    state
        .repo
        .update_next_job_for_job(
            &job_type_name.db_key(),
            next_job_type_name.id(),
            workflow,
        )
        .await
        .map_err(|e| internal_err("update the next job name", e))?;

    let new_order = state
        .repo
        .get_job_order(workflow)
        .await
        .map_err(|e| internal_err("update the next job name", e))?;

    Ok(Json(json!([
        { "message": format!("The {job_type_name} next process has been set to {next_job_type_name}") },
        { "new_order": new_order }
    ])))
}

async fn get_terria_map_data(
    State(state): State<ApiState>,
    Query(filters): Query<crate::settings::TerriaFilters>,
) -> Result<Json<Value>, ApiError> {
    state
        .repo
        .get_terria_map_data(&filters)
        .await
        .map(Json)
        .map_err(|e| internal_err("get the terria map catalog data", e))
}

async fn get_terria_map_data_file(
    State(state): State<ApiState>,
    Query(query): Query<TerriaFileQuery>,
) -> Result<([(header::HeaderName, String); 2], String), ApiError> {
    let file_name = match query.file_name.as_deref() {
        Some(name) if !name.is_empty() && logs::is_safe_relative_path(name) => name.to_string(),
        Some(_) => {
            return Err(bad_request(
                "Error: Invalid output file name.".to_string(),
            ))
        }
        None => "apsviz.json".to_string(),
    };

    let payload = state
        .repo
        .get_terria_map_data(&query.filters())
        .await
        .map_err(|e| internal_err("get the terria map catalog data", e))?;

    let body = payload.to_string();

    // leave a copy on disk under a unique path, as the deployment expects
    let out_dir = state.cfg.temp_file_path.join(Uuid::new_v4().to_string());
    if let Err(e) = write_catalog_file(&out_dir, &file_name, &body).await {
        tracing::error!(error = %e, "could not write terria catalog file");
    }

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        body,
    ))
}

async fn write_catalog_file(
    dir: &std::path::Path,
    file_name: &str,
    body: &str,
) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(dir.join(file_name), body).await
}

async fn get_log_file_list(
    State(state): State<ApiState>,
    Host(host): Host,
) -> Json<Value> {
    let base_url = format!("http://{host}");
    Json(json!({ "Response": logs::log_file_list(&state.cfg.log_path, &base_url) }))
}

async fn get_log_file(
    State(state): State<ApiState>,
    Query(query): Query<LogFileQuery>,
) -> Result<([(header::HeaderName, String); 1], String), ApiError> {
    let requested = query.log_file.as_str();

    if !logs::is_safe_relative_path(requested) || !logs::is_log_file_name(requested) {
        return Err(bad_request("Error - Invalid log file name.".to_string()));
    }

    let Some(path) = logs::resolve_log_file(&state.cfg.log_path, requested) else {
        return Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "Response": "Error - Log file does not exist." })),
        ));
    };

    let contents = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| internal_err("read the log file", e.into()))?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain".to_string())],
        contents,
    ))
}

async fn get_component_versions(State(state): State<ApiState>) -> Result<Json<Value>, ApiError> {
    let defs = state
        .repo
        .get_job_defs()
        .await
        .map_err(|e| internal_err("gather the component versions", e))?;
    let local = versions::image_map(&defs);

    let mut peer_results = Vec::new();
    for peer in &state.cfg.peers {
        let result = versions::fetch_peer_defs(&state.http, peer).await;
        peer_results.push((peer.namespace.clone(), result));
    }

    let report = versions::compare(&state.cfg.system, local, peer_results);
    Ok(Json(json!({ "Response": report })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_envelope_is_message_then_order() {
        let envelope = reset_envelope(json!({"1": "staging"}));

        assert_eq!(
            envelope[0]["message"],
            "The job order has been reset to the default."
        );
        assert_eq!(envelope[1]["job_order"], json!({"1": "staging"}));
    }

    #[test]
    fn final_status_flags_error_substring_case_sensitively() {
        let mut failed = json!({ "status": "running, Error detected" });
        append_final_status(&mut failed);
        assert_eq!(failed["final_status"], "Error");

        let mut lowercase = json!({ "status": "no errors here" });
        append_final_status(&mut lowercase);
        assert_eq!(lowercase["final_status"], "Success");

        let mut missing = json!({ "instance_id": 1 });
        append_final_status(&mut missing);
        assert_eq!(missing["final_status"], "Success");
    }
}
