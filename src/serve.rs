//! Purpose: Provide the HTTP/JSON record API for userdesk.
//! Exports: `ServeConfig`, `serve`, `preflight_config`.
//! Role: Axum handlers, one per operation, over a shared `RecordStore`.
//! Invariants: Validation failures are 422 and missing ids are 404, never mixed.
//! Invariants: Error bodies use the `{"error": {...}}` envelope.
//! Invariants: Loopback-only unless explicitly allowed.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{DefaultBodyLimit, Path as AxumPath, Query, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::http::{init_tracing, is_loopback, run_server};
use userdesk::api::{DEFAULT_LIST_LIMIT, Error, ErrorKind, RecordFields, RecordStore};

pub const DEFAULT_MAX_BODY_BYTES: u64 = 64 * 1024;

#[derive(Clone, Debug)]
pub struct ServeConfig {
    pub bind: SocketAddr,
    pub db_path: PathBuf,
    pub allow_non_loopback: bool,
    pub max_body_bytes: u64,
}

struct AppState {
    store: RecordStore,
}

pub async fn serve(config: ServeConfig) -> Result<(), Error> {
    preflight_config(&config)?;

    init_tracing();

    let max_body_bytes: usize = config.max_body_bytes.try_into().map_err(|_| {
        Error::new(ErrorKind::Usage).with_message("--max-body-bytes is too large")
    })?;

    let store = RecordStore::open(&config.db_path)?;
    info!(db = %store.path().display(), "user store opened");
    let app = router(store, max_body_bytes);
    run_server(config.bind, app, "user api").await
}

fn router(store: RecordStore, max_body_bytes: usize) -> Router {
    let state = Arc::new(AppState { store });
    Router::new()
        .route("/healthz", get(healthz))
        .route("/users/", get(list_users).post(create_user))
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(read_user).put(update_user).delete(delete_user),
        )
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub fn preflight_config(config: &ServeConfig) -> Result<(), Error> {
    if !is_loopback(config.bind.ip()) && !config.allow_non_loopback {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("non-loopback bind requires explicit opt-in")
            .with_hint("Re-run with --allow-non-loopback or use a loopback address."));
    }

    if config.max_body_bytes == 0 {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("--max-body-bytes must be greater than zero")
            .with_hint("Use a positive value like 65536."));
    }

    if config.max_body_bytes > usize::MAX as u64 {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("--max-body-bytes exceeds platform limits")
            .with_hint("Use a smaller value that fits in memory."));
    }

    if config.db_path.as_os_str().is_empty() {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("--db must not be empty")
            .with_hint("Pass a file path like users.db."));
    }

    Ok(())
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    skip: Option<u32>,
    limit: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    kind: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    issues: Vec<IssueBody>,
}

#[derive(Debug, Serialize)]
struct IssueBody {
    field: String,
    message: String,
}

async fn healthz() -> Response {
    json_response(json!({ "ok": true }))
}

async fn create_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RecordFields>, JsonRejection>,
) -> Response {
    let Json(fields) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return error_response(body_error(rejection)),
    };
    match state.store.create(&fields) {
        Ok(record) => json_response(json!(record)),
        Err(err) => error_response(err),
    }
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => {
            return error_response(
                Error::new(ErrorKind::Validation).with_message(rejection.body_text()),
            );
        }
    };
    let skip = query.skip.unwrap_or(0);
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    match state.store.list(skip, limit) {
        Ok(records) => json_response(json!(records)),
        Err(err) => error_response(err),
    }
}

async fn read_user(
    State(state): State<Arc<AppState>>,
    id: Result<AxumPath<i64>, PathRejection>,
) -> Response {
    let id = match id {
        Ok(AxumPath(id)) => id,
        Err(rejection) => return error_response(path_error(rejection)),
    };
    match state.store.get(id) {
        Ok(record) => json_response(json!(record)),
        Err(err) => error_response(err),
    }
}

async fn update_user(
    State(state): State<Arc<AppState>>,
    id: Result<AxumPath<i64>, PathRejection>,
    payload: Result<Json<RecordFields>, JsonRejection>,
) -> Response {
    let id = match id {
        Ok(AxumPath(id)) => id,
        Err(rejection) => return error_response(path_error(rejection)),
    };
    let Json(fields) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return error_response(body_error(rejection)),
    };
    match state.store.update(id, &fields) {
        Ok(record) => json_response(json!(record)),
        Err(err) => error_response(err),
    }
}

async fn delete_user(
    State(state): State<Arc<AppState>>,
    id: Result<AxumPath<i64>, PathRejection>,
) -> Response {
    let id = match id {
        Ok(AxumPath(id)) => id,
        Err(rejection) => return error_response(path_error(rejection)),
    };
    match state.store.delete(id) {
        Ok(()) => json_response(json!({ "status": "success", "message": "User deleted" })),
        Err(err) => error_response(err),
    }
}

fn body_error(rejection: JsonRejection) -> Error {
    let kind = match rejection {
        JsonRejection::MissingJsonContentType(_) => ErrorKind::Usage,
        _ if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => ErrorKind::Usage,
        _ => ErrorKind::Validation,
    };
    Error::new(kind).with_message(rejection.body_text())
}

fn path_error(rejection: PathRejection) -> Error {
    Error::new(ErrorKind::Validation).with_message(rejection.body_text())
}

fn json_response(payload: serde_json::Value) -> Response {
    let mut response = Json(payload).into_response();
    response
        .headers_mut()
        .insert("userdesk-version", HeaderValue::from_static("1"));
    response
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Usage => StatusCode::BAD_REQUEST,
        ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Storage | ErrorKind::Io | ErrorKind::Internal => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(err: Error) -> Response {
    let status = status_for(err.kind());
    if status.is_server_error() {
        tracing::error!(error = %err, "request failed");
    }
    let body = ErrorEnvelope {
        error: ErrorBody {
            kind: err.kind().as_str().to_string(),
            message: err.message().unwrap_or("error").to_string(),
            hint: err.hint().map(str::to_string),
            id: err.id(),
            issues: err
                .issues()
                .iter()
                .map(|issue| IssueBody {
                    field: issue.field.clone(),
                    message: issue.message.clone(),
                })
                .collect(),
        },
    };
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert("userdesk-version", HeaderValue::from_static("1"));
    response
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, ServeConfig, preflight_config, serve, status_for};
    use axum::http::StatusCode;

    fn config(bind: &str) -> ServeConfig {
        ServeConfig {
            bind: bind.parse().expect("bind"),
            db_path: "users.db".into(),
            allow_non_loopback: false,
            max_body_bytes: 64 * 1024,
        }
    }

    #[tokio::test]
    async fn serve_rejects_non_loopback_bind() {
        let err = serve(config("0.0.0.0:0")).await.expect_err("expected usage error");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn non_loopback_allowed_with_flag() {
        let mut config = config("0.0.0.0:0");
        config.allow_non_loopback = true;
        preflight_config(&config).expect("config ok");
    }

    #[test]
    fn body_limit_must_be_positive() {
        let mut config = config("127.0.0.1:0");
        config.max_body_bytes = 0;
        let err = preflight_config(&config).expect_err("expected usage error");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn empty_db_path_is_rejected() {
        let mut config = config("127.0.0.1:0");
        config.db_path = "".into();
        let err = preflight_config(&config).expect_err("expected usage error");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn error_kinds_map_to_distinct_statuses() {
        assert_eq!(status_for(ErrorKind::Validation), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorKind::Usage), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::Storage), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
