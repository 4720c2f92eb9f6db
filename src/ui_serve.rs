//! Purpose: Serve the form-driven HTML UI that fronts the record API.
//! Exports: `UiConfig`, `serve_ui`, `preflight_ui_config`.
//! Role: Post/redirect/get handlers over one in-process `Session`.
//! Invariants: The backend URL is resolved once at startup.
//! Invariants: Blocking API calls run on the blocking pool, one per action.
//! Invariants: A successful delete pauses briefly before redirecting.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{Form, Path as AxumPath, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use serde::Deserialize;
use tokio::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::http::{init_tracing, is_loopback, run_server};
use userdesk::api::{Error, ErrorKind, RecordClient};
use userdesk::ui::controller;
use userdesk::ui::{FormData, ListFilter, Renderer, Session, page_view};

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";
const DELETE_PAUSE: Duration = Duration::from_millis(500);

#[derive(Clone, Debug)]
pub struct UiConfig {
    pub bind: SocketAddr,
    pub backend_url: String,
    pub allow_non_loopback: bool,
}

struct UiState {
    client: RecordClient,
    renderer: Renderer,
    session: Mutex<Session>,
}

pub async fn serve_ui(config: UiConfig) -> Result<(), Error> {
    let client = preflight_ui_config(&config)?;

    init_tracing();
    info!(backend = %client.base_url(), "ui using record api");

    let state = Arc::new(UiState {
        client,
        renderer: Renderer::new()?,
        session: Mutex::new(Session::new()),
    });
    run_server(config.bind, router(state), "user ui").await
}

pub fn preflight_ui_config(config: &UiConfig) -> Result<RecordClient, Error> {
    if !is_loopback(config.bind.ip()) && !config.allow_non_loopback {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("non-loopback bind requires explicit opt-in")
            .with_hint("Re-run with --allow-non-loopback or use a loopback address."));
    }
    RecordClient::new(config.backend_url.clone()).map_err(|err| {
        err.with_hint(
            "Set BACKEND_URL or --backend-url to a root url like http://127.0.0.1:8000.",
        )
    })
}

fn router(state: Arc<UiState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/submit", post(submit))
        .route("/cancel", post(cancel))
        .route("/records/:id/edit", post(edit))
        .route("/records/:id/delete", post(request_delete))
        .route("/records/:id/confirm-delete", post(confirm_delete))
        .route("/records/:id/cancel-delete", post(cancel_delete))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct IndexQuery {
    search: Option<String>,
    gender: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SubmitForm {
    name: String,
    age: String,
    gender: String,
    pincode: String,
    address: String,
}

async fn index(State(state): State<Arc<UiState>>, Query(query): Query<IndexQuery>) -> Response {
    let result = with_session(state, move |state, session| {
        if query.search.is_some() || query.gender.is_some() {
            let filter = ListFilter::new(query.search.unwrap_or_default(), query.gender);
            controller::set_filter(session, filter);
        }
        let records = controller::load_records(session, &state.client);
        let notices = session.take_notices();
        let view = page_view(session, &records, notices);
        state.renderer.render(&view)
    })
    .await;
    match result {
        Ok(html) => Html(html).into_response(),
        Err(err) => failure(err),
    }
}

async fn submit(State(state): State<Arc<UiState>>, Form(input): Form<SubmitForm>) -> Response {
    let form = FormData::from_inputs(
        input.name,
        &input.age,
        input.gender,
        input.pincode,
        input.address,
    );
    redirect_after(
        with_session(state, move |state, session| {
            controller::submit(session, &state.client, form);
            Ok(())
        })
        .await,
    )
}

async fn cancel(State(state): State<Arc<UiState>>) -> Response {
    redirect_after(
        with_session(state, |_, session| {
            controller::cancel_edit(session);
            Ok(())
        })
        .await,
    )
}

async fn edit(State(state): State<Arc<UiState>>, AxumPath(id): AxumPath<i64>) -> Response {
    redirect_after(
        with_session(state, move |state, session| {
            controller::begin_edit(session, &state.client, id);
            Ok(())
        })
        .await,
    )
}

async fn request_delete(
    State(state): State<Arc<UiState>>,
    AxumPath(id): AxumPath<i64>,
) -> Response {
    redirect_after(
        with_session(state, move |_, session| {
            controller::request_delete(session, id);
            Ok(())
        })
        .await,
    )
}

async fn confirm_delete(
    State(state): State<Arc<UiState>>,
    AxumPath(id): AxumPath<i64>,
) -> Response {
    let result = with_session(state, move |state, session| {
        Ok(controller::confirm_delete(session, &state.client, id))
    })
    .await;
    if let Ok(true) = result {
        tokio::time::sleep(DELETE_PAUSE).await;
    }
    redirect_after(result.map(|_| ()))
}

async fn cancel_delete(
    State(state): State<Arc<UiState>>,
    AxumPath(id): AxumPath<i64>,
) -> Response {
    redirect_after(
        with_session(state, move |_, session| {
            controller::cancel_delete(session, id);
            Ok(())
        })
        .await,
    )
}

/// Run `action` against the session on the blocking pool.
async fn with_session<F, R>(state: Arc<UiState>, action: F) -> Result<R, Error>
where
    F: FnOnce(&UiState, &mut Session) -> Result<R, Error> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut session = state
            .session
            .lock()
            .map_err(|_| Error::new(ErrorKind::Internal).with_message("session lock poisoned"))?;
        action(&*state, &mut *session)
    })
    .await
    .map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("ui task failed")
            .with_source(err)
    })?
}

fn redirect_after(result: Result<(), Error>) -> Response {
    match result {
        Ok(()) => Redirect::to("/").into_response(),
        Err(err) => failure(err),
    }
}

fn failure(err: Error) -> Response {
    error!(error = %err, "ui request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, format!("{err}\n")).into_response()
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_BACKEND_URL, UiConfig, preflight_ui_config};
    use userdesk::api::ErrorKind;

    fn config(bind: &str, backend_url: &str) -> UiConfig {
        UiConfig {
            bind: bind.parse().expect("bind"),
            backend_url: backend_url.to_string(),
            allow_non_loopback: false,
        }
    }

    #[test]
    fn default_backend_is_accepted() {
        let client =
            preflight_ui_config(&config("127.0.0.1:0", DEFAULT_BACKEND_URL)).expect("ok");
        assert_eq!(client.base_url().as_str(), "http://127.0.0.1:8000/");
    }

    #[test]
    fn backend_with_path_is_rejected_with_hint() {
        let err = preflight_ui_config(&config("127.0.0.1:0", "http://127.0.0.1:8000/api"))
            .expect_err("usage");
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert!(err.hint().is_some());
    }

    #[test]
    fn non_loopback_requires_flag() {
        let err =
            preflight_ui_config(&config("0.0.0.0:0", DEFAULT_BACKEND_URL)).expect_err("usage");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }
}
