//! Purpose: Provide a blocking HTTP client for the `/users/` JSON API.
//! Exports: `RecordClient`, `DeleteAck`.
//! Role: Used by the UI and integration tests to mirror store operations remotely.
//! Invariants: Error envelopes decode into the same `ErrorKind` the server raised.
//! Invariants: Transport failures surface as `ErrorKind::Io`; nothing is retried.
//! Invariants: Base URLs are http(s) and normalized to the server root.
#![allow(clippy::result_large_err)]

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::core::error::{Error, ErrorKind, FieldIssue};
use crate::core::record::{Record, RecordFields};

type ApiResult<T> = Result<T, Error>;

#[derive(Clone)]
pub struct RecordClient {
    inner: Arc<RecordClientInner>,
}

struct RecordClientInner {
    base_url: Url,
    agent: ureq::Agent,
}

impl fmt::Debug for RecordClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish()
    }
}

/// Body returned by a successful delete.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DeleteAck {
    pub status: String,
    pub message: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: RemoteError,
}

#[derive(Deserialize)]
struct RemoteError {
    kind: String,
    message: Option<String>,
    hint: Option<String>,
    id: Option<i64>,
    #[serde(default)]
    issues: Vec<RemoteIssue>,
}

#[derive(Deserialize)]
struct RemoteIssue {
    field: String,
    message: String,
}

impl RecordClient {
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        let agent = ureq::AgentBuilder::new().build();
        Ok(Self {
            inner: Arc::new(RecordClientInner { base_url, agent }),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    pub fn create(&self, fields: &RecordFields) -> ApiResult<Record> {
        let url = self.users_url(None)?;
        self.request_json("POST", &url, Some(fields))
    }

    pub fn list(&self, skip: u32, limit: u32) -> ApiResult<Vec<Record>> {
        let mut url = self.users_url(None)?;
        url.query_pairs_mut()
            .append_pair("skip", &skip.to_string())
            .append_pair("limit", &limit.to_string());
        self.request_json::<(), _>("GET", &url, None)
    }

    pub fn get(&self, id: i64) -> ApiResult<Record> {
        let url = self.users_url(Some(id))?;
        self.request_json::<(), _>("GET", &url, None)
            .map_err(|err| with_id(err, id))
    }

    pub fn update(&self, id: i64, fields: &RecordFields) -> ApiResult<Record> {
        let url = self.users_url(Some(id))?;
        self.request_json("PUT", &url, Some(fields))
            .map_err(|err| with_id(err, id))
    }

    pub fn delete(&self, id: i64) -> ApiResult<DeleteAck> {
        let url = self.users_url(Some(id))?;
        self.request_json::<(), _>("DELETE", &url, None)
            .map_err(|err| with_id(err, id))
    }

    fn users_url(&self, id: Option<i64>) -> ApiResult<Url> {
        match id {
            Some(id) => build_url(&self.inner.base_url, &["users", &id.to_string()]),
            None => build_url(&self.inner.base_url, &["users", ""]),
        }
    }

    fn request_json<T, R>(&self, method: &str, url: &Url, body: Option<&T>) -> ApiResult<R>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        let request = self
            .inner
            .agent
            .request(method, url.as_str())
            .set("Accept", "application/json");
        let response = match body {
            None => request.call(),
            Some(body) => {
                let payload = serde_json::to_string(body).map_err(|err| {
                    Error::new(ErrorKind::Internal)
                        .with_message("failed to encode request json")
                        .with_source(err)
                })?;
                request
                    .set("Content-Type", "application/json")
                    .send_string(&payload)
            }
        };

        match response {
            Ok(resp) => read_json_response(resp),
            Err(ureq::Error::Status(code, resp)) => Err(parse_error_response(code, resp)),
            Err(ureq::Error::Transport(err)) => Err(Error::new(ErrorKind::Io)
                .with_message("request failed")
                .with_source(err)),
        }
    }
}

fn with_id(err: Error, id: i64) -> Error {
    if err.id().is_some() {
        err
    } else {
        err.with_id(id)
    }
}

fn normalize_base_url(raw: String) -> ApiResult<Url> {
    let mut url = Url::parse(&raw).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid backend url")
            .with_source(err)
    })?;
    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("backend url must use http or https scheme"));
    }
    if url.path() != "/" && !url.path().is_empty() {
        return Err(
            Error::new(ErrorKind::Usage).with_message("backend url must not include a path")
        );
    }
    url.set_path("/");
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn build_url(base_url: &Url, segments: &[&str]) -> ApiResult<Url> {
    let mut url = base_url.clone();
    {
        let mut path = url.path_segments_mut().map_err(|_| {
            Error::new(ErrorKind::Usage).with_message("backend url cannot be a base")
        })?;
        path.clear();
        for segment in segments {
            path.push(segment);
        }
    }
    Ok(url)
}

fn read_json_response<R>(response: ureq::Response) -> ApiResult<R>
where
    R: DeserializeOwned,
{
    let body = response.into_string().map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read response body")
            .with_source(err)
    })?;
    serde_json::from_str(&body).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("invalid response json")
            .with_source(err)
    })
}

fn parse_error_response(status: u16, response: ureq::Response) -> Error {
    let body = response.into_string().unwrap_or_default();
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(&body) {
        return error_from_remote(envelope.error);
    }
    let kind = error_kind_from_status(status);
    Error::new(kind).with_message(format!("server returned status {status}"))
}

fn error_from_remote(remote: RemoteError) -> Error {
    let kind = ErrorKind::parse(&remote.kind).unwrap_or(ErrorKind::Internal);
    let mut err = Error::new(kind);
    if let Some(message) = remote.message {
        err = err.with_message(message);
    }
    if let Some(hint) = remote.hint {
        err = err.with_hint(hint);
    }
    if let Some(id) = remote.id {
        err = err.with_id(id);
    }
    if !remote.issues.is_empty() {
        err = err.with_issues(
            remote
                .issues
                .into_iter()
                .map(|issue| FieldIssue::new(issue.field, issue.message))
                .collect(),
        );
    }
    err
}

fn error_kind_from_status(status: u16) -> ErrorKind {
    match status {
        400 | 413 | 415 => ErrorKind::Usage,
        404 => ErrorKind::NotFound,
        422 => ErrorKind::Validation,
        500..=599 => ErrorKind::Internal,
        _ => ErrorKind::Io,
    }
}
