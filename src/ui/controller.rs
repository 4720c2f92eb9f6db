//! Purpose: Translate UI actions into record API calls and session transitions.
//! Exports: `RecordApi`, `SubmitOutcome`, action functions.
//! Role: Pure-ish orchestration; all IO goes through the `RecordApi` seam.
//! Invariants: A failed call queues an error notice and leaves mode and delete
//! states as they were.
//! Invariants: No call is made when client-side validation fails.
use tracing::warn;

use super::form::FormData;
use super::session::{DeleteState, ListFilter, Notice, Session};
use crate::api::{DEFAULT_LIST_LIMIT, RecordClient};
use crate::core::error::Error;
use crate::core::record::{Record, RecordFields};

/// The record operations the UI needs from the backend.
pub trait RecordApi {
    fn list(&self) -> Result<Vec<Record>, Error>;
    fn get(&self, id: i64) -> Result<Record, Error>;
    fn create(&self, fields: &RecordFields) -> Result<Record, Error>;
    fn update(&self, id: i64, fields: &RecordFields) -> Result<Record, Error>;
    fn delete(&self, id: i64) -> Result<(), Error>;
}

impl RecordApi for RecordClient {
    fn list(&self) -> Result<Vec<Record>, Error> {
        RecordClient::list(self, 0, DEFAULT_LIST_LIMIT)
    }

    fn get(&self, id: i64) -> Result<Record, Error> {
        RecordClient::get(self, id)
    }

    fn create(&self, fields: &RecordFields) -> Result<Record, Error> {
        RecordClient::create(self, fields)
    }

    fn update(&self, id: i64, fields: &RecordFields) -> Result<Record, Error> {
        RecordClient::update(self, id, fields)
    }

    fn delete(&self, id: i64) -> Result<(), Error> {
        RecordClient::delete(self, id).map(|_| ())
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SubmitOutcome {
    Invalid,
    Created(Record),
    Updated(Record),
    Failed,
}

/// Fetch every record and narrow it by the session filter.
pub fn load_records(session: &mut Session, api: &dyn RecordApi) -> Vec<Record> {
    match api.list() {
        Ok(records) => session.filter().apply(records),
        Err(err) => {
            warn!(error = %err, "failed to load users");
            session.push_notice(Notice::error(format!("Error loading users: {err}")));
            Vec::new()
        }
    }
}

pub fn set_filter(session: &mut Session, filter: ListFilter) {
    session.set_filter(filter);
}

pub fn submit(session: &mut Session, api: &dyn RecordApi, form: FormData) -> SubmitOutcome {
    let errors = form.validate();
    if !errors.is_empty() {
        for error in errors {
            session.push_notice(Notice::error(error));
        }
        session.set_draft(form);
        return SubmitOutcome::Invalid;
    }

    let fields = form.to_fields();
    let outcome = match session.editing_id() {
        Some(id) => match api.update(id, &fields) {
            Ok(record) => {
                session.push_notice(Notice::success("User updated successfully!"));
                SubmitOutcome::Updated(record)
            }
            Err(err) => {
                warn!(id, error = %err, "failed to update user");
                session.push_notice(Notice::error(format!("Error updating user: {err}")));
                SubmitOutcome::Failed
            }
        },
        None => match api.create(&fields) {
            Ok(record) => {
                session.push_notice(Notice::success("User created successfully!"));
                SubmitOutcome::Created(record)
            }
            Err(err) => {
                warn!(error = %err, "failed to create user");
                session.push_notice(Notice::error(format!("Error creating user: {err}")));
                SubmitOutcome::Failed
            }
        },
    };

    match outcome {
        SubmitOutcome::Created(_) | SubmitOutcome::Updated(_) => session.reset_form(),
        SubmitOutcome::Failed | SubmitOutcome::Invalid => session.set_draft(form),
    }
    outcome
}

pub fn begin_edit(session: &mut Session, api: &dyn RecordApi, id: i64) -> bool {
    match api.get(id) {
        Ok(record) => {
            session.begin_edit(record);
            true
        }
        Err(err) => {
            warn!(id, error = %err, "failed to load user for editing");
            session.push_notice(Notice::error(format!("Error loading user: {err}")));
            false
        }
    }
}

pub fn cancel_edit(session: &mut Session) {
    session.reset_form();
}

pub fn request_delete(session: &mut Session, id: i64) {
    session.set_delete_state(id, DeleteState::Pending);
}

pub fn cancel_delete(session: &mut Session, id: i64) {
    session.set_delete_state(id, DeleteState::None);
}

/// Run a confirmed delete. Only ids already pending are deleted.
pub fn confirm_delete(session: &mut Session, api: &dyn RecordApi, id: i64) -> bool {
    if session.delete_state(id) != DeleteState::Pending {
        return false;
    }
    session.set_delete_state(id, DeleteState::Confirmed);
    match api.delete(id) {
        Ok(()) => {
            session.set_delete_state(id, DeleteState::None);
            session.push_notice(Notice::success("User deleted successfully!"));
            true
        }
        Err(err) => {
            warn!(id, error = %err, "failed to delete user");
            session.set_delete_state(id, DeleteState::Pending);
            session.push_notice(Notice::error(format!("Error deleting user: {err}")));
            false
        }
    }
}
