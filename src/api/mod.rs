//! Purpose: Define the public Rust API boundary for userdesk.
//! Exports: Record model, store, HTTP client, and error types.
//! Role: Single import path for the binary, the UI, and integration tests.
//! Invariants: Storage internals stay behind `RecordStore`.

mod client;

pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind, FieldIssue};
pub use crate::core::record::{Record, RecordFields};
pub use crate::core::store::{DEFAULT_LIST_LIMIT, RecordStore};
pub use client::{DeleteAck, RecordClient};
