//! Purpose: Shared library crate used by the `userdesk` binary and tests.
//! Exports: `api` (records, store, client, errors) and `ui` (session, validation, rendering).
//! Role: Internal library backing the API server and the form UI.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
//! Invariants: UI session state is passed explicitly; there are no globals.
pub mod api;
pub mod core;
pub mod ui;
