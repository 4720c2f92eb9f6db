//! Purpose: Form-driven UI over the record API.
//! Exports: session model, form validation, controller actions, HTML rendering.
//! Role: Library half of `userdesk ui`; the HTTP surface lives in the binary.
//! Invariants: State flows through an explicit `Session`, never globals.

pub mod controller;
pub mod form;
pub mod render;
pub mod session;

pub use controller::{RecordApi, SubmitOutcome};
pub use form::FormData;
pub use render::{Renderer, page_view};
pub use session::{DeleteState, ListFilter, Mode, Notice, NoticeLevel, Session};
