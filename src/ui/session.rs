//! Purpose: Model one UI session: form mode, delete confirmations, filter, notices.
//! Exports: `Session`, `Mode`, `DeleteState`, `ListFilter`, `Notice`, `NoticeLevel`.
//! Role: Explicit state passed into the controller and renderer.
//! Invariants: At most one record is being edited at a time.
//! Invariants: Delete confirmation is tracked per id and independent of `Mode`.
//! Invariants: Filtering never changes what is stored or fetched.
use std::collections::BTreeMap;

use super::form::FormData;
use crate::core::record::Record;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum Mode {
    #[default]
    Creating,
    Editing(Record),
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum DeleteState {
    #[default]
    None,
    Pending,
    Confirmed,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NoticeLevel {
    Success,
    Error,
}

impl NoticeLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            NoticeLevel::Success => "success",
            NoticeLevel::Error => "error",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

/// Display-only narrowing of the fetched records.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ListFilter {
    pub search: String,
    /// `None` shows every gender.
    pub gender: Option<String>,
}

impl ListFilter {
    pub fn new(search: impl Into<String>, gender: Option<String>) -> Self {
        let gender = gender.filter(|value| !value.is_empty() && value != "All");
        Self {
            search: search.into(),
            gender,
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        if !self.search.is_empty()
            && !record
                .name
                .to_lowercase()
                .contains(&self.search.to_lowercase())
        {
            return false;
        }
        match &self.gender {
            Some(gender) => record.gender == *gender,
            None => true,
        }
    }

    pub fn apply(&self, records: Vec<Record>) -> Vec<Record> {
        records
            .into_iter()
            .filter(|record| self.matches(record))
            .collect()
    }
}

#[derive(Clone, Debug, Default)]
pub struct Session {
    mode: Mode,
    form: FormData,
    deletes: BTreeMap<i64, DeleteState>,
    filter: ListFilter,
    notices: Vec<Notice>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, Mode::Editing(_))
    }

    pub fn editing_id(&self) -> Option<i64> {
        match &self.mode {
            Mode::Editing(record) => Some(record.id),
            Mode::Creating => None,
        }
    }

    pub fn form(&self) -> &FormData {
        &self.form
    }

    /// Keep what the user typed without changing the mode.
    pub fn set_draft(&mut self, form: FormData) {
        self.form = form;
    }

    pub fn begin_edit(&mut self, record: Record) {
        self.form = FormData::from_record(&record);
        self.mode = Mode::Editing(record);
    }

    /// Back to `Creating` with empty form values.
    pub fn reset_form(&mut self) {
        self.form = FormData::default();
        self.mode = Mode::Creating;
    }

    pub fn delete_state(&self, id: i64) -> DeleteState {
        self.deletes.get(&id).copied().unwrap_or_default()
    }

    pub fn set_delete_state(&mut self, id: i64, state: DeleteState) {
        if state == DeleteState::None {
            self.deletes.remove(&id);
        } else {
            self.deletes.insert(id, state);
        }
    }

    pub fn filter(&self) -> &ListFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: ListFilter) {
        self.filter = filter;
    }

    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    /// Drain queued notices; each is shown by exactly one render.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}
