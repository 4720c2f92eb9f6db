//! Purpose: Render the single-page form/list view as HTML.
//! Exports: `Renderer`, `PageView`, `page_view`.
//! Role: Pure function of session state plus fetched records.
//! Invariants: All user data is HTML-escaped (templates end in `.html`).
//! Invariants: Rendering never mutates the session; callers drain notices.
use minijinja::Environment;
use serde::Serialize;

use super::form::{AGE_INPUT_MAX, GENDER_CHOICES};
use super::session::{DeleteState, Notice, Session};
use crate::core::error::{Error, ErrorKind};
use crate::core::record::Record;

const PAGE_TEMPLATE: &str = include_str!("templates/page.html");
const FILTER_CHOICES: [&str; 4] = ["All", "Male", "Female", "Other"];

#[derive(Debug, Serialize)]
pub struct PageView {
    pub heading: &'static str,
    pub editing: bool,
    pub form: FormView,
    pub age_max: i64,
    pub gender_options: Vec<ChoiceView>,
    pub search: String,
    pub filter_options: Vec<ChoiceView>,
    pub notices: Vec<NoticeView>,
    pub users: Vec<RowView>,
}

#[derive(Debug, Serialize)]
pub struct FormView {
    pub name: String,
    pub age: i64,
    pub pincode: String,
    pub address: String,
}

#[derive(Debug, Serialize)]
pub struct ChoiceView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Serialize)]
pub struct NoticeView {
    pub level: &'static str,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct RowView {
    pub id: i64,
    pub title: String,
    pub pincode: String,
    pub address: String,
    pub delete_pending: bool,
}

pub struct Renderer {
    env: Environment<'static>,
}

impl Renderer {
    pub fn new() -> Result<Self, Error> {
        let mut env = Environment::new();
        env.add_template("page.html", PAGE_TEMPLATE)
            .map_err(template_error)?;
        Ok(Self { env })
    }

    pub fn render(&self, view: &PageView) -> Result<String, Error> {
        self.env
            .get_template("page.html")
            .and_then(|template| template.render(view))
            .map_err(template_error)
    }
}

fn template_error(err: minijinja::Error) -> Error {
    Error::new(ErrorKind::Internal)
        .with_message("failed to render page")
        .with_source(err)
}

/// Build the view for one render from explicit session state.
pub fn page_view(session: &Session, records: &[Record], notices: Vec<Notice>) -> PageView {
    let form = session.form();
    let heading = if session.is_editing() {
        "✏️ Edit User"
    } else {
        "➕ Add New User"
    };

    let mut gender_options: Vec<ChoiceView> = GENDER_CHOICES
        .iter()
        .map(|choice| ChoiceView {
            value: (*choice).to_string(),
            label: (*choice).to_string(),
            selected: *choice == form.gender,
        })
        .collect();
    if !GENDER_CHOICES.contains(&form.gender.as_str()) {
        gender_options.push(ChoiceView {
            value: form.gender.clone(),
            label: form.gender.clone(),
            selected: true,
        });
    }

    let selected_filter = session.filter().gender.as_deref().unwrap_or("All");
    let filter_options = FILTER_CHOICES
        .iter()
        .map(|choice| ChoiceView {
            value: (*choice).to_string(),
            label: (*choice).to_string(),
            selected: *choice == selected_filter,
        })
        .collect();

    let users = records
        .iter()
        .map(|record| RowView {
            id: record.id,
            title: format!("{} - {} ({})", record.name, record.age, record.gender),
            pincode: record.pincode.clone(),
            address: record.address.clone(),
            delete_pending: session.delete_state(record.id) != DeleteState::None,
        })
        .collect();

    PageView {
        heading,
        editing: session.is_editing(),
        form: FormView {
            name: form.name.clone(),
            age: form.age,
            pincode: form.pincode.clone(),
            address: form.address.clone(),
        },
        age_max: AGE_INPUT_MAX.max(form.age),
        gender_options,
        search: session.filter().search.clone(),
        filter_options,
        notices: notices
            .into_iter()
            .map(|notice| NoticeView {
                level: notice.level.as_str(),
                text: notice.text,
            })
            .collect(),
        users,
    }
}
