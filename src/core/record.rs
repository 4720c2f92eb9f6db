//! Purpose: Define the user record and its persistence-boundary validation.
//! Exports: `Record`, `RecordFields`, name and pincode length limits.
//! Role: Shared data model for the store, the HTTP API, and the client.
//! Invariants: `id` is assigned by the store and never supplied by callers.
//! Invariants: Validation reports every violated field, not just the first.
use serde::{Deserialize, Serialize};

use super::error::{Error, ErrorKind, FieldIssue};

pub const NAME_MAX_CHARS: usize = 100;
pub const PINCODE_MAX_CHARS: usize = 10;

/// Every field of a user except its id; the body of create and update.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RecordFields {
    pub name: String,
    pub age: i64,
    pub gender: String,
    pub pincode: String,
    pub address: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    pub name: String,
    pub age: i64,
    pub gender: String,
    pub pincode: String,
    pub address: String,
}

impl Record {
    pub fn from_fields(id: i64, fields: RecordFields) -> Self {
        Self {
            id,
            name: fields.name,
            age: fields.age,
            gender: fields.gender,
            pincode: fields.pincode,
            address: fields.address,
        }
    }

    pub fn fields(&self) -> RecordFields {
        RecordFields {
            name: self.name.clone(),
            age: self.age,
            gender: self.gender.clone(),
            pincode: self.pincode.clone(),
            address: self.address.clone(),
        }
    }
}

impl RecordFields {
    pub fn validate(&self) -> Result<(), Error> {
        let mut issues = Vec::new();
        check_text(&mut issues, "name", &self.name, Some(NAME_MAX_CHARS));
        if self.age <= 0 {
            issues.push(FieldIssue::new("age", "must be greater than 0"));
        }
        check_text(&mut issues, "gender", &self.gender, None);
        check_text(
            &mut issues,
            "pincode",
            &self.pincode,
            Some(PINCODE_MAX_CHARS),
        );
        check_text(&mut issues, "address", &self.address, None);

        if issues.is_empty() {
            Ok(())
        } else {
            Err(Error::new(ErrorKind::Validation)
                .with_message("invalid user fields")
                .with_issues(issues))
        }
    }
}

fn check_text(issues: &mut Vec<FieldIssue>, field: &str, value: &str, max_chars: Option<usize>) {
    if value.trim().is_empty() {
        issues.push(FieldIssue::new(field, "must not be empty"));
        return;
    }
    if let Some(max) = max_chars {
        if value.chars().count() > max {
            issues.push(FieldIssue::new(
                field,
                format!("must be at most {max} characters"),
            ));
        }
    }
}
