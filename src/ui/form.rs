//! Purpose: Hold the UI form values and their pre-submission validation.
//! Exports: `FormData`, `GENDER_CHOICES`, `PINCODE_DIGITS`.
//! Role: Advisory checks that run before any request leaves the UI.
//! Invariants: One message per violated rule, in field order.
//! Invariants: Server-side validation stays authoritative.
use crate::core::record::{Record, RecordFields};

/// Selectable genders; the empty choice means "not chosen yet".
pub const GENDER_CHOICES: [&str; 4] = ["", "Male", "Female", "Other"];
pub const PINCODE_DIGITS: usize = 6;
/// Upper bound of the age widget; raised to a loaded record's age when larger.
pub const AGE_INPUT_MAX: i64 = 120;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FormData {
    pub name: String,
    pub age: i64,
    pub gender: String,
    pub pincode: String,
    pub address: String,
}

impl FormData {
    /// Build form values from raw text inputs. An age that does not parse
    /// as an integer is treated as 0 so validation reports it.
    pub fn from_inputs(
        name: impl Into<String>,
        age: &str,
        gender: impl Into<String>,
        pincode: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            age: age.trim().parse().unwrap_or(0),
            gender: gender.into(),
            pincode: pincode.into(),
            address: address.into(),
        }
    }

    pub fn from_record(record: &Record) -> Self {
        Self {
            name: record.name.clone(),
            age: record.age,
            gender: record.gender.clone(),
            pincode: record.pincode.clone(),
            address: record.address.clone(),
        }
    }

    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push("Name is required".to_string());
        }
        if self.age <= 0 {
            errors.push("Age must be greater than 0".to_string());
        }
        if self.gender.trim().is_empty() {
            errors.push("Gender is required".to_string());
        }
        if self.pincode.is_empty() {
            errors.push("Pincode is required".to_string());
        } else if !is_pincode(&self.pincode) {
            errors.push(format!("Pincode must be {PINCODE_DIGITS} digits"));
        }
        if self.address.trim().is_empty() {
            errors.push("Address is required".to_string());
        }
        errors
    }

    pub fn to_fields(&self) -> RecordFields {
        RecordFields {
            name: self.name.clone(),
            age: self.age,
            gender: self.gender.clone(),
            pincode: self.pincode.clone(),
            address: self.address.clone(),
        }
    }
}

fn is_pincode(value: &str) -> bool {
    value.len() == PINCODE_DIGITS && value.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::FormData;

    fn filled() -> FormData {
        FormData::from_inputs("Alice", "30", "Female", "560001", "1 Main St")
    }

    #[test]
    fn complete_form_has_no_errors() {
        assert!(filled().validate().is_empty());
    }

    #[test]
    fn five_digit_pincode_is_rejected() {
        let mut form = filled();
        form.pincode = "12345".to_string();
        assert_eq!(form.validate(), ["Pincode must be 6 digits"]);
        form.pincode = "1234".to_string();
        assert_eq!(form.validate(), ["Pincode must be 6 digits"]);
    }

    #[test]
    fn pincode_must_be_ascii_digits() {
        let mut form = filled();
        form.pincode = "56OO01".to_string();
        assert_eq!(form.validate(), ["Pincode must be 6 digits"]);
        form.pincode = "5600011".to_string();
        assert_eq!(form.validate(), ["Pincode must be 6 digits"]);
    }

    #[test]
    fn empty_form_reports_every_rule() {
        let form = FormData::default();
        assert_eq!(
            form.validate(),
            [
                "Name is required",
                "Age must be greater than 0",
                "Gender is required",
                "Pincode is required",
                "Address is required",
            ]
        );
    }

    #[test]
    fn unparsable_age_becomes_zero() {
        let form = FormData::from_inputs("Alice", "thirty", "Female", "560001", "x");
        assert_eq!(form.age, 0);
        assert_eq!(form.validate(), ["Age must be greater than 0"]);
        let form = FormData::from_inputs("Alice", " 42 ", "Female", "560001", "x");
        assert_eq!(form.age, 42);
    }

    #[test]
    fn fields_carry_form_values() {
        let fields = filled().to_fields();
        assert_eq!(fields.name, "Alice");
        assert_eq!(fields.age, 30);
        assert_eq!(fields.pincode, "560001");
    }
}
