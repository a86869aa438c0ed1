//! Field-level validation messages returned with an `Invalid` outcome.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::{ValidationError, ValidationErrors};

/// Validation messages keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the messages of a `validate()` call.
    pub fn from_result(result: Result<(), ValidationErrors>) -> Self {
        match result {
            Ok(()) => Self::new(),
            Err(errors) => Self::from(errors),
        }
    }

    /// Add a message for `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Whether `field` already has a message.
    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Messages for `field`.
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    /// Whether there are no messages.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate fields and their messages in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = Self::new();
        for (field, list) in errors.field_errors() {
            let field = field.to_string();
            for error in list.iter() {
                out.add(&field, message_for(&field, error));
            }
        }
        out
    }
}

fn message_for(field: &str, error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }
    let label = field.replace('_', " ");
    match error.code.as_ref() {
        "length" => match error.params.get("max") {
            Some(max) => format!("The {label} may not be greater than {max} characters."),
            None => format!("The {label} has an invalid length."),
        },
        "email" => format!("The {label} must be a valid email address."),
        "required" => "This field is required.".to_string(),
        _ => format!("The {label} field is invalid."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backoffice_entity::meta_tag::MetaTagInput;
    use backoffice_entity::role::RoleInput;
    use validator::Validate;

    #[test]
    fn test_messages_from_validator() {
        let input = RoleInput {
            name: "  ".into(),
            permission_ids: Vec::new(),
        };
        let errors = FieldErrors::from_result(input.validate());
        assert_eq!(errors.get("name"), ["This field is required."]);
    }

    #[test]
    fn test_length_message_uses_field_label() {
        let mut input = MetaTagInput::for_page("about");
        input.og_title = Some("x".repeat(256));
        let errors = FieldErrors::from_result(input.validate());
        assert_eq!(
            errors.get("og_title"),
            ["The og title may not be greater than 255 characters."]
        );
    }

    #[test]
    fn test_add_and_query() {
        let mut errors = FieldErrors::new();
        assert!(errors.is_empty());
        errors.add("email", "The email has already been taken.");
        assert!(errors.has("email"));
        assert!(!errors.has("name"));
        assert!(errors.get("name").is_empty());
    }
}
