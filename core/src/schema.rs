//! Field constraints for todo payloads.
//!
//! Raw payloads arrive as JSON. Checking happens in two passes that both
//! feed one `ValidationFailure`: a shape pass (is each known field the right
//! JSON type) and the `validator` rules declared on `Fields`. Nothing stops at
//! the first problem. Unknown keys are ignored and `null` counts as absent.

use serde_json::{Map, Value};
use validator::{Validate, ValidationError};

use crate::error::ValidationFailure;
use crate::types::{NewTodo, TodoPatch, TodoType};

/// Key used when the payload itself is not a JSON object.
pub const PAYLOAD_FIELD: &str = "_payload";

#[derive(Debug, Default, Validate)]
struct Fields {
    #[validate(length(min = 5, max = 32))]
    title: Option<String>,
    #[validate(length(min = 5, max = 250))]
    summary: Option<String>,
    #[validate(length(min = 5, max = 250))]
    description: Option<String>,
    #[validate(custom = "known_todo_type")]
    todo_type: Option<String>,
    completed: Option<bool>,
}

impl Fields {
    fn text(&self, name: &str) -> Option<&str> {
        match name {
            "title" => self.title.as_deref(),
            "summary" => self.summary.as_deref(),
            "description" => self.description.as_deref(),
            "todo_type" => self.todo_type.as_deref(),
            _ => None,
        }
    }
}

fn known_todo_type(value: &str) -> Result<(), ValidationError> {
    if value.parse::<TodoType>().is_ok() {
        return Ok(());
    }
    let mut error = ValidationError::new("todo_type");
    error.message = Some("Todo type must be one of ACTIVE, CULTURAL, RESTORATIVE, PLANNING.".into());
    Err(error)
}

/// Validate a full create payload. `title` is required.
pub fn validate_new(candidate: &Value) -> Result<NewTodo, ValidationFailure> {
    let (fields, mut failure) = check(candidate);
    match fields.title {
        Some(title) if failure.is_empty() => Ok(NewTodo {
            title,
            summary: fields.summary,
            description: fields.description,
        }),
        None if failure.messages("title").is_empty() => {
            failure.add("title", "Title is required.");
            Err(failure)
        }
        _ => Err(failure),
    }
}

/// Validate a partial update payload. Only present fields are checked.
pub fn validate_patch(candidate: &Value) -> Result<TodoPatch, ValidationFailure> {
    let (fields, failure) = check(candidate);
    if !failure.is_empty() {
        return Err(failure);
    }
    Ok(TodoPatch {
        title: fields.title,
        summary: fields.summary,
        description: fields.description,
        todo_type: fields.todo_type.and_then(|t| t.parse().ok()),
        completed: fields.completed,
    })
}

fn check(candidate: &Value) -> (Fields, ValidationFailure) {
    let mut failure = ValidationFailure::new();
    let Some(object) = candidate.as_object() else {
        failure.add(PAYLOAD_FIELD, "Payload must be an object.");
        return (Fields::default(), failure);
    };

    let fields = Fields {
        title: string_field(object, "title", &mut failure),
        summary: string_field(object, "summary", &mut failure),
        description: string_field(object, "description", &mut failure),
        todo_type: string_field(object, "todoType", &mut failure),
        completed: match object.get("completed") {
            None | Some(Value::Null) => None,
            Some(Value::Bool(completed)) => Some(*completed),
            Some(_) => {
                failure.add("completed", "Completed must be a boolean.");
                None
            }
        },
    };

    if let Err(errors) = fields.validate() {
        for (name, errors) in errors.field_errors() {
            for error in errors {
                failure.add(wire_name(name), rule_message(name, error, fields.text(name)));
            }
        }
    }
    (fields, failure)
}

fn string_field(object: &Map<String, Value>, key: &str, failure: &mut ValidationFailure) -> Option<String> {
    match object.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(value)) => Some(value.clone()),
        Some(_) => {
            failure.add(key, format!("{} must be a string.", label(key)));
            None
        }
    }
}

fn rule_message(name: &str, error: &ValidationError, value: Option<&str>) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }
    if error.code == "length" {
        let bound = |key: &str| error.params.get(key).and_then(Value::as_u64);
        let len = value.map(|v| v.chars().count() as u64);
        match (bound("min"), bound("max"), len) {
            (Some(min), _, Some(len)) if len < min => {
                return format!("{} must be at least {min} characters.", label(name));
            }
            (_, Some(max), _) => {
                return format!("{} must be at most {max} characters.", label(name));
            }
            _ => {}
        }
    }
    format!("{} is invalid.", label(name))
}

fn wire_name(name: &str) -> &str {
    match name {
        "todo_type" => "todoType",
        other => other,
    }
}

fn label(name: &str) -> &'static str {
    match name {
        "title" => "Title",
        "summary" => "Summary",
        "description" => "Description",
        "todo_type" | "todoType" => "Todo type",
        "completed" => "Completed",
        _ => "Field",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn minimal_create_payload_is_accepted() {
        let todo = validate_new(&json!({"title": "Buy groceries"})).unwrap();
        assert_eq!(todo, NewTodo::new("Buy groceries"));
    }

    #[test]
    fn create_keeps_summary_and_description() {
        let todo = validate_new(&json!({
            "title": "Plan the trip",
            "summary": "Book hotel",
            "description": "Somewhere near the sea",
            "unknown": 42,
        }))
        .unwrap();
        assert_eq!(todo.summary.as_deref(), Some("Book hotel"));
        assert_eq!(todo.description.as_deref(), Some("Somewhere near the sea"));
    }

    #[test]
    fn short_title_reports_minimum() {
        let failure = validate_new(&json!({"title": "ab"})).unwrap_err();
        assert_eq!(failure.messages("title"), ["Title must be at least 5 characters."]);
    }

    #[test]
    fn long_title_reports_maximum() {
        let failure = validate_new(&json!({"title": "x".repeat(33)})).unwrap_err();
        assert_eq!(failure.messages("title"), ["Title must be at most 32 characters."]);
    }

    #[test]
    fn title_bounds_are_inclusive_and_count_characters() {
        assert!(validate_new(&json!({"title": "abcde"})).is_ok());
        assert!(validate_new(&json!({"title": "x".repeat(32)})).is_ok());
        // 5 characters, 10 bytes.
        assert!(validate_new(&json!({"title": "ééééé"})).is_ok());
    }

    #[test]
    fn missing_title_is_required_on_create_only() {
        let failure = validate_new(&json!({})).unwrap_err();
        assert_eq!(failure.messages("title"), ["Title is required."]);

        let patch = validate_patch(&json!({})).unwrap();
        assert_eq!(patch, TodoPatch::default());
    }

    #[test]
    fn null_fields_count_as_absent() {
        let todo = validate_new(&json!({"title": "Buy groceries", "summary": null})).unwrap();
        assert!(todo.summary.is_none());
    }

    #[test]
    fn every_violation_is_reported() {
        let failure = validate_new(&json!({
            "title": "ab",
            "summary": "abc",
            "description": "x".repeat(251),
            "todoType": "URGENT",
            "completed": "yes",
        }))
        .unwrap_err();

        assert_eq!(
            failure.fields().collect::<Vec<_>>(),
            ["completed", "description", "summary", "title", "todoType"]
        );
        assert_eq!(failure.messages("summary"), ["Summary must be at least 5 characters."]);
        assert_eq!(
            failure.messages("description"),
            ["Description must be at most 250 characters."]
        );
        assert_eq!(
            failure.messages("todoType"),
            ["Todo type must be one of ACTIVE, CULTURAL, RESTORATIVE, PLANNING."]
        );
        assert_eq!(failure.messages("completed"), ["Completed must be a boolean."]);
    }

    #[test]
    fn wrong_type_title_is_not_also_reported_missing() {
        let failure = validate_new(&json!({"title": 12345})).unwrap_err();
        assert_eq!(failure.messages("title"), ["Title must be a string."]);
    }

    #[test]
    fn patch_carries_only_present_fields() {
        let patch = validate_patch(&json!({"completed": true, "todoType": "CULTURAL"})).unwrap();
        assert_eq!(patch.completed, Some(true));
        assert_eq!(patch.todo_type, Some(TodoType::Cultural));
        assert!(patch.title.is_none());
        assert!(patch.summary.is_none());
    }

    #[test]
    fn patch_still_checks_present_fields() {
        let failure = validate_patch(&json!({"title": "abc"})).unwrap_err();
        assert_eq!(failure.messages("title"), ["Title must be at least 5 characters."]);
    }

    #[test]
    fn non_object_payload_is_rejected() {
        let failure = validate_patch(&json!(["title"])).unwrap_err();
        assert_eq!(failure.messages(PAYLOAD_FIELD), ["Payload must be an object."]);
    }
}
