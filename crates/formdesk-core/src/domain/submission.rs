//! Submissions and answer validation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use uuid::Uuid;

use super::form::{FieldType, FormField};
use crate::error::{FormdeskError, Result};

/// One respondent's answers, keyed by field label
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: Uuid,
    pub form_id: Uuid,
    #[schema(value_type = Object)]
    pub data: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl Submission {
    /// Stamp a new submission
    pub fn new(form_id: Uuid, data: Map<String, Value>) -> Self {
        Self {
            id: Uuid::new_v4(),
            form_id,
            data,
            created_at: Utc::now(),
        }
    }

    /// Answer for a field label, ignoring explicit nulls
    pub fn answer(&self, label: &str) -> Option<&Value> {
        self.data.get(label).filter(|v| !v.is_null())
    }
}

/// Public submission payload
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewSubmission {
    pub form_id: Uuid,
    #[schema(value_type = Object)]
    pub data: Map<String, Value>,
}

/// Whether a value counts as an answer
pub fn is_answered(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Bool(b) => *b,
        Value::Number(_) | Value::Object(_) => true,
    }
}

/// Check a payload against the form's fields.
///
/// Every problem is collected so the respondent sees all of them at once.
pub fn validate_answers(fields: &[FormField], data: &Map<String, Value>) -> Result<()> {
    let mut problems = Vec::new();

    for key in data.keys() {
        if !fields.iter().any(|f| &f.label == key) {
            problems.push(format!("unknown field '{}'", key));
        }
    }

    for field in fields {
        let value = data.get(&field.label).filter(|v| !v.is_null());
        match value {
            None => {
                if field.required {
                    problems.push(format!("'{}' is required", field.label));
                }
            }
            Some(value) => {
                if field.required && !is_answered(value) {
                    problems.push(format!("'{}' is required", field.label));
                    continue;
                }
                if let Err(problem) = check_answer(field, value) {
                    problems.push(problem);
                }
            }
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(FormdeskError::Validation(problems.join("; ")))
    }
}

fn check_answer(field: &FormField, value: &Value) -> std::result::Result<(), String> {
    let label = &field.label;
    match field.field_type {
        FieldType::Text => match value {
            Value::String(_) | Value::Number(_) => Ok(()),
            _ => Err(format!("'{}' expects text", label)),
        },
        FieldType::File => match value {
            Value::String(_) => Ok(()),
            _ => Err(format!("'{}' expects a file reference", label)),
        },
        FieldType::Dropdown | FieldType::Radio => match value {
            Value::String(s) if s.is_empty() || field.options.contains(s) => Ok(()),
            Value::String(s) => Err(format!("'{}' is not an option of '{}'", s, label)),
            _ => Err(format!("'{}' expects one option", label)),
        },
        FieldType::Checkbox if field.options.is_empty() => match value {
            Value::Bool(_) => Ok(()),
            _ => Err(format!("'{}' expects true or false", label)),
        },
        FieldType::Checkbox => match value {
            Value::Array(items) => {
                for item in items {
                    match item.as_str() {
                        Some(s) if field.options.iter().any(|o| o == s) => {}
                        Some(s) => return Err(format!("'{}' is not an option of '{}'", s, label)),
                        None => return Err(format!("'{}' expects a list of options", label)),
                    }
                }
                Ok(())
            }
            _ => Err(format!("'{}' expects a list of options", label)),
        },
    }
}

/// Flatten an answer to a single line of text.
///
/// Arrays are joined with `"; "`, booleans become `yes`/`no`.
pub fn answer_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(true) => "yes".into(),
        Value::Bool(false) => "no".into(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(answer_to_text)
            .collect::<Vec<_>>()
            .join("; "),
        Value::Object(_) => value.to_string(),
    }
}
