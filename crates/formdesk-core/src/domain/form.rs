//! Forms and their fields

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{FormdeskError, Result};

/// Longest accepted form title
pub const MAX_TITLE_LEN: usize = 200;
/// Longest accepted slug
pub const MAX_SLUG_LEN: usize = 100;
/// Longest accepted field label
pub const MAX_LABEL_LEN: usize = 200;
/// Highest accepted field position
pub const MAX_FIELD_ORDER: i32 = 10_000;

// =============================================================================
// Core Types
// =============================================================================

/// A questionnaire owned by one client
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Form {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// Owning client
    pub client_id: Uuid,
    /// URL slug, unique per client
    pub slug: String,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Form {
    /// Create a draft form
    pub fn new(client_id: Uuid, title: String, description: Option<String>, slug: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            client_id,
            slug,
            published: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Input type of a field
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    Text,
    Dropdown,
    Checkbox,
    Radio,
    File,
}

impl FieldType {
    /// Wire/storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "TEXT",
            FieldType::Dropdown => "DROPDOWN",
            FieldType::Checkbox => "CHECKBOX",
            FieldType::Radio => "RADIO",
            FieldType::File => "FILE",
        }
    }

    /// Answers are picked from the option list
    pub fn is_choice(&self) -> bool {
        matches!(self, FieldType::Dropdown | FieldType::Checkbox | FieldType::Radio)
    }

    /// A single-answer choice is meaningless without options.
    /// A checkbox without options is a lone yes/no box.
    pub fn requires_options(&self) -> bool {
        matches!(self, FieldType::Dropdown | FieldType::Radio)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = FormdeskError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "TEXT" => Ok(FieldType::Text),
            "DROPDOWN" => Ok(FieldType::Dropdown),
            "CHECKBOX" => Ok(FieldType::Checkbox),
            "RADIO" => Ok(FieldType::Radio),
            "FILE" => Ok(FieldType::File),
            other => Err(FormdeskError::Validation(format!("unknown field type: {}", other))),
        }
    }
}

/// One typed input of a form
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub id: Uuid,
    pub form_id: Uuid,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub placeholder: Option<String>,
    pub required: bool,
    /// Display position within the form, ascending
    pub order: i32,
    pub options: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Form together with its fields in display order
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormDetail {
    #[serde(flatten)]
    pub form: Form,
    pub fields: Vec<FormField>,
}

// =============================================================================
// Inputs
// =============================================================================

/// Field definition supplied by the caller
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewField {
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: Option<FieldType>,
    pub placeholder: Option<String>,
    #[serde(default)]
    pub required: bool,
    /// Appended after the last field when omitted
    pub order: Option<i32>,
    #[serde(default)]
    pub options: Vec<String>,
}

impl NewField {
    /// Validate and materialize under `form_id` at position `order`
    pub fn into_field(self, form_id: Uuid, order: i32) -> Result<FormField> {
        let field_type = self.field_type.unwrap_or(FieldType::Text);
        let label = validate_label(&self.label)?;
        let options = validate_options(field_type, self.options)?;
        let order = validate_order(self.order.unwrap_or(order))?;

        Ok(FormField {
            id: Uuid::new_v4(),
            form_id,
            label,
            field_type,
            placeholder: clean(self.placeholder),
            required: self.required,
            order,
            options,
            created_at: Utc::now(),
        })
    }
}

/// Partial field update
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldPatch {
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub field_type: Option<FieldType>,
    pub placeholder: Option<String>,
    pub required: Option<bool>,
    pub order: Option<i32>,
    pub options: Option<Vec<String>>,
}

impl FieldPatch {
    /// Apply onto `field`, re-validating the combined result
    pub fn apply(self, field: &mut FormField) -> Result<()> {
        if let Some(label) = self.label {
            field.label = validate_label(&label)?;
        }
        if let Some(field_type) = self.field_type {
            field.field_type = field_type;
        }
        if let Some(placeholder) = self.placeholder {
            field.placeholder = clean(Some(placeholder));
        }
        if let Some(required) = self.required {
            field.required = required;
        }
        if let Some(order) = self.order {
            field.order = validate_order(order)?;
        }
        let options = self.options.unwrap_or_else(|| std::mem::take(&mut field.options));
        field.options = validate_options(field.field_type, options)?;
        Ok(())
    }
}

/// Form creation input
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewForm {
    pub title: String,
    pub description: Option<String>,
    /// Derived from the title when omitted
    pub slug: Option<String>,
    /// Only honoured for super-admins creating on behalf of a client
    pub client_id: Option<Uuid>,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub fields: Vec<NewField>,
}

/// Partial form update
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub slug: Option<String>,
    pub published: Option<bool>,
}

// =============================================================================
// Validation helpers
// =============================================================================

/// Trim and bound a form title
pub fn validate_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(FormdeskError::Validation("title is required".into()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(FormdeskError::Validation(format!(
            "title must be at most {} characters",
            MAX_TITLE_LEN
        )));
    }
    Ok(title.to_string())
}

fn validate_label(label: &str) -> Result<String> {
    let label = label.trim();
    if label.is_empty() {
        return Err(FormdeskError::Validation("field label is required".into()));
    }
    if label.chars().count() > MAX_LABEL_LEN {
        return Err(FormdeskError::Validation(format!(
            "field label must be at most {} characters",
            MAX_LABEL_LEN
        )));
    }
    Ok(label.to_string())
}

fn validate_options(field_type: FieldType, options: Vec<String>) -> Result<Vec<String>> {
    let options: Vec<String> = options.into_iter().map(|o| o.trim().to_string()).collect();

    if !field_type.is_choice() {
        if !options.is_empty() {
            return Err(FormdeskError::Validation(format!(
                "{} fields do not take options",
                field_type
            )));
        }
        return Ok(options);
    }

    if field_type.requires_options() && options.is_empty() {
        return Err(FormdeskError::Validation(format!(
            "{} fields need at least one option",
            field_type
        )));
    }

    let mut seen = HashSet::new();
    for option in &options {
        if option.is_empty() {
            return Err(FormdeskError::Validation("options must not be blank".into()));
        }
        if !seen.insert(option.as_str()) {
            return Err(FormdeskError::Validation(format!("duplicate option: {}", option)));
        }
    }
    Ok(options)
}

fn validate_order(order: i32) -> Result<i32> {
    if !(0..=MAX_FIELD_ORDER).contains(&order) {
        return Err(FormdeskError::Validation(format!(
            "order must be between 0 and {}",
            MAX_FIELD_ORDER
        )));
    }
    Ok(order)
}

/// Check a caller-supplied slug: lower-case alphanumerics separated by single dashes
pub fn validate_slug(slug: &str) -> Result<String> {
    let slug = slug.trim();
    let well_formed = !slug.is_empty()
        && slug.len() <= MAX_SLUG_LEN
        && slug
            .split('-')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));

    if !well_formed {
        return Err(FormdeskError::Validation(format!(
            "invalid slug '{}': use lower-case letters, digits and single dashes",
            slug
        )));
    }
    Ok(slug.to_string())
}

/// Derive a slug from free text
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }

    let mut slug = slug.trim_end_matches('-').to_string();
    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        slug = slug.trim_end_matches('-').to_string();
    }
    if slug.is_empty() {
        slug.push_str("form");
    }
    slug
}

/// Sort fields into display order
pub fn sort_fields(fields: &mut [FormField]) {
    fields.sort_by(|a, b| a.order.cmp(&b.order).then(a.created_at.cmp(&b.created_at)));
}

fn clean(value: Option<String>) -> Option<String> {
    crate::domain::user::clean_optional(value)
}
