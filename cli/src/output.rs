//! Output formatting

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    /// Parse a stored `default_format` value
    pub fn parse(value: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(value, true).ok()
    }

    /// Print rows; tables get one line per item
    pub fn print_list<T: Serialize + Tabled>(&self, rows: &[T]) {
        match self {
            OutputFormat::Table if rows.is_empty() => println!("{}", "(none)".dimmed()),
            OutputFormat::Table => println!("{}", Table::new(rows).with(Style::rounded())),
            _ => self.print(&rows),
        }
    }

    /// Print one item; tables show it as field/value pairs
    pub fn print<T: Serialize>(&self, data: &T) {
        match self {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(data).unwrap_or_default());
            }
            OutputFormat::Yaml => {
                println!("{}", serde_yaml::to_string(data).unwrap_or_default());
            }
            OutputFormat::Table => {
                let rows = key_values(&serde_json::to_value(data).unwrap_or_default());
                println!("{}", Table::new(rows).with(Style::rounded()));
            }
        }
    }
}

#[derive(Tabled)]
struct KeyValue {
    field: String,
    value: String,
}

fn key_values(value: &serde_json::Value) -> Vec<KeyValue> {
    match value {
        serde_json::Value::Object(map) => map
            .iter()
            .map(|(field, value)| KeyValue { field: field.clone(), value: cell(value) })
            .collect(),
        other => vec![KeyValue { field: "value".into(), value: cell(other) }],
    }
}

/// Flatten a JSON value into a table cell
pub fn cell(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "-".into(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items.iter().map(cell).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

/// `display_with` helper for optional columns
pub fn display_option<T: std::fmt::Display>(value: &Option<T>) -> String {
    value.as_ref().map(|v| v.to_string()).unwrap_or_else(|| "-".into())
}

/// Green status line
pub fn success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_format() {
        assert!(matches!(OutputFormat::parse("JSON"), Some(OutputFormat::Json)));
        assert!(OutputFormat::parse("xml").is_none());
    }

    #[test]
    fn test_cells() {
        assert_eq!(cell(&json!(null)), "-");
        assert_eq!(cell(&json!(["a", "b"])), "a, b");
        assert_eq!(cell(&json!(true)), "true");
        assert_eq!(display_option(&None::<String>), "-");
        assert_eq!(display_option(&Some(3)), "3");
    }

    #[test]
    fn test_key_values() {
        let rows = key_values(&json!({ "id": "x", "published": false }));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].field, "id");
    }
}
