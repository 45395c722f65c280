//! Forms commands

use crate::{FormCommands, output::{self, display_option, OutputFormat}};
use super::ApiClient;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

#[derive(Debug, Serialize, Deserialize, Tabled)]
#[serde(rename_all = "camelCase")]
pub struct Form {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub published: bool,
    #[tabled(skip)]
    pub description: Option<String>,
    #[tabled(rename = "client")]
    pub client_id: String,
    #[tabled(rename = "updated")]
    pub updated_at: String,
}

#[derive(Debug, Serialize, Deserialize, Tabled)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub order: i32,
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    #[tabled(rename = "type")]
    pub field_type: String,
    pub required: bool,
    #[tabled(display_with = "display_options")]
    pub options: Vec<String>,
    #[tabled(display_with = "display_option")]
    pub placeholder: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDetail {
    #[serde(flatten)]
    pub form: Form,
    pub fields: Vec<Field>,
}

fn display_options(options: &[String]) -> String {
    if options.is_empty() {
        "-".into()
    } else {
        options.join(", ")
    }
}

pub async fn handle(action: FormCommands, client: &ApiClient, format: OutputFormat) -> Result<(), String> {
    match action {
        FormCommands::List { client_id } => {
            let path = match client_id {
                Some(id) => format!("/forms?clientId={}", id),
                None => "/forms".to_string(),
            };
            let forms: Vec<Form> = client.get(&path).await?;
            format.print_list(&forms);
        }
        FormCommands::Get { id } => {
            let detail: FormDetail = client.get(&format!("/forms/{}", id)).await?;
            print_detail(&detail, format);
        }
        FormCommands::Create { title, description, slug, client_id, file } => {
            let body = match file {
                Some(path) => load_definition(&path)?,
                None => serde_json::json!({
                    "title": title.ok_or("--title or --file is required")?,
                    "description": description,
                    "slug": slug,
                    "clientId": client_id,
                }),
            };
            let detail: FormDetail = client.post("/forms", &body).await?;
            output::success(&format!(
                "Created form {} ({}) with {} field(s)",
                detail.form.id,
                detail.form.slug,
                detail.fields.len()
            ));
        }
        FormCommands::Publish { id } => set_published(client, &id, true).await?,
        FormCommands::Unpublish { id } => set_published(client, &id, false).await?,
        FormCommands::Delete { id } => {
            client.delete(&format!("/forms/{}", id)).await?;
            output::success(&format!("Deleted form {} with its fields and submissions", id));
        }
    }
    Ok(())
}

pub fn print_detail(detail: &FormDetail, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            format.print(&detail.form);
            format.print_list(&detail.fields);
        }
        _ => format.print(detail),
    }
}

async fn set_published(client: &ApiClient, id: &str, published: bool) -> Result<(), String> {
    let body = serde_json::json!({ "published": published });
    let detail: FormDetail = client.put(&format!("/forms/{}", id), &body).await?;
    let state = if published { "published" } else { "unpublished" };
    output::success(&format!("Form {} is now {}", detail.form.slug, state));
    Ok(())
}

/// Form definition from a YAML or JSON file
fn load_definition(path: &str) -> Result<serde_json::Value, String> {
    let content = std::fs::read_to_string(path).map_err(|e| format!("{}: {}", path, e))?;
    if path.ends_with(".json") {
        serde_json::from_str(&content).map_err(|e| format!("{}: {}", path, e))
    } else {
        serde_yaml::from_str(&content).map_err(|e| format!("{}: {}", path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_deserializes_flattened() {
        let detail: FormDetail = serde_json::from_value(serde_json::json!({
            "id": "f1",
            "title": "Contact",
            "slug": "contact",
            "published": true,
            "description": null,
            "clientId": "c1",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z",
            "fields": [{
                "id": "x", "formId": "f1", "label": "Topic", "type": "RADIO",
                "placeholder": null, "required": false, "order": 0,
                "options": ["A", "B"], "createdAt": "2024-01-01T00:00:00Z"
            }]
        }))
        .unwrap();
        assert_eq!(detail.form.slug, "contact");
        assert_eq!(detail.fields[0].field_type, "RADIO");
        assert_eq!(display_options(&detail.fields[0].options), "A, B");
    }
}
