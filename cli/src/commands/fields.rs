//! Field commands

use crate::{FieldCommands, output::{self, OutputFormat}};
use super::forms::Field;
use super::ApiClient;

pub async fn handle(action: FieldCommands, client: &ApiClient, format: OutputFormat) -> Result<(), String> {
    match action {
        FieldCommands::Add { form_id, label, field_type, required, options, placeholder, order } => {
            let body = serde_json::json!({
                "label": label,
                "type": field_type.to_uppercase(),
                "required": required,
                "options": options,
                "placeholder": placeholder,
                "order": order,
            });
            let field: Field = client.post(&format!("/forms/{}/fields", form_id), &body).await?;
            match format {
                OutputFormat::Table => output::success(&format!("Added field {} at position {}", field.id, field.order)),
                _ => format.print(&field),
            }
        }
        FieldCommands::Remove { form_id, field_id } => {
            client.delete(&format!("/forms/{}/fields/{}", form_id, field_id)).await?;
            output::success(&format!("Removed field {}", field_id));
        }
    }
    Ok(())
}
