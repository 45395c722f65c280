//! Submission commands

use crate::{SubmissionCommands, output::{self, OutputFormat}};
use super::ApiClient;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

#[derive(Debug, Serialize, Deserialize, Tabled)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: String,
    #[tabled(rename = "form")]
    pub form_id: String,
    #[tabled(rename = "submitted")]
    pub created_at: String,
    #[tabled(rename = "answers", display_with = "summarize")]
    pub data: serde_json::Map<String, serde_json::Value>,
}

fn summarize(data: &serde_json::Map<String, serde_json::Value>) -> String {
    data.iter()
        .map(|(label, value)| format!("{}={}", label, output::cell(value)))
        .collect::<Vec<_>>()
        .join("; ")
}

pub async fn handle(action: SubmissionCommands, client: &ApiClient, format: OutputFormat) -> Result<(), String> {
    match action {
        SubmissionCommands::List { form_id } => {
            let path = match form_id {
                Some(id) => format!("/submissions/form/{}", id),
                None => "/submissions".to_string(),
            };
            let submissions: Vec<Submission> = client.get(&path).await?;
            format.print_list(&submissions);
        }
        SubmissionCommands::Get { id } => {
            let submission: Submission = client.get(&format!("/submissions/{}", id)).await?;
            match format {
                OutputFormat::Table => format.print(&submission.data),
                _ => format.print(&submission),
            }
        }
        SubmissionCommands::Delete { id } => {
            client.delete(&format!("/submissions/{}", id)).await?;
            output::success(&format!("Deleted submission {}", id));
        }
        SubmissionCommands::Export { form_id, output: path } => {
            let csv = client.get_text(&format!("/analytics/forms/{}/export", form_id)).await?;
            match path {
                Some(path) => {
                    std::fs::write(&path, &csv).map_err(|e| format!("{}: {}", path, e))?;
                    let rows = csv.lines().count().saturating_sub(1);
                    output::success(&format!("Wrote {} submission(s) to {}", rows, path));
                }
                None => print!("{}", csv),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_summarize() {
        let data = json!({ "Name": "Ada", "Topics": ["A", "B"] });
        assert_eq!(summarize(data.as_object().unwrap()), "Name=Ada; Topics=A, B");
    }
}
