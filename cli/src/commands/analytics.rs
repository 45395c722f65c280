//! Analytics commands

use crate::{AnalyticsCommands, output::{display_option, OutputFormat}};
use super::ApiClient;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

#[derive(Debug, Serialize, Deserialize, Tabled)]
#[serde(rename_all = "camelCase")]
pub struct ClientStats {
    pub email: String,
    #[tabled(display_with = "display_option")]
    pub name: Option<String>,
    pub status: String,
    pub forms: u64,
    #[tabled(rename = "published")]
    pub published_forms: u64,
    pub submissions: u64,
    #[tabled(rename = "last login", display_with = "display_option")]
    pub last_login_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Tabled)]
#[serde(rename_all = "camelCase")]
pub struct FieldStats {
    pub label: String,
    #[serde(rename = "type")]
    #[tabled(rename = "type")]
    pub field_type: String,
    pub answered: u64,
    #[tabled(rename = "rate")]
    pub answer_rate: f64,
    #[tabled(display_with = "display_counts")]
    #[serde(default)]
    pub options: Option<Vec<OptionCount>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OptionCount {
    pub option: String,
    pub count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormStats {
    pub title: String,
    pub total_submissions: u64,
    pub first_submission_at: Option<String>,
    pub last_submission_at: Option<String>,
    pub fields: Vec<FieldStats>,
}

#[derive(Debug, Serialize, Deserialize, Tabled)]
pub struct DailyCount {
    pub date: String,
    pub count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Timeline {
    pub days: u32,
    pub total: u64,
    pub points: Vec<DailyCount>,
}

fn display_counts(options: &Option<Vec<OptionCount>>) -> String {
    match options {
        Some(counts) => counts
            .iter()
            .map(|c| format!("{}: {}", c.option, c.count))
            .collect::<Vec<_>>()
            .join(", "),
        None => "-".into(),
    }
}

fn bar(count: u64, max: u64) -> String {
    const WIDTH: u64 = 40;
    if max == 0 {
        return String::new();
    }
    "█".repeat(((count * WIDTH + max - 1) / max) as usize)
}

pub async fn handle(action: AnalyticsCommands, client: &ApiClient, format: OutputFormat) -> Result<(), String> {
    match action {
        AnalyticsCommands::Overview => {
            let overview: serde_json::Value = client.get("/analytics/overview").await?;
            format.print(&overview);
        }
        AnalyticsCommands::Clients => {
            let clients: Vec<ClientStats> = client.get("/analytics/clients").await?;
            format.print_list(&clients);
        }
        AnalyticsCommands::Form { form_id } => {
            let stats: FormStats = client.get(&format!("/analytics/forms/{}", form_id)).await?;
            match format {
                OutputFormat::Table => {
                    println!(
                        "{} - {} submission(s), last {}",
                        stats.title.bold(),
                        stats.total_submissions,
                        display_option(&stats.last_submission_at)
                    );
                    format.print_list(&stats.fields);
                }
                _ => format.print(&stats),
            }
        }
        AnalyticsCommands::Timeline { days, form_id } => {
            let mut path = format!("/analytics/timeline?days={}", days);
            if let Some(form_id) = form_id {
                path.push_str(&format!("&formId={}", form_id));
            }
            let timeline: Timeline = client.get(&path).await?;
            match format {
                OutputFormat::Table => {
                    let max = timeline.points.iter().map(|p| p.count).max().unwrap_or(0);
                    for point in &timeline.points {
                        println!("{} {:>5} {}", point.date, point.count, bar(point.count, max).cyan());
                    }
                    println!("{} submission(s) in {} day(s)", timeline.total.to_string().bold(), timeline.days);
                }
                _ => format.print(&timeline),
            }
        }
    }
    Ok(())
}
