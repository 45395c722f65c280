//! Auth commands

use crate::config::Config;
use crate::{AuthCommands, output::{self, OutputFormat}};
use super::ApiClient;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub role: String,
    pub status: String,
    pub last_login_at: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub expires_in: i64,
    pub user: User,
}

pub async fn handle(
    action: AuthCommands,
    client: &ApiClient,
    format: OutputFormat,
    profile: Option<&str>,
) -> Result<(), String> {
    match action {
        AuthCommands::Login { email, password } => {
            let body = serde_json::json!({ "email": email, "password": password });
            let session: Session = client.post("/auth/login", &body).await?;
            remember(&session, client, profile)?;
            output::success(&format!(
                "Logged in as {} ({}); token valid for {}h",
                session.user.email,
                session.user.role,
                session.expires_in / 3600
            ));
        }
        AuthCommands::Register { email, password, name } => {
            let body = serde_json::json!({ "email": email, "password": password, "name": name });
            let session: Session = client.post("/auth/register", &body).await?;
            remember(&session, client, profile)?;
            output::success(&format!("Registered {} (client id {})", session.user.email, session.user.id));
        }
        AuthCommands::Profile => {
            let user: User = client.get("/auth/profile").await?;
            format.print(&user);
        }
    }
    Ok(())
}

fn remember(session: &Session, client: &ApiClient, profile: Option<&str>) -> Result<(), String> {
    let mut config = Config::load(profile).unwrap_or_default();
    config.token = Some(session.token.clone());
    config.api_url = Some(client.base_url.clone());
    config.save(profile)?;
    Ok(())
}
