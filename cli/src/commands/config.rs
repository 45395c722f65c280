//! Config commands

use crate::ConfigCommands;
use crate::config::{Config, KEYS};
use crate::output;

pub async fn handle(action: ConfigCommands, profile: Option<&str>) -> Result<(), String> {
    match action {
        ConfigCommands::Init => {
            let config = Config {
                api_url: Some(crate::DEFAULT_API_URL.into()),
                ..Config::default()
            };
            let path = config.save(profile)?;
            output::success(&format!("Configuration initialized at {}", path.display()));
        }
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load(profile).unwrap_or_default();
            config.set(&key, value)?;
            config.save(profile)?;
            output::success(&format!("Set {} successfully", key));
        }
        ConfigCommands::Get { key } => {
            let config = Config::load(profile).unwrap_or_default();
            let value = config.get(&key)?;
            println!("{}: {}", key, value.unwrap_or_else(|| "(not set)".into()));
        }
        ConfigCommands::List => {
            let config = Config::load(profile).unwrap_or_default();
            for key in KEYS {
                let value = config.get(key)?;
                println!("{}: {}", key, value.unwrap_or_else(|| "(not set)".into()));
            }
        }
    }
    Ok(())
}
