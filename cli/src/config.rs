//! CLI Configuration

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Keys accepted by `config set/get`
pub const KEYS: &[&str] = &["api_url", "token", "default_format"];

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    pub api_url: Option<String>,
    pub token: Option<String>,
    pub default_format: Option<String>,
}

impl Config {
    pub fn load(profile: Option<&str>) -> Result<Self, String> {
        let path = Self::config_path(profile)?;
        if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| e.to_string())?;
            toml::from_str(&content).map_err(|e| e.to_string())
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, profile: Option<&str>) -> Result<PathBuf, String> {
        let path = Self::config_path(profile)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| e.to_string())?;
        fs::write(&path, content).map_err(|e| e.to_string())?;
        Ok(path)
    }

    pub fn set(&mut self, key: &str, value: String) -> Result<(), String> {
        match key {
            "api_url" => self.api_url = Some(value.trim_end_matches('/').to_string()),
            "token" => self.token = Some(value),
            "default_format" => self.default_format = Some(value),
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }

    /// Value for display; tokens are masked
    pub fn get(&self, key: &str) -> Result<Option<String>, String> {
        match key {
            "api_url" => Ok(self.api_url.clone()),
            "token" => Ok(self.token.as_deref().map(mask)),
            "default_format" => Ok(self.default_format.clone()),
            _ => Err(unknown_key(key)),
        }
    }

    fn config_path(profile: Option<&str>) -> Result<PathBuf, String> {
        let home = dirs::home_dir().ok_or("Cannot find home directory")?;
        let filename = match profile {
            Some(p) => format!("config.{}.toml", p),
            None => "config.toml".to_string(),
        };
        Ok(home.join(".formdesk").join(filename))
    }
}

fn unknown_key(key: &str) -> String {
    format!("Unknown config key: {} (expected one of {})", key, KEYS.join(", "))
}

fn mask(secret: &str) -> String {
    let visible: String = secret.chars().take(8).collect();
    format!("{}****", visible)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut config = Config::default();
        config.set("api_url", "http://localhost:8080/".into()).unwrap();
        config.set("token", "eyJhbGciOiJIUzI1NiJ9.payload".into()).unwrap();

        assert_eq!(config.get("api_url").unwrap().as_deref(), Some("http://localhost:8080"));
        assert_eq!(config.get("token").unwrap().as_deref(), Some("eyJhbGci****"));
        assert_eq!(config.get("default_format").unwrap(), None);
        assert!(config.set("tenant_id", "x".into()).is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = Config::default();
        config.set("default_format", "json".into()).unwrap();
        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.default_format.as_deref(), Some("json"));
        assert!(back.token.is_none());
    }
}
