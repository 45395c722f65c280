//! CLI Commands

pub mod analytics;
pub mod auth;
pub mod config;
pub mod fields;
pub mod forms;
pub mod submissions;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// API client
pub struct ApiClient {
    pub base_url: String,
    pub token: Option<String>,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
            client: reqwest::Client::new(),
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, String> {
        self.send(self.request(reqwest::Method::GET, path)).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, String> {
        self.send(self.request(reqwest::Method::POST, path).json(body)).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, String> {
        self.send(self.request(reqwest::Method::PUT, path).json(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), String> {
        self.send::<serde_json::Value>(self.request(reqwest::Method::DELETE, path))
            .await
            .map(|_| ())
    }

    /// Raw body of a non-JSON endpoint (CSV export)
    pub async fn get_text(&self, path: &str) -> Result<String, String> {
        let resp = self
            .request(reqwest::Method::GET, path)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if resp.status().is_success() {
            resp.text().await.map_err(|e| e.to_string())
        } else {
            let json: serde_json::Value = resp.json().await.map_err(|e| e.to_string())?;
            Err(envelope_error(&json))
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.request(method, &url);

        if let Some(token) = &self.token {
            req = req.header("Authorization", format!("Bearer {}", token));
        }
        req
    }

    async fn send<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> Result<T, String> {
        let resp = req.send().await.map_err(|e| e.to_string())?;
        let json: serde_json::Value = resp.json().await.map_err(|e| e.to_string())?;
        unwrap_envelope(json)
    }
}

/// `data` of a successful envelope, or the server's error message
pub fn unwrap_envelope<T: DeserializeOwned>(json: serde_json::Value) -> Result<T, String> {
    if json.get("success").and_then(|s| s.as_bool()) != Some(true) {
        return Err(envelope_error(&json));
    }
    match json.get("data") {
        Some(data) => serde_json::from_value(data.clone()).map_err(|e| e.to_string()),
        None => Err("No data in response".into()),
    }
}

fn envelope_error(json: &serde_json::Value) -> String {
    let error = &json["error"];
    match (error["code"].as_str(), error["message"].as_str()) {
        (Some(code), Some(message)) => format!("{}: {}", code, message),
        _ => "Unexpected response from server".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unwrap_envelope() {
        let ok: Vec<u32> = unwrap_envelope(json!({ "success": true, "data": [1, 2], "error": null })).unwrap();
        assert_eq!(ok, [1, 2]);

        let err = unwrap_envelope::<serde_json::Value>(json!({
            "success": false,
            "data": null,
            "error": { "code": "FORBIDDEN", "message": "form belongs to another client" }
        }))
        .unwrap_err();
        assert_eq!(err, "FORBIDDEN: form belongs to another client");

        assert!(unwrap_envelope::<serde_json::Value>(json!("nope")).is_err());
    }
}
