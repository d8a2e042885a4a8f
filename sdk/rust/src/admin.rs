use reqwest::{Client, Response, StatusCode};
use serde_json::Value;

/// Client for the admin HTTP API.
pub struct AdminClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl AdminClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub async fn status(&self) -> Result<Value, Box<dyn std::error::Error>> {
        self.get("/admin/status").await
    }

    pub async fn snapshots(&self) -> Result<Value, Box<dyn std::error::Error>> {
        self.get("/admin/snapshots").await
    }

    pub async fn sessions(&self) -> Result<Value, Box<dyn std::error::Error>> {
        self.get("/admin/sessions").await
    }

    /// Ask for a reconciliation pass.
    pub async fn reconcile(&self) -> Result<Value, Box<dyn std::error::Error>> {
        let resp = self
            .client
            .post(format!("{}/admin/reconcile", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        json_or_error(resp).await
    }

    /// Raw GET returning only the status, for auth checks.
    pub async fn get_status_code(&self, path: &str, api_key: Option<&str>) -> Result<StatusCode, reqwest::Error> {
        let mut req = self.client.get(format!("{}{}", self.base_url, path));
        if let Some(key) = api_key {
            req = req.bearer_auth(key);
        }
        Ok(req.send().await?.status())
    }

    async fn get(&self, path: &str) -> Result<Value, Box<dyn std::error::Error>> {
        let resp = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        json_or_error(resp).await
    }
}

async fn json_or_error(resp: Response) -> Result<Value, Box<dyn std::error::Error>> {
    let status = resp.status();
    let text = resp.text().await?;
    if !status.is_success() {
        return Err(format!("Admin API returned error status {}: {}", status, text).into());
    }
    Ok(serde_json::from_str(&text)?)
}
