//! reqwest-backed `Transport` for native clients.

use crate::server::{Transport, API_PREFIX};
use anyhow::Context;
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde_json::Value;

/// Talks to a running explorer server over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, name: &str) -> String {
        format!("{}/{}/{}", self.base_url, API_PREFIX, name)
    }

    /// Error responses still carry a JSON body; only give up when it is not JSON.
    async fn read_json(name: &str, response: reqwest::Response) -> anyhow::Result<Value> {
        let status = response.status();
        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read {} response", name))?;
        match serde_json::from_str::<Value>(&text) {
            Ok(body) => {
                if status != StatusCode::OK {
                    warn!("API {} returned status {}", name, status);
                }
                Ok(body)
            }
            Err(e) => {
                warn!("API {} returned status {} with non-JSON body", name, status);
                Err(anyhow::Error::new(e).context(format!("API {} failed with status {}", name, status)))
            }
        }
    }
}

impl Transport for HttpTransport {
    async fn get(&self, name: &str, query: &[(&str, String)]) -> anyhow::Result<Value> {
        debug!("API GET {} {:?}", name, query);
        let response = self
            .client
            .get(self.url(name))
            .query(query)
            .send()
            .await
            .with_context(|| format!("GET {} failed", name))?;
        Self::read_json(name, response).await
    }

    async fn post(&self, name: &str, body: Value) -> anyhow::Result<Value> {
        debug!("API POST {} {}", name, body);
        let response = self
            .client
            .post(self.url(name))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("POST {} failed", name))?;
        Self::read_json(name, response).await
    }

    async fn download(&self, name: &str) -> anyhow::Result<Vec<u8>> {
        debug!("API download {}", name);
        let response = self
            .client
            .get(self.url(name))
            .send()
            .await
            .with_context(|| format!("GET {} failed", name))?;
        if response.status() != StatusCode::OK {
            warn!("Download {} returned status {}", name, response.status());
            anyhow::bail!("Download {} failed with status {}", name, response.status());
        }
        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read {} body", name))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::HttpTransport;

    #[test]
    fn test_endpoint_url() {
        let transport = HttpTransport::new("http://localhost:5000/");
        assert_eq!(
            transport.url("set_filter"),
            "http://localhost:5000/api/1.0/set_filter"
        );
    }
}
