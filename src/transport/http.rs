//! HTTP polling against the relay's `GET /poll`

use super::traits::CommandSource;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use homelink_shared::{EndpointId, ErrorResponse, PollResponse};
use std::time::Duration;

/// Where and as whom to poll
#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    /// Relay base URL, e.g. `http://127.0.0.1:3000`
    pub server_url: String,
    pub endpoint: EndpointId,
    pub request_timeout: Duration,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:3000".into(),
            endpoint: EndpointId::new("ritwik", "esp32"),
            request_timeout: Duration::from_secs(5),
        }
    }
}

/// Pulls commands from the relay over HTTP
pub struct HttpCommandSource {
    client: reqwest::Client,
    poll_url: String,
    endpoint: EndpointId,
}

impl HttpCommandSource {
    pub fn new(config: HttpSourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("building HTTP client")?;
        let poll_url = format!("{}/poll", config.server_url.trim_end_matches('/'));

        Ok(Self {
            client,
            poll_url,
            endpoint: config.endpoint,
        })
    }
}

#[async_trait]
impl CommandSource for HttpCommandSource {
    async fn poll(&self) -> Result<Option<String>> {
        let resp = self
            .client
            .get(&self.poll_url)
            .query(&[
                ("user", self.endpoint.user.as_str()),
                ("device", self.endpoint.device.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let reason = resp
                .json::<ErrorResponse>()
                .await
                .map(|body| body.error)
                .unwrap_or_default();
            return Err(anyhow!("Poll rejected ({}): {}", status, reason));
        }

        let body: PollResponse = resp.json().await?;
        Ok(body.command)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn source_for(server: &MockServer) -> HttpCommandSource {
        HttpCommandSource::new(HttpSourceConfig {
            server_url: server.base_url(),
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_poll_returns_command() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/poll")
                    .query_param("user", "ritwik")
                    .query_param("device", "esp32");
                then.status(200).json_body(json!({ "command": "KITCHEN_LIGHT_ON" }));
            })
            .await;

        let command = source_for(&server).poll().await.unwrap();
        mock.assert_async().await;
        assert_eq!(command.as_deref(), Some("KITCHEN_LIGHT_ON"));
    }

    #[tokio::test]
    async fn test_poll_returns_none_on_null() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/poll");
                then.status(200).json_body(json!({ "command": null }));
            })
            .await;

        assert_eq!(source_for(&server).poll().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_poll_surfaces_server_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/poll");
                then.status(400)
                    .json_body(json!({ "error": "Missing user or device" }));
            })
            .await;

        let err = source_for(&server).poll().await.unwrap_err();
        assert!(err.to_string().contains("Missing user or device"));
    }
}
