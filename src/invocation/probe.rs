//! HTTP implementation of [`HealthProbe`].

use crate::credential::{HealthProbe, Secret};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Probes a credential with `GET {endpoint}/models`.
///
/// Any 2xx counts as healthy. Probing never rotates the pool and does not
/// count as a request.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(client: Client, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl HealthProbe for HttpProbe {
    async fn probe(&self, secret: &Secret) -> Result<(), String> {
        let url = format!("{}/models", self.endpoint);

        let response = self
            .client
            .get(&url)
            .bearer_auth(secret.expose())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    format!("Request timeout after {}ms", self.timeout.as_millis())
                } else {
                    format!("Network error: {}", e)
                }
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(format!("Probe rejected with status {}", status.as_u16()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_probe_accepts_valid_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .and(header("authorization", "Bearer sk-good-0001"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"id": "qwen-vl-max"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let probe = HttpProbe::new(
            Client::new(),
            format!("{}/", server.uri()),
            Duration::from_secs(5),
        );
        assert!(probe.probe(&Secret::new("sk-good-0001")).await.is_ok());
    }

    #[tokio::test]
    async fn test_probe_reports_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let probe = HttpProbe::new(Client::new(), server.uri(), Duration::from_secs(5));
        let err = probe.probe(&Secret::new("sk-bad")).await.unwrap_err();
        assert!(err.contains("401"));
    }

    #[tokio::test]
    async fn test_probe_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let probe = HttpProbe::new(Client::new(), server.uri(), Duration::from_millis(100));
        let err = probe.probe(&Secret::new("sk-slow")).await.unwrap_err();
        assert!(err.contains("timeout"));
    }
}
