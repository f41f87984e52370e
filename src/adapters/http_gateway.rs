use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::domain::config::NetworkConfig;
use crate::domain::DomainError;
use crate::ports::{HttpClient, HttpResponse};

/// HttpGateway is the single exit point for HTTP traffic.
/// Only hosts on the allow-list (or their subdomains) can be contacted.
pub struct HttpGateway {
    client: Client,
    probe_timeout: Duration,
    allowed_domains: Vec<String>,
}

impl HttpGateway {
    /// Create a gateway from the network configuration.
    pub fn new(config: &NetworkConfig) -> Result<Self, DomainError> {
        let client = Client::builder()
            .use_rustls_tls()
            .user_agent(format!("VoiceTranslator/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| DomainError::HttpRequest(format!("Failed to create HTTP client: {}", e)))?;

        debug!(
            allowed_domains = ?config.allowed_domains,
            "HttpGateway initialized"
        );

        Ok(Self {
            client,
            probe_timeout: Duration::from_millis(config.probe_timeout_ms),
            allowed_domains: config.allowed_domains.clone(),
        })
    }

    /// Check if a URL is allowed based on current settings.
    fn is_url_allowed(&self, url: &str) -> Result<(), DomainError> {
        let parsed = Url::parse(url).map_err(|e| DomainError::HttpRequest(e.to_string()))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| DomainError::HttpRequest("Invalid URL: no host".to_string()))?;

        let allowed = self
            .allowed_domains
            .iter()
            .any(|d| host == d || host.ends_with(&format!(".{}", d)));
        if !allowed {
            warn!(host = host, "Network request blocked: domain not in allow-list");
            return Err(DomainError::NetworkBlocked {
                reason: format!("Domain '{}' is not in the allowed list", host),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl HttpClient for HttpGateway {
    async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &Value,
    ) -> Result<HttpResponse, DomainError> {
        self.is_url_allowed(url)?;

        let mut request = self.client.post(url).json(body);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DomainError::HttpRequest(e.without_url().to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| DomainError::HttpRequest(e.without_url().to_string()))?;

        debug!(status, bytes = body.len(), "HTTP response received");
        Ok(HttpResponse { status, body })
    }

    async fn probe(&self, url: &str) -> bool {
        if self.is_url_allowed(url).is_err() {
            return false;
        }

        match self.client.get(url).timeout(self.probe_timeout).send().await {
            Ok(response) => {
                debug!(status = response.status().as_u16(), "Connectivity probe answered");
                true
            }
            Err(e) => {
                debug!(error = %e, "Connectivity probe failed");
                false
            }
        }
    }

    fn allowed_domains(&self) -> Vec<String> {
        self.allowed_domains.clone()
    }
}
