use async_trait::async_trait;
use serde_json::Value;

use crate::domain::DomainError;

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client port for all network requests.
/// All network traffic must go through this interface.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// POST a JSON body with optional extra headers.
    ///
    /// Non-2xx responses are returned, not turned into errors, so callers can
    /// classify them. Errors are reserved for blocked or failed transport.
    async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &Value,
    ) -> Result<HttpResponse, DomainError>;

    /// Check that `url` answers at all (any HTTP status counts).
    async fn probe(&self, url: &str) -> bool;

    /// Get the list of allowed domains.
    fn allowed_domains(&self) -> Vec<String>;
}
