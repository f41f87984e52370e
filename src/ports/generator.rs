use async_trait::async_trait;

use crate::domain::DomainError;

/// Port for the text-generation service used for translation.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Send a prompt and return the raw reply text.
    ///
    /// Failures are classified at this boundary: `DomainError::QuotaExceeded`
    /// for rate-limit/quota conditions, `DomainError::TranslationService` for
    /// everything else.
    async fn generate(&self, prompt: &str) -> Result<String, DomainError>;

    /// Backend name for logs.
    fn name(&self) -> &str;
}
