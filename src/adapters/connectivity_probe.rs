use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::ports::{ConnectivityCheck, HttpClient};

/// Connectivity check that asks a known endpoint whether it answers.
pub struct HttpConnectivityProbe {
    http: Arc<dyn HttpClient>,
    probe_url: String,
}

impl HttpConnectivityProbe {
    pub fn new(http: Arc<dyn HttpClient>, probe_url: impl Into<String>) -> Self {
        Self {
            http,
            probe_url: probe_url.into(),
        }
    }
}

#[async_trait]
impl ConnectivityCheck for HttpConnectivityProbe {
    async fn is_network_available(&self) -> bool {
        let available = self.http.probe(&self.probe_url).await;
        if !available {
            info!(url = %self.probe_url, "No network path available");
        }
        available
    }
}
