use async_trait::async_trait;

/// Port answering whether a network path is currently available.
#[async_trait]
pub trait ConnectivityCheck: Send + Sync {
    async fn is_network_available(&self) -> bool;
}
