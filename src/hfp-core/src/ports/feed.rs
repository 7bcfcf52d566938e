use crate::*;
use async_trait::async_trait;
use tokio::sync::broadcast;

/// Publish/subscribe source of raw vehicle position messages.
///
/// Every message received on any subscribed topic is published on the broadcast channel returned
/// by `messages`, receivers must be created before subscribing to be guaranteed to see all
/// messages of that subscription.
#[async_trait]
pub trait FeedClient: Send + Sync {
    /// Resolves once the broker has acknowledged the subscription.
    async fn subscribe(&self, topic: &str) -> Result<(), FeedError>;
    /// Resolves once the broker has acknowledged the unsubscription.
    async fn unsubscribe(&self, topic: &str) -> Result<(), FeedError>;
    fn messages(&self) -> broadcast::Receiver<FeedMessage>;
}
