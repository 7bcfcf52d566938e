use std::{collections::HashMap, future::Future, time::Duration};

use hfp_core::{FeedClient, FeedError, feed_error::AckTimeoutSnafu};
use tokio::sync::Mutex;
use tracing::{debug, instrument};
use uuid::Uuid;

/// Proof that a topic is subscribed on behalf of one session.
///
/// The handle is consumed when released, a session can therefore only release its own
/// subscription and only once.
#[derive(Debug)]
pub struct SubscriptionHandle {
    id: Uuid,
    topic: String,
}

impl SubscriptionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

/// Shares broker subscriptions between overlapping sessions.
///
/// The broker is only asked to subscribe when the first handle of a topic is acquired and to
/// unsubscribe when the last one is released. Transitions are serialized by holding the lock while
/// waiting for the broker acknowledgement, which is bounded by `ack_timeout`.
pub struct SubscriptionManager<F> {
    feed: F,
    ack_timeout: Duration,
    live: Mutex<HashMap<String, usize>>,
}

impl<F: FeedClient> SubscriptionManager<F> {
    pub fn new(feed: F, ack_timeout: Duration) -> Self {
        Self {
            feed,
            ack_timeout,
            live: Mutex::new(HashMap::new()),
        }
    }

    pub fn feed(&self) -> &F {
        &self.feed
    }

    #[instrument(skip(self))]
    pub async fn acquire(&self, topic: &str) -> Result<SubscriptionHandle, FeedError> {
        let mut live = self.live.lock().await;
        let count = live.get(topic).copied().unwrap_or_default();

        if count == 0 {
            self.acknowledged(topic, self.feed.subscribe(topic)).await?;
            debug!("subscribed to '{topic}'");
        }

        live.insert(topic.to_string(), count + 1);

        Ok(SubscriptionHandle {
            id: Uuid::new_v4(),
            topic: topic.to_string(),
        })
    }

    /// Releases the handle, if the broker fails to unsubscribe the topic is still considered
    /// released and the next `acquire` subscribes again.
    #[instrument(skip(self))]
    pub async fn release(&self, handle: SubscriptionHandle) -> Result<(), FeedError> {
        let mut live = self.live.lock().await;
        let count = live.get(&handle.topic).copied().unwrap_or_default();

        if count > 1 {
            live.insert(handle.topic, count - 1);
            return Ok(());
        }

        live.remove(&handle.topic);
        self.acknowledged(&handle.topic, self.feed.unsubscribe(&handle.topic))
            .await?;
        debug!("unsubscribed from '{}'", handle.topic);

        Ok(())
    }

    pub async fn live_handles(&self, topic: &str) -> usize {
        self.live
            .lock()
            .await
            .get(topic)
            .copied()
            .unwrap_or_default()
    }

    async fn acknowledged(
        &self,
        topic: &str,
        request: impl Future<Output = Result<(), FeedError>>,
    ) -> Result<(), FeedError> {
        match tokio::time::timeout(self.ack_timeout, request).await {
            Ok(result) => result,
            Err(_) => AckTimeoutSnafu { topic }.fail(),
        }
    }
}
