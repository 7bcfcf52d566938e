use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::{FeedClient, FeedError, FeedMessage, feed_error::RejectedSnafu};

/// How the test feed answers subscribe or unsubscribe requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AckBehaviour {
    #[default]
    Ack,
    Reject,
    /// The request is never acknowledged.
    Never,
}

#[derive(Debug, Default)]
struct FeedState {
    subscribe_calls: Vec<String>,
    unsubscribe_calls: Vec<String>,
    on_subscribe: AckBehaviour,
    on_unsubscribe: AckBehaviour,
    on_subscribed: Vec<FeedMessage>,
}

/// Feed client that acknowledges requests locally and lets tests publish messages.
#[derive(Debug, Clone)]
pub struct TestFeed {
    sender: broadcast::Sender<FeedMessage>,
    state: Arc<Mutex<FeedState>>,
}

impl Default for TestFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFeed {
    pub fn new() -> TestFeed {
        let (sender, _) = broadcast::channel(1024);
        TestFeed {
            sender,
            state: Default::default(),
        }
    }

    pub fn set_subscribe_behaviour(&self, behaviour: AckBehaviour) {
        self.state.lock().unwrap().on_subscribe = behaviour;
    }

    pub fn set_unsubscribe_behaviour(&self, behaviour: AckBehaviour) {
        self.state.lock().unwrap().on_unsubscribe = behaviour;
    }

    /// Messages published right after the next acknowledged subscription.
    pub fn publish_on_subscribe(&self, messages: impl IntoIterator<Item = FeedMessage>) {
        self.state
            .lock()
            .unwrap()
            .on_subscribed
            .extend(messages);
    }

    /// Returns the number of receivers the message reached.
    pub fn publish(&self, message: FeedMessage) -> usize {
        self.sender.send(message).unwrap_or(0)
    }

    pub fn subscribe_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().subscribe_calls.clone()
    }

    pub fn unsubscribe_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().unsubscribe_calls.clone()
    }
}

async fn answer(behaviour: AckBehaviour, topic: &str) -> Result<(), FeedError> {
    match behaviour {
        AckBehaviour::Ack => Ok(()),
        AckBehaviour::Reject => RejectedSnafu { topic }.fail(),
        AckBehaviour::Never => std::future::pending().await,
    }
}

#[async_trait]
impl FeedClient for TestFeed {
    async fn subscribe(&self, topic: &str) -> Result<(), FeedError> {
        let behaviour = {
            let mut state = self.state.lock().unwrap();
            state.subscribe_calls.push(topic.to_string());
            state.on_subscribe
        };

        answer(behaviour, topic).await?;

        let queued = std::mem::take(&mut self.state.lock().unwrap().on_subscribed);
        for message in queued {
            self.publish(message);
        }

        Ok(())
    }

    async fn unsubscribe(&self, topic: &str) -> Result<(), FeedError> {
        let behaviour = {
            let mut state = self.state.lock().unwrap();
            state.unsubscribe_calls.push(topic.to_string());
            state.on_unsubscribe
        };

        answer(behaviour, topic).await
    }

    fn messages(&self) -> broadcast::Receiver<FeedMessage> {
        self.sender.subscribe()
    }
}
