use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use async_trait::async_trait;
use hfp_core::{
    FeedClient, FeedError, FeedMessage,
    feed_error::{ClientSnafu, DisconnectedSnafu, RejectedSnafu},
};
use rumqttc::{
    AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS, SubAck,
    SubscribeReasonCode, Transport,
};
use snafu::ResultExt;
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::FeedSettings;

const RECONNECT_DELAY: Duration = Duration::from_secs(1);
const REQUEST_CAPACITY: usize = 64;

type Reply = oneshot::Sender<Result<(), FeedError>>;

struct Request {
    topic: String,
    /// Requests issued internally after a reconnect have no caller waiting.
    reply: Option<Reply>,
}

impl Request {
    fn resolve(self, result: Result<(), FeedError>) {
        if let Some(reply) = self.reply {
            // The caller has given up waiting.
            let _ = reply.send(result);
        }
    }

    fn abandoned(&self) -> bool {
        self.reply.as_ref().is_some_and(|reply| reply.is_closed())
    }
}

impl Requests {
    fn subscribing(&self, topic: &str) -> bool {
        self.subscribed.contains(topic)
            || self
                .unsent_subscribes
                .iter()
                .chain(self.subscribes.values())
                .any(|r| r.topic == topic)
    }
}

/// Requests waiting for the broker, keyed by packet id once the event loop has sent them.
#[derive(Default)]
struct Requests {
    unsent_subscribes: VecDeque<Request>,
    unsent_unsubscribes: VecDeque<Request>,
    subscribes: HashMap<u16, Request>,
    unsubscribes: HashMap<u16, Request>,
    /// Topics the broker has acknowledged and that have not been unsubscribed.
    subscribed: HashSet<String>,
}

/// MQTT client of the HFP broker.
///
/// A single connection is shared by all sessions, its event loop runs on a background task and
/// publishes every received message on the broadcast channel.
#[derive(Clone)]
pub struct MqttFeed {
    client: AsyncClient,
    sender: broadcast::Sender<FeedMessage>,
    requests: Arc<Mutex<Requests>>,
}

impl MqttFeed {
    /// Connects lazily, the connection is established by the background task and re-established
    /// whenever it is lost.
    pub fn connect(settings: &FeedSettings) -> MqttFeed {
        let client_id = format!("{}-{}", settings.client_id, Uuid::new_v4().simple());

        let mut options = MqttOptions::new(client_id, &settings.host, settings.port);
        options.set_keep_alive(settings.keep_alive);
        if settings.tls {
            options.set_transport(Transport::tls_with_default_config());
        }

        let (client, event_loop) = AsyncClient::new(options, REQUEST_CAPACITY);
        let feed = MqttFeed::new(client, settings.channel_capacity);

        tokio::spawn(feed.clone().run(event_loop));

        feed
    }

    fn new(client: AsyncClient, channel_capacity: usize) -> MqttFeed {
        let (sender, _) = broadcast::channel(channel_capacity);
        MqttFeed {
            client,
            sender,
            requests: Default::default(),
        }
    }

    fn requests(&self) -> MutexGuard<'_, Requests> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn run(self, mut event_loop: EventLoop) {
        loop {
            match event_loop.poll().await {
                Ok(Event::Incoming(packet)) => self.on_incoming(packet),
                Ok(Event::Outgoing(outgoing)) => self.on_outgoing(outgoing),
                Err(e) => {
                    warn!("mqtt connection error: {e:?}");
                    self.fail_pending();
                    tokio::time::sleep(RECONNECT_DELAY).await;
                }
            }
        }
    }

    fn on_incoming(&self, packet: Packet) {
        match packet {
            Packet::Publish(publish) => {
                // No receivers means no session is running.
                let _ = self
                    .sender
                    .send(FeedMessage::new(publish.topic, publish.payload));
            }
            Packet::SubAck(ack) => self.on_sub_ack(ack),
            Packet::UnsubAck(ack) => {
                let request = self.requests().unsubscribes.remove(&ack.pkid);
                if let Some(request) = request {
                    debug!("unsubscribed from '{}'", request.topic);
                    self.requests().subscribed.remove(&request.topic);
                    request.resolve(Ok(()));
                }
            }
            Packet::ConnAck(_) => {
                info!("connected to mqtt broker");
                self.resubscribe();
            }
            _ => (),
        }
    }

    fn on_sub_ack(&self, ack: SubAck) {
        let Some(request) = self.requests().subscribes.remove(&ack.pkid) else {
            return;
        };

        let rejected = ack
            .return_codes
            .iter()
            .any(|c| matches!(c, SubscribeReasonCode::Failure));

        if rejected {
            warn!("broker rejected subscription to '{}'", request.topic);
            let topic = request.topic.clone();
            request.resolve(RejectedSnafu { topic }.fail());
        } else if request.abandoned() {
            self.drop_abandoned(request.topic);
        } else {
            debug!("subscribed to '{}'", request.topic);
            self.requests().subscribed.insert(request.topic.clone());
            request.resolve(Ok(()));
        }
    }

    /// The caller stopped waiting before the acknowledgement arrived, nobody holds the
    /// subscription unless another request for the topic is under way.
    fn drop_abandoned(&self, topic: String) {
        let mut requests = self.requests();
        if requests.subscribing(&topic) {
            return;
        }

        debug!("unsubscribing from abandoned subscription to '{topic}'");
        match self.client.try_unsubscribe(&topic) {
            Ok(()) => requests
                .unsent_unsubscribes
                .push_back(Request { topic, reply: None }),
            Err(e) => error!("failed to unsubscribe from '{topic}': {e:?}"),
        }
    }

    fn on_outgoing(&self, outgoing: Outgoing) {
        let mut requests = self.requests();
        match outgoing {
            Outgoing::Subscribe(pkid) => {
                if let Some(request) = requests.unsent_subscribes.pop_front() {
                    requests.subscribes.insert(pkid, request);
                }
            }
            Outgoing::Unsubscribe(pkid) => {
                if let Some(request) = requests.unsent_unsubscribes.pop_front() {
                    requests.unsubscribes.insert(pkid, request);
                }
            }
            _ => (),
        }
    }

    fn fail_pending(&self) {
        let pending: Vec<Request> = {
            let mut guard = self.requests();
            let requests = &mut *guard;
            requests
                .unsent_subscribes
                .drain(..)
                .chain(requests.unsent_unsubscribes.drain(..))
                .chain(requests.subscribes.drain().map(|(_, r)| r))
                .chain(requests.unsubscribes.drain().map(|(_, r)| r))
                .collect()
        };

        for request in pending {
            request.resolve(DisconnectedSnafu.fail());
        }
    }

    /// Subscriptions do not survive a clean session reconnect, topics that are still subscribed
    /// are requested again without anyone waiting for the acknowledgement.
    fn resubscribe(&self) {
        let mut requests = self.requests();
        let topics: Vec<String> = requests.subscribed.iter().cloned().collect();

        for topic in topics {
            match self.client.try_subscribe(&topic, QoS::AtMostOnce) {
                Ok(()) => requests
                    .unsent_subscribes
                    .push_back(Request { topic, reply: None }),
                Err(e) => error!("failed to resubscribe to '{topic}': {e:?}"),
            }
        }
    }
}

#[async_trait]
impl FeedClient for MqttFeed {
    async fn subscribe(&self, topic: &str) -> Result<(), FeedError> {
        let (reply, response) = oneshot::channel();

        {
            // The request is queued under the same lock as it is handed to the event loop so the
            // queue order matches the order packet ids are assigned in.
            let mut requests = self.requests();
            self.client
                .try_subscribe(topic, QoS::AtMostOnce)
                .boxed()
                .context(ClientSnafu)?;
            requests.unsent_subscribes.push_back(Request {
                topic: topic.to_string(),
                reply: Some(reply),
            });
        }

        response.await.map_err(|_| DisconnectedSnafu.build())?
    }

    async fn unsubscribe(&self, topic: &str) -> Result<(), FeedError> {
        let (reply, response) = oneshot::channel();

        {
            let mut requests = self.requests();
            self.client
                .try_unsubscribe(topic)
                .boxed()
                .context(ClientSnafu)?;
            requests.unsent_unsubscribes.push_back(Request {
                topic: topic.to_string(),
                reply: Some(reply),
            });
        }

        response.await.map_err(|_| DisconnectedSnafu.build())?
    }

    fn messages(&self) -> broadcast::Receiver<FeedMessage> {
        self.sender.subscribe()
    }
}
