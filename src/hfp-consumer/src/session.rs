use std::{sync::Arc, time::Duration};

use hfp_core::{FeedClient, FeedMessage, VehiclePositionInbound, topic_matches};
use serde::Serialize;
use snafu::ResultExt;
use strum::Display;
use tokio::{sync::broadcast::error::RecvError, task::JoinSet};
use tracing::{Instrument, Span, debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    SubscriptionManager, decode,
    error::{
        Result, SessionError,
        session_error::{
            InvalidDurationSnafu, SessionTaskSnafu, SubscriptionFailedSnafu,
            UnsubscriptionFailedSnafu,
        },
    },
};

pub const DEFAULT_SESSION_DURATION: Duration = Duration::from_secs(10);

/// Length of an ingestion window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionDuration(Duration);

impl SessionDuration {
    /// Parses the requested window length in seconds.
    /// An absent or blank value gives the default of ten seconds, any other value that is not a
    /// positive finite number of seconds is rejected.
    pub fn from_param(value: Option<&str>) -> Result<SessionDuration> {
        let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Ok(SessionDuration(DEFAULT_SESSION_DURATION));
        };

        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v > 0.0)
            .and_then(|v| Duration::try_from_secs_f64(v).ok())
            .filter(|d| !d.is_zero())
            .map(SessionDuration)
            .ok_or_else(|| InvalidDurationSnafu { value: raw }.build())
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

impl Default for SessionDuration {
    fn default() -> Self {
        SessionDuration(DEFAULT_SESSION_DURATION)
    }
}

impl From<Duration> for SessionDuration {
    fn from(value: Duration) -> Self {
        SessionDuration(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SessionState {
    Idle,
    Subscribing,
    Active,
    Unsubscribing,
    Completed,
    Failed,
}

/// Outcome of one ingestion window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
    /// Messages received on the session topic.
    pub received: u64,
    /// Positions written to the store, reports that were already stored count as written.
    pub stored: u64,
    pub rejected: u64,
    pub failed_writes: u64,
}

impl SessionReport {
    fn new(duration: Duration) -> Self {
        Self {
            duration,
            ..Default::default()
        }
    }
}

struct Session {
    id: Uuid,
    state: SessionState,
}

impl Session {
    fn transition(&mut self, next: SessionState) {
        debug!(session = %self.id, "{} -> {}", self.state, next);
        self.state = next;
    }
}

/// Runs ingestion sessions: subscribes to the feed topic, stores every valid position received
/// during the window and unsubscribes when the window ends.
pub struct Ingestor<S, F> {
    store: S,
    subscriptions: Arc<SubscriptionManager<F>>,
    topic: String,
}

impl<S: Clone, F> Clone for Ingestor<S, F> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            subscriptions: self.subscriptions.clone(),
            topic: self.topic.clone(),
        }
    }
}

impl<S, F> Ingestor<S, F>
where
    S: VehiclePositionInbound + Clone + 'static,
    F: FeedClient + 'static,
{
    pub fn new(store: S, subscriptions: Arc<SubscriptionManager<F>>, topic: String) -> Self {
        Self {
            store,
            subscriptions,
            topic,
        }
    }

    pub fn subscriptions(&self) -> &Arc<SubscriptionManager<F>> {
        &self.subscriptions
    }

    /// Parses the requested duration and runs a session, nothing is subscribed if the duration is
    /// invalid.
    pub async fn ingest(&self, duration: Option<&str>) -> Result<SessionReport> {
        let duration = SessionDuration::from_param(duration)?;
        self.run(duration).await
    }

    /// Runs a session on its own task. The window always runs to its deadline and releases its
    /// subscription, even if the returned future is dropped.
    pub async fn run(&self, duration: SessionDuration) -> Result<SessionReport> {
        let ingestor = self.clone();
        tokio::spawn(async move { ingestor.run_window(duration).await }.in_current_span())
            .await
            .context(SessionTaskSnafu)?
    }

    #[instrument(skip(self), fields(app.session_id, app.received, app.stored))]
    async fn run_window(&self, duration: SessionDuration) -> Result<SessionReport> {
        let mut session = Session {
            id: Uuid::new_v4(),
            state: SessionState::Idle,
        };
        Span::current().record("app.session_id", tracing::field::display(session.id));

        // Created before subscribing so nothing delivered after the acknowledgement is missed.
        let mut messages = self.subscriptions.feed().messages();

        session.transition(SessionState::Subscribing);
        let handle = match self.subscriptions.acquire(&self.topic).await {
            Ok(handle) => handle,
            Err(e) => {
                error!("failed to subscribe to '{}': {e:?}", self.topic);
                session.transition(SessionState::Failed);
                return Err(e).context(SubscriptionFailedSnafu);
            }
        };

        session.transition(SessionState::Active);

        let mut report = SessionReport::new(duration.as_duration());
        let mut writes = JoinSet::new();

        let deadline = tokio::time::sleep(duration.as_duration());
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                biased;
                _ = &mut deadline => break,
                message = messages.recv() => {
                    match message {
                        Ok(message) => self.handle_message(message, &mut report, &mut writes),
                        Err(RecvError::Lagged(skipped)) => {
                            warn!("session lagged behind the feed, skipped {skipped} messages");
                        }
                        Err(RecvError::Closed) => {
                            warn!("feed channel closed, waiting for the window to end");
                            (&mut deadline).await;
                            break;
                        }
                    }
                }
            }
        }

        drop(messages);

        session.transition(SessionState::Unsubscribing);
        let released = self.subscriptions.release(handle).await;

        while let Some(write) = writes.join_next().await {
            match write {
                Ok(Ok(())) => report.stored += 1,
                Ok(Err(e)) => {
                    error!("failed to store vehicle position: {e:?}");
                    report.failed_writes += 1;
                }
                Err(e) => {
                    error!("vehicle position write task failed: {e:?}");
                    report.failed_writes += 1;
                }
            }
        }

        Span::current().record("app.received", report.received);
        Span::current().record("app.stored", report.stored);

        match released {
            Ok(()) => {
                session.transition(SessionState::Completed);
                info!("ingestion session completed: {report:?}");
                Ok(report)
            }
            Err(e) => {
                error!("failed to unsubscribe from '{}': {e:?}", self.topic);
                session.transition(SessionState::Failed);
                Err(e).context(UnsubscriptionFailedSnafu { report })
            }
        }
    }

    fn handle_message(
        &self,
        message: FeedMessage,
        report: &mut SessionReport,
        writes: &mut JoinSet<hfp_core::CoreResult<()>>,
    ) {
        if !topic_matches(&self.topic, &message.topic) {
            return;
        }

        report.received += 1;

        match decode(&message.payload) {
            Ok(position) => {
                let store = self.store.clone();
                writes.spawn(async move { store.add_vehicle_position(&position).await });
            }
            Err(e) => {
                debug!("rejected message on '{}': {e}", message.topic);
                report.rejected += 1;
            }
        }
    }
}

impl SessionError {
    /// The partial report of a session that failed to unsubscribe.
    pub fn report(&self) -> Option<&SessionReport> {
        match self {
            SessionError::UnsubscriptionFailed { report, .. } => Some(report),
            _ => None,
        }
    }
}
