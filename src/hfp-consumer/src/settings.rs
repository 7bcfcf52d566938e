use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection and subscription settings of the HFP broker.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedSettings {
    pub host: String,
    pub port: u16,
    pub tls: bool,
    /// Prefix of the MQTT client id, a random suffix is added per connection.
    pub client_id: String,
    /// Topic filter every ingestion session subscribes to.
    pub topic: String,
    /// How long to wait for the broker to acknowledge a subscribe or unsubscribe.
    #[serde(with = "humantime_serde", default = "default_ack_timeout")]
    pub ack_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub keep_alive: Duration,
    pub channel_capacity: usize,
}

fn default_ack_timeout() -> Duration {
    DEFAULT_ACK_TIMEOUT
}
