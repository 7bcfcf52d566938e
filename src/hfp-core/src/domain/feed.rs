use bytes::Bytes;

/// A raw message delivered by the feed, the payload is not validated in any way.
#[derive(Debug, Clone)]
pub struct FeedMessage {
    pub topic: String,
    pub payload: Bytes,
}

impl FeedMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Bytes>) -> FeedMessage {
        FeedMessage {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Matches a topic name against an MQTT topic filter.
/// `+` matches exactly one level and a trailing `#` matches the parent level and everything below
/// it.
pub fn topic_matches(filter: &str, topic: &str) -> bool {
    let mut filter_levels = filter.split('/');
    let mut topic_levels = topic.split('/');

    loop {
        match (filter_levels.next(), topic_levels.next()) {
            (Some("#"), _) => return filter_levels.next().is_none(),
            (Some("+"), Some(_)) => (),
            (Some(f), Some(t)) if f == t => (),
            (None, None) => return true,
            _ => return false,
        }
    }
}
