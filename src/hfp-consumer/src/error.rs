use hfp_core::FeedError;
use snafu::{Location, Snafu};

use crate::SessionReport;

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub))]
pub enum SessionError {
    #[snafu(display("Invalid duration '{value}'"))]
    InvalidDuration {
        #[snafu(implicit)]
        location: Location,
        value: String,
    },
    #[snafu(display("Failed to subscribe to the topic"))]
    SubscriptionFailed {
        #[snafu(implicit)]
        location: Location,
        source: FeedError,
    },
    #[snafu(display("Failed to unsubscribe from the topic"))]
    UnsubscriptionFailed {
        #[snafu(implicit)]
        location: Location,
        report: SessionReport,
        source: FeedError,
    },
    #[snafu(display("Ingestion session task failed"))]
    SessionTask {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        error: tokio::task::JoinError,
    },
}

/// Reasons a raw feed payload is not turned into a position.
#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub))]
pub enum DecodeError {
    #[snafu(display("Payload is not a JSON object with a 'VP' object"))]
    MalformedPayload {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        error: serde_json::Error,
    },
    #[snafu(display("Field '{field}' is missing"))]
    MissingField {
        #[snafu(implicit)]
        location: Location,
        field: &'static str,
    },
    #[snafu(display("Invalid timestamp '{value}'"))]
    InvalidTimestamp {
        #[snafu(implicit)]
        location: Location,
        value: String,
    },
    #[snafu(display("Invalid value '{value}' for field '{field}'"))]
    InvalidNumeric {
        #[snafu(implicit)]
        location: Location,
        field: &'static str,
        value: String,
    },
}
