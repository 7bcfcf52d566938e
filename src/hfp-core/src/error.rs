use snafu::{Location, Snafu};

pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type CoreResult<T> = std::result::Result<T, Error>;

/// Error returned across the port boundary.
/// Adapters convert their own error types into this one, callers only need to know whether the
/// operation failed or timed out.
#[derive(Debug, Snafu)]
#[snafu(module(core_error), visibility(pub))]
pub enum Error {
    #[snafu(display("An unexpected error occured"))]
    Unexpected {
        #[snafu(implicit)]
        location: Location,
        source: BoxedError,
    },
    #[snafu(display("Operation timed out"))]
    Timeout {
        #[snafu(implicit)]
        location: Location,
        source: BoxedError,
    },
}

impl Error {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }
}

#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub))]
pub enum IdentifierError {
    #[snafu(display("Identifier cannot be empty"))]
    Empty {
        #[snafu(implicit)]
        location: Location,
    },
}

#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub))]
pub enum CoordinatesError {
    #[snafu(display(
        "Coordinates are outside the geographic range, latitude: '{latitude}', longitude: '{longitude}'"
    ))]
    OutOfRange {
        #[snafu(implicit)]
        location: Location,
        latitude: f64,
        longitude: f64,
    },
}

/// Failures of the feed client, subscribe and unsubscribe are never retried.
#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub))]
pub enum FeedError {
    #[snafu(display("Broker rejected the request for topic '{topic}'"))]
    Rejected {
        #[snafu(implicit)]
        location: Location,
        topic: String,
    },
    #[snafu(display("Broker did not acknowledge the request for topic '{topic}' in time"))]
    AckTimeout {
        #[snafu(implicit)]
        location: Location,
        topic: String,
    },
    #[snafu(display("Connection to the broker was lost"))]
    Disconnected {
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Feed client error"))]
    Client {
        #[snafu(implicit)]
        location: Location,
        source: BoxedError,
    },
}

#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub))]
pub enum SpatialError {
    #[snafu(display("Latitude and longitude are required"))]
    MissingCoordinates {
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Invalid coordinates"))]
    InvalidCoordinates {
        #[snafu(implicit)]
        location: Location,
        source: CoordinatesError,
    },
    #[snafu(display("Query failed"))]
    QueryFailed {
        #[snafu(implicit)]
        location: Location,
        source: Error,
    },
}
