use std::io;

use actix_web::{HttpResponse, ResponseError, body::BoxBody, http::StatusCode};
use hfp_consumer::SessionError;
use hfp_core::SpatialError;
use serde::{Deserialize, Serialize};
use snafu::{Location, Snafu};
use strum::Display;
use tracing::error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum ApiError {
    InvalidDuration,
    SubscriptionFailed,
    UnsubscriptionFailed,
    MissingCoordinates,
    InvalidCoordinates,
    QueryFailed,
    InternalServerError,
}

impl std::error::Error for ApiError {}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ApiError,
    pub description: String,
}

impl ApiError {
    pub fn description(&self) -> &'static str {
        match self {
            ApiError::InvalidDuration => "duration must be a positive number of seconds",
            ApiError::SubscriptionFailed => "failed to subscribe to the vehicle position feed",
            ApiError::UnsubscriptionFailed => {
                "failed to unsubscribe from the vehicle position feed"
            }
            ApiError::MissingCoordinates => "latitude and longitude are required",
            ApiError::InvalidCoordinates => {
                "latitude must be within [-90, 90] and longitude within [-180, 180]"
            }
            ApiError::QueryFailed | ApiError::InternalServerError => {
                "an internal server error occured"
            }
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidDuration
            | ApiError::MissingCoordinates
            | ApiError::InvalidCoordinates => StatusCode::BAD_REQUEST,
            ApiError::SubscriptionFailed
            | ApiError::UnsubscriptionFailed
            | ApiError::QueryFailed
            | ApiError::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse<BoxBody> {
        let error = ErrorResponse {
            error: *self,
            description: self.description().to_string(),
        };
        HttpResponse::build(self.status_code()).json(&error)
    }
}

impl From<SessionError> for ApiError {
    fn from(value: SessionError) -> Self {
        match value {
            SessionError::InvalidDuration { .. } => ApiError::InvalidDuration,
            SessionError::SubscriptionFailed { .. } => {
                error!("ingestion session failed: {value:?}");
                ApiError::SubscriptionFailed
            }
            SessionError::UnsubscriptionFailed { .. } => {
                error!("ingestion session failed: {value:?}");
                ApiError::UnsubscriptionFailed
            }
            SessionError::SessionTask { .. } => {
                error!("ingestion session failed: {value:?}");
                ApiError::InternalServerError
            }
        }
    }
}

impl From<SpatialError> for ApiError {
    fn from(value: SpatialError) -> Self {
        match value {
            SpatialError::MissingCoordinates { .. } => ApiError::MissingCoordinates,
            SpatialError::InvalidCoordinates { .. } => ApiError::InvalidCoordinates,
            SpatialError::QueryFailed { .. } => {
                error!("spatial query failed: {value:?}");
                ApiError::QueryFailed
            }
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub))]
pub enum StartupError {
    #[snafu(display("Failed to bind the listener"))]
    Listener {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        error: io::Error,
    },
    #[snafu(display("Failed to set up the database"))]
    Database {
        #[snafu(implicit)]
        location: Location,
        source: postgres::Error,
    },
}
