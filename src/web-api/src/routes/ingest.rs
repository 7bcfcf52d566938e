use actix_web::web::{self, Query};
use hfp_consumer::{Ingestor, SessionReport};
use hfp_core::FeedClient;
use serde::{Deserialize, Serialize};

use crate::{Database, error::ApiError, response::Response};

pub const INGEST_COMPLETE_MESSAGE: &str = "Data ingestion complete";

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct IngestParameters {
    /// Window length in seconds, defaults to ten seconds.
    pub duration: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestResponse {
    pub message: String,
    pub duration_seconds: f64,
    pub received: u64,
    pub stored: u64,
    pub rejected: u64,
    pub failed_writes: u64,
}

#[tracing::instrument(skip(ingestor))]
pub async fn ingest<T, F>(
    ingestor: web::Data<Ingestor<T, F>>,
    params: Query<IngestParameters>,
) -> Result<Response<IngestResponse>, ApiError>
where
    T: Database,
    F: FeedClient + 'static,
{
    let report = ingestor.ingest(params.duration.as_deref()).await?;
    Ok(Response::new(IngestResponse::from(report)))
}

impl From<SessionReport> for IngestResponse {
    fn from(value: SessionReport) -> Self {
        let SessionReport {
            duration,
            received,
            stored,
            rejected,
            failed_writes,
        } = value;

        Self {
            message: INGEST_COMPLETE_MESSAGE.to_string(),
            duration_seconds: duration.as_secs_f64(),
            received,
            stored,
            rejected,
            failed_writes,
        }
    }
}
