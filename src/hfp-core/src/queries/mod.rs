use chrono::{DateTime, Utc};
use snafu::{OptionExt, ResultExt};

use crate::{
    Coordinates, RouteId, SpatialError,
    spatial_error::{InvalidCoordinatesSnafu, MissingCoordinatesSnafu},
};

pub const DEFAULT_CLOSEST_LIMIT: u32 = 3;
pub const MAX_CLOSEST_LIMIT: u32 = 1000;

pub const METRO_ROUTES: [&str; 2] = ["M1", "M2"];
pub const METRO_REFERENCE_LATITUDE: f64 = 60.192059;
pub const METRO_REFERENCE_LONGITUDE: f64 = 24.945831;
pub const METRO_SEARCH_RADIUS_METERS: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ClosestVehiclesQuery {
    pub point: Coordinates,
    pub limit: u32,
}

/// Max speed per observation of the given routes within `radius_meters` of `point`.
#[derive(Debug, Clone, PartialEq)]
pub struct MaxSpeedQuery {
    pub point: Coordinates,
    pub radius_meters: f64,
    pub routes: Vec<RouteId>,
    /// Instant the age of each observation is measured from.
    pub evaluated_at: DateTime<Utc>,
}

impl ClosestVehiclesQuery {
    /// Builds a query from raw request parameters.
    /// Coordinates that are absent or not numbers are treated as missing, the limit falls back to
    /// `DEFAULT_CLOSEST_LIMIT` when it is absent, not a number or below one.
    pub fn from_params(
        latitude: Option<&str>,
        longitude: Option<&str>,
        limit: Option<&str>,
    ) -> Result<ClosestVehiclesQuery, SpatialError> {
        let latitude = latitude
            .and_then(parse_finite)
            .context(MissingCoordinatesSnafu)?;
        let longitude = longitude
            .and_then(parse_finite)
            .context(MissingCoordinatesSnafu)?;

        let point = Coordinates::new(latitude, longitude).context(InvalidCoordinatesSnafu)?;

        Ok(ClosestVehiclesQuery {
            point,
            limit: parse_limit(limit),
        })
    }
}

impl MaxSpeedQuery {
    pub fn metro(evaluated_at: DateTime<Utc>) -> MaxSpeedQuery {
        MaxSpeedQuery {
            point: Coordinates::new_unchecked(METRO_REFERENCE_LATITUDE, METRO_REFERENCE_LONGITUDE),
            radius_meters: METRO_SEARCH_RADIUS_METERS,
            routes: METRO_ROUTES
                .iter()
                .filter_map(|r| RouteId::new(*r).ok())
                .collect(),
            evaluated_at,
        }
    }
}

fn parse_finite(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_limit(value: Option<&str>) -> u32 {
    match value.and_then(|v| v.trim().parse::<i64>().ok()) {
        Some(v) if v >= 1 => v.min(MAX_CLOSEST_LIMIT as i64) as u32,
        _ => DEFAULT_CLOSEST_LIMIT,
    }
}
