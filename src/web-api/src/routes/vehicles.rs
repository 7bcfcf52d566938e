use actix_web::web::{self, Query};
use chrono::{DateTime, Utc};
use hfp_core::{ClosestVehiclesQuery, RouteId, SpatialQueryEngine, VehicleId};
use serde::{Deserialize, Serialize};

use crate::{Database, error::ApiError, response::Response};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ClosestParameters {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    /// Number of rows to return, defaults to three.
    pub n: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosestVehicle {
    pub route_number: RouteId,
    pub vehicle_number: VehicleId,
    pub timestamp: DateTime<Utc>,
    pub speed: f64,
    pub latitude: f64,
    pub longitude: f64,
    /// Meters from the requested point.
    pub distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetroMaxSpeed {
    pub route_number: RouteId,
    pub vehicle_number: VehicleId,
    pub max_speed: f64,
    pub milliseconds_ago: i64,
    pub distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteAverageSpeed {
    pub route_number: RouteId,
    pub average_speed: f64,
}

#[tracing::instrument(skip(engine))]
pub async fn closest<T: Database>(
    engine: web::Data<SpatialQueryEngine<T>>,
    params: Query<ClosestParameters>,
) -> Result<Response<Vec<ClosestVehicle>>, ApiError> {
    let query = params.to_query()?;

    let vehicles = engine.closest(&query).await?;

    Ok(Response::new(
        vehicles.into_iter().map(ClosestVehicle::from).collect(),
    ))
}

#[tracing::instrument(skip(engine))]
pub async fn unique_closest<T: Database>(
    engine: web::Data<SpatialQueryEngine<T>>,
    params: Query<ClosestParameters>,
) -> Result<Response<Vec<ClosestVehicle>>, ApiError> {
    let query = params.to_query()?;

    let vehicles = engine.unique_closest(&query).await?;

    Ok(Response::new(
        vehicles.into_iter().map(ClosestVehicle::from).collect(),
    ))
}

#[tracing::instrument(skip(engine))]
pub async fn metro_max_speeds<T: Database>(
    engine: web::Data<SpatialQueryEngine<T>>,
) -> Result<Response<Vec<MetroMaxSpeed>>, ApiError> {
    let speeds = engine.metro_max_speeds(Utc::now()).await?;

    Ok(Response::new(
        speeds.into_iter().map(MetroMaxSpeed::from).collect(),
    ))
}

#[tracing::instrument(skip(engine))]
pub async fn average_speed<T: Database>(
    engine: web::Data<SpatialQueryEngine<T>>,
) -> Result<Response<Vec<RouteAverageSpeed>>, ApiError> {
    let speeds = engine.average_speed_per_route().await?;

    Ok(Response::new(
        speeds.into_iter().map(RouteAverageSpeed::from).collect(),
    ))
}

impl ClosestParameters {
    fn to_query(&self) -> Result<ClosestVehiclesQuery, ApiError> {
        Ok(ClosestVehiclesQuery::from_params(
            self.latitude.as_deref(),
            self.longitude.as_deref(),
            self.n.as_deref(),
        )?)
    }
}

impl From<hfp_core::ClosestVehicle> for ClosestVehicle {
    fn from(value: hfp_core::ClosestVehicle) -> Self {
        let hfp_core::ClosestVehicle { position, distance } = value;

        Self {
            route_number: position.route_id,
            vehicle_number: position.vehicle_id,
            timestamp: position.observed_at,
            speed: position.speed,
            latitude: position.latitude,
            longitude: position.longitude,
            distance,
        }
    }
}

impl From<hfp_core::MaxSpeedNearPoint> for MetroMaxSpeed {
    fn from(value: hfp_core::MaxSpeedNearPoint) -> Self {
        let hfp_core::MaxSpeedNearPoint {
            route_id,
            vehicle_id,
            max_speed,
            milliseconds_ago,
            distance,
        } = value;

        Self {
            route_number: route_id,
            vehicle_number: vehicle_id,
            max_speed,
            milliseconds_ago,
            distance,
        }
    }
}

impl From<hfp_core::RouteAverageSpeed> for RouteAverageSpeed {
    fn from(value: hfp_core::RouteAverageSpeed) -> Self {
        Self {
            route_number: value.route_id,
            average_speed: value.average_speed,
        }
    }
}
