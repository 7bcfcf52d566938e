use chrono::{DateTime, Utc};
use hfp_core::{RouteId, VehicleId};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct VehiclePosition {
    pub vehicle_position_id: i64,
    pub route_number: RouteId,
    pub vehicle_number: VehicleId,
    pub timestamp: DateTime<Utc>,
    pub speed: f64,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, FromRow)]
pub struct ClosestVehicle {
    #[sqlx(flatten)]
    pub position: VehiclePosition,
    pub distance: f64,
}

#[derive(Debug, Clone, FromRow)]
pub struct MaxSpeedNearPoint {
    pub route_number: RouteId,
    pub vehicle_number: VehicleId,
    pub max_speed: f64,
    pub milliseconds_ago: i64,
    pub distance: f64,
}

#[derive(Debug, Clone, FromRow)]
pub struct RouteAverageSpeed {
    pub route_number: RouteId,
    pub average_speed: f64,
}

impl From<VehiclePosition> for hfp_core::VehiclePosition {
    fn from(v: VehiclePosition) -> Self {
        let VehiclePosition {
            vehicle_position_id,
            route_number,
            vehicle_number,
            timestamp,
            speed,
            latitude,
            longitude,
        } = v;

        hfp_core::VehiclePosition {
            id: vehicle_position_id,
            route_id: route_number,
            vehicle_id: vehicle_number,
            observed_at: timestamp,
            speed,
            latitude,
            longitude,
        }
    }
}

impl From<ClosestVehicle> for hfp_core::ClosestVehicle {
    fn from(v: ClosestVehicle) -> Self {
        hfp_core::ClosestVehicle {
            position: v.position.into(),
            distance: v.distance,
        }
    }
}

impl From<MaxSpeedNearPoint> for hfp_core::MaxSpeedNearPoint {
    fn from(v: MaxSpeedNearPoint) -> Self {
        let MaxSpeedNearPoint {
            route_number,
            vehicle_number,
            max_speed,
            milliseconds_ago,
            distance,
        } = v;

        hfp_core::MaxSpeedNearPoint {
            route_id: route_number,
            vehicle_id: vehicle_number,
            max_speed,
            milliseconds_ago,
            distance,
        }
    }
}

impl From<RouteAverageSpeed> for hfp_core::RouteAverageSpeed {
    fn from(v: RouteAverageSpeed) -> Self {
        hfp_core::RouteAverageSpeed {
            route_id: v.route_number,
            average_speed: v.average_speed,
        }
    }
}
