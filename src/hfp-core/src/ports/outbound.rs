use crate::*;
use async_trait::async_trait;

#[async_trait]
pub trait VehiclePositionOutbound: Send + Sync {
    async fn closest_vehicles(
        &self,
        point: &Coordinates,
        limit: u32,
    ) -> CoreResult<Vec<ClosestVehicle>>;
    /// Like `closest_vehicles` but only the nearest observation of each vehicle is considered.
    async fn unique_closest_vehicles(
        &self,
        point: &Coordinates,
        limit: u32,
    ) -> CoreResult<Vec<ClosestVehicle>>;
    async fn max_speeds_near_point(
        &self,
        query: &MaxSpeedQuery,
    ) -> CoreResult<Vec<MaxSpeedNearPoint>>;
    async fn average_speed_per_route(&self) -> CoreResult<Vec<RouteAverageSpeed>>;
}
