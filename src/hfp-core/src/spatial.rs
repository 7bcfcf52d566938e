use std::{cmp::Ordering, collections::HashMap};

use chrono::{DateTime, Utc};
use snafu::ResultExt;
use tracing::{error, instrument};

use crate::{
    ClosestVehicle, ClosestVehiclesQuery, MaxSpeedNearPoint, MaxSpeedQuery, RouteAverageSpeed,
    SpatialError, VehicleId, VehiclePositionOutbound, spatial_error::QueryFailedSnafu,
};

pub type SpatialResult<T> = std::result::Result<T, SpatialError>;

/// Answers proximity and aggregate queries against the stored positions.
///
/// The store is responsible for computing distances, the engine guarantees the ordering, the
/// per-vehicle deduplication and the result limits regardless of what the store returns.
/// Rows at equal distance are ordered by vehicle id, then route id, then newest observation first.
#[derive(Debug, Clone)]
pub struct SpatialQueryEngine<T> {
    store: T,
}

impl<T: VehiclePositionOutbound> SpatialQueryEngine<T> {
    pub fn new(store: T) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &T {
        &self.store
    }

    #[instrument(skip(self))]
    pub async fn closest(&self, query: &ClosestVehiclesQuery) -> SpatialResult<Vec<ClosestVehicle>> {
        let mut vehicles = self
            .store
            .closest_vehicles(&query.point, query.limit)
            .await
            .inspect_err(|e| error!("failed to retrieve closest vehicles: {e:?}"))
            .context(QueryFailedSnafu)?;

        sort_by_distance(&mut vehicles);
        vehicles.truncate(query.limit as usize);

        Ok(vehicles)
    }

    #[instrument(skip(self))]
    pub async fn unique_closest(
        &self,
        query: &ClosestVehiclesQuery,
    ) -> SpatialResult<Vec<ClosestVehicle>> {
        let vehicles = self
            .store
            .unique_closest_vehicles(&query.point, query.limit)
            .await
            .inspect_err(|e| error!("failed to retrieve unique closest vehicles: {e:?}"))
            .context(QueryFailedSnafu)?;

        let mut vehicles = nearest_per_vehicle(vehicles);
        vehicles.truncate(query.limit as usize);

        Ok(vehicles)
    }

    /// Max speeds of metro vehicles near the fixed reference point.
    pub async fn metro_max_speeds(
        &self,
        evaluated_at: DateTime<Utc>,
    ) -> SpatialResult<Vec<MaxSpeedNearPoint>> {
        self.max_speeds_near_point(&MaxSpeedQuery::metro(evaluated_at))
            .await
    }

    #[instrument(skip(self))]
    pub async fn max_speeds_near_point(
        &self,
        query: &MaxSpeedQuery,
    ) -> SpatialResult<Vec<MaxSpeedNearPoint>> {
        let mut speeds = self
            .store
            .max_speeds_near_point(query)
            .await
            .inspect_err(|e| error!("failed to retrieve max speeds: {e:?}"))
            .context(QueryFailedSnafu)?;

        speeds.sort_by(|a, b| {
            b.max_speed
                .total_cmp(&a.max_speed)
                .then_with(|| a.distance.total_cmp(&b.distance))
                .then_with(|| a.vehicle_id.cmp(&b.vehicle_id))
                .then_with(|| a.route_id.cmp(&b.route_id))
        });

        Ok(speeds)
    }

    #[instrument(skip(self))]
    pub async fn average_speed_per_route(&self) -> SpatialResult<Vec<RouteAverageSpeed>> {
        let mut speeds = self
            .store
            .average_speed_per_route()
            .await
            .inspect_err(|e| error!("failed to retrieve average speeds: {e:?}"))
            .context(QueryFailedSnafu)?;

        speeds.sort_by(|a, b| a.route_id.cmp(&b.route_id));

        Ok(speeds)
    }
}

pub fn compare_by_distance(a: &ClosestVehicle, b: &ClosestVehicle) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then_with(|| a.position.vehicle_id.cmp(&b.position.vehicle_id))
        .then_with(|| a.position.route_id.cmp(&b.position.route_id))
        .then_with(|| b.position.observed_at.cmp(&a.position.observed_at))
}

pub fn sort_by_distance(vehicles: &mut [ClosestVehicle]) {
    vehicles.sort_by(compare_by_distance);
}

/// Keeps the nearest observation of each vehicle, ordered by distance.
pub fn nearest_per_vehicle(
    vehicles: impl IntoIterator<Item = ClosestVehicle>,
) -> Vec<ClosestVehicle> {
    let mut nearest: HashMap<VehicleId, ClosestVehicle> = HashMap::new();

    for v in vehicles {
        match nearest.get(&v.position.vehicle_id) {
            Some(current) if compare_by_distance(current, &v) != Ordering::Greater => (),
            _ => {
                nearest.insert(v.position.vehicle_id.clone(), v);
            }
        }
    }

    let mut vehicles: Vec<ClosestVehicle> = nearest.into_values().collect();
    sort_by_distance(&mut vehicles);
    vehicles
}
