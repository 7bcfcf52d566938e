use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use snafu::{Location, ResultExt, Snafu};

use crate::{
    ClosestVehicle, Coordinates, CoreResult, MaxSpeedNearPoint, MaxSpeedQuery, NewVehiclePosition,
    RouteAverageSpeed, RouteId, VehicleId, VehiclePosition, VehiclePositionInbound,
    VehiclePositionOutbound, core_error::UnexpectedSnafu, nearest_per_vehicle, sort_by_distance,
};

#[derive(Debug, Snafu)]
enum StoreError {
    #[snafu(display("Store is unavailable"))]
    Unavailable {
        #[snafu(implicit)]
        location: Location,
    },
}

#[derive(Debug, Default)]
struct Inner {
    positions: Vec<VehiclePosition>,
    next_id: i64,
}

/// Store that keeps positions in memory and computes the same query semantics as the postgres
/// adapter.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Mutex<Inner>>,
    fail: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> InMemoryStore {
        InMemoryStore::default()
    }

    /// Makes every subsequent operation fail.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn all_positions(&self) -> Vec<VehiclePosition> {
        self.inner.lock().unwrap().positions.clone()
    }

    fn check(&self) -> CoreResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            UnavailableSnafu.fail().boxed().context(UnexpectedSnafu)
        } else {
            Ok(())
        }
    }

    fn with_distances(&self, point: &Coordinates) -> Vec<ClosestVehicle> {
        self.inner
            .lock()
            .unwrap()
            .positions
            .iter()
            .map(|p| ClosestVehicle {
                distance: p.coordinates().distance_to(point),
                position: p.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl VehiclePositionInbound for InMemoryStore {
    async fn add_vehicle_position(&self, position: &NewVehiclePosition) -> CoreResult<()> {
        self.check()?;

        let mut inner = self.inner.lock().unwrap();
        let exists = inner.positions.iter().any(|p| {
            p.route_id == position.route_id
                && p.vehicle_id == position.vehicle_id
                && p.observed_at == position.observed_at
        });

        if !exists {
            inner.next_id += 1;
            let id = inner.next_id;
            inner
                .positions
                .push(VehiclePosition::from_new(id, position.clone()));
        }

        Ok(())
    }
}

#[async_trait]
impl VehiclePositionOutbound for InMemoryStore {
    async fn closest_vehicles(
        &self,
        point: &Coordinates,
        limit: u32,
    ) -> CoreResult<Vec<ClosestVehicle>> {
        self.check()?;

        let mut vehicles = self.with_distances(point);
        sort_by_distance(&mut vehicles);
        vehicles.truncate(limit as usize);

        Ok(vehicles)
    }

    async fn unique_closest_vehicles(
        &self,
        point: &Coordinates,
        limit: u32,
    ) -> CoreResult<Vec<ClosestVehicle>> {
        self.check()?;

        let mut vehicles = nearest_per_vehicle(self.with_distances(point));
        vehicles.truncate(limit as usize);

        Ok(vehicles)
    }

    async fn max_speeds_near_point(
        &self,
        query: &MaxSpeedQuery,
    ) -> CoreResult<Vec<MaxSpeedNearPoint>> {
        self.check()?;

        let positions = self.inner.lock().unwrap().positions.clone();

        // (route, vehicle, observed_at, latitude bits, longitude bits)
        let mut groups: HashMap<_, MaxSpeedNearPoint> = HashMap::new();

        for p in positions
            .into_iter()
            .filter(|p| query.routes.contains(&p.route_id))
        {
            let distance = p.coordinates().distance_to(&query.point);
            if distance > query.radius_meters {
                continue;
            }

            let key = (
                p.route_id.clone(),
                p.vehicle_id.clone(),
                p.observed_at,
                p.latitude.to_bits(),
                p.longitude.to_bits(),
            );

            groups
                .entry(key)
                .and_modify(|g| g.max_speed = g.max_speed.max(p.speed))
                .or_insert_with(|| MaxSpeedNearPoint {
                    route_id: p.route_id.clone(),
                    vehicle_id: p.vehicle_id.clone(),
                    max_speed: p.speed,
                    milliseconds_ago: (query.evaluated_at - p.observed_at).num_milliseconds(),
                    distance,
                });
        }

        let mut speeds: Vec<MaxSpeedNearPoint> = groups.into_values().collect();
        speeds.sort_by(|a, b| b.max_speed.total_cmp(&a.max_speed));

        Ok(speeds)
    }

    async fn average_speed_per_route(&self) -> CoreResult<Vec<RouteAverageSpeed>> {
        self.check()?;

        let mut sums: HashMap<RouteId, (f64, u32)> = HashMap::new();
        for p in self.inner.lock().unwrap().positions.iter() {
            let entry = sums.entry(p.route_id.clone()).or_default();
            entry.0 += p.speed;
            entry.1 += 1;
        }

        let mut speeds: Vec<RouteAverageSpeed> = sums
            .into_iter()
            .map(|(route_id, (sum, count))| RouteAverageSpeed {
                route_id,
                average_speed: sum / count as f64,
            })
            .collect();
        speeds.sort_by(|a, b| a.route_id.cmp(&b.route_id));

        Ok(speeds)
    }
}

impl InMemoryStore {
    pub fn positions_of_vehicle(&self, vehicle_id: &VehicleId) -> Vec<VehiclePosition> {
        self.inner
            .lock()
            .unwrap()
            .positions
            .iter()
            .filter(|p| &p.vehicle_id == vehicle_id)
            .cloned()
            .collect()
    }
}
