use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Coordinates, IdentifierError, identifier_error::EmptySnafu};

/// Designation of a service line, e.g. a tram, metro or bus route code.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(transparent))]
#[serde(try_from = "String", into = "String")]
pub struct RouteId(String);

/// Vehicle number, unique within an operator but not globally.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(transparent))]
#[serde(try_from = "String", into = "String")]
pub struct VehicleId(String);

/// A validated position report that has not yet been stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVehiclePosition {
    pub route_id: RouteId,
    pub vehicle_id: VehicleId,
    /// When the vehicle reported the position, not when we received it.
    pub observed_at: DateTime<Utc>,
    pub speed: f64,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VehiclePosition {
    pub id: i64,
    pub route_id: RouteId,
    pub vehicle_id: VehicleId,
    pub observed_at: DateTime<Utc>,
    pub speed: f64,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosestVehicle {
    pub position: VehiclePosition,
    /// Geodesic distance to the query point in meters.
    pub distance: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaxSpeedNearPoint {
    pub route_id: RouteId,
    pub vehicle_id: VehicleId,
    pub max_speed: f64,
    pub milliseconds_ago: i64,
    pub distance: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteAverageSpeed {
    pub route_id: RouteId,
    pub average_speed: f64,
}

macro_rules! identifier {
    ($name:ident) => {
        impl $name {
            pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
                let value = value.into();
                if value.trim().is_empty() {
                    EmptySnafu.fail()
                } else {
                    Ok(Self(value))
                }
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdentifierError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

identifier!(RouteId);
identifier!(VehicleId);

impl NewVehiclePosition {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new_unchecked(self.latitude, self.longitude)
    }
}

impl VehiclePosition {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new_unchecked(self.latitude, self.longitude)
    }

    pub fn from_new(id: i64, value: NewVehiclePosition) -> VehiclePosition {
        let NewVehiclePosition {
            route_id,
            vehicle_id,
            observed_at,
            speed,
            latitude,
            longitude,
        } = value;

        VehiclePosition {
            id,
            route_id,
            vehicle_id,
            observed_at,
            speed,
            latitude,
            longitude,
        }
    }
}

impl PartialEq<NewVehiclePosition> for VehiclePosition {
    fn eq(&self, other: &NewVehiclePosition) -> bool {
        self.route_id == other.route_id
            && self.vehicle_id == other.vehicle_id
            && self.observed_at.timestamp_millis() == other.observed_at.timestamp_millis()
            && self.speed == other.speed
            && self.latitude == other.latitude
            && self.longitude == other.longitude
    }
}

impl PartialEq<VehiclePosition> for NewVehiclePosition {
    fn eq(&self, other: &VehiclePosition) -> bool {
        other.eq(self)
    }
}

#[cfg(feature = "test")]
mod test {
    use super::*;

    impl NewVehiclePosition {
        pub fn test_default(
            route: &str,
            vehicle: &str,
            observed_at: DateTime<Utc>,
            latitude: f64,
            longitude: f64,
        ) -> NewVehiclePosition {
            NewVehiclePosition {
                route_id: RouteId::new(route).unwrap(),
                vehicle_id: VehicleId::new(vehicle).unwrap(),
                observed_at,
                speed: 10.0,
                latitude,
                longitude,
            }
        }

        pub fn with_speed(mut self, speed: f64) -> NewVehiclePosition {
            self.speed = speed;
            self
        }
    }
}
