use serde::{Deserialize, Serialize};

use crate::{CoordinatesError, coordinates_error::OutOfRangeSnafu, distance_meters};

pub const LATITUDE_RANGE: std::ops::RangeInclusive<f64> = -90.0..=90.0;
pub const LONGITUDE_RANGE: std::ops::RangeInclusive<f64> = -180.0..=180.0;

/// A WGS84 point with both components inside their geographic range.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Coordinates, CoordinatesError> {
        // `contains` is false for NaN so non-finite values are rejected here as well
        if LATITUDE_RANGE.contains(&latitude) && LONGITUDE_RANGE.contains(&longitude) {
            Ok(Coordinates {
                latitude,
                longitude,
            })
        } else {
            OutOfRangeSnafu {
                latitude,
                longitude,
            }
            .fail()
        }
    }

    pub(crate) fn new_unchecked(latitude: f64, longitude: f64) -> Coordinates {
        Coordinates {
            latitude,
            longitude,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Geodesic distance in meters.
    pub fn distance_to(&self, other: &Coordinates) -> f64 {
        distance_meters(self, other)
    }
}
