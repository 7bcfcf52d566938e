use geoutils::Location;
use tracing::warn;

use crate::Coordinates;

/// Geodesic distance in meters between two points on the WGS84 ellipsoid.
/// Vincenty's formula does not converge for nearly antipodal points, for those we fall back to the
/// haversine distance.
pub fn distance_meters(from: &Coordinates, to: &Coordinates) -> f64 {
    let from = Location::new(from.latitude(), from.longitude());
    let to = Location::new(to.latitude(), to.longitude());

    match from.distance_to(&to) {
        Ok(distance) => distance.meters(),
        Err(e) => {
            warn!("falling back to haversine distance between {from:?} and {to:?}: {e}");
            from.haversine_distance_to(&to).meters()
        }
    }
}
