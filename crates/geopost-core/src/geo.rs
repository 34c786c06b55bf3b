//! Geodesic helpers over the `geo` crate.

use geo::{Destination, Distance as _, Haversine, Point};

use crate::models::{Distance, Location};

/// Slack applied to radius comparisons, absorbing float drift from unit conversion
const RADIUS_EPSILON_METERS: f64 = 1e-6;

fn to_point(location: &Location) -> Point {
    Point::new(location.lon, location.lat)
}

/// Great-circle distance in meters between two locations
pub fn distance_meters(a: &Location, b: &Location) -> f64 {
    Haversine.distance(to_point(a), to_point(b))
}

/// Whether `point` lies within `radius` of `center` (boundary inclusive)
pub fn within_radius(point: &Location, center: &Location, radius: &Distance) -> bool {
    distance_meters(point, center) <= radius.to_meters() + RADIUS_EPSILON_METERS
}

/// Location reached by travelling `meters` from `origin` along `bearing` (degrees from north)
pub fn destination(origin: &Location, bearing: f64, meters: f64) -> Location {
    let p = Haversine.destination(to_point(origin), bearing, meters);
    Location { lat: p.y(), lon: p.x() }
}
