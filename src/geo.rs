//! Great-circle distance between coordinate pairs, in miles.

/// Mean Earth radius in miles. All proximity queries use miles end to end.
pub const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Haversine distance between two points given in degrees, rounded to one
/// decimal place.
pub fn distance_miles(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    round_one_decimal(EARTH_RADIUS_MILES * c)
}

fn round_one_decimal(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
