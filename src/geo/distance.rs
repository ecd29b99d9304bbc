//! Great-circle distance between two points on Earth

/// Mean Earth radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometers between two (latitude, longitude)
/// pairs, using the haversine formula.
///
/// Pure and deterministic: symmetric in its arguments, and zero for
/// identical coordinates. All finite in-range inputs are valid; range
/// checking is the caller's contract.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, lambda1) = (lat1.to_radians(), lon1.to_radians());
    let (phi2, lambda2) = (lat2.to_radians(), lon2.to_radians());

    let dphi = phi2 - phi1;
    let dlambda = lambda2 - lambda1;

    let hav = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    let angle = 2.0 * hav.sqrt().atan2((1.0 - hav).sqrt());

    EARTH_RADIUS_KM * angle
}
