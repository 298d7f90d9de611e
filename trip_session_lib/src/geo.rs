use geo_types::Point;

pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance between two positions in meters, Haversine formula.
/// Positions are (lng, lat) points in degrees.
pub fn haversine_meters(a: Point, b: Point) -> f64 {
    let lat_a = a.y().to_radians();
    let lat_b = b.y().to_radians();
    let d_lat = (b.y() - a.y()).to_radians();
    let d_lng = (b.x() - a.x()).to_radians();

    let s = (d_lat / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);

    // Clamp guards against rounding pushing s just past 1.0 for antipodal points
    let c = 2.0 * s.sqrt().min(1.0).asin();

    EARTH_RADIUS_METERS * c
}
