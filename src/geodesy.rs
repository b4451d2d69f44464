use crate::field::FieldView;
use crate::models::GeoPoint;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Displaces `origin` by `distance_km` along the great circle at
/// `bearing_rad` (clockwise from north). Longitude is renormalized
/// into (-180, 180].
pub fn destination(origin: GeoPoint, distance_km: f64, bearing_rad: f64) -> GeoPoint {
    let lat1 = origin.lat.to_radians();
    let lon1 = origin.lon.to_radians();
    let delta = distance_km / EARTH_RADIUS_KM;

    let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * bearing_rad.cos()).asin();
    let lon2 = lon1
        + (bearing_rad.sin() * delta.sin() * lat1.cos())
            .atan2(delta.cos() - lat1.sin() * lat2.sin());

    GeoPoint::new(lat2.to_degrees(), normalize_lon_pm180(lon2.to_degrees()))
}

/// Renormalizes a longitude in degrees into (-180, 180].
fn normalize_lon_pm180(lon_deg: f64) -> f64 {
    let mut lon = lon_deg;
    while lon <= -180.0 {
        lon += 360.0;
    }
    while lon > 180.0 {
        lon -= 360.0;
    }
    lon
}

/// Great-circle distance between two points, in km. Used by the
/// clusterer's eps checks and by tests; not itself part of spec's
/// bearing-poll probe but the same spherical-trig family as
/// `destination`.
pub fn haversine_distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Locates the bracketing index pair `(lo, lo+1)` in `axis` such that
/// `axis[lo]` and `axis[lo+1]` straddle `value`, for a descending axis
/// (`axis[lo] >= value > axis[lo+1]`) or an ascending one
/// (`axis[lo] <= value < axis[lo+1]`). Returns `None` if `value` falls
/// outside the axis range.
fn bracket(axis: &[f64], value: f64, descending: bool) -> Option<(usize, f64)> {
    for lo in 0..axis.len().saturating_sub(1) {
        let (a, b) = (axis[lo], axis[lo + 1]);
        let inside = if descending {
            a >= value && value > b
        } else {
            a <= value && value < b
        };
        if inside {
            let frac = if descending {
                (a - value) / (a - b)
            } else {
                (value - a) / (b - a)
            };
            return Some((lo, frac));
        }
    }
    None
}

/// Bilinear interpolation of the field at `query`, against the regular
/// `lats`/`lons` axes. Returns `None` when the query lies outside the
/// valid axis range (replacing the source's `-1` sentinel, see
/// DESIGN.md). The blend is computed in `f64` and rounded toward zero.
pub fn bilinear_interpolate(
    view: &FieldView,
    lats: &[f64],
    lons: &[f64],
    query: GeoPoint,
) -> Option<i32> {
    let lat_descending = lats.len() >= 2 && lats[0] > lats[1];
    let (i, dlat) = bracket(lats, query.lat, lat_descending)?;
    let (j, dlon) = bracket(lons, query.lon, false)?;

    let v00 = view.get(i, j) as f64;
    let v01 = view.get(i, j + 1) as f64;
    let v10 = view.get(i + 1, j) as f64;
    let v11 = view.get(i + 1, j + 1) as f64;

    let top = v00 * (1.0 - dlon) + v01 * dlon;
    let bottom = v10 * (1.0 - dlon) + v11 * dlon;
    let blended = top * (1.0 - dlat) + bottom * dlat;

    Some(blended.trunc() as i32)
}
