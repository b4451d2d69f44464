//! Synthetic field builders shared by integration tests and the demo
//! data generator binary. Not compiled into the library's public API
//! surface beyond what tests need.

use crate::field::{FieldAdapter, Pipeline};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Builds a regular lat/lon grid centered on `center_lat`/`center_lon`
/// spanning `n_lat` x `n_lon` cells at 0.25 degree resolution, filled
/// by `value_at(i, j)`.
pub fn build_field(
    center_lat: f64,
    center_lon: f64,
    n_lat: usize,
    n_lon: usize,
    mut value_at: impl FnMut(usize, usize) -> i16,
) -> FieldAdapter {
    let half_lat = (n_lat as f64 - 1.0) * 0.25 / 2.0;
    let half_lon = (n_lon as f64 - 1.0) * 0.25 / 2.0;
    let lats: Vec<f64> = (0..n_lat)
        .map(|i| center_lat + half_lat - i as f64 * 0.25)
        .collect();
    let lons: Vec<f64> = (0..n_lon)
        .map(|j| center_lon - half_lon + j as f64 * 0.25)
        .collect();

    let mut data = Vec::with_capacity(n_lat * n_lon);
    for i in 0..n_lat {
        for j in 0..n_lon {
            data.push(value_at(i, j));
        }
    }

    FieldAdapter::new(lats, lons, 1, data, 1.0, 0.0, Pipeline::Geopotential).unwrap()
}

/// A synthetic geopotential-height-like field with a single Gaussian
/// high pressure cell and two Gaussian lows, seeded so tests exercising
/// the full detector/cluster/summarize/formation pipeline are
/// deterministic.
pub fn synthetic_omega_field(n_lat: usize, n_lon: usize) -> FieldAdapter {
    let mut rng = StdRng::seed_from_u64(7);
    let high_center = (n_lat / 4, n_lon / 2);
    let low_centers = [(3 * n_lat / 4, n_lon / 4), (3 * n_lat / 4, 3 * n_lon / 4)];

    build_field(55.0, 0.0, n_lat, n_lon, |i, j| {
        let noise = rng.random_range(-1.0..1.0);
        let mut z = 5000.0;
        z += 400.0 * gaussian_bump(i, j, high_center, 6.0);
        for &c in &low_centers {
            z -= 400.0 * gaussian_bump(i, j, c, 6.0);
        }
        (z + noise) as i16
    })
}

fn gaussian_bump(i: usize, j: usize, center: (usize, usize), sigma: f64) -> f64 {
    let di = i as f64 - center.0 as f64;
    let dj = j as f64 - center.1 as f64;
    (-(di * di + dj * dj) / (2.0 * sigma * sigma)).exp()
}
