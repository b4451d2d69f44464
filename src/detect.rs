use crate::config::DetectorConfig;
use crate::field::{FieldAdapter, Pipeline};
use crate::geodesy::{bilinear_interpolate, destination};
use crate::models::{GeoPoint, PointKind, SelectedPoint};
use rayon::prelude::*;

/// A 2D grid of selected points over the subsampled (lat, lon) indices,
/// shape `(size_x, size_y)` with `size_x = ceil(n_lat/step)` rows and
/// `size_y = ceil(n_lon/step)` columns, stored row-major.
pub struct SelectedGrid {
    pub size_x: usize,
    pub size_y: usize,
    pub points: Vec<SelectedPoint>,
}

impl SelectedGrid {
    pub fn get(&self, x: usize, y: usize) -> &SelectedPoint {
        &self.points[x * self.size_y + y]
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut SelectedPoint {
        &mut self.points[x * self.size_y + y]
    }
}

fn ceil_div(a: usize, b: usize) -> usize {
    (a + b - 1) / b
}

/// Classifies one subsampled grid point by polling `2*n_bearings`
/// directions at `dist_km`, comparing the interpolated physical value
/// at each probe to the center value. A probe falling outside the
/// grid counts toward `ge` only (non-disqualifying for maxima).
fn classify_point(
    adapter: &FieldAdapter,
    t: usize,
    center: GeoPoint,
    center_raw: i16,
    config: &DetectorConfig,
) -> PointKind {
    let view = adapter.view(t);
    let center_value = adapter.to_physical(center_raw as i32);

    let mut ge = 0usize;
    let mut le = 0usize;
    let total_probes = 2 * config.n_bearings;

    for k in 0..total_probes {
        let bearing = config.bearing_start_rad + config.bearing_step_rad * k as f64;
        let probe = destination(center, config.dist_km, bearing);

        match bilinear_interpolate(&view, &adapter.lats, &adapter.lons, probe) {
            Some(raw) => {
                let value = adapter.to_physical(raw);
                if center_value >= value {
                    ge += 1;
                }
                if center_value <= value {
                    le += 1;
                }
            }
            None => ge += 1,
        }
    }

    let threshold = (total_probes as f64 * config.pass_percent).ceil() as usize;
    if ge >= threshold {
        PointKind::Max
    } else if le >= threshold {
        PointKind::Min
    } else {
        PointKind::None
    }
}

/// Runs the bearing-poll extremum detector over the geopotential field
/// at time step `t`. The inner loop is an embarrassingly parallel map
/// over subsampled grid cells (each writes a unique output cell from
/// read-only inputs), executed with rayon's work-stealing pool.
pub fn detect_extrema(adapter: &FieldAdapter, t: usize, config: &DetectorConfig) -> SelectedGrid {
    debug_assert_eq!(adapter.pipeline, Pipeline::Geopotential);

    let size_x = ceil_div(adapter.n_lat, config.step);
    let size_y = ceil_div(adapter.n_lon, config.step);
    let view = adapter.view(t);

    let points: Vec<SelectedPoint> = (0..size_x * size_y)
        .into_par_iter()
        .map(|idx| {
            let x = idx / size_y;
            let y = idx % size_y;
            let i = x * config.step;
            let j = y * config.step;
            let center = GeoPoint::new(adapter.lats[i], adapter.lons[j]);
            let raw = view.get(i, j);
            let kind = classify_point(adapter, t, center, raw, config);
            SelectedPoint::new(center, raw, kind)
        })
        .collect();

    SelectedGrid {
        size_x,
        size_y,
        points,
    }
}

/// Runs the single-threshold classifier for the temperature pipeline
/// (see SPEC_FULL §4.F): a point is `Max`-kind ("hot") iff its physical
/// value in Celsius exceeds `config.temperature_threshold_c`, else
/// `None`. There is no `Min` kind in this pipeline.
pub fn detect_hotspots(adapter: &FieldAdapter, t: usize, config: &DetectorConfig) -> SelectedGrid {
    debug_assert_eq!(adapter.pipeline, Pipeline::Temperature);

    let size_x = ceil_div(adapter.n_lat, config.step);
    let size_y = ceil_div(adapter.n_lon, config.step);
    let view = adapter.view(t);

    let points: Vec<SelectedPoint> = (0..size_x * size_y)
        .into_par_iter()
        .map(|idx| {
            let x = idx / size_y;
            let y = idx % size_y;
            let i = x * config.step;
            let j = y * config.step;
            let raw = view.get(i, j);
            let celsius = adapter.to_physical(raw as i32) - 273.15;
            let kind = if celsius > config.temperature_threshold_c {
                PointKind::Max
            } else {
                PointKind::None
            };
            SelectedPoint::new(GeoPoint::new(adapter.lats[i], adapter.lons[j]), raw, kind)
        })
        .collect();

    SelectedGrid {
        size_x,
        size_y,
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldAdapter;

    fn square_grid(lats_len: usize, lons_len: usize, values: impl Fn(usize, usize) -> i16) -> FieldAdapter {
        let lats: Vec<f64> = (0..lats_len).map(|i| 60.0 - i as f64 * 0.25).collect();
        let lons: Vec<f64> = (0..lons_len).map(|j| -10.0 + j as f64 * 0.25).collect();
        let mut data = Vec::with_capacity(lats_len * lons_len);
        for i in 0..lats_len {
            for j in 0..lons_len {
                data.push(values(i, j));
            }
        }
        FieldAdapter::new(lats, lons, 1, data, 1.0, 0.0, Pipeline::Geopotential).unwrap()
    }

    #[test]
    fn constant_field_classifies_every_point_max() {
        // S1: plateau, MAX wins ties.
        let adapter = square_grid(10, 10, |_, _| 0);
        let config = DetectorConfig {
            step: 1,
            dist_km: 27.75, // ~1 grid step at RES=0.25
            n_bearings: 8,
            ..DetectorConfig::default()
        };
        let grid = detect_extrema(&adapter, 0, &config);
        assert!(grid.points.iter().all(|p| p.kind == PointKind::Max));
    }

    #[test]
    fn single_paraboloid_maximum_is_isolated() {
        // S2: f(i,j) = -((i-5)^2 + (j-5)^2) on an 11x11 grid.
        let adapter = square_grid(11, 11, |i, j| {
            let di = i as i64 - 5;
            let dj = j as i64 - 5;
            -(di * di + dj * dj) as i16
        });
        let config = DetectorConfig {
            step: 1,
            dist_km: 27.75,
            n_bearings: 8,
            pass_percent: 0.75,
            ..DetectorConfig::default()
        };
        let grid = detect_extrema(&adapter, 0, &config);
        let maxima: Vec<_> = grid
            .points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.kind == PointKind::Max)
            .collect();
        assert_eq!(maxima.len(), 1);
        let (idx, _) = maxima[0];
        assert_eq!(idx / grid.size_y, 5);
        assert_eq!(idx % grid.size_y, 5);
    }

    #[test]
    fn additive_shift_does_not_change_classification() {
        let base = square_grid(11, 11, |i, j| {
            let di = i as i64 - 5;
            let dj = j as i64 - 5;
            -(di * di + dj * dj) as i16
        });
        let shifted = square_grid(11, 11, |i, j| {
            let di = i as i64 - 5;
            let dj = j as i64 - 5;
            1000 - (di * di + dj * dj) as i16
        });
        let config = DetectorConfig {
            step: 1,
            dist_km: 27.75,
            ..DetectorConfig::default()
        };
        let a = detect_extrema(&base, 0, &config);
        let b = detect_extrema(&shifted, 0, &config);
        for (pa, pb) in a.points.iter().zip(b.points.iter()) {
            assert_eq!(pa.kind, pb.kind);
        }
    }
}
