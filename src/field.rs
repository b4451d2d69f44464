use crate::error::{DetectError, Result};

/// Standard gravity, m/s^2. Divides geopotential to yield geopotential height.
pub const G0: f64 = 9.80665;

/// Which physical variable the field holds. The temperature pipeline
/// replaces the MAX/MIN bearing-poll classification with a single
/// threshold test (see `detect::classify_temperature`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipeline {
    Geopotential,
    Temperature,
}

impl Pipeline {
    pub fn from_variable_name(name: &str) -> Result<Self> {
        match name {
            "z" => Ok(Pipeline::Geopotential),
            "t" => Ok(Pipeline::Temperature),
            other => Err(DetectError::Format(format!(
                "unrecognized data variable '{}', expected 'z' or 't'",
                other
            ))),
        }
    }
}

/// A thin indexed view over a single time slice of the field buffer.
/// Computes offsets from (i, j) rather than overlaying pointer fans
/// (see DESIGN.md, "contiguous 3D array").
pub struct FieldView<'a> {
    pub n_lat: usize,
    pub n_lon: usize,
    slice: &'a [i16],
}

impl<'a> FieldView<'a> {
    pub fn get(&self, i: usize, j: usize) -> i16 {
        self.slice[i * self.n_lon + j]
    }

    pub fn row(&self, i: usize) -> &[i16] {
        &self.slice[i * self.n_lon..(i + 1) * self.n_lon]
    }
}

/// Owns the full time series field buffer and its axes for the run.
/// Read-only after `load`/`normalize_longitude` complete; shared freely
/// (via `Arc`) across worker threads during detection.
pub struct FieldAdapter {
    pub n_time: usize,
    pub n_lat: usize,
    pub n_lon: usize,
    pub lats: Vec<f64>,
    pub lons: Vec<f64>,
    pub scale_factor: f64,
    pub add_offset: f64,
    pub pipeline: Pipeline,
    data: Vec<i16>,
}

impl FieldAdapter {
    /// Builds an adapter from raw axes and data, normalizing the
    /// longitude axis into [-180, 180) as a side effect (see
    /// `normalize_longitude`).
    pub fn new(
        lats: Vec<f64>,
        lons: Vec<f64>,
        n_time: usize,
        data: Vec<i16>,
        scale_factor: f64,
        add_offset: f64,
        pipeline: Pipeline,
    ) -> Result<Self> {
        let n_lat = lats.len();
        let n_lon = lons.len();
        if data.len() != n_time * n_lat * n_lon {
            return Err(DetectError::Format(format!(
                "data length {} does not match time*lat*lon = {}",
                data.len(),
                n_time * n_lat * n_lon
            )));
        }

        let mut adapter = FieldAdapter {
            n_time,
            n_lat,
            n_lon,
            lats,
            lons,
            scale_factor,
            add_offset,
            pipeline,
            data,
        };
        adapter.normalize_longitude()?;
        Ok(adapter)
    }

    pub fn view(&self, t: usize) -> FieldView<'_> {
        let start = t * self.n_lat * self.n_lon;
        let end = start + self.n_lat * self.n_lon;
        FieldView {
            n_lat: self.n_lat,
            n_lon: self.n_lon,
            slice: &self.data[start..end],
        }
    }

    pub fn to_physical(&self, raw: i32) -> f64 {
        raw as f64 * self.scale_factor + self.add_offset
    }

    pub fn to_height(&self, raw: i32) -> f64 {
        self.to_physical(raw) / G0
    }

    /// Verifies the longitude axis is monotonically increasing; if its
    /// range extends past 180 degrees, rotates the axis and every
    /// (t, i, *) row of the field buffer by swapping the two halves so
    /// the axis ends up strictly increasing in [-180, 180). The new
    /// buffer is built in full before it replaces the old one, so a
    /// panic mid-rotation leaves the original field untouched.
    fn normalize_longitude(&mut self) -> Result<()> {
        for w in self.lons.windows(2) {
            if w[1] <= w[0] {
                return Err(DetectError::Format(
                    "longitude axis is not strictly increasing".to_string(),
                ));
            }
        }

        let max_lon = *self.lons.last().unwrap();
        if max_lon <= 180.0 {
            return Ok(());
        }

        let split = self
            .lons
            .iter()
            .position(|&lon| lon >= 180.0)
            .unwrap_or(self.lons.len());

        let mut new_lons = Vec::with_capacity(self.n_lon);
        new_lons.extend(self.lons[split..].iter().map(|lon| lon - 360.0));
        new_lons.extend_from_slice(&self.lons[..split]);

        let mut new_data = vec![0i16; self.data.len()];
        for t in 0..self.n_time {
            for i in 0..self.n_lat {
                let row_start = (t * self.n_lat + i) * self.n_lon;
                let old_row = &self.data[row_start..row_start + self.n_lon];
                let new_row = &mut new_data[row_start..row_start + self.n_lon];

                let right_len = self.n_lon - split;
                new_row[..right_len].copy_from_slice(&old_row[split..]);
                new_row[right_len..].copy_from_slice(&old_row[..split]);
            }
        }

        self.lons = new_lons;
        self.data = new_data;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(lons: Vec<f64>, row: Vec<i16>) -> FieldAdapter {
        FieldAdapter::new(vec![10.0, 0.0], lons, 1, [row.clone(), row].concat(), 1.0, 0.0, Pipeline::Geopotential)
            .unwrap()
    }

    #[test]
    fn rotation_is_idempotent() {
        let lons: Vec<f64> = (0..1440).map(|j| j as f64 * 0.25).collect();
        let row: Vec<i16> = (0..1440).map(|j| j as i16).collect();
        let once = build(lons, row);
        assert!(once.lons[0] < -179.0);
        assert!(*once.lons.last().unwrap() < 180.0);

        // Re-running construction on the already-normalized axis/data must
        // be a no-op: the max longitude is already <= 180.
        let row_again: Vec<i16> = once.view(0).row(0).to_vec();
        let twice = build(once.lons.clone(), row_again);
        assert_eq!(once.lons, twice.lons);
    }

    #[test]
    fn rotation_preserves_column_correspondence() {
        // S3: axis [0, 0.25, ..., 359.75], field value = lon index.
        let lons: Vec<f64> = (0..1440).map(|j| j as f64 * 0.25).collect();
        let row: Vec<i16> = (0..1440).map(|j| j as i16).collect();
        let adapter = build(lons, row);

        assert!((adapter.lons[0] - (-180.0)).abs() < 1e-9);
        let view = adapter.view(0);
        // New column for lon -180 must equal the original column for lon 180 (index 720).
        assert_eq!(view.get(0, 0), 720);
    }

    #[test]
    fn rejects_non_monotone_axis() {
        let lons = vec![0.0, 0.5, 0.25];
        let row = vec![0i16; 3];
        let err = FieldAdapter::new(vec![0.0], lons, 1, row, 1.0, 0.0, Pipeline::Geopotential);
        assert!(err.is_err());
    }

    #[test]
    fn to_height_divides_physical_value_by_g0() {
        let adapter = build(vec![0.0, 1.0], vec![0, 0]);
        let physical = adapter.to_physical(100);
        assert!((adapter.to_height(100) - physical / G0).abs() < 1e-9);
    }
}
