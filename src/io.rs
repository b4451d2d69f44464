use crate::error::{DetectError, Result};
use crate::field::{FieldAdapter, Pipeline};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// The contract the core needs from the gridded binary container (spec
/// §6): time/latitude/longitude axes, an `i16` data variable of shape
/// (time, lat, lon), `scale_factor`/`add_offset` attributes, and a
/// `long_name` attribute. Reading the real self-describing container
/// format is explicitly out of core scope (spec §1); this trait is the
/// seam a production adapter plugs into.
pub trait FieldSource {
    fn load(&self) -> Result<RawField>;
}

pub struct RawField {
    pub lats: Vec<f64>,
    pub lons: Vec<f64>,
    pub n_time: usize,
    pub data: Vec<i16>,
    pub scale_factor: f64,
    pub add_offset: f64,
    pub long_name: String,
    pub variable_name: String,
}

impl RawField {
    pub fn into_adapter(self) -> Result<(FieldAdapter, String)> {
        let pipeline = Pipeline::from_variable_name(&self.variable_name)?;
        let adapter = FieldAdapter::new(
            self.lats,
            self.lons,
            self.n_time,
            self.data,
            self.scale_factor,
            self.add_offset,
            pipeline,
        )?;
        Ok((adapter, self.long_name))
    }
}

/// A JSON-encoded stand-in for the real gridded container, used by the
/// demo data generator and by tests that want to exercise the full
/// `FieldSource` seam. Not a production format.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonField {
    pub lats: Vec<f64>,
    pub lons: Vec<f64>,
    pub n_time: usize,
    pub data: Vec<i16>,
    pub scale_factor: f64,
    pub add_offset: f64,
    pub long_name: String,
    pub variable_name: String,
}

pub struct JsonFieldSource {
    path: std::path::PathBuf,
}

impl JsonFieldSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        JsonFieldSource {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl FieldSource for JsonFieldSource {
    fn load(&self) -> Result<RawField> {
        let mut contents = String::new();
        std::fs::File::open(&self.path)?.read_to_string(&mut contents)?;
        let parsed: JsonField = serde_json::from_str(&contents)
            .map_err(|e| DetectError::Format(format!("invalid field file: {}", e)))?;

        Ok(RawField {
            lats: parsed.lats,
            lons: parsed.lons,
            n_time: parsed.n_time,
            data: parsed.data,
            scale_factor: parsed.scale_factor,
            add_offset: parsed.add_offset,
            long_name: parsed.long_name,
            variable_name: parsed.variable_name,
        })
    }
}
