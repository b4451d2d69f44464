use crate::error::{DetectError, Result};
use std::f64::consts::PI;
use std::path::PathBuf;

/// Tunables for the extremum detector (component B). Exposed as
/// configuration rather than hard-coded, per spec.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorConfig {
    pub step: usize,
    pub dist_km: f64,
    pub n_bearings: usize,
    pub bearing_step_rad: f64,
    pub bearing_start_rad: f64,
    pub pass_percent: f64,
    pub temperature_threshold_c: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            step: 3,
            dist_km: 300.0,
            n_bearings: 8,
            bearing_step_rad: 2.0 * PI / 16.0,
            bearing_start_rad: 0.0,
            pass_percent: 0.75,
            temperature_threshold_c: 28.0,
        }
    }
}

/// Thresholds for the formation finder (component E). Defaults are
/// synoptic-scale conventions, not guessed source constants (see
/// DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormationConfig {
    pub rex_dlat_min_deg: f64,
    pub rex_dlon_max_deg: f64,
    pub omega_dlat_min_deg: f64,
    pub omega_flank_dlon_min_deg: f64,
    pub omega_min_width_deg: f64,
}

impl Default for FormationConfig {
    fn default() -> Self {
        FormationConfig {
            rex_dlat_min_deg: 10.0,
            rex_dlon_max_deg: 15.0,
            omega_dlat_min_deg: 10.0,
            omega_flank_dlon_min_deg: 15.0,
            omega_min_width_deg: 20.0,
        }
    }
}

/// Thresholds for the cluster summarizer's latitude-band filter
/// (component D).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryConfig {
    pub lat_band_min_deg: f64,
    pub lat_band_max_deg: f64,
    pub min_cluster_size: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        SummaryConfig {
            lat_band_min_deg: 30.0,
            lat_band_max_deg: 85.0,
            min_cluster_size: 2,
        }
    }
}

/// Immutable, run-scoped configuration built once from CLI args and
/// passed by reference into every stage (replaces the source's
/// process-wide mutable globals, see DESIGN.md).
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub input_file: PathBuf,
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
    pub out_dir: PathBuf,
    pub n_threads: usize,
    pub detector: DetectorConfig,
    pub formation: FormationConfig,
    pub summary: SummaryConfig,
}

const MAX_INPUT_PATH_LEN: usize = 255;

impl Config {
    /// Parses and validates the fixed positional argument grammar:
    /// `<input-file> <lat_min> <lat_max> <lon_min> <lon_max> <out-dir> <n-threads>`.
    pub fn from_args<I: IntoIterator<Item = String>>(args: I) -> Result<Self> {
        let args: Vec<String> = args.into_iter().collect();
        if args.len() != 7 {
            return Err(DetectError::Config(format!(
                "expected 7 arguments <input-file> <lat_min> <lat_max> <lon_min> <lon_max> <out-dir> <n-threads>, got {}",
                args.len()
            )));
        }

        let input_file = PathBuf::from(&args[0]);
        if args[0].len() > MAX_INPUT_PATH_LEN {
            return Err(DetectError::Config(format!(
                "input path exceeds {} characters",
                MAX_INPUT_PATH_LEN
            )));
        }

        let lat_min = parse_f64(&args[1], "lat_min")?;
        let lat_max = parse_f64(&args[2], "lat_max")?;
        let lon_min = parse_f64(&args[3], "lon_min")?;
        let lon_max = parse_f64(&args[4], "lon_max")?;
        let out_dir = PathBuf::from(&args[5]);
        let n_threads = args[6]
            .parse::<usize>()
            .map_err(|_| DetectError::Config(format!("invalid n-threads: '{}'", args[6])))?;

        if !(-90.0..=90.0).contains(&lat_min) || !(-90.0..=90.0).contains(&lat_max) {
            return Err(DetectError::Config("lat bounds must be in [-90, 90]".to_string()));
        }
        if lat_min > lat_max {
            return Err(DetectError::Config("lat_min must be <= lat_max".to_string()));
        }
        if !(-180.0..=180.0).contains(&lon_min) || !(-180.0..=180.0).contains(&lon_max) {
            return Err(DetectError::Config("lon bounds must be in [-180, 180]".to_string()));
        }
        if lon_min > lon_max {
            return Err(DetectError::Config("lon_min must be <= lon_max".to_string()));
        }
        if n_threads < 1 {
            return Err(DetectError::Config("n-threads must be >= 1".to_string()));
        }

        Ok(Config {
            input_file,
            lat_min,
            lat_max,
            lon_min,
            lon_max,
            out_dir,
            n_threads,
            detector: DetectorConfig::default(),
            formation: FormationConfig::default(),
            summary: SummaryConfig::default(),
        })
    }
}

fn parse_f64(s: &str, name: &str) -> Result<f64> {
    s.parse::<f64>()
        .map_err(|_| DetectError::Config(format!("invalid {}: '{}'", name, s)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_valid_args() {
        let cfg = Config::from_args(args(&["field.bin", "30", "85", "-20", "40", "out", "4"])).unwrap();
        assert_eq!(cfg.n_threads, 4);
        assert_eq!(cfg.lat_min, 30.0);
    }

    #[test]
    fn rejects_wrong_arg_count() {
        assert!(Config::from_args(args(&["field.bin"])).is_err());
    }

    #[test]
    fn rejects_inverted_lat_bounds() {
        assert!(Config::from_args(args(&["field.bin", "85", "30", "-20", "40", "out", "4"])).is_err());
    }

    #[test]
    fn rejects_zero_threads() {
        assert!(Config::from_args(args(&["field.bin", "30", "85", "-20", "40", "out", "0"])).is_err());
    }

    #[test]
    fn rejects_out_of_range_lon() {
        assert!(Config::from_args(args(&["field.bin", "30", "85", "-200", "40", "out", "1"])).is_err());
    }
}
