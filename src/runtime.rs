use crate::cluster::cluster;
use crate::config::Config;
use crate::detect::{detect_extrema, detect_hotspots};
use crate::error::{DetectError, Result};
use crate::field::{FieldAdapter, Pipeline};
use crate::formation::find_formations;
use crate::models::{Cluster, Formation};
use crate::summarize::summarize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{error, warn};

const RES: f64 = 0.25;

/// A row in the `*_selected_*.csv` output (schema: `time,latitude,
/// longitude,z,type,cluster,centroid_lat,centroid_lon`).
#[derive(Debug, Serialize)]
pub struct SelectedRow {
    pub time: usize,
    pub latitude: f64,
    pub longitude: f64,
    pub z: i32,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub cluster: usize,
    pub centroid_lat: f64,
    pub centroid_lon: f64,
}

/// A row in the `*_formations_*.csv` output (schema: `time,max_id,
/// min1_id,min2_id,type`).
#[derive(Debug, Serialize)]
pub struct FormationRow {
    pub time: usize,
    pub max_id: usize,
    pub min1_id: usize,
    pub min2_id: i64,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

/// A row in the `speed_*.csv` output (schema: `part,instant,time_elapsed`).
#[derive(Debug, Serialize)]
pub struct SpeedRow {
    pub part: &'static str,
    pub instant: usize,
    pub time_elapsed: f64,
}

fn selected_rows(time: usize, clusters: &[Cluster]) -> Vec<SelectedRow> {
    let mut rows = Vec::new();
    for c in clusters {
        for m in &c.members {
            rows.push(SelectedRow {
                time,
                latitude: m.point.lat,
                longitude: m.point.lon,
                z: m.raw_value as i32,
                kind: m.kind.as_str(),
                cluster: c.id,
                centroid_lat: c.centroid.lat,
                centroid_lon: c.centroid.lon,
            });
        }
    }
    rows
}

fn formation_rows(formations: &[Formation]) -> Vec<FormationRow> {
    formations
        .iter()
        .map(|f| FormationRow {
            time: f.time_index,
            max_id: f.high_cluster_id,
            min1_id: f.low1_cluster_id,
            min2_id: f.low2_cluster_id.map(|id| id as i64).unwrap_or(-1),
            kind: f.kind.as_str(),
        })
        .collect()
}

/// Wall-clock duration of each stage of one time step, in seconds.
/// Reported as four distinct `speed` rows (one per component) rather
/// than a single aggregate, per SPEC_FULL §5.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageDurations {
    pub detect: f64,
    pub cluster: f64,
    pub summarize: f64,
    pub formation: f64,
}

/// Runs the full per-time-step pipeline (B -> C -> D -> E) for one
/// time index, dispatching on `adapter.pipeline`. Formation search is
/// only meaningful for the geopotential pipeline (it needs both MAX
/// and MIN clusters), so the temperature pipeline always returns an
/// empty formation list. Each stage is timed independently so the
/// caller can emit one `speed` row per component.
pub fn run_time_step(
    adapter: &FieldAdapter,
    t: usize,
    config: &Config,
) -> Result<(Vec<SelectedRow>, Vec<FormationRow>, StageDurations)> {
    if t >= adapter.n_time {
        return Err(DetectError::Format(format!(
            "time index {} out of range (n_time={})",
            t, adapter.n_time
        )));
    }

    let start = Instant::now();
    let mut grid = match adapter.pipeline {
        Pipeline::Geopotential => detect_extrema(adapter, t, &config.detector),
        Pipeline::Temperature => detect_hotspots(adapter, t, &config.detector),
    };
    let detect_elapsed = start.elapsed().as_secs_f64();

    let start = Instant::now();
    let match_kind = adapter.pipeline == Pipeline::Geopotential;
    cluster(&mut grid, RES, config.detector.step, match_kind);
    let cluster_elapsed = start.elapsed().as_secs_f64();

    let start = Instant::now();
    let clusters = summarize(&grid, &config.summary);
    let summarize_elapsed = start.elapsed().as_secs_f64();

    let start = Instant::now();
    let formations = match adapter.pipeline {
        Pipeline::Geopotential => find_formations(t, &clusters, &config.formation),
        Pipeline::Temperature => Vec::new(),
    };
    let formation_elapsed = start.elapsed().as_secs_f64();

    let durations = StageDurations {
        detect: detect_elapsed,
        cluster: cluster_elapsed,
        summarize: summarize_elapsed,
        formation: formation_elapsed,
    };

    Ok((selected_rows(t, &clusters), formation_rows(&formations), durations))
}

/// Appends rows to a CSV file, writing a header on first creation.
/// Each sink is owned by a mutex; the critical section covers only the
/// flush of one time step's rows.
struct CsvSink {
    writer: Mutex<csv::Writer<File>>,
}

impl CsvSink {
    fn open(path: &Path) -> Result<Self> {
        let exists = path.exists();
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let writer = csv::WriterBuilder::new()
            .has_headers(!exists)
            .from_writer(file);
        Ok(CsvSink {
            writer: Mutex::new(writer),
        })
    }

    fn write_rows<T: Serialize>(&self, rows: &[T]) -> Result<()> {
        let mut w = self.writer.lock().unwrap();
        for row in rows {
            w.serialize(row)?;
        }
        w.flush()?;
        Ok(())
    }
}

impl From<csv::Error> for DetectError {
    fn from(e: csv::Error) -> Self {
        DetectError::Io(std::io::Error::new(std::io::ErrorKind::Other, e))
    }
}

/// The four run-scoped output sinks named in the external interface:
/// per-step `selected` and `formations` rows, a `speed` instrumentation
/// log, and a free-text `log`.
pub struct Sinks {
    selected: CsvSink,
    formations: CsvSink,
    speed: CsvSink,
    log_path: PathBuf,
    log: Mutex<File>,
}

impl Sinks {
    pub fn create(out_dir: &Path, long_name: &str, input_basename: &str, stamp: &str) -> Result<Self> {
        std::fs::create_dir_all(out_dir)?;
        let named = |suffix: &str| {
            out_dir.join(format!("{}_{}_{}_{}UTC.csv", long_name, suffix, input_basename, stamp))
        };

        let selected = CsvSink::open(&named("selected"))?;
        let formations = CsvSink::open(&named("formations"))?;
        let speed = CsvSink::open(&out_dir.join(format!("speed_{}_{}UTC.csv", input_basename, stamp)))?;
        let log_path = out_dir.join(format!("log_{}_{}UTC.csv", input_basename, stamp));
        let log = OpenOptions::new().create(true).append(true).open(&log_path)?;

        Ok(Sinks {
            selected,
            formations,
            speed,
            log_path,
            log: Mutex::new(log),
        })
    }

    pub fn write_step(&self, selected: Vec<SelectedRow>, formations: Vec<FormationRow>) -> Result<()> {
        self.selected.write_rows(&selected)?;
        self.formations.write_rows(&formations)?;
        Ok(())
    }

    pub fn write_speed(&self, part: &'static str, instant: usize, time_elapsed: f64) -> Result<()> {
        self.speed.write_rows(&[SpeedRow { part, instant, time_elapsed }])
    }

    pub fn log_line(&self, line: &str) -> Result<()> {
        use std::io::Write;
        let mut f = self.log.lock().unwrap();
        writeln!(f, "{}", line)?;
        Ok(())
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}

/// Runs every time step of `adapter` across an `n_threads`-wide pool,
/// cooperatively cancellable via `cancel`. Rows from completed steps
/// are buffered until all lower-numbered steps have committed, so
/// output ordering is ascending time order regardless of completion
/// order (sequential commit, see SPEC_FULL §5).
pub fn run(adapter: Arc<FieldAdapter>, config: Arc<Config>, sinks: Arc<Sinks>, cancel: Arc<AtomicBool>) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.n_threads)
        .build()
        .map_err(|e| DetectError::Internal(e.to_string()))?;

    let pending: Mutex<BTreeMap<usize, (Vec<SelectedRow>, Vec<FormationRow>)>> = Mutex::new(BTreeMap::new());
    let next_to_commit = Mutex::new(0usize);

    pool.install(|| -> Result<()> {
        use rayon::prelude::*;

        (0..adapter.n_time).into_par_iter().try_for_each(|t| -> Result<()> {
            if cancel.load(Ordering::Relaxed) {
                return Ok(());
            }

            let outcome = run_time_step(&adapter, t, &config);

            match outcome {
                Ok((selected, formations, durations)) => {
                    sinks.write_speed("detect", t, durations.detect)?;
                    sinks.write_speed("cluster", t, durations.cluster)?;
                    sinks.write_speed("summarize", t, durations.summarize)?;
                    sinks.write_speed("formation", t, durations.formation)?;
                    pending.lock().unwrap().insert(t, (selected, formations));
                }
                Err(DetectError::Format(msg)) => {
                    error!(time = t, error = %msg, "skipping time step: format error");
                    sinks.log_line(&format!("time={}: skipped, format error: {}", t, msg))?;
                    pending.lock().unwrap().insert(t, (Vec::new(), Vec::new()));
                }
                Err(DetectError::Alloc) => return Err(DetectError::Alloc),
                Err(other) => return Err(other),
            }

            // Commit every contiguous prefix of completed steps in order.
            loop {
                let mut next = next_to_commit.lock().unwrap();
                let mut done = pending.lock().unwrap();
                if let Some((selected, formations)) = done.remove(&*next) {
                    sinks.write_step(selected, formations)?;
                    *next += 1;
                } else {
                    break;
                }
            }

            Ok(())
        })
    })?;

    if cancel.load(Ordering::Relaxed) {
        warn!("run cancelled, flushing completed steps");
    }

    Ok(())
}
