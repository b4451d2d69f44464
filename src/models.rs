use serde::{Deserialize, Serialize};

/// A geographic point. lat in [-90, 90], lon in [-180, 180).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        GeoPoint { lat, lon }
    }
}

/// Classification assigned to a grid point by the extremum detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointKind {
    None,
    Max,
    Min,
}

impl PointKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PointKind::None => "NONE",
            PointKind::Max => "MAX",
            PointKind::Min => "MIN",
        }
    }
}

/// A candidate grid point produced by the extremum detector and later
/// owned by the clusterer, which is the only stage permitted to mutate
/// `cluster_id`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectedPoint {
    pub point: GeoPoint,
    pub raw_value: i16,
    pub kind: PointKind,
    pub cluster_id: i64,
}

impl SelectedPoint {
    pub const UNASSIGNED: i64 = -1;

    pub fn new(point: GeoPoint, raw_value: i16, kind: PointKind) -> Self {
        SelectedPoint {
            point,
            raw_value,
            kind,
            cluster_id: Self::UNASSIGNED,
        }
    }
}

/// A connected region of same-kind selected points, with its bounding
/// extremes and centroid. Immutable once built by the summarizer.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub id: usize,
    pub members: Vec<SelectedPoint>,
    pub point_n: GeoPoint,
    pub point_s: GeoPoint,
    pub point_e: GeoPoint,
    pub point_w: GeoPoint,
    pub centroid: GeoPoint,
    pub n_points: usize,
    pub kind: PointKind,
}

/// The two multi-center formations the finder recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormationKind {
    Omega,
    Rex,
}

impl FormationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormationKind::Omega => "OMEGA",
            FormationKind::Rex => "REX",
        }
    }
}

/// A detected multi-center arrangement for one time step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Formation {
    pub time_index: usize,
    pub high_cluster_id: usize,
    pub low1_cluster_id: usize,
    pub low2_cluster_id: Option<usize>,
    pub kind: FormationKind,
}
