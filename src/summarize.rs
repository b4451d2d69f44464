use crate::config::SummaryConfig;
use crate::detect::SelectedGrid;
use crate::models::Cluster;
use std::collections::BTreeMap;

/// Builds one `Cluster` per distinct `cluster_id` in `grid`, computing
/// bounding extremes (ties broken by scan order) and the unweighted
/// centroid, then drops clusters whose centroid latitude falls outside
/// `(lat_band_min_deg, lat_band_max_deg)` or whose size is below
/// `min_cluster_size`. Survivors are renumbered densely from 0 and the
/// new id is propagated into every member's `cluster_id`.
pub fn summarize(grid: &SelectedGrid, config: &SummaryConfig) -> Vec<Cluster> {
    let mut by_id: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (idx, p) in grid.points.iter().enumerate() {
        if p.cluster_id != -1 {
            by_id.entry(p.cluster_id).or_default().push(idx);
        }
    }

    let mut clusters: Vec<Cluster> = Vec::new();
    for (_, member_idxs) in by_id {
        let members: Vec<_> = member_idxs.iter().map(|&i| grid.points[i]).collect();
        let kind = members[0].kind;

        let mut point_n = members[0].point;
        let mut point_s = members[0].point;
        let mut point_e = members[0].point;
        let mut point_w = members[0].point;
        let mut sum_lat = 0.0;
        let mut sum_lon = 0.0;

        for m in &members {
            if m.point.lat > point_n.lat {
                point_n = m.point;
            }
            if m.point.lat < point_s.lat {
                point_s = m.point;
            }
            if m.point.lon > point_e.lon {
                point_e = m.point;
            }
            if m.point.lon < point_w.lon {
                point_w = m.point;
            }
            sum_lat += m.point.lat;
            sum_lon += m.point.lon;
        }

        let n_points = members.len();
        let centroid = crate::models::GeoPoint::new(sum_lat / n_points as f64, sum_lon / n_points as f64);

        clusters.push(Cluster {
            id: 0, // renumbered below
            members,
            point_n,
            point_s,
            point_e,
            point_w,
            centroid,
            n_points,
            kind,
        });
    }

    clusters.retain(|c| {
        c.centroid.lat > config.lat_band_min_deg
            && c.centroid.lat < config.lat_band_max_deg
            && c.n_points >= config.min_cluster_size
    });

    for (new_id, c) in clusters.iter_mut().enumerate() {
        c.id = new_id;
        for m in c.members.iter_mut() {
            m.cluster_id = new_id as i64;
        }
    }

    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::SelectedGrid;
    use crate::models::{GeoPoint, PointKind, SelectedPoint};

    fn grid_with(points: Vec<SelectedPoint>, size_x: usize, size_y: usize) -> SelectedGrid {
        SelectedGrid { size_x, size_y, points }
    }

    #[test]
    fn filters_single_point_clusters_and_out_of_band_latitude() {
        let mut points = vec![SelectedPoint::new(GeoPoint::new(0.0, 0.0), 0, PointKind::None); 4];
        // Cluster 0: single point at a valid latitude -> dropped (size 1).
        points[0] = SelectedPoint::new(GeoPoint::new(50.0, 0.0), 0, PointKind::Max);
        points[0].cluster_id = 0;
        // Cluster 1: two points at lat 90 (out of band) -> dropped.
        points[1] = SelectedPoint::new(GeoPoint::new(90.0, 0.0), 0, PointKind::Max);
        points[1].cluster_id = 1;
        points[2] = SelectedPoint::new(GeoPoint::new(90.0, 0.25), 0, PointKind::Max);
        points[2].cluster_id = 1;
        // Cluster 2: two points within band -> kept.
        points[3] = SelectedPoint::new(GeoPoint::new(50.0, 0.0), 0, PointKind::Max);
        points[3].cluster_id = 2;

        let mut extra = SelectedPoint::new(GeoPoint::new(50.25, 0.0), 0, PointKind::Max);
        extra.cluster_id = 2;
        points.push(extra);

        let grid = grid_with(points, 5, 1);
        let clusters = summarize(&grid, &SummaryConfig::default());

        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].id, 0);
        assert_eq!(clusters[0].n_points, 2);
    }

    #[test]
    fn bounding_points_are_scan_order_extremes() {
        let mut points = vec![
            SelectedPoint::new(GeoPoint::new(50.0, 0.0), 0, PointKind::Max),
            SelectedPoint::new(GeoPoint::new(52.0, 1.0), 0, PointKind::Max),
            SelectedPoint::new(GeoPoint::new(48.0, -1.0), 0, PointKind::Max),
        ];
        for p in points.iter_mut() {
            p.cluster_id = 0;
        }
        let grid = grid_with(points, 3, 1);
        let clusters = summarize(&grid, &SummaryConfig::default());
        assert_eq!(clusters.len(), 1);
        let c = &clusters[0];
        assert_eq!(c.point_n.lat, 52.0);
        assert_eq!(c.point_s.lat, 48.0);
        assert_eq!(c.point_e.lon, 1.0);
        assert_eq!(c.point_w.lon, -1.0);
        assert!((c.centroid.lat - 50.0).abs() < 1e-9);
    }

    #[test]
    fn ids_are_densely_renumbered_after_filtering() {
        let mut points = Vec::new();
        for (id, lat) in [(0i64, 50.0), (1, 90.0), (2, 60.0)] {
            let mut a = SelectedPoint::new(GeoPoint::new(lat, 0.0), 0, PointKind::Max);
            a.cluster_id = id;
            let mut b = SelectedPoint::new(GeoPoint::new(lat, 0.25), 0, PointKind::Max);
            b.cluster_id = id;
            points.push(a);
            points.push(b);
        }
        let grid = grid_with(points, 6, 1);
        let clusters = summarize(&grid, &SummaryConfig::default());
        // Cluster at lat=90 is out of band, so 2 survive, renumbered 0 and 1.
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].id, 0);
        assert_eq!(clusters[1].id, 1);
    }
}
