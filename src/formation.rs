use crate::config::FormationConfig;
use crate::models::{Cluster, Formation, FormationKind, PointKind};
use tracing::warn;

/// Searches the filtered cluster set of one time step for rex and
/// omega blocks. Emits at most one formation per (high, kind) pair;
/// when multiple candidates qualify, the one with the smallest total
/// longitudinal span wins. Missing lows produce no formation; an
/// empty cluster (structurally unreachable after the summarizer, but
/// checked defensively) is skipped with a warning.
pub fn find_formations(time_index: usize, clusters: &[Cluster], config: &FormationConfig) -> Vec<Formation> {
    let highs: Vec<&Cluster> = clusters.iter().filter(|c| c.kind == PointKind::Max).collect();
    let lows: Vec<&Cluster> = clusters.iter().filter(|c| c.kind == PointKind::Min).collect();

    let mut formations = Vec::new();

    for high in &highs {
        if high.n_points == 0 {
            warn!(cluster_id = high.id, "skipping empty high cluster in formation search");
            continue;
        }

        if let Some(rex) = find_rex(time_index, high, &lows, config) {
            formations.push(rex);
        }
        if let Some(omega) = find_omega(time_index, high, &lows, config) {
            formations.push(omega);
        }
    }

    formations
}

fn find_rex(
    time_index: usize,
    high: &Cluster,
    lows: &[&Cluster],
    config: &FormationConfig,
) -> Option<Formation> {
    lows.iter()
        .filter(|low| {
            if low.n_points == 0 {
                return false;
            }
            let dlat = high.centroid.lat - low.centroid.lat;
            let dlon = (high.centroid.lon - low.centroid.lon).abs();
            dlat >= config.rex_dlat_min_deg && dlon <= config.rex_dlon_max_deg
        })
        .min_by(|a, b| {
            let da = (high.centroid.lon - a.centroid.lon).abs();
            let db = (high.centroid.lon - b.centroid.lon).abs();
            da.partial_cmp(&db).unwrap()
        })
        .map(|low| Formation {
            time_index,
            high_cluster_id: high.id,
            low1_cluster_id: low.id,
            low2_cluster_id: None,
            kind: FormationKind::Rex,
        })
}

fn find_omega(
    time_index: usize,
    high: &Cluster,
    lows: &[&Cluster],
    config: &FormationConfig,
) -> Option<Formation> {
    let qualifies = |low: &&&Cluster| -> bool {
        low.n_points != 0 && high.centroid.lat - low.centroid.lat >= config.omega_dlat_min_deg
    };

    let west_candidates: Vec<&&Cluster> = lows
        .iter()
        .filter(qualifies)
        .filter(|low| high.centroid.lon - low.centroid.lon >= config.omega_flank_dlon_min_deg)
        .collect();
    let east_candidates: Vec<&&Cluster> = lows
        .iter()
        .filter(qualifies)
        .filter(|low| low.centroid.lon - high.centroid.lon >= config.omega_flank_dlon_min_deg)
        .collect();

    let mut best: Option<(Formation, f64)> = None;

    for west in &west_candidates {
        for east in &east_candidates {
            if west.id == east.id {
                continue;
            }
            let width = (east.centroid.lon - west.centroid.lon).abs();
            if width < config.omega_min_width_deg {
                continue;
            }

            let span = (high.centroid.lon - west.centroid.lon).abs()
                + (east.centroid.lon - high.centroid.lon).abs();

            let candidate = Formation {
                time_index,
                high_cluster_id: high.id,
                low1_cluster_id: west.id,
                low2_cluster_id: Some(east.id),
                kind: FormationKind::Omega,
            };

            match &best {
                Some((_, best_span)) if *best_span <= span => {}
                _ => best = Some((candidate, span)),
            }
        }
    }

    best.map(|(f, _)| f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GeoPoint;

    fn cluster(id: usize, kind: PointKind, lat: f64, lon: f64) -> Cluster {
        let p = GeoPoint::new(lat, lon);
        Cluster {
            id,
            members: Vec::new(),
            point_n: p,
            point_s: p,
            point_e: p,
            point_w: p,
            centroid: p,
            n_points: 2,
            kind,
        }
    }

    #[test]
    fn rex_block_detected_for_high_stacked_over_low() {
        // S4: high (60N, 10E), low (45N, 12E), dlat_min=10, dlon_max=5 -> no omega.
        let config = FormationConfig {
            rex_dlat_min_deg: 10.0,
            rex_dlon_max_deg: 5.0,
            ..FormationConfig::default()
        };
        let high = cluster(0, PointKind::Max, 60.0, 10.0);
        let low = cluster(1, PointKind::Min, 45.0, 12.0);
        let formations = find_formations(0, &[high, low], &config);

        assert_eq!(formations.len(), 1);
        assert_eq!(formations[0].kind, FormationKind::Rex);
        assert_eq!(formations[0].high_cluster_id, 0);
        assert_eq!(formations[0].low1_cluster_id, 1);
    }

    #[test]
    fn omega_block_detected_for_high_flanked_by_two_lows() {
        // S5: high (65N, 0), lows (45N, -25) and (45N, +25), dlat_min=10, flank_min=15.
        let config = FormationConfig {
            omega_dlat_min_deg: 10.0,
            omega_flank_dlon_min_deg: 15.0,
            omega_min_width_deg: 20.0,
            ..FormationConfig::default()
        };
        let high = cluster(0, PointKind::Max, 65.0, 0.0);
        let west = cluster(1, PointKind::Min, 45.0, -25.0);
        let east = cluster(2, PointKind::Min, 45.0, 25.0);
        let formations = find_formations(0, &[high, west, east], &config);

        let omegas: Vec<_> = formations.iter().filter(|f| f.kind == FormationKind::Omega).collect();
        assert_eq!(omegas.len(), 1);
        assert_eq!(omegas[0].low1_cluster_id, 1);
        assert_eq!(omegas[0].low2_cluster_id, Some(2));
    }

    #[test]
    fn no_lows_emits_no_formations() {
        let high = cluster(0, PointKind::Max, 60.0, 0.0);
        let formations = find_formations(0, &[high], &FormationConfig::default());
        assert!(formations.is_empty());
    }

    #[test]
    fn closely_spaced_flanks_do_not_form_omega() {
        // Both lows individually clear the flank minimum (5deg) but sit
        // only 12deg apart from each other, below omega_min_width_deg (20).
        let config = FormationConfig {
            omega_dlat_min_deg: 10.0,
            omega_flank_dlon_min_deg: 5.0,
            omega_min_width_deg: 20.0,
            ..FormationConfig::default()
        };
        let high = cluster(0, PointKind::Max, 65.0, 0.0);
        let west = cluster(1, PointKind::Min, 45.0, -6.0);
        let east = cluster(2, PointKind::Min, 45.0, 6.0);
        let formations = find_formations(0, &[high, west, east], &config);
        assert!(formations.iter().all(|f| f.kind != FormationKind::Omega));
    }
}
