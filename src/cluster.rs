use crate::detect::SelectedGrid;
use crate::models::PointKind;

/// Groups MAX/MIN selected points into clusters via 8-neighbor flood
/// fill, using an explicit work list rather than recursion (a
/// recursive walk can blow the stack on large connected regions, see
/// DESIGN.md).
///
/// `eps = res * step` bounds `|Δlat|` and `|Δlon|` between a candidate
/// neighbor and the *current frontier point*, not the cluster seed.
/// When `match_kind` is true (the geopotential pipeline), a neighbor
/// must also share the seed's `PointKind`; the temperature pipeline
/// passes `false` since it has only one kind.
pub fn cluster(grid: &mut SelectedGrid, res: f64, step: usize, match_kind: bool) {
    let eps = res * step as f64;
    let size_x = grid.size_x;
    let size_y = grid.size_y;
    let mut next_id: i64 = 0;

    for sx in 0..size_x {
        for sy in 0..size_y {
            if grid.get(sx, sy).kind == PointKind::None || grid.get(sx, sy).cluster_id != -1 {
                continue;
            }

            let seed_kind = grid.get(sx, sy).kind;
            let id = next_id;
            next_id += 1;

            let mut work: Vec<(usize, usize)> = vec![(sx, sy)];
            grid.get_mut(sx, sy).cluster_id = id;

            while let Some((x, y)) = work.pop() {
                let frontier = *grid.get(x, y);

                for dx in [-1i64, 0, 1] {
                    for dy in [-1i64, 0, 1] {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        let nx = x as i64 + dx;
                        let ny = y as i64 + dy;
                        if nx < 0 || ny < 0 || nx >= size_x as i64 || ny >= size_y as i64 {
                            continue;
                        }
                        let (nx, ny) = (nx as usize, ny as usize);
                        let neighbor = grid.get(nx, ny);

                        if neighbor.kind == PointKind::None || neighbor.cluster_id != -1 {
                            continue;
                        }
                        if (neighbor.point.lat - frontier.point.lat).abs() > eps
                            || (neighbor.point.lon - frontier.point.lon).abs() > eps
                        {
                            continue;
                        }
                        if match_kind && neighbor.kind != seed_kind {
                            continue;
                        }

                        grid.get_mut(nx, ny).cluster_id = id;
                        work.push((nx, ny));
                    }
                }
            }
        }
    }
}
