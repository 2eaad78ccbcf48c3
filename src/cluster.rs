//! Density-reachability clustering of 2D points.
//!
//! A point is a core point when at least `min_samples` points (itself
//! included) lie within `radius`. Clusters grow from core points through
//! their neighborhoods; points reachable from no core point are noise. The
//! number of clusters is not known in advance.

use nalgebra as na;
use rstar::primitives::GeomWithData;
use rstar::RTree;

type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// Cluster label of every input point, in input order. `None` is noise.
/// Cluster ids are dense and numbered in order of discovery.
pub fn density_clusters(
    points: &[na::Point2<f64>],
    radius: f64,
    min_samples: usize,
) -> Vec<Option<usize>> {
    let tree = RTree::bulk_load(
        points
            .iter()
            .enumerate()
            .map(|(idx, p)| IndexedPoint::new([p.x, p.y], idx))
            .collect(),
    );

    let region = |idx: usize| -> Vec<usize> {
        let p = points[idx];
        let mut found: Vec<usize> = tree
            .locate_within_distance([p.x, p.y], radius * radius)
            .map(|g| g.data)
            .collect();

        found.sort_unstable();
        found
    };

    let mut labels = vec![None; points.len()];
    let mut visited = vec![false; points.len()];
    let mut next_cluster = 0;

    for start in 0..points.len() {
        if visited[start] {
            continue;
        }
        visited[start] = true;

        let seeds = region(start);
        if seeds.len() < min_samples {
            continue;
        }

        let cluster = next_cluster;
        next_cluster += 1;
        labels[start] = Some(cluster);

        let mut queue = seeds;
        let mut head = 0;

        while head < queue.len() {
            let idx = queue[head];
            head += 1;

            if labels[idx].is_none() {
                labels[idx] = Some(cluster);
            }

            if visited[idx] {
                continue;
            }
            visited[idx] = true;

            let neighbors = region(idx);
            if neighbors.len() >= min_samples {
                // noise seen earlier is re-queued to become a border point
                queue.extend(
                    neighbors
                        .into_iter()
                        .filter(|&n| !visited[n] || labels[n].is_none()),
                );
            }
        }
    }

    log::debug!(
        "density_clusters: {} points -> {} clusters, {} noise",
        points.len(),
        next_cluster,
        labels.iter().filter(|l| l.is_none()).count()
    );

    labels
}
