//! Validity-based pruning of scored candidate connections.
//!
//! Every node votes for its best-scoring connection and for at most one more
//! connection pointing away from it (normalized angle above the threshold).
//! A connection survives only if both of its ends voted for it.

use crate::config::PruneParams;
use crate::graph::ZDiscGraph;
use crate::math::normalized_angle;

/// Votes needed for a connection to survive.
pub const REQUIRED_VALIDITY: u8 = 2;

pub struct ConnectionPruner {
    params: PruneParams,
}

impl ConnectionPruner {
    pub fn new(params: PruneParams) -> Self {
        Self { params }
    }

    /// Neighbors `node` votes for: its primary connection and an optional
    /// secondary one.
    pub fn votes(&self, graph: &ZDiscGraph, node: usize) -> Option<(usize, Option<usize>)> {
        let PruneParams {
            score_threshold,
            angle_threshold,
        } = self.params;

        let mut ranked: Vec<(usize, f64)> = graph
            .neighbors(node)
            .iter()
            .filter_map(|&n| Some((n, graph.edge(node, n)?.score)))
            .collect();

        // stable, so equal scores keep neighbor order
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        let &(best, best_score) = ranked.first()?;
        if best_score <= score_threshold {
            return None;
        }

        let origin = graph.pos(node);
        let best_dir = graph.pos(best) - origin;

        let secondary = ranked[1..]
            .iter()
            .find(|&&(n, score)| {
                let dir = graph.pos(n) - origin;

                normalized_angle(&dir, &best_dir) > angle_threshold && score > score_threshold
            })
            .map(|&(n, _)| n);

        Some((best, secondary))
    }

    /// Counts votes into edge validity and removes every edge with fewer
    /// than [`REQUIRED_VALIDITY`] votes. Returns the number of removed edges.
    pub fn prune(&self, graph: &mut ZDiscGraph) -> usize {
        self.count_votes(graph);

        let before = graph.num_edges();
        graph.retain_edges(|_, edge| edge.validity >= REQUIRED_VALIDITY);
        let removed = before - graph.num_edges();

        log::debug!(
            "prune: kept {} of {} edges",
            graph.num_edges(),
            before
        );

        removed
    }

    /// Resets and recounts edge validity without removing anything.
    pub fn count_votes(&self, graph: &mut ZDiscGraph) {
        for edge in graph.edges_mut() {
            edge.validity = 0;
        }

        for node in 0..graph.num_nodes() {
            let Some((primary, secondary)) = self.votes(graph, node) else {
                continue;
            };

            for n in std::iter::once(primary).chain(secondary) {
                if let Some(edge) = graph.edge_mut(node, n) {
                    edge.validity += 1;
                }
            }
        }
    }
}
