//! Geometric scoring of candidate connections.
//!
//! A connection `N -> M` is judged by how well it continues into the
//! segments `M -> F` leaving its far end: the length of `N -> M` relative to
//! the expected sarcomere length, its length relative to `M -> F`, and the
//! angle between the two. The directed score is the best over all `F`; an
//! edge keeps the best directed score of its two directions.
//!
//! The angle term only rewards `M -> F` pointing back towards `N`
//! (normalized angle >= 1). Straight continuations get nothing from it.

use crate::config::ScoreParams;
use crate::graph::ZDiscGraph;
use crate::math::{angle_score, avg_length_score, diff_length_score, normalized_angle};

pub struct ConnectionScorer {
    params: ScoreParams,
}

impl ConnectionScorer {
    pub fn new(params: ScoreParams) -> Self {
        Self { params }
    }

    /// Score of the connection `node -> neighbor`, 0 if `neighbor` has no
    /// other neighbors.
    pub fn directed_score(&self, graph: &ZDiscGraph, node: usize, neighbor: usize) -> f64 {
        let p = &self.params;
        let v1 = graph.pos(neighbor) - graph.pos(node);
        let l1 = v1.norm();

        let mut score: f64 = 0.0;
        for &far in graph.neighbors(neighbor) {
            if far == node || far == neighbor {
                continue;
            }

            let v2 = graph.pos(far) - graph.pos(neighbor);
            let l2 = v2.norm();

            let candidate = p.c_avg_length * avg_length_score(l1, p.l_avg)
                + p.c_diff_length * diff_length_score(l1, l2)
                + p.c_angle * angle_score(normalized_angle(&v1, &v2));

            if candidate.is_finite() {
                score = score.max(candidate);
            } else {
                log::warn!(
                    "score: skipping degenerate triple ({}, {}, {}), coincident z-discs",
                    node,
                    neighbor,
                    far
                );
            }
        }

        score
    }

    /// Recomputes every edge score of `graph`.
    pub fn score(&self, graph: &mut ZDiscGraph) {
        for edge in graph.edges_mut() {
            edge.score = 0.0;
        }

        for node in 0..graph.num_nodes() {
            for idx in 0..graph.neighbors(node).len() {
                let neighbor = graph.neighbors(node)[idx];
                let score = self.directed_score(graph, node, neighbor);

                if let Some(edge) = graph.edge_mut(node, neighbor) {
                    edge.score = edge.score.max(score);
                }
            }
        }

        log::debug!("scored {} edges", graph.num_edges());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NeighborGraphBuilder, Node};
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn chain() -> ZDiscGraph {
        NeighborGraphBuilder::new()
            .build((0..4).map(|i| Node::new(i as f64 * 12.0, 0.0, i)).collect())
            .unwrap()
    }

    fn scorer() -> ConnectionScorer {
        ConnectionScorer::new(ScoreParams::default())
    }

    #[test]
    fn directed_scores_on_chain() {
        let graph = chain();
        let s = scorer();

        // 0 -> 1 continues straight into 1 -> 2: length terms only
        assert_relative_eq!(s.directed_score(&graph, 0, 1), 2.0, epsilon = 1e-12);
        // 1 -> 0 is followed by 0 -> 2 pointing back
        assert_relative_eq!(s.directed_score(&graph, 1, 0), 2.5, epsilon = 1e-12);
        // 0 -> 2 (twice the expected length), best far node is 1
        let expected = (-PI).exp() + 1.0 / 1.5 + 1.0;
        assert_relative_eq!(s.directed_score(&graph, 0, 2), expected, epsilon = 1e-12);
    }

    #[test]
    fn edges_keep_best_direction() {
        let mut graph = chain();
        scorer().score(&mut graph);

        assert_relative_eq!(graph.edge(0, 1).unwrap().score, 2.5, epsilon = 1e-12);
        assert_relative_eq!(graph.edge(1, 2).unwrap().score, 2.5, epsilon = 1e-12);
        assert_relative_eq!(graph.edge(2, 3).unwrap().score, 2.5, epsilon = 1e-12);
        assert!(graph.edge(0, 3).unwrap().score < 2.0);
    }

    #[test]
    fn leaf_neighbor_scores_zero() {
        let mut graph = ZDiscGraph::new(vec![Node::new(0.0, 0.0, 0), Node::new(12.0, 0.0, 1)]);
        graph.add_edge(0, 1);

        scorer().score(&mut graph);

        assert_eq!(graph.edge(0, 1).unwrap().score, 0.0);
    }

    #[test]
    fn weights_are_applied() {
        let graph = chain();
        let s = ConnectionScorer::new(ScoreParams {
            c_avg_length: 0.0,
            c_angle: 2.0,
            c_diff_length: 0.0,
            l_avg: 12.0,
        });

        assert_relative_eq!(s.directed_score(&graph, 1, 0), 2.0, epsilon = 1e-12);
        assert_eq!(s.directed_score(&graph, 0, 1), 0.0);
    }

    #[test]
    fn coincident_points_do_not_poison_scores() {
        let mut graph = ZDiscGraph::new(vec![
            Node::new(0.0, 0.0, 0),
            Node::new(12.0, 0.0, 1),
            Node::new(12.0, 0.0, 2),
        ]);
        graph.add_edge(0, 1);
        graph.add_edge(1, 2);

        scorer().score(&mut graph);

        for (_, e) in graph.edges() {
            assert!(e.score.is_finite());
        }
    }
}
