use std::collections::BTreeMap;

use nalgebra as na;
use rayon::prelude::*;
use rstar::primitives::GeomWithData;
use rstar::RTree;
use serde_derive::{Deserialize, Serialize};

use crate::error::Error;
use crate::track::TrackTable;

/// Number of nearest other nodes every node is connected to.
pub const NUM_NEIGHBORS: usize = 3;

/// A representative Z-disc: the time-averaged position of one track.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub pos: na::Point2<f64>,
    pub track_id: i64,
}

impl Node {
    #[inline]
    pub fn new(x: f64, y: f64, track_id: i64) -> Self {
        Self {
            pos: na::Point2::new(x, y),
            track_id,
        }
    }
}

/// Candidate connection between two nodes.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Edge {
    pub score: f64,
    pub validity: u8,
}

/// Undirected graph over Z-discs. Nodes are addressed by their index; edges
/// are keyed by `(min, max)` node index.
#[derive(Debug, Clone, Default)]
pub struct ZDiscGraph {
    nodes: Vec<Node>,
    adjacency: Vec<Vec<usize>>,
    edges: BTreeMap<(usize, usize), Edge>,
}

#[inline]
fn key(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

impl ZDiscGraph {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self {
            adjacency: vec![Vec::new(); nodes.len()],
            nodes,
            edges: BTreeMap::new(),
        }
    }

    /// Adds an undirected edge; returns `false` for self-loops and edges that
    /// already exist.
    pub fn add_edge(&mut self, a: usize, b: usize) -> bool {
        if a == b || self.edges.contains_key(&key(a, b)) {
            return false;
        }

        self.edges.insert(key(a, b), Edge::default());
        self.adjacency[a].push(b);
        self.adjacency[b].push(a);

        true
    }

    /// Removes every edge for which `keep` returns `false`.
    pub fn retain_edges<F: FnMut((usize, usize), &Edge) -> bool>(&mut self, mut keep: F) {
        let adjacency = &mut self.adjacency;

        self.edges.retain(|&(a, b), edge| {
            if keep((a, b), edge) {
                return true;
            }

            adjacency[a].retain(|&n| n != b);
            adjacency[b].retain(|&n| n != a);
            false
        });
    }

    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn node(&self, idx: usize) -> &Node {
        &self.nodes[idx]
    }

    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[inline]
    pub fn pos(&self, idx: usize) -> na::Point2<f64> {
        self.nodes[idx].pos
    }

    /// Neighbors of `idx` in insertion order.
    #[inline]
    pub fn neighbors(&self, idx: usize) -> &[usize] {
        &self.adjacency[idx]
    }

    #[inline]
    pub fn edge(&self, a: usize, b: usize) -> Option<&Edge> {
        self.edges.get(&key(a, b))
    }

    #[inline]
    pub fn edge_mut(&mut self, a: usize, b: usize) -> Option<&mut Edge> {
        self.edges.get_mut(&key(a, b))
    }

    /// Edges ordered by `(min, max)` node index.
    #[inline]
    pub fn edges(&self) -> impl Iterator<Item = ((usize, usize), &Edge)> {
        self.edges.iter().map(|(&k, e)| (k, e))
    }

    #[inline]
    pub fn edges_mut(&mut self) -> impl Iterator<Item = &mut Edge> {
        self.edges.values_mut()
    }

    /// Node indices of every connected component, each sorted, ordered by
    /// their smallest node.
    pub fn connected_components(&self) -> Vec<Vec<usize>> {
        let mut seen = vec![false; self.nodes.len()];
        let mut components = Vec::new();

        for start in 0..self.nodes.len() {
            if seen[start] {
                continue;
            }
            seen[start] = true;

            let mut component = vec![start];
            let mut stack = vec![start];

            while let Some(idx) = stack.pop() {
                for &n in &self.adjacency[idx] {
                    if !seen[n] {
                        seen[n] = true;
                        component.push(n);
                        stack.push(n);
                    }
                }
            }

            component.sort_unstable();
            components.push(component);
        }

        components
    }
}

type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// Builds the candidate graph: every node is connected to its
/// [`NUM_NEIGHBORS`] nearest other nodes.
///
/// Neighbor search uses an R-tree; which of several equidistant nodes is
/// picked is implementation-defined, but the result is the same for the same
/// input order.
#[derive(Debug, Clone)]
pub struct NeighborGraphBuilder {
    num_neighbors: usize,
}

impl Default for NeighborGraphBuilder {
    fn default() -> Self {
        Self {
            num_neighbors: NUM_NEIGHBORS,
        }
    }
}

impl NeighborGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(&self, nodes: Vec<Node>) -> Result<ZDiscGraph, Error> {
        if nodes.len() < 2 {
            return Err(Error::InsufficientData {
                needed: 2,
                found: nodes.len(),
            });
        }

        let tree = RTree::bulk_load(
            nodes
                .iter()
                .enumerate()
                .map(|(idx, n)| IndexedPoint::new([n.pos.x, n.pos.y], idx))
                .collect(),
        );

        let nearest: Vec<Vec<usize>> = nodes
            .par_iter()
            .enumerate()
            .map(|(idx, n)| {
                tree.nearest_neighbor_iter(&[n.pos.x, n.pos.y])
                    .map(|g| g.data)
                    .filter(|&other| other != idx)
                    .take(self.num_neighbors)
                    .collect()
            })
            .collect();

        let mut graph = ZDiscGraph::new(nodes);
        for (idx, neighbors) in nearest.into_iter().enumerate() {
            for n in neighbors {
                graph.add_edge(idx, n);
            }
        }

        log::debug!(
            "neighbor graph: {} nodes, {} candidate edges",
            graph.num_nodes(),
            graph.num_edges()
        );

        Ok(graph)
    }

    /// One node per track, at its time-averaged position.
    pub fn build_from_tracks(&self, tracks: &TrackTable) -> Result<ZDiscGraph, Error> {
        self.build(
            tracks
                .iter()
                .map(|t| Node {
                    pos: t.mean_position(),
                    track_id: t.track_id,
                })
                .collect(),
        )
    }
}
