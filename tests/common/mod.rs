#![allow(dead_code)]

use sarcgraph::error::Error;
use sarcgraph::{Linker, Node, TrackTable, ZDisc, ZDiscTable};

/// Vertical Z-disc of the given half width centered at `(x, y)`.
pub fn zdisc_row(x: f64, y: f64, half_width: f64) -> [f64; 6] {
    [x, y, x, y - half_width, x, y + half_width]
}

pub fn nodes(points: &[(f64, f64)]) -> Vec<Node> {
    points
        .iter()
        .enumerate()
        .map(|(i, &(x, y))| Node::new(x, y, i as i64))
        .collect()
}

/// Tracks that sit still at `points` in every one of `num_frames` frames.
pub fn static_tracks(points: &[(f64, f64)], num_frames: usize) -> TrackTable {
    let records = points.iter().enumerate().flat_map(|(id, &(x, y))| {
        (0..num_frames).map(move |f| (id as i64, ZDisc::new(f, zdisc_row(x, y, 2.0))))
    });

    TrackTable::from_records(records).unwrap()
}

/// Linker assigning ids with a fixed rule instead of a real linking algorithm.
pub struct ScriptedLinker<F> {
    pub assign: F,
    pub calls: Vec<(f64, usize)>,
}

impl<F: FnMut(&ZDisc) -> Option<i64>> ScriptedLinker<F> {
    pub fn new(assign: F) -> Self {
        Self {
            assign,
            calls: Vec::new(),
        }
    }
}

impl<F: FnMut(&ZDisc) -> Option<i64>> Linker for ScriptedLinker<F> {
    fn link(
        &mut self,
        zdiscs: &ZDiscTable,
        search_radius: f64,
        memory: usize,
    ) -> Result<TrackTable, Error> {
        self.calls.push((search_radius, memory));

        let mut records = Vec::new();
        for z in zdiscs.iter() {
            match (self.assign)(z) {
                Some(id) => records.push((id, *z)),
                None => return Err(Error::Linker(format!("cannot link {:?}", z.center))),
            }
        }

        TrackTable::from_records(records)
    }
}
