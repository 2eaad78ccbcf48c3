//! Track consolidation.
//!
//! Tracks seen in every frame are kept as they are. Partial tracks are
//! clustered on their time-averaged positions; every cluster whose members
//! together cover enough frames becomes a single merged track with a fresh
//! negative id. Everything else is dropped.

use std::collections::BTreeMap;

use nalgebra as na;

use crate::cluster::density_clusters;
use crate::config::{check_threshold, ConsolidationParams};
use crate::error::Error;
use crate::track::{Track, TrackTable};
use crate::zdisc::ZDisc;

pub struct TrackConsolidator {
    params: ConsolidationParams,
}

impl TrackConsolidator {
    pub fn new(params: ConsolidationParams) -> Self {
        Self { params }
    }

    /// Consolidates `tracks` using the configured threshold.
    #[inline]
    pub fn run(&self, tracks: &TrackTable) -> Result<TrackTable, Error> {
        self.consolidate(tracks, self.params.partial_tracking_threshold)
    }

    pub fn consolidate(
        &self,
        tracks: &TrackTable,
        partial_tracking_threshold: f64,
    ) -> Result<TrackTable, Error> {
        if tracks.num_records() == 0 {
            return Err(Error::InvalidArgument("no tracked z-discs to consolidate".into()));
        }
        check_threshold(partial_tracking_threshold)?;

        let num_frames = tracks.num_frames();
        let (complete, partial): (Vec<&Track>, Vec<&Track>) =
            tracks.iter().partition(|t| t.is_complete(num_frames));

        let positions: Vec<na::Point2<f64>> = partial.iter().map(|t| t.mean_position()).collect();
        let labels = density_clusters(
            &positions,
            self.params.cluster_radius,
            self.params.min_cluster_samples,
        );

        let mut clusters: BTreeMap<usize, Vec<&Track>> = BTreeMap::new();
        for (&track, label) in partial.iter().zip(labels) {
            if let Some(cluster) = label {
                clusters.entry(cluster).or_default().push(track);
            }
        }

        // fresh ids go below every id already in use
        let mut next_id = tracks.ids().next().unwrap_or(0).min(0) - 1;
        let min_coverage = partial_tracking_threshold * num_frames as f64;

        let mut merged = Vec::new();
        for members in clusters.values() {
            let zdiscs = merge_by_frame(members);

            if zdiscs.len() as f64 > min_coverage {
                merged.push(Track::from_sorted(next_id, zdiscs));
                next_id -= 1;
            }
        }

        log::debug!(
            "consolidate: {} complete, {} partial in {} clusters -> {} merged (frames={})",
            complete.len(),
            partial.len(),
            clusters.len(),
            merged.len(),
            num_frames
        );

        Ok(TrackTable::from_tracks(
            complete.into_iter().cloned().chain(merged),
        ))
    }
}

/// Averages the records of all member tracks frame by frame.
fn merge_by_frame(members: &[&Track]) -> Vec<ZDisc> {
    let mut frames: BTreeMap<usize, Vec<&ZDisc>> = BTreeMap::new();
    for zdisc in members.iter().flat_map(|t| t.zdiscs()) {
        frames.entry(zdisc.frame).or_default().push(zdisc);
    }

    frames
        .into_iter()
        .map(|(frame, zdiscs)| {
            let n = zdiscs.len() as f64;
            let mean = |f: fn(&ZDisc) -> na::Point2<f64>| -> na::Point2<f64> {
                let sum = zdiscs
                    .iter()
                    .fold(na::Vector2::zeros(), |acc, z| acc + f(*z).coords);
                (sum / n).into()
            };

            ZDisc {
                frame,
                center: mean(|z| z.center),
                p1: mean(|z| z.p1),
                p2: mean(|z| z.p2),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn zd(frame: usize, x: f64, y: f64) -> ZDisc {
        ZDisc::new(frame, [x, y, x, y - 1.0, x, y + 1.0])
    }

    fn track(id: i64, frames: &[usize], x: f64, y: f64) -> Vec<(i64, ZDisc)> {
        frames.iter().map(|&f| (id, zd(f, x, y))).collect()
    }

    fn consolidator() -> TrackConsolidator {
        TrackConsolidator::new(ConsolidationParams::default())
    }

    #[test]
    fn merges_fragments_into_full_coverage() {
        let mut records = track(1, &[0, 1], 10.0, 10.0);
        records.extend(track(2, &[1, 2], 10.2, 10.0));
        records.extend(track(3, &[2, 3], 10.4, 10.0));
        let table = TrackTable::from_records(records).unwrap();

        let out = consolidator().consolidate(&table, 0.5).unwrap();

        assert_eq!(out.len(), 1);
        let merged = out.iter().next().unwrap();
        assert!(merged.track_id < 0);
        assert_eq!(merged.frequency(), 4);
        assert_eq!(merged.frames().collect::<Vec<_>>(), vec![0, 1, 2, 3]);

        // frame 1 averages tracks 1 and 2
        let z = merged.at_frame(1).unwrap();
        assert_relative_eq!(z.center.x, 10.1, epsilon = 1e-12);
        assert_relative_eq!(z.p1.y, 9.0, epsilon = 1e-12);
        assert_relative_eq!(merged.at_frame(3).unwrap().center.x, 10.4, epsilon = 1e-12);
    }

    #[test]
    fn keeps_complete_tracks_and_drops_noise() {
        let mut records = track(5, &[0, 1, 2, 3], 0.0, 0.0);
        records.extend(track(6, &[0, 1, 2, 3], 20.0, 0.0));
        // lone partial track, no cluster
        records.extend(track(7, &[0, 1, 2], 40.0, 0.0));
        let table = TrackTable::from_records(records).unwrap();

        let out = consolidator().consolidate(&table, 0.5).unwrap();

        assert_eq!(out.ids().collect::<Vec<_>>(), vec![5, 6]);
        assert_eq!(out.get(5).unwrap(), table.get(5).unwrap());
    }

    #[test]
    fn drops_cluster_below_coverage() {
        let mut records = track(1, &[0, 1, 2, 3, 4, 5, 6, 7], 0.0, 0.0);
        records.extend(track(2, &[0], 30.0, 0.0));
        records.extend(track(3, &[1], 30.5, 0.0));
        let table = TrackTable::from_records(records).unwrap();

        let out = consolidator().consolidate(&table, 0.5).unwrap();

        assert_eq!(out.ids().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn coverage_must_strictly_exceed_threshold() {
        let mut records = track(1, &[0, 1, 2, 3], 0.0, 0.0);
        records.extend(track(2, &[0], 30.0, 0.0));
        records.extend(track(3, &[1], 30.5, 0.0));
        let table = TrackTable::from_records(records).unwrap();

        // 2 frames out of 4 is not more than half
        let out = consolidator().consolidate(&table, 0.5).unwrap();
        assert_eq!(out.len(), 1);

        let out = consolidator().consolidate(&table, 0.4).unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn synthetic_ids_do_not_collide() {
        let mut records = track(-1, &[0, 1, 2, 3], 0.0, 0.0);
        records.extend(track(2, &[0, 1], 30.0, 0.0));
        records.extend(track(3, &[2, 3], 30.5, 0.0));
        records.extend(track(4, &[0, 1], 60.0, 0.0));
        records.extend(track(8, &[2, 3], 60.5, 0.0));
        let table = TrackTable::from_records(records).unwrap();

        let out = consolidator().consolidate(&table, 0.5).unwrap();

        assert_eq!(out.ids().collect::<Vec<_>>(), vec![-3, -2, -1]);
        assert_eq!(out.get(-2).unwrap().mean_position().x, 30.25);
        assert_eq!(out.get(-3).unwrap().mean_position().x, 60.25);
    }

    #[test]
    fn rejects_bad_input() {
        let table = TrackTable::from_records(track(1, &[0, 1], 0.0, 0.0)).unwrap();

        for t in [0.0, -1.0, 1.01] {
            assert!(matches!(
                consolidator().consolidate(&table, t),
                Err(Error::InvalidArgument(_))
            ));
        }

        assert!(matches!(
            consolidator().consolidate(&TrackTable::default(), 0.5),
            Err(Error::InvalidArgument(_))
        ));
    }
}
