use std::collections::btree_map::{BTreeMap, Entry};

use nalgebra as na;
use serde_derive::{Deserialize, Serialize};

use crate::error::Error;
use crate::zdisc::ZDisc;

/// One Z-disc followed over time. Negative ids mark tracks merged from
/// several partial tracks.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Track {
    pub track_id: i64,
    // ordered by frame, at most one per frame
    zdiscs: Vec<ZDisc>,
}

impl Track {
    pub(crate) fn from_sorted(track_id: i64, zdiscs: Vec<ZDisc>) -> Self {
        debug_assert!(zdiscs.windows(2).all(|w| w[0].frame < w[1].frame));

        Self { track_id, zdiscs }
    }

    /// Number of frames the track appears in.
    #[inline]
    pub fn frequency(&self) -> usize {
        self.zdiscs.len()
    }

    #[inline]
    pub fn is_complete(&self, num_frames: usize) -> bool {
        self.frequency() == num_frames
    }

    #[inline]
    pub fn zdiscs(&self) -> &[ZDisc] {
        &self.zdiscs
    }

    #[inline]
    pub fn frames(&self) -> impl Iterator<Item = usize> + '_ {
        self.zdiscs.iter().map(|z| z.frame)
    }

    pub fn at_frame(&self, frame: usize) -> Option<&ZDisc> {
        self.zdiscs
            .binary_search_by_key(&frame, |z| z.frame)
            .ok()
            .map(|idx| &self.zdiscs[idx])
    }

    /// Time-averaged center.
    pub fn mean_position(&self) -> na::Point2<f64> {
        let n = self.zdiscs.len().max(1) as f64;
        let sum = self
            .zdiscs
            .iter()
            .fold(na::Vector2::zeros(), |acc, z| acc + z.center.coords);

        (sum / n).into()
    }
}

/// Tracks keyed by id, plus the number of frames they span
/// (last frame + 1).
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TrackTable {
    tracks: BTreeMap<i64, Track>,
    num_frames: usize,
}

impl TrackTable {
    /// Groups `(track_id, zdisc)` records into tracks. A track id may occur
    /// only once per frame.
    pub fn from_records<I>(records: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (i64, ZDisc)>,
    {
        let mut grouped: BTreeMap<i64, BTreeMap<usize, ZDisc>> = BTreeMap::new();

        for (track_id, zdisc) in records {
            match grouped.entry(track_id).or_default().entry(zdisc.frame) {
                Entry::Vacant(slot) => {
                    slot.insert(zdisc);
                }
                Entry::Occupied(_) => {
                    return Err(Error::InvalidArgument(format!(
                        "track {} appears twice in frame {}",
                        track_id, zdisc.frame
                    )))
                }
            }
        }

        Ok(Self::from_tracks(grouped.into_iter().map(|(id, frames)| {
            Track::from_sorted(id, frames.into_values().collect())
        })))
    }

    pub(crate) fn from_tracks<I: IntoIterator<Item = Track>>(tracks: I) -> Self {
        let tracks: BTreeMap<_, _> = tracks
            .into_iter()
            .filter(|t| t.frequency() > 0)
            .map(|t| (t.track_id, t))
            .collect();

        let num_frames = tracks
            .values()
            .filter_map(|t| t.zdiscs.last())
            .map(|z| z.frame + 1)
            .max()
            .unwrap_or(0);

        Self { tracks, num_frames }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    #[inline]
    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    /// Total number of records over all tracks.
    pub fn num_records(&self) -> usize {
        self.tracks.values().map(Track::frequency).sum()
    }

    #[inline]
    pub fn get(&self, track_id: i64) -> Option<&Track> {
        self.tracks.get(&track_id)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    #[inline]
    pub fn ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.tracks.keys().copied()
    }

    /// Drops tracks seen in fewer than `min_len` frames. The frame count of
    /// the table is kept.
    pub fn filter_stubs(mut self, min_len: usize) -> Self {
        let before = self.tracks.len();
        self.tracks.retain(|_, t| t.frequency() >= min_len);

        log::debug!(
            "filter_stubs: kept {} of {} tracks (min_len={})",
            self.tracks.len(),
            before,
            min_len
        );

        self
    }

    /// Flattens the table back into `(track_id, zdisc)` records ordered by id
    /// then frame.
    pub fn records(&self) -> impl Iterator<Item = (i64, &ZDisc)> {
        self.tracks
            .values()
            .flat_map(|t| t.zdiscs.iter().map(move |z| (t.track_id, z)))
    }
}
