use nalgebra as na;
use serde_derive::{Deserialize, Serialize};

use crate::config::InputKind;
use crate::error::Error;
use crate::track::TrackTable;

/// Number of values describing one Z-disc: center, endpoint 1, endpoint 2.
pub const ZDISC_ROW_LEN: usize = 6;

/// A single Z-disc detected in one frame.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ZDisc {
    pub frame: usize,
    pub center: na::Point2<f64>,
    // endpoints of the longest chord of the contour
    pub p1: na::Point2<f64>,
    pub p2: na::Point2<f64>,
}

impl ZDisc {
    #[inline]
    pub fn new(frame: usize, row: [f64; ZDISC_ROW_LEN]) -> Self {
        Self {
            frame,
            center: na::Point2::new(row[0], row[1]),
            p1: na::Point2::new(row[2], row[3]),
            p2: na::Point2::new(row[4], row[5]),
        }
    }

    #[inline]
    pub fn width(&self) -> f64 {
        na::distance(&self.p1, &self.p2)
    }
}

/// Flat table of Z-discs over all frames, before any track identity is known.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ZDiscTable {
    zdiscs: Vec<ZDisc>,
    num_frames: usize,
}

impl ZDiscTable {
    /// Flattens per-frame Z-disc rows `(cx, cy, p1x, p1y, p2x, p2y)`.
    pub fn from_frames(
        frames: &[Vec<[f64; ZDISC_ROW_LEN]>],
        input: InputKind,
    ) -> Result<Self, Error> {
        check_frame_count(frames.len(), input)?;

        let zdiscs = frames
            .iter()
            .enumerate()
            .flat_map(|(frame, rows)| rows.iter().map(move |row| ZDisc::new(frame, *row)))
            .collect();

        Ok(Self {
            zdiscs,
            num_frames: frames.len(),
        })
    }

    /// Same as [`ZDiscTable::from_frames`] for untyped rows; every row must hold
    /// exactly six values.
    pub fn from_rows(frames: &[Vec<Vec<f64>>], input: InputKind) -> Result<Self, Error> {
        let mut typed = Vec::with_capacity(frames.len());

        for (frame, rows) in frames.iter().enumerate() {
            let mut out = Vec::with_capacity(rows.len());

            for row in rows {
                let row: [f64; ZDISC_ROW_LEN] = row.as_slice().try_into().map_err(|_| {
                    Error::InvalidArgument(format!(
                        "frame {}: expected {} values per z-disc, got {}",
                        frame,
                        ZDISC_ROW_LEN,
                        row.len()
                    ))
                })?;

                out.push(row);
            }

            typed.push(out);
        }

        Self::from_frames(&typed, input)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.zdiscs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.zdiscs.is_empty()
    }

    #[inline]
    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &ZDisc> {
        self.zdiscs.iter()
    }

    #[inline]
    pub fn frame(&self, frame: usize) -> impl Iterator<Item = &ZDisc> {
        self.zdiscs.iter().filter(move |z| z.frame == frame)
    }

    /// Gives every Z-disc its row index as particle id. Used for single images,
    /// where there is nothing to link.
    pub fn into_row_tracks(self) -> Result<TrackTable, Error> {
        TrackTable::from_records(
            self.zdiscs
                .into_iter()
                .enumerate()
                .map(|(idx, z)| (idx as i64, z)),
        )
    }
}

fn check_frame_count(count: usize, input: InputKind) -> Result<(), Error> {
    match input {
        InputKind::Video if count < 2 => Err(Error::DataIntegrity(format!(
            "video is not loaded correctly: {} frame(s)",
            count
        ))),
        InputKind::Image if count == 0 => Err(Error::InvalidArgument("image has no frames".into())),
        _ => Ok(()),
    }
}
