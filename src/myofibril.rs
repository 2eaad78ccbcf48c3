use nalgebra as na;
use ndarray::{s, Array3, ArrayView2};
use serde_derive::{Deserialize, Serialize};

use crate::graph::ZDiscGraph;
use crate::math::folded_angle;
use crate::track::TrackTable;

/// Per-frame quantities stored for every sarcomere, in array order.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SarcomereField {
    /// Sum (not the mean) of both Z-disc center x coordinates.
    MidX = 0,
    /// Sum (not the mean) of both Z-disc center y coordinates.
    MidY = 1,
    Length = 2,
    Width = 3,
    /// Orientation in `[0, pi)`.
    Angle = 4,
}

impl SarcomereField {
    pub const COUNT: usize = 5;

    pub const ALL: [SarcomereField; Self::COUNT] = [
        SarcomereField::MidX,
        SarcomereField::MidY,
        SarcomereField::Length,
        SarcomereField::Width,
        SarcomereField::Angle,
    ];
}

/// A connection between two Z-discs that survived pruning.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sarcomere {
    /// Graph node indices, smaller first.
    pub nodes: (usize, usize),
    /// Track ids of the two Z-discs.
    pub zdiscs: (i64, i64),
}

/// A chain of sarcomeres: one connected component of the pruned graph.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Myofibril {
    /// Sorted graph node indices.
    pub nodes: Vec<usize>,
    pub track_ids: Vec<i64>,
    /// Indices into [`MyofibrilReport::sarcomeres`].
    pub sarcomeres: Vec<usize>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MyofibrilReport {
    pub myofibrils: Vec<Myofibril>,
    pub sarcomeres: Vec<Sarcomere>,
    /// Indexed `[field, sarcomere, frame]`, see [`SarcomereField`]. NaN where
    /// either Z-disc is missing in a frame. Frames run from 0 up to, but not
    /// including, the last frame of the track table.
    pub series: Array3<f64>,
}

impl MyofibrilReport {
    #[inline]
    pub fn num_frames(&self) -> usize {
        self.series.dim().2
    }

    /// `[sarcomere, frame]` view of one field.
    #[inline]
    pub fn field(&self, field: SarcomereField) -> ArrayView2<'_, f64> {
        self.series.slice(s![field as usize, .., ..])
    }

    #[inline]
    pub fn value(&self, field: SarcomereField, sarcomere: usize, frame: usize) -> f64 {
        self.series[[field as usize, sarcomere, frame]]
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MyofibrilAssembler;

impl MyofibrilAssembler {
    pub fn new() -> Self {
        Self
    }

    pub fn assemble(&self, graph: &ZDiscGraph, tracks: &TrackTable) -> MyofibrilReport {
        let mut myofibrils = Vec::new();
        let mut sarcomeres = Vec::new();

        for nodes in graph.connected_components() {
            let mut members = Vec::new();

            for &a in &nodes {
                for &b in graph.neighbors(a) {
                    if a < b {
                        members.push(sarcomeres.len());
                        sarcomeres.push(Sarcomere {
                            nodes: (a, b),
                            zdiscs: (graph.node(a).track_id, graph.node(b).track_id),
                        });
                    }
                }
            }

            myofibrils.push(Myofibril {
                track_ids: nodes.iter().map(|&n| graph.node(n).track_id).collect(),
                nodes,
                sarcomeres: members,
            });
        }

        // the last frame is left out
        let num_frames = tracks.num_frames().saturating_sub(1);
        let mut series = Array3::from_elem(
            (SarcomereField::COUNT, sarcomeres.len(), num_frames),
            f64::NAN,
        );

        for (i, sarc) in sarcomeres.iter().enumerate() {
            let (Some(t1), Some(t2)) = (tracks.get(sarc.zdiscs.0), tracks.get(sarc.zdiscs.1)) else {
                log::warn!("sarcomere {}: track {:?} not in table", i, sarc.zdiscs);
                continue;
            };

            for frame in 0..num_frames {
                let (Some(z1), Some(z2)) = (t1.at_frame(frame), t2.at_frame(frame)) else {
                    continue;
                };

                let values = [
                    z1.center.x + z2.center.x,
                    z1.center.y + z2.center.y,
                    na::distance(&z1.center, &z2.center),
                    (z1.width() + z2.width()) / 2.0,
                    folded_angle(&z1.center, &z2.center),
                ];

                for (field, value) in SarcomereField::ALL.iter().zip(values) {
                    series[[*field as usize, i, frame]] = value;
                }
            }
        }

        log::debug!(
            "assemble: {} myofibrils, {} sarcomeres, {} frames",
            myofibrils.len(),
            sarcomeres.len(),
            num_frames
        );

        MyofibrilReport {
            myofibrils,
            sarcomeres,
            series,
        }
    }
}
