//! Parameters for every stage of the pipeline.
//!
//! Everything the pipeline needs is carried by [`SarcGraphConfig`]; there is
//! no process-wide state. All structs deserialize with defaults so a partial
//! config file is enough.

use serde_derive::{Deserialize, Serialize};

use crate::error::Error;

/// Kind of input the Z-disc table was produced from.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    /// A single frame, no tracking.
    Image,
    #[default]
    Video,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ConsolidationParams {
    /// Fraction of frames a merged cluster of partial tracks must cover, in (0, 1].
    pub partial_tracking_threshold: f64,
    /// Neighborhood radius of the density clustering (px).
    pub cluster_radius: f64,
    /// Minimum number of averaged track positions (self included) forming a core point.
    pub min_cluster_samples: usize,
    /// Tracks seen in fewer than `stub_fraction * frames` frames are dropped after linking.
    pub stub_fraction: f64,
}

impl Default for ConsolidationParams {
    fn default() -> Self {
        Self {
            partial_tracking_threshold: 0.75,
            cluster_radius: 1.0,
            min_cluster_samples: 2,
            stub_fraction: 0.10,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LinkingParams {
    /// Maximum displacement (px) between frames handed to the linker.
    pub search_radius: f64,
}

impl Default for LinkingParams {
    fn default() -> Self {
        Self { search_radius: 4.0 }
    }
}

/// Weights of the three geometric factors of a connection score.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ScoreParams {
    pub c_avg_length: f64,
    pub c_angle: f64,
    pub c_diff_length: f64,
    /// Expected sarcomere length (px).
    pub l_avg: f64,
}

impl Default for ScoreParams {
    fn default() -> Self {
        Self {
            c_avg_length: 1.0,
            c_angle: 1.0,
            c_diff_length: 1.0,
            l_avg: 12.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PruneParams {
    pub score_threshold: f64,
    /// Normalized angle (1.0 = right angle) a secondary connection must exceed.
    pub angle_threshold: f64,
}

impl Default for PruneParams {
    fn default() -> Self {
        Self {
            score_threshold: 0.01,
            angle_threshold: 1.2,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct SarcGraphConfig {
    pub input: InputKind,
    pub consolidation: ConsolidationParams,
    pub linking: LinkingParams,
    pub score: ScoreParams,
    pub prune: PruneParams,
}

impl SarcGraphConfig {
    pub fn validate(&self) -> Result<(), Error> {
        check_threshold(self.consolidation.partial_tracking_threshold)?;

        if !(self.consolidation.cluster_radius > 0.0) {
            return Err(Error::InvalidArgument(format!(
                "cluster_radius must be positive, got {}",
                self.consolidation.cluster_radius
            )));
        }

        if self.consolidation.min_cluster_samples == 0 {
            return Err(Error::InvalidArgument(
                "min_cluster_samples must be at least 1".into(),
            ));
        }

        if !(0.0..1.0).contains(&self.consolidation.stub_fraction) {
            return Err(Error::InvalidArgument(format!(
                "stub_fraction must be in [0, 1), got {}",
                self.consolidation.stub_fraction
            )));
        }

        if !(self.linking.search_radius > 0.0) {
            return Err(Error::InvalidArgument(format!(
                "search_radius must be positive, got {}",
                self.linking.search_radius
            )));
        }

        if !(self.score.l_avg > 0.0) {
            return Err(Error::InvalidArgument(format!(
                "l_avg must be positive, got {}",
                self.score.l_avg
            )));
        }

        if !self.prune.score_threshold.is_finite() || !self.prune.angle_threshold.is_finite() {
            return Err(Error::InvalidArgument(
                "prune thresholds must be finite".into(),
            ));
        }

        Ok(())
    }
}

/// Checks that a partial tracking threshold lies in (0, 1].
pub(crate) fn check_threshold(threshold: f64) -> Result<(), Error> {
    if threshold > 0.0 && threshold <= 1.0 {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!(
            "partial_tracking_threshold must be in (0, 1], got {}",
            threshold
        )))
    }
}
