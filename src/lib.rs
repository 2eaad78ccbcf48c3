pub mod cluster;
pub mod config;
pub mod consolidate;
pub mod error;
pub mod graph;
pub mod math;
pub mod myofibril;
pub mod prune;
pub mod score;
pub mod track;
pub mod zdisc;

pub use config::{InputKind, SarcGraphConfig};
pub use consolidate::TrackConsolidator;
pub use graph::{NeighborGraphBuilder, Node, ZDiscGraph};
pub use myofibril::{MyofibrilAssembler, MyofibrilReport, SarcomereField};
pub use prune::ConnectionPruner;
pub use score::ConnectionScorer;
pub use track::{Track, TrackTable};
pub use zdisc::{ZDisc, ZDiscTable};

use error::Error;

/// Links Z-discs across frames into tracks.
///
/// `memory` is the number of frames a Z-disc may disappear for before its
/// track ends.
pub trait Linker {
    fn link(
        &mut self,
        zdiscs: &ZDiscTable,
        search_radius: f64,
        memory: usize,
    ) -> Result<TrackTable, Error>;
}

/// Sarcomere detection pipeline.
pub struct SarcGraph {
    config: SarcGraphConfig,
}

impl SarcGraph {
    pub fn new(config: SarcGraphConfig) -> Result<Self, Error> {
        config.validate()?;

        Ok(Self { config })
    }

    #[inline]
    pub fn config(&self) -> &SarcGraphConfig {
        &self.config
    }

    /// Turns per-frame Z-discs into consolidated tracks. Images get one
    /// track per Z-disc; videos are linked, stripped of short tracks, and
    /// consolidated.
    pub fn zdisc_tracking<L: Linker>(
        &self,
        zdiscs: ZDiscTable,
        linker: &mut L,
    ) -> Result<TrackTable, Error> {
        if zdiscs.is_empty() {
            return Err(Error::InvalidArgument("no z-discs to track".into()));
        }

        match self.config.input {
            InputKind::Image => {
                log::info!("input is a single image, skipping tracking");
                zdiscs.into_row_tracks()
            }

            InputKind::Video => {
                let num_frames = zdiscs.num_frames();
                if num_frames < 2 {
                    return Err(Error::DataIntegrity(format!(
                        "video is not loaded correctly: {} frame(s)",
                        num_frames
                    )));
                }

                let params = &self.config.consolidation;
                let tracked = linker.link(&zdiscs, self.config.linking.search_radius, num_frames)?;
                let min_len = (num_frames as f64 * params.stub_fraction) as usize;

                TrackConsolidator::new(params.clone()).run(&tracked.filter_stubs(min_len))
            }
        }
    }

    /// Builds the neighbor graph over `tracks`, scores and prunes it, and
    /// describes the surviving sarcomeres frame by frame.
    pub fn detect_myofibrils(&self, tracks: &TrackTable) -> Result<MyofibrilReport, Error> {
        let graph = self.sarcomere_graph(tracks)?;

        Ok(MyofibrilAssembler::new().assemble(&graph, tracks))
    }

    /// The pruned graph behind [`SarcGraph::detect_myofibrils`].
    pub fn sarcomere_graph(&self, tracks: &TrackTable) -> Result<ZDiscGraph, Error> {
        let mut graph = NeighborGraphBuilder::new().build_from_tracks(tracks)?;

        ConnectionScorer::new(self.config.score.clone()).score(&mut graph);
        ConnectionPruner::new(self.config.prune.clone()).prune(&mut graph);

        Ok(graph)
    }

    /// [`SarcGraph::zdisc_tracking`] followed by [`SarcGraph::detect_myofibrils`].
    pub fn run<L: Linker>(
        &self,
        zdiscs: ZDiscTable,
        linker: &mut L,
    ) -> Result<(TrackTable, MyofibrilReport), Error> {
        let tracks = self.zdisc_tracking(zdiscs, linker)?;
        let report = self.detect_myofibrils(&tracks)?;

        Ok((tracks, report))
    }
}
