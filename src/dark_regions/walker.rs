use crate::dark_regions::accumulator::RegionAccumulator;
use crate::dark_regions::classifier::{LocusClassification, LocusClassifier};
use crate::dark_regions::options::DarkRegionOptions;
use crate::dark_regions::report::ScanSummary;
use crate::dark_regions::types::{Locus, LocusRecord, PileupStats, RegionCategory};
use crate::error::{DarkRegionError, Result};
use crate::sources::ReferenceSource;
use log::{debug, warn};
use std::collections::HashSet;
use std::io::Write;
use std::ops::ControlFlow;
use std::sync::Arc;

const PROGRESS_INTERVAL: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkerState {
    Idle,
    Scanning,
    Closed,
}

/// Streams loci in genomic order through the classifier and the three accumulators.
///
/// Sinks are indexed by [`RegionCategory::index`]. A run stays open only while every
/// locus qualifies and sits on the same contig exactly one position after the previous
/// one; any break closes the run, writing it if it reached the minimum size.
///
/// Two extras support sharded scans. [`prime`](Self::prime) classifies the locus just
/// before a shard's first position so a run already in progress there is left to the
/// previous shard. [`begin_overrun`](Self::begin_overrun) lets a shard scan past its end
/// only to finish runs it already owns.
pub struct GenomeWalker<R: ReferenceSource, W: Write> {
    classifier: LocusClassifier,
    reference: R,
    accumulators: [RegionAccumulator<W>; 3],
    inherited: [bool; 3],
    overrun: bool,
    state: WalkerState,
    previous: Option<(Arc<str>, u64)>,
    ignored: HashSet<String>,
    loci_assessed: u64,
}

impl<R: ReferenceSource, W: Write> GenomeWalker<R, W> {
    pub fn new(options: &DarkRegionOptions, reference: R, sinks: [W; 3]) -> Self {
        let [incomplete, low_depth, low_mapq] = sinks;
        let accumulator = |category, sink| {
            RegionAccumulator::new(
                category,
                options.min_region_size,
                options.max_buffered_loci,
                sink,
            )
        };
        Self {
            classifier: LocusClassifier::new(options),
            reference,
            accumulators: [
                accumulator(RegionCategory::Incomplete, incomplete),
                accumulator(RegionCategory::LowDepthDark, low_depth),
                accumulator(RegionCategory::LowMapqDark, low_mapq),
            ],
            inherited: [false; 3],
            overrun: false,
            state: WalkerState::Idle,
            previous: None,
            ignored: HashSet::new(),
            loci_assessed: 0,
        }
    }

    pub fn state(&self) -> WalkerState {
        self.state
    }

    pub fn has_open_run(&self) -> bool {
        self.accumulators.iter().any(RegionAccumulator::is_open)
    }

    /// Records which categories the locus before the scan start belongs to.
    pub fn prime(&mut self, contig: &str, position: u64, stats: &PileupStats) -> Result<()> {
        if self.state != WalkerState::Idle || !self.reference.has_sequence(contig) {
            return Ok(());
        }
        let base = self.reference.base_at(contig, position)?;
        let classification = self.classifier.classify(base, stats);
        for category in RegionCategory::ALL {
            self.inherited[category.index()] = classification.qualifies(category);
        }
        self.previous = Some((Arc::from(contig), position));
        Ok(())
    }

    /// From here on only runs that are already open may be extended. Returns whether any is.
    pub fn begin_overrun(&mut self) -> bool {
        self.overrun = true;
        self.has_open_run()
    }

    pub fn visit(
        &mut self,
        contig: &str,
        position: u64,
        stats: &PileupStats,
    ) -> Result<ControlFlow<()>> {
        match self.state {
            WalkerState::Closed => {
                return Err(DarkRegionError::WalkerClosed {
                    contig: contig.to_string(),
                    position,
                })
            }
            WalkerState::Idle => self.state = WalkerState::Scanning,
            WalkerState::Scanning => {}
        }

        for accumulator in self.accumulators.iter_mut() {
            accumulator.flush_if_oversized()?;
        }

        if self.ignored.contains(contig) {
            return Ok(ControlFlow::Continue(()));
        }
        if !self.reference.has_sequence(contig) {
            warn!(
                "Alignment file has loci on {} but the reference does not contain it. Skipping.",
                contig
            );
            self.ignored.insert(contig.to_string());
            self.close_all()?;
            return Ok(ControlFlow::Continue(()));
        }

        if !self.follows_previous(contig, position) {
            self.close_all()?;
            self.inherited = [false; 3];
        }
        let contig_name = self.remember(contig, position);

        let locus = Locus {
            contig,
            position,
            reference_base: self.reference.base_at(contig, position)?,
        };
        let classification = self.classifier.classify(locus.reference_base, stats);
        // Overrun loci are counted by the shard that owns them.
        if !self.overrun {
            self.loci_assessed += 1;
        }
        if !self.overrun && self.loci_assessed % PROGRESS_INTERVAL == 0 {
            debug!(
                "Assessed {} loci, now at {}:{}",
                self.loci_assessed, locus.contig, locus.position
            );
        }

        if classification.incomplete {
            self.extend(RegionCategory::Incomplete, &contig_name, &locus, &classification);
            self.close(RegionCategory::LowDepthDark)?;
            self.close(RegionCategory::LowMapqDark)?;
        } else {
            self.close(RegionCategory::Incomplete)?;
            for category in [RegionCategory::LowDepthDark, RegionCategory::LowMapqDark] {
                if classification.qualifies(category) {
                    self.extend(category, &contig_name, &locus, &classification);
                } else {
                    self.close(category)?;
                }
            }
        }

        if self.overrun && !self.has_open_run() {
            return Ok(ControlFlow::Break(()));
        }
        Ok(ControlFlow::Continue(()))
    }

    /// Flushes every open run and stops accepting loci.
    pub fn finish(&mut self) -> Result<()> {
        if self.state != WalkerState::Closed {
            self.close_all()?;
            self.state = WalkerState::Closed;
        }
        Ok(())
    }

    /// Closes the walker if needed and hands back the flushed sinks with the shard's counts.
    pub fn into_parts(mut self) -> Result<([W; 3], ScanSummary)> {
        self.finish()?;
        let mut summary = ScanSummary {
            shards: 1,
            loci_assessed: self.loci_assessed,
            ignored_contigs: self.ignored.into_iter().collect(),
            ..Default::default()
        };
        let [incomplete, low_depth, low_mapq] = self.accumulators;
        let mut sink = |accumulator: RegionAccumulator<W>| -> Result<W> {
            let category = accumulator.category();
            let (sink, tally) = accumulator.into_sink()?;
            *summary.tally_mut(category) = tally;
            Ok(sink)
        };
        let sinks = [sink(incomplete)?, sink(low_depth)?, sink(low_mapq)?];
        Ok((sinks, summary))
    }

    fn follows_previous(&self, contig: &str, position: u64) -> bool {
        matches!(&self.previous, Some((name, last)) if &**name == contig && *last + 1 == position)
    }

    fn remember(&mut self, contig: &str, position: u64) -> Arc<str> {
        let name = match &self.previous {
            Some((name, _)) if &**name == contig => Arc::clone(name),
            _ => Arc::from(contig),
        };
        self.previous = Some((Arc::clone(&name), position));
        name
    }

    fn extend(
        &mut self,
        category: RegionCategory,
        contig: &Arc<str>,
        locus: &Locus<'_>,
        classification: &LocusClassification,
    ) {
        let index = category.index();
        let accumulator = &mut self.accumulators[index];
        // Runs that began before this shard belong to the previous one.
        if self.inherited[index] || (self.overrun && !accumulator.is_open()) {
            return;
        }
        accumulator.extend(LocusRecord {
            contig: Arc::clone(contig),
            position: locus.position,
            metrics: if category.is_dark() {
                classification.metrics
            } else {
                None
            },
        });
    }

    fn close(&mut self, category: RegionCategory) -> Result<()> {
        let index = category.index();
        self.inherited[index] = false;
        self.accumulators[index].flush_if_qualifying()?;
        Ok(())
    }

    fn close_all(&mut self) -> Result<()> {
        for category in RegionCategory::ALL {
            self.close(category)?;
        }
        Ok(())
    }
}
