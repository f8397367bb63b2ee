use crate::dark_regions::accumulator::CategoryTally;
use crate::dark_regions::types::RegionCategory;
use crate::error::Result;
use log::info;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// What a scan (or one shard of it) produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub shards: usize,
    pub loci_assessed: u64,
    pub ignored_contigs: BTreeSet<String>,
    pub incomplete: CategoryTally,
    pub low_depth_dark: CategoryTally,
    pub low_mapq_dark: CategoryTally,
}

impl ScanSummary {
    pub fn tally(&self, category: RegionCategory) -> &CategoryTally {
        match category {
            RegionCategory::Incomplete => &self.incomplete,
            RegionCategory::LowDepthDark => &self.low_depth_dark,
            RegionCategory::LowMapqDark => &self.low_mapq_dark,
        }
    }

    pub fn tally_mut(&mut self, category: RegionCategory) -> &mut CategoryTally {
        match category {
            RegionCategory::Incomplete => &mut self.incomplete,
            RegionCategory::LowDepthDark => &mut self.low_depth_dark,
            RegionCategory::LowMapqDark => &mut self.low_mapq_dark,
        }
    }

    /// Folds another shard's counts into this one.
    pub fn merge(&mut self, other: &ScanSummary) {
        self.shards += other.shards;
        self.loci_assessed += other.loci_assessed;
        self.ignored_contigs
            .extend(other.ignored_contigs.iter().cloned());
        for category in RegionCategory::ALL {
            self.tally_mut(category).merge(other.tally(category));
        }
    }
}

pub fn log_summary(summary: &ScanSummary) {
    info!(
        "Assessed {} loci across {} shard(s)",
        summary.loci_assessed, summary.shards
    );
    for category in RegionCategory::ALL {
        let tally = summary.tally(category);
        info!(
            "{}: {} region(s), {} locus row(s)",
            category, tally.regions, tally.loci
        );
    }
    if !summary.ignored_contigs.is_empty() {
        info!(
            "Ignored contigs missing from the reference: {}",
            summary
                .ignored_contigs
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
}

pub fn write_json(path: &Path, summary: &ScanSummary) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, summary).map_err(std::io::Error::from)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
