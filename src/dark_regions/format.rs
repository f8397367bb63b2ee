//! BED row formatting. Records carry 1-based positions; rows are 0-based, end-exclusive.

use crate::dark_regions::types::{LocusRecord, RegionCategory};
use std::io::{self, Write};

pub fn header_line(category: RegionCategory) -> &'static str {
    match category {
        RegionCategory::Incomplete => "chrom\tstart\tend",
        RegionCategory::LowDepthDark | RegionCategory::LowMapqDark => {
            "chrom\tstart\tend\tnMapQBelowThreshold\tdepth\tpercMapQBelowThreshold\tnDeletedInRecord\ttotalDepthIncludingIndels"
        }
    }
}

pub fn write_record<W: Write + ?Sized>(out: &mut W, record: &LocusRecord) -> io::Result<()> {
    let start = record.position.saturating_sub(1);
    match &record.metrics {
        None => writeln!(out, "{}\t{}\t{}", record.contig, start, record.position),
        Some(m) => writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            record.contig,
            start,
            record.position,
            m.n_below_mapq_threshold,
            m.depth_excluding_indels,
            m.percent_below_mapq_threshold,
            m.n_deleted_in_record,
            m.depth_including_indels
        ),
    }
}
