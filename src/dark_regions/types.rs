use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// The three output streams a locus can be reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionCategory {
    Incomplete,
    LowDepthDark,
    LowMapqDark,
}

impl RegionCategory {
    pub const ALL: [RegionCategory; 3] = [
        RegionCategory::Incomplete,
        RegionCategory::LowDepthDark,
        RegionCategory::LowMapqDark,
    ];

    pub fn index(self) -> usize {
        match self {
            RegionCategory::Incomplete => 0,
            RegionCategory::LowDepthDark => 1,
            RegionCategory::LowMapqDark => 2,
        }
    }

    /// Short tag used when naming per-shard temporary files.
    pub fn slug(self) -> &'static str {
        match self {
            RegionCategory::Incomplete => "inc",
            RegionCategory::LowDepthDark => "depth",
            RegionCategory::LowMapqDark => "mapq",
        }
    }

    pub fn is_dark(self) -> bool {
        !matches!(self, RegionCategory::Incomplete)
    }
}

impl fmt::Display for RegionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RegionCategory::Incomplete => "incomplete",
            RegionCategory::LowDepthDark => "low-depth dark",
            RegionCategory::LowMapqDark => "low-MAPQ dark",
        };
        f.write_str(name)
    }
}

/// One reference position as seen by the walker. Positions are 1-based.
#[derive(Debug, Clone, Copy)]
pub struct Locus<'a> {
    pub contig: &'a str,
    pub position: u64,
    pub reference_base: u8,
}

/// Read-level summary of the pileup at one locus.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PileupStats {
    pub depth_excluding_indels: u32,
    pub depth_including_indels: u32,
    pub n_deleted_in_record: u32,
    /// MAPQ of every read overlapping the locus, deletions included.
    pub mapping_qualities: Vec<u8>,
}

impl PileupStats {
    /// Stats for a locus no read covers.
    pub fn uncovered() -> Self {
        Self::default()
    }

    /// Builds stats from the MAPQs of reads with a base at the locus and of reads
    /// carrying a deletion over it.
    pub fn from_reads(aligned: &[u8], deleted: &[u8]) -> Self {
        let mut mapping_qualities = Vec::with_capacity(aligned.len() + deleted.len());
        mapping_qualities.extend_from_slice(aligned);
        mapping_qualities.extend_from_slice(deleted);
        Self {
            depth_excluding_indels: aligned.len() as u32,
            depth_including_indels: (aligned.len() + deleted.len()) as u32,
            n_deleted_in_record: deleted.len() as u32,
            mapping_qualities,
        }
    }

    pub fn count_mapq_at_or_below(&self, threshold: u8) -> u32 {
        self.mapping_qualities
            .iter()
            .filter(|&&mapq| mapq <= threshold)
            .count() as u32
    }
}

/// Per-locus values written to the dark-region streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DarkMetrics {
    pub n_below_mapq_threshold: u32,
    pub depth_excluding_indels: u32,
    /// Rounded percentage, or -1 when no read overlaps the locus.
    pub percent_below_mapq_threshold: i32,
    pub n_deleted_in_record: u32,
    pub depth_including_indels: u32,
}

/// A classified locus waiting in an accumulator buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocusRecord {
    pub contig: Arc<str>,
    pub position: u64,
    pub metrics: Option<DarkMetrics>,
}

/// A contiguous, 1-based, closed range on one contig.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntervalChunk {
    pub contig: String,
    pub start: u64,
    pub end: u64,
}

impl IntervalChunk {
    pub fn new(contig: impl Into<String>, start: u64, end: u64) -> Self {
        Self {
            contig: contig.into(),
            start,
            end,
        }
    }

    pub fn len(&self) -> u64 {
        if self.end < self.start {
            0
        } else {
            self.end - self.start + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when `next` starts on the position right after this chunk ends.
    pub fn abuts(&self, next: &IntervalChunk) -> bool {
        self.contig == next.contig && self.end + 1 == next.start
    }
}

impl fmt::Display for IntervalChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.contig, self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_from_reads_counts_deletions_in_total_depth() {
        let stats = PileupStats::from_reads(&[60, 3, 0], &[5]);
        assert_eq!(stats.depth_excluding_indels, 3);
        assert_eq!(stats.depth_including_indels, 4);
        assert_eq!(stats.n_deleted_in_record, 1);
        assert_eq!(stats.count_mapq_at_or_below(9), 3);
    }

    #[test]
    fn chunk_adjacency_requires_same_contig() {
        let a = IntervalChunk::new("chr1", 1, 100);
        assert!(a.abuts(&IntervalChunk::new("chr1", 101, 200)));
        assert!(!a.abuts(&IntervalChunk::new("chr1", 102, 200)));
        assert!(!a.abuts(&IntervalChunk::new("chr2", 101, 200)));
        assert_eq!(a.len(), 100);
    }
}
