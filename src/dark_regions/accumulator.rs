use crate::dark_regions::format;
use crate::dark_regions::types::{LocusRecord, RegionCategory};
use serde::Serialize;
use std::io::{self, Write};

/// Counts of what one category has written so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryTally {
    pub regions: u64,
    pub loci: u64,
}

impl CategoryTally {
    pub fn merge(&mut self, other: &CategoryTally) {
        self.regions += other.regions;
        self.loci += other.loci;
    }
}

/// Run-length tracker for a single category, writing finished runs to `sink`.
pub struct RegionAccumulator<W: Write> {
    category: RegionCategory,
    min_region_size: u64,
    max_buffered_loci: usize,
    buffer: Vec<LocusRecord>,
    consecutive: u64,
    sink: W,
    tally: CategoryTally,
}

impl<W: Write> RegionAccumulator<W> {
    pub fn new(
        category: RegionCategory,
        min_region_size: u64,
        max_buffered_loci: usize,
        sink: W,
    ) -> Self {
        Self {
            category,
            min_region_size,
            max_buffered_loci,
            buffer: Vec::new(),
            consecutive: 0,
            sink,
            tally: CategoryTally::default(),
        }
    }

    pub fn category(&self) -> RegionCategory {
        self.category
    }

    pub fn is_open(&self) -> bool {
        self.consecutive > 0
    }

    pub fn run_length(&self) -> u64 {
        self.consecutive
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn tally(&self) -> CategoryTally {
        self.tally
    }

    pub fn extend(&mut self, record: LocusRecord) {
        self.buffer.push(record);
        self.consecutive += 1;
    }

    /// Closes the current run, writing it only if it reached the minimum size.
    pub fn flush_if_qualifying(&mut self) -> io::Result<()> {
        if self.consecutive > 0 && self.consecutive >= self.min_region_size {
            self.write_buffer()?;
            self.tally.regions += 1;
        }
        self.buffer.clear();
        self.consecutive = 0;
        Ok(())
    }

    /// Releases buffered loci of a run already long enough to be reported. The run stays open.
    pub fn flush_if_oversized(&mut self) -> io::Result<bool> {
        if self.consecutive > self.min_region_size && self.buffer.len() > self.max_buffered_loci {
            self.write_buffer()?;
            self.buffer.clear();
            return Ok(true);
        }
        Ok(false)
    }

    pub fn into_sink(mut self) -> io::Result<(W, CategoryTally)> {
        self.sink.flush()?;
        Ok((self.sink, self.tally))
    }

    fn write_buffer(&mut self) -> io::Result<()> {
        for record in &self.buffer {
            format::write_record(&mut self.sink, record)?;
        }
        self.tally.loci += self.buffer.len() as u64;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn record(position: u64) -> LocusRecord {
        LocusRecord {
            contig: Arc::from("chr1"),
            position,
            metrics: None,
        }
    }

    fn lines(sink: &[u8]) -> Vec<String> {
        String::from_utf8_lossy(sink).lines().map(str::to_string).collect()
    }

    #[test]
    fn short_run_leaves_no_trace() {
        let mut acc = RegionAccumulator::new(RegionCategory::Incomplete, 3, 100, Vec::new());
        acc.extend(record(1));
        acc.extend(record(2));
        acc.flush_if_qualifying().unwrap();
        assert!(!acc.is_open());
        let (sink, tally) = acc.into_sink().unwrap();
        assert!(sink.is_empty());
        assert_eq!(tally, CategoryTally::default());
    }

    #[test]
    fn qualifying_run_is_written_once() {
        let mut acc = RegionAccumulator::new(RegionCategory::Incomplete, 3, 100, Vec::new());
        for pos in 1..=3 {
            acc.extend(record(pos));
        }
        acc.flush_if_qualifying().unwrap();
        acc.flush_if_qualifying().unwrap();
        let (sink, tally) = acc.into_sink().unwrap();
        assert_eq!(lines(&sink), vec!["chr1\t0\t1", "chr1\t1\t2", "chr1\t2\t3"]);
        assert_eq!(tally, CategoryTally { regions: 1, loci: 3 });
    }

    #[test]
    fn oversized_flush_keeps_the_run_open_without_duplicates() {
        let mut acc = RegionAccumulator::new(RegionCategory::Incomplete, 2, 4, Vec::new());
        let mut spills = 0;
        for pos in 1..=23 {
            if acc.flush_if_oversized().unwrap() {
                spills += 1;
            }
            acc.extend(record(pos));
            assert!(acc.buffered() <= 5);
        }
        assert_eq!(acc.run_length(), 23);
        acc.flush_if_qualifying().unwrap();
        let (sink, tally) = acc.into_sink().unwrap();

        let expected: Vec<String> = (1..=23).map(|p| format!("chr1\t{}\t{}", p - 1, p)).collect();
        assert_eq!(lines(&sink), expected);
        assert_eq!(spills, 4);
        assert_eq!(tally, CategoryTally { regions: 1, loci: 23 });
    }

    #[test]
    fn oversized_flush_waits_for_minimum_size() {
        let mut acc = RegionAccumulator::new(RegionCategory::Incomplete, 10, 2, Vec::new());
        for pos in 1..=5 {
            assert!(!acc.flush_if_oversized().unwrap());
            acc.extend(record(pos));
        }
        acc.flush_if_qualifying().unwrap();
        let (sink, _) = acc.into_sink().unwrap();
        assert!(sink.is_empty());
    }
}
