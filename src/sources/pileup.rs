use crate::dark_regions::options::ValidationStringency;
use crate::dark_regions::types::{IntervalChunk, PileupStats};
use crate::error::{DarkRegionError, Result};
use crate::sources::PileupSource;
use crate::utils::bam_reader::BamReaderFactory;
use log::warn;
use rust_htslib::bam::{self, Read};
use std::ops::ControlFlow;
use std::path::Path;

/// Pileup source over an indexed BAM/CRAM.
pub struct HtsPileupSource {
    reader: bam::IndexedReader,
    max_depth: u32,
    stringency: ValidationStringency,
}

impl HtsPileupSource {
    pub fn open(
        alignments: &Path,
        reference: Option<&Path>,
        max_depth: u32,
        stringency: ValidationStringency,
    ) -> Result<Self> {
        let reader = BamReaderFactory::open_indexed(alignments, reference)?;
        Ok(Self {
            reader,
            max_depth,
            stringency,
        })
    }
}

impl PileupSource for HtsPileupSource {
    fn scan<F>(&mut self, chunk: &IntervalChunk, mut visit: F) -> Result<()>
    where
        F: FnMut(&str, u64, &PileupStats) -> Result<ControlFlow<()>>,
    {
        if chunk.is_empty() {
            return Ok(());
        }
        let tid = self.reader.header().tid(chunk.contig.as_bytes()).ok_or_else(|| {
            DarkRegionError::invalid_interval(
                chunk.to_string(),
                "contig is not in the alignment header",
            )
        })?;

        let contig = chunk.contig.as_str();
        let stringency = self.stringency;
        let uncovered = PileupStats::uncovered();
        let mut aligned: Vec<u8> = Vec::new();
        let mut deleted: Vec<u8> = Vec::new();
        // Next 1-based position owed to `visit`.
        let mut next = chunk.start;

        self.reader
            .fetch((tid as i32, (chunk.start - 1) as i64, chunk.end as i64))?;
        let mut pileups = self.reader.pileup();
        pileups.set_max_depth(self.max_depth);

        for column in pileups {
            let column = match column {
                Ok(column) => column,
                // A failed pileup iterator keeps failing, so the rest of the chunk is
                // treated as uncovered.
                Err(e) => match stringency {
                    ValidationStringency::Strict => return Err(e.into()),
                    ValidationStringency::Lenient => {
                        warn!(
                            "Pileup failed on {}:{}-{} ({}); treating the rest of the range as uncovered",
                            contig, next, chunk.end, e
                        );
                        break;
                    }
                    ValidationStringency::Silent => break,
                },
            };
            if column.tid() != tid {
                continue;
            }
            let position = column.pos() as u64 + 1;
            if position < next {
                continue;
            }
            if position > chunk.end {
                break;
            }

            while next < position {
                if visit(contig, next, &uncovered)?.is_break() {
                    return Ok(());
                }
                next += 1;
            }

            aligned.clear();
            deleted.clear();
            for alignment in column.alignments() {
                if alignment.is_refskip() {
                    continue;
                }
                let record = alignment.record();
                if !counts_toward_pileup(&record) {
                    continue;
                }
                let mapq = record.mapq();
                if alignment.is_del() {
                    deleted.push(mapq);
                } else {
                    aligned.push(mapq);
                }
            }
            let stats = PileupStats::from_reads(&aligned, &deleted);
            next = position + 1;
            if visit(contig, position, &stats)?.is_break() {
                return Ok(());
            }
        }

        while next <= chunk.end {
            if visit(contig, next, &uncovered)?.is_break() {
                return Ok(());
            }
            next += 1;
        }
        Ok(())
    }
}

/// Secondary alignments and duplicates are left out of every locus.
/// Supplementary and QC-failed reads still count.
pub(crate) fn counts_toward_pileup(record: &bam::Record) -> bool {
    !(record.is_secondary() || record.is_duplicate())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_flags(flags: u16) -> bam::Record {
        let mut record = bam::Record::new();
        record.set_flags(flags);
        record
    }

    #[test]
    fn secondary_and_duplicate_reads_are_excluded() {
        assert!(counts_toward_pileup(&record_with_flags(0)));
        assert!(counts_toward_pileup(&record_with_flags(0x800)));
        assert!(counts_toward_pileup(&record_with_flags(0x200)));
        assert!(!counts_toward_pileup(&record_with_flags(0x100)));
        assert!(!counts_toward_pileup(&record_with_flags(0x400)));
        assert!(!counts_toward_pileup(&record_with_flags(0x100 | 0x400)));
    }
}
