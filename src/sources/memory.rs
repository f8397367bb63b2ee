//! In-memory sources. Handy for tests and for scanning synthetic data.

use crate::dark_regions::types::{IntervalChunk, PileupStats};
use crate::error::{DarkRegionError, Result};
use crate::sources::{PileupSource, ReferenceSource, SourceFactory};
use std::collections::{BTreeMap, HashMap};
use std::ops::ControlFlow;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct MemoryReference {
    sequences: Arc<HashMap<String, Vec<u8>>>,
}

impl MemoryReference {
    pub fn new(sequences: HashMap<String, Vec<u8>>) -> Self {
        Self {
            sequences: Arc::new(sequences),
        }
    }
}

impl ReferenceSource for MemoryReference {
    fn has_sequence(&self, contig: &str) -> bool {
        self.sequences.contains_key(contig)
    }

    fn base_at(&mut self, contig: &str, position: u64) -> Result<u8> {
        let sequence = self
            .sequences
            .get(contig)
            .ok_or_else(|| DarkRegionError::reference(format!("unknown contig {}", contig)))?;
        position
            .checked_sub(1)
            .and_then(|offset| sequence.get(offset as usize))
            .copied()
            .ok_or_else(|| {
                DarkRegionError::reference(format!("{}:{} is outside the sequence", contig, position))
            })
    }
}

/// Pileup columns keyed by contig and 1-based position; missing positions are uncovered.
#[derive(Debug, Clone, Default)]
pub struct MemoryPileup {
    columns: Arc<HashMap<String, BTreeMap<u64, PileupStats>>>,
}

impl MemoryPileup {
    pub fn new(columns: HashMap<String, BTreeMap<u64, PileupStats>>) -> Self {
        Self {
            columns: Arc::new(columns),
        }
    }
}

impl PileupSource for MemoryPileup {
    fn scan<F>(&mut self, chunk: &IntervalChunk, mut visit: F) -> Result<()>
    where
        F: FnMut(&str, u64, &PileupStats) -> Result<ControlFlow<()>>,
    {
        let uncovered = PileupStats::uncovered();
        let columns = self.columns.get(&chunk.contig);
        for position in chunk.start..=chunk.end {
            let stats = columns
                .and_then(|c| c.get(&position))
                .unwrap_or(&uncovered);
            if visit(&chunk.contig, position, stats)?.is_break() {
                break;
            }
        }
        Ok(())
    }
}

/// Hands out clones of one in-memory pileup and reference.
#[derive(Debug, Clone)]
pub struct MemorySources {
    pileup: MemoryPileup,
    reference: MemoryReference,
    dictionary: Vec<(String, u64)>,
}

impl MemorySources {
    pub fn new(
        pileup: MemoryPileup,
        reference: MemoryReference,
        dictionary: Vec<(String, u64)>,
    ) -> Self {
        Self {
            pileup,
            reference,
            dictionary,
        }
    }
}

impl SourceFactory for MemorySources {
    type Pileup = MemoryPileup;
    type Reference = MemoryReference;

    fn open_pileup(&self) -> Result<MemoryPileup> {
        Ok(self.pileup.clone())
    }

    fn open_reference(&self) -> Result<MemoryReference> {
        Ok(self.reference.clone())
    }

    fn dictionary(&self) -> &[(String, u64)] {
        &self.dictionary
    }
}
