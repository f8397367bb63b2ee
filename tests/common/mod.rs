#![allow(dead_code)]

use dark_region_finder::dark_regions::types::PileupStats;
use dark_region_finder::sources::memory::{MemoryPileup, MemoryReference, MemorySources};
use std::collections::{BTreeMap, HashMap};

/// Small deterministic generator so synthetic genomes are stable between runs.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    pub fn below(&mut self, bound: u64) -> u64 {
        self.next() % bound
    }
}

pub fn stats(high_mapq: usize, low_mapq: usize, deleted: usize) -> PileupStats {
    let mut aligned = vec![60u8; high_mapq];
    aligned.extend(std::iter::repeat(0u8).take(low_mapq));
    PileupStats::from_reads(&aligned, &vec![60u8; deleted])
}

#[derive(Default)]
pub struct GenomeBuilder {
    dictionary: Vec<(String, u64)>,
    sequences: HashMap<String, Vec<u8>>,
    columns: HashMap<String, BTreeMap<u64, PileupStats>>,
}

impl GenomeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a contig to the alignment header and, when `sequence` is given, to the reference.
    pub fn contig(mut self, name: &str, length: u64, sequence: Option<Vec<u8>>) -> Self {
        self.dictionary.push((name.to_string(), length));
        if let Some(sequence) = sequence {
            assert_eq!(sequence.len() as u64, length);
            self.sequences.insert(name.to_string(), sequence);
        }
        self
    }

    pub fn column(mut self, contig: &str, position: u64, stats: PileupStats) -> Self {
        self.columns
            .entry(contig.to_string())
            .or_default()
            .insert(position, stats);
        self
    }

    /// A noisy genome: stretches of N, gaps in coverage, low-MAPQ pockets.
    pub fn random(seed: u64, contigs: usize, length: u64) -> Self {
        let mut rng = Lcg::new(seed);
        let mut builder = Self::new();
        for c in 0..contigs {
            let name = format!("chr{}", c + 1);
            let mut sequence = Vec::with_capacity(length as usize);
            while (sequence.len() as u64) < length {
                let stretch = 1 + rng.below(40) as usize;
                let base = match rng.below(10) {
                    0 => b'N',
                    1 => b'n',
                    n => b"ACGTACGT"[n as usize - 2],
                };
                sequence.extend(std::iter::repeat(base).take(stretch));
            }
            sequence.truncate(length as usize);
            builder = builder.contig(&name, length, Some(sequence));

            let mut position = 1;
            while position <= length {
                let stretch = 1 + rng.below(30);
                let kind = rng.below(5);
                for p in position..(position + stretch).min(length + 1) {
                    let column = match kind {
                        0 => continue,
                        1 => stats(rng.below(6) as usize, 0, rng.below(2) as usize),
                        2 => stats(rng.below(2) as usize, 10 + rng.below(10) as usize, 0),
                        _ => stats(8 + rng.below(20) as usize, rng.below(3) as usize, rng.below(2) as usize),
                    };
                    builder = builder.column(&name, p, column);
                }
                position += stretch;
            }
        }
        builder
    }

    pub fn build(self) -> MemorySources {
        MemorySources::new(
            MemoryPileup::new(self.columns),
            MemoryReference::new(self.sequences),
            self.dictionary,
        )
    }
}
