use crate::dark_regions::types::IntervalChunk;
use crate::error::{DarkRegionError, Result};
use serde::Serialize;
use std::collections::HashMap;

/// One worker's share of the territory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Shard {
    pub index: usize,
    pub chunks: Vec<IntervalChunk>,
    /// The single position right before `chunks[0]`, when it is scanned by the previous shard.
    pub lead_in: Option<IntervalChunk>,
    /// Contiguous territory after the last chunk, scanned only to finish runs still open.
    pub overrun: Option<IntervalChunk>,
}

impl Shard {
    pub fn bases(&self) -> u64 {
        self.chunks.iter().map(IntervalChunk::len).sum()
    }
}

/// Every contig of the dictionary, whole, in dictionary order.
pub fn whole_genome(dictionary: &[(String, u64)]) -> Vec<IntervalChunk> {
    dictionary
        .iter()
        .filter(|(_, length)| *length > 0)
        .map(|(name, length)| IntervalChunk::new(name.clone(), 1, *length))
        .collect()
}

/// Parses `contig`, `contig:pos` or `contig:start-end` (1-based, inclusive).
///
/// Contig names may themselves contain ':' (e.g. `HLA-A*01:01:01:02N`), so a name found
/// verbatim in the dictionary wins, and otherwise the last colon separates the range.
pub fn parse_interval(text: &str, dictionary: &[(String, u64)]) -> Result<IntervalChunk> {
    let lengths: HashMap<&str, u64> = dictionary
        .iter()
        .map(|(name, length)| (name.as_str(), *length))
        .collect();
    let text = text.trim();

    if let Some(&length) = lengths.get(text) {
        return Ok(IntervalChunk::new(text, 1, length));
    }

    let (contig, range) = text
        .rsplit_once(':')
        .ok_or_else(|| DarkRegionError::invalid_interval(text, "contig is not in the alignment header"))?;
    let length = *lengths
        .get(contig)
        .ok_or_else(|| DarkRegionError::invalid_interval(text, "contig is not in the alignment header"))?;

    let parse = |value: &str| -> Result<u64> {
        value
            .replace(',', "")
            .parse::<u64>()
            .map_err(|_| DarkRegionError::invalid_interval(text, format!("'{}' is not a position", value)))
    };
    let (start, end) = match range.split_once('-') {
        Some((start, end)) => (parse(start)?, parse(end)?),
        None => {
            let position = parse(range)?;
            (position, position)
        }
    };

    if start < 1 {
        return Err(DarkRegionError::invalid_interval(text, "positions are 1-based"));
    }
    if end < start {
        return Err(DarkRegionError::invalid_interval(text, "end is before start"));
    }
    if end > length {
        return Err(DarkRegionError::invalid_interval(
            text,
            format!("end is past the contig length ({})", length),
        ));
    }
    Ok(IntervalChunk::new(contig, start, end))
}

/// Parses the requested intervals, orders them by dictionary order and merges any that
/// overlap or touch, so every requested base is scanned exactly once.
pub fn resolve_intervals(texts: &[String], dictionary: &[(String, u64)]) -> Result<Vec<IntervalChunk>> {
    let order: HashMap<&str, usize> = dictionary
        .iter()
        .enumerate()
        .map(|(i, (name, _))| (name.as_str(), i))
        .collect();

    let mut intervals = texts
        .iter()
        .map(|text| parse_interval(text, dictionary))
        .collect::<Result<Vec<_>>>()?;
    intervals.sort_by_key(|chunk| (order[chunk.contig.as_str()], chunk.start, chunk.end));

    let mut merged: Vec<IntervalChunk> = Vec::with_capacity(intervals.len());
    for interval in intervals {
        match merged.last_mut() {
            Some(last) if last.contig == interval.contig && interval.start <= last.end + 1 => {
                last.end = last.end.max(interval.end);
            }
            _ => merged.push(interval),
        }
    }
    Ok(merged)
}

/// Splits a territory into contiguous, roughly equal shards.
#[derive(Debug, Clone, Copy)]
pub struct GenomePartitioner {
    threads: usize,
}

impl GenomePartitioner {
    pub fn new(threads: usize) -> Self {
        Self {
            threads: threads.max(1),
        }
    }

    /// Cuts `territory` into at most `threads` chunk lists of about `ceil(total / threads)`
    /// bases each. A contig may be split across consecutive lists; concatenating the lists
    /// reproduces the territory in order.
    pub fn partition(&self, territory: &[IntervalChunk]) -> Vec<Vec<IntervalChunk>> {
        let total: u64 = territory.iter().map(IntervalChunk::len).sum();
        if total == 0 {
            return Vec::new();
        }
        let threads = self.threads as u64;
        let per_shard = (total + threads - 1) / threads;

        let mut shards = Vec::with_capacity(self.threads);
        let mut current = Vec::new();
        let mut target = per_shard;

        for interval in territory.iter().filter(|chunk| !chunk.is_empty()) {
            let mut start = interval.start;
            while interval.end - start + 1 > target {
                current.push(IntervalChunk::new(interval.contig.clone(), start, start + target - 1));
                shards.push(std::mem::take(&mut current));
                start += target;
                target = per_shard;
            }
            let remaining = interval.end - start + 1;
            current.push(IntervalChunk::new(interval.contig.clone(), start, interval.end));
            if remaining == target {
                shards.push(std::mem::take(&mut current));
                target = per_shard;
            } else {
                target -= remaining;
            }
        }
        if !current.is_empty() {
            shards.push(current);
        }
        shards
    }

    /// Partitions `territory` and works out, for each shard, the lead-in position and the
    /// overrun range that keep runs crossing a shard boundary intact.
    pub fn plan(&self, territory: &[IntervalChunk]) -> Vec<Shard> {
        let partitions = self.partition(territory);
        let mut shards = Vec::with_capacity(partitions.len());

        for (index, chunks) in partitions.iter().enumerate() {
            let (first, last) = match (chunks.first(), chunks.last()) {
                (Some(first), Some(last)) => (first, last),
                _ => continue,
            };

            let lead_in = index
                .checked_sub(1)
                .and_then(|prev| partitions[prev].last())
                .filter(|prev_last| prev_last.abuts(first))
                .map(|_| IntervalChunk::new(first.contig.clone(), first.start - 1, first.start - 1));

            let mut extent_end = last.end;
            for chunk in partitions[index + 1..].iter().flatten() {
                if chunk.contig == last.contig && chunk.start == extent_end + 1 {
                    extent_end = chunk.end;
                } else {
                    break;
                }
            }
            let overrun = (extent_end > last.end)
                .then(|| IntervalChunk::new(last.contig.clone(), last.end + 1, extent_end));

            shards.push(Shard {
                index,
                chunks: chunks.clone(),
                lead_in,
                overrun,
            });
        }
        shards
    }
}
