use crate::error::{DarkRegionError, Result};
use crate::sources::ReferenceSource;
use bio::io::fasta::IndexedReader;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// Bases fetched per reference read; lookups are sequential so one window serves many loci.
const WINDOW_SIZE: u64 = 65_536;

/// Reference source over a `samtools faidx`-indexed FASTA.
pub struct FastaReference {
    reader: IndexedReader<File>,
    lengths: HashMap<String, u64>,
    window_contig: String,
    /// 1-based position of `window[0]`.
    window_start: u64,
    window: Vec<u8>,
}

impl FastaReference {
    pub fn open(path: &Path) -> Result<Self> {
        let reader = IndexedReader::from_file(&path).map_err(|e| {
            DarkRegionError::reference(format!(
                "could not open {} (is it indexed with samtools faidx?): {}",
                path.display(),
                e
            ))
        })?;
        let lengths = reader
            .index
            .sequences()
            .into_iter()
            .map(|seq| (seq.name, seq.len))
            .collect();

        Ok(Self {
            reader,
            lengths,
            window_contig: String::new(),
            window_start: 0,
            window: Vec::new(),
        })
    }

    fn window_covers(&self, contig: &str, position: u64) -> bool {
        self.window_contig == contig
            && position >= self.window_start
            && position < self.window_start + self.window.len() as u64
    }

    fn load_window(&mut self, contig: &str, position: u64) -> Result<()> {
        let length = *self.lengths.get(contig).ok_or_else(|| {
            DarkRegionError::reference(format!("{} is not in the reference", contig))
        })?;
        if position == 0 || position > length {
            return Err(DarkRegionError::reference(format!(
                "{}:{} is outside the reference sequence (length {})",
                contig, position, length
            )));
        }

        let begin = position - 1;
        let stop = (begin + WINDOW_SIZE).min(length);
        self.reader.fetch(contig, begin, stop)?;
        self.window.clear();
        self.reader.read(&mut self.window)?;
        if self.window.is_empty() {
            return Err(DarkRegionError::reference(format!(
                "no sequence returned for {}:{}",
                contig, position
            )));
        }
        self.window_contig.clear();
        self.window_contig.push_str(contig);
        self.window_start = position;
        Ok(())
    }
}

impl ReferenceSource for FastaReference {
    fn has_sequence(&self, contig: &str) -> bool {
        self.lengths.contains_key(contig)
    }

    fn base_at(&mut self, contig: &str, position: u64) -> Result<u8> {
        if !self.window_covers(contig, position) {
            self.load_window(contig, position)?;
        }
        Ok(self.window[(position - self.window_start) as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_fasta(dir: &Path) -> std::path::PathBuf {
        let fasta = dir.join("ref.fa");
        let mut f = File::create(&fasta).unwrap();
        // Two lines of 8 bases for chr1, one short line for chr2.
        f.write_all(b">chr1\nACGTNNAC\nGTacgtnn\n>chr2\nTTTT\n").unwrap();
        let mut fai = File::create(dir.join("ref.fa.fai")).unwrap();
        fai.write_all(b"chr1\t16\t6\t8\t9\nchr2\t4\t30\t4\t5\n").unwrap();
        fasta
    }

    #[test]
    fn reads_bases_across_lines_and_contigs() {
        let dir = TempDir::new().unwrap();
        let mut reference = FastaReference::open(&write_fasta(dir.path())).unwrap();

        assert!(reference.has_sequence("chr1"));
        assert!(!reference.has_sequence("chrUn"));
        assert_eq!(reference.base_at("chr1", 1).unwrap(), b'A');
        assert_eq!(reference.base_at("chr1", 5).unwrap(), b'N');
        assert_eq!(reference.base_at("chr1", 11).unwrap(), b'a');
        assert_eq!(reference.base_at("chr1", 16).unwrap(), b'n');
        assert_eq!(reference.base_at("chr2", 4).unwrap(), b'T');
        assert_eq!(reference.base_at("chr1", 2).unwrap(), b'C');
    }

    #[test]
    fn out_of_range_position_is_an_error() {
        let dir = TempDir::new().unwrap();
        let mut reference = FastaReference::open(&write_fasta(dir.path())).unwrap();
        assert!(reference.base_at("chr2", 5).is_err());
        assert!(reference.base_at("chr2", 0).is_err());
    }

    #[test]
    fn missing_index_fails_to_open() {
        let dir = TempDir::new().unwrap();
        let fasta = dir.path().join("bare.fa");
        std::fs::write(&fasta, ">chr1\nACGT\n").unwrap();
        assert!(FastaReference::open(&fasta).is_err());
    }
}
