// src/utils/bam_reader.rs
use rust_htslib::bam::{self, HeaderView, Read};
use std::path::Path;

pub struct BamReaderFactory;

impl BamReaderFactory {
    /// Opens an indexed BAM/CRAM. CRAM needs the reference to decode sequences.
    pub fn open_indexed(
        bam_path: &Path,
        reference_path: Option<&Path>,
    ) -> Result<bam::IndexedReader, rust_htslib::errors::Error> {
        let mut reader = bam::IndexedReader::from_path(bam_path)?;
        if let Some(ref_path) = reference_path {
            if is_cram(bam_path) {
                reader.set_reference(ref_path)?;
            }
        }
        Ok(reader)
    }

    /// Reads only the sequence dictionary; no index is needed.
    pub fn read_dictionary(
        bam_path: &Path,
        reference_path: Option<&Path>,
    ) -> Result<Vec<(String, u64)>, rust_htslib::errors::Error> {
        let mut reader = bam::Reader::from_path(bam_path)?;
        if let Some(ref_path) = reference_path {
            if is_cram(bam_path) {
                reader.set_reference(ref_path)?;
            }
        }
        Ok(sequence_dictionary(reader.header()))
    }
}

pub fn is_cram(path: &Path) -> bool {
    path.extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("cram"))
}

/// `(name, length)` of every `@SQ` line, in header order.
pub fn sequence_dictionary(header: &HeaderView) -> Vec<(String, u64)> {
    (0..header.target_count())
        .map(|tid| {
            let name = String::from_utf8_lossy(header.tid2name(tid)).into_owned();
            let length = header.target_len(tid).unwrap_or(0);
            (name, length)
        })
        .collect()
}
