use crate::cli::PartitionArgs;
use crate::dark_regions::{self, DarkRegionOptions, GenomePartitioner, Shard};
use crate::utils::bam_reader::BamReaderFactory;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};

pub fn run(args: PartitionArgs) -> Result<()> {
    let dictionary = BamReaderFactory::read_dictionary(&args.input, args.reference.as_deref())
        .with_context(|| format!("Failed to read the header of {}", args.input.display()))?;

    let options = DarkRegionOptions::default()
        .with_threads(args.threads)
        .with_intervals(Some(args.intervals.clone()));
    options.validate()?;
    let territory = dark_regions::territory(&dictionary, &options)?;
    let shards = GenomePartitioner::new(options.threads).plan(&territory);

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_plan(&mut BufWriter::new(file), &shards)?;
        }
        None => write_plan(&mut io::stdout().lock(), &shards)?,
    }
    Ok(())
}

/// One line per chunk: shard index, contig, 0-based start, end.
pub fn write_plan<W: Write>(out: &mut W, shards: &[Shard]) -> io::Result<()> {
    for shard in shards {
        for chunk in &shard.chunks {
            writeln!(out, "{}\t{}\t{}\t{}", shard.index, chunk.contig, chunk.start - 1, chunk.end)?;
        }
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dark_regions::partition::whole_genome;

    #[test]
    fn plan_is_bed_like() {
        let territory = whole_genome(&[("chr1".to_string(), 10), ("chr2".to_string(), 4)]);
        let shards = GenomePartitioner::new(2).plan(&territory);
        let mut out = Vec::new();
        write_plan(&mut out, &shards).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "0\tchr1\t0\t7\n1\tchr1\t7\t10\n1\tchr2\t0\t4\n"
        );
    }
}
