use crate::dark_regions::ValidationStringency;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Find dark (low depth or low MAPQ) and incomplete regions in a BAM/CRAM file
    Find(FindArgs),

    /// Print the shard plan a multi-threaded scan would use
    Partition(PartitionArgs),
}

/// Threshold flags left unset fall back to `config.toml`, then to built-in defaults.
#[derive(ClapArgs, Debug)]
pub struct FindArgs {
    /// Indexed, coordinate-sorted BAM or CRAM file
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,

    /// Reference FASTA indexed with samtools faidx
    #[arg(short = 'g', long = "reference")]
    pub reference: PathBuf,

    /// Output for low-depth dark regions
    #[arg(short = 'c', long = "coverage-output", default_value = "low_coverage.dark.bed")]
    pub coverage_output: PathBuf,

    /// Output for low-MAPQ dark regions
    #[arg(short = 'a', long = "mapq-output", default_value = "low_mapq.dark.bed")]
    pub mapq_output: PathBuf,

    /// Output for incomplete (unknown reference base) regions
    #[arg(short = 'n', long = "incomplete-output", default_value = "incomplete.bed")]
    pub incomplete_output: PathBuf,

    /// Minimum run length, in loci, for a region to be written (default: 1)
    #[arg(short = 's', long = "min-region-size")]
    pub min_region_size: Option<u64>,

    /// Reads with MAPQ at or below this count as poorly mapped (default: 9)
    #[arg(short = 't', long = "mapq-threshold")]
    pub mapq_threshold: Option<u8>,

    /// Percentage of poorly mapped reads that makes a locus low-MAPQ dark (default: 90)
    #[arg(short = 'm', long = "min-mapq-mass")]
    pub min_mapq_mass: Option<u8>,

    /// Depth at or below which a locus is low-depth dark (default: 5)
    #[arg(short = 'd', long = "min-depth")]
    pub min_depth: Option<u32>,

    /// Never report a low-depth locus as low-MAPQ dark as well
    #[arg(short = 'e', long = "exclusive-regions", overrides_with = "no_exclusive_regions")]
    pub exclusive_regions: bool,

    /// Report low-depth loci as low-MAPQ dark too, even if the config enables exclusivity
    #[arg(long = "no-exclusive-regions", overrides_with = "exclusive_regions")]
    pub no_exclusive_regions: bool,

    /// How to handle pileup errors from the alignment file (default: strict)
    #[arg(short = 'v', long = "validation-stringency", value_enum)]
    pub validation_stringency: Option<ValidationStringency>,

    /// Worker threads (default: 1)
    #[arg(short = 'j', long = "threads")]
    pub threads: Option<usize>,

    /// Directory for per-shard temporary files (default: ./)
    #[arg(short = 'k', long = "tmp-dir")]
    pub tmp_dir: Option<PathBuf>,

    /// Restrict the scan to these intervals (contig, contig:pos or contig:start-end).
    /// Output names then get a unique `.salt_<xxxxx>` suffix
    #[arg(short = 'L', long = "interval-list", num_args = 1..)]
    pub intervals: Vec<String>,

    /// Loci a single run may buffer before it is written out early (default: 10000)
    #[arg(long = "max-buffered-loci")]
    pub max_buffered_loci: Option<usize>,

    /// Maximum reads considered per pileup column (default: 1000000)
    #[arg(long = "max-pileup-depth")]
    pub max_pileup_depth: Option<u32>,

    /// Write a column header line to each output
    #[arg(long = "header", overrides_with = "no_header")]
    pub header: bool,

    /// Leave out the header line even if the config asks for it
    #[arg(long = "no-header", overrides_with = "header")]
    pub no_header: bool,

    /// Write a JSON summary of the run to this file
    #[arg(long = "summary")]
    pub summary: Option<PathBuf>,

    /// Hide progress bars
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Read defaults from this config file instead of the user config
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
pub struct PartitionArgs {
    /// Indexed, coordinate-sorted BAM or CRAM file
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,

    /// Reference, needed to read CRAM headers
    #[arg(short = 'g', long = "reference")]
    pub reference: Option<PathBuf>,

    /// Number of shards to plan for
    #[arg(short = 'j', long = "threads", default_value_t = 1)]
    pub threads: usize,

    /// Restrict the plan to these intervals
    #[arg(short = 'L', long = "interval-list", num_args = 1..)]
    pub intervals: Vec<String>,

    /// Write the plan here instead of stdout
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn find_parses_short_flags() {
        let args = Args::parse_from([
            "dark-region-finder", "find", "-i", "s.bam", "-g", "ref.fa", "-s", "10", "-j", "4",
            "-e", "-v", "lenient", "-L", "chr1:1-100", "chrM",
        ]);
        let Commands::Find(find) = args.command else {
            panic!("expected find");
        };
        assert_eq!(find.min_region_size, Some(10));
        assert_eq!(find.threads, Some(4));
        assert!(find.exclusive_regions);
        assert_eq!(find.validation_stringency, Some(ValidationStringency::Lenient));
        assert_eq!(find.intervals, vec!["chr1:1-100", "chrM"]);
        assert_eq!(find.coverage_output, PathBuf::from("low_coverage.dark.bed"));
        assert_eq!(find.min_depth, None);
    }
}
