use crate::cli::FindArgs;
use crate::config::Config;
use crate::dark_regions::output::OutputReservation;
use crate::dark_regions::{self, DarkRegionOptions, OutputPaths, ScanRequest};
use anyhow::{Context, Result};
use log::info;

pub fn run(args: FindArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::load(),
    };
    let options = options_from(&args, &config);
    options.validate()?;

    let (outputs, reservation) = destinations(&args, &options)?;
    let request = ScanRequest {
        alignments: args.input.clone(),
        reference: args.reference.clone(),
        outputs,
        summary: args.summary.clone(),
        options,
    };

    info!(
        "Scanning {} against {}",
        request.alignments.display(),
        request.reference.display()
    );
    dark_regions::run(&request)
        .with_context(|| format!("Failed to scan {}", request.alignments.display()))?;
    reservation.release()?;
    info!(
        "Regions written to {}, {} and {}",
        request.outputs.low_depth.display(),
        request.outputs.low_mapq.display(),
        request.outputs.incomplete.display()
    );
    Ok(())
}

/// Output paths for this run. With an interval list every name gets a unique salt, so
/// jobs covering different intervals can share one output directory.
pub fn destinations(
    args: &FindArgs,
    options: &DarkRegionOptions,
) -> Result<(OutputPaths, OutputReservation)> {
    let requested = OutputPaths {
        incomplete: args.incomplete_output.clone(),
        low_depth: args.coverage_output.clone(),
        low_mapq: args.mapq_output.clone(),
    };
    if options.intervals.is_none() {
        return Ok((requested, OutputReservation::default()));
    }
    let (salted, reservation) = requested
        .reserve_unique()
        .context("Failed to reserve unique output names")?;
    info!(
        "Interval list given; writing to {}, {} and {}",
        salted.low_depth.display(),
        salted.low_mapq.display(),
        salted.incomplete.display()
    );
    Ok((salted, reservation))
}

/// `--flag` / `--no-flag` pairs; neither leaves the config value in place.
fn switch(on: bool, off: bool, configured: bool) -> bool {
    match (on, off) {
        (true, _) => true,
        (_, true) => false,
        _ => configured,
    }
}

/// Layers the command-line flags over the config file.
pub fn options_from(args: &FindArgs, config: &Config) -> DarkRegionOptions {
    let mut options = config.to_options();
    if let Some(value) = args.mapq_threshold {
        options.mapq_threshold = value;
    }
    if let Some(value) = args.min_mapq_mass {
        options.min_mapq_mass = value;
    }
    if let Some(value) = args.min_depth {
        options.min_depth = value;
    }
    if let Some(value) = args.min_region_size {
        options.min_region_size = value;
    }
    if let Some(value) = args.max_buffered_loci {
        options.max_buffered_loci = value;
    }
    if let Some(value) = args.threads {
        options.threads = value;
    }
    if let Some(value) = args.max_pileup_depth {
        options.max_pileup_depth = value;
    }
    if let Some(value) = args.validation_stringency {
        options.validation_stringency = value;
    }
    if let Some(value) = &args.tmp_dir {
        options.tmp_dir = value.clone();
    }
    options
        .with_exclusive_regions(switch(
            args.exclusive_regions,
            args.no_exclusive_regions,
            config.exclusive_regions,
        ))
        .with_header(switch(args.header, args.no_header, config.write_header))
        .with_progress(!args.quiet)
        .with_intervals(Some(args.intervals.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Args, Commands};
    use crate::dark_regions::ValidationStringency;
    use clap::Parser;

    fn find_args(extra: &[&str]) -> FindArgs {
        let mut argv = vec!["dark-region-finder", "find", "-i", "s.bam", "-g", "ref.fa"];
        argv.extend_from_slice(extra);
        match Args::parse_from(argv).command {
            Commands::Find(args) => args,
            _ => panic!("expected find"),
        }
    }

    #[test]
    fn flags_override_config() {
        let config = Config {
            min_depth: 12,
            threads: 8,
            validation_stringency: ValidationStringency::Silent,
            ..Config::default()
        };
        let options = options_from(&find_args(&["-d", "3", "-q"]), &config);
        assert_eq!(options.min_depth, 3);
        assert_eq!(options.threads, 8);
        assert_eq!(options.validation_stringency, ValidationStringency::Silent);
        assert!(!options.show_progress);
        assert_eq!(options.intervals, None);
    }

    #[test]
    fn config_switches_can_be_turned_off() {
        let config = Config {
            exclusive_regions: true,
            write_header: true,
            ..Config::default()
        };
        let kept = options_from(&find_args(&[]), &config);
        assert!(kept.exclusive_regions);
        assert!(kept.write_header);

        let off = options_from(&find_args(&["--no-exclusive-regions", "--no-header"]), &config);
        assert!(!off.exclusive_regions);
        assert!(!off.write_header);

        let last_wins = options_from(&find_args(&["--no-exclusive-regions", "-e"]), &Config::default());
        assert!(last_wins.exclusive_regions);
    }

    fn find_args_in(dir: &std::path::Path, extra: &[&str]) -> FindArgs {
        let outputs = [
            dir.join("depth.bed").to_string_lossy().into_owned(),
            dir.join("mapq.bed").to_string_lossy().into_owned(),
            dir.join("inc.bed").to_string_lossy().into_owned(),
        ];
        let mut argv: Vec<&str> = vec!["-c", &outputs[0], "-a", &outputs[1], "-n", &outputs[2]];
        argv.extend_from_slice(extra);
        find_args(&argv)
    }

    #[test]
    fn interval_runs_get_unique_outputs() {
        let dir = tempfile::TempDir::new().unwrap();
        let args = find_args_in(dir.path(), &["-L", "chr1:1-100"]);
        let options = options_from(&args, &Config::default());

        let (first, first_hold) = destinations(&args, &options).unwrap();
        let (second, second_hold) = destinations(&args, &options).unwrap();
        assert_ne!(first.low_depth, second.low_depth);
        assert_ne!(first.incomplete, args.incomplete_output);
        assert!(first.low_mapq.to_string_lossy().contains("mapq.salt_"));
        first_hold.release().unwrap();
        second_hold.release().unwrap();
    }

    #[test]
    fn whole_genome_runs_keep_their_outputs() {
        let dir = tempfile::TempDir::new().unwrap();
        let args = find_args_in(dir.path(), &[]);
        let options = options_from(&args, &Config::default());
        let (outputs, _) = destinations(&args, &options).unwrap();
        assert_eq!(outputs.low_depth, args.coverage_output);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn intervals_pass_through() {
        let options = options_from(&find_args(&["-L", "chr1:5-9"]), &Config::default());
        assert_eq!(options.intervals, Some(vec!["chr1:5-9".to_string()]));
        assert_eq!(options.mapq_threshold, 9);
    }
}
