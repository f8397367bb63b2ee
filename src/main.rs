use clap::Parser;
use dark_region_finder::{cli, commands};
use log::LevelFilter;

fn main() {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = cli::Args::parse();

    let result = match args.command {
        cli::Commands::Find(args) => commands::find::run(args),
        cli::Commands::Partition(args) => commands::partition::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
