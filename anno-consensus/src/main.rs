use clap::{self, Parser};
use config::ArgCheck;
use log::{error, info, Level};
use simple_logger::init_with_level;

use anno_consensus::{cli::Args, core::consensus};

fn main() {
    let start = std::time::Instant::now();
    if let Err(e) = init_with_level(Level::Info) {
        eprintln!("ERROR: could not initialize logger: {}", e);
    }

    let args: Args = Args::parse();
    args.check().unwrap_or_else(|e| {
        error!("{}", e);
        std::process::exit(1);
    });

    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads.max(config::MIN_THREADS))
        .build_global()
    {
        error!("{}", e);
        std::process::exit(1);
    }

    consensus(args).unwrap_or_else(|e| {
        error!("{}", e);
        std::process::exit(1);
    });

    let elapsed = start.elapsed();
    info!("Elapsed time: {:.3?}", elapsed);
}
