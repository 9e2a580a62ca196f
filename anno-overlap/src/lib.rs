pub mod cli;
pub mod core;
pub mod utils;

pub use crate::core::{analyze, overlap, write_report, OverlapReport};

use anyhow::Result;
use config::ArgCheck;

pub fn lib_anno_overlap(args: Vec<String>) -> Result<OverlapReport> {
    let args = cli::Args::from(args);
    args.check()?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads.max(config::MIN_THREADS))
        .build()?;

    pool.install(|| crate::core::overlap(args))
}
