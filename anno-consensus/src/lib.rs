pub mod cli;
pub mod core;
pub mod utils;

pub use crate::core::{consensus, run_consensus, ConsensusRun};

use anyhow::Result;
use config::ArgCheck;

pub fn lib_anno_consensus(args: Vec<String>) -> Result<ConsensusRun> {
    let args = cli::Args::from(args);
    args.check()?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads.max(config::MIN_THREADS))
        .build()?;

    pool.install(|| crate::core::consensus(args))
}
