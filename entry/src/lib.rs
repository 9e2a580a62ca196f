use anno_consensus::run_consensus;
use anno_consensus::utils::write_outputs;
use anno_overlap::cli::Args;
use anno_overlap::{analyze, write_report, OverlapReport};
use anno_pack::utils::{write_normalized, write_run_report};
use anno_pack::{ingest, read_fasta, ParserOptions};
use anyhow::Result;
use config::{ArgCheck, SourceTool};
use log::{info, warn};
use rayon::prelude::*;

use std::path::PathBuf;

/// what a full run produced
#[derive(Debug)]
pub struct RunSummary {
    pub report: OverlapReport,
    pub run_report: PathBuf,
}

/// Full batch over one sample: normalized tables for every tool, ensemble
/// thresholds and consensus when FANTASIA is present, coverage, overlaps
/// and the per-tool run report.
///
/// A tool whose table is missing or malformed only drops out of its own
/// outputs; everything else still runs.
///
/// # Example
///
/// ```rust, no_run
/// use annotools::lib;
///
/// let args = vec![
///     "--results-dir".to_string(),
///     "results/".to_string(),
///     "--fasta".to_string(),
///     "proteins.faa".to_string(),
///     "--sample".to_string(),
///     "s1".to_string(),
/// ];
///
/// lib(args).unwrap();
/// ```
pub fn lib(args: Vec<String>) -> Result<RunSummary> {
    let args = Args::from(args);
    args.check()?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads.max(config::MIN_THREADS))
        .build()?;

    pool.install(|| run(&args))
}

fn run(args: &Args) -> Result<RunSummary> {
    let ensemble = args.ensemble.ensemble()?;
    let min_votes = args.ensemble.min_votes(&ensemble)?;
    let outdir = &args.output.outdir;
    let sample = &args.output.sample;

    let sources = args.inputs.sources();
    let options = ParserOptions {
        ensemble: ensemble.clone(),
        skip_rows: args.inputs.skip_rows,
    };
    let mut ingested = ingest(&sources, &options);

    args.output.create()?;
    ingested
        .tools()
        .par_iter()
        .map(|tool| write_normalized(&ingested.batch, *tool, outdir, sample).map(|_| ()))
        .collect::<std::io::Result<Vec<_>>>()?;

    let universe = match &args.fasta {
        Some(fasta) => Some(read_fasta(fasta)?),
        None => None,
    };

    let run = match ingested.usable_tools().contains(&SourceTool::Fantasia) {
        true => {
            let run = run_consensus(
                &ingested.batch,
                &ensemble,
                args.ensemble.percentile,
                min_votes,
            );
            write_outputs(
                &run.thresholds,
                &run.outcome,
                universe.as_ref(),
                outdir,
                sample,
            )?;

            let report = ingested.report_mut(SourceTool::Fantasia);
            for err in run.undefined.iter() {
                report.record(err);
            }

            Some(run)
        }
        false if ingested.tools().contains(&SourceTool::Fantasia) => {
            warn!("FANTASIA tables could not be read, consensus is skipped");
            None
        }
        false => {
            info!("No FANTASIA table given, consensus is skipped");
            None
        }
    };

    let focus = args.focus_set()?;
    let report = analyze(
        &ingested,
        &ensemble,
        run.as_ref(),
        universe.as_ref(),
        &args.group_sets()?,
        Some(focus.as_str()),
    )?;
    write_report(&report, outdir, sample)?;

    let run_report = write_run_report(&ingested.reports, outdir, sample)?;

    Ok(RunSummary { report, run_report })
}
