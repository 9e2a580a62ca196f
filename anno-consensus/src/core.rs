//! Core module for thresholding and reconciling ensemble predictions
//!
//! Every model of the ensemble scores (gene, GO term) pairs independently.
//! The threshold module derives one cutoff per model from the distribution
//! of its strictly positive scores (first quartile by default, linear
//! interpolation), and the vote module keeps, per model, the pairs scoring
//! at or above that cutoff before counting how many models agree on each
//! pair. A pair passes when its vote count reaches the majority of the
//! configured ensemble, ceil(N/2), unless another cut is requested.
//!
//! The percentile rule is a heuristic inclusion criterion, not a calibrated
//! statistical test; skewed or multimodal score distributions may call for
//! a different percentile.

pub mod threshold;
pub mod vote;

use anno_pack::{ingest, read_fasta, NormalizedBatch, ParserOptions};
use anyhow::Result;
use config::{AnnotationError, Ensemble, SourceTool};
use log::info;

use crate::cli::Args;
use crate::utils::{log_distribution, write_outputs};
use threshold::{compute_thresholds, ThresholdTable};
use vote::{ConsensusEngine, ConsensusOutcome};

/// thresholds, votes and the models left without a threshold
#[derive(Debug)]
pub struct ConsensusRun {
    pub thresholds: ThresholdTable,
    pub outcome: ConsensusOutcome,
    pub undefined: Vec<AnnotationError>,
}

/// thresholds first, then votes; nothing is written
pub fn run_consensus(
    batch: &NormalizedBatch,
    ensemble: &Ensemble,
    percentile: f64,
    min_votes: usize,
) -> ConsensusRun {
    let (thresholds, undefined) = compute_thresholds(&batch.scores, ensemble, percentile);
    let outcome = ConsensusEngine::new(ensemble, &thresholds)
        .with_min_votes(min_votes)
        .run(batch);

    log_distribution(&outcome);

    ConsensusRun {
        thresholds,
        outcome,
        undefined,
    }
}

/// standalone consensus over the FANTASIA tables named in `args`
pub fn consensus(args: Args) -> Result<ConsensusRun> {
    info!("Computing ensemble consensus...");

    let ensemble = args.ensemble.ensemble()?;
    let min_votes = args.ensemble.min_votes(&ensemble)?;
    info!(
        "Ensemble: {} model(s) [{}], majority at {} vote(s)",
        ensemble.size(),
        ensemble.names().collect::<Vec<_>>().join(", "),
        min_votes
    );

    let sources = args
        .inputs
        .sources()
        .into_iter()
        .filter(|(tool, _)| *tool == SourceTool::Fantasia)
        .collect::<Vec<_>>();

    let options = ParserOptions {
        ensemble: ensemble.clone(),
        skip_rows: args.inputs.skip_rows,
    };
    let ingested = ingest(&sources, &options);

    let universe = match &args.fasta {
        Some(fasta) => Some(read_fasta(fasta)?),
        None => None,
    };

    let run = run_consensus(
        &ingested.batch,
        &ensemble,
        args.ensemble.percentile,
        min_votes,
    );

    args.output.create()?;
    write_outputs(
        &run.thresholds,
        &run.outcome,
        universe.as_ref(),
        &args.output.outdir,
        &args.output.sample,
    )?;

    Ok(run)
}
