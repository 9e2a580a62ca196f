//! Core module for comparing the genes each annotation source covers
//!
//! Every tool is projected to the set of genes holding at least one
//! functional term (GO, KEGG or pathway). Both EggNOG generations feed one
//! set, and the ensemble contributes the genes kept by any model after
//! thresholding when a consensus run is available. The sets are then
//! compared through a membership histogram, so any number of tools up to
//! [`sets::MAX_COMBINED_TOOLS`] can be combined without hand-written cases.

pub mod sets;
pub mod summary;

use anno_consensus::{run_consensus, ConsensusRun};
use anno_pack::{ingest, read_fasta, GeneUniverse, Ingested, ParserOptions};
use anyhow::Result;
use config::{out_path, Ensemble, SourceTool, COVERAGE, OVERLAP_JSON, OVERLAP_TXT};
use log::{info, warn};

use std::path::Path;

use crate::cli::Args;
use crate::utils::{
    coverage_rows, total_genes, write_coverage, write_json, write_text, CoverageRow,
};
use summary::{collect_sets, summarize, OverlapSummary};

/// coverage rows and the set summary of one sample
#[derive(Debug)]
pub struct OverlapReport {
    pub coverage: Vec<CoverageRow>,
    pub summary: OverlapSummary,
}

/// compare the tools of one sample; nothing is written
///
/// Every requested tool gets a coverage row, but only tools whose tables
/// could be read take part in the set comparison.
pub fn analyze(
    ingested: &Ingested,
    ensemble: &Ensemble,
    run: Option<&ConsensusRun>,
    universe: Option<&GeneUniverse>,
    group: &[String],
    focus: Option<&str>,
) -> Result<OverlapReport> {
    let index = &ingested.batch.index;
    let tools = ingested.tools();
    let usable = ingested.usable_tools();

    for tool in tools.iter().filter(|t| !usable.contains(t)) {
        warn!("{} could not be read, left out of the overlaps", tool);
    }

    let total = total_genes(universe, index, &usable);
    let coverage = coverage_rows(index, &tools, ensemble, run, total);

    let ensemble_genes = run.map(|r| r.outcome.ensemble_genes());
    let sets = collect_sets(index, &usable, ensemble_genes.as_ref());
    let summary = summarize(&sets, group, focus)?;

    info!(
        "Annotated genes: {} in union, {} shared by all {} tool(s)",
        summary.union,
        summary.intersection,
        sets.len()
    );

    Ok(OverlapReport { coverage, summary })
}

/// <sample>_coverage.tsv plus the JSON and text overlap summaries
pub fn write_report(report: &OverlapReport, outdir: &Path, sample: &str) -> Result<()> {
    write_coverage(&report.coverage, &out_path(outdir, sample, COVERAGE))?;
    write_json(&report.summary, &out_path(outdir, sample, OVERLAP_JSON))?;
    write_text(&report.summary, &out_path(outdir, sample, OVERLAP_TXT))?;
    Ok(())
}

/// standalone coverage and overlap over every table named in `args`
///
/// # Example
///
/// ```rust, no_run
/// use anno_overlap::{cli::Args, core::overlap};
///
/// let args = Args::from(vec!["--results-dir".to_string(), "results/".to_string()]);
/// let report = overlap(args).unwrap();
/// println!("{} genes in union", report.summary.union);
/// ```
pub fn overlap(args: Args) -> Result<OverlapReport> {
    info!("Computing annotation coverage and overlaps...");

    let ensemble = args.ensemble.ensemble()?;
    let min_votes = args.ensemble.min_votes(&ensemble)?;

    let sources = args.inputs.sources();
    let options = ParserOptions {
        ensemble: ensemble.clone(),
        skip_rows: args.inputs.skip_rows,
    };
    let ingested = ingest(&sources, &options);

    let universe = match &args.fasta {
        Some(fasta) => Some(read_fasta(fasta)?),
        None => None,
    };

    let run = ingested
        .usable_tools()
        .contains(&SourceTool::Fantasia)
        .then(|| {
            run_consensus(
                &ingested.batch,
                &ensemble,
                args.ensemble.percentile,
                min_votes,
            )
        });

    let focus = args.focus_set()?;
    let report = analyze(
        &ingested,
        &ensemble,
        run.as_ref(),
        universe.as_ref(),
        &args.group_sets()?,
        Some(focus.as_str()),
    )?;

    args.output.create()?;
    write_report(&report, &args.output.outdir, &args.output.sample)?;

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_overlap_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let kofam = write(
            dir.path(),
            "s1_kofam_mapper.tsv",
            "g1\tK00001\ng2\tK00002\ng3\n",
        );
        let interpro = write(
            dir.path(),
            "s1_interpro.tsv",
            "g2\tmd5\t100\tPfam\tPF1\tdesc\t1\t50\t1e-10\tT\tdate\tIPR000001\tdesc\tGO:0000001\t-\n\
             g4\tmd5\t100\tPfam\tPF1\tdesc\t1\t50\t1e-10\tT\tdate\tIPR000001\tdesc\t-\t-\n",
        );
        let fasta = write(dir.path(), "s1.faa", ">g1\nMA\n>g2\nMA\n>g3\nMA\n>g4\nMA\n");

        let out = dir.path().join("out");
        let args = Args::from(vec![
            "--kofamscan".to_string(),
            kofam.display().to_string(),
            "--interproscan".to_string(),
            interpro.display().to_string(),
            "--fasta".to_string(),
            fasta.display().to_string(),
            "--outdir".to_string(),
            out.display().to_string(),
            "--sample".to_string(),
            "s1".to_string(),
        ]);

        let report = overlap(args).unwrap();

        assert_eq!(report.summary.group, vec!["kofamscan", "interproscan"]);
        assert_eq!(report.summary.union, 2);
        assert_eq!(report.summary.intersection, 1);
        assert!(report.summary.focus.is_none());

        let kofam_row = report
            .coverage
            .iter()
            .find(|r| r.source == "kofamscan")
            .unwrap();
        assert_eq!(kofam_row.total, 4);
        assert_eq!(kofam_row.percentage, 50.0);

        assert!(out.join("s1_coverage.tsv").exists());
        assert!(out.join("s1_overlap_summary.json").exists());
        assert!(out.join("s1_overlap_summary.txt").exists());
    }

    #[test]
    fn test_unreadable_tools_stay_out_of_overlaps() {
        let dir = tempfile::tempdir().unwrap();
        let kofam = write(dir.path(), "s1_kofam_mapper.tsv", "g1\tK00001\ng2\tK00002\n");
        let interpro = write(
            dir.path(),
            "s1_interpro.tsv",
            "g2\tmd5\t100\tPfam\tPF1\tdesc\t1\t50\t1e-10\tT\tdate\t\
             IPR000001\tdesc\tGO:0000001\t-\n",
        );
        let fantasia = write(dir.path(), "s1_fantasia.tsv", "protein\tterm\nP1\tGO:1\n");
        let eggnog = dir.path().join("absent.emapper.annotations");

        let out = dir.path().join("out");
        let report = overlap(Args::from(vec![
            "--kofamscan".to_string(),
            kofam.display().to_string(),
            "--interproscan".to_string(),
            interpro.display().to_string(),
            "--eggnog".to_string(),
            eggnog.display().to_string(),
            "--fantasia".to_string(),
            fantasia.display().to_string(),
            "--outdir".to_string(),
            out.display().to_string(),
        ]))
        .unwrap();

        let summary = &report.summary;
        assert_eq!(summary.group, vec!["kofamscan", "interproscan"]);
        assert!(summary.tools.iter().all(|t| t.tool != "eggnog" && t.tool != "fantasia"));
        assert_eq!(summary.union, 2);
        assert_eq!(summary.intersection, 1);
        assert_eq!(summary.group_intersection, 1);
        assert!(summary.focus.is_none());

        let eggnog_row = report.coverage.iter().find(|r| r.source == "eggnog").unwrap();
        assert_eq!(eggnog_row.annotated, 0);
        assert!(report.coverage.iter().all(|r| r.source != "consensus"));
        assert!(!out.join("sample_consensus.tsv").exists());
    }
}
