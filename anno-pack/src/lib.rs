//! Core module for reading and normalizing functional annotation tables.
//!
//! Every supported tool writes its own table layout; this crate turns each
//! of them into a lazy stream of [`AnnotationFact`] values through a
//! [`TableParser`] chosen by [`ToolParser::for_tool`], and folds those
//! streams into a [`NormalizedBatch`]: a per-gene, per-source index of
//! deduplicated terms plus the scores attached to them.
//!
//! Files are independent of each other, so [`ingest`] parses them in
//! parallel and merges the partial batches at the end. A file that cannot
//! be opened or whose header does not match only removes its own tool from
//! the batch; everything else is still processed.

pub mod cli;
pub mod fasta;
pub mod index;
pub mod parser;
pub mod record;
pub mod schemas;
pub mod utils;

pub use fasta::{read_fasta, GeneUniverse};
pub use index::{normalize, GeneAnnotationIndex, NormalizedBatch, ScoreTable, SourceKey};
pub use parser::{FactStream, ParseStats, ParserOptions, TableParser, ToolParser};
pub use record::{AnnotationFact, Term, TermKind};
pub use utils::ToolReport;

use config::{get_progress_bar, AnnotationError, SourceTool};
use hashbrown::HashMap;
use log::{error, info, warn};
use rayon::prelude::*;

use std::path::{Path, PathBuf};

/// everything parsed from one sample
#[derive(Debug, Default)]
pub struct Ingested {
    pub batch: NormalizedBatch,
    pub reports: Vec<ToolReport>,
}

impl Ingested {
    pub fn report_mut(&mut self, tool: SourceTool) -> &mut ToolReport {
        let idx = match self.reports.iter().position(|r| r.tool == tool) {
            Some(idx) => idx,
            None => {
                self.reports.push(ToolReport::new(tool));
                self.reports.len() - 1
            }
        };

        &mut self.reports[idx]
    }

    /// every requested tool, in tool order
    pub fn tools(&self) -> Vec<SourceTool> {
        self.reports.iter().map(|r| r.tool).collect()
    }

    /// requested tools whose tables could be read
    pub fn usable_tools(&self) -> Vec<SourceTool> {
        self.reports
            .iter()
            .filter(|r| r.is_usable())
            .map(|r| r.tool)
            .collect()
    }
}

/// parse and normalize a single table
///
/// # Example
///
/// ```rust, no_run
/// use anno_pack::{ingest_file, ParserOptions};
/// use config::SourceTool;
///
/// let (batch, report) = ingest_file(
///     SourceTool::KofamScan,
///     std::path::Path::new("sample_kofam_mapper.tsv"),
///     &ParserOptions::default(),
/// );
/// println!("{} genes, {} rows skipped", batch.index.len(), report.rows_skipped);
/// ```
pub fn ingest_file(
    tool: SourceTool,
    path: &Path,
    options: &ParserOptions,
) -> (NormalizedBatch, ToolReport) {
    let mut report = ToolReport::new(tool);
    report.files = 1;

    let mut stream = match FactStream::open(path, ToolParser::for_tool(tool, options)) {
        Ok(stream) => stream,
        Err(e) => {
            error!("{}", e);
            report.record(&e);
            return (NormalizedBatch::default(), report);
        }
    };

    let batch = stream.by_ref().collect::<NormalizedBatch>();
    let (stats, failure) = stream.finish();
    report.absorb(&stats);

    match failure {
        Some(e) => {
            error!("{}: {} [{}]", tool, e, path.display());
            report.record(&e);
            (NormalizedBatch::default(), report)
        }
        None => (batch, report),
    }
}

/// parse every (tool, path) pair in parallel and merge the results
pub fn ingest(sources: &[(SourceTool, PathBuf)], options: &ParserOptions) -> Ingested {
    let pb = get_progress_bar(sources.len() as u64, "Parsing annotation tables");

    let (batch, reports) = sources
        .par_iter()
        .map(|(tool, path)| {
            let parsed = ingest_file(*tool, path, options);
            pb.inc(1);
            (*tool, parsed)
        })
        .fold(
            || (NormalizedBatch::default(), HashMap::new()),
            |(batch, mut reports): (NormalizedBatch, HashMap<SourceTool, ToolReport>),
             (tool, (partial, report))| {
                let merged = match reports.remove(&tool) {
                    Some(acc) => acc.merge(report),
                    None => report,
                };
                reports.insert(tool, merged);
                (batch.merge(partial), reports)
            },
        )
        .reduce(
            || (NormalizedBatch::default(), HashMap::new()),
            |(a, mut ra), (b, rb)| {
                for (tool, report) in rb {
                    let merged = match ra.remove(&tool) {
                        Some(acc) => acc.merge(report),
                        None => report,
                    };
                    ra.insert(tool, merged);
                }
                (a.merge(b), ra)
            },
        );

    pb.finish_and_clear();

    let mut reports = reports.into_values().collect::<Vec<_>>();
    reports.sort_by_key(|r| r.tool);

    for report in reports.iter_mut() {
        report.genes = batch
            .index
            .genes_for(report.tool, &TermKind::ALL)
            .len();

        if report.facts == 0 && !report.is_failed() {
            let err = AnnotationError::EmptyInput(report.tool);
            warn!("{}", err);
            report.record(&err);
        }
    }

    info!(
        "Genes in normalized index: {} from {} source(s)",
        batch.index.len(),
        batch.index.sources().len()
    );

    Ingested { batch, reports }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::ErrorClass;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_ingest_same_file_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let kofam = write(
            dir.path(),
            "s1_kofam_mapper.tsv",
            "g1\tK00001\ng1\tK00002\ng2\ng3\tK00001\n",
        );

        let (a, _) = ingest_file(SourceTool::KofamScan, &kofam, &ParserOptions::default());
        let (b, _) = ingest_file(SourceTool::KofamScan, &kofam, &ParserOptions::default());

        assert_eq!(a.index, b.index);
        assert_eq!(a.index.len(), 2);
    }

    #[test]
    fn test_ingest_isolates_tool_failures() {
        let dir = tempfile::tempdir().unwrap();
        let kofam = write(dir.path(), "s1_kofam_mapper.tsv", "g1\tK00001\n");
        let fantasia = write(dir.path(), "s1_fantasia.tsv", "protein\tterm\nP1\tGO:1\n");
        let eggnog = write(
            dir.path(),
            "s1.emapper.annotations",
            "## emapper\n#query\tGOs\tKEGG_ko\n## done\n",
        );

        let sources = vec![
            (SourceTool::KofamScan, kofam),
            (SourceTool::EggNog, eggnog),
            (SourceTool::InterProScan, dir.path().join("absent.tsv")),
            (SourceTool::Fantasia, fantasia),
        ];

        let ingested = ingest(&sources, &ParserOptions::default());
        let report = |tool| {
            ingested
                .reports
                .iter()
                .find(|r| r.tool == tool)
                .unwrap()
                .clone()
        };

        assert_eq!(ingested.batch.index.len(), 1);
        assert_eq!(report(SourceTool::KofamScan).genes, 1);
        assert!(report(SourceTool::InterProScan).has(ErrorClass::MissingRequiredFile));
        assert!(report(SourceTool::Fantasia).has(ErrorClass::SchemaMismatch));
        assert!(!report(SourceTool::Fantasia).has(ErrorClass::EmptyInput));
        assert!(report(SourceTool::EggNog).has(ErrorClass::EmptyInput));

        assert_eq!(
            ingested.usable_tools(),
            vec![SourceTool::KofamScan, SourceTool::EggNog]
        );
        assert_eq!(ingested.tools().len(), 4);
    }
}
