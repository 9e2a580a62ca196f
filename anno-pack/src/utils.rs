use config::{
    out_path, write_table, AnnotationError, ErrorClass, SourceTool, MISSING, NA, PER_GENE,
    PER_TERM, RUN_REPORT,
};
use log::info;
use rayon::prelude::*;
use serde::Serialize;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::index::{NormalizedBatch, SourceKey};
use crate::parser::ParseStats;
use crate::record::{emitted_kinds, TermKind};

/// per-tool counters for the final summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolReport {
    pub tool: SourceTool,
    pub files: usize,
    pub rows_read: usize,
    pub rows_parsed: usize,
    pub rows_skipped: usize,
    pub facts: usize,
    pub genes: usize,
    pub errors: BTreeMap<ErrorClass, usize>,
}

impl ToolReport {
    pub fn new(tool: SourceTool) -> Self {
        Self {
            tool,
            files: 0,
            rows_read: 0,
            rows_parsed: 0,
            rows_skipped: 0,
            facts: 0,
            genes: 0,
            errors: BTreeMap::new(),
        }
    }

    pub fn absorb(&mut self, stats: &ParseStats) {
        self.rows_read += stats.rows_read;
        self.rows_parsed += stats.rows_parsed;
        self.rows_skipped += stats.rows_skipped;
        self.facts += stats.facts;

        if stats.rows_skipped > 0 {
            *self.errors.entry(ErrorClass::RowParseError).or_default() += stats.rows_skipped;
        }
    }

    pub fn record(&mut self, err: &AnnotationError) {
        *self.errors.entry(err.class()).or_default() += 1;
    }

    pub fn merge(mut self, other: ToolReport) -> Self {
        self.files += other.files;
        self.rows_read += other.rows_read;
        self.rows_parsed += other.rows_parsed;
        self.rows_skipped += other.rows_skipped;
        self.facts += other.facts;
        for (class, count) in other.errors {
            *self.errors.entry(class).or_default() += count;
        }
        self
    }

    pub fn has(&self, class: ErrorClass) -> bool {
        self.errors.contains_key(&class)
    }

    pub fn is_failed(&self) -> bool {
        self.errors.keys().any(|class| class.is_fatal())
    }

    /// a failed file only disqualifies a tool when nothing else of it parsed
    pub fn is_usable(&self) -> bool {
        !self.is_failed() || self.genes > 0
    }

    fn errors_cell(&self) -> String {
        if self.errors.is_empty() {
            return MISSING.to_string();
        }

        self.errors
            .iter()
            .map(|(class, count)| format!("{}:{}", class, count))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn row(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.tool,
            self.files,
            self.rows_read,
            self.rows_parsed,
            self.rows_skipped,
            self.facts,
            self.genes,
            self.errors_cell()
        )
    }
}

const REPORT_HEADER: &str =
    "tool\tfiles\trows_read\trows_parsed\trows_skipped\tfacts\tgenes\terrors";

/// log the per-tool summary and write it next to the other outputs
pub fn write_run_report(
    reports: &[ToolReport],
    outdir: &Path,
    sample: &str,
) -> std::io::Result<PathBuf> {
    info!("{}", REPORT_HEADER);
    for report in reports {
        info!("{}", report.row());
    }

    let path = out_path(outdir, sample, RUN_REPORT);
    write_table(&path, REPORT_HEADER, reports.iter().map(|r| r.row()))?;

    Ok(path)
}

/// gene, source, kind, term, score rows of one tool
pub fn per_term_rows(batch: &NormalizedBatch, tool: SourceTool) -> Vec<String> {
    let sources = batch
        .index
        .sources()
        .into_iter()
        .filter(|key| key.tool == tool)
        .collect::<Vec<_>>();

    let mut rows = sources
        .par_iter()
        .flat_map_iter(|key| {
            batch.index.pairs(key).map(move |(gene, term)| {
                let score = batch
                    .scores
                    .get(key, gene, term)
                    .map_or(NA.to_string(), |s| s.to_string());

                (
                    gene.to_string(),
                    term.0.clone(),
                    key.to_string(),
                    format!("{}\t{}\t{}\t{}\t{}", gene, key, term.1, term.0, score),
                )
            })
        })
        .collect::<Vec<_>>();

    rows.par_sort_unstable();
    rows.into_iter().map(|(_, _, _, row)| row).collect()
}

/// one row per gene with a comma-joined column per term kind of the tool
pub fn per_gene_rows(batch: &NormalizedBatch, tool: SourceTool) -> Vec<String> {
    let kinds = emitted_kinds(tool);
    let sources = batch
        .index
        .sources()
        .into_iter()
        .filter(|key| key.tool == tool)
        .collect::<Vec<SourceKey>>();

    let mut genes = batch
        .index
        .genes()
        .filter(|gene| sources.iter().any(|k| batch.index.terms(gene, k).is_some()))
        .collect::<Vec<_>>();
    genes.par_sort_unstable();

    genes
        .par_iter()
        .map(|gene| {
            let mut columns = vec![BTreeSet::new(); kinds.len()];

            for key in sources.iter() {
                let Some(terms) = batch.index.terms(gene, key) else {
                    continue;
                };
                for (term, kind) in terms {
                    if let Some(idx) = kinds.iter().position(|k| k == kind) {
                        columns[idx].insert(term.as_str());
                    }
                }
            }

            let cells = columns
                .iter()
                .map(|terms| {
                    if terms.is_empty() {
                        MISSING.to_string()
                    } else {
                        terms.iter().copied().collect::<Vec<_>>().join(",")
                    }
                })
                .collect::<Vec<_>>();

            format!("{}\t{}", gene, cells.join("\t"))
        })
        .collect()
}

fn per_gene_header(tool: SourceTool) -> String {
    let mut header = vec!["gene"];
    header.extend(emitted_kinds(tool).iter().map(TermKind::as_str));
    header.join("\t")
}

/// write <sample>_<tool>_per_term.tsv and <sample>_<tool>_per_gene.tsv
pub fn write_normalized(
    batch: &NormalizedBatch,
    tool: SourceTool,
    outdir: &Path,
    sample: &str,
) -> std::io::Result<(PathBuf, PathBuf)> {
    let per_term = out_path(outdir, sample, &format!("{}_{}", tool, PER_TERM));
    let per_gene = out_path(outdir, sample, &format!("{}_{}", tool, PER_GENE));

    write_table(
        &per_term,
        "gene\tsource\tkind\tterm\tscore",
        per_term_rows(batch, tool),
    )?;
    write_table(&per_gene, &per_gene_header(tool), per_gene_rows(batch, tool))?;

    Ok((per_term, per_gene))
}
