use anno_consensus::ConsensusRun;
use anno_pack::record::emitted_kinds;
use anno_pack::{GeneAnnotationIndex, GeneUniverse, SourceKey, TermKind};
use config::{write_table, Ensemble, SourceTool};
use hashbrown::HashSet;
use serde::Serialize;

use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::core::summary::{OverlapSummary, UniqueSet};

const COVERAGE_HEADER: &str = "source\tannotated_genes\ttotal_genes\tpercentage";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageRow {
    pub source: String,
    pub annotated: usize,
    pub total: usize,
    pub percentage: f64,
}

impl CoverageRow {
    pub fn new(source: &str, annotated: usize, total: usize) -> Self {
        let percentage = if total > 0 {
            annotated as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        Self {
            source: source.to_string(),
            annotated,
            total,
            percentage,
        }
    }

    pub fn row(&self) -> String {
        format!(
            "{}\t{}\t{}\t{:.2}",
            self.source, self.annotated, self.total, self.percentage
        )
    }
}

/// proteome size when known, otherwise every gene with a functional term
pub fn total_genes(
    universe: Option<&GeneUniverse>,
    index: &GeneAnnotationIndex,
    tools: &[SourceTool],
) -> usize {
    match universe {
        Some(universe) if !universe.is_empty() => universe.len(),
        _ => tools
            .iter()
            .flat_map(|tool| index.genes_for(*tool, &TermKind::FUNCTIONAL))
            .collect::<HashSet<_>>()
            .len(),
    }
}

/// coverage per tool, per EggNOG term kind, per model before and after
/// filtering, and for the consensus set
pub fn coverage_rows(
    index: &GeneAnnotationIndex,
    tools: &[SourceTool],
    ensemble: &Ensemble,
    run: Option<&ConsensusRun>,
    total: usize,
) -> Vec<CoverageRow> {
    let mut rows = Vec::new();

    for tool in tools.iter().filter(|t| !t.is_ensemble()) {
        let genes = index.genes_for(*tool, &TermKind::FUNCTIONAL);
        rows.push(CoverageRow::new(tool.as_str(), genes.len(), total));

        if matches!(tool, SourceTool::EggNog | SourceTool::EggNog7) {
            for kind in emitted_kinds(*tool) {
                let genes = index.genes_for(*tool, &[*kind]);
                rows.push(CoverageRow::new(
                    &format!("{}:{}", tool, kind),
                    genes.len(),
                    total,
                ));
            }
        }
    }

    if !tools.contains(&SourceTool::Fantasia) {
        return rows;
    }

    for (idx, model) in ensemble.names().enumerate() {
        let key = SourceKey::model(SourceTool::Fantasia, model);
        let before = index.genes_for_source(&key, &[TermKind::Go]);
        rows.push(CoverageRow::new(
            &format!("{}:{}:pre_filter", SourceTool::Fantasia, model),
            before.len(),
            total,
        ));

        if let Some(after) = run.and_then(|r| r.outcome.filtered.get(idx)) {
            rows.push(CoverageRow::new(
                &format!("{}:{}:post_filter", SourceTool::Fantasia, model),
                after.genes().len(),
                total,
            ));
        }
    }

    match run {
        Some(run) => {
            rows.push(CoverageRow::new(
                SourceTool::Fantasia.as_str(),
                run.outcome.ensemble_genes().len(),
                total,
            ));
            rows.push(CoverageRow::new(
                "consensus",
                run.outcome.passing_genes().len(),
                total,
            ));
        }
        None => rows.push(CoverageRow::new(
            SourceTool::Fantasia.as_str(),
            index
                .genes_for(SourceTool::Fantasia, &TermKind::FUNCTIONAL)
                .len(),
            total,
        )),
    }

    rows
}

pub fn write_coverage(rows: &[CoverageRow], path: &Path) -> std::io::Result<usize> {
    write_table(path, COVERAGE_HEADER, rows.iter().map(|r| r.row()))
}

pub fn write_json(summary: &OverlapSummary, path: &Path) -> anyhow::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, summary)?;
    writer.flush()?;

    log::info!("Overlap summary written to {}", path.display());
    Ok(())
}

fn unique_line(out: &mut String, set: &UniqueSet) -> std::fmt::Result {
    write!(out, "  {}: {} gene(s)", set.tool, set.genes)?;
    if !set.examples.is_empty() {
        write!(out, " [e.g. {}]", set.examples.join(", "))?;
    }
    writeln!(out)
}

/// plain-text rendering of the overlap summary
pub fn render_text(summary: &OverlapSummary) -> Result<String, std::fmt::Error> {
    let mut out = String::new();

    writeln!(out, "ANNOTATION OVERLAP SUMMARY")?;
    writeln!(out)?;
    writeln!(out, "Genes per tool:")?;
    for tool in summary.tools.iter() {
        writeln!(out, "  {}: {}", tool.tool, tool.genes)?;
    }

    writeln!(out)?;
    writeln!(out, "Union of all tools: {}", summary.union)?;
    writeln!(out, "Intersection of all tools: {}", summary.intersection)?;

    writeln!(out)?;
    writeln!(out, "Comparison group: {}", summary.group.join(", "))?;
    writeln!(out, "  union: {}", summary.group_union)?;
    writeln!(out, "  intersection: {}", summary.group_intersection)?;
    writeln!(out, "Unique to one group tool:")?;
    for set in summary.unique.iter() {
        unique_line(&mut out, set)?;
    }

    if let Some(focus) = &summary.focus {
        writeln!(out)?;
        writeln!(out, "Annotated only by {} (absent from the group):", focus.tool)?;
        unique_line(&mut out, focus)?;
    }

    writeln!(out)?;
    writeln!(out, "Combinations (intersection / union / exclusive):")?;
    for combination in summary.combinations.iter() {
        writeln!(
            out,
            "  {}: {} / {} / {}",
            combination.tools.join(" & "),
            combination.intersection,
            combination.union,
            combination.exclusive
        )?;
    }

    Ok(out)
}

pub fn write_text(summary: &OverlapSummary, path: &Path) -> anyhow::Result<()> {
    let text = render_text(summary)?;
    std::fs::write(path, text)?;
    Ok(())
}
