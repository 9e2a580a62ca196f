use anno_pack::GeneUniverse;
use config::{
    out_path, write_table, SourceTool, CONSENSUS, CONSENSUS_MAJORITY, FILTERED, MISSING,
    THRESHOLDS,
};
use log::info;
use rayon::prelude::*;

use std::path::{Path, PathBuf};

use crate::core::threshold::ThresholdTable;
use crate::core::vote::{ConsensusOutcome, ConsensusRecord};

const THRESHOLD_HEADER: &str = "model\tcolumn\tpositive_scores\tthreshold";
const CONSENSUS_HEADER: &str = "gene_id\tterm\tvote_count\tpassed_majority\tcontributing_models";
const FILTERED_HEADER: &str = "gene\tterm\tscore";

pub fn write_thresholds(table: &ThresholdTable, path: &Path) -> std::io::Result<usize> {
    write_table(path, THRESHOLD_HEADER, table.iter().map(|e| e.row()))
}

fn consensus_row(record: &ConsensusRecord, universe: Option<&GeneUniverse>) -> String {
    let models = record
        .contributing_models
        .iter()
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join(",");

    let mut row = format!(
        "{}\t{}\t{}\t{}\t{}",
        record.gene_id, record.term, record.vote_count, record.passed_majority, models
    );

    if let Some(universe) = universe {
        row.push('\t');
        row.push_str(universe.locus(&record.gene_id).unwrap_or(MISSING));
    }

    row
}

/// every emitted record; a locus column is appended when FASTA mapping exists
pub fn write_consensus<'a, I>(
    records: I,
    path: &Path,
    universe: Option<&GeneUniverse>,
) -> std::io::Result<usize>
where
    I: IntoParallelIterator<Item = &'a ConsensusRecord>,
{
    let universe = universe.filter(|u| !u.protein_to_gene.is_empty());
    let header = match universe {
        Some(_) => format!("{}\tlocus", CONSENSUS_HEADER),
        None => CONSENSUS_HEADER.to_string(),
    };

    let rows = records
        .into_par_iter()
        .map(|record| consensus_row(record, universe))
        .collect::<Vec<_>>();

    write_table(path, &header, rows)
}

/// <sample>_fantasia_<model>_filtered.tsv for every model
pub fn write_filtered(
    outcome: &ConsensusOutcome,
    outdir: &Path,
    sample: &str,
) -> std::io::Result<Vec<PathBuf>> {
    outcome
        .filtered
        .par_iter()
        .map(|model| {
            let name = format!("{}_{}_{}", SourceTool::Fantasia, model.model, FILTERED);
            let path = out_path(outdir, sample, &name);

            write_table(
                &path,
                FILTERED_HEADER,
                model
                    .rows
                    .iter()
                    .map(|(gene, term, score)| format!("{}\t{}\t{}", gene, term, score)),
            )?;

            Ok(path)
        })
        .collect()
}

/// thresholds, consensus, majority-only and per-model tables
pub fn write_outputs(
    table: &ThresholdTable,
    outcome: &ConsensusOutcome,
    universe: Option<&GeneUniverse>,
    outdir: &Path,
    sample: &str,
) -> std::io::Result<()> {
    write_thresholds(table, &out_path(outdir, sample, THRESHOLDS))?;
    write_consensus(
        &outcome.records,
        &out_path(outdir, sample, CONSENSUS),
        universe,
    )?;

    let passing = outcome.passing().collect::<Vec<_>>();
    write_consensus(
        passing,
        &out_path(outdir, sample, CONSENSUS_MAJORITY),
        universe,
    )?;

    write_filtered(outcome, outdir, sample)?;
    Ok(())
}

/// how many pairs received k votes, k = 1..N
pub fn log_distribution(outcome: &ConsensusOutcome) {
    let total = outcome.records.len();
    info!(
        "Consensus pairs: {} ({} pass with >= {} votes)",
        total,
        outcome.passing().count(),
        outcome.min_votes
    );

    for (k, count) in outcome.distribution.iter().enumerate() {
        let pct = if total > 0 {
            *count as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        info!("  {} vote(s): {} ({:.2}%)", k + 1, count, pct);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn record(gene: &str, votes: usize, passed: bool) -> ConsensusRecord {
        ConsensusRecord {
            gene_id: gene.to_string(),
            term: "GO:0001".to_string(),
            vote_count: votes,
            contributing_models: ["ESM-2", "ProtT5", "ESM3c"]
                .iter()
                .take(votes)
                .map(|m| m.to_string())
                .collect::<BTreeSet<_>>(),
            passed_majority: passed,
        }
    }

    #[test]
    fn test_consensus_row_with_locus() {
        let mut universe = GeneUniverse::default();
        universe.ids.insert("p1".to_string());
        universe
            .protein_to_gene
            .insert("p1".to_string(), "LOC1".to_string());

        assert_eq!(
            consensus_row(&record("p1", 3, true), Some(&universe)),
            "p1\tGO:0001\t3\ttrue\tESM-2,ESM3c,ProtT5\tLOC1"
        );
        assert_eq!(
            consensus_row(&record("p2", 1, false), Some(&universe)),
            "p2\tGO:0001\t1\tfalse\tESM-2\t-"
        );
    }

    #[test]
    fn test_write_consensus_and_majority() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = ConsensusOutcome {
            records: vec![record("p1", 3, true), record("p2", 1, false)],
            filtered: vec![],
            distribution: vec![1, 0, 1],
            min_votes: 2,
        };

        write_outputs(
            &ThresholdTable::default(),
            &outcome,
            None,
            dir.path(),
            "s1",
        )
        .unwrap();

        let all = std::fs::read_to_string(dir.path().join("s1_consensus.tsv")).unwrap();
        let majority =
            std::fs::read_to_string(dir.path().join("s1_consensus_majority.tsv")).unwrap();

        assert_eq!(all.lines().count(), 3);
        assert_eq!(majority.lines().count(), 2);
        assert!(majority.lines().nth(1).unwrap().starts_with("p1\t"));
        assert!(dir.path().join("s1_thresholds.tsv").exists());
    }
}
