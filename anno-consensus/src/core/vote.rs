use anno_pack::{NormalizedBatch, SourceKey};
use config::{Ensemble, SourceTool};
use dashmap::DashMap;
use hashbrown::HashSet;
use log::info;
use rayon::prelude::*;
use serde::Serialize;

use std::collections::BTreeSet;

use super::threshold::ThresholdTable;

/// agreement of the ensemble on one (gene, term) pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsensusRecord {
    pub gene_id: String,
    pub term: String,
    pub vote_count: usize,
    pub contributing_models: BTreeSet<String>,
    pub passed_majority: bool,
}

/// rows of one model that survive its threshold
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredModel {
    pub model: String,
    pub before: usize,
    pub rows: Vec<(String, String, f64)>,
}

impl FilteredModel {
    pub fn genes(&self) -> HashSet<String> {
        self.rows.iter().map(|(gene, _, _)| gene.clone()).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConsensusOutcome {
    /// sorted by gene, then term
    pub records: Vec<ConsensusRecord>,
    /// in ensemble order
    pub filtered: Vec<FilteredModel>,
    /// distribution[k - 1] = pairs with k votes
    pub distribution: Vec<usize>,
    pub min_votes: usize,
}

impl ConsensusOutcome {
    pub fn passing(&self) -> impl Iterator<Item = &ConsensusRecord> {
        self.records.iter().filter(|r| r.passed_majority)
    }

    pub fn passing_genes(&self) -> HashSet<String> {
        self.passing().map(|r| r.gene_id.clone()).collect()
    }

    /// genes kept by at least one model after filtering
    pub fn ensemble_genes(&self) -> HashSet<String> {
        self.filtered.iter().flat_map(|m| m.genes()).collect()
    }
}

pub struct ConsensusEngine<'a> {
    ensemble: &'a Ensemble,
    thresholds: &'a ThresholdTable,
    min_votes: usize,
}

impl<'a> ConsensusEngine<'a> {
    /// majority cut defaults to ceil(N/2)
    pub fn new(ensemble: &'a Ensemble, thresholds: &'a ThresholdTable) -> Self {
        Self {
            ensemble,
            thresholds,
            min_votes: ensemble.majority(),
        }
    }

    pub fn with_min_votes(mut self, min_votes: usize) -> Self {
        self.min_votes = min_votes;
        self
    }

    pub fn min_votes(&self) -> usize {
        self.min_votes
    }

    /// filter each model by its threshold and tally surviving pairs
    pub fn run(&self, batch: &NormalizedBatch) -> ConsensusOutcome {
        let tally: DashMap<(String, String), BTreeSet<String>> = DashMap::new();

        let filtered = self
            .ensemble
            .models
            .par_iter()
            .map(|model| {
                let name = model.display_name.as_str();
                let threshold = self.thresholds.get(name);
                let key = SourceKey::model(SourceTool::Fantasia, name);

                let mut kept = FilteredModel {
                    model: name.to_string(),
                    ..Default::default()
                };

                if let Some(pairs) = batch.scores.pairs(&key) {
                    kept.before = pairs.len();

                    for ((gene, (term, _)), score) in pairs.iter() {
                        if !threshold.admits(*score) {
                            continue;
                        }

                        tally
                            .entry((gene.clone(), term.clone()))
                            .or_default()
                            .insert(name.to_string());
                        kept.rows.push((gene.clone(), term.clone(), *score));
                    }
                }

                kept.rows.sort_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));
                info!(
                    "{}: {} of {} annotations pass the threshold",
                    name,
                    kept.rows.len(),
                    kept.before
                );

                kept
            })
            .collect::<Vec<_>>();

        let mut records = tally
            .into_iter()
            .map(|((gene_id, term), models)| ConsensusRecord {
                gene_id,
                term,
                vote_count: models.len(),
                passed_majority: models.len() >= self.min_votes,
                contributing_models: models,
            })
            .collect::<Vec<_>>();
        records.par_sort_unstable_by(|a, b| (&a.gene_id, &a.term).cmp(&(&b.gene_id, &b.term)));

        let mut distribution = vec![0; self.ensemble.size()];
        for record in records.iter() {
            distribution[record.vote_count - 1] += 1;
        }

        ConsensusOutcome {
            records,
            filtered,
            distribution,
            min_votes: self.min_votes,
        }
    }
}
