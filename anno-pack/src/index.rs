use config::SourceTool;
use hashbrown::{HashMap, HashSet};

use std::collections::BTreeSet;
use std::fmt;

use crate::record::{AnnotationFact, Term, TermKind};

/// a tool, or one model of an ensemble tool
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceKey {
    pub tool: SourceTool,
    pub model: Option<String>,
}

impl SourceKey {
    pub fn tool(tool: SourceTool) -> Self {
        Self { tool, model: None }
    }

    pub fn model(tool: SourceTool, model: &str) -> Self {
        Self {
            tool,
            model: Some(model.to_string()),
        }
    }

    pub fn of(fact: &AnnotationFact) -> Self {
        Self {
            tool: fact.tool(),
            model: fact.model().map(|m| m.to_string()),
        }
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.model {
            Some(model) => write!(f, "{}:{}", self.tool, model),
            None => write!(f, "{}", self.tool),
        }
    }
}

pub type TermSet = HashSet<Term>;
pub type Pair = (String, Term);

/// gene -> source -> deduplicated (term, kind) set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneAnnotationIndex {
    genes: HashMap<String, HashMap<SourceKey, TermSet>>,
}

impl GeneAnnotationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// index a fact; model facts only count as annotations with a positive score
    pub fn insert(&mut self, fact: &AnnotationFact) -> bool {
        if fact.model().is_some() && fact.score().map_or(true, |s| s <= 0.0) {
            return false;
        }

        self.genes
            .entry(fact.gene_id().to_string())
            .or_default()
            .entry(SourceKey::of(fact))
            .or_default()
            .insert((fact.term().to_string(), fact.kind()))
    }

    /// set union per (gene, source); order of merges is irrelevant
    pub fn merge(&mut self, other: GeneAnnotationIndex) {
        for (gene, sources) in other.genes {
            let entry = self.genes.entry(gene).or_default();
            for (source, terms) in sources {
                entry.entry(source).or_default().extend(terms);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn genes(&self) -> impl Iterator<Item = &str> {
        self.genes.keys().map(|g| g.as_str())
    }

    pub fn terms(&self, gene: &str, source: &SourceKey) -> Option<&TermSet> {
        self.genes.get(gene).and_then(|sources| sources.get(source))
    }

    /// every source present in the index, ordered
    pub fn sources(&self) -> BTreeSet<SourceKey> {
        self.genes
            .values()
            .flat_map(|sources| sources.keys().cloned())
            .collect()
    }

    /// genes carrying at least one term of `kinds` from any source of `tool`
    pub fn genes_for(&self, tool: SourceTool, kinds: &[TermKind]) -> HashSet<String> {
        self.genes
            .iter()
            .filter(|(_, sources)| {
                sources
                    .iter()
                    .filter(|(key, _)| key.tool == tool)
                    .any(|(_, terms)| has_kind(terms, kinds))
            })
            .map(|(gene, _)| gene.clone())
            .collect()
    }

    /// genes carrying at least one term of `kinds` from exactly this source
    pub fn genes_for_source(&self, source: &SourceKey, kinds: &[TermKind]) -> HashSet<String> {
        self.genes
            .iter()
            .filter(|(_, sources)| {
                sources
                    .get(source)
                    .map_or(false, |terms| has_kind(terms, kinds))
            })
            .map(|(gene, _)| gene.clone())
            .collect()
    }

    /// (gene, term) pairs of one source
    pub fn pairs<'a>(&'a self, source: &'a SourceKey) -> impl Iterator<Item = (&'a str, &'a Term)> {
        self.genes.iter().flat_map(move |(gene, sources)| {
            sources
                .get(source)
                .into_iter()
                .flat_map(move |terms| terms.iter().map(move |t| (gene.as_str(), t)))
        })
    }
}

#[inline(always)]
fn has_kind(terms: &TermSet, kinds: &[TermKind]) -> bool {
    terms.iter().any(|(_, kind)| kinds.contains(kind))
}

/// per-source scores of each (gene, term) pair
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreTable {
    scores: HashMap<SourceKey, HashMap<Pair, f64>>,
}

impl ScoreTable {
    pub fn insert(&mut self, fact: &AnnotationFact) {
        let Some(score) = fact.score() else {
            return;
        };
        if fact.model().is_some() && score <= 0.0 {
            return;
        }

        let key = SourceKey::of(fact);
        let pair = (
            fact.gene_id().to_string(),
            (fact.term().to_string(), fact.kind()),
        );
        let table = self.scores.entry(key).or_default();

        match table.get_mut(&pair) {
            Some(current) => *current = best(fact.tool(), *current, score),
            None => {
                table.insert(pair, score);
            }
        }
    }

    pub fn merge(&mut self, other: ScoreTable) {
        for (key, pairs) in other.scores {
            let tool = key.tool;
            let table = self.scores.entry(key).or_default();

            for (pair, score) in pairs {
                table
                    .entry(pair)
                    .and_modify(|current| *current = best(tool, *current, score))
                    .or_insert(score);
            }
        }
    }

    pub fn get(&self, source: &SourceKey, gene: &str, term: &Term) -> Option<f64> {
        self.scores
            .get(source)
            .and_then(|pairs| pairs.get(&(gene.to_string(), term.clone())))
            .copied()
    }

    pub fn pairs(&self, source: &SourceKey) -> Option<&HashMap<Pair, f64>> {
        self.scores.get(source)
    }

    /// every score of a source, unordered
    pub fn values(&self, source: &SourceKey) -> Vec<f64> {
        self.scores
            .get(source)
            .map(|pairs| pairs.values().copied().collect())
            .unwrap_or_default()
    }
}

/// duplicates keep the most confident score; e-values are better when lower
#[inline(always)]
fn best(tool: SourceTool, a: f64, b: f64) -> f64 {
    match tool {
        SourceTool::InterProScan => a.min(b),
        _ => a.max(b),
    }
}

/// index plus scores, the unit merged across parsers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedBatch {
    pub index: GeneAnnotationIndex,
    pub scores: ScoreTable,
}

impl NormalizedBatch {
    pub fn insert(&mut self, fact: &AnnotationFact) {
        self.index.insert(fact);
        self.scores.insert(fact);
    }

    pub fn merge(mut self, other: NormalizedBatch) -> Self {
        self.index.merge(other.index);
        self.scores.merge(other.scores);
        self
    }
}

impl FromIterator<AnnotationFact> for NormalizedBatch {
    fn from_iter<I: IntoIterator<Item = AnnotationFact>>(iter: I) -> Self {
        let mut batch = NormalizedBatch::default();
        for fact in iter {
            batch.insert(&fact);
        }
        batch
    }
}

/// fold a fact stream into a batch
pub fn normalize<I: IntoIterator<Item = AnnotationFact>>(facts: I) -> NormalizedBatch {
    facts.into_iter().collect()
}
