use config::{SourceTool, KEGG_PREFIX, MISSING};
use serde::Serialize;
use thiserror::Error;

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum TermKind {
    Go,
    Kegg,
    Pathway,
    Domain,
}

impl TermKind {
    pub const ALL: [TermKind; 4] = [
        TermKind::Go,
        TermKind::Kegg,
        TermKind::Pathway,
        TermKind::Domain,
    ];
    pub const FUNCTIONAL: [TermKind; 3] = [TermKind::Go, TermKind::Kegg, TermKind::Pathway];

    pub fn as_str(&self) -> &'static str {
        match self {
            TermKind::Go => "GO",
            TermKind::Kegg => "KEGG",
            TermKind::Pathway => "PATHWAY",
            TermKind::Domain => "DOMAIN",
        }
    }

    /// domain accessions describe structure, not function
    pub fn is_functional(&self) -> bool {
        !matches!(self, TermKind::Domain)
    }
}

impl fmt::Display for TermKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// term kinds each source schema can emit, in column order
pub fn emitted_kinds(tool: SourceTool) -> &'static [TermKind] {
    match tool {
        SourceTool::KofamScan => &[TermKind::Kegg],
        SourceTool::InterProScan => &[TermKind::Go, TermKind::Pathway, TermKind::Domain],
        SourceTool::EggNog => &[TermKind::Go, TermKind::Kegg, TermKind::Pathway],
        SourceTool::EggNog7 => &[TermKind::Go, TermKind::Kegg],
        SourceTool::Fantasia => &[TermKind::Go],
    }
}

pub type Term = (String, TermKind);

#[derive(Debug, Error, PartialEq)]
pub enum RowError {
    #[error("empty gene identifier")]
    EmptyGene,
    #[error("empty term")]
    EmptyTerm,
    #[error("unparseable score: {0:?}")]
    Score(String),
    #[error("expected {expected} columns, found {found}")]
    Columns { expected: usize, found: usize },
}

/// a single (gene, term) observation emitted by a source tool
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationFact {
    gene_id: String,
    term: String,
    kind: TermKind,
    tool: SourceTool,
    model: Option<String>,
    score: Option<f64>,
}

impl AnnotationFact {
    pub fn new(
        gene_id: &str,
        term: &str,
        kind: TermKind,
        tool: SourceTool,
        model: Option<&str>,
        score: Option<f64>,
    ) -> Result<Self, RowError> {
        let gene_id = gene_id.trim();
        let term = term.trim();

        if gene_id.is_empty() {
            return Err(RowError::EmptyGene);
        }
        if term.is_empty() {
            return Err(RowError::EmptyTerm);
        }
        if let Some(score) = score {
            if !score.is_finite() || score < 0.0 {
                return Err(RowError::Score(score.to_string()));
            }
        }

        Ok(Self {
            gene_id: gene_id.to_string(),
            term: term.to_string(),
            kind,
            tool,
            model: model.map(|m| m.to_string()),
            score,
        })
    }

    pub fn gene_id(&self) -> &str {
        &self.gene_id
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn kind(&self) -> TermKind {
        self.kind
    }

    pub fn tool(&self) -> SourceTool {
        self.tool
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn score(&self) -> Option<f64> {
        self.score
    }
}

/// true for the empty-cell and dash sentinels
#[inline(always)]
pub fn is_missing(cell: &str) -> bool {
    let cell = cell.trim();
    cell.is_empty() || cell == MISSING
}

/// parse an optional non-negative score cell
pub fn parse_score(cell: &str) -> Result<Option<f64>, RowError> {
    if is_missing(cell) {
        return Ok(None);
    }

    match cell.trim().parse::<f64>() {
        Ok(score) if score.is_finite() && score >= 0.0 => Ok(Some(score)),
        _ => Err(RowError::Score(cell.trim().to_string())),
    }
}

/// split a multi-valued cell, dropping sentinels and blanks
pub fn split_terms<'a>(cell: &'a str, delims: &'a [char]) -> impl Iterator<Item = &'a str> + 'a {
    cell.split(move |c| delims.contains(&c))
        .map(str::trim)
        .filter(|v| !is_missing(v))
}

pub fn strip_kegg_prefix(term: &str) -> &str {
    term.strip_prefix(KEGG_PREFIX).unwrap_or(term)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fact_rejects_empty_fields() {
        assert_eq!(
            AnnotationFact::new("", "GO:1", TermKind::Go, SourceTool::Fantasia, None, None),
            Err(RowError::EmptyGene)
        );
        assert_eq!(
            AnnotationFact::new("g1", "  ", TermKind::Go, SourceTool::Fantasia, None, None),
            Err(RowError::EmptyTerm)
        );
        assert!(AnnotationFact::new(
            "g1",
            "GO:1",
            TermKind::Go,
            SourceTool::Fantasia,
            Some("ESM-2"),
            Some(f64::NAN)
        )
        .is_err());
    }

    #[test]
    fn test_parse_score() {
        assert_eq!(parse_score("0.5"), Ok(Some(0.5)));
        assert_eq!(parse_score("1.2E-30"), Ok(Some(1.2e-30)));
        assert_eq!(parse_score("-"), Ok(None));
        assert_eq!(parse_score(""), Ok(None));
        assert_eq!(parse_score("abc"), Err(RowError::Score("abc".into())));
        assert_eq!(parse_score("-0.3"), Err(RowError::Score("-0.3".into())));
        assert_eq!(parse_score("inf"), Err(RowError::Score("inf".into())));
    }

    #[test]
    fn test_split_terms() {
        let terms = split_terms("GO:1|GO:2, GO:3||-", &['|', ',']).collect::<Vec<_>>();
        assert_eq!(terms, vec!["GO:1", "GO:2", "GO:3"]);

        assert_eq!(split_terms("-", &[',']).count(), 0);
        assert_eq!(strip_kegg_prefix("ko:K00001"), "K00001");
        assert_eq!(strip_kegg_prefix("K00001"), "K00001");
    }
}
