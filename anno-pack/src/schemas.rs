//! Per-source table schemas.
//!
//! Each parser knows where its tool writes gene identifiers and terms, how
//! multi-valued cells are delimited, and which sentinel marks a missing value.
//! Row-level problems come back as [`RowError`] and are skipped by the caller;
//! a header that cannot be matched is reported from [`TableParser::schema`].

use config::{
    Ensemble, SourceTool, EGGNOG7_GENE, EGGNOG7_GO, EGGNOG7_KEGG, EGGNOG_COMMENT, EGGNOG_HEADER,
    FANTASIA_GENE, FANTASIA_TERM, INTERPRO_ACCESSION, INTERPRO_GENE, INTERPRO_GO,
    INTERPRO_PATHWAYS, INTERPRO_SCORE, MIN_EGGNOG7_FIELDS, MIN_INTERPRO_FIELDS,
    MIN_KOFAM_DETAIL_FIELDS, SIGNIFICANT,
};
use log::warn;

use crate::parser::TableParser;
use crate::record::{
    is_missing, parse_score, split_terms, strip_kegg_prefix, AnnotationFact, RowError, TermKind,
};

const LIST_DELIMS: [char; 2] = ['|', ','];
const EGGNOG_DELIMS: [char; 1] = [','];
const EGGNOG7_ITEM: char = ';';
const EGGNOG7_SCORE: char = '|';

#[inline(always)]
fn fields(line: &str) -> Vec<&str> {
    line.trim_end_matches(['\n', '\r']).split('\t').collect()
}

/// KofamScan mapper (`gene[\tKO]`) or detail (`*\tgene\tKO\tthr\tscore\t...`)
#[derive(Debug, Default)]
pub struct KofamParser;

impl TableParser for KofamParser {
    fn tool(&self) -> SourceTool {
        SourceTool::KofamScan
    }

    fn schema(&mut self, _: &str) -> Result<bool, String> {
        Ok(false)
    }

    fn parse_row(&self, line: &str, out: &mut Vec<AnnotationFact>) -> Result<(), RowError> {
        let fields = fields(line);
        let flag = fields[0].trim();

        if fields.len() >= MIN_KOFAM_DETAIL_FIELDS && (flag == SIGNIFICANT || flag.is_empty()) {
            if flag != SIGNIFICANT {
                return Ok(());
            }

            let score = parse_score(fields[4])?;
            out.push(AnnotationFact::new(
                fields[1],
                fields[2],
                TermKind::Kegg,
                SourceTool::KofamScan,
                None,
                score,
            )?);

            return Ok(());
        }

        match fields.len() {
            1 if !flag.is_empty() => Ok(()),
            2 => {
                if flag.is_empty() {
                    return Err(RowError::EmptyGene);
                }
                if !is_missing(fields[1]) {
                    out.push(AnnotationFact::new(
                        fields[0],
                        fields[1],
                        TermKind::Kegg,
                        SourceTool::KofamScan,
                        None,
                        None,
                    )?);
                }
                Ok(())
            }
            1 => Err(RowError::EmptyGene),
            found => Err(RowError::Columns { expected: 2, found }),
        }
    }
}

/// InterProScan headerless TSV
#[derive(Debug, Default)]
pub struct InterProParser;

impl TableParser for InterProParser {
    fn tool(&self) -> SourceTool {
        SourceTool::InterProScan
    }

    fn schema(&mut self, first: &str) -> Result<bool, String> {
        let found = fields(first).len();
        if found < MIN_INTERPRO_FIELDS {
            return Err(format!(
                "expected at least {} tab-separated columns, found {}",
                MIN_INTERPRO_FIELDS, found
            ));
        }

        Ok(false)
    }

    fn parse_row(&self, line: &str, out: &mut Vec<AnnotationFact>) -> Result<(), RowError> {
        let fields = fields(line);
        if fields.len() < MIN_INTERPRO_FIELDS {
            return Err(RowError::Columns {
                expected: MIN_INTERPRO_FIELDS,
                found: fields.len(),
            });
        }

        let gene = fields[INTERPRO_GENE];
        if is_missing(gene) {
            return Err(RowError::EmptyGene);
        }
        let score = parse_score(fields[INTERPRO_SCORE])?;

        let columns = [
            (INTERPRO_ACCESSION, TermKind::Domain),
            (INTERPRO_GO, TermKind::Go),
            (INTERPRO_PATHWAYS, TermKind::Pathway),
        ];

        for (idx, kind) in columns {
            let Some(cell) = fields.get(idx) else {
                continue;
            };

            for term in split_terms(cell, &LIST_DELIMS) {
                out.push(AnnotationFact::new(
                    gene,
                    term,
                    kind,
                    SourceTool::InterProScan,
                    None,
                    score,
                )?);
            }
        }

        Ok(())
    }
}

/// eggNOG-mapper v5 `.emapper.annotations`
#[derive(Debug)]
pub struct EggNogParser {
    skip_rows: usize,
    width: usize,
    gene: usize,
    columns: Vec<(usize, TermKind)>,
}

impl EggNogParser {
    pub fn new(skip_rows: usize) -> Self {
        Self {
            skip_rows,
            width: 0,
            gene: 0,
            columns: Vec::new(),
        }
    }
}

/// first header position matching any alias
fn find_column(header: &[&str], aliases: &[&str]) -> Option<usize> {
    header
        .iter()
        .position(|name| aliases.iter().any(|alias| name.trim() == *alias))
}

impl TableParser for EggNogParser {
    fn tool(&self) -> SourceTool {
        SourceTool::EggNog
    }

    fn comment_prefix(&self) -> &str {
        EGGNOG_COMMENT
    }

    fn skip_rows(&self) -> usize {
        self.skip_rows
    }

    fn schema(&mut self, first: &str) -> Result<bool, String> {
        if !first.starts_with(EGGNOG_HEADER) {
            return Err(format!("expected a header starting with {}", EGGNOG_HEADER));
        }

        let header = fields(first.trim_start_matches('#'));
        let aliases: [(&[&str], TermKind); 3] = [
            (&["GOs", "GO_terms"], TermKind::Go),
            (&["KEGG_ko", "KEGG_KO"], TermKind::Kegg),
            (&["KEGG_Pathway", "KEGG_pathway"], TermKind::Pathway),
        ];

        self.columns = aliases
            .iter()
            .filter_map(|(names, kind)| find_column(&header, names).map(|idx| (idx, *kind)))
            .collect();

        if self.columns.is_empty() {
            return Err("no GO, KEGG or pathway column in header".to_string());
        }

        self.gene = find_column(&header, &["query"]).unwrap_or(0);
        self.width = header.len();

        Ok(true)
    }

    fn parse_row(&self, line: &str, out: &mut Vec<AnnotationFact>) -> Result<(), RowError> {
        let fields = fields(line);
        if fields.len() < self.width {
            return Err(RowError::Columns {
                expected: self.width,
                found: fields.len(),
            });
        }

        let gene = fields[self.gene];
        if is_missing(gene) {
            return Err(RowError::EmptyGene);
        }

        for (idx, kind) in self.columns.iter() {
            for term in split_terms(fields[*idx], &EGGNOG_DELIMS) {
                let term = match kind {
                    TermKind::Kegg => strip_kegg_prefix(term),
                    _ => term,
                };

                out.push(AnnotationFact::new(
                    gene,
                    term,
                    *kind,
                    SourceTool::EggNog,
                    None,
                    None,
                )?);
            }
        }

        Ok(())
    }
}

/// eggNOG v7 gzip table with `term|score;term|score` cells
#[derive(Debug, Default)]
pub struct EggNog7Parser {
    header: Option<EggNog7Header>,
}

#[derive(Debug)]
struct EggNog7Header {
    width: usize,
    gene: usize,
    kegg: Option<usize>,
    go: Option<usize>,
}

impl TableParser for EggNog7Parser {
    fn tool(&self) -> SourceTool {
        SourceTool::EggNog7
    }

    fn comment_prefix(&self) -> &str {
        EGGNOG_COMMENT
    }

    fn schema(&mut self, first: &str) -> Result<bool, String> {
        if !first.starts_with(EGGNOG_HEADER) {
            return Ok(false);
        }

        let header = fields(first.trim_start_matches('#'));
        self.header = Some(EggNog7Header {
            width: header.len(),
            gene: find_column(&header, &["query"]).unwrap_or(EGGNOG7_GENE),
            kegg: find_column(&header, &["KEGG_ko", "KEGG_KO"]),
            go: find_column(&header, &["GOs", "GO"]),
        });

        Ok(true)
    }

    fn parse_row(&self, line: &str, out: &mut Vec<AnnotationFact>) -> Result<(), RowError> {
        let fields = fields(line);

        let (gene, kegg, go) = if fields.len() >= MIN_EGGNOG7_FIELDS {
            (
                fields[EGGNOG7_GENE],
                Some(fields[EGGNOG7_KEGG]),
                Some(fields[EGGNOG7_GO]),
            )
        } else {
            match &self.header {
                Some(h) if h.width == fields.len() => (
                    fields[h.gene],
                    h.kegg.map(|i| fields[i]),
                    h.go.map(|i| fields[i]),
                ),
                _ => {
                    return Err(RowError::Columns {
                        expected: MIN_EGGNOG7_FIELDS,
                        found: fields.len(),
                    })
                }
            }
        };

        if is_missing(gene) {
            return Err(RowError::EmptyGene);
        }

        let cells = [(kegg, TermKind::Kegg), (go, TermKind::Go)];
        for (cell, kind) in cells {
            let Some(cell) = cell else {
                continue;
            };

            for item in split_terms(cell, &[EGGNOG7_ITEM]) {
                let (term, score) = match item.split_once(EGGNOG7_SCORE) {
                    Some((term, score)) => (term.trim(), parse_score(score)?),
                    None => (item, None),
                };
                let term = match kind {
                    TermKind::Kegg => strip_kegg_prefix(term),
                    _ => term,
                };

                out.push(AnnotationFact::new(
                    gene,
                    term,
                    kind,
                    SourceTool::EggNog7,
                    None,
                    score,
                )?);
            }
        }

        Ok(())
    }
}

/// FANTASIA ensemble table: one GO term per row, one score column per model
#[derive(Debug)]
pub struct FantasiaParser {
    ensemble: Ensemble,
    gene: usize,
    term: usize,
    // (display name, column index) for every model found in the header
    models: Vec<(String, usize)>,
    width: usize,
}

impl FantasiaParser {
    pub fn new(ensemble: Ensemble) -> Self {
        Self {
            ensemble,
            gene: 0,
            term: 0,
            models: Vec::new(),
            width: 0,
        }
    }
}

impl TableParser for FantasiaParser {
    fn tool(&self) -> SourceTool {
        SourceTool::Fantasia
    }

    fn schema(&mut self, first: &str) -> Result<bool, String> {
        let header = fields(first);

        let gene = find_column(&header, &[FANTASIA_GENE]);
        let term = find_column(&header, &[FANTASIA_TERM]);
        let (Some(gene), Some(term)) = (gene, term) else {
            return Err(format!(
                "header must contain {} and {} columns",
                FANTASIA_GENE, FANTASIA_TERM
            ));
        };

        let mut models = Vec::with_capacity(self.ensemble.size());
        for model in self.ensemble.models.iter() {
            let column = model.score_column();
            match find_column(&header, &[column.as_str()]) {
                Some(idx) => models.push((model.display_name.clone(), idx)),
                None => warn!(
                    "fantasia: column {} for model {} not found, model will carry no scores",
                    column, model.display_name
                ),
            }
        }

        self.gene = gene;
        self.term = term;
        self.width = models
            .iter()
            .map(|(_, idx)| *idx)
            .chain([gene, term])
            .max()
            .map_or(0, |max| max + 1);
        self.models = models;

        Ok(true)
    }

    fn parse_row(&self, line: &str, out: &mut Vec<AnnotationFact>) -> Result<(), RowError> {
        let fields = fields(line);
        if fields.len() < self.width {
            return Err(RowError::Columns {
                expected: self.width,
                found: fields.len(),
            });
        }

        let gene = fields[self.gene];
        if is_missing(gene) {
            return Err(RowError::EmptyGene);
        }

        let term = fields[self.term];
        if is_missing(term) {
            return Ok(());
        }

        let mut facts = Vec::with_capacity(self.models.len());
        for (model, idx) in self.models.iter() {
            if let Some(score) = parse_score(fields[*idx])? {
                facts.push(AnnotationFact::new(
                    gene,
                    term,
                    TermKind::Go,
                    SourceTool::Fantasia,
                    Some(model.as_str()),
                    Some(score),
                )?);
            }
        }
        out.extend(facts);

        Ok(())
    }
}
