use config::{
    open_table, AnnotationError, Ensemble, SourceTool, COMMENT, MAX_WARNINGS_PER_TOOL,
};
use log::warn;

use std::collections::VecDeque;
use std::io::{BufRead, Lines};
use std::path::{Path, PathBuf};

use crate::record::{AnnotationFact, RowError};
use crate::schemas::{EggNog7Parser, EggNogParser, FantasiaParser, InterProParser, KofamParser};

/// one implementation per source schema
pub trait TableParser: Send {
    fn tool(&self) -> SourceTool;

    /// lines starting with this prefix are never data
    fn comment_prefix(&self) -> &str {
        COMMENT
    }

    /// fixed count of leading rows dropped before anything else
    fn skip_rows(&self) -> usize {
        0
    }

    /// inspect the first significant row; Ok(true) if it was a header and
    /// has been consumed, Ok(false) if it is data
    fn schema(&mut self, first: &str) -> Result<bool, String>;

    /// push every fact of a row into `out`; on error nothing is kept
    fn parse_row(&self, line: &str, out: &mut Vec<AnnotationFact>) -> Result<(), RowError>;
}

#[derive(Debug, Clone, Default)]
pub struct ParserOptions {
    pub ensemble: Ensemble,
    pub skip_rows: usize,
}

/// parser selected by tool identity
pub enum ToolParser {
    KofamScan(KofamParser),
    InterProScan(InterProParser),
    EggNog(EggNogParser),
    EggNog7(EggNog7Parser),
    Fantasia(FantasiaParser),
}

impl ToolParser {
    pub fn for_tool(tool: SourceTool, options: &ParserOptions) -> Self {
        match tool {
            SourceTool::KofamScan => ToolParser::KofamScan(KofamParser::default()),
            SourceTool::InterProScan => ToolParser::InterProScan(InterProParser),
            SourceTool::EggNog => ToolParser::EggNog(EggNogParser::new(options.skip_rows)),
            SourceTool::EggNog7 => ToolParser::EggNog7(EggNog7Parser::default()),
            SourceTool::Fantasia => {
                ToolParser::Fantasia(FantasiaParser::new(options.ensemble.clone()))
            }
        }
    }

    fn inner(&self) -> &dyn TableParser {
        match self {
            ToolParser::KofamScan(p) => p,
            ToolParser::InterProScan(p) => p,
            ToolParser::EggNog(p) => p,
            ToolParser::EggNog7(p) => p,
            ToolParser::Fantasia(p) => p,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn TableParser {
        match self {
            ToolParser::KofamScan(p) => p,
            ToolParser::InterProScan(p) => p,
            ToolParser::EggNog(p) => p,
            ToolParser::EggNog7(p) => p,
            ToolParser::Fantasia(p) => p,
        }
    }
}

impl TableParser for ToolParser {
    fn tool(&self) -> SourceTool {
        self.inner().tool()
    }

    fn comment_prefix(&self) -> &str {
        self.inner().comment_prefix()
    }

    fn skip_rows(&self) -> usize {
        self.inner().skip_rows()
    }

    fn schema(&mut self, first: &str) -> Result<bool, String> {
        self.inner_mut().schema(first)
    }

    fn parse_row(&self, line: &str, out: &mut Vec<AnnotationFact>) -> Result<(), RowError> {
        self.inner().parse_row(line, out)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseStats {
    pub rows_read: usize,
    pub rows_parsed: usize,
    pub rows_skipped: usize,
    pub facts: usize,
}

/// lazy fact sequence over one table
pub struct FactStream<P: TableParser> {
    lines: Lines<Box<dyn BufRead + Send>>,
    parser: P,
    path: PathBuf,
    buffered: Option<(usize, String)>,
    pending: VecDeque<AnnotationFact>,
    line_no: usize,
    stats: ParseStats,
    failure: Option<AnnotationError>,
}

impl<P: TableParser> FactStream<P> {
    /// open a table and validate its schema; rows are read on demand
    pub fn open(path: &Path, mut parser: P) -> Result<Self, AnnotationError> {
        if !path.is_file() {
            return Err(AnnotationError::MissingRequiredFile {
                tool: parser.tool(),
                path: path.to_path_buf(),
            });
        }

        let mut lines = open_table(path)?.lines();
        let mut line_no = 0;

        for _ in 0..parser.skip_rows() {
            match lines.next() {
                Some(line) => {
                    line?;
                    line_no += 1;
                }
                None => break,
            }
        }

        let mut buffered = None;
        for line in lines.by_ref() {
            let line = line?;
            line_no += 1;

            if is_blank_or_comment(&line, parser.comment_prefix()) {
                continue;
            }

            let consumed =
                parser
                    .schema(&line)
                    .map_err(|reason| AnnotationError::SchemaMismatch {
                        tool: parser.tool(),
                        path: path.to_path_buf(),
                        reason,
                    })?;

            if !consumed {
                buffered = Some((line_no, line));
            }
            break;
        }

        Ok(Self {
            lines,
            parser,
            path: path.to_path_buf(),
            buffered,
            pending: VecDeque::new(),
            line_no,
            stats: ParseStats::default(),
            failure: None,
        })
    }

    pub fn stats(&self) -> &ParseStats {
        &self.stats
    }

    /// counters plus the I/O error that stopped the stream early, if any
    pub fn finish(self) -> (ParseStats, Option<AnnotationError>) {
        (self.stats, self.failure)
    }

    fn skip(&mut self, line: usize, err: RowError) {
        self.stats.rows_skipped += 1;

        let err = AnnotationError::RowParse {
            tool: self.parser.tool(),
            line,
            reason: err.to_string(),
        };

        if self.stats.rows_skipped <= MAX_WARNINGS_PER_TOOL {
            warn!("{} [{}]", err, self.path.display());
        } else if self.stats.rows_skipped == MAX_WARNINGS_PER_TOOL + 1 {
            warn!(
                "{}: further malformed rows in {} are only counted",
                self.parser.tool(),
                self.path.display()
            );
        }
    }
}

impl<P: TableParser> Iterator for FactStream<P> {
    type Item = AnnotationFact;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(fact) = self.pending.pop_front() {
                return Some(fact);
            }

            let (line_no, line) = match self.buffered.take() {
                Some(row) => row,
                None => match self.lines.next() {
                    None => return None,
                    Some(Ok(line)) => {
                        self.line_no += 1;
                        (self.line_no, line)
                    }
                    Some(Err(e)) => {
                        self.failure = Some(AnnotationError::Io(e));
                        return None;
                    }
                },
            };

            if is_blank_or_comment(&line, self.parser.comment_prefix()) {
                continue;
            }

            self.stats.rows_read += 1;
            let mut facts = Vec::new();

            match self.parser.parse_row(&line, &mut facts) {
                Ok(()) => {
                    self.stats.rows_parsed += 1;
                    self.stats.facts += facts.len();
                    self.pending.extend(facts);
                }
                Err(err) => self.skip(line_no, err),
            }
        }
    }
}

#[inline(always)]
fn is_blank_or_comment(line: &str, prefix: &str) -> bool {
    line.trim().is_empty() || line.starts_with(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::TermKind;
    use config::ErrorClass;
    use std::io::Write;

    fn table(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    #[test]
    fn test_stream_skips_malformed_rows() {
        let file = table(
            "# interproscan\n\
             p1\tmd5\t100\tPfam\tPF1\tdesc\t1\t90\t1.5E-20\tT\t01-01-2025\t\
             IPR000001\tKinase\tGO:0001|GO:0002\tKEGG: 00230\n\
             p2\tmd5\t100\tPfam\n\
             p3\tmd5\t100\tPfam\tPF1\tdesc\t1\t90\tbad\tT\t01-01-2025\n",
        );

        let parser = ToolParser::for_tool(SourceTool::InterProScan, &ParserOptions::default());
        let mut stream = FactStream::open(file.path(), parser).unwrap();
        let facts = stream.by_ref().collect::<Vec<_>>();
        let (stats, failure) = stream.finish();

        assert!(failure.is_none());
        assert_eq!(stats.rows_read, 3);
        assert_eq!(stats.rows_parsed, 1);
        assert_eq!(stats.rows_skipped, 2);
        assert_eq!(facts.len(), 4);
        assert!(facts.iter().all(|f| f.gene_id() == "p1"));
        assert_eq!(
            facts.iter().filter(|f| f.kind() == TermKind::Go).count(),
            2
        );
    }

    #[test]
    fn test_stream_schema_mismatch() {
        let file = table("accession\tterm\nP1\tGO:1\n");
        let parser = ToolParser::for_tool(SourceTool::Fantasia, &ParserOptions::default());

        let err = FactStream::open(file.path(), parser).err().unwrap();
        assert_eq!(err.class(), ErrorClass::SchemaMismatch);
    }

    #[test]
    fn test_stream_missing_file() {
        let parser = ToolParser::for_tool(SourceTool::KofamScan, &ParserOptions::default());
        let err = FactStream::open(Path::new("/definitely/not/here.tsv"), parser)
            .err()
            .unwrap();

        assert_eq!(err.class(), ErrorClass::MissingRequiredFile);
    }

    #[test]
    fn test_stream_reads_gzip_tables() {
        use flate2::{write::GzEncoder, Compression};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s1_fantasia.tsv.gz");
        let file = std::fs::File::create(&path).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        write!(
            encoder,
            "accession\tgo_id\tfinal_score_ESM_L0\tfinal_score_ESM3c_L0\n\
             P1\tGO:0001\t0.5\t0\n\
             P2\tGO:0002\t-\t0.7\n"
        )
        .unwrap();
        encoder.finish().unwrap();

        let parser = ToolParser::for_tool(SourceTool::Fantasia, &ParserOptions::default());
        let mut stream = FactStream::open(&path, parser).unwrap();
        let facts = stream.by_ref().collect::<Vec<_>>();

        assert_eq!(stream.stats().rows_parsed, 2);
        assert_eq!(facts.len(), 3);
        assert!(facts
            .iter()
            .any(|f| f.gene_id() == "P2" && f.model() == Some("ESM3c")));
    }

    #[test]
    fn test_stream_empty_file_yields_nothing() {
        let file = table("# only comments\n\n");
        let parser = ToolParser::for_tool(SourceTool::KofamScan, &ParserOptions::default());
        let mut stream = FactStream::open(file.path(), parser).unwrap();

        assert!(stream.next().is_none());
        assert_eq!(stream.stats().rows_read, 0);
    }
}
