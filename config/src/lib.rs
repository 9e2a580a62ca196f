pub mod error;
pub mod fns;
pub mod mods;

pub use error::*;
pub use fns::*;
pub use mods::*;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// numeric values
pub const MIN_THREADS: usize = 1;
pub const DEFAULT_PERCENTILE: f64 = 0.25; // first quartile
pub const MAX_WARNINGS_PER_TOOL: usize = 5;
pub const MAX_EXAMPLE_GENES: usize = 10;
pub const MIN_INTERPRO_FIELDS: usize = 11;
pub const MIN_EGGNOG7_FIELDS: usize = 15;
pub const MIN_KOFAM_DETAIL_FIELDS: usize = 6;

// column positions
pub const INTERPRO_GENE: usize = 0;
pub const INTERPRO_SCORE: usize = 8;
pub const INTERPRO_ACCESSION: usize = 11;
pub const INTERPRO_GO: usize = 13;
pub const INTERPRO_PATHWAYS: usize = 14;
pub const EGGNOG7_GENE: usize = 0;
pub const EGGNOG7_KEGG: usize = 12;
pub const EGGNOG7_GO: usize = 14;

// tokens
pub const COMMENT: &str = "#";
pub const EGGNOG_COMMENT: &str = "##";
pub const EGGNOG_HEADER: &str = "#query";
pub const KEGG_PREFIX: &str = "ko:";
pub const MISSING: &str = "-";
pub const SCORE_PREFIX: &str = "final_score_";
pub const SIGNIFICANT: &str = "*";
pub const FANTASIA_GENE: &str = "accession";
pub const FANTASIA_TERM: &str = "go_id";
pub const NA: &str = "NA";

// file names [prefixed by sample name]
pub const PER_TERM: &str = "per_term.tsv";
pub const PER_GENE: &str = "per_gene.tsv";
pub const THRESHOLDS: &str = "thresholds.tsv";
pub const CONSENSUS: &str = "consensus.tsv";
pub const CONSENSUS_MAJORITY: &str = "consensus_majority.tsv";
pub const FILTERED: &str = "filtered.tsv";
pub const COVERAGE: &str = "coverage.tsv";
pub const OVERLAP_JSON: &str = "overlap_summary.json";
pub const OVERLAP_TXT: &str = "overlap_summary.txt";
pub const RUN_REPORT: &str = "run_report.tsv";

// comparison defaults
pub const DEFAULT_GROUP: [&str; 3] = ["kofamscan", "interproscan", "eggnog"];
pub const DEFAULT_FOCUS: &str = "fantasia";
