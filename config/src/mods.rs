use serde::{Deserialize, Serialize};

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;

use crate::{CliError, SCORE_PREFIX};

// source descriptors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTool {
    KofamScan,
    InterProScan,
    EggNog,
    EggNog7,
    Fantasia,
}

impl SourceTool {
    pub const ALL: [SourceTool; 5] = [
        SourceTool::KofamScan,
        SourceTool::InterProScan,
        SourceTool::EggNog,
        SourceTool::EggNog7,
        SourceTool::Fantasia,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTool::KofamScan => "kofamscan",
            SourceTool::InterProScan => "interproscan",
            SourceTool::EggNog => "eggnog",
            SourceTool::EggNog7 => "eggnog7",
            SourceTool::Fantasia => "fantasia",
        }
    }

    /// name of the gene set used for overlaps; both EggNOG generations
    /// collapse into the same orthology set
    pub fn set_name(&self) -> &'static str {
        match self {
            SourceTool::EggNog7 => SourceTool::EggNog.as_str(),
            _ => self.as_str(),
        }
    }

    /// glob patterns scanned under --results-dir
    pub fn layout(&self) -> &'static [&'static str] {
        match self {
            SourceTool::KofamScan => &["kofamscan/*_kofam_mapper.tsv", "kofamscan/*.kofam.tsv"],
            SourceTool::InterProScan => &["interproscan/*.tsv"],
            SourceTool::EggNog => &["eggnog/v5/**/*.emapper.annotations"],
            SourceTool::EggNog7 => &["eggnog7/*.eggnog.tsv.gz"],
            SourceTool::Fantasia => &["fantasia/*.tsv", "fantasia/*.tsv.gz"],
        }
    }

    pub fn is_ensemble(&self) -> bool {
        matches!(self, SourceTool::Fantasia)
    }
}

impl fmt::Display for SourceTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SourceTool {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "kofamscan" | "kofam" => Ok(SourceTool::KofamScan),
            "interproscan" | "interpro" => Ok(SourceTool::InterProScan),
            "eggnog" | "eggnog5" | "eggnog_v5" => Ok(SourceTool::EggNog),
            "eggnog7" | "eggnog_v7" => Ok(SourceTool::EggNog7),
            "fantasia" => Ok(SourceTool::Fantasia),
            _ => Err(CliError::InvalidInput(format!("unknown source tool: {}", s))),
        }
    }
}

/// one ensemble member: the name used in reports and the suffix of its
/// score column in the predictor table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub display_name: String,
    pub column_suffix: String,
}

impl ModelSpec {
    pub fn new(display_name: &str, column_suffix: &str) -> Self {
        Self {
            display_name: display_name.to_string(),
            column_suffix: column_suffix.to_string(),
        }
    }

    pub fn score_column(&self) -> String {
        format!("{}{}", SCORE_PREFIX, self.column_suffix)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ensemble {
    pub models: Vec<ModelSpec>,
}

impl Default for Ensemble {
    fn default() -> Self {
        Self {
            models: vec![
                ModelSpec::new("ESM-2", "ESM_L0"),
                ModelSpec::new("ProtT5", "Prot-T5_L0"),
                ModelSpec::new("ProstT5", "Prost-T5_L0"),
                ModelSpec::new("Ankh3-Large", "Ankh3-Large_L0"),
                ModelSpec::new("ESM3c", "ESM3c_L0"),
            ],
        }
    }
}

impl Ensemble {
    pub fn new(models: Vec<ModelSpec>) -> Result<Self, CliError> {
        if models.is_empty() {
            return Err(CliError::InvalidInput(
                "ensemble must contain at least one model".to_string(),
            ));
        }

        let mut names = models.iter().map(|m| &m.display_name).collect::<Vec<_>>();
        names.sort();
        names.dedup();
        if names.len() != models.len() {
            return Err(CliError::InvalidInput(
                "ensemble model names must be unique".to_string(),
            ));
        }

        Ok(Self { models })
    }

    /// read a JSON list of {display_name, column_suffix} pairs
    pub fn from_json<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let models: Vec<ModelSpec> = serde_json::from_reader(reader).map_err(|e| {
            CliError::InvalidInput(format!(
                "{:?} is not a valid model list: {}",
                path.as_ref(),
                e
            ))
        })?;

        Self::new(models)
    }

    pub fn size(&self) -> usize {
        self.models.len()
    }

    /// ceil(N/2)
    pub fn majority(&self) -> usize {
        (self.models.len() + 1) / 2
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(|m| m.display_name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_ensemble_majority() {
        let ensemble = Ensemble::default();

        assert_eq!(ensemble.size(), 5);
        assert_eq!(ensemble.majority(), 3);
        assert_eq!(ensemble.models[1].score_column(), "final_score_Prot-T5_L0");
    }

    #[test]
    fn test_majority_follows_ensemble_size() {
        let two = Ensemble::new(vec![ModelSpec::new("a", "A"), ModelSpec::new("b", "B")]).unwrap();
        assert_eq!(two.majority(), 1);

        let four = Ensemble::new(
            ["a", "b", "c", "d"]
                .iter()
                .map(|n| ModelSpec::new(n, n))
                .collect(),
        )
        .unwrap();
        assert_eq!(four.majority(), 2);
    }

    #[test]
    fn test_ensemble_rejects_duplicates_and_empty() {
        assert!(Ensemble::new(vec![]).is_err());
        assert!(Ensemble::new(vec![ModelSpec::new("a", "A"), ModelSpec::new("a", "B")]).is_err());
    }

    #[test]
    fn test_ensemble_from_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"display_name": "X", "column_suffix": "X_L0"}},
                {{"display_name": "Y", "column_suffix": "Y_L0"}},
                {{"display_name": "Z", "column_suffix": "Z_L0"}}
            ]"#
        )
        .unwrap();

        let ensemble = Ensemble::from_json(file.path()).unwrap();
        assert_eq!(ensemble.size(), 3);
        assert_eq!(ensemble.majority(), 2);
        assert_eq!(ensemble.names().collect::<Vec<_>>(), vec!["X", "Y", "Z"]);
    }

    #[test]
    fn test_source_tool_from_str() {
        assert_eq!("KofamScan".parse::<SourceTool>().unwrap(), SourceTool::KofamScan);
        assert_eq!("eggnog7".parse::<SourceTool>().unwrap(), SourceTool::EggNog7);
        assert_eq!(SourceTool::EggNog7.set_name(), "eggnog");
        assert!("blast".parse::<SourceTool>().is_err());
    }
}
