use anno_consensus::cli::EnsembleArgs;
use anno_pack::cli::{InputArgs, OutputArgs};
use clap::Parser;
use config::{ArgCheck, CliError, SourceTool, DEFAULT_FOCUS, DEFAULT_GROUP};

use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "anno-overlap")]
#[command(about = "Coverage and set overlaps of annotated genes across tools")]
pub struct Args {
    #[command(flatten)]
    pub inputs: InputArgs,

    #[command(flatten)]
    pub ensemble: EnsembleArgs,

    #[command(flatten)]
    pub output: OutputArgs,

    #[arg(
        short = 'F',
        long = "fasta",
        value_name = "PATH",
        help = "Protein FASTA whose sequences are the coverage denominator"
    )]
    pub fasta: Option<PathBuf>,

    #[arg(
        short = 'g',
        long = "group",
        value_name = "TOOLS",
        value_delimiter = ',',
        num_args = 1..,
        default_values_t = DEFAULT_GROUP.map(String::from),
        help = "Comparison group for tool-unique genes, delimited by comma"
    )]
    pub group: Vec<String>,

    #[arg(
        long = "focus",
        value_name = "TOOL",
        default_value = DEFAULT_FOCUS,
        help = "Tool whose genes absent from the whole group are reported"
    )]
    pub focus: String,

    #[arg(
        short = 't',
        long = "threads",
        help = "Number of threads",
        value_name = "THREADS",
        default_value_t = num_cpus::get()
    )]
    pub threads: usize,
}

impl ArgCheck for Args {
    fn check(&self) -> Result<(), CliError> {
        self.validate_args()?;
        self.group_sets()?;
        self.focus_set()?;
        Ok(())
    }

    fn num_inputs(&self) -> usize {
        self.inputs.num_inputs()
    }

    fn get_results_dir(&self) -> Option<&PathBuf> {
        self.inputs.results_dir.as_ref()
    }

    fn get_fasta(&self) -> Option<&PathBuf> {
        self.fasta.as_ref()
    }

    fn get_models(&self) -> Option<&PathBuf> {
        self.ensemble.models.as_ref()
    }

    fn get_percentile(&self) -> f64 {
        self.ensemble.percentile
    }
}

impl Args {
    pub fn from(args: Vec<String>) -> Self {
        let mut full_args = vec![env!("CARGO_PKG_NAME").to_string()];
        full_args.extend(args);

        Args::parse_from(full_args)
    }

    /// --group as overlap set names; tool aliases are accepted and both
    /// EggNOG generations name the same set
    pub fn group_sets(&self) -> Result<Vec<String>, CliError> {
        let mut sets: Vec<String> = Vec::with_capacity(self.group.len());
        for name in self.group.iter() {
            let set = name.parse::<SourceTool>()?.set_name();
            if !sets.iter().any(|s| s == set) {
                sets.push(set.to_string());
            }
        }

        Ok(sets)
    }

    pub fn focus_set(&self) -> Result<String, CliError> {
        Ok(self.focus.parse::<SourceTool>()?.set_name().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_group_and_focus() {
        let args = Args::from(vec!["--kofamscan".to_string(), "k.tsv".to_string()]);

        assert_eq!(args.group, vec!["kofamscan", "interproscan", "eggnog"]);
        assert_eq!(args.focus, "fantasia");
    }

    #[test]
    fn test_custom_group() {
        let args = Args::from(vec![
            "--kofamscan".to_string(),
            "k.tsv".to_string(),
            "--group".to_string(),
            "kofamscan,fantasia".to_string(),
            "--focus".to_string(),
            "eggnog".to_string(),
        ]);

        assert_eq!(args.group, vec!["kofamscan", "fantasia"]);
        assert_eq!(args.focus, "eggnog");
    }

    #[test]
    fn test_group_aliases_resolve_to_sets() {
        let args = Args::from(vec![
            "--kofamscan".to_string(),
            "k.tsv".to_string(),
            "--group".to_string(),
            "kofam,eggnog7,eggnog".to_string(),
            "--focus".to_string(),
            "FANTASIA".to_string(),
        ]);

        assert_eq!(args.group_sets().unwrap(), vec!["kofamscan", "eggnog"]);
        assert_eq!(args.focus_set().unwrap(), "fantasia");
    }

    #[test]
    fn test_unknown_group_tool_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let kofam = dir.path().join("k.tsv");
        std::fs::write(&kofam, "g1\tK00001\n").unwrap();

        let args = Args::from(vec![
            "--kofamscan".to_string(),
            kofam.display().to_string(),
            "--group".to_string(),
            "kofamscan,blast".to_string(),
        ]);

        let err = args.check().unwrap_err();
        assert!(matches!(err, CliError::InvalidInput(_)));
        assert!(err.to_string().contains("blast"));
    }
}
