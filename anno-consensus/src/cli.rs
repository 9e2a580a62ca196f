use anno_pack::cli::{InputArgs, OutputArgs};
use clap::{Args as ClapArgs, Parser};
use config::{ArgCheck, CliError, Ensemble, DEFAULT_PERCENTILE};

use std::path::PathBuf;

/// ensemble configuration shared with the overlap and umbrella commands
#[derive(Debug, Clone, ClapArgs)]
pub struct EnsembleArgs {
    #[arg(
        short = 'm',
        long = "models",
        value_name = "PATH",
        help = "JSON list of {display_name, column_suffix} pairs [default: 5 reference models]"
    )]
    pub models: Option<PathBuf>,

    #[arg(
        short = 'q',
        long = "percentile",
        value_name = "FRACTION",
        default_value_t = DEFAULT_PERCENTILE,
        help = "Percentile of positive scores used as model threshold"
    )]
    pub percentile: f64,

    #[arg(
        long = "min-votes",
        value_name = "N",
        help = "Votes needed to pass consensus [default: ceil(N/2)]"
    )]
    pub min_votes: Option<usize>,
}

impl Default for EnsembleArgs {
    fn default() -> Self {
        Self {
            models: None,
            percentile: DEFAULT_PERCENTILE,
            min_votes: None,
        }
    }
}

impl EnsembleArgs {
    pub fn ensemble(&self) -> Result<Ensemble, CliError> {
        match &self.models {
            Some(path) => Ensemble::from_json(path),
            None => Ok(Ensemble::default()),
        }
    }

    /// explicit cut bounded by the ensemble size, or the majority
    pub fn min_votes(&self, ensemble: &Ensemble) -> Result<usize, CliError> {
        match self.min_votes {
            None => Ok(ensemble.majority()),
            Some(n) if n >= 1 && n <= ensemble.size() => Ok(n),
            Some(n) => Err(CliError::InvalidInput(format!(
                "--min-votes must be within [1, {}], got {}",
                ensemble.size(),
                n
            ))),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "anno-consensus")]
#[command(about = "Per-model thresholds and majority-vote consensus of ensemble GO predictions")]
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
        help = "Protein FASTA used to add a locus column"
    )]
    pub fasta: Option<PathBuf>,

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
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::ModelSpec;

    #[test]
    fn test_args_from_vec() {
        let args = Args::from(vec![
            "--fantasia".to_string(),
            "a.tsv,b.tsv.gz".to_string(),
            "--percentile".to_string(),
            "0.5".to_string(),
            "--sample".to_string(),
            "s1".to_string(),
        ]);

        assert_eq!(args.inputs.fantasia.len(), 2);
        assert_eq!(args.ensemble.percentile, 0.5);
        assert_eq!(args.output.sample, "s1");
        assert!(args.ensemble.min_votes.is_none());
    }

    #[test]
    fn test_min_votes_bounds() {
        let ensemble = Ensemble::new(vec![
            ModelSpec::new("a", "A"),
            ModelSpec::new("b", "B"),
            ModelSpec::new("c", "C"),
        ])
        .unwrap();

        let mut args = EnsembleArgs::default();
        assert_eq!(args.min_votes(&ensemble).unwrap(), 2);

        args.min_votes = Some(3);
        assert_eq!(args.min_votes(&ensemble).unwrap(), 3);

        args.min_votes = Some(4);
        assert!(args.min_votes(&ensemble).is_err());

        args.min_votes = Some(0);
        assert!(args.min_votes(&ensemble).is_err());
    }
}
