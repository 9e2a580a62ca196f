use flate2::read::MultiGzDecoder;
use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

// os
#[cfg(not(windows))]
const TICK_SETTINGS: (&str, u64) = ("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ", 80);
#[cfg(windows)]
const TICK_SETTINGS: (&str, u64) = (r"+-x| ", 200);

/// return a pre-configured progress bar
pub fn get_progress_bar(length: u64, msg: &str) -> ProgressBar {
    let progress_bar = ProgressBar::new(length);

    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_chars(TICK_SETTINGS.0)
        .template(" {spinner} {msg:<30} {wide_bar} ETA {eta_precise} ")
    {
        progress_bar.set_style(style);
    }

    progress_bar.enable_steady_tick(Duration::from_millis(TICK_SETTINGS.1));
    progress_bar.set_message(msg.to_owned());

    progress_bar
}

/// open a plain or gzip-compressed table as a line reader
///
/// # Example
///
/// ```rust, no_run
/// use std::io::BufRead;
///
/// let reader = config::open_table("sample.eggnog.tsv.gz").unwrap();
/// for line in reader.lines() {
///     println!("{}", line.unwrap());
/// }
/// ```
pub fn open_table<P: AsRef<Path>>(path: P) -> std::io::Result<Box<dyn BufRead + Send>> {
    let file = File::open(path.as_ref())?;

    if is_gzipped(path.as_ref()) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

pub fn is_gzipped<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .file_name()
        .and_then(|f| f.to_str())
        .map(|f| f.ends_with(".gz"))
        .unwrap_or(false)
}

/// join output dir, sample prefix and file name
pub fn out_path(outdir: &Path, sample: &str, name: &str) -> PathBuf {
    outdir.join(format!("{}_{}", sample, name))
}

/// write a header plus rows of pre-formatted lines to a file
pub fn write_table<I, S>(path: &Path, header: &str, rows: I) -> std::io::Result<usize>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "{}", header)?;

    let mut count = 0;
    for row in rows {
        writeln!(writer, "{}", row.as_ref())?;
        count += 1;
    }
    writer.flush()?;

    log::info!("Rows in {}: {}", path.display(), count);
    Ok(count)
}

/// argument checker for all subcommands
pub trait ArgCheck {
    fn check(&self) -> Result<(), CliError> {
        self.validate_args()
    }

    fn validate_args(&self) -> Result<(), CliError> {
        self.check_inputs()?;

        match self.get_fasta() {
            Some(fasta) => validate(fasta)?,
            None => log::warn!(
                "No FASTA provided. Coverage will be relative to the annotated genes..."
            ),
        }

        if let Some(models) = self.get_models() {
            validate(models)?;
        }

        let percentile = self.get_percentile();
        if !(0.0..=1.0).contains(&percentile) {
            return Err(CliError::InvalidInput(format!(
                "percentile must be within [0, 1], got {}",
                percentile
            )));
        }

        Ok(())
    }

    fn check_inputs(&self) -> Result<(), CliError> {
        let dir = self.get_results_dir();

        if self.num_inputs() == 0 && dir.is_none() {
            let err = "No annotation tables or results directory provided".to_string();
            return Err(CliError::InvalidInput(err));
        }

        if let Some(dir) = dir {
            if !dir.is_dir() {
                return Err(CliError::InvalidInput(format!(
                    "{:?} is not a directory",
                    dir
                )));
            }
        }

        Ok(())
    }

    fn num_inputs(&self) -> usize;
    fn get_results_dir(&self) -> Option<&PathBuf>;
    fn get_fasta(&self) -> Option<&PathBuf>;
    fn get_models(&self) -> Option<&PathBuf>;
    fn get_percentile(&self) -> f64;
}

/// error handling for CLI
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// argument validation
pub fn validate(arg: &PathBuf) -> Result<(), CliError> {
    if !arg.exists() {
        return Err(CliError::InvalidInput(format!("{:?} does not exist", arg)));
    }

    if !arg.is_file() {
        return Err(CliError::InvalidInput(format!("{:?} is not a file", arg)));
    }

    match std::fs::metadata(arg) {
        Ok(metadata) if metadata.len() == 0 => {
            Err(CliError::InvalidInput(format!("file {:?} is empty", arg)))
        }
        Ok(_) => Ok(()),
        Err(e) => Err(CliError::IoError(e)),
    }
}
