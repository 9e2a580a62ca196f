use clap::Args;
use config::SourceTool;
use glob::{glob, Pattern};
use log::{info, warn};

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// per-tool annotation tables, shared by every subcommand
#[derive(Debug, Clone, Default, Args)]
pub struct InputArgs {
    #[arg(
        short = 'k',
        long = "kofamscan",
        value_name = "PATHS",
        value_delimiter = ',',
        num_args = 1..,
        help = "Paths to KofamScan mapper/detail tables delimited by comma"
    )]
    pub kofamscan: Vec<PathBuf>,

    #[arg(
        short = 'i',
        long = "interproscan",
        value_name = "PATHS",
        value_delimiter = ',',
        num_args = 1..,
        help = "Paths to InterProScan TSV files delimited by comma"
    )]
    pub interproscan: Vec<PathBuf>,

    #[arg(
        short = 'e',
        long = "eggnog",
        value_name = "PATHS",
        value_delimiter = ',',
        num_args = 1..,
        help = "Paths to eggNOG-mapper v5 .emapper.annotations files delimited by comma"
    )]
    pub eggnog: Vec<PathBuf>,

    #[arg(
        long = "eggnog7",
        value_name = "PATHS",
        value_delimiter = ',',
        num_args = 1..,
        help = "Paths to eggNOG v7 .eggnog.tsv.gz files delimited by comma"
    )]
    pub eggnog7: Vec<PathBuf>,

    #[arg(
        short = 'f',
        long = "fantasia",
        value_name = "PATHS",
        value_delimiter = ',',
        num_args = 1..,
        help = "Paths to FANTASIA ensemble tables [.tsv/.tsv.gz] delimited by comma"
    )]
    pub fantasia: Vec<PathBuf>,

    #[arg(
        short = 'r',
        long = "results-dir",
        value_name = "DIR",
        help = "Results directory scanned for <tool>/ sub-directories"
    )]
    pub results_dir: Option<PathBuf>,

    #[arg(
        long = "skip-rows",
        value_name = "N",
        default_value_t = 0,
        help = "Leading rows skipped in eggNOG-mapper v5 tables"
    )]
    pub skip_rows: usize,
}

impl InputArgs {
    pub fn num_inputs(&self) -> usize {
        self.explicit().count()
    }

    fn explicit(&self) -> impl Iterator<Item = (SourceTool, &PathBuf)> {
        [
            (SourceTool::KofamScan, &self.kofamscan),
            (SourceTool::InterProScan, &self.interproscan),
            (SourceTool::EggNog, &self.eggnog),
            (SourceTool::EggNog7, &self.eggnog7),
            (SourceTool::Fantasia, &self.fantasia),
        ]
        .into_iter()
        .flat_map(|(tool, paths)| paths.iter().map(move |p| (tool, p)))
    }

    /// explicit paths plus everything found under --results-dir, ordered by tool
    pub fn sources(&self) -> Vec<(SourceTool, PathBuf)> {
        let mut sources = self
            .explicit()
            .map(|(tool, path)| (tool, path.clone()))
            .collect::<BTreeSet<_>>();

        if let Some(dir) = &self.results_dir {
            sources.extend(discover(dir));
        }

        sources.into_iter().collect()
    }
}

/// output location shared by every writer
#[derive(Debug, Clone, Args)]
pub struct OutputArgs {
    #[arg(
        short = 'o',
        long = "outdir",
        value_name = "DIR",
        default_value = ".",
        help = "Output directory"
    )]
    pub outdir: PathBuf,

    #[arg(
        short = 's',
        long = "sample",
        value_name = "NAME",
        default_value = "sample",
        help = "Sample name used as prefix of every output file"
    )]
    pub sample: String,
}

impl OutputArgs {
    pub fn create(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.outdir)
    }
}

/// scan the conventional per-tool layout of a results directory
pub fn discover(dir: &Path) -> Vec<(SourceTool, PathBuf)> {
    let root = Pattern::escape(&dir.to_string_lossy());
    let mut found = Vec::new();

    for tool in SourceTool::ALL {
        let before = found.len();

        for pattern in tool.layout() {
            let pattern = format!("{}/{}", root, pattern);
            let paths = match glob(&pattern) {
                Ok(paths) => paths,
                Err(e) => {
                    warn!("Invalid search pattern {}: {}", pattern, e);
                    continue;
                }
            };

            for entry in paths {
                match entry {
                    Ok(path) if path.is_file() => found.push((tool, path)),
                    Ok(_) => {}
                    Err(e) => warn!("Could not read {}: {}", e.path().display(), e.error()),
                }
            }
        }

        if found.len() > before {
            info!(
                "{}: {} file(s) found under {}",
                tool,
                found.len() - before,
                dir.display()
            );
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_results_layout() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        for sub in ["kofamscan", "interproscan", "eggnog/v5/batch_1", "fantasia"] {
            std::fs::create_dir_all(root.join(sub)).unwrap();
        }
        std::fs::write(root.join("kofamscan/s1_kofam_mapper.tsv"), "g1\tK1\n").unwrap();
        std::fs::write(root.join("kofamscan/notes.txt"), "x").unwrap();
        std::fs::write(root.join("interproscan/s1.tsv"), "x").unwrap();
        std::fs::write(
            root.join("eggnog/v5/batch_1/s1.emapper.annotations"),
            "x",
        )
        .unwrap();
        std::fs::write(root.join("fantasia/s1_results.tsv.gz"), "x").unwrap();
        std::fs::create_dir_all(root.join("fantasia/nested.tsv")).unwrap();

        let found = discover(root);
        let tools = found.iter().map(|(t, _)| *t).collect::<Vec<_>>();

        assert_eq!(
            tools,
            vec![
                SourceTool::KofamScan,
                SourceTool::InterProScan,
                SourceTool::EggNog,
                SourceTool::Fantasia
            ]
        );
    }

    #[test]
    fn test_sources_merge_explicit_and_discovered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("kofamscan")).unwrap();
        let kofam = dir.path().join("kofamscan/s1_kofam_mapper.tsv");
        std::fs::write(&kofam, "g1\tK1\n").unwrap();

        let args = InputArgs {
            kofamscan: vec![kofam.clone()],
            fantasia: vec![PathBuf::from("missing.tsv")],
            results_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };

        assert_eq!(args.num_inputs(), 2);
        assert_eq!(
            args.sources(),
            vec![
                (SourceTool::KofamScan, kofam),
                (SourceTool::Fantasia, PathBuf::from("missing.tsv"))
            ]
        );
    }

    #[test]
    fn test_discover_escapes_results_dir() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("run[1]");
        std::fs::create_dir_all(root.join("eggnog/v5")).unwrap();
        std::fs::create_dir_all(root.join("eggnog7")).unwrap();
        std::fs::write(root.join("eggnog/v5/s1.emapper.annotations"), "x").unwrap();
        std::fs::write(root.join("eggnog7/s1.eggnog.tsv.gz"), "x").unwrap();
        std::fs::write(root.join("eggnog7/s1.eggnog.tsv"), "x").unwrap();

        let found = discover(&root);

        assert_eq!(
            found,
            vec![
                (SourceTool::EggNog, root.join("eggnog/v5/s1.emapper.annotations")),
                (SourceTool::EggNog7, root.join("eggnog7/s1.eggnog.tsv.gz")),
            ]
        );
    }
}
