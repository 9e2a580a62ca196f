/// annotools: integration and consensus filtering of functional annotations
///
/// This is the entry point for the annotools CLI.
/// It is responsible for parsing the CLI arguments
/// and executing the appropriate subcommand [anno-tool].
///
/// This wrapper offers 3 different subcommands:
/// - run
/// - consensus
/// - overlap
///
/// 'run' processes every table of one sample: normalized per-term
/// and per-gene tables, ensemble thresholds and consensus, coverage,
/// overlaps and a per-tool run report. 'consensus' and 'overlap'
/// expose the two engines on their own. All of them share the hidden
/// 'anno-pack' crate (parsers and normalization) and 'config'
/// (constants, error taxonomy and I/O helpers).
///
/// To get help on the subcommands, you can run:
///
/// ```shell
/// annotools consensus -- --help
/// ```
///
use clap::{Args, Parser, Subcommand};
use log::{error, info, Level};
use simple_logger::init_with_level;

use anno_consensus::lib_anno_consensus;
use anno_overlap::lib_anno_overlap;
use annotools::lib;

const HELP: &str = r#"
Usage: annotools run [--kofamscan <PATHS>] [--interproscan <PATHS>] [--eggnog <PATHS>]
                     [--eggnog7 <PATHS>] [--fantasia <PATHS>] [--results-dir <DIR>]

 Options:
  --kofamscan <PATHS>...      KofamScan mapper/detail tables
  --interproscan <PATHS>...   InterProScan TSV files
  --eggnog <PATHS>...         eggNOG-mapper v5 .emapper.annotations files
  --eggnog7 <PATHS>...        eggNOG v7 .eggnog.tsv.gz files
  --fantasia <PATHS>...       FANTASIA ensemble tables
  --results-dir <DIR>         Directory scanned for the tables above
  --fasta <PATH>              Protein FASTA [coverage denominator, locus column]
  --models <PATH>             JSON ensemble configuration
  --percentile <FRACTION>     Threshold percentile [default: 0.25]
  --min-votes <N>             Consensus cut [default: ceil(N/2)]
  --group <TOOLS>             Comparison group [default: kofamscan,interproscan,eggnog]
  --focus <TOOL>              Focus tool [default: fantasia]
  --outdir <DIR>              Output directory
  --sample <NAME>             Output prefix
  -t, --threads <THREADS>     Number of threads
  -h, --help                  Print help
"#;

#[derive(Parser)]
#[command(name = "annotools")]
#[command(about = "annotools: integration and consensus filtering of functional annotations")]
#[command(version = config::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(name = "run")]
    Run(AnnoArgs),
    #[command(name = "consensus")]
    Consensus(AnnoArgs),
    #[command(name = "overlap")]
    Overlap(AnnoArgs),
}

#[derive(Args)]
struct AnnoArgs {
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, help = HELP)]
    args: Vec<String>,
}

fn main() {
    let start = std::time::Instant::now();
    if let Err(e) = init_with_level(Level::Info) {
        eprintln!("ERROR: could not initialize logger: {}", e);
    }
    let cli = Cli::parse();

    init();

    let result = match cli.command {
        Commands::Run(args) => lib(args.args).map(|summary| {
            info!("Run report written to {}", summary.run_report.display());
        }),
        Commands::Consensus(args) => lib_anno_consensus(args.args).map(|_| ()),
        Commands::Overlap(args) => lib_anno_overlap(args.args).map(|_| ()),
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }

    let elapsed = start.elapsed();
    info!("Elapsed time: {:.3?}", elapsed);
}

fn init() {
    let message = format!(
        r#"

        annotools: integration and consensus filtering of functional annotations

        this is the entry point for the annotools CLI
        and it is responsible for parsing the CLI arguments
        for each anno-tool:

        - run
        - consensus
        - overlap

        > version: {}

        * to get help on the subcommands, run:
            annotools <SUBCOMMAND> -- --help

        "#,
        config::VERSION
    );

    println!("{}", message);
}
