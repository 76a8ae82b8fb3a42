use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use crate::{
    ClassifyConfig, RunSummary, TallyConfig,
    panel::LocusPanel,
    run_classify, run_tally,
    table::Delimiter,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Classify HRM-PCR genotypes by melting temperature and tally status distributions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Logging verbosity (e.g. error, warn, info, debug)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Classify samples by nearest reference Tm and write per-sample results
    Classify(ClassifyArgs),
    /// Count the rows of a pre-classified table by status code
    Tally(TallyArgs),
}

#[derive(Debug, Args)]
struct ClassifyArgs {
    /// Input table with one Tm_<locus> column per declared locus
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output CSV path for per-sample results
    #[arg(long, value_name = "FILE", default_value = "results.csv")]
    output: PathBuf,

    /// Reference Tm declaration per locus: 'LOCUS:S:VAL,H:VAL,R:VAL' (repeatable)
    #[arg(long = "tm", value_name = "DECL", required = true)]
    tm: Vec<String>,

    /// Expected number of loci; must match the number of --tm declarations
    #[arg(long, value_name = "N")]
    num_loci: Option<usize>,

    /// Write a genotype distribution report to this path
    #[arg(long, value_name = "FILE")]
    distribution: Option<PathBuf>,

    /// Column holding the sample identifier (row numbers used if omitted)
    #[arg(long, value_name = "NAME")]
    id_column: Option<String>,

    /// Input delimiter
    #[arg(long, value_enum, default_value_t = Delimiter::Auto)]
    delimiter: Delimiter,
}

#[derive(Debug, Args)]
struct TallyArgs {
    /// Input table with a status column
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Write the summary to this file instead of stdout
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Column holding the status code
    #[arg(long, value_name = "NAME", default_value = "status")]
    status_column: String,

    /// Column holding the sample identifier (row numbers used if omitted)
    #[arg(long, value_name = "NAME")]
    id_column: Option<String>,

    /// Input delimiter
    #[arg(long, value_enum, default_value_t = Delimiter::Auto)]
    delimiter: Delimiter,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    match cli.command {
        Command::Classify(args) => {
            if let Some(expected) = args.num_loci
                && expected != args.tm.len()
            {
                anyhow::bail!(
                    "--num-loci is {expected} but {} --tm declarations were given",
                    args.tm.len()
                );
            }
            let panel = LocusPanel::from_declarations(&args.tm)?;

            let config = ClassifyConfig {
                input: args.input,
                output: args.output,
                distribution: args.distribution,
                panel,
                id_column: args.id_column,
                delimiter: args.delimiter,
            };
            let summary = run_classify(config)?;
            print_summary(&summary);
            Ok(())
        }
        Command::Tally(args) => {
            let config = TallyConfig {
                input: args.input,
                output: args.output,
                status_column: args.status_column,
                id_column: args.id_column,
                delimiter: args.delimiter,
            };
            run_tally(config)?;
            Ok(())
        }
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .ok();
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!(
        "Classified {total} samples; {determined} determined, {undetermined} undetermined.",
        total = summary.total_rows - summary.parse_errors,
        determined = summary.determined,
        undetermined = summary.undetermined,
    );

    if summary.missing_tm_cells > 0 {
        println!(
            "Encountered {count} missing or unparsable Tm values.",
            count = summary.missing_tm_cells
        );
    }

    if summary.parse_errors > 0 {
        println!(
            "Ignored {count} malformed input rows.",
            count = summary.parse_errors
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parses_classify_with_repeated_tm_flags() {
        let cli = Cli::parse_from([
            "genomos",
            "classify",
            "samples.csv",
            "--tm",
            "1016:S:73.2,H:72.66,R:72.21",
            "--tm",
            "1534:S:81.71,H:81.81,R:82.36",
            "--output",
            "out.csv",
        ]);
        let Command::Classify(args) = cli.command else {
            panic!("expected classify subcommand");
        };
        assert_eq!(args.input, PathBuf::from("samples.csv"));
        assert_eq!(args.output, PathBuf::from("out.csv"));
        assert_eq!(args.tm.len(), 2);
        assert_eq!(args.delimiter, Delimiter::Auto);
    }

    #[test]
    fn classify_requires_at_least_one_tm() {
        assert!(Cli::try_parse_from(["genomos", "classify", "samples.csv"]).is_err());
    }

    #[test]
    fn parses_tally_defaults() {
        let cli = Cli::parse_from(["genomos", "tally", "results.csv"]);
        let Command::Tally(args) = cli.command else {
            panic!("expected tally subcommand");
        };
        assert_eq!(args.input, PathBuf::from("results.csv"));
        assert_eq!(args.status_column, "status");
        assert_eq!(args.output, None);
    }

    #[test]
    fn tally_accepts_output_and_column_overrides() {
        let cli = Cli::parse_from([
            "genomos",
            "tally",
            "results.tsv",
            "--output",
            "summary.txt",
            "--status-column",
            "state_1016",
            "--delimiter",
            "tab",
        ]);
        let Command::Tally(args) = cli.command else {
            panic!("expected tally subcommand");
        };
        assert_eq!(args.output, Some(PathBuf::from("summary.txt")));
        assert_eq!(args.status_column, "state_1016");
        assert_eq!(args.delimiter, Delimiter::Tab);
    }
}
