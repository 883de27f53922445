use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use tissuegraph::config::ConfigLoader;
use tissuegraph::error::TissuegraphError;
use tissuegraph::importer::{ImportOptions, ImportReport, Importer};
use tissuegraph::neo4j::Neo4jHttpClient;
use tissuegraph::output::{JsonOutput, OutputMode};

#[derive(Parser)]
#[command(name = "tissuegraph")]
#[command(about = "Imports protein catalogs and per-tissue abundance datasets into a Neo4j graph")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Run the full import pipeline against the configured store")]
    Import(ImportArgs),
    #[command(about = "Parse, aggregate and build without touching the store")]
    Check(ImportArgs),
}

#[derive(Args, Clone)]
struct ImportArgs {
    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    strict: bool,

    #[arg(long)]
    dry_run: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<TissuegraphError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &TissuegraphError) -> u8 {
    match error {
        TissuegraphError::MissingConfig
        | TissuegraphError::ConfigRead(_)
        | TissuegraphError::ConfigParse(_)
        | TissuegraphError::InvalidSpeciesId(_) => 2,
        TissuegraphError::GraphHttp(_)
        | TissuegraphError::IndexCreation { .. }
        | TissuegraphError::CommitFailed { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    match cli.command {
        Commands::Import(args) => run_import(args, false, output_mode),
        Commands::Check(args) => run_import(args, true, output_mode),
    }
}

fn run_import(args: ImportArgs, check_only: bool, output_mode: OutputMode) -> miette::Result<()> {
    let config = ConfigLoader::resolve(args.config.as_deref()).into_diagnostic()?;
    let options = ImportOptions {
        strict: args.strict,
        dry_run: args.dry_run || check_only,
    };

    let store = Neo4jHttpClient::new(&config.server_url, config.auth.clone()).into_diagnostic()?;
    let importer = Importer::new(store, config, options);
    let report = importer.run().into_diagnostic()?;

    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_report(&report).into_diagnostic(),
        OutputMode::Interactive => {
            print_report_summary(&report);
            Ok(())
        }
    }
}

fn print_report_summary(report: &ImportReport) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let cyan = "\x1b[36m";
    let reset = "\x1b[0m";

    println!("{cyan}tissuegraph summary (species {}){reset}", report.species);
    println!(
        "{green}  proteins: {} parsed, {} malformed{reset}",
        report.proteins, report.malformed_proteins
    );
    for dataset in &report.datasets {
        println!(
            "{green}  {}: {} {} records ({} skipped, {} malformed){reset}",
            dataset.file, dataset.organ, dataset.records, dataset.skipped_short, dataset.malformed
        );
    }
    println!(
        "{green}  batch: {} nodes, {} labels, {} relationships{reset}",
        report.batch.nodes, report.batch.labels, report.batch.relationships
    );
    match &report.commit {
        Some(summary) => {
            println!("{green}  committed: {} operations{reset}", summary.operations)
        }
        None => println!("{yellow}  not committed (dry run){reset}"),
    }
}
