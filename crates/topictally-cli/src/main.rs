/// topictally CLI.
///
/// Entry point for the `topictally` binary. Parses CLI arguments,
/// initializes logging, and dispatches to subcommand handlers.
mod commands;

use clap::Parser;
use topictally_core::config::Config;
use tracing_subscriber::EnvFilter;

/// Tally quote-post titles in a reply/quote thread
#[derive(Parser)]
#[command(name = "topictally")]
#[command(version)]
#[command(about = "Tally quote-post titles in a reply/quote thread")]
#[command(after_help = "\
Quick start:
  1. topictally init               — write a starter config.toml
  2. topictally test               — validate configuration
  3. topictally analyze <thread>   — run an analysis and print the tally")]
struct Cli {
    /// Path to config.toml
    #[arg(short = 'c', long, global = true, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Set up configuration (interactive wizard)
    Init(commands::InitArgs),
    /// Analyze a thread and print the title tally
    Analyze(commands::AnalyzeArgs),
    /// Validate configuration and connectivity
    Test(commands::TestArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing-subscriber.
    //
    // Priority: RUST_LOG env var > --verbose/--quiet flags > default (warn).
    // - Default: warn level, compact format with timestamps.
    // - Verbose (-v): debug level, includes module paths.
    // - Quiet (-q): error level, minimal format.
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("topictally=debug,topictally_core=debug,info")
    } else if cli.quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::new("topictally=info,topictally_core=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(cli.verbose)
        .compact()
        .init();

    // `init` manages its own config lifecycle (the file may not exist yet).
    if let Commands::Init(args) = cli.command {
        return commands::init::execute(args.force, args.non_interactive, &cli.config).await;
    }

    let config = Config::load(Some(&cli.config)).map_err(|e| {
        anyhow::anyhow!(
            "Failed to load configuration: {e}\n\
             Hint: Run 'topictally init' to create a default configuration file."
        )
    })?;

    match cli.command {
        Commands::Init(_) => unreachable!(),
        Commands::Analyze(args) => {
            commands::analyze::execute(&config, args).await?;
        }
        Commands::Test(args) => {
            commands::test::execute(&config, &cli.config, args.json).await?;
        }
    }

    Ok(())
}
