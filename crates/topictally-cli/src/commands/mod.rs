/// CLI subcommand argument definitions and implementations for topictally.
///
/// Each subcommand struct defines its flags and arguments
/// matching the CLI interface contract.
pub mod analyze;
pub mod init;

use clap::Args;

/// Arguments for the `init` subcommand.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Overwrite existing config file
    #[arg(long)]
    pub force: bool,

    /// Skip interactive wizard and write a default config
    #[arg(long)]
    pub non_interactive: bool,
}

/// Arguments for the `analyze` subcommand.
#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// URI of the thread's prompt post
    pub thread_uri: String,

    /// Print the full `AnalysisResult` as JSON instead of a text summary
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `test` subcommand.
#[derive(Debug, Args)]
pub struct TestArgs {
    /// Print diagnostic results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Output format shared by subcommands that support `--json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text, printed to stderr so stdout stays pipeable.
    Text,
    /// A single JSON document on stdout.
    Json,
}

impl OutputFormat {
    /// Construct from a `--json` flag.
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            Self::Json
        } else {
            Self::Text
        }
    }

    /// Whether this format is JSON.
    pub fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}
