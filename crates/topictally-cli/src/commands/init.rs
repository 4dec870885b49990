/// `topictally init` — interactive setup wizard or template copy.
///
/// Walks new users through choosing a normalization policy and the
/// fetcher's base URL. Falls back to writing the built-in defaults
/// verbatim with `--non-interactive`.
use std::fs;
use std::io::IsTerminal;
use std::path::Path;

use anyhow::{bail, Context, Result};
use dialoguer::{Confirm, Input, Select};
use topictally_core::config::{Config, CustomListEntry, NormalizationPolicy};

use super::test;

/// Run the init command.
pub async fn execute(force: bool, non_interactive: bool, config_path: &str) -> Result<()> {
    let path = Path::new(config_path);

    if path.exists() && !force {
        eprintln!("Configuration already exists at {config_path}\nUse --force to overwrite.");
        return Ok(());
    }

    if non_interactive {
        return write_default(path);
    }

    if !std::io::stdin().is_terminal() {
        bail!(
            "Interactive wizard requires a terminal.\n\
             Use --non-interactive to write the default config instead."
        );
    }

    run_wizard(path).await
}

/// Non-interactive path: write the library's built-in defaults.
fn write_default(path: &Path) -> Result<()> {
    let config = Config::default();
    let toml = toml::to_string_pretty(&config).context("failed to serialize default config")?;
    fs::write(path, toml).with_context(|| format!("Failed to write {}", path.display()))?;

    eprintln!("Created {}\n", path.display());
    print_next_steps();
    Ok(())
}

/// Interactive path: ask the questions that actually change behavior
/// (normalization policy, fetcher base URL), accept defaults for the rest.
async fn run_wizard(path: &Path) -> Result<()> {
    eprintln!("topictally setup\n");

    let base_url: String = Input::new()
        .with_prompt("Thread API base URL")
        .default("https://public.api.bsky.app/xrpc".to_string())
        .interact_text()?;

    let policy_choice = Select::new()
        .with_prompt("Normalization policy")
        .items(&[
            "self_validation — infer titles from the prompt post's own wording (no extra setup)",
            "list — match against a list of titles you provide now",
            "catalog — validate candidates against an external catalog (configure the URL by hand)",
        ])
        .default(0)
        .interact()?;

    let mut config = Config::default();
    config.fetcher.base_url = base_url;

    match policy_choice {
        1 => {
            config.normalization.policy = Some(NormalizationPolicy::List);
            config.normalization.custom_list = collect_custom_list()?;
        }
        2 => {
            config.normalization.policy = Some(NormalizationPolicy::Catalog);
            let url: String =
                Input::new().with_prompt("Validation catalog URL").interact_text()?;
            config.normalization.validation_api_url = Some(url);
        }
        _ => {
            config.normalization.policy = Some(NormalizationPolicy::SelfValidation);
        }
    }

    let toml = toml::to_string_pretty(&config).context("failed to serialize config")?;
    eprintln!("\n{toml}");

    let confirm = Confirm::new().with_prompt("Write this configuration?").default(true).interact()?;
    if !confirm {
        eprintln!("Aborted. No files were written.");
        return Ok(());
    }

    fs::write(path, &toml).with_context(|| format!("Failed to write {}", path.display()))?;
    eprintln!("\nWrote {}", path.display());

    let config_path_str = path.display().to_string();
    let reloaded = Config::load(Some(&config_path_str)).context("Failed to reload the config we just wrote")?;

    let do_test = Confirm::new().with_prompt("Validate configuration now?").default(true).interact()?;
    if do_test {
        test::run_checks(&reloaded, &config_path_str).await;
    } else {
        print_next_steps();
    }

    Ok(())
}

fn collect_custom_list() -> Result<Vec<CustomListEntry>> {
    let mut entries = Vec::new();
    loop {
        let title: String = Input::new()
            .with_prompt(format!("Title #{} (blank to finish)", entries.len() + 1))
            .allow_empty(true)
            .interact_text()?;
        if title.trim().is_empty() {
            break;
        }
        let aliases_raw: String = Input::new()
            .with_prompt("Aliases, comma-separated (optional)")
            .allow_empty(true)
            .interact_text()?;
        let aliases = aliases_raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        entries.push(CustomListEntry { title, aliases });
    }
    Ok(entries)
}

fn print_next_steps() {
    eprintln!("Next steps:");
    eprintln!("  1. topictally test                — validate configuration");
    eprintln!("  2. topictally analyze <thread-uri> — run an analysis");
}
