//! Command-line interface for upm.
//!
//! `upm` takes at most one argument:
//! - no argument: read the manifest, resolve the catalog, download
//! - `?`: print usage and exit
//! - `-v` / `-verbose`: same as no argument with verbose logging

use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};

use crate::adapters::prompt::ManifestChoice;
use crate::adapters::{Confirmer, FixedAnswer, HttpFetcher, TerminalPrompt};
use crate::config::{load_config, ResolvedConfig};
use crate::core::Orchestrator;
use crate::domain::{Completion, ManifestSource};
use crate::library::{Catalog, CatalogSource};

/// upm - Micro Package Manager for front-end libraries
#[derive(Parser, Debug)]
#[command(name = "upm")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// `?` for help, `-v` or `-verbose` for verbose logging
    #[arg(allow_hyphen_values = true, value_name = "OPTION")]
    pub option: Option<String>,
}

/// What the single argument asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation {
    /// Read, resolve, download
    Run { verbose: bool },

    /// Print usage
    Help,
}

impl Invocation {
    /// Interpret the optional positional argument
    pub fn from_arg(arg: Option<&str>) -> Result<Self> {
        match arg {
            None => Ok(Self::Run { verbose: false }),
            Some("?") => Ok(Self::Help),
            Some("-v" | "-verbose" | "--verbose") => Ok(Self::Run { verbose: true }),
            Some(other) => anyhow::bail!("Unknown argument '{}'. Run \"upm ?\" for help.", other),
        }
    }
}

impl Cli {
    /// Interpret the parsed arguments
    pub fn invocation(&self) -> Result<Invocation> {
        Invocation::from_arg(self.option.as_deref())
    }

    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.invocation()? {
            Invocation::Help => {
                print_help();
                Ok(())
            }
            Invocation::Run { verbose } => {
                if verbose {
                    info!("Verbose logging enabled");
                }
                let cwd = std::env::current_dir().context("Failed to determine current directory")?;
                let config = load_config(&cwd)?;
                run(&config).await
            }
        }
    }
}

/// Usage text shown for `upm ?`
pub const HELP_TEXT: &str = "\
upm command line parameters
  upm -verbose
      enables verbose logging (shortcut: -v).
  upm ?
      show this help info.
instructions:
  to use upm, navigate to your source repository
  and run the \"upm\" command.";

fn print_help() {
    println!("{HELP_TEXT}");
}

/// Read the manifest, load the catalog and download everything
async fn run(config: &ResolvedConfig) -> Result<()> {
    info!("Starting upm - Micro Package Manager");
    match &config.config_file {
        Some(path) => info!(path = %path.display(), "Using config file"),
        None => debug!("No config file found, using defaults"),
    }
    info!("Reading package description...");

    let Some(source) = ManifestSource::discover(&config.root, &config.files) else {
        return create_manifest(config);
    };

    let manifest = source
        .load()
        .with_context(|| format!("Failed to load package {}", source.path().display()))?;

    if manifest.is_empty() {
        warn!(path = %source.path().display(), "Package contains zero sections");
    }

    let fetcher = Arc::new(HttpFetcher::new()?);
    let catalog_source = CatalogSource::discover(config);
    let catalog = Catalog::load(&catalog_source, fetcher.as_ref(), config.limits.transfer_timeout())
        .await
        .context("Unable to download and parse the catalog")?;
    if catalog.is_empty() {
        warn!(source = %catalog_source, "Catalog contains no libraries");
    }

    let orchestrator = Orchestrator::new(fetcher, confirmer(), config.limits, config.root.clone());

    let completion = tokio::select! {
        result = orchestrator.run(&manifest, &catalog) => result?,
        _ = tokio::signal::ctrl_c() => anyhow::bail!("Run cancelled"),
    };

    report(&completion, config.strict)
}

/// Prompt on a terminal; decline folder creation otherwise
fn confirmer() -> Arc<dyn Confirmer> {
    if std::io::stdin().is_terminal() {
        Arc::new(TerminalPrompt::new())
    } else {
        info!("Not running on a terminal; missing folders will not be created");
        Arc::new(FixedAnswer(false))
    }
}

/// Offer to write a starter manifest
fn create_manifest(config: &ResolvedConfig) -> Result<()> {
    let path = config.manifest_path();

    if !std::io::stdin().is_terminal() {
        anyhow::bail!(
            "No package found. Create {} (or a \"libraries\" key in {}) and re-run upm.",
            config.files.manifest,
            config.files.descriptor
        );
    }

    match TerminalPrompt::new().choose_manifest(&config.files.manifest)? {
        ManifestChoice::Create(template) => {
            template.write(&path)?;
            print_created(&path);
        }
        ManifestChoice::Exit => {
            info!("Exiting upm... user chose not to create a package. Goodbye!");
        }
    }

    Ok(())
}

fn print_created(path: &Path) {
    println!(
        "The {} file was created. Please modify the file according to your project, then rerun the upm command.",
        path.display()
    );
}

/// Summarize the completion; fail only in strict mode
fn report(completion: &Completion, strict: bool) -> Result<()> {
    for outcome in completion.outcomes.iter().filter(|o| o.is_failed()) {
        warn!(library = %outcome.library, section = %outcome.section, "Not downloaded");
    }

    if strict && completion.failed() > 0 {
        anyhow::bail!("{} download(s) failed", completion.failed());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_parsing() {
        assert_eq!(
            Invocation::from_arg(None).unwrap(),
            Invocation::Run { verbose: false }
        );
        assert_eq!(Invocation::from_arg(Some("?")).unwrap(), Invocation::Help);
        assert_eq!(
            Invocation::from_arg(Some("-verbose")).unwrap(),
            Invocation::Run { verbose: true }
        );
        assert_eq!(
            Invocation::from_arg(Some("-v")).unwrap(),
            Invocation::Run { verbose: true }
        );
        assert!(Invocation::from_arg(Some("install")).is_err());
    }

    #[test]
    fn test_cli_accepts_hyphenated_option() {
        let cli = Cli::try_parse_from(["upm", "-verbose"]).unwrap();
        assert_eq!(cli.invocation().unwrap(), Invocation::Run { verbose: true });

        let cli = Cli::try_parse_from(["upm", "?"]).unwrap();
        assert_eq!(cli.invocation().unwrap(), Invocation::Help);
    }

    #[test]
    fn test_help_text() {
        assert!(HELP_TEXT.contains("-verbose"));
        assert!(HELP_TEXT.contains("upm ?"));
    }
}
