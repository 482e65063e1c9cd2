//! Phone recommender CLI entry point.
//!
//! Provides `recommend`, `interactive`, `catalog`, and `prompt` subcommands.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use phone_recommender::catalog::Catalog;
use phone_recommender::config::{self, Config};
use phone_recommender::credentials::{default_env_file, load_credentials, resolve_api_key};
use phone_recommender::display::{render_catalog, render_results};
use phone_recommender::logging;
use phone_recommender::prompt::build_prompt;
use phone_recommender::providers::gemini::GeminiProvider;
use phone_recommender::recommend::{GenerationSettings, Recommender};

/// Describe the phone you want; get ranked matches from the catalog.
#[derive(Parser)]
#[command(name = "phone-recommender", version, about)]
struct Cli {
    /// Config file (default: ~/.phone-recommender/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON catalog file to use instead of the built-in catalog.
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Write rotated JSON logs to this directory.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Recommend phones for one preference.
    Recommend {
        /// Free-text preference, in English or Hindi.
        preference: String,
        /// Print the raw result as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Read preferences from stdin, one per line.
    Interactive,
    /// List the catalog.
    Catalog {
        /// Print the catalog as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the prompt that would be sent, without calling the model.
    Prompt {
        /// Free-text preference, in English or Hindi.
        preference: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // A local .env seeds the process environment; its absence is fine.
    let _ = dotenvy::dotenv();

    let config = config::load(cli.config.as_deref()).context("failed to load configuration")?;

    let _logging_guard = match cli.log_dir.as_ref().or(config.logging.dir.as_ref()) {
        Some(dir) => Some(logging::init_production(dir, &config.logging.level)?),
        None => {
            logging::init_cli(&config.logging.level);
            None
        }
    };

    let catalog = Arc::new(load_catalog(cli.catalog.clone(), &config)?);

    match cli.command {
        Command::Recommend { preference, json } => {
            handle_recommend(&config, catalog, &preference, json).await
        }
        Command::Interactive => handle_interactive(&config, catalog).await,
        Command::Catalog { json } => handle_catalog(&catalog, json),
        Command::Prompt { preference } => handle_prompt(&catalog, &preference),
    }
}

fn load_catalog(cli_path: Option<PathBuf>, config: &Config) -> anyhow::Result<Catalog> {
    match cli_path.or_else(|| config.catalog.path.clone()) {
        Some(path) => {
            let catalog = Catalog::load(&path)
                .with_context(|| format!("failed to load catalog {}", path.display()))?;
            if catalog.is_empty() {
                anyhow::bail!("failed to load catalog {}: no products", path.display());
            }
            info!(path = %path.display(), products = catalog.len(), "catalog loaded");
            Ok(catalog)
        }
        None => Catalog::builtin().context("built-in catalog is corrupt"),
    }
}

fn build_recommender(config: &Config, catalog: Arc<Catalog>) -> anyhow::Result<Recommender> {
    let fallback = default_env_file()
        .ok()
        .filter(|path| path.exists())
        .and_then(|path| match load_credentials(&path) {
            Ok(creds) => Some(creds),
            Err(e) => {
                warn!(error = %e, "ignoring unreadable credentials file");
                None
            }
        });

    let api_key = resolve_api_key(
        &config.model.api_key_env,
        |key| std::env::var(key).ok(),
        fallback.as_ref(),
    )?;

    let mut provider = GeminiProvider::new(config.model.name.clone(), api_key)
        .with_base_url(&config.model.base_url)?;
    if let Some(secs) = config.model.timeout_secs {
        provider = provider.with_timeout(Duration::from_secs(secs))?;
    }

    Ok(Recommender::new(Arc::new(provider), catalog).with_settings(GenerationSettings {
        max_output_tokens: config.model.max_output_tokens,
        temperature: config.model.temperature,
    }))
}

async fn handle_recommend(
    config: &Config,
    catalog: Arc<Catalog>,
    preference: &str,
    json: bool,
) -> anyhow::Result<()> {
    let recommender = build_recommender(config, catalog)?;
    let result = recommender.recommend(preference).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", render_results(recommender.catalog(), &result));
    }
    Ok(())
}

async fn handle_interactive(config: &Config, catalog: Arc<Catalog>) -> anyhow::Result<()> {
    let recommender = build_recommender(config, catalog)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Describe the phone you want (English or Hindi). Ctrl-D to quit.");
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        match recommender.recommend(&line).await {
            Ok(result) => print!("{}", render_results(recommender.catalog(), &result)),
            Err(e) => eprintln!("error: {e}"),
        }
    }
    Ok(())
}

fn handle_catalog(catalog: &Catalog, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(catalog.products())?);
    } else {
        print!("{}", render_catalog(catalog));
    }
    Ok(())
}

fn handle_prompt(catalog: &Catalog, preference: &str) -> anyhow::Result<()> {
    let preference = preference.trim();
    if preference.is_empty() {
        anyhow::bail!("preference text is empty");
    }
    println!("{}", build_prompt(preference, catalog));
    Ok(())
}
