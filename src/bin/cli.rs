//! CLI binary for geosearch.

use anyhow::Context;
use clap::{Parser, Subcommand};
use geosearch::{AppConfig, AppError};
use geosearch_core::coverage::{self, ProviderCoverage};
use geosearch_core::{
    CountryCode, FailureReport, PlannedAttempt, ProviderId, SearchRequest, SearchRouter,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// geosearch: country-targeted web search across independent providers.
#[derive(Parser)]
#[command(name = "geosearch", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long, env = "GEOSEARCH_CONFIG")]
    config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Run a search and print the response as JSON.
    Search {
        /// Query text.
        query: String,
        /// ISO 3166-1 alpha-2 country to target.
        #[arg(long)]
        country: Option<String>,
        /// Preferred result language, e.g. `fr`.
        #[arg(long)]
        lang: Option<String>,
        /// Client identity for rate limiting.
        #[arg(long, default_value = "cli")]
        ip: String,
        /// Per-request key, as `provider=KEY`. Repeatable.
        #[arg(long = "user-key", value_parser = parse_user_key)]
        user_keys: Vec<(ProviderId, String)>,
        /// Fail instead of falling back to worldwide results.
        #[arg(long)]
        strict: bool,
    },

    /// Print the attempt plan without calling any provider.
    Plan {
        /// ISO 3166-1 alpha-2 country to target.
        #[arg(long)]
        country: Option<String>,
        /// Per-request key, as `provider=KEY`. Repeatable.
        #[arg(long = "user-key", value_parser = parse_user_key)]
        user_keys: Vec<(ProviderId, String)>,
    },

    /// Show how each provider covers a country.
    Coverage {
        /// ISO 3166-1 alpha-2 country code.
        country: String,
    },

    /// Print coverage counts over the whole country universe.
    Countries,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("geosearch=info,geosearch_core=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Search {
            query,
            country,
            lang,
            ip,
            user_keys,
            strict,
        } => {
            let config = AppConfig::load(cli.config.as_deref())?;
            let request = SearchRequest {
                query,
                country_hint: country,
                language_hint: lang,
                client_identity: ip,
                credentials: config.credentials_with_user(user_keys),
                strict_country: strict,
            };
            run_search(config, request).await
        }
        Command::Plan { country, user_keys } => {
            let config = AppConfig::load(cli.config.as_deref())?;
            print_plan(&config, country.as_deref(), user_keys)
        }
        Command::Coverage { country } => print_coverage(&country),
        Command::Countries => print_json(&coverage::coverage_summary()),
    }
}

async fn run_search(config: AppConfig, request: SearchRequest) -> anyhow::Result<()> {
    let router = SearchRouter::new(config.router).context("failed to build router")?;
    match router.search(request).await {
        Ok(response) => print_json(&response),
        Err(err) => {
            print_json(&FailureReport::from(&err))?;
            Err(AppError::from(err).into())
        }
    }
}

fn print_plan(
    config: &AppConfig,
    country: Option<&str>,
    user_keys: Vec<(ProviderId, String)>,
) -> anyhow::Result<()> {
    let country = country.map(parse_country).transpose()?;
    let credentials = config.credentials_with_user(user_keys);
    let plan: Vec<PlannedAttempt> =
        geosearch_core::planner::plan_attempts(country, &credentials, &config.router.providers)
            .iter()
            .map(PlannedAttempt::from)
            .collect();
    if plan.is_empty() {
        eprintln!("no credentials configured; set GEOSEARCH_*_API_KEY or pass --user-key");
    }
    print_json(&plan)
}

fn print_coverage(raw: &str) -> anyhow::Result<()> {
    let country = parse_country(raw)?;
    for (provider, coverage) in coverage::coverage_of(country) {
        let line = match coverage {
            ProviderCoverage::Exact => format!(
                "exact (param {})",
                coverage::country_param(provider, country)
            ),
            ProviderCoverage::Proxy(substitute) => format!(
                "proxy via {substitute} (param {})",
                coverage::country_param(provider, substitute)
            ),
            ProviderCoverage::Global => match coverage::global_param(provider) {
                Some(param) => format!("global (param {param})"),
                None => "global".to_owned(),
            },
        };
        println!("{:<8} {line}", provider.as_str());
    }
    Ok(())
}

fn parse_country(raw: &str) -> Result<CountryCode, AppError> {
    CountryCode::parse(raw).ok_or_else(|| AppError::Argument(format!("unknown country code: {raw}")))
}

fn parse_user_key(raw: &str) -> Result<(ProviderId, String), String> {
    let (provider, key) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected provider=KEY, got {raw:?}"))?;
    let provider =
        ProviderId::parse(provider).ok_or_else(|| format!("unknown provider: {provider}"))?;
    if key.trim().is_empty() {
        return Err(format!("empty key for {provider}"));
    }
    Ok((provider, key.to_owned()))
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
