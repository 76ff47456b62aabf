//! Outlyer CLI
//!
//! The `outlyer` command keeps Outlyer resources in version-controllable
//! files.
//!
//! ## Commands
//!
//! - `apply`: push local alerts, checks, dashboards and plugins to an account
//! - `export`: pull resources from an account into local files
//! - `get accounts`: list the accounts visible to the API token
//! - `configure` (`login`): validate and store an API token

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::future::Future;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::{debug, Level};

use outlyer_api::{ApiConfig, ApiResult, CliConfig, HttpApiClient, RemoteResourceService, UserInfo};
use outlyer_core::{
    output_folder, resolve_paths, resolve_selectors, FileStore, LocalFileStore, SyncOrchestrator,
};

const EXIT_OK: i32 = 0;
/// General failure
const EXIT_ERROR: i32 = 1;
/// Missing or invalid arguments
const EXIT_BAD_ARGS: i32 = 128;

const TOKEN_ATTEMPTS: usize = 3;

#[derive(Parser)]
#[command(name = "outlyer")]
#[command(author = "Outlyer")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Manage Outlyer resources from the command line", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply resources to an account. Resources are alerts, checks,
    /// dashboards and plugins
    Apply {
        /// Files or directories to apply
        paths: Vec<String>,

        /// Account to apply to (default: default-account from the config file)
        #[arg(short, long)]
        account: Option<String>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Export resources from an account into local files
    Export {
        /// `alerts`, `dashboards/docker`, ... or `.`/`all` for everything
        selectors: Vec<String>,

        /// Account to export from (default: default-account from the config file)
        #[arg(short, long)]
        account: Option<String>,

        /// Output folder (default: current directory)
        #[arg(short, long, default_value = "")]
        folder: String,
    },

    /// Display resources
    Get {
        #[command(subcommand)]
        resource: GetResource,
    },

    /// Set up the CLI by validating your API token
    #[command(alias = "login")]
    Configure,
}

#[derive(Subcommand)]
enum GetResource {
    /// List user accounts
    Accounts,
}

/// Invocation error that exits with [`EXIT_BAD_ARGS`].
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct BadArgs(String);

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    outlyer_core::init_tracing(cli.json, level);

    let code = match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            if err.is::<BadArgs>() {
                EXIT_BAD_ARGS
            } else {
                EXIT_ERROR
            }
        }
    };
    io::stdout().flush().ok();
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Apply {
            paths,
            account,
            yes,
        } => {
            let config = load_config()?;
            let account = resolve_account(account, &config)?;
            if paths.is_empty() {
                return Err(BadArgs("Resource is required".to_string()).into());
            }
            let sync = orchestrator(&config)?;
            cmd_apply(
                &sync,
                &LocalFileStore::new(),
                &account,
                &paths,
                yes,
                &mut io::stdin().lock(),
                &mut io::stdout(),
            )
            .await
        }
        Commands::Export {
            selectors,
            account,
            folder,
        } => {
            let config = load_config()?;
            let account = resolve_account(account, &config)?;
            if selectors.is_empty() {
                return Err(BadArgs("Resource is required".to_string()).into());
            }
            let sync = orchestrator(&config)?;
            cmd_export(&sync, &account, &selectors, &folder, &mut io::stdout()).await
        }
        Commands::Get {
            resource: GetResource::Accounts,
        } => {
            let config = load_config()?;
            let client = api_client(&config)?;
            cmd_get_accounts(&client, &mut io::stdout()).await
        }
        Commands::Configure => cmd_configure().await,
    }
}

fn load_config() -> Result<CliConfig> {
    CliConfig::load().context("Failed to read the Outlyer configuration file")
}

/// `--account`, else `default-account` from the config file.
fn resolve_account(flag: Option<String>, config: &CliConfig) -> Result<String> {
    flag.filter(|a| !a.is_empty())
        .or_else(|| config.default_account().map(str::to_string))
        .ok_or_else(|| BadArgs("Account is required".to_string()).into())
}

fn api_client(config: &CliConfig) -> Result<HttpApiClient> {
    let api_config = ApiConfig::from_cli_config(config);
    if api_config.api_token.is_empty() {
        anyhow::bail!("Outlyer CLI is not configured, run 'outlyer configure' first");
    }
    HttpApiClient::new(api_config).context("Failed to create the API client")
}

fn orchestrator(config: &CliConfig) -> Result<SyncOrchestrator> {
    let client = api_client(config)?;
    Ok(SyncOrchestrator::new(
        Arc::new(client),
        Arc::new(LocalFileStore::new()),
    ))
}

/// One line of user input with the trailing CR/LF removed. EOF reads as "".
fn read_answer<R: BufRead>(input: &mut R) -> Result<String> {
    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn is_confirmed(answer: &str) -> bool {
    answer == "y" || answer == "Y"
}

async fn cmd_apply<R: BufRead, W: Write>(
    sync: &SyncOrchestrator,
    store: &dyn FileStore,
    account: &str,
    paths: &[String],
    yes: bool,
    input: &mut R,
    out: &mut W,
) -> Result<i32> {
    let resolved = resolve_paths(paths, store)?;

    writeln!(out, "\nResources to apply...\n")?;
    for path in &resolved {
        writeln!(out, "\t- {path}")?;
    }

    if !yes {
        write!(
            out,
            "\nAre you sure you want to apply to account '{account}'? [y/n] "
        )?;
        out.flush()?;
        if !is_confirmed(&read_answer(input)?) {
            writeln!(out, "Skipping apply. 0 resources applied.")?;
            return Ok(EXIT_OK);
        }
    }

    let report = sync.apply(account, &resolved).await;
    writeln!(out)?;
    write!(out, "{report}")?;
    writeln!(out)?;
    Ok(report.exit_code())
}

async fn cmd_export<W: Write>(
    sync: &SyncOrchestrator,
    account: &str,
    selectors: &[String],
    folder: &str,
    out: &mut W,
) -> Result<i32> {
    let selected = resolve_selectors(selectors)?;
    let folder = output_folder(folder)?;
    debug!("Exporting into {:?}", folder);

    let report = sync
        .export(account, &selected, &folder)
        .await
        .context("Export failed")?;
    writeln!(out)?;
    write!(out, "{report}")?;
    writeln!(out)?;
    Ok(report.exit_code())
}

async fn cmd_get_accounts<W: Write>(remote: &dyn RemoteResourceService, out: &mut W) -> Result<i32> {
    let accounts = remote
        .get("/accounts")
        .await
        .context("Error fetching user accounts")?;
    writeln!(out, "{}", String::from_utf8_lossy(&accounts))?;
    Ok(EXIT_OK)
}

async fn cmd_configure() -> Result<i32> {
    let existing = CliConfig::load().unwrap_or_default();
    let base = ApiConfig::from_cli_config(&existing);
    let mut stdout = io::stdout();

    let configured = prompt_for_token(&mut io::stdin().lock(), &mut stdout, |token| {
        let config = base.clone().with_token(&token);
        async move { HttpApiClient::new(config)?.user().await }
    })
    .await?;

    match configured {
        Some(config) => {
            let path = config
                .save()
                .context("Failed to write the Outlyer configuration file")?;
            debug!("Saved configuration to {:?}", path);
            writeln!(stdout, "\nSuccess! Outlyer CLI is configured and ready to use.")?;
            Ok(EXIT_OK)
        }
        None => Ok(EXIT_ERROR),
    }
}

/// Ask for a token until `validate` accepts one, at most three times.
async fn prompt_for_token<R, W, F, Fut>(
    input: &mut R,
    out: &mut W,
    mut validate: F,
) -> Result<Option<CliConfig>>
where
    R: BufRead,
    W: Write,
    F: FnMut(String) -> Fut,
    Fut: Future<Output = ApiResult<UserInfo>>,
{
    for _ in 0..TOKEN_ATTEMPTS {
        write!(out, "Please enter your API token: ")?;
        out.flush()?;
        let token = read_answer(input)?;
        if token.is_empty() {
            writeln!(out, "The API token cannot be empty.")?;
            continue;
        }

        match validate(token.clone()).await {
            Ok(user) => return Ok(Some(CliConfig::new(&token, &user.default_account))),
            Err(e) => writeln!(out, "Error validating the API token. {e}")?,
        }
    }
    writeln!(out, "Please contact Outlyer support.")?;
    Ok(None)
}
