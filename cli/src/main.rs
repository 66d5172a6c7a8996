use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod logging;

use commands::{authorize, principal, serve, token, AuthorizerArgs, StoreArgs};

/// Gateway authorizer - turns bearer tokens into gateway access policies
#[derive(Parser)]
#[command(name = "gateway-authorizer")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write daily rolling log files to this directory
    #[arg(long, env = "AUTHORIZER_LOG_DIR", global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP authorizer
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "AUTHORIZER_PORT", default_value_t = 3030)]
        port: u16,

        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        #[command(flatten)]
        authorizer: AuthorizerArgs,
    },

    /// Evaluate a single gateway event and print the policy document
    Authorize {
        /// Event JSON file, or "-" for stdin
        #[arg(short, long)]
        event: String,

        /// Output format (json, text)
        #[arg(short, long, default_value = "json")]
        format: String,

        #[command(flatten)]
        authorizer: AuthorizerArgs,
    },

    /// Sign a token for a principal
    IssueToken {
        username: String,

        /// Scope to include; repeatable
        #[arg(long = "scope")]
        scopes: Vec<String>,

        /// Lifetime in seconds
        #[arg(long, default_value_t = user::DEFAULT_TOKEN_TTL_SECS)]
        ttl_secs: i64,
    },

    /// Manage the principal store
    Principal {
        #[command(subcommand)]
        action: PrincipalAction,
    },
}

#[derive(Subcommand)]
enum PrincipalAction {
    /// Add a principal, or replace its scopes
    Add {
        username: String,

        /// Scope to record; repeatable
        #[arg(long = "scope")]
        scopes: Vec<String>,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// Remove a principal
    Remove {
        username: String,

        #[command(flatten)]
        store: StoreArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let _log_guard = logging::init_logging(cli.verbose, cli.log_dir.as_deref())?;

    match cli.command {
        Commands::Serve {
            port,
            host,
            authorizer,
        } => {
            serve::execute(host, port, authorizer).await?;
        }
        Commands::Authorize {
            event,
            format,
            authorizer,
        } => {
            authorize::execute(event, format, authorizer).await?;
        }
        Commands::IssueToken {
            username,
            scopes,
            ttl_secs,
        } => {
            token::issue(username, scopes, ttl_secs)?;
        }
        Commands::Principal { action } => match action {
            PrincipalAction::Add {
                username,
                scopes,
                store,
            } => {
                principal::add(username, scopes, store).await?;
            }
            PrincipalAction::Remove { username, store } => {
                principal::remove(username, store).await?;
            }
        },
    }

    Ok(())
}
