mod cancel_cmd;
mod chains_cmd;
mod config;
mod connect;
mod create_cmd;
mod list_cmd;
mod sync_cmd;
mod taskid_cmd;
#[cfg(test)]
mod test_util;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "scythe", about = "Operator CLI for on-chain harvest automation tasks")]
struct Cli {
    /// Chain to operate on (overrides SCYTHE_CHAIN env var)
    #[arg(long, global = true)]
    chain: Option<String>,

    /// Log the parameters of every chain call
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a scythe config file template (no network required)
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// List the configured chains
    Chains,
    /// List the task ids the admin wallet owns
    List,
    /// Derive the task id a vault's harvest task would get
    TaskId {
        /// Vault contract address
        vault: String,
    },
    /// Create a harvest task for every vault in a TOML list
    Create {
        /// Path to the vault list TOML file
        file: PathBuf,
    },
    /// Cancel tasks by id
    Cancel {
        /// Task ids to cancel (32-byte hex, 0x prefix optional)
        #[arg(required = true)]
        task_ids: Vec<String>,
    },
    /// Reconcile a vault list against the registered tasks
    Sync {
        /// Path to the vault list TOML file
        file: PathBuf,
        /// Create the missing tasks instead of just reporting
        #[arg(long)]
        apply: bool,
        /// Also cancel stale tasks (requires --apply)
        #[arg(long, requires = "apply")]
        prune: bool,
    },
}

/// Execute the `scythe init` command: write a config template.
fn cmd_init(force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let path = config::write_config_template()?;

    println!("Config written to {}", path.display());
    println!();
    println!("Next: fill in [admin].private_key and add a [chains.<name>] table.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // --verbose widens the default filter; RUST_LOG still wins when set.
    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    match cli.command {
        Commands::Init { force } => {
            cmd_init(force)?;
        }
        Commands::Chains => {
            chains_cmd::run_chains()?;
        }
        Commands::List => {
            let client = connect::connect_client(cli.chain.as_deref(), cli.verbose).await?;
            list_cmd::run_list(&client).await?;
        }
        Commands::TaskId { vault } => {
            let client = connect::connect_client(cli.chain.as_deref(), cli.verbose).await?;
            taskid_cmd::run_task_id(&client, &vault).await?;
        }
        Commands::Create { file } => {
            let client = connect::connect_client(cli.chain.as_deref(), cli.verbose).await?;
            create_cmd::run_create(&client, &file).await?;
        }
        Commands::Cancel { task_ids } => {
            let client = connect::connect_client(cli.chain.as_deref(), cli.verbose).await?;
            cancel_cmd::run_cancel(&client, &task_ids).await?;
        }
        Commands::Sync { file, apply, prune } => {
            let client = connect::connect_client(cli.chain.as_deref(), cli.verbose).await?;
            sync_cmd::run_sync(&client, &file, apply, prune).await?;
        }
    }

    Ok(())
}
