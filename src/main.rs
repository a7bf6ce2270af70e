//! MDChat - terminal client for the MD Agents chat backend
//!
#![doc = "MDChat - terminal client for the MD Agents chat backend"]
#![doc = "Main entry point for the mdchat application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mdchat::cli::{Cli, Commands};
use mdchat::commands;
use mdchat::config::Config;
use mdchat::MdChatError;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    let result = run(cli.command, &config).await;
    if let Err(e) = &result {
        if e.downcast_ref::<MdChatError>().is_some_and(MdChatError::is_network) {
            eprintln!(
                "Could not talk to the MD Agents backend at {}. Is it running?",
                config.backend.base_url
            );
        }
    }
    result
}

async fn run(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Chat { resume } => {
            if let Some(r) = &resume {
                tracing::debug!("Resuming conversation: {}", r);
            }
            commands::chat::run_chat(config.clone(), resume).await
        }
        Commands::List { json } => {
            tracing::info!("Listing conversations");
            commands::history::list_conversations(config, json).await
        }
        Commands::History { id, json } => {
            tracing::info!("Showing history for {}", id);
            commands::history::show_history(config, &id, json).await
        }
        Commands::Delete { id, yes } => {
            tracing::info!("Deleting conversation {}", id);
            commands::history::delete_conversation(config, &id, yes).await
        }
        Commands::Export { id, output, format } => {
            tracing::info!("Exporting conversation {}", id);
            commands::export::export_conversation(config, &id, output, format.map(Into::into))
                .await?;
            Ok(())
        }
        Commands::Login => commands::auth::set_logged_in(config, true),
        Commands::Logout => commands::auth::set_logged_in(config, false),
    }
}

/// Initialize tracing subscriber with environment filter
///
/// Logs go to stderr so they do not interleave with chat output.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "mdchat=debug" } else { "mdchat=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
