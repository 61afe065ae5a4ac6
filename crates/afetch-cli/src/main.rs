//! afetch - Main entry point

use afetch_cli::{App, Cli, Commands, ConfigCommand};
use afetch_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use clap::Parser;
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    // .env is optional
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if cli.markdown_help {
        println!("{}", clap_markdown::help_markdown::<Cli>());
        return;
    }

    let Some(command) = cli.command.as_ref() else {
        eprintln!("Error: A subcommand is required");
        eprintln!();
        eprintln!("For more information, try '--help'.");
        process::exit(2);
    };

    let log_config = LogConfig::builder()
        .level(if cli.verbose { LogLevel::Debug } else { LogLevel::Warn })
        .output(LogOutput::Console)
        .log_file_prefix("afetch".to_string())
        .build();

    // Environment variables take precedence
    let log_config = log_config.clone().from_env_over().unwrap_or(log_config);

    // The CLI works without logging
    let _ = init_logging(&log_config);

    if let Err(e) = execute_command(command).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Execute the CLI command
async fn execute_command(command: &Commands) -> afetch_cli::Result<()> {
    match command {
        Commands::Fetch { .. } => {
            let app = App::from_env()?;
            match command.fetch_args() {
                Some(args) => afetch_cli::commands::fetch::run(&args, &app).await,
                None => Ok(()),
            }
        },

        Commands::Prompt => {
            let mut app = App::from_env()?;
            afetch_cli::commands::prompt::run(&mut app).await
        },

        Commands::Cached { path } => afetch_cli::commands::cached::run(path.clone()).await,

        Commands::Config { command } => match command {
            ConfigCommand::Get { key } => afetch_cli::commands::config::get(key.clone()).await,
            ConfigCommand::Set { key, value } => {
                afetch_cli::commands::config::set(key.clone(), value.clone()).await
            },
            ConfigCommand::Show => afetch_cli::commands::config::show().await,
            ConfigCommand::Path => afetch_cli::commands::config::path().await,
        },
    }
}
