// SPDX-FileCopyrightText: 2026 Sequin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sequin - a natural-language metrics chatbot over SQL.
//!
//! Binary entry point: one-shot questions, an interactive shell, and
//! configuration inspection.

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use sequin_core::SequinError;

mod app;
mod render;
mod shell;

/// Sequin - ask questions about your app metrics in plain language.
#[derive(Parser, Debug)]
#[command(name = "sequin", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a single question and print the response.
    Ask {
        /// The question, in plain language.
        question: Vec<String>,
        /// Reuse an existing session id instead of starting fresh.
        #[arg(long)]
        session: Option<String>,
    },
    /// Launch an interactive session.
    Shell,
    /// Print the resolved configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match sequin_config::load_and_validate() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            std::process::exit(1);
        }
    };

    // RUST_LOG wins over the configured level.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.agent.log_level.clone()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Some(Commands::Ask { question, session }) => {
            run_ask(&config, question.join(" "), session).await
        }
        Some(Commands::Shell) => shell::run_shell(&config).await,
        Some(Commands::Config) => run_config(&config),
        None => {
            println!("sequin: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {e}", "error:".red().bold());
        std::process::exit(1);
    }
}

async fn run_ask(
    config: &sequin_config::SequinConfig,
    question: String,
    session: Option<String>,
) -> Result<(), SequinError> {
    if question.trim().is_empty() {
        return Err(SequinError::Config("no question given".to_string()));
    }
    let app = app::App::build(config).await?;
    let envelope = app.service.run(&question, session).await;
    println!("{}", render::render_envelope(&envelope));
    Ok(())
}

fn run_config(config: &sequin_config::SequinConfig) -> Result<(), SequinError> {
    let mut shown = config.clone();
    if shown.backend.api_key.is_some() {
        shown.backend.api_key = Some("<redacted>".to_string());
    }
    let rendered = toml::to_string_pretty(&shown)
        .map_err(|e| SequinError::Internal(format!("failed to render config: {e}")))?;
    print!("{rendered}");
    Ok(())
}
