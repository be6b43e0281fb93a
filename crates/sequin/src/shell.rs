// SPDX-FileCopyrightText: 2026 Sequin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `sequin shell` command implementation.
//!
//! Interactive REPL with readline history and a session held open for the
//! whole run, so follow-ups ("show me the sql", "export that") work the way
//! they do in chat.

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::info;

use sequin_config::SequinConfig;
use sequin_core::SequinError;

use crate::app::App;
use crate::render;

pub async fn run_shell(config: &SequinConfig) -> Result<(), SequinError> {
    let app = App::build(config).await?;
    let session_id = app.history.create_session().await;
    info!(%session_id, "shell session started");

    println!(
        "{} interactive shell. {} for commands, {} to leave.",
        config.agent.name.cyan().bold(),
        "/help".bold(),
        "/quit".bold()
    );

    let mut editor = DefaultEditor::new()
        .map_err(|e| SequinError::Internal(format!("failed to start line editor: {e}")))?;
    let prompt = format!("{} ", "sequin>".cyan().bold());

    loop {
        match editor.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line);

                match line {
                    "/quit" | "/exit" => break,
                    "/help" => print_help(),
                    "/clear" => {
                        app.history.clear_history(&session_id).await;
                        app.results.clear(&session_id).await;
                        println!("session cleared");
                    }
                    "/stats" => print_stats(&app, &session_id).await,
                    _ => {
                        let envelope = app
                            .service
                            .run(line, Some(session_id.clone()))
                            .await;
                        println!("{}", render::render_envelope(&envelope));
                    }
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                return Err(SequinError::Internal(format!("readline failed: {e}")));
            }
        }
    }

    println!("bye");
    Ok(())
}

fn print_help() {
    println!("  /clear  forget this session's history and cached results");
    println!("  /stats  show session statistics");
    println!("  /quit   leave the shell");
    println!("anything else is asked as a question");
}

async fn print_stats(app: &App, session_id: &str) {
    match app.history.get_session_stats(session_id).await {
        Some(stats) => {
            println!("session:        {}", stats.session_id);
            println!("started:        {}", stats.created_at.to_rfc3339());
            println!("last activity:  {}", stats.last_activity.to_rfc3339());
            println!("messages total: {}", stats.total_messages);
            println!("in window:      {}", stats.current_message_count);
        }
        None => println!("no statistics recorded for this session"),
    }
}
