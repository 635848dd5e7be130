//! Command handlers for CLI operations
//!
//! - serve: run the HTTP chat server
//! - chat: interactive quiz in the terminal
//! - history: list stored threads or show one
//! - config: print the effective configuration

use anyhow::{bail, Context, Result};
use sdk::{TutorError, TutorErrorExt};
use serde_json::json;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::config::Config;
use crate::llm::MessageRole;
use crate::quiz::QuizWorkflow;
use crate::server;
use crate::store::{open_store, ConversationThread};

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Run the HTTP server until Ctrl+C
pub async fn handle_serve(mut config: Config, bind: Option<String>) -> Result<()> {
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    let addr = config.bind_addr()?;

    let workflow = QuizWorkflow::from_config(&config)
        .await
        .context("Failed to initialize quiz workflow")?;

    server::serve(Arc::new(workflow), addr, config.server.cors).await?;
    Ok(())
}

/// Interactive quiz: one question per round until the learner stops
pub async fn handle_chat(config: &Config, format: OutputFormat) -> Result<()> {
    let workflow = QuizWorkflow::from_config(config)
        .await
        .context("Failed to initialize quiz workflow")?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        let question = workflow.start().await?;
        print_turn(format, &question.thread_id, "question", &question.response)?;

        let evaluation = loop {
            prompt(&mut stdout, "Your answer: ").await?;
            let Some(line) = lines.next_line().await? else {
                return Ok(());
            };
            if line.trim().is_empty() {
                continue;
            }

            match workflow.resume(&question.thread_id, &line).await {
                Ok(evaluation) => break evaluation,
                Err(TutorError::InvalidInput(reason)) => eprintln!("{}", reason),
                Err(err) if err.is_recoverable() => {
                    tracing::warn!("Evaluation failed, answer can be resent: {}", err);
                    eprintln!("{}", err.user_hint());
                }
                Err(err) => return Err(err.into()),
            }
        };

        print_turn(format, &evaluation.thread_id, "evaluation", &evaluation.response)?;

        prompt(&mut stdout, "Another question? [Y/n] ").await?;
        match lines.next_line().await? {
            Some(line) if line.trim().eq_ignore_ascii_case("n") => return Ok(()),
            Some(_) => {}
            None => return Ok(()),
        }
    }
}

async fn prompt(stdout: &mut tokio::io::Stdout, text: &str) -> Result<()> {
    stdout.write_all(text.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}

fn print_turn(format: OutputFormat, thread_id: &str, kind: &str, text: &str) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!();
            println!("{}", text);
            println!();
        }
        OutputFormat::Json => {
            let output = json!({
                "thread_id": thread_id,
                "kind": kind,
                "text": text,
            });
            println!("{}", serde_json::to_string(&output)?);
        }
    }
    Ok(())
}

/// List recent threads, or print every message of `thread_id`
pub async fn handle_history(
    config: &Config,
    thread_id: Option<String>,
    limit: usize,
    format: OutputFormat,
) -> Result<()> {
    if config.store.backend != "sqlite" {
        bail!(
            "History needs a persistent store; set store.backend = \"sqlite\" (current: {})",
            config.store.backend
        );
    }

    let store = open_store(&config.store)
        .await
        .context("Failed to open thread store")?;

    let Some(thread_id) = thread_id else {
        let threads = store
            .list(limit)
            .await
            .context("Failed to list threads")?;

        match format {
            OutputFormat::Text => {
                if threads.is_empty() {
                    println!("No threads in history");
                    return Ok(());
                }

                println!("Thread History (last {} threads):", limit);
                println!();
                for thread in &threads {
                    println!("Thread ID: {}", thread.id);
                    println!("  Status: {}", thread.status);
                    println!("  Messages: {}", thread.message_count);
                    println!("  Updated: {}", format_timestamp(thread.updated_at));
                    println!();
                }
            }
            OutputFormat::Json => {
                let output = json!({
                    "threads": threads,
                    "count": threads.len(),
                    "limit": limit
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
        }
        return Ok(());
    };

    let thread = store
        .load(&thread_id)
        .await
        .context("Failed to load thread")?
        .with_context(|| format!("Thread not found: {}", thread_id))?;

    print_thread(&thread, format)
}

fn print_thread(thread: &ConversationThread, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("Thread ID: {}", thread.id);
            println!("  Status: {}", thread.status());
            println!("  Created: {}", format_timestamp(thread.created_at));
            println!("  Updated: {}", format_timestamp(thread.updated_at));
            println!();

            for message in &thread.messages {
                let label = match message.role {
                    MessageRole::Assistant => "Tutor",
                    MessageRole::Human => "You",
                    MessageRole::System => "System",
                };
                println!("[{}]", label);
                println!("{}", message.content);
                println!();
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(thread)?);
        }
    }
    Ok(())
}

/// Print the configuration after defaults, expansion and validation
pub fn handle_config(config: &Config, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            let rendered =
                toml::to_string_pretty(config).context("Failed to serialize configuration")?;
            println!("{}", rendered);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
    }
    Ok(())
}

fn format_timestamp(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}
