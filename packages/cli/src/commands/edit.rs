use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use outliner::{DocumentProvider, EditSession, SessionOptions};
use serde_json::Value;
use std::path::Path;

use super::open_local;

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Document id
    pub id: String,

    /// New document content: JSON, or plain text stored as a JSON string
    pub content: String,

    /// Commit immediately instead of waiting out the quiet period
    #[arg(long)]
    pub no_wait: bool,
}

pub async fn edit(args: EditArgs, cwd: &Path) -> Result<()> {
    let (config, provider) = open_local(cwd, &args.id)?;

    let conn_sub = provider.on_connection_state_change(Box::new(|state| {
        println!("  {} {}", "↻".cyan(), state);
    }));
    let error_sub = provider.on_persist_error(|e| {
        eprintln!("  {} {}", "✗".red(), e);
    });

    let options = SessionOptions::from_config(&config).with_on_change(|value: &Value| {
        tracing::info!(bytes = value.to_string().len(), "document changed");
    });
    let mut session = EditSession::bind(provider.clone(), options);

    if session.is_read_only() {
        session.unbind().await;
        return Err(anyhow!("{} is configured read-only", provider.storage_key()));
    }

    session.connect().await?;
    session.edit_text(&args.content)?;

    if args.no_wait {
        provider.flush();
    } else {
        println!(
            "  {} Waiting {}ms for the write to settle",
            "…".bright_black(),
            provider.quiet_period().as_millis()
        );
        tokio::time::sleep(provider.quiet_period()).await;
        // Commits now if the timer task has not run yet
        provider.flush();
    }

    println!("{}", session.render_text());
    session.unbind().await;

    conn_sub.unsubscribe();
    error_sub.unsubscribe();

    println!("  {} Saved {}", "✓".green(), provider.storage_key());
    Ok(())
}
