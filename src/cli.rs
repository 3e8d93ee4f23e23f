use crate::config::{self, ConfigPaths, Resolution};
use crate::error::CliError;
use crate::models::ParseMode;
use crate::telegram::formatter::mask_token;
use crate::telegram::{TELEGRAM_API_URL, TelegramClient};
use anyhow::Context;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "notify",
    version,
    about = "Send a notification to a Telegram chat"
)]
pub struct Cli {
    /// Test the Telegram connection without sending a message
    #[arg(long)]
    pub test: bool,

    /// Enable verbose output for debugging
    #[arg(short, long)]
    pub verbose: bool,

    /// Let Telegram render the message as HTML or Markdown
    #[arg(long, value_enum)]
    pub parse_mode: Option<ParseMode>,

    /// Message to send (words are joined with single spaces)
    #[arg(value_name = "MESSAGE")]
    pub message: Vec<String>,
}

impl Cli {
    pub fn message_text(&self) -> String {
        join_message(&self.message)
    }
}

pub fn join_message<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolves credentials from the standard locations and runs the requested operation.
pub async fn run(cli: &Cli) -> anyhow::Result<()> {
    let resolution = config::resolve(&ConfigPaths::default_locations());
    execute(cli, resolution, TELEGRAM_API_URL).await
}

pub async fn execute(cli: &Cli, resolution: Resolution, api_url: &str) -> anyhow::Result<()> {
    if cli.verbose {
        for diagnostic in &resolution.diagnostics {
            tracing::info!("{diagnostic}");
        }
    }

    let credentials = resolution.credentials;
    credentials.ensure_complete()?;

    if cli.verbose {
        tracing::info!(
            "Configuration loaded: Bot token: {}, Chat ID: {}",
            mask_token(&credentials.bot_token),
            credentials.chat_id
        );
    }

    let client = TelegramClient::new(credentials, cli.verbose)?.with_api_url(api_url);

    if cli.test {
        if cli.verbose {
            tracing::info!("Test mode enabled. Testing connection to Telegram...");
        }
        client
            .test_connection()
            .await
            .context("Connection test failed")?;
        println!("Connection test successful! Configuration is valid.");
        return Ok(());
    }

    let message = cli.message_text();
    if message.trim().is_empty() {
        return Err(CliError::EmptyMessage.into());
    }

    client
        .send_message(&message, cli.parse_mode)
        .await
        .context("Failed to send message")?;

    if cli.verbose {
        println!("Message sent successfully!");
    }
    Ok(())
}
