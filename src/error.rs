use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Cannot read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Missing Telegram {}. Configure it in ~/.notify.conf, /etc/notify.conf, \
         or via the TELEGRAM_BOT_TOKEN / TELEGRAM_CHAT_ID environment variables.",
        missing.join(" and ")
    )]
    MissingCredentials { missing: Vec<&'static str> },
}

#[derive(Error, Debug)]
pub enum TelegramError {
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("failed to decode API response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Telegram API error: {description} (code: {code})")]
    Api { description: String, code: i64 },

    #[error("failed to serialize request: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl TelegramError {
    /// Transport errors carry the request URL, which embeds the bot token.
    pub(crate) fn network(err: reqwest::Error) -> Self {
        Self::Network(err.without_url())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Network(e) if e.is_timeout())
    }
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error("No message provided. Please provide a message to send.\nUsage: notify \"your message here\"")]
    EmptyMessage,
}
