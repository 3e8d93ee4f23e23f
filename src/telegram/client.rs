use crate::config::Credentials;
use crate::error::TelegramError;
use crate::models::{ApiResponse, ParseMode, SendMessageRequest};
use crate::telegram::formatter::redact_token;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const GET_UPDATES_METHOD: &str = "getUpdates";
const SEND_MESSAGE_METHOD: &str = "sendMessage";

/// Bot API client bound to one bot and one chat.
#[derive(Debug, Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    credentials: Credentials,
    api_url: String,
    verbose: bool,
}

impl TelegramClient {
    pub fn new(credentials: Credentials, verbose: bool) -> Result<Self, TelegramError> {
        Self::with_timeout(credentials, verbose, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(
        credentials: Credentials,
        verbose: bool,
        timeout: Duration,
    ) -> Result<Self, TelegramError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(TelegramError::ClientBuild)?;

        Ok(Self {
            http,
            credentials,
            api_url: TELEGRAM_API_URL.to_string(),
            verbose,
        })
    }

    /// Points the client at a different Bot API server.
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.credentials.bot_token, method)
    }

    /// Validates the bot token with a read-only `getUpdates` call.
    /// Nothing is delivered to the chat.
    pub async fn test_connection(&self) -> Result<(), TelegramError> {
        let url = self.method_url(GET_UPDATES_METHOD);
        self.trace_request(&url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(TelegramError::network)?;

        self.read_envelope(response).await?;

        if self.verbose {
            tracing::info!("Bot token is valid");
        }
        Ok(())
    }

    /// Delivers `text` to the configured chat.
    pub async fn send_message(
        &self,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<(), TelegramError> {
        let url = self.method_url(SEND_MESSAGE_METHOD);

        let body = serde_json::to_vec(&SendMessageRequest {
            chat_id: &self.credentials.chat_id,
            text,
            parse_mode,
        })
        .map_err(TelegramError::Serialization)?;

        self.trace_request(&url);

        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(TelegramError::network)?;

        self.read_envelope(response).await?;
        Ok(())
    }

    fn trace_request(&self, url: &str) {
        if self.verbose {
            tracing::info!(
                "Sending request to: {}",
                redact_token(url, &self.credentials.bot_token)
            );
        }
    }

    /// The HTTP status is not checked on its own: the envelope decides.
    async fn read_envelope(
        &self,
        response: reqwest::Response,
    ) -> Result<ApiResponse, TelegramError> {
        if self.verbose {
            tracing::info!("Response status: {}", response.status());
        }

        let body = response.text().await.map_err(TelegramError::network)?;

        if self.verbose {
            tracing::info!("Response body: {body}");
        }

        let envelope: ApiResponse =
            serde_json::from_str(&body).map_err(TelegramError::Decode)?;

        if !envelope.ok {
            return Err(TelegramError::Api {
                description: envelope
                    .description
                    .unwrap_or_else(|| "(no description)".to_string()),
                code: envelope.error_code.unwrap_or_default(),
            });
        }
        Ok(envelope)
    }
}
