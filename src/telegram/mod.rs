pub mod client;
pub mod formatter;

pub use client::{REQUEST_TIMEOUT, TELEGRAM_API_URL, TelegramClient};
