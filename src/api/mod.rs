// API module - transport to the chat-completion endpoint
pub mod client;

pub use client::{ChatTransport, HttpTransport, MAX_RETRIES};
