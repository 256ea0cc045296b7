//! Conversation orchestrator for tool-augmented chat-completion APIs.
//!
//! A [`Conversation`] owns the message history, a registry of callable
//! tools and a call budget; [`Conversation::run`] drives the model loop
//! until it answers in plain text or a terminating tool fires. Optional
//! extras: a forced search-then-fetch browsing mode backed by two built-in
//! web tools, and one-shot knowledge priming from a URL.
//!
//! ```no_run
//! use std::sync::Arc;
//! use toolchat::{ClientConfig, Conversation, HttpTransport, RunOverrides};
//!
//! # async fn example() -> Result<(), toolchat::ChatError> {
//! let config = ClientConfig::from_env()?;
//! let transport = HttpTransport::new(&config);
//! let mut conv = Conversation::new(config);
//! conv.add_user_message("What is the capital of Norway?");
//! let outcome = conv.run(&transport, RunOverrides::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod chat;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod models;
pub mod tools;

pub use api::{ChatTransport, HttpTransport};
pub use chat::{Conversation, RunOutcome, RunOverrides};
pub use config::ClientConfig;
pub use crate::core::budget::DEFAULT_CALL_CEILING;
pub use crate::core::recover::recover_arguments;
pub use crate::core::registry::ToolRegistry;
pub use crate::core::tool::{ParamType, ToolArguments, ToolHandler, ToolOutput, ToolSpec};
pub use error::ChatError;
pub use logging::ConversationLogger;
pub use models::{ChatRequest, ChatResponse, Message, ToolChoice};
