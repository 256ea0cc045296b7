use std::sync::Arc;

use serde_json::{Map, Value};

use crate::chat::browse::BrowseSequencer;
use crate::config::ClientConfig;
use crate::core::budget::CallBudget;
use crate::core::registry::ToolRegistry;
use crate::core::tool::{ToolHandler, ToolSpec};
use crate::error::ChatError;
use crate::logging::ConversationLogger;
use crate::models::Message;
use crate::tools::web::{web_client, FetchPageTool, WebSearchTool};

/// Optional per-run parameter overrides. `forced_tool` applies to the next
/// issued request only, and is dropped when the browsing sequencer has just
/// mandated a step of its own.
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub forced_tool: Option<String>,
    pub call_ceiling: Option<u32>,
}

/// Final result of an orchestration run.
#[derive(Debug)]
pub enum RunOutcome {
    /// The assistant's final message (no-tool-call exit, or the message
    /// that invoked an end-of-conversation tool).
    Answer(Message),
    /// The parsed arguments of an arguments-only tool.
    Arguments(Map<String, Value>),
}

/// One in-memory conversation and everything its orchestration run needs:
/// the message sequence, registered tools, generation configuration, the
/// browsing overlay and the call budget. Owned exclusively by the run that
/// drives it; there is no shared mutable state.
pub struct Conversation {
    pub(crate) config: ClientConfig,
    pub(crate) messages: Vec<Message>,
    pub(crate) registry: ToolRegistry,
    pub(crate) browse: BrowseSequencer,
    pub(crate) budget: CallBudget,
    pub(crate) priming_url: Option<String>,
    pub(crate) primed: bool,
    pub(crate) logger: Option<ConversationLogger>,
    pub(crate) web: reqwest::Client,
}

impl Conversation {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            messages: Vec::new(),
            registry: ToolRegistry::new(),
            browse: BrowseSequencer::disabled(),
            budget: CallBudget::default(),
            priming_url: None,
            primed: false,
            logger: None,
            web: web_client(),
        }
    }

    pub fn add_system_message(&mut self, content: impl Into<String>) {
        self.messages.push(Message::system(content));
    }

    pub fn add_user_message(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Register a caller-defined tool.
    pub fn register_tool(
        &mut self,
        spec: ToolSpec,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<(), ChatError> {
        self.registry.register(spec, handler)
    }

    /// Enable browsing: registers the built-in search and fetch tools and
    /// arms the forced search-then-fetch order. `search_only` skips the
    /// mandated fetch step.
    pub fn enable_browsing(&mut self, search_only: bool) -> Result<(), ChatError> {
        let endpoint = self.config.require_search_url()?.to_string();
        self.registry.register(
            WebSearchTool::spec(),
            Arc::new(WebSearchTool::new(endpoint)),
        )?;
        self.registry
            .register(FetchPageTool::spec(), Arc::new(FetchPageTool::new()))?;
        self.browse = BrowseSequencer::enabled(search_only);
        Ok(())
    }

    /// Configure a knowledge-priming URL, fetched once at the start of the
    /// first loop iteration and injected as a system message.
    pub fn set_priming_url(&mut self, url: impl Into<String>) {
        self.priming_url = Some(url.into());
        self.primed = false;
    }

    pub fn set_logger(&mut self, logger: ConversationLogger) {
        self.logger = Some(logger);
    }

    /// Flush and close the transcript logger, returning its path.
    pub async fn shutdown_logger(&mut self) -> Option<std::path::PathBuf> {
        let mut logger = self.logger.take()?;
        logger.shutdown().await;
        Some(logger.path().to_path_buf())
    }

    /// Completion requests issued so far in this conversation.
    pub fn calls_made(&self) -> u32 {
        self.budget.calls_made()
    }
}
