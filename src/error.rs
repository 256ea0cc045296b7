use thiserror::Error;

/// Fatal failure classes for an orchestration run.
///
/// Recoverable conditions (unusable tool arguments, an unreachable page
/// during browsing) are handled in place by the loop and never appear here.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Missing credential, or browsing enabled without its requirements met.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Terminal HTTP status, or transient-status retries exhausted.
    #[error("transport failure: {reason}")]
    Transport {
        status: Option<u16>,
        reason: String,
    },

    /// The model requested a tool that was never registered.
    #[error("unknown tool requested by model: '{0}'")]
    UnknownTool(String),

    /// The call budget guard denied a further completion request.
    #[error("call ceiling of {ceiling} completion requests reached")]
    BudgetExceeded { ceiling: u32 },
}

impl ChatError {
    pub fn transport(status: Option<u16>, reason: impl Into<String>) -> Self {
        ChatError::Transport {
            status,
            reason: reason.into(),
        }
    }
}
