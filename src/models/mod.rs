// Models module - data structures for API communication
pub mod requests;
pub mod responses;
pub mod types;

// Re-export commonly used types
pub use requests::{ChatRequest, FunctionDef, Tool, ToolChoice};
pub use responses::{ChatResponse, Choice, Usage};
pub use types::{FunctionCall, Message, ToolCall};
