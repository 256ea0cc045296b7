// Core module - tool model, registry, argument recovery, call budget
pub mod budget;
pub mod recover;
pub mod registry;
pub mod tool;

pub use budget::{CallBudget, DEFAULT_CALL_CEILING};
pub use recover::recover_arguments;
pub use registry::{ToolEntry, ToolRegistry};
pub use tool::{ParamType, ParameterSpec, ToolArguments, ToolHandler, ToolOutput, ToolSpec};
