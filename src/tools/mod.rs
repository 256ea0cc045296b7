// Tools module - built-in tool implementations
pub mod web;

pub use web::{FetchPageTool, SearchHit, WebSearchTool, FETCH_TOOL, SEARCH_TOOL};
