// Chat module - conversation state, browsing sequencer and the run loop
pub mod browse;
pub mod conversation;
pub mod session;

pub use browse::{remove_candidate, BrowsePhase, BrowseSequencer};
pub use conversation::{Conversation, RunOutcome, RunOverrides};
