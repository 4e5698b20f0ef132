//! Conversation state machine for the upload and search flows.

pub mod machine;
pub mod state;
pub mod validate;

pub use machine::{Event, Outcome, Reply, advance};
pub use state::{Flow, SearchState, UploadState};
