//! State module for tracking run progress
//!
//! The only state a run keeps is how much work has happened since the last
//! checkpoint. It lives on the orchestrating loop and is never persisted; a
//! restarted crawl is steered by its page range and the table contents.

mod counter;

pub use counter::CheckpointCounter;
