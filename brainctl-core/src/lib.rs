pub mod config;
pub mod conversation;
pub mod error;
pub mod extract;
pub mod loader;
pub mod pipeline;
pub mod writer;

pub use config::BrainConfig;
pub use conversation::{ContentPart, Conversation, Message, NodeMessage, Role};
pub use error::{BrainError, Result};
pub use extract::{extract_all, extract_records, DateClock, DateLabel, ExtractOptions, ExtractedRecord};
pub use loader::load_conversations;
pub use pipeline::{run, Outcome, RunOptions};
pub use writer::{needs_rollover, plan_parts, write_parts, PartLayout, PartWriter, WriteSummary};
