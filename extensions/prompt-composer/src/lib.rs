//! prompt-composer library
//!
//! Keeps named prompt blocks in memory and composes them into a single
//! prompt, filling `{{placeholders}}` from caller-supplied variables.
//! Calls share the same rate limiting and audit trail as the other
//! extensions.

pub mod compose;
pub mod config;
pub mod handlers;
pub mod params;
pub mod server;
pub mod store;
pub mod types;

pub use config::Config;
pub use server::PromptComposerServer;
pub use store::BlockStore;
pub use types::{Block, ComposerError, ComposerResult};

pub use params::*;
