//! ffprobe-lite library
//!
//! Media metadata extension: the requested file is resolved through the
//! fs-sandbox [`Sandbox`](fs_sandbox::Sandbox) before ffprobe ever sees it,
//! each run is bounded by a timeout, and calls share the rate limiter and
//! audit trail of the other extensions.

pub mod config;
pub mod handlers;
pub mod params;
pub mod runner;
pub mod server;
pub mod types;

pub use config::Config;
pub use server::FfprobeLiteServer;
pub use types::{MediaError, MediaResult};

pub use params::*;
