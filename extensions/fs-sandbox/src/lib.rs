//! fs-sandbox library
//!
//! Sandboxed filesystem extension with security controls: every path is
//! checked against an allowlist (lexically and after symlink resolution),
//! reads and writes are size-capped, calls are rate-limited per client and
//! each call leaves one audit record.
//!
//! # Usage as Library
//!
//! ```rust,ignore
//! use dxt_common::{AuditLog, EmbeddableMcp};
//! use fs_sandbox::{Config, FsSandboxServer};
//!
//! let mut config = Config::default();
//! config.paths.allowed = vec!["~/Documents".into()];
//! let server = FsSandboxServer::with_config(config, AuditLog::stderr())?;
//! let result = server
//!     .call_tool("default", "read_file", serde_json::json!({ "path": "~/Documents/a.txt" }))
//!     .await;
//! ```

pub mod capped;
pub mod config;
pub mod handlers;
pub mod params;
pub mod prompts;
pub mod sandbox;
pub mod server;
pub mod types;

// Re-export main server type
pub use config::Config;
pub use sandbox::{ResolvedPath, Sandbox};
pub use server::FsSandboxServer;
pub use types::{SandboxError, SandboxResult};

// Re-export parameter types for direct API usage
pub use params::*;
