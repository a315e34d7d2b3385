//! fs-sandbox - Sandboxed filesystem desktop extension
//!
//! Serves read/write/list tools over MCP stdio, restricted to the
//! directories named in `ALLOWED_DIRS`.

use fs_sandbox::FsSandboxServer;

dxt_common::serve_stdio!(FsSandboxServer, "fs_sandbox");
