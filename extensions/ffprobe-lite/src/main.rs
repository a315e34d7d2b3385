//! ffprobe-lite - Media metadata desktop extension
//!
//! Serves probe_media over MCP stdio for files under `ALLOWED_DIRS`.

use ffprobe_lite::FfprobeLiteServer;

dxt_common::serve_stdio!(FfprobeLiteServer, "ffprobe_lite");
