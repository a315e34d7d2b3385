//! Server initialization utilities
//!
//! Provides standardized tracing setup and the `serve_stdio!` macro
//! for consistent extension server startup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging for extension servers
///
/// Sets up logging to stderr (stdout is reserved for MCP protocol) with:
/// - Formatted output without ANSI colors (for clean logs)
/// - Environment-based filtering via RUST_LOG
/// - Default log level of `info` for the specified crate and this one
///
/// Set `LOG_FORMAT=json` for structured JSON output.
pub fn init_tracing(crate_name: &str) -> anyhow::Result<()> {
    let directive = format!("{}=info", crate_name);
    let filter = EnvFilter::from_default_env()
        .add_directive(directive.parse()?)
        .add_directive("dxt_common=info".parse()?);

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);

    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .try_init()?;
    }

    Ok(())
}

/// Macro for standardized extension server startup
///
/// Expands to a `#[tokio::main] async fn main()` that:
/// 1. Initializes tracing to stderr
/// 2. Builds the server with `<$server_type>::from_env()`
/// 3. Serves via stdio transport until EOF or Ctrl-C
///
/// Any startup or transport failure is logged and ends the process with
/// exit status 1.
///
/// ```rust,ignore
/// dxt_common::serve_stdio!(FsSandboxServer, "fs_sandbox");
/// ```
#[macro_export]
macro_rules! serve_stdio {
    ($server_type:ty, $crate_name:expr) => {
        async fn run() -> anyhow::Result<()> {
            use rmcp::ServiceExt;

            tracing::info!(concat!("Starting ", $crate_name, " MCP Server"));

            let server = <$server_type>::from_env()?;
            let service = server.serve(rmcp::transport::stdio()).await?;

            tracing::info!("Server running, waiting for requests...");

            tokio::select! {
                res = service.waiting() => {
                    res?;
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupted");
                }
            }

            tracing::info!("Server shutting down");
            Ok(())
        }

        #[tokio::main]
        async fn main() {
            if let Err(e) = $crate::init_tracing($crate_name) {
                eprintln!("failed to initialize logging: {e}");
                std::process::exit(1);
            }

            if let Err(e) = run().await {
                tracing::error!(error = %e, "server failed");
                std::process::exit(1);
            }
        }
    };
}
