//! Tool call pipeline shared by every extension server
//!
//! A call moves through `validate → rate-limit → handle → audit`:
//!
//! 1. The server parses and validates the request itself and hands the
//!    outcome to [`Dispatcher::execute`] as a `Result`.
//! 2. Valid requests are counted against the caller's rate window.
//! 3. The handler runs.
//! 4. Exactly one [`AuditRecord`](crate::AuditRecord) is written, whatever
//!    happened, and any failure becomes a uniform `is_error` tool result.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rmcp::model::CallToolResult;

use crate::audit::{AuditLog, Outcome};
use crate::rate_limit::{RateLimitConfig, RateLimitExceeded, RateLimiter};
use crate::result::error_result;

/// Error type an extension's handlers fail with
///
/// `Display` is what the caller sees, so implementations must keep resolved
/// filesystem paths and internal details out of their messages.
pub trait ToolError: std::error::Error + From<RateLimitExceeded> {
    /// Stable machine-readable code recorded in the audit trail
    fn code(&self) -> &'static str;
}

/// Rate limiter and audit sink shared by all calls of one server instance
#[derive(Clone, Debug)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

#[derive(Debug)]
struct DispatcherInner {
    limiter: RateLimiter,
    audit: AuditLog,
    started: Instant,
}

impl Dispatcher {
    pub fn new(limits: RateLimitConfig, audit: AuditLog) -> Self {
        Self {
            inner: Arc::new(DispatcherInner {
                limiter: RateLimiter::new(limits),
                audit,
                started: Instant::now(),
            }),
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.inner.limiter
    }

    pub fn uptime(&self) -> Duration {
        self.inner.started.elapsed()
    }

    /// Calls dispatched so far, successful or not
    pub fn request_count(&self) -> u64 {
        self.inner.audit.request_count()
    }

    /// Run one tool call through the pipeline
    ///
    /// `path` is the caller-supplied path the call concerns, if any; only
    /// its digest reaches the audit trail.
    pub async fn execute<R, E, F, Fut>(
        &self,
        client_id: &str,
        operation: &str,
        path: Option<&str>,
        request: Result<R, E>,
        handler: F,
    ) -> CallToolResult
    where
        E: ToolError,
        F: FnOnce(R) -> Fut,
        Fut: Future<Output = Result<CallToolResult, E>>,
    {
        let started = Instant::now();

        let outcome = match request {
            Ok(request) => match self.inner.limiter.check_now(client_id) {
                Ok(()) => handler(request).await,
                Err(exceeded) => Err(E::from(exceeded)),
            },
            Err(e) => Err(e),
        };

        match outcome {
            Ok(result) => {
                self.inner
                    .audit
                    .record(operation, Outcome::Success, started.elapsed(), path, None);
                result
            }
            Err(e) => {
                let code = e.code();
                tracing::warn!(operation, code, "tool call failed");
                self.inner.audit.record(
                    operation,
                    Outcome::Error,
                    started.elapsed(),
                    path,
                    Some(code),
                );
                error_result(format!("Error: {}", e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemorySink;
    use crate::result::{result_text, text_success};

    #[derive(Debug, thiserror::Error)]
    enum TestError {
        #[error("bad input")]
        Invalid,
        #[error("{0}")]
        Limited(#[from] RateLimitExceeded),
    }

    impl ToolError for TestError {
        fn code(&self) -> &'static str {
            match self {
                TestError::Invalid => "INVALID_INPUT",
                TestError::Limited(_) => "RATE_LIMIT_EXCEEDED",
            }
        }
    }

    fn dispatcher(quota: u32) -> (Dispatcher, MemorySink) {
        let sink = MemorySink::new();
        let dispatcher = Dispatcher::new(
            RateLimitConfig::per_minute(quota),
            AuditLog::with_writer(sink.clone()),
        );
        (dispatcher, sink)
    }

    async fn echo(value: String) -> Result<CallToolResult, TestError> {
        Ok(text_success(value))
    }

    #[tokio::test]
    async fn test_success_is_audited_once() {
        let (dispatcher, sink) = dispatcher(5);
        let result = dispatcher
            .execute("c", "echo", Some("a/b"), Ok("hi".to_string()), echo)
            .await;

        assert_eq!(result_text(&result), "hi");
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].outcome, Outcome::Success);
        assert!(!sink.contents().contains("a/b"));
    }

    #[tokio::test]
    async fn test_invalid_request_skips_handler_and_quota() {
        let (dispatcher, sink) = dispatcher(1);
        let result = dispatcher
            .execute("c", "echo", None, Err::<String, _>(TestError::Invalid), echo)
            .await;

        assert_eq!(result.is_error, Some(true));
        assert_eq!(result_text(&result), "Error: bad input");
        assert_eq!(dispatcher.limiter().window_len("c"), 0);
        assert_eq!(
            sink.records()[0]
                .details
                .as_ref()
                .and_then(|d| d.error_code.clone()),
            Some("INVALID_INPUT".to_string())
        );
    }

    #[tokio::test]
    async fn test_rate_limited_call_is_reported() {
        let (dispatcher, sink) = dispatcher(1);
        dispatcher
            .execute("c", "echo", None, Ok("1".to_string()), echo)
            .await;
        let result = dispatcher
            .execute("c", "echo", None, Ok("2".to_string()), echo)
            .await;

        assert_eq!(result.is_error, Some(true));
        assert!(result_text(&result).contains("Rate limit exceeded"));
        assert_eq!(sink.records().len(), 2);
        assert_eq!(dispatcher.request_count(), 2);
    }
}
