//! Span helpers that tag every log line of a command invocation.

use std::future::Future;

use tracing::{Instrument, Span};

use crate::init::build_sha;

/// Span covering one CLI command, tagged with its label and trace identifier.
#[must_use]
pub fn command_span(command: &str, trace_id: &str) -> Span {
    tracing::info_span!(
        "command",
        command = %command,
        trace_id = %trace_id,
        build_sha = %build_sha()
    )
}

/// Run `fut` inside [`command_span`].
pub async fn in_command_span<Fut, T>(command: &str, trace_id: &str, fut: Fut) -> T
where
    Fut: Future<Output = T>,
{
    fut.instrument(command_span(command, trace_id)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_command_span_returns_future_output() {
        let value = in_command_span("health", "trace-1", async { 41 + 1 }).await;
        assert_eq!(value, 42);
    }

    #[test]
    fn command_span_can_be_entered_without_a_subscriber() {
        let span = command_span("login", "trace-2");
        let _entered = span.enter();
    }
}
