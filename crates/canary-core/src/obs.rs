//! Structured observability hooks for judge service lifecycle events.
//!
//! This module provides:
//! - Operation and execution spans, plus the `JudgeSpan` RAII guard for
//!   synchronous judge invocations
//! - Emission functions for judge invocations, comparison kickoff and reads,
//!   and execution progress
//!
//! Events are emitted at `info!` level, failures at `warn!`.

use tracing::{info, warn};

/// Span covering one judge service operation. Attach it to futures with
/// `tracing::Instrument`.
pub fn judge_span(operation: &str, canary_config_id: &str) -> tracing::Span {
    tracing::info_span!(
        "canary.judge",
        operation = %operation,
        canary_config_id = %canary_config_id,
    )
}

/// Span covering work tied to one execution.
pub fn execution_span(execution_id: &str) -> tracing::Span {
    tracing::info_span!("canary.execution", execution_id = %execution_id)
}

/// RAII guard that enters a span around a synchronous judge invocation.
///
/// The guard is not `Send`; never hold it across an `.await`.
///
/// ```ignore
/// let _span = JudgeSpan::enter("mean-delta-v1");
/// // events below carry judge_name = "mean-delta-v1"
/// ```
pub struct JudgeSpan {
    _span: tracing::span::EnteredSpan,
}

impl JudgeSpan {
    pub fn enter(judge_name: &str) -> Self {
        let span = tracing::info_span!("canary.invoke", judge_name = %judge_name);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: a judge ran to completion.
pub fn emit_judge_invoked(judge_name: &str, metric_count: usize, classification: &str, score: f64) {
    info!(
        event = "judge.invoked",
        judge_name = %judge_name,
        metric_count = metric_count,
        classification = %classification,
        score = score,
    );
}

/// Emit event: a comparison execution was handed to the execution engine.
pub fn emit_comparison_started(execution_id: &str, canary_config_id: &str) {
    info!(
        event = "comparison.started",
        execution_id = %execution_id,
        canary_config_id = %canary_config_id,
    );
}

/// Emit event: a comparison result was read.
pub fn emit_comparison_read(execution_id: &str, has_result: bool, exception_count: usize) {
    info!(
        event = "comparison.read",
        execution_id = %execution_id,
        has_result = has_result,
        exception_count = exception_count,
    );
}

pub fn emit_stage_finished(execution_id: &str, ref_id: &str, status: &str, duration_ms: u64) {
    info!(
        event = "stage.finished",
        execution_id = %execution_id,
        ref_id = %ref_id,
        status = %status,
        duration_ms = duration_ms,
    );
}

pub fn emit_execution_finished(execution_id: &str, status: &str, duration_ms: u64) {
    info!(
        event = "execution.finished",
        execution_id = %execution_id,
        status = %status,
        duration_ms = duration_ms,
    );
}

/// Emit event: an operation failed (warning level).
pub fn emit_request_failed(operation: &str, error: &dyn std::fmt::Display) {
    warn!(event = "request.failed", operation = %operation, error = %error);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spans_enter_and_drop() {
        let _outer = execution_span("exec-1").entered();
        let _inner = JudgeSpan::enter("mean-delta-v1");
    }
}
