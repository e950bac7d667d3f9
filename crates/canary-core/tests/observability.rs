//! Structured tracing events emitted by the judge service.

use canary_core::obs::{
    emit_comparison_read, emit_comparison_started, emit_execution_finished, emit_judge_invoked,
    emit_request_failed, emit_stage_finished, judge_span, JudgeSpan,
};
use tracing_test::traced_test;

#[traced_test]
#[test]
fn judge_invoked_logs_judge_and_score() {
    emit_judge_invoked("mean-delta-v1", 3, "Pass", 100.0);
    assert!(logs_contain("judge.invoked"));
    assert!(logs_contain("mean-delta-v1"));
}

#[traced_test]
#[test]
fn comparison_events_carry_execution_id() {
    emit_comparison_started("exec-1", "cfg-1");
    emit_comparison_read("exec-1", false, 2);
    assert!(logs_contain("comparison.started"));
    assert!(logs_contain("comparison.read"));
    assert!(logs_contain("exec-1"));
}

#[traced_test]
#[test]
fn execution_progress_events() {
    emit_stage_finished("exec-2", "judge1", "SUCCEEDED", 12);
    emit_execution_finished("exec-2", "TERMINAL", 40);
    assert!(logs_contain("stage.finished"));
    assert!(logs_contain("TERMINAL"));
}

#[traced_test]
#[test]
fn request_failure_is_a_warning() {
    emit_request_failed("judge", &"Unable to resolve canary judge 'x'.");
    assert!(logs_contain("WARN"));
    assert!(logs_contain("request.failed"));
}

#[traced_test]
#[test]
fn events_inside_span_carry_its_fields() {
    let _outer = judge_span("judge", "cfg-span").entered();
    let _inner = JudgeSpan::enter("DreddJudge");
    emit_judge_invoked("DreddJudge", 1, "Fail", 0.0);
    assert!(logs_contain("cfg-span"));
}
