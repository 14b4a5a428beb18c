use mock_ledger::config::{load_config, ConfigOverrides};
use mock_ledger::trace::reader::CallTrace;
use mock_ledger::trace::recorder::{clear_call_trace, init_call_trace_from_config, is_tracing};
use mock_ledger::trace::recording::CallOutcome;
use mock_ledger::{BehaviorMock, InvocationMatcher, MethodLedger, MockError, MockObject};
use std::fs;

// The trace sink is process-wide, so everything touching it lives in one test.
#[test]
fn configured_trace_records_every_call_outcome() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config_path = dir.path().join("mock-ledger.toml");
    fs::write(
        &config_path,
        "[trace]\npath = \"traces/calls.jsonl\"\n\n[render]\nmax_argument_bytes = 32\n",
    )
    .expect("write config");

    let cfg = load_config(
        &ConfigOverrides {
            config_path: Some(config_path),
            ..ConfigOverrides::default()
        },
        dir.path(),
    )
    .expect("load config");
    let trace_path = dir.path().join("traces/calls.jsonl");
    assert_eq!(cfg.trace.path.as_deref(), Some(trace_path.as_path()));
    assert!(init_call_trace_from_config(&cfg).expect("init trace"));
    assert!(is_tracing());

    let mailer = MockObject::new("Mailer");
    let send = MethodLedger::<(String,), bool>::new(mailer.method("send"));
    assert!(send.record(("early".to_string(),)).is_err());
    let queue = send
        .stub_with(
            InvocationMatcher::any(),
            [BehaviorMock::returning(true), BehaviorMock::raise("smtp down")],
        )
        .expect("stub");
    assert!(send.record(("a@example.com".to_string(),)).expect("sent"));
    assert!(send.record(("b@example.com".to_string(),)).is_err());
    queue.clear();
    assert!(send.record(("x".repeat(100),)).is_err());

    let bounce = MethodLedger::<(String,), bool>::new(mailer.method("bounce"));
    match bounce.record(("y".repeat(100),)) {
        Err(MockError::UnmockedMethodCall { arguments, .. }) => {
            assert!(arguments.starts_with("<hash:sha256:"));
        }
        other => panic!("expected unmocked call, got {other:?}"),
    }

    clear_call_trace();
    assert!(!is_tracing());
    assert!(send.record(("after".to_string(),)).is_err());

    let trace = CallTrace::load(&trace_path).expect("load trace");
    let token = send.method().token();
    assert_eq!(
        trace.outcomes_for(token),
        vec![
            CallOutcome::Unmocked,
            CallOutcome::Stubbed,
            CallOutcome::Raised,
            CallOutcome::Exhausted,
        ]
    );
    let calls = trace.calls_for(token);
    assert_eq!(calls[1].method, "Mailer::send");
    assert_eq!(calls[1].arguments, "(\"a@example.com\",)");
    assert!(calls[3].arguments_truncated);
    assert!(calls[3].arguments.starts_with("<hash:sha256:"));

    let history = send.history();
    assert_eq!(history.len(), 5);
    let traced = calls.iter().map(|c| c.ordinal).collect::<Vec<_>>();
    let recorded = history[..4]
        .iter()
        .map(|i| i.ordinal().get())
        .collect::<Vec<_>>();
    assert_eq!(traced, recorded);
}
