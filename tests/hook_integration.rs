//! End-to-end hook runs through the compiled binary.

mod common;

use std::fs;

use common::{TEST_EMAIL, TestEnv};

#[test]
fn write_event_appends_one_record() {
    let env = TestEnv::new();
    let event = r#"{"tool_name":"Write","session_id":"sess-a","tool_input":{"file_path":"/tmp/a.txt","content":"a\nb\nc"}}"#;
    let result = env.run("hook_write", &["hook"], Some(event));

    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(result.stdout.is_empty());

    let records = env.all_records();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.tool, "Write");
    assert_eq!(record.session_id, "sess-a");
    assert_eq!(
        (record.additions, record.deletions, record.net_change),
        (3, 0, 3)
    );
    if cfg!(unix) {
        assert_eq!(record.email, TEST_EMAIL);
    }
}

#[test]
fn edit_event_records_net_shrink() {
    let env = TestEnv::new();
    let event = r#"{"tool_name":"Edit","session_id":"sess-b","tool_input":{"old_string":"x\ny\nz","new_string":"x"}}"#;
    let result = env.run("hook_edit", &["hook"], Some(event));
    assert!(result.status.success(), "log: {}", result.log_path.display());

    let records = env.all_records();
    assert_eq!(records.len(), 1);
    assert_eq!(
        (records[0].additions, records[0].deletions, records[0].net_change),
        (0, 2, -2)
    );
}

#[test]
fn edit_event_records_pure_growth() {
    let env = TestEnv::new();
    let event = r#"{"tool_name":"Edit","session_id":"sess-grow","tool_input":{"old_string":"old","new_string":"old\nnew1\nnew2"}}"#;
    let result = env.run("hook_edit_growth", &["hook"], Some(event));
    assert!(result.status.success(), "log: {}", result.log_path.display());

    let records = env.all_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].tool, "Edit");
    assert_eq!(
        (records[0].additions, records[0].deletions, records[0].net_change),
        (2, 0, 2)
    );
}

#[test]
fn embedded_tool_name_is_used() {
    let env = TestEnv::new();
    let event = r#"{"tool_input":{"___TOOL_NAME___":"NotebookEdit","new_source":"print(1)\nprint(2)"},"session_id":"nb"}"#;
    let result = env.run("hook_embedded_name", &["hook"], Some(event));
    assert!(result.status.success());

    let records = env.all_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].tool, "NotebookEdit");
    assert_eq!(records[0].additions, 2);
}

#[test]
fn zero_delta_leaves_partition_untouched() {
    let env = TestEnv::new();
    let first = r#"{"tool_name":"Write","session_id":"s","tool_input":{"content":"one"}}"#;
    assert!(env.run("hook_seed", &["hook"], Some(first)).status.success());

    let files = env.partition_files();
    assert_eq!(files.len(), 1);
    let before = fs::read(&files[0]).expect("partition exists");

    let noop = r#"{"tool_name":"Edit","session_id":"s","tool_input":{"old_string":"same","new_string":"same"}}"#;
    let result = env.run("hook_noop", &["hook"], Some(noop));
    assert!(result.status.success());
    assert!(result.stderr.contains("no line changes detected, skipping"));

    assert_eq!(env.partition_files(), files);
    assert_eq!(fs::read(&files[0]).expect("partition exists"), before);
}

#[test]
fn unknown_tool_creates_nothing() {
    let env = TestEnv::new();
    let event = r#"{"tool_name":"Bash","tool_input":{"command":"rm -rf build"}}"#;
    let result = env.run("hook_unknown_tool", &["hook"], Some(event));
    assert!(result.status.success());
    assert!(!env.log_root.exists());
}

#[test]
fn bad_input_still_exits_zero() {
    let env = TestEnv::new();
    for (case, input) in [
        ("hook_empty", Some("")),
        ("hook_garbage", Some("{{ not json")),
        ("hook_no_stdin", None),
    ] {
        let result = env.run(case, &["hook"], input);
        assert!(result.status.success(), "case {case}: {}", result.log_path.display());
        assert!(result.stdout.is_empty());
    }
    assert!(!env.log_root.exists());
}

#[test]
fn unwritable_log_root_still_exits_zero() {
    let mut env = TestEnv::new();
    // A regular file where the log root's parent should be.
    let blocker = env.path().join("blocker");
    fs::write(&blocker, "x").expect("write blocker");
    env.log_root = blocker.join("code-log");

    let event = r#"{"tool_name":"Write","tool_input":{"content":"a"}}"#;
    let result = env.run("hook_unwritable", &["hook"], Some(event));
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(result.stdout.is_empty());
    assert!(result.stderr.contains("failed to record line changes"));
}

#[test]
fn invalid_config_still_records_under_env_log_root() {
    let env = TestEnv::new();
    fs::write(&env.config_path, "this is = = not toml").expect("write bad config");
    let event = r#"{"tool_name":"Write","session_id":"bad-config","tool_input":{"content":"a\nb"}}"#;
    let result = env.run("hook_bad_config", &["hook"], Some(event));
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("config unavailable"));

    let records = env.all_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].session_id, "bad-config");
    assert_eq!(records[0].additions, 2);
}

#[test]
fn out_of_range_offset_override_still_exits_zero_and_records() {
    let env = TestEnv::new();
    let event = r#"{"tool_name":"Write","session_id":"offset","tool_input":{"content":"x"}}"#;
    let result = env.run_with_env(
        "hook_offset_min",
        &["hook"],
        Some(event),
        &[("LINELOG_UTC_OFFSET_MINUTES", "-2147483648")],
    );
    assert_eq!(result.status.code(), Some(0), "log: {}", result.log_path.display());

    let records = env.all_records();
    assert_eq!(records.len(), 1);
    assert!(records[0].timestamp.ends_with("+08:00"));
}
