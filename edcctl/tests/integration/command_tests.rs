use crate::common::{TestEnv, assert_contains, edcctl, init_test_logging};

#[test]
fn test_help_lists_commands() {
    init_test_logging();
    crate::test_log!("TEST START: test_help_lists_commands");

    let env = TestEnv::new();
    let output = edcctl(env.home())
        .arg("--help")
        .output()
        .expect("Failed to run edcctl --help");

    assert!(output.status.success(), "edcctl --help failed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_contains(&stdout, "EDC connector stack");
    for command in ["install", "upgrade", "uninstall", "status", "history", "workflow"] {
        assert_contains(&stdout, command);
    }
    crate::test_log!("TEST PASS: test_help_lists_commands");
}

#[test]
fn test_unknown_flag_exits_2() {
    init_test_logging();
    crate::test_log!("TEST START: test_unknown_flag_exits_2");

    let env = TestEnv::new();
    let output = edcctl(env.home())
        .args(["install", "--frobnicate"])
        .output()
        .expect("Failed to run edcctl install");

    assert_eq!(output.status.code(), Some(2));
    crate::test_log!("TEST PASS: test_unknown_flag_exits_2");
}

#[test]
fn test_invalid_namespace_exits_2() {
    init_test_logging();
    crate::test_log!("TEST START: test_invalid_namespace_exits_2");

    let env = TestEnv::new();
    let output = edcctl(env.home())
        .args(["install", "--dry-run", "-n", "Not_A_Namespace"])
        .output()
        .expect("Failed to run edcctl install");

    assert_eq!(output.status.code(), Some(2));
    assert_contains(&String::from_utf8_lossy(&output.stderr), "Not_A_Namespace");
    crate::test_log!("TEST PASS: test_invalid_namespace_exits_2");
}

#[test]
fn test_uninstall_without_tty_is_cancelled() {
    init_test_logging();
    crate::test_log!("TEST START: test_uninstall_without_tty_is_cancelled");

    let env = TestEnv::new();
    let output = edcctl(env.home())
        .args(["uninstall", "-r", "edc"])
        .stdin(std::process::Stdio::null())
        .output()
        .expect("Failed to run edcctl uninstall");

    assert_eq!(output.status.code(), Some(4));
    assert!(!env.history_file().exists());
    crate::test_log!("TEST PASS: test_uninstall_without_tty_is_cancelled");
}

#[test]
fn test_history_empty_json() {
    init_test_logging();
    crate::test_log!("TEST START: test_history_empty_json");

    let env = TestEnv::new();
    let output = edcctl(env.home())
        .args(["--json", "history", "--limit", "5"])
        .output()
        .expect("Failed to run edcctl history");

    assert!(output.status.success());
    let entries: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(entries, serde_json::json!([]));
    crate::test_log!("TEST PASS: test_history_empty_json");
}
