use crate::common::{TestEnv, assert_contains, edcctl, init_test_logging};

#[test]
fn test_each_missing_key_reported() {
    init_test_logging();
    crate::test_log!("TEST START: test_each_missing_key_reported");

    let env = TestEnv::new();
    env.write_env("ASSET_ID=asset-1\nPROVIDER_URL=http://127.0.0.1:9\nPROVIDER_API_KEY=\"\"\n");

    let output = edcctl(env.home())
        .arg("workflow")
        .arg("--env-file")
        .arg(&env.env_file)
        .output()
        .expect("Failed to run edcctl workflow");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    for key in [
        "PROVIDER_BPN",
        "PROVIDER_API_KEY",
        "CONSUMER_URL",
        "CONSUMER_BPN",
        "CONSUMER_API_KEY",
    ] {
        assert_contains(&stderr, &format!("Missing required environment variable: {key}"));
    }
    assert!(!stderr.contains("variable: ASSET_ID"));
    crate::test_log!("TEST PASS: test_each_missing_key_reported");
}

#[test]
fn test_missing_env_file() {
    init_test_logging();
    crate::test_log!("TEST START: test_missing_env_file");

    let env = TestEnv::new();
    let output = edcctl(env.home())
        .args(["workflow", "--env-file"])
        .arg(env.home().join("nope.env"))
        .output()
        .expect("Failed to run edcctl workflow");

    assert_eq!(output.status.code(), Some(1));
    assert_contains(&String::from_utf8_lossy(&output.stderr), "nope.env");
    crate::test_log!("TEST PASS: test_missing_env_file");
}

#[test]
fn test_malformed_env_reports_line() {
    init_test_logging();
    crate::test_log!("TEST START: test_malformed_env_reports_line");

    let env = TestEnv::new();
    env.write_env("# connectors\nASSET_ID=asset-1\nPROVIDER_URL\n");
    let output = edcctl(env.home())
        .arg("workflow")
        .arg("--env-file")
        .arg(&env.env_file)
        .output()
        .expect("Failed to run edcctl workflow");

    assert_eq!(output.status.code(), Some(1));
    assert_contains(&String::from_utf8_lossy(&output.stderr), "Line 3");
    crate::test_log!("TEST PASS: test_malformed_env_reports_line");
}

#[test]
fn test_invalid_setting_rejected() {
    init_test_logging();
    crate::test_log!("TEST START: test_invalid_setting_rejected");

    let env = TestEnv::new();
    let output = edcctl(env.home())
        .env("EDCCTL_POLL_ATTEMPTS", "zero")
        .args(["history"])
        .output()
        .expect("Failed to run edcctl history");

    assert_eq!(output.status.code(), Some(1));
    assert_contains(&String::from_utf8_lossy(&output.stderr), "EDCCTL_POLL_ATTEMPTS");
    crate::test_log!("TEST PASS: test_invalid_setting_rejected");
}

#[test]
fn test_env_file_debug_enables_debug_logging() {
    init_test_logging();
    crate::test_log!("TEST START: test_env_file_debug_enables_debug_logging");

    let env = TestEnv::with_connectors("http://127.0.0.1:9");
    let content = std::fs::read_to_string(&env.env_file).unwrap();
    env.write_env(&format!("{content}DEBUG=true\n"));

    let output = edcctl(env.home())
        .arg("workflow")
        .arg("--env-file")
        .arg(&env.env_file)
        .output()
        .expect("Failed to run edcctl workflow");

    assert_eq!(output.status.code(), Some(3));
    assert_contains(&String::from_utf8_lossy(&output.stderr), "Settings loaded");
    crate::test_log!("TEST PASS: test_env_file_debug_enables_debug_logging");
}
