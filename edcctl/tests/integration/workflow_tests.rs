use edc_common::{EdcError, EnvFile, ErrorCode, WorkflowConfig};
use edcctl::ui::Output;
use edcctl::workflow::{CreateOutcome, PollPolicy, Workflow};
use std::time::Duration;

use crate::common::fake_edc::{DATA_BODY, FakeEdcBuilder, TRANSFER_PROCESS_ID};
use crate::common::{FakeEdc, TestEnv, assert_contains, assert_not_contains, edcctl, init_test_logging};

/// Provider and consumer servers, each accepting only its own key.
async fn connectors(provider: FakeEdcBuilder, consumer: FakeEdcBuilder) -> (FakeEdc, FakeEdc) {
    let provider = provider.api_key("provider-key").start().await;
    let consumer = consumer.api_key("consumer-key").start().await;
    (provider, consumer)
}

fn fast_poll() -> PollPolicy {
    PollPolicy {
        interval: Duration::from_millis(10),
        attempts: 5,
    }
}

#[tokio::test]
async fn test_workflow_fetches_data() {
    init_test_logging();
    crate::test_log!("TEST START: test_workflow_fetches_data");

    let (provider, consumer) = connectors(
        FakeEdc::builder().existing("assets/asset-1"),
        FakeEdc::builder().edr_ready_after(1),
    )
    .await;
    let env = TestEnv::with_split_connectors(&provider.base_url, &consumer.base_url);
    let config = WorkflowConfig::from_env_file(&EnvFile::load(&env.env_file).unwrap()).unwrap();

    let workflow = Workflow::new(config, Duration::from_secs(5), fast_poll(), Output::default()).unwrap();
    let report = workflow.run().await.unwrap();

    assert_eq!(report.data, DATA_BODY);
    assert_eq!(report.offer_id, "offer-1");
    assert_eq!(report.negotiation_id, "neg-1");
    assert_eq!(report.transfer_process_id, TRANSFER_PROCESS_ID);
    assert_eq!(report.provider.asset, CreateOutcome::Existing);
    assert_eq!(report.provider.policy, CreateOutcome::Created);
    assert_eq!(provider.count("POST /assets"), 0);
    assert_eq!(provider.count("POST /policydefinitions"), 1);
    assert_eq!(consumer.count("POST /edrs/request"), 2);

    // provider resources go to the provider, negotiation to the consumer
    assert!(provider.calls().iter().all(|c| !c.contains("/edrs") && !c.contains("/catalog")));
    assert!(consumer.calls().iter().all(|c| !c.contains("definitions") && !c.contains("/assets")));
    crate::test_log!("TEST PASS: test_workflow_fetches_data");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_workflow_binary_prints_body() {
    init_test_logging();
    crate::test_log!("TEST START: test_workflow_binary_prints_body");

    let (provider, consumer) =
        connectors(FakeEdc::builder(), FakeEdc::builder().edr_ready_after(2)).await;
    let env = TestEnv::with_split_connectors(&provider.base_url, &consumer.base_url);

    let mut cmd = edcctl(env.home());
    cmd.arg("workflow")
        .arg("--env-file")
        .arg(&env.env_file)
        .args(["--poll-interval", "10ms", "--poll-attempts", "10"]);
    let output = tokio::process::Command::from(cmd)
        .output()
        .await
        .expect("Failed to run edcctl workflow");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "workflow failed: {stderr}");
    assert_eq!(stdout.trim(), DATA_BODY);
    assert_contains(&stderr, "[8/8]");
    assert_not_contains(&stderr, "provider-key");
    assert_not_contains(&stderr, "consumer-key");
    assert_eq!(provider.posts(), 3);
    assert_eq!(consumer.count("GET /public/data"), 1);
    crate::test_log!("TEST PASS: test_workflow_binary_prints_body");
}

#[tokio::test]
async fn test_workflow_swapped_keys_are_rejected() {
    init_test_logging();
    crate::test_log!("TEST START: test_workflow_swapped_keys_are_rejected");

    let (provider, consumer) = connectors(FakeEdc::builder(), FakeEdc::builder()).await;
    let env = TestEnv::with_split_connectors(&provider.base_url, &consumer.base_url);
    let mut config = WorkflowConfig::from_env_file(&EnvFile::load(&env.env_file).unwrap()).unwrap();
    std::mem::swap(&mut config.provider_api_key, &mut config.consumer_api_key);

    let workflow = Workflow::new(config, Duration::from_secs(5), fast_poll(), Output::default()).unwrap();
    let err = workflow.run().await.unwrap_err();

    let edc = err.downcast_ref::<EdcError>().unwrap();
    assert_eq!(edc.code, ErrorCode::ApiUnexpectedStatus);
    assert!(edc.detail.contains("HTTP 401"), "{}", edc.detail);
    assert_eq!(provider.posts(), 0);
    assert!(consumer.calls().is_empty());
    crate::test_log!("TEST PASS: test_workflow_swapped_keys_are_rejected");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_workflow_binary_poll_timeout_exits_3() {
    init_test_logging();
    crate::test_log!("TEST START: test_workflow_binary_poll_timeout_exits_3");

    let fake = FakeEdc::builder().edr_ready_after(u32::MAX).start().await;
    let env = TestEnv::with_connectors(&fake.base_url);

    let mut cmd = edcctl(env.home());
    cmd.arg("workflow")
        .arg("--env-file")
        .arg(&env.env_file)
        .args(["--poll-interval", "10ms", "--poll-attempts", "3"]);
    let output = tokio::process::Command::from(cmd)
        .output()
        .await
        .expect("Failed to run edcctl workflow");

    assert_eq!(output.status.code(), Some(3));
    assert!(output.stdout.is_empty());
    assert_eq!(fake.edr_polls(), 3);
    assert_contains(&String::from_utf8_lossy(&output.stderr), "not ready after 3 attempts");
    crate::test_log!("TEST PASS: test_workflow_binary_poll_timeout_exits_3");
}
