use edc_common::{EdcError, EnvFile, ErrorCode, WorkflowConfig};
use edcctl::ui::Output;
use edcctl::workflow::provider::{ASSET, POLICY};
use edcctl::workflow::{CreateOutcome, ManagementClient, setup_provider};
use edcctl::workflow::{ensure_resource, payloads};
use serde_json::json;

use crate::common::{FakeEdc, init_test_logging};

fn client(fake: &FakeEdc) -> ManagementClient {
    ManagementClient::new(reqwest::Client::new(), &fake.base_url, "provider-key")
}

fn config(fake: &FakeEdc) -> WorkflowConfig {
    let env = EnvFile::from_pairs([
        ("ASSET_ID", "asset-1"),
        ("PROVIDER_URL", fake.base_url.as_str()),
        ("PROVIDER_BPN", "BPNL000000000001"),
        ("PROVIDER_API_KEY", "provider-key"),
        ("CONSUMER_URL", fake.base_url.as_str()),
        ("CONSUMER_BPN", "BPNL000000000002"),
        ("CONSUMER_API_KEY", "consumer-key"),
    ]);
    WorkflowConfig::from_env_file(&env).expect("valid config")
}

#[tokio::test]
async fn test_existing_resource_is_not_posted() {
    init_test_logging();
    crate::test_log!("TEST START: test_existing_resource_is_not_posted");

    let fake = FakeEdc::builder().existing("assets/asset-1").start().await;
    let outcome = ensure_resource(&client(&fake), ASSET, "asset-1", &json!({"@id": "asset-1"}))
        .await
        .unwrap();

    assert_eq!(outcome, CreateOutcome::Existing);
    assert_eq!(fake.posts(), 0);
    assert_eq!(fake.count("GET /assets/asset-1"), 1);
    crate::test_log!("TEST PASS: test_existing_resource_is_not_posted");
}

#[tokio::test]
async fn test_absent_resource_is_posted_once() {
    init_test_logging();
    crate::test_log!("TEST START: test_absent_resource_is_posted_once");

    let fake = FakeEdc::start().await;
    let outcome = ensure_resource(
        &client(&fake),
        POLICY,
        "asset-1-policy",
        &json!({"@id": "asset-1-policy"}),
    )
    .await
    .unwrap();

    assert_eq!(outcome, CreateOutcome::Created);
    assert_eq!(fake.count("POST /policydefinitions"), 1);
    assert_eq!(fake.posts(), 1);
    crate::test_log!("TEST PASS: test_absent_resource_is_posted_once");
}

#[tokio::test]
async fn test_probe_server_error_is_fatal() {
    init_test_logging();
    crate::test_log!("TEST START: test_probe_server_error_is_fatal");

    let fake = FakeEdc::builder().probe_status(500).start().await;
    let err = ensure_resource(&client(&fake), ASSET, "asset-1", &json!({"@id": "asset-1"}))
        .await
        .unwrap_err();

    let edc = err.downcast_ref::<EdcError>().unwrap();
    assert_eq!(edc.code, ErrorCode::ApiUnexpectedStatus);
    assert_eq!(edc.exit_code(), 3);
    assert!(edc.detail.contains("HTTP 500"), "{}", edc.detail);
    assert_eq!(fake.posts(), 0);
    crate::test_log!("TEST PASS: test_probe_server_error_is_fatal");
}

#[tokio::test]
async fn test_setup_provider_is_idempotent() {
    init_test_logging();
    crate::test_log!("TEST START: test_setup_provider_is_idempotent");

    let fake = FakeEdc::start().await;
    let config = config(&fake);
    let client = client(&fake);

    let first = setup_provider(&client, &config, &Output::default()).await.unwrap();
    assert_eq!(first.asset, CreateOutcome::Created);
    assert_eq!(first.contract, CreateOutcome::Created);
    assert_eq!(fake.posts(), 3);

    let second = setup_provider(&client, &config, &Output::default()).await.unwrap();
    assert_eq!(second.asset, CreateOutcome::Existing);
    assert_eq!(second.policy, CreateOutcome::Existing);
    assert_eq!(second.contract, CreateOutcome::Existing);
    assert_eq!(fake.posts(), 3);

    // the contract definition references the derived ids
    let contract = payloads::contract_definition(&config.resource_ids());
    assert_eq!(contract["accessPolicyId"], "asset-1-policy");
    crate::test_log!("TEST PASS: test_setup_provider_is_idempotent");
}

#[tokio::test]
async fn test_reserved_characters_stay_in_one_segment() {
    init_test_logging();
    crate::test_log!("TEST START: test_reserved_characters_stay_in_one_segment");

    let fake = FakeEdc::builder().existing("assets/asset").start().await;
    let id = "asset#1?v=2/x";
    let outcome = ensure_resource(&client(&fake), ASSET, id, &json!({"@id": id}))
        .await
        .unwrap();

    assert_eq!(outcome, CreateOutcome::Created);
    assert_eq!(fake.count(&format!("GET /assets/{id}")), 1);
    assert_eq!(fake.count("GET /assets/asset"), 0);
    assert_eq!(fake.count("POST /assets"), 1);
    crate::test_log!("TEST PASS: test_reserved_characters_stay_in_one_segment");
}

#[tokio::test]
async fn test_rejected_api_key_is_fatal() {
    init_test_logging();
    crate::test_log!("TEST START: test_rejected_api_key_is_fatal");

    let fake = FakeEdc::builder().api_key("other-key").start().await;
    let err = ensure_resource(&client(&fake), ASSET, "asset-1", &json!({"@id": "asset-1"}))
        .await
        .unwrap_err();

    let edc = err.downcast_ref::<EdcError>().unwrap();
    assert_eq!(edc.code, ErrorCode::ApiUnexpectedStatus);
    assert!(edc.detail.contains("HTTP 401"), "{}", edc.detail);
    assert_eq!(fake.posts(), 0);
    crate::test_log!("TEST PASS: test_rejected_api_key_is_fatal");
}
