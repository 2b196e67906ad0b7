use edc_common::{EdcError, ErrorCode};
use edcctl::workflow::consumer::query_edrs;
use edcctl::workflow::{ManagementClient, PollPolicy, poll_until};
use std::time::{Duration, Instant};

use crate::common::fake_edc::TRANSFER_PROCESS_ID;
use crate::common::{FakeEdc, init_test_logging};

fn policy(attempts: u32) -> PollPolicy {
    PollPolicy {
        interval: Duration::from_millis(20),
        attempts,
    }
}

async fn poll_edr(fake: &FakeEdc, policy: PollPolicy) -> anyhow::Result<String> {
    let client = ManagementClient::new(reqwest::Client::new(), &fake.base_url, "consumer-key");
    let client = &client;
    poll_until(policy, "EDR", |_| async move { query_edrs(client, "neg-1").await }).await
}

#[tokio::test]
async fn test_poll_stops_at_first_entry() {
    init_test_logging();
    crate::test_log!("TEST START: test_poll_stops_at_first_entry");

    let fake = FakeEdc::builder().edr_ready_after(2).start().await;
    let transfer = poll_edr(&fake, policy(10)).await.unwrap();

    assert_eq!(transfer, TRANSFER_PROCESS_ID);
    assert_eq!(fake.edr_polls(), 3);
    crate::test_log!("TEST PASS: test_poll_stops_at_first_entry");
}

#[tokio::test]
async fn test_poll_gives_up_within_bound() {
    init_test_logging();
    crate::test_log!("TEST START: test_poll_gives_up_within_bound");

    let fake = FakeEdc::builder().edr_ready_after(u32::MAX).start().await;
    let policy = policy(4);
    let started = Instant::now();
    let err = poll_edr(&fake, policy).await.unwrap_err();
    let elapsed = started.elapsed();

    let edc = err.downcast_ref::<EdcError>().unwrap();
    assert_eq!(edc.code, ErrorCode::ApiPollTimeout);
    assert_eq!(edc.exit_code(), 3);
    assert_eq!(fake.edr_polls(), 4);
    assert!(elapsed >= policy.max_wait());
    assert!(elapsed < policy.interval * policy.attempts + Duration::from_secs(2));
    crate::test_log!("TEST PASS: test_poll_gives_up_within_bound");
}
