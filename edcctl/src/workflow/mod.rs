//! The DSP workflow against a provider/consumer connector pair.
//!
//! Eight sequential steps, each feeding the next:
//!
//! 1. asset, 2. policy definition, 3. contract definition (provider,
//!    idempotent)
//! 4. catalog request and offer parsing (consumer)
//! 5. EDR negotiation
//! 6. polling the EDR cache for the transfer process
//! 7. fetching the data address (endpoint + token)
//! 8. fetching the data
//!
//! Any failure ends the run; only step 6 repeats.

pub mod client;
pub mod consumer;
pub mod payloads;
pub mod poll;
pub mod provider;

pub use client::{ApiResponse, ManagementClient, Presence};
pub use consumer::DataAddress;
pub use payloads::Offer;
pub use poll::{PollPolicy, poll_until};
pub use provider::{CreateOutcome, ProviderReport, ResourceKind, ensure_resource, setup_provider};

use crate::ui::Output;
use anyhow::Result;
use edc_common::WorkflowConfig;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

/// Number of user-visible steps.
pub const WORKFLOW_STEPS: usize = 8;

/// Everything learned during a run. `data` is the fetched body.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowReport {
    pub provider: ProviderReport,
    pub offer_id: String,
    pub negotiation_id: String,
    pub transfer_process_id: String,
    pub endpoint: String,
    pub data: String,
}

pub struct Workflow {
    config: WorkflowConfig,
    http: Client,
    provider: ManagementClient,
    consumer: ManagementClient,
    poll: PollPolicy,
    output: Output,
}

impl Workflow {
    pub fn new(
        config: WorkflowConfig,
        http_timeout: Duration,
        poll: PollPolicy,
        output: Output,
    ) -> Result<Self> {
        let http = client::http_client(http_timeout)?;
        let provider =
            ManagementClient::new(http.clone(), &config.provider_url, &config.provider_api_key);
        let consumer =
            ManagementClient::new(http.clone(), &config.consumer_url, &config.consumer_api_key);
        Ok(Self {
            config,
            http,
            provider,
            consumer,
            poll,
            output,
        })
    }

    pub async fn run(&self) -> Result<WorkflowReport> {
        let config = &self.config;
        let out = &self.output;
        tracing::info!(
            asset = %config.asset_id,
            provider = %config.provider_url,
            consumer = %config.consumer_url,
            "Starting DSP workflow"
        );

        let provider = setup_provider(&self.provider, config, out).await?;

        out.step(4, WORKFLOW_STEPS, "Requesting catalog");
        let catalog = consumer::request_catalog(&self.consumer, config).await?;
        let offer = consumer::parse_offer(&catalog, &config.asset_id)?;
        out.success(&format!("offer {}", offer.id));

        out.step(5, WORKFLOW_STEPS, "Negotiating EDR");
        let negotiation_id = consumer::negotiate_edr(&self.consumer, config, &offer).await?;
        out.success(&format!("negotiation {negotiation_id}"));

        out.step(
            6,
            WORKFLOW_STEPS,
            &format!(
                "Waiting for EDR (up to {} attempts, {} apart)",
                self.poll.attempts,
                humantime::format_duration(self.poll.interval)
            ),
        );
        let consumer_client = &self.consumer;
        let negotiation = negotiation_id.as_str();
        let transfer_process_id = poll_until(self.poll, "EDR", |attempt| async move {
            tracing::debug!(attempt, "Querying EDR cache");
            consumer::query_edrs(consumer_client, negotiation).await
        })
        .await?;
        out.success(&format!("transfer process {transfer_process_id}"));

        out.step(7, WORKFLOW_STEPS, "Fetching data address");
        let address = consumer::fetch_data_address(&self.consumer, &transfer_process_id).await?;
        out.success(&format!("endpoint {}", address.endpoint));

        out.step(8, WORKFLOW_STEPS, "Fetching data");
        let data = consumer::fetch_data(&self.http, &address).await?;
        out.success(&format!("{} bytes", data.len()));

        Ok(WorkflowReport {
            provider,
            offer_id: offer.id,
            negotiation_id,
            transfer_process_id,
            endpoint: address.endpoint,
            data,
        })
    }
}
