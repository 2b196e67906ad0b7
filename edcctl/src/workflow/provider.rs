//! Provider-side setup: asset, policy definition and contract definition.

use super::WORKFLOW_STEPS;
use super::client::{ManagementClient, Presence};
use super::payloads;
use crate::ui::Output;
use anyhow::Result;
use edc_common::WorkflowConfig;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CreateOutcome {
    /// The probe returned 200; nothing was posted.
    Existing,
    /// The probe returned 404 and the resource was created.
    Created,
}

/// A provider resource collection, e.g. `/assets`.
#[derive(Debug, Clone, Copy)]
pub struct ResourceKind {
    pub label: &'static str,
    pub collection: &'static str,
}

pub const ASSET: ResourceKind = ResourceKind {
    label: "asset",
    collection: "/assets",
};
pub const POLICY: ResourceKind = ResourceKind {
    label: "policy definition",
    collection: "/policydefinitions",
};
pub const CONTRACT: ResourceKind = ResourceKind {
    label: "contract definition",
    collection: "/contractdefinitions",
};

/// Create `id` unless it already exists.
///
/// 200 on the probe skips creation, 404 issues exactly one POST, and any
/// other status is fatal. Nothing is retried.
pub async fn ensure_resource(
    client: &ManagementClient,
    kind: ResourceKind,
    id: &str,
    payload: &Value,
) -> Result<CreateOutcome> {
    let step = format!("check {} {id}", kind.label);
    let collection = kind.collection.trim_start_matches('/');

    match client.probe(&step, &[collection, id]).await? {
        Presence::Exists => {
            tracing::info!(kind = kind.label, id, "Already exists");
            Ok(CreateOutcome::Existing)
        }
        Presence::Absent => {
            let step = format!("create {} {id}", kind.label);
            client
                .post(kind.collection, payload)
                .await?
                .expect_success(&step)?;
            tracing::info!(kind = kind.label, id, "Created");
            Ok(CreateOutcome::Created)
        }
    }
}

fn report(output: &Output, outcome: CreateOutcome) {
    match outcome {
        CreateOutcome::Existing => output.info("already exists, skipped"),
        CreateOutcome::Created => output.success("created"),
    }
}

/// Outcome of each provider resource, in creation order.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderReport {
    pub asset: CreateOutcome,
    pub policy: CreateOutcome,
    pub contract: CreateOutcome,
}

/// Ensure the asset, its access policy and the contract definition exist.
pub async fn setup_provider(
    client: &ManagementClient,
    config: &WorkflowConfig,
    output: &Output,
) -> Result<ProviderReport> {
    let ids = config.resource_ids();

    output.step(1, WORKFLOW_STEPS, &format!("Asset {}", ids.asset));
    let asset = ensure_resource(client, ASSET, &ids.asset, &payloads::asset(config)).await?;
    report(output, asset);

    output.step(2, WORKFLOW_STEPS, &format!("Policy definition {}", ids.policy));
    let policy = ensure_resource(
        client,
        POLICY,
        &ids.policy,
        &payloads::policy_definition(&ids, &config.consumer_bpn),
    )
    .await?;
    report(output, policy);

    output.step(3, WORKFLOW_STEPS, &format!("Contract definition {}", ids.contract));
    let contract = ensure_resource(
        client,
        CONTRACT,
        &ids.contract,
        &payloads::contract_definition(&ids),
    )
    .await?;
    report(output, contract);

    Ok(ProviderReport {
        asset,
        policy,
        contract,
    })
}
