//! Consumer-side sequence: catalog, offer, EDR negotiation, data address.
//!
//! Responses are JSON-LD and may come back compacted with or without
//! namespace prefixes, so lookups accept both `dcat:dataset` and `dataset`.

use super::client::{ManagementClient, fetch_with_token};
use super::payloads::{self, Offer};
use anyhow::Result;
use edc_common::{EdcError, ErrorCode, WorkflowConfig};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

/// Endpoint and token for the negotiated transfer.
#[derive(Clone, Serialize)]
pub struct DataAddress {
    pub endpoint: String,
    #[serde(skip)]
    pub authorization: String,
}

impl std::fmt::Debug for DataAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataAddress")
            .field("endpoint", &self.endpoint)
            .field("authorization", &"***")
            .finish()
    }
}

fn missing(step: &str, what: &str) -> anyhow::Error {
    EdcError::new(ErrorCode::ApiMissingField, format!("{step}: {what}")).into()
}

/// First present key among `keys`.
fn field<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| value.get(*key))
}

/// A non-empty string under any of `keys`.
fn required_str(value: &Value, keys: &[&str], step: &str) -> Result<String> {
    match field(value, keys).and_then(Value::as_str).map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(missing(step, &format!("response has no non-empty '{}'", keys[0]))),
    }
}

/// An object, or the first element of an array.
fn single(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.first(),
        Value::Object(_) => Some(value),
        _ => None,
    }
}

/// The dataset whose `@id` is `asset_id`. A lone dataset without an `@id`
/// is accepted; one that names another asset is not.
fn dataset_for<'a>(value: &'a Value, asset_id: &str) -> Option<&'a Value> {
    let is_asset = |item: &Value| match item.get("@id").and_then(Value::as_str) {
        Some(id) => id == asset_id,
        None => false,
    };
    match value {
        Value::Array(items) => items.iter().find(|item| is_asset(item)).or(match items.as_slice() {
            [only] if only.get("@id").is_none() => Some(only),
            _ => None,
        }),
        Value::Object(_) if value.get("@id").is_none() || is_asset(value) => Some(value),
        _ => None,
    }
}

pub async fn request_catalog(client: &ManagementClient, config: &WorkflowConfig) -> Result<Value> {
    client
        .post_json(
            "catalog request",
            "/catalog/request",
            &payloads::catalog_request(config),
        )
        .await
}

/// Pull the contract offer for `asset_id` out of a catalog.
pub fn parse_offer(catalog: &Value, asset_id: &str) -> Result<Offer> {
    const STEP: &str = "parse offer";

    let dataset = field(catalog, &["dcat:dataset", "dataset"])
        .and_then(|d| dataset_for(d, asset_id))
        .ok_or_else(|| missing(STEP, &format!("catalog contains no dataset for asset {asset_id}")))?;
    let policy = field(dataset, &["odrl:hasPolicy", "hasPolicy"])
        .and_then(single)
        .ok_or_else(|| missing(STEP, "dataset has no odrl:hasPolicy"))?;
    let id = required_str(policy, &["@id"], STEP)?;

    let fragment = |keys: &[&str]| {
        field(policy, keys)
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new()))
    };

    Ok(Offer {
        id,
        permission: fragment(&["odrl:permission", "permission"]),
        prohibition: fragment(&["odrl:prohibition", "prohibition"]),
        obligation: fragment(&["odrl:obligation", "obligation"]),
    })
}

/// Start the EDR negotiation; returns the negotiation id.
pub async fn negotiate_edr(
    client: &ManagementClient,
    config: &WorkflowConfig,
    offer: &Offer,
) -> Result<String> {
    const STEP: &str = "EDR negotiation";
    let response = client
        .post_json(STEP, "/edrs", &payloads::edr_negotiation(config, offer))
        .await?;
    required_str(&response, &["@id"], STEP)
}

/// One poll of the EDR cache. `None` while the result list is empty.
pub async fn query_edrs(client: &ManagementClient, negotiation_id: &str) -> Result<Option<String>> {
    const STEP: &str = "EDR query";
    let response = client
        .post_json(STEP, "/edrs/request", &payloads::edr_query(negotiation_id))
        .await?;

    let entries = response
        .as_array()
        .ok_or_else(|| EdcError::new(ErrorCode::ApiMalformedResponse, format!("{STEP}: expected an array")))?;
    match entries.first() {
        None => Ok(None),
        Some(entry) => {
            required_str(entry, &["transferProcessId", "edc:transferProcessId"], STEP).map(Some)
        }
    }
}

pub async fn fetch_data_address(
    client: &ManagementClient,
    transfer_process_id: &str,
) -> Result<DataAddress> {
    const STEP: &str = "data address";
    let response = client
        .get_json(STEP, &["edrs", transfer_process_id, "dataaddress"])
        .await?;
    Ok(DataAddress {
        endpoint: required_str(&response, &["endpoint", "edc:endpoint"], STEP)?,
        authorization: required_str(&response, &["authorization", "edc:authorization"], STEP)?,
    })
}

/// GET the data plane endpoint and return the body verbatim.
pub async fn fetch_data(http: &Client, address: &DataAddress) -> Result<String> {
    let response = fetch_with_token(http, &address.endpoint, &address.authorization)
        .await?
        .expect_success("fetch data")?;
    Ok(response.body)
}
