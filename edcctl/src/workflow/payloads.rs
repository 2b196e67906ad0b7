//! JSON-LD request bodies for the Management API.

use edc_common::{ResourceIds, WorkflowConfig};
use serde_json::{Value, json};

pub const EDC_NAMESPACE: &str = "https://w3id.org/edc/v0.0.1/ns/";
pub const DSP_PROTOCOL: &str = "dataspace-protocol-http";

/// Expanded IRI of the asset id property, used in selectors and filters.
pub fn edc_id_property() -> String {
    format!("{EDC_NAMESPACE}id")
}

pub fn context() -> Value {
    json!({
        "@vocab": EDC_NAMESPACE,
        "edc": EDC_NAMESPACE,
        "odrl": "http://www.w3.org/ns/odrl/2/",
        "dcat": "http://www.w3.org/ns/dcat#",
        "dct": "http://purl.org/dc/terms/"
    })
}

pub fn asset(config: &WorkflowConfig) -> Value {
    json!({
        "@context": context(),
        "@id": config.asset_id,
        "properties": {
            "description": format!("Asset {} published by edcctl", config.asset_id),
            "contenttype": "application/json"
        },
        "dataAddress": {
            "@type": "DataAddress",
            "type": "HttpData",
            "baseUrl": config.data_source_url,
            "proxyPath": "true",
            "proxyQueryParams": "true"
        }
    })
}

/// Access policy: `odrl:use` only for the consumer's BPN.
pub fn policy_definition(ids: &ResourceIds, consumer_bpn: &str) -> Value {
    json!({
        "@context": context(),
        "@type": "PolicyDefinition",
        "@id": ids.policy,
        "policy": {
            "@type": "odrl:Set",
            "odrl:permission": [{
                "odrl:action": { "@id": "odrl:use" },
                "odrl:constraint": {
                    "odrl:leftOperand": { "@id": "BusinessPartnerNumber" },
                    "odrl:operator": { "@id": "odrl:eq" },
                    "odrl:rightOperand": consumer_bpn
                }
            }],
            "odrl:prohibition": [],
            "odrl:obligation": []
        }
    })
}

pub fn contract_definition(ids: &ResourceIds) -> Value {
    json!({
        "@context": context(),
        "@type": "ContractDefinition",
        "@id": ids.contract,
        "accessPolicyId": ids.policy,
        "contractPolicyId": ids.policy,
        "assetsSelector": [{
            "@type": "Criterion",
            "operandLeft": edc_id_property(),
            "operator": "=",
            "operandRight": ids.asset
        }]
    })
}

pub fn catalog_request(config: &WorkflowConfig) -> Value {
    json!({
        "@context": context(),
        "@type": "CatalogRequest",
        "counterPartyAddress": config.provider_dsp_url,
        "counterPartyId": config.provider_bpn,
        "protocol": DSP_PROTOCOL,
        "querySpec": {
            "@type": "QuerySpec",
            "offset": 0,
            "limit": 50,
            "filterExpression": [{
                "operandLeft": edc_id_property(),
                "operator": "=",
                "operandRight": config.asset_id
            }]
        }
    })
}

/// A contract offer taken from the provider's catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Offer {
    pub id: String,
    pub permission: Value,
    pub prohibition: Value,
    pub obligation: Value,
}

pub fn edr_negotiation(config: &WorkflowConfig, offer: &Offer) -> Value {
    json!({
        "@context": context(),
        "@type": "ContractRequest",
        "counterPartyAddress": config.provider_dsp_url,
        "counterPartyId": config.provider_bpn,
        "protocol": DSP_PROTOCOL,
        "policy": {
            "@id": offer.id,
            "@type": "odrl:Offer",
            "odrl:assigner": { "@id": config.provider_bpn },
            "odrl:target": { "@id": config.asset_id },
            "odrl:permission": offer.permission,
            "odrl:prohibition": offer.prohibition,
            "odrl:obligation": offer.obligation
        }
    })
}

pub fn edr_query(negotiation_id: &str) -> Value {
    json!({
        "@context": context(),
        "@type": "QuerySpec",
        "filterExpression": [{
            "operandLeft": "contractNegotiationId",
            "operator": "=",
            "operandRight": negotiation_id
        }]
    })
}
