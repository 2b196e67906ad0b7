//! Configuration for the DSP workflow, read from a `.env` file.

use super::dotenv::EnvFile;
use super::env::{EnvError, parse_bool};
use crate::types::ResourceIds;
use crate::util::redact;
use std::fmt;

/// Keys that must be present and non-empty.
pub const REQUIRED_KEYS: [&str; 7] = [
    "ASSET_ID",
    "PROVIDER_URL",
    "PROVIDER_BPN",
    "PROVIDER_API_KEY",
    "CONSUMER_URL",
    "CONSUMER_BPN",
    "CONSUMER_API_KEY",
];

/// Data source used for the asset's `HttpData` address when none is configured.
pub const DEFAULT_DATA_SOURCE_URL: &str = "https://jsonplaceholder.typicode.com/todos/1";

/// DSP path appended to `PROVIDER_URL` when `PROVIDER_DSP_URL` is unset.
pub const DEFAULT_DSP_PATH: &str = "/api/v1/dsp";

/// Immutable workflow configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct WorkflowConfig {
    pub asset_id: String,
    pub provider_url: String,
    pub provider_bpn: String,
    pub provider_api_key: String,
    pub provider_dsp_url: String,
    pub consumer_url: String,
    pub consumer_bpn: String,
    pub consumer_api_key: String,
    pub data_source_url: String,
    pub debug: bool,
}

impl WorkflowConfig {
    /// Validate and build the configuration.
    ///
    /// Every missing or empty mandatory key produces its own
    /// [`EnvError::Missing`]; all problems are returned together.
    pub fn from_env_file(env: &EnvFile) -> Result<Self, Vec<EnvError>> {
        let mut errors = Vec::new();

        let mut required = |key: &str| -> String {
            match env.get(key).map(|v| v.trim().to_string()) {
                Some(value) if !value.is_empty() => value,
                _ => {
                    errors.push(EnvError::Missing {
                        var: key.to_string(),
                    });
                    String::new()
                }
            }
        };

        let asset_id = required("ASSET_ID");
        let provider_url = trim_url(required("PROVIDER_URL"));
        let provider_bpn = required("PROVIDER_BPN");
        let provider_api_key = required("PROVIDER_API_KEY");
        let consumer_url = trim_url(required("CONSUMER_URL"));
        let consumer_bpn = required("CONSUMER_BPN");
        let consumer_api_key = required("CONSUMER_API_KEY");

        let debug = match env.get("DEBUG") {
            None => false,
            Some(raw) => parse_bool(&raw).unwrap_or_else(|| {
                errors.push(EnvError::InvalidValue {
                    var: "DEBUG".to_string(),
                    expected: "boolean (true/false/1/0/yes/no)".to_string(),
                    value: raw.clone(),
                });
                false
            }),
        };

        let provider_dsp_url = optional(env, "PROVIDER_DSP_URL")
            .map(trim_url)
            .unwrap_or_else(|| format!("{provider_url}{DEFAULT_DSP_PATH}"));
        let data_source_url = optional(env, "DATA_SOURCE_URL")
            .unwrap_or_else(|| DEFAULT_DATA_SOURCE_URL.to_string());

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Self {
            asset_id,
            provider_url,
            provider_bpn,
            provider_api_key,
            provider_dsp_url,
            consumer_url,
            consumer_bpn,
            consumer_api_key,
            data_source_url,
            debug,
        })
    }

    /// Identifiers of the provider-side resources for this asset.
    pub fn resource_ids(&self) -> ResourceIds {
        ResourceIds::derive(&self.asset_id)
    }
}

fn optional(env: &EnvFile, key: &str) -> Option<String> {
    env.get(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn trim_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

impl fmt::Debug for WorkflowConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowConfig")
            .field("asset_id", &self.asset_id)
            .field("provider_url", &self.provider_url)
            .field("provider_bpn", &self.provider_bpn)
            .field("provider_api_key", &redact(&self.provider_api_key))
            .field("provider_dsp_url", &self.provider_dsp_url)
            .field("consumer_url", &self.consumer_url)
            .field("consumer_bpn", &self.consumer_bpn)
            .field("consumer_api_key", &redact(&self.consumer_api_key))
            .field("data_source_url", &self.data_source_url)
            .field("debug", &self.debug)
            .finish()
    }
}
