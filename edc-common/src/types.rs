//! Identifiers shared between the provider and consumer steps.

use serde::{Deserialize, Serialize};

/// Provider-side resource identifiers for one asset.
///
/// All three are derived from the asset ID, so re-running the workflow
/// for the same asset addresses the same resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceIds {
    pub asset: String,
    pub policy: String,
    pub contract: String,
}

impl ResourceIds {
    pub fn derive(asset_id: &str) -> Self {
        Self {
            asset: asset_id.to_string(),
            policy: format!("{asset_id}-policy"),
            contract: format!("{asset_id}-contract"),
        }
    }
}
