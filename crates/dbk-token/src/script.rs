//! The fixed on-chain script and the CIP-67/68 unit label prefixes.

use serde::{Deserialize, Serialize};

/// Hex label prefix of the reference unit (label 100).
pub const REF_LABEL: &str = "000643b0";
/// Hex label prefix of the user unit (label 222).
pub const USR_LABEL: &str = "000de140";
/// Hex label prefix of the metadata unit.
pub const MDT_LABEL: &str = "000de141";

/// Every label prefix is 4 bytes, 8 hex characters.
pub const LABEL_HEX_LEN: usize = 8;

/// The deployed minting/spending script and where its outputs live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptConfig {
    /// Script address holding every reference unit.
    pub address: String,
    /// Minting policy identifier (56 hex chars).
    pub policy_id: String,
    /// Serialized script attached to transactions, hex.
    pub script: String,
}

/// Full unit name: policy id ++ label prefix ++ asset name.
pub fn unit(policy_id: &str, label: &str, asset_name: &str) -> String {
    format!("{policy_id}{label}{asset_name}")
}

/// Map a user-held unit's asset name (label included) to its reference
/// unit under the same policy.
pub fn ref_unit_from_user_asset(policy_id: &str, user_asset_name: &str) -> Option<String> {
    if user_asset_name.len() <= LABEL_HEX_LEN {
        return None;
    }
    Some(unit(policy_id, REF_LABEL, &user_asset_name[LABEL_HEX_LEN..]))
}
