use serde::{Deserialize, Serialize};

/// Authenticated caller context. Every repository call scopes its queries to
/// `tenant_id` taken from here; request payloads are never consulted for
/// tenant identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(rename = "tenantId")]
    pub tenant_id: String,
    pub role: String,
}
