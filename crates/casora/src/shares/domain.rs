use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ContactId, Property, PropertyId, ShareId, TenantId, MAX_ID_LEN};

/// One entry of a shared list; the property may live in any tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SharedProperty {
    pub property_tenant_id: TenantId,
    pub property_id: PropertyId,
}

/// Token-addressable, revocable list of properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Share {
    pub id: ShareId,
    pub tenant_id: TenantId,
    pub token: String,
    pub properties: Vec<SharedProperty>,
    pub contact_id: Option<ContactId>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Share {
    /// Write-side schema check.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.is_blank() || self.tenant_id.is_blank() {
            return Err("id and tenantId must not be empty".to_string());
        }
        if self.token.trim().is_empty() {
            return Err("token must not be empty".to_string());
        }
        if self.properties.is_empty() {
            return Err("properties must not be empty".to_string());
        }
        if self
            .properties
            .iter()
            .any(|entry| entry.property_tenant_id.is_blank() || entry.property_id.is_blank())
        {
            return Err("every shared property needs a tenant and an id".to_string());
        }
        let oversized = self.id.is_too_long()
            || self.tenant_id.is_too_long()
            || self.properties.iter().any(|entry| {
                entry.property_tenant_id.is_too_long() || entry.property_id.is_too_long()
            });
        if oversized {
            return Err(format!("identifiers must not exceed {MAX_ID_LEN} bytes"));
        }
        Ok(())
    }
}

/// Handle returned to the creator of a share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareHandle {
    pub share_id: ShareId,
    pub token: String,
}

/// A resolved share together with the properties that still exist.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareView {
    pub share_id: ShareId,
    pub contact_id: Option<ContactId>,
    pub created_at: DateTime<Utc>,
    pub properties: Vec<Property>,
    pub missing: usize,
}
