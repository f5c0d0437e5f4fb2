use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::domain::{Share, ShareHandle, SharedProperty, ShareView};
use super::token;
use crate::domain::{ContactId, ShareId, TenantId};
use crate::error::DomainError;
use crate::store::{RecordStore, ShareStore};

/// Creates, resolves and revokes shared property lists.
pub struct ShareManager<S, D> {
    shares: Arc<S>,
    records: Arc<D>,
}

impl<S, D> ShareManager<S, D>
where
    S: ShareStore + 'static,
    D: RecordStore + 'static,
{
    pub fn new(shares: Arc<S>, records: Arc<D>) -> Self {
        Self { shares, records }
    }

    pub async fn create_share_list(
        &self,
        tenant: &TenantId,
        properties: Vec<SharedProperty>,
        created_by: &str,
        contact_id: Option<ContactId>,
    ) -> Result<ShareHandle, DomainError> {
        if tenant.is_blank() {
            return Err(DomainError::Validation("tenantId is required".to_string()));
        }
        if properties.is_empty() {
            return Err(DomainError::Validation(
                "a share needs at least one property".to_string(),
            ));
        }

        let share = Share {
            id: ShareId(Uuid::new_v4().to_string()),
            tenant_id: tenant.clone(),
            token: token::generate_token(),
            properties,
            contact_id,
            created_by: created_by.to_string(),
            created_at: Utc::now(),
        };
        share.validate().map_err(DomainError::Validation)?;

        let share = self.shares.insert(share).await?;
        info!(
            tenant = %share.tenant_id,
            share = %share.id,
            properties = share.properties.len(),
            "share list created"
        );
        Ok(ShareHandle {
            share_id: share.id,
            token: share.token,
        })
    }

    /// Find the share carrying `token` in any tenant.
    pub async fn get_by_token(&self, token: &str) -> Result<Option<Share>, DomainError> {
        if !token::is_well_formed(token) {
            return Ok(None);
        }

        let mut matches = self.shares.find_by_token(token).await?;
        if matches.len() > 1 {
            let tenants: Vec<&str> = matches.iter().map(|share| share.tenant_id.as_str()).collect();
            error!(
                count = matches.len(),
                tenants = ?tenants,
                "share token is not unique"
            );
        }
        Ok(if matches.is_empty() {
            None
        } else {
            Some(matches.swap_remove(0))
        })
    }

    /// Resolve a token into the properties it still points at.
    pub async fn open(&self, token: &str) -> Result<ShareView, DomainError> {
        let share = self
            .get_by_token(token)
            .await?
            .ok_or_else(|| DomainError::not_found("share", "token"))?;

        let mut properties = Vec::with_capacity(share.properties.len());
        let mut missing = 0;
        for entry in &share.properties {
            match self
                .records
                .property(&entry.property_tenant_id, &entry.property_id)
                .await?
            {
                Some(property) => properties.push(property.doc),
                None => missing += 1,
            }
        }
        if missing > 0 {
            warn!(share = %share.id, missing, "shared properties no longer exist");
        }

        Ok(ShareView {
            share_id: share.id,
            contact_id: share.contact_id,
            created_at: share.created_at,
            properties,
            missing,
        })
    }

    /// Delete a share. Revoking an unknown share succeeds.
    pub async fn revoke(&self, tenant: &TenantId, share_id: &ShareId) -> Result<(), DomainError> {
        if tenant.is_blank() || share_id.is_blank() {
            return Err(DomainError::Validation(
                "tenantId and shareId are required".to_string(),
            ));
        }
        let removed = self.shares.delete(tenant, share_id).await?;
        info!(tenant = %tenant, share = %share_id, removed, "share revoked");
        Ok(())
    }
}
