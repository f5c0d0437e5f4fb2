use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use super::domain::{
    Relation, RelationFilter, RelationRole, RelationSource, RelationStatus, Subject,
};
use crate::domain::{ClientId, ContactId, PropertyId, RelationId, TenantId};
use crate::error::DomainError;
use crate::store::{InsertOutcome, RecordStore, RelationStore};

/// Result of a favorite request. Skips are reported, never silent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "relation", rename_all = "snake_case")]
pub enum FavoriteOutcome {
    Created(Relation),
    AlreadyExists(Relation),
    SkippedNoConsent,
}

/// Arguments of an agent link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentLink {
    pub agent_tenant_id: TenantId,
    pub contact_id: ContactId,
    pub property_tenant_id: TenantId,
    pub property_id: PropertyId,
    pub role: RelationRole,
    pub status: RelationStatus,
}

/// Creates and looks up relation records.
pub struct RelationManager<R, D> {
    relations: Arc<R>,
    records: Arc<D>,
}

fn require(field: &str, blank: bool) -> Result<(), DomainError> {
    if blank {
        Err(DomainError::Validation(format!("{field} is required")))
    } else {
        Ok(())
    }
}

fn next_relation_id() -> RelationId {
    RelationId(Uuid::new_v4().to_string())
}

impl<R, D> RelationManager<R, D>
where
    R: RelationStore + 'static,
    D: RecordStore + 'static,
{
    pub fn new(relations: Arc<R>, records: Arc<D>) -> Self {
        Self { relations, records }
    }

    /// Record that a platform client favorited a property. The relation is filed in
    /// the property's tenant; repeated calls leave a single relation behind.
    pub async fn create_from_favorite(
        &self,
        property_tenant_id: &TenantId,
        property_id: &PropertyId,
        client_id: &ClientId,
        consent: bool,
    ) -> Result<FavoriteOutcome, DomainError> {
        require("propertyTenantId", property_tenant_id.is_blank())?;
        require("propertyId", property_id.is_blank())?;
        require("clientId", client_id.is_blank())?;

        if !consent {
            debug!(
                tenant = %property_tenant_id,
                property = %property_id,
                client = %client_id,
                "favorite skipped without consent"
            );
            return Ok(FavoriteOutcome::SkippedNoConsent);
        }

        if self
            .records
            .property(property_tenant_id, property_id)
            .await?
            .is_none()
        {
            return Err(DomainError::not_found("property", property_id));
        }

        let now = Utc::now();
        let relation = Relation {
            id: next_relation_id(),
            tenant_id: property_tenant_id.clone(),
            subject: Subject::Client(client_id.clone()),
            property_tenant_id: property_tenant_id.clone(),
            property_id: property_id.clone(),
            role: RelationRole::Interested,
            source: RelationSource::ClientFavorite,
            status: RelationStatus::New,
            created_at: now,
            updated_at: now,
        };
        relation.validate().map_err(DomainError::Validation)?;

        match self.relations.insert_if_absent(relation).await? {
            InsertOutcome::Inserted(relation) => {
                info!(
                    tenant = %relation.tenant_id,
                    property = %relation.property_id,
                    client = %client_id,
                    relation = %relation.id,
                    "favorite recorded"
                );
                Ok(FavoriteOutcome::Created(relation))
            }
            InsertOutcome::Existing(relation) => {
                debug!(relation = %relation.id, "favorite already recorded");
                Ok(FavoriteOutcome::AlreadyExists(relation))
            }
        }
    }

    /// Record an agent's link between one of their contacts and any tenant's property.
    /// Always inserts into the agent's own tenant.
    pub async fn create_from_agent_link(&self, link: AgentLink) -> Result<Relation, DomainError> {
        let AgentLink {
            agent_tenant_id,
            contact_id,
            property_tenant_id,
            property_id,
            role,
            status,
        } = link;
        require("agentTenantId", agent_tenant_id.is_blank())?;
        require("contactId", contact_id.is_blank())?;
        require("propertyTenantId", property_tenant_id.is_blank())?;
        require("propertyId", property_id.is_blank())?;

        if self
            .records
            .contact(&agent_tenant_id, &contact_id)
            .await?
            .is_none()
        {
            return Err(DomainError::not_found("contact", &contact_id));
        }
        if self
            .records
            .property(&property_tenant_id, &property_id)
            .await?
            .is_none()
        {
            return Err(DomainError::not_found("property", &property_id));
        }

        let now = Utc::now();
        let relation = Relation {
            id: next_relation_id(),
            tenant_id: agent_tenant_id,
            subject: Subject::Contact(contact_id),
            property_tenant_id,
            property_id,
            role,
            source: RelationSource::AgentLink,
            status,
            created_at: now,
            updated_at: now,
        };
        relation.validate().map_err(DomainError::Validation)?;
        let relation = self.relations.insert(relation).await?;

        info!(
            tenant = %relation.tenant_id,
            property_tenant = %relation.property_tenant_id,
            property = %relation.property_id,
            subject = relation.subject.id(),
            role = ?relation.role,
            relation = %relation.id,
            "agent link recorded"
        );
        Ok(relation)
    }

    /// Relations recorded by `tenant` that match `filter`.
    pub async fn relations(
        &self,
        tenant: &TenantId,
        filter: &RelationFilter,
    ) -> Result<Vec<Relation>, DomainError> {
        require("tenantId", tenant.is_blank())?;
        Ok(self.relations.find(tenant, filter).await?)
    }
}
