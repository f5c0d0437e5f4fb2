use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use super::domain::{RelationFilter, RelationRole, RelationStatus, Subject, SubjectType};
use super::service::{AgentLink, FavoriteOutcome, RelationManager};
use crate::auth::AdminPrincipal;
use crate::domain::{ClientId, ContactId, PropertyId, TenantId};
use crate::error::{AppError, DomainError};
use crate::store::{RecordStore, RelationStore};
use crate::tenancy::SiteTenant;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRequest {
    pub property_id: PropertyId,
    pub client_id: ClientId,
    #[serde(default)]
    pub consent: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentLinkRequest {
    pub contact_id: ContactId,
    pub property_tenant_id: TenantId,
    pub property_id: PropertyId,
    pub role: RelationRole,
    #[serde(default = "default_status")]
    pub status: RelationStatus,
}

fn default_status() -> RelationStatus {
    RelationStatus::New
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationLookup {
    pub subject_type: Option<SubjectType>,
    pub subject_id: Option<String>,
    pub property_tenant_id: Option<TenantId>,
    pub property_id: Option<PropertyId>,
    pub role: Option<RelationRole>,
}

impl RelationLookup {
    fn into_filter(self) -> Result<RelationFilter, DomainError> {
        let subject = match (self.subject_type, self.subject_id) {
            (Some(SubjectType::Client), Some(id)) => Some(Subject::Client(ClientId(id))),
            (Some(SubjectType::Contact), Some(id)) => Some(Subject::Contact(ContactId(id))),
            (None, None) => None,
            _ => {
                return Err(DomainError::Validation(
                    "subjectType and subjectId must be given together".to_string(),
                ))
            }
        };

        Ok(RelationFilter {
            subject,
            property_tenant_id: self.property_tenant_id,
            property_id: self.property_id,
            role: self.role,
        })
    }
}

/// Tenant-site and back-office routes of the relation manager.
pub fn relation_router<R, D>(manager: Arc<RelationManager<R, D>>) -> Router
where
    R: RelationStore + 'static,
    D: RecordStore + 'static,
{
    Router::new()
        .route(
            "/sites/:tenant_id/api/v1/favorites",
            post(favorite_handler::<R, D>),
        )
        .route(
            "/admin/api/v1/relations",
            post(agent_link_handler::<R, D>).get(lookup_handler::<R, D>),
        )
        .with_state(manager)
}

pub(crate) async fn favorite_handler<R, D>(
    State(manager): State<Arc<RelationManager<R, D>>>,
    SiteTenant(tenant): SiteTenant,
    Json(request): Json<FavoriteRequest>,
) -> Result<Response, AppError>
where
    R: RelationStore + 'static,
    D: RecordStore + 'static,
{
    let outcome = manager
        .create_from_favorite(
            &tenant,
            &request.property_id,
            &request.client_id,
            request.consent,
        )
        .await?;

    let status = match outcome {
        FavoriteOutcome::Created(_) => StatusCode::CREATED,
        FavoriteOutcome::AlreadyExists(_) | FavoriteOutcome::SkippedNoConsent => StatusCode::OK,
    };
    Ok((status, Json(outcome)).into_response())
}

pub(crate) async fn agent_link_handler<R, D>(
    State(manager): State<Arc<RelationManager<R, D>>>,
    principal: AdminPrincipal,
    Json(request): Json<AgentLinkRequest>,
) -> Result<Response, AppError>
where
    R: RelationStore + 'static,
    D: RecordStore + 'static,
{
    let relation = manager
        .create_from_agent_link(AgentLink {
            agent_tenant_id: principal.tenant_id,
            contact_id: request.contact_id,
            property_tenant_id: request.property_tenant_id,
            property_id: request.property_id,
            role: request.role,
            status: request.status,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(relation)).into_response())
}

pub(crate) async fn lookup_handler<R, D>(
    State(manager): State<Arc<RelationManager<R, D>>>,
    principal: AdminPrincipal,
    Query(lookup): Query<RelationLookup>,
) -> Result<Response, AppError>
where
    R: RelationStore + 'static,
    D: RecordStore + 'static,
{
    let filter = lookup.into_filter()?;
    let relations = manager.relations(&principal.tenant_id, &filter).await?;
    Ok(Json(relations).into_response())
}
