use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::service::{AssociationChange, AssociationService};
use super::transition::AssociationKind;
use crate::auth::AdminPrincipal;
use crate::domain::{ContactId, PropertyId};
use crate::error::AppError;
use crate::store::RecordStore;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssociationRequest {
    #[serde(rename = "type")]
    pub kind: AssociationKind,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationResponse {
    pub contact_id: ContactId,
    pub property_id: PropertyId,
    #[serde(rename = "type")]
    pub kind: Option<AssociationKind>,
}

/// Back-office routes of the association state machine.
pub fn association_router<D>(service: Arc<AssociationService<D>>) -> Router
where
    D: RecordStore + 'static,
{
    Router::new()
        .route(
            "/admin/api/v1/contacts/:contact_id/associations/:property_id",
            get(show_handler::<D>)
                .put(set_handler::<D>)
                .delete(clear_handler::<D>),
        )
        .with_state(service)
}

pub(crate) async fn show_handler<D>(
    State(service): State<Arc<AssociationService<D>>>,
    principal: AdminPrincipal,
    Path((contact_id, property_id)): Path<(ContactId, PropertyId)>,
) -> Result<Json<AssociationResponse>, AppError>
where
    D: RecordStore + 'static,
{
    let kind = service
        .association(&principal.tenant_id, &contact_id, &property_id)
        .await?;
    Ok(Json(AssociationResponse {
        contact_id,
        property_id,
        kind,
    }))
}

pub(crate) async fn set_handler<D>(
    State(service): State<Arc<AssociationService<D>>>,
    principal: AdminPrincipal,
    Path((contact_id, property_id)): Path<(ContactId, PropertyId)>,
    Json(request): Json<AssociationRequest>,
) -> Result<Json<AssociationChange>, AppError>
where
    D: RecordStore + 'static,
{
    let change = service
        .set_association(&principal.tenant_id, &contact_id, &property_id, request.kind)
        .await?;
    Ok(Json(change))
}

pub(crate) async fn clear_handler<D>(
    State(service): State<Arc<AssociationService<D>>>,
    principal: AdminPrincipal,
    Path((contact_id, property_id)): Path<(ContactId, PropertyId)>,
) -> Result<Json<AssociationChange>, AppError>
where
    D: RecordStore + 'static,
{
    let change = service
        .disassociate(&principal.tenant_id, &contact_id, &property_id)
        .await?;
    Ok(Json(change))
}
