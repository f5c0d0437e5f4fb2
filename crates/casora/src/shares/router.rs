use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;

use super::domain::{SharedProperty, ShareView};
use super::service::ShareManager;
use crate::auth::AdminPrincipal;
use crate::domain::{ContactId, ShareId};
use crate::error::AppError;
use crate::store::{RecordStore, ShareStore};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShareRequest {
    pub properties: Vec<SharedProperty>,
    #[serde(default)]
    pub contact_id: Option<ContactId>,
}

/// Public token lookup and back-office share management.
pub fn share_router<S, D>(manager: Arc<ShareManager<S, D>>) -> Router
where
    S: ShareStore + 'static,
    D: RecordStore + 'static,
{
    Router::new()
        .route("/api/v1/shares/:token", get(open_handler::<S, D>))
        .route("/admin/api/v1/shares", post(create_handler::<S, D>))
        .route(
            "/admin/api/v1/shares/:share_id",
            delete(revoke_handler::<S, D>),
        )
        .with_state(manager)
}

pub(crate) async fn open_handler<S, D>(
    State(manager): State<Arc<ShareManager<S, D>>>,
    Path(token): Path<String>,
) -> Result<Json<ShareView>, AppError>
where
    S: ShareStore + 'static,
    D: RecordStore + 'static,
{
    Ok(Json(manager.open(&token).await?))
}

pub(crate) async fn create_handler<S, D>(
    State(manager): State<Arc<ShareManager<S, D>>>,
    principal: AdminPrincipal,
    Json(request): Json<CreateShareRequest>,
) -> Result<Response, AppError>
where
    S: ShareStore + 'static,
    D: RecordStore + 'static,
{
    let handle = manager
        .create_share_list(
            &principal.tenant_id,
            request.properties,
            &principal.user_id,
            request.contact_id,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(handle)).into_response())
}

pub(crate) async fn revoke_handler<S, D>(
    State(manager): State<Arc<ShareManager<S, D>>>,
    principal: AdminPrincipal,
    Path(share_id): Path<ShareId>,
) -> Result<StatusCode, AppError>
where
    S: ShareStore + 'static,
    D: RecordStore + 'static,
{
    manager.revoke(&principal.tenant_id, &share_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
