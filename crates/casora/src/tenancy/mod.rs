//! Host-based tenant resolution and per-request scoping.

pub mod host;
pub mod middleware;
pub mod registry;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::domain::TenantId;

pub use host::{HostResolver, Scope};
pub use middleware::{route_request, RoutingState, ADMIN_PREFIX, SITE_PREFIX, TENANT_HEADER};
pub use registry::{DomainRegistry, RegistryError, StaticDomainRegistry};

/// Attached to every routed request by [`route_request`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestScope {
    pub scope: Scope,
    pub host: String,
    pub tenant: Option<TenantId>,
}

/// Extracts the tenant of a tenant-site request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteTenant(pub TenantId);

#[async_trait]
impl<S> FromRequestParts<S> for SiteTenant
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestScope>()
            .and_then(|scope| scope.tenant.clone())
            .map(SiteTenant)
            .ok_or_else(|| {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "error": "tenant site required" })),
                )
                    .into_response()
            })
    }
}
