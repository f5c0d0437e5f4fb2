//! Contract with the external session provider, plus the back-office extractor.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use crate::config::SessionGrant;
use crate::domain::TenantId;
use crate::tenancy::{RequestScope, Scope};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalRole {
    Admin,
    Agent,
    Client,
}

/// Identity of the caller as reported by the session provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: String,
    pub role: PrincipalRole,
    pub tenant_id: Option<TenantId>,
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn principal(&self, bearer: &str) -> Result<Option<Principal>, AuthError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("session provider unavailable: {0}")]
    Unavailable(String),
}

/// Fixed bearer tokens, one agent principal each.
#[derive(Debug, Default, Clone)]
pub struct StaticSessions {
    sessions: HashMap<String, Principal>,
}

impl StaticSessions {
    pub fn from_grants(grants: &[SessionGrant]) -> Self {
        Self {
            sessions: grants
                .iter()
                .map(|grant| {
                    (
                        grant.token.clone(),
                        Principal {
                            user_id: grant.user_id.clone(),
                            role: PrincipalRole::Agent,
                            tenant_id: Some(grant.tenant_id.clone()),
                        },
                    )
                })
                .collect(),
        }
    }

    pub fn with_session(mut self, token: impl Into<String>, principal: Principal) -> Self {
        self.sessions.insert(token.into(), principal);
        self
    }
}

#[async_trait]
impl SessionProvider for StaticSessions {
    async fn principal(&self, bearer: &str) -> Result<Option<Principal>, AuthError> {
        Ok(self.sessions.get(bearer).cloned())
    }
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Attach the caller's [`Principal`] when the bearer token is known. Unknown or
/// missing tokens leave the request anonymous; handlers decide what that means.
pub async fn authenticate(
    State(provider): State<Arc<dyn SessionProvider>>,
    mut request: Request,
    next: Next,
) -> Response {
    request.extensions_mut().remove::<Principal>();

    if let Some(token) = bearer_token(&request).map(str::to_string) {
        match provider.principal(&token).await {
            Ok(Some(principal)) => {
                request.extensions_mut().insert(principal);
            }
            Ok(None) => {}
            Err(err) => {
                error!(error = %err, "session lookup failed");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal server error" })),
                )
                    .into_response();
            }
        }
    }

    next.run(request).await
}

/// A back-office caller acting on behalf of one tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminPrincipal {
    pub user_id: String,
    pub tenant_id: TenantId,
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminPrincipal
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let in_admin_app = parts
            .extensions
            .get::<RequestScope>()
            .is_some_and(|scope| scope.scope == Scope::AdminApp);
        if !in_admin_app {
            return Err(rejection(StatusCode::NOT_FOUND, "not found"));
        }

        let principal = parts
            .extensions
            .get::<Principal>()
            .ok_or_else(|| rejection(StatusCode::UNAUTHORIZED, "authentication required"))?;

        match (&principal.role, &principal.tenant_id) {
            (PrincipalRole::Admin | PrincipalRole::Agent, Some(tenant_id)) => Ok(AdminPrincipal {
                user_id: principal.user_id.clone(),
                tenant_id: tenant_id.clone(),
            }),
            _ => Err(rejection(
                StatusCode::FORBIDDEN,
                "no tenant attached to this account",
            )),
        }
    }
}

fn rejection(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
