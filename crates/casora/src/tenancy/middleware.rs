use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::uri::PathAndQuery;
use axum::http::{header, HeaderName, HeaderValue, StatusCode, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{debug, error};

use super::host::{HostResolver, Scope};
use super::registry::DomainRegistry;
use super::RequestScope;
use crate::domain::TenantId;

/// Request-scoped header carrying the resolved tenant to downstream code.
pub const TENANT_HEADER: HeaderName = HeaderName::from_static("x-tenant-id");
pub const ADMIN_PREFIX: &str = "/admin";
pub const SITE_PREFIX: &str = "/sites";

const PASSTHROUGH_PREFIXES: &[&str] = &[
    "/_next/",
    "/static/",
    "/assets/",
    "/_internal/",
    "/health",
    "/ready",
    "/metrics",
    "/favicon.ico",
];

const PASSTHROUGH_EXTENSIONS: &[&str] = &[
    "css", "js", "png", "jpg", "jpeg", "gif", "svg", "ico", "webp", "avif", "txt", "xml", "map",
    "woff", "woff2",
];

/// Shared state of [`route_request`].
#[derive(Clone)]
pub struct RoutingState {
    resolver: Arc<HostResolver>,
    registry: Arc<dyn DomainRegistry>,
}

impl RoutingState {
    pub fn new(resolver: HostResolver, registry: Arc<dyn DomainRegistry>) -> Self {
        Self {
            resolver: Arc::new(resolver),
            registry,
        }
    }
}

/// Static assets and framework internals are served as-is in every scope.
pub fn is_passthrough(path: &str) -> bool {
    if PASSTHROUGH_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix))
    {
        return true;
    }

    let last_segment = path.rsplit('/').next().unwrap_or_default();
    last_segment
        .rsplit_once('.')
        .map(|(_, extension)| {
            PASSTHROUGH_EXTENSIONS
                .iter()
                .any(|known| extension.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

fn is_under(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Resolve the request's scope, mount it under the matching route tree and record the
/// tenant for downstream extractors. Must wrap the router so the rewrite happens
/// before route matching. Never authorizes.
pub async fn route_request(
    State(state): State<RoutingState>,
    mut request: Request,
    next: Next,
) -> Response {
    // Only this middleware may set the tenant header.
    request.headers_mut().remove(&TENANT_HEADER);

    let path = request.uri().path().to_string();
    if is_passthrough(&path) {
        return next.run(request).await;
    }

    let Some(host) = request_host(&request) else {
        return reject(StatusCode::BAD_REQUEST, "missing host header");
    };

    let scope = match state.resolver.resolve(&host) {
        Scope::Unresolved(unknown) => match state.registry.lookup(&unknown).await {
            Ok(Some(tenant)) => Scope::Tenant(tenant),
            Ok(None) => {
                debug!(host = %unknown, "no tenant registered for host");
                return reject(StatusCode::NOT_FOUND, "unknown site");
            }
            Err(err) => {
                error!(host = %unknown, error = %err, "domain registry lookup failed");
                return reject(StatusCode::INTERNAL_SERVER_ERROR, "internal server error");
            }
        },
        resolved => resolved,
    };

    let prefix = match &scope {
        Scope::Platform => {
            if is_under(&path, ADMIN_PREFIX) || is_under(&path, SITE_PREFIX) {
                return reject(StatusCode::NOT_FOUND, "not found");
            }
            None
        }
        Scope::AdminApp => Some(ADMIN_PREFIX.to_string()),
        Scope::Tenant(tenant) => {
            let Ok(value) = HeaderValue::from_str(tenant.as_str()) else {
                return reject(StatusCode::BAD_REQUEST, "invalid tenant");
            };
            request.headers_mut().insert(TENANT_HEADER, value);
            Some(format!("{SITE_PREFIX}/{tenant}"))
        }
        Scope::Unresolved(_) => None,
    };

    if let Some(prefix) = prefix {
        match prefixed_uri(request.uri(), &prefix) {
            Some(uri) => *request.uri_mut() = uri,
            None => return reject(StatusCode::BAD_REQUEST, "invalid request path"),
        }
    }

    debug!(host = %host, scope = ?scope, path = %request.uri().path(), "request routed");
    request.extensions_mut().insert(RequestScope {
        tenant: tenant_of(&scope),
        scope,
        host,
    });
    next.run(request).await
}

fn tenant_of(scope: &Scope) -> Option<TenantId> {
    match scope {
        Scope::Tenant(tenant) => Some(tenant.clone()),
        _ => None,
    }
}

fn request_host(request: &Request) -> Option<String> {
    request
        .headers()
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| request.uri().host())
        .map(str::to_string)
        .filter(|host| !host.trim().is_empty())
}

fn prefixed_uri(uri: &Uri, prefix: &str) -> Option<Uri> {
    let original = uri
        .path_and_query()
        .map(PathAndQuery::as_str)
        .unwrap_or("/");
    let rewritten = PathAndQuery::try_from(format!("{prefix}{original}")).ok()?;

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(rewritten);
    Uri::from_parts(parts).ok()
}

fn reject(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_assets_and_internals_pass_through() {
        assert!(is_passthrough("/_next/static/chunk.js"));
        assert!(is_passthrough("/favicon.ico"));
        assert!(is_passthrough("/images/hero.WEBP"));
        assert!(is_passthrough("/health"));
        assert!(!is_passthrough("/api/v1/favorites"));
        assert!(!is_passthrough("/propiedades/casa.en.lima/detalle"));
    }

    #[test]
    fn prefix_match_respects_segment_boundaries() {
        assert!(is_under("/admin", ADMIN_PREFIX));
        assert!(is_under("/admin/api/v1/shares", ADMIN_PREFIX));
        assert!(!is_under("/administration", ADMIN_PREFIX));
    }

    #[test]
    fn rewrites_keep_the_query_string() {
        let uri: Uri = "/api/v1/items?page=2".parse().expect("valid uri");
        let rewritten = prefixed_uri(&uri, "/sites/demo").expect("rewrite succeeds");
        assert_eq!(rewritten.path(), "/sites/demo/api/v1/items");
        assert_eq!(rewritten.query(), Some("page=2"));
    }
}
