use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use super::query::ListingQuery;
use super::service::{PortalPage, PortalService};
use crate::domain::{Currency, Modality};
use crate::error::AppError;
use crate::store::ListingCatalog;

/// Query string of `GET /api/v1/portal/properties`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalRequest {
    pub modality: Option<Modality>,
    pub property_type: Option<String>,
    pub bedrooms: Option<u8>,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    pub currency: Option<Currency>,
    pub featured: Option<bool>,
    pub cursor: Option<String>,
    pub page_size: Option<usize>,
}

impl PortalRequest {
    fn into_parts(self) -> (ListingQuery, Option<String>, Option<usize>) {
        let query = ListingQuery {
            modality: self.modality,
            property_type: self.property_type,
            bedrooms: self.bedrooms,
            min_price: self.min_price,
            max_price: self.max_price,
            currency: self.currency,
            featured: self.featured,
        };
        (query, self.cursor, self.page_size)
    }
}

/// Platform-scope routes of the public portal.
pub fn portal_router<C>(service: Arc<PortalService<C>>) -> Router
where
    C: ListingCatalog + 'static,
{
    Router::new()
        .route("/api/v1/portal/properties", get(list_handler::<C>))
        .with_state(service)
}

pub(crate) async fn list_handler<C>(
    State(service): State<Arc<PortalService<C>>>,
    Query(request): Query<PortalRequest>,
) -> Result<Json<PortalPage>, AppError>
where
    C: ListingCatalog + 'static,
{
    let (query, cursor, page_size) = request.into_parts();
    let page = service.list(&query, cursor.as_deref(), page_size).await?;
    Ok(Json(page))
}
