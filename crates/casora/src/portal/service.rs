use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::cursor::{make_cursor, parse_cursor};
use super::query::{ListingQuery, SortKey};
use crate::config::PortalConfig;
use crate::domain::Property;
use crate::error::DomainError;
use crate::store::ListingCatalog;

/// One page of the cross-tenant listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalPage {
    pub properties: Vec<Property>,
    pub next_cursor: Option<String>,
}

/// Cross-tenant listing. Queries every tenant's catalog and merges the results, so
/// each row keeps the tenant id it was read from.
pub struct PortalService<C> {
    catalog: Arc<C>,
    config: PortalConfig,
}

impl<C> PortalService<C>
where
    C: ListingCatalog + 'static,
{
    pub fn new(catalog: Arc<C>, config: PortalConfig) -> Self {
        Self { catalog, config }
    }

    pub fn page_size(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.config.default_page_size)
            .clamp(1, self.config.max_page_size.max(1))
    }

    pub async fn list(
        &self,
        query: &ListingQuery,
        cursor: Option<&str>,
        page_size: Option<usize>,
    ) -> Result<PortalPage, DomainError> {
        query.validate().map_err(DomainError::Validation)?;
        let page_size = self.page_size(page_size);
        let currency = query.currency();

        let after = match cursor.map(str::trim).filter(|raw| !raw.is_empty()) {
            Some(raw) => {
                let key = parse_cursor(raw)
                    .ok_or_else(|| DomainError::Validation("malformed cursor".to_string()))?;
                if key.currency != currency {
                    return Err(DomainError::Validation(format!(
                        "cursor was issued for {} ordering, not {}",
                        key.currency.code(),
                        currency.code()
                    )));
                }
                Some(key)
            }
            None => None,
        };

        let tenants = self.catalog.tenants().await?;
        let mut rows: Vec<(SortKey, Property)> = Vec::new();
        for tenant in &tenants {
            // One extra row per tenant tells us whether another page exists.
            let listings = self
                .catalog
                .listings(tenant, query, after.as_ref(), page_size + 1)
                .await?;
            rows.extend(
                listings
                    .into_iter()
                    .map(|property| (SortKey::of(&property, currency), property)),
            );
        }

        rows.sort_by(|(left, _), (right, _)| left.cmp(right));
        let has_more = rows.len() > page_size;
        rows.truncate(page_size);

        let next_cursor = if has_more {
            rows.last().map(|(key, _)| make_cursor(key))
        } else {
            None
        };

        debug!(
            tenants = tenants.len(),
            returned = rows.len(),
            has_more,
            "portal page assembled"
        );

        Ok(PortalPage {
            properties: rows.into_iter().map(|(_, property)| property).collect(),
            next_cursor,
        })
    }
}
