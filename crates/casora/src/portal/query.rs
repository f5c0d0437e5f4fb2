use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::domain::{Currency, Modality, Property, PropertyId, TenantId};

/// Equality and range filters of a portal listing request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingQuery {
    #[serde(default)]
    pub modality: Option<Modality>,
    #[serde(default)]
    pub property_type: Option<String>,
    #[serde(default)]
    pub bedrooms: Option<u8>,
    #[serde(default)]
    pub min_price: Option<u64>,
    #[serde(default)]
    pub max_price: Option<u64>,
    #[serde(default)]
    pub currency: Option<Currency>,
    #[serde(default)]
    pub featured: Option<bool>,
}

impl ListingQuery {
    /// Currency that prices are filtered and ordered by.
    pub fn currency(&self) -> Currency {
        self.currency.unwrap_or_default()
    }

    pub fn matches(&self, property: &Property) -> bool {
        let price = property.price_in(self.currency());

        self.modality.map_or(true, |modality| property.modality == modality)
            && self
                .property_type
                .as_deref()
                .map_or(true, |kind| property.property_type.eq_ignore_ascii_case(kind))
            && self.bedrooms.map_or(true, |bedrooms| property.bedrooms == bedrooms)
            && self.min_price.map_or(true, |min| price >= min)
            && self.max_price.map_or(true, |max| price <= max)
            && self.featured.map_or(true, |featured| property.featured == featured)
    }

    pub fn validate(&self) -> Result<(), String> {
        match (self.min_price, self.max_price) {
            (Some(min), Some(max)) if min > max => {
                Err(format!("minPrice {min} is greater than maxPrice {max}"))
            }
            _ => Ok(()),
        }
    }
}

/// Position of a row in the single portal ordering: price descending, then tenant and
/// property id ascending.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortKey {
    pub currency: Currency,
    pub price: u64,
    pub tenant_id: TenantId,
    pub property_id: PropertyId,
}

impl SortKey {
    pub fn of(property: &Property, currency: Currency) -> Self {
        Self {
            currency,
            price: property.price_in(currency),
            tenant_id: property.tenant_id.clone(),
            property_id: property.id.clone(),
        }
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .price
            .cmp(&self.price)
            .then_with(|| self.tenant_id.cmp(&other.tenant_id))
            .then_with(|| self.property_id.cmp(&other.property_id))
            .then_with(|| self.currency.cmp(&other.currency))
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Filter, order and cut one tenant's properties. Store adapters without a native
/// query engine use this directly.
pub fn select_page<'a, I>(
    properties: I,
    query: &ListingQuery,
    after: Option<&SortKey>,
    limit: usize,
) -> Vec<Property>
where
    I: IntoIterator<Item = &'a Property>,
{
    let currency = query.currency();
    let mut rows: Vec<(SortKey, &Property)> = properties
        .into_iter()
        .filter(|property| query.matches(property))
        .map(|property| (SortKey::of(property, currency), property))
        .filter(|(key, _)| after.map_or(true, |after| key > after))
        .collect();
    rows.sort_by(|(left, _), (right, _)| left.cmp(right));
    rows.into_iter()
        .take(limit)
        .map(|(_, property)| property.clone())
        .collect()
}
