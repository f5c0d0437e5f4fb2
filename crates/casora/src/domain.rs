//! Tenant-scoped records shared by the relationship, association, share and portal
//! modules.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Longest identifier, in bytes, the store accepts.
pub const MAX_ID_LEN: usize = 256;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }

            pub fn is_too_long(&self) -> bool {
                self.0.len() > MAX_ID_LEN
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Isolation boundary; every tenant owns its own collections.
    TenantId
);
string_id!(PropertyId);
string_id!(ContactId);
string_id!(
    /// Platform-scoped client account (not owned by any tenant).
    ClientId
);
string_id!(RelationId);
string_id!(ShareId);

/// Listing modality as published on the sites and the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modality {
    #[serde(rename = "venta")]
    Sale,
    #[serde(rename = "alquiler")]
    Rental,
}

/// Currencies every property is priced in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Pen,
}

impl Currency {
    pub fn code(self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Pen => "PEN",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Property {
    pub id: PropertyId,
    pub tenant_id: TenantId,
    pub title: String,
    pub property_type: String,
    pub modality: Modality,
    pub bedrooms: u8,
    pub price_usd: u64,
    pub price_pen: u64,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub owner_id: Option<ContactId>,
}

impl Property {
    pub fn price_in(&self, currency: Currency) -> u64 {
        match currency {
            Currency::Usd => self.price_usd,
            Currency::Pen => self.price_pen,
        }
    }

    pub fn is_owned_by(&self, contact: &ContactId) -> bool {
        self.owner_id.as_ref() == Some(contact)
    }
}

/// Role tags a CRM contact can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactRole {
    Owner,
    Buyer,
    Tenant,
    Lead,
}

/// CRM contact. A property id appears in at most one of the three association fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Contact {
    pub id: ContactId,
    pub tenant_id: TenantId,
    pub name: String,
    #[serde(default)]
    pub types: BTreeSet<ContactRole>,
    #[serde(default)]
    pub owner_of_property_ids: BTreeSet<PropertyId>,
    #[serde(default)]
    pub interested_in_property_ids: BTreeSet<PropertyId>,
    #[serde(default)]
    pub tenant_of_property_id: Option<PropertyId>,
}

impl Contact {
    pub fn new(tenant_id: TenantId, id: ContactId, name: impl Into<String>) -> Self {
        Self {
            id,
            tenant_id,
            name: name.into(),
            types: BTreeSet::new(),
            owner_of_property_ids: BTreeSet::new(),
            interested_in_property_ids: BTreeSet::new(),
            tenant_of_property_id: None,
        }
    }
}

/// A store-managed revision number paired with the document it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
    pub version: u64,
    pub doc: T,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn property_rejects_unknown_fields() {
        let payload = json!({
            "id": "P1",
            "tenantId": "demo",
            "title": "Depa en Miraflores",
            "propertyType": "departamento",
            "modality": "venta",
            "bedrooms": 2,
            "priceUsd": 150000,
            "pricePen": 560000,
            "legacyField": true
        });

        assert!(serde_json::from_value::<Property>(payload).is_err());
    }

    #[test]
    fn contact_defaults_association_fields() {
        let payload = json!({ "id": "C1", "tenantId": "demo", "name": "Rosa" });
        let contact: Contact = serde_json::from_value(payload).expect("contact parses");
        assert!(contact.owner_of_property_ids.is_empty());
        assert!(contact.tenant_of_property_id.is_none());
    }

    #[test]
    fn modality_uses_published_labels() {
        assert_eq!(json!(Modality::Sale), json!("venta"));
        assert_eq!(json!(Modality::Rental), json!("alquiler"));
        assert_eq!(json!(Currency::Pen), json!("PEN"));
    }
}
