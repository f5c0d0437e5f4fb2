//! Contracts for the shared document store.
//!
//! The store is an external collaborator; the core only relies on per-document reads,
//! compare-and-set batch commits, insert-if-absent for relations and per-tenant
//! listing queries. [`memory::MemoryStore`] implements every contract in process.

pub mod memory;

use async_trait::async_trait;

use crate::domain::{Contact, ContactId, Property, PropertyId, ShareId, TenantId, Versioned};
use crate::portal::query::{ListingQuery, SortKey};
use crate::relations::domain::{Relation, RelationFilter};
use crate::shares::domain::Share;

/// Contact and property documents of one tenant.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn contact(
        &self,
        tenant: &TenantId,
        id: &ContactId,
    ) -> Result<Option<Versioned<Contact>>, StoreError>;

    async fn property(
        &self,
        tenant: &TenantId,
        id: &PropertyId,
    ) -> Result<Option<Versioned<Property>>, StoreError>;

    /// Apply every write or none of them. Fails with [`StoreError::VersionConflict`]
    /// when any document moved away from its expected version.
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;
}

/// Relation documents, partitioned by the tenant that recorded them.
#[async_trait]
pub trait RelationStore: Send + Sync {
    async fn insert(&self, relation: Relation) -> Result<Relation, StoreError>;

    /// Insert unless a relation with the same [`Relation::key`] already exists in the
    /// same partition. Check and insert happen as one step.
    async fn insert_if_absent(&self, relation: Relation) -> Result<InsertOutcome, StoreError>;

    async fn find(
        &self,
        tenant: &TenantId,
        filter: &RelationFilter,
    ) -> Result<Vec<Relation>, StoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(Relation),
    Existing(Relation),
}

#[async_trait]
pub trait ShareStore: Send + Sync {
    async fn insert(&self, share: Share) -> Result<Share, StoreError>;

    /// Every share carrying `token`, across all tenants.
    async fn find_by_token(&self, token: &str) -> Result<Vec<Share>, StoreError>;

    /// Returns whether a document was removed.
    async fn delete(&self, tenant: &TenantId, id: &ShareId) -> Result<bool, StoreError>;
}

/// Per-tenant property listings used by the cross-tenant portal.
#[async_trait]
pub trait ListingCatalog: Send + Sync {
    async fn tenants(&self) -> Result<Vec<TenantId>, StoreError>;

    /// Properties of `tenant` matching `query`, in portal order, strictly after `after`.
    async fn listings(
        &self,
        tenant: &TenantId,
        query: &ListingQuery,
        after: Option<&SortKey>,
        limit: usize,
    ) -> Result<Vec<Property>, StoreError>;
}

/// A set of document writes committed together inside one tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteBatch {
    pub tenant: TenantId,
    pub writes: Vec<Write>,
}

impl WriteBatch {
    pub fn new(tenant: TenantId) -> Self {
        Self {
            tenant,
            writes: Vec::new(),
        }
    }

    pub fn put_contact(&mut self, expected_version: Option<u64>, doc: Contact) -> &mut Self {
        self.writes.push(Write::Contact {
            expected_version,
            doc,
        });
        self
    }

    pub fn put_property(&mut self, expected_version: Option<u64>, doc: Property) -> &mut Self {
        self.writes.push(Write::Property {
            expected_version,
            doc,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// `expected_version: None` means the document must not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    Contact {
        expected_version: Option<u64>,
        doc: Contact,
    },
    Property {
        expected_version: Option<u64>,
        doc: Property,
    },
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document store unavailable: {0}")]
    Unavailable(String),
    #[error("{collection}/{id} changed since it was read")]
    VersionConflict { collection: &'static str, id: String },
    #[error("{collection}/{id} failed schema validation: {reason}")]
    Schema {
        collection: &'static str,
        id: String,
        reason: String,
    },
}
