use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::{
    InsertOutcome, ListingCatalog, RecordStore, RelationStore, ShareStore, StoreError, Write,
    WriteBatch,
};
use crate::domain::{Contact, ContactId, Property, PropertyId, ShareId, TenantId, Versioned};
use crate::portal::query::{self, ListingQuery, SortKey};
use crate::relations::domain::{Relation, RelationFilter};
use crate::shares::domain::Share;

const CONTACTS: &str = "contacts";
const PROPERTIES: &str = "properties";
const RELATIONS: &str = "relations";
const SHARES: &str = "shares";

#[derive(Debug, Clone)]
struct StoredDocument {
    version: u64,
    body: Value,
}

#[derive(Debug, Default)]
struct TenantPartition {
    contacts: BTreeMap<String, StoredDocument>,
    properties: BTreeMap<String, StoredDocument>,
    relations: Vec<Value>,
    shares: BTreeMap<String, Value>,
}

/// Process-local document store. Documents are kept as JSON so every read and write
/// goes through the same schema checks a remote store adapter applies.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    partitions: Arc<Mutex<BTreeMap<TenantId, TenantPartition>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<TenantId, TenantPartition>>, StoreError> {
        self.partitions
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }

    /// Create a contact that does not exist yet.
    pub async fn create_contact(&self, contact: Contact) -> Result<(), StoreError> {
        let mut batch = WriteBatch::new(contact.tenant_id.clone());
        batch.put_contact(None, contact);
        self.commit(batch).await
    }

    /// Create a property that does not exist yet.
    pub async fn create_property(&self, property: Property) -> Result<(), StoreError> {
        let mut batch = WriteBatch::new(property.tenant_id.clone());
        batch.put_property(None, property);
        self.commit(batch).await
    }

    /// Every relation recorded by `tenant`, in insertion order.
    pub fn relations_of(&self, tenant: &TenantId) -> Result<Vec<Relation>, StoreError> {
        let partitions = self.lock()?;
        partitions
            .get(tenant)
            .map(|partition| {
                partition
                    .relations
                    .iter()
                    .map(|body| decode(RELATIONS, "-", body))
                    .collect()
            })
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

fn encode<T: Serialize>(collection: &'static str, id: &str, doc: &T) -> Result<Value, StoreError> {
    serde_json::to_value(doc).map_err(|err| StoreError::Schema {
        collection,
        id: id.to_string(),
        reason: err.to_string(),
    })
}

fn decode<T: DeserializeOwned>(
    collection: &'static str,
    id: &str,
    body: &Value,
) -> Result<T, StoreError> {
    serde_json::from_value(body.clone()).map_err(|err| StoreError::Schema {
        collection,
        id: id.to_string(),
        reason: err.to_string(),
    })
}

fn read_versioned<T: DeserializeOwned>(
    collection: &'static str,
    id: &str,
    stored: Option<&StoredDocument>,
) -> Result<Option<Versioned<T>>, StoreError> {
    stored
        .map(|stored| {
            decode(collection, id, &stored.body).map(|doc| Versioned {
                version: stored.version,
                doc,
            })
        })
        .transpose()
}

fn check_version(
    collection: &'static str,
    id: &str,
    current: Option<&StoredDocument>,
    expected: Option<u64>,
) -> Result<(), StoreError> {
    let actual = current.map(|stored| stored.version);
    if actual == expected {
        Ok(())
    } else {
        Err(StoreError::VersionConflict {
            collection,
            id: id.to_string(),
        })
    }
}

fn schema_error(collection: &'static str, id: &str, reason: impl Into<String>) -> StoreError {
    StoreError::Schema {
        collection,
        id: id.to_string(),
        reason: reason.into(),
    }
}

enum Staged {
    Contact(String, u64, Value),
    Property(String, u64, Value),
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn contact(
        &self,
        tenant: &TenantId,
        id: &ContactId,
    ) -> Result<Option<Versioned<Contact>>, StoreError> {
        let partitions = self.lock()?;
        let stored = partitions
            .get(tenant)
            .and_then(|partition| partition.contacts.get(id.as_str()));
        read_versioned(CONTACTS, id.as_str(), stored)
    }

    async fn property(
        &self,
        tenant: &TenantId,
        id: &PropertyId,
    ) -> Result<Option<Versioned<Property>>, StoreError> {
        let partitions = self.lock()?;
        let stored = partitions
            .get(tenant)
            .and_then(|partition| partition.properties.get(id.as_str()));
        read_versioned(PROPERTIES, id.as_str(), stored)
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut partitions = self.lock()?;
        let partition = partitions.entry(batch.tenant.clone()).or_default();

        // Validate everything before touching the partition.
        let mut staged = Vec::with_capacity(batch.writes.len());
        for write in &batch.writes {
            match write {
                Write::Contact {
                    expected_version,
                    doc,
                } => {
                    let id = doc.id.as_str();
                    if doc.id.is_blank() {
                        return Err(schema_error(CONTACTS, id, "id must not be empty"));
                    }
                    if doc.id.is_too_long() {
                        return Err(schema_error(CONTACTS, id, "id exceeds the length limit"));
                    }
                    if doc.tenant_id != batch.tenant {
                        return Err(schema_error(CONTACTS, id, "tenantId differs from batch"));
                    }
                    let current = partition.contacts.get(id);
                    check_version(CONTACTS, id, current, *expected_version)?;
                    let next = expected_version.map_or(1, |version| version + 1);
                    staged.push(Staged::Contact(
                        id.to_string(),
                        next,
                        encode(CONTACTS, id, doc)?,
                    ));
                }
                Write::Property {
                    expected_version,
                    doc,
                } => {
                    let id = doc.id.as_str();
                    if doc.id.is_blank() {
                        return Err(schema_error(PROPERTIES, id, "id must not be empty"));
                    }
                    if doc.id.is_too_long() {
                        return Err(schema_error(PROPERTIES, id, "id exceeds the length limit"));
                    }
                    if doc.tenant_id != batch.tenant {
                        return Err(schema_error(PROPERTIES, id, "tenantId differs from batch"));
                    }
                    let current = partition.properties.get(id);
                    check_version(PROPERTIES, id, current, *expected_version)?;
                    let next = expected_version.map_or(1, |version| version + 1);
                    staged.push(Staged::Property(
                        id.to_string(),
                        next,
                        encode(PROPERTIES, id, doc)?,
                    ));
                }
            }
        }

        for staged in staged {
            match staged {
                Staged::Contact(id, version, body) => {
                    partition
                        .contacts
                        .insert(id, StoredDocument { version, body });
                }
                Staged::Property(id, version, body) => {
                    partition
                        .properties
                        .insert(id, StoredDocument { version, body });
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RelationStore for MemoryStore {
    async fn insert(&self, relation: Relation) -> Result<Relation, StoreError> {
        relation
            .validate()
            .map_err(|reason| schema_error(RELATIONS, relation.id.as_str(), reason))?;
        let body = encode(RELATIONS, relation.id.as_str(), &relation)?;

        let mut partitions = self.lock()?;
        partitions
            .entry(relation.tenant_id.clone())
            .or_default()
            .relations
            .push(body);
        Ok(relation)
    }

    async fn insert_if_absent(&self, relation: Relation) -> Result<InsertOutcome, StoreError> {
        relation
            .validate()
            .map_err(|reason| schema_error(RELATIONS, relation.id.as_str(), reason))?;
        let body = encode(RELATIONS, relation.id.as_str(), &relation)?;
        let key = relation.key();

        let mut partitions = self.lock()?;
        let partition = partitions.entry(relation.tenant_id.clone()).or_default();
        for stored in &partition.relations {
            let existing: Relation = decode(RELATIONS, relation.id.as_str(), stored)?;
            if existing.key() == key {
                return Ok(InsertOutcome::Existing(existing));
            }
        }
        partition.relations.push(body);
        Ok(InsertOutcome::Inserted(relation))
    }

    async fn find(
        &self,
        tenant: &TenantId,
        filter: &RelationFilter,
    ) -> Result<Vec<Relation>, StoreError> {
        let mut found = Vec::new();
        for relation in self.relations_of(tenant)? {
            if filter.matches(&relation) {
                found.push(relation);
            }
        }
        Ok(found)
    }
}

#[async_trait]
impl ShareStore for MemoryStore {
    async fn insert(&self, share: Share) -> Result<Share, StoreError> {
        share
            .validate()
            .map_err(|reason| schema_error(SHARES, share.id.as_str(), reason))?;
        let body = encode(SHARES, share.id.as_str(), &share)?;

        let mut partitions = self.lock()?;
        let partition = partitions.entry(share.tenant_id.clone()).or_default();
        if partition.shares.contains_key(share.id.as_str()) {
            return Err(StoreError::VersionConflict {
                collection: SHARES,
                id: share.id.to_string(),
            });
        }
        partition.shares.insert(share.id.to_string(), body);
        Ok(share)
    }

    async fn find_by_token(&self, token: &str) -> Result<Vec<Share>, StoreError> {
        let partitions = self.lock()?;
        let mut found = Vec::new();
        for partition in partitions.values() {
            for (id, body) in &partition.shares {
                if body.get("token").and_then(Value::as_str) == Some(token) {
                    found.push(decode(SHARES, id, body)?);
                }
            }
        }
        Ok(found)
    }

    async fn delete(&self, tenant: &TenantId, id: &ShareId) -> Result<bool, StoreError> {
        let mut partitions = self.lock()?;
        Ok(partitions
            .get_mut(tenant)
            .and_then(|partition| partition.shares.remove(id.as_str()))
            .is_some())
    }
}

#[async_trait]
impl ListingCatalog for MemoryStore {
    async fn tenants(&self) -> Result<Vec<TenantId>, StoreError> {
        let partitions = self.lock()?;
        Ok(partitions
            .iter()
            .filter(|(_, partition)| !partition.properties.is_empty())
            .map(|(tenant, _)| tenant.clone())
            .collect())
    }

    async fn listings(
        &self,
        tenant: &TenantId,
        query: &ListingQuery,
        after: Option<&SortKey>,
        limit: usize,
    ) -> Result<Vec<Property>, StoreError> {
        let partitions = self.lock()?;
        let Some(partition) = partitions.get(tenant) else {
            return Ok(Vec::new());
        };
        let properties = partition
            .properties
            .iter()
            .map(|(id, stored)| decode::<Property>(PROPERTIES, id, &stored.body))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(query::select_page(&properties, query, after, limit))
    }
}
