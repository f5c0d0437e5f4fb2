use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::transition::{self, AssociationKind};
use crate::domain::{Contact, ContactId, Property, PropertyId, TenantId, Versioned};
use crate::error::DomainError;
use crate::store::{RecordStore, WriteBatch};

/// Association of a contact with a property before and after a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationChange {
    pub contact_id: ContactId,
    pub property_id: PropertyId,
    pub previous: Option<AssociationKind>,
    pub current: Option<AssociationKind>,
}

/// Moves contacts between owner, interested and tenant-of for a property, keeping the
/// property's owner mirror in step. Each change is one compare-and-set commit.
pub struct AssociationService<D> {
    records: Arc<D>,
}

impl<D> AssociationService<D>
where
    D: RecordStore + 'static,
{
    pub fn new(records: Arc<D>) -> Self {
        Self { records }
    }

    pub async fn association(
        &self,
        tenant: &TenantId,
        contact_id: &ContactId,
        property_id: &PropertyId,
    ) -> Result<Option<AssociationKind>, DomainError> {
        let (contact, _) = self.load_pair(tenant, contact_id, property_id).await?;
        Ok(transition::current(&contact.doc, property_id))
    }

    pub async fn set_association(
        &self,
        tenant: &TenantId,
        contact_id: &ContactId,
        property_id: &PropertyId,
        kind: AssociationKind,
    ) -> Result<AssociationChange, DomainError> {
        self.transition(tenant, contact_id, property_id, Some(kind))
            .await
    }

    /// Remove every association between the contact and the property.
    pub async fn disassociate(
        &self,
        tenant: &TenantId,
        contact_id: &ContactId,
        property_id: &PropertyId,
    ) -> Result<AssociationChange, DomainError> {
        self.transition(tenant, contact_id, property_id, None).await
    }

    async fn transition(
        &self,
        tenant: &TenantId,
        contact_id: &ContactId,
        property_id: &PropertyId,
        target: Option<AssociationKind>,
    ) -> Result<AssociationChange, DomainError> {
        let (contact, property) = self.load_pair(tenant, contact_id, property_id).await?;
        let previous = transition::current(&contact.doc, property_id);
        let next = transition::apply(&contact.doc, &property.doc, target);

        if next.contact == contact.doc && next.property == property.doc {
            debug!(
                tenant = %tenant,
                contact = %contact_id,
                property = %property_id,
                "association unchanged"
            );
            return Ok(AssociationChange {
                contact_id: contact_id.clone(),
                property_id: property_id.clone(),
                previous,
                current: previous,
            });
        }

        // Both documents are written with their read versions so a concurrent change
        // to either one fails the whole batch.
        let mut batch = WriteBatch::new(tenant.clone());
        batch
            .put_contact(Some(contact.version), next.contact)
            .put_property(Some(property.version), next.property);

        if let Some(displaced) = &next.displaced_owner {
            match self.records.contact(tenant, displaced).await? {
                Some(Versioned { version, mut doc }) => {
                    doc.owner_of_property_ids.remove(property_id);
                    batch.put_contact(Some(version), doc);
                }
                None => warn!(
                    tenant = %tenant,
                    property = %property_id,
                    owner = %displaced,
                    "previous owner record missing"
                ),
            }
        }

        self.records.commit(batch).await?;

        info!(
            tenant = %tenant,
            contact = %contact_id,
            property = %property_id,
            previous = ?previous,
            current = ?target,
            displaced_owner = next.displaced_owner.as_ref().map(ContactId::as_str),
            "association updated"
        );

        Ok(AssociationChange {
            contact_id: contact_id.clone(),
            property_id: property_id.clone(),
            previous,
            current: target,
        })
    }

    async fn load_pair(
        &self,
        tenant: &TenantId,
        contact_id: &ContactId,
        property_id: &PropertyId,
    ) -> Result<(Versioned<Contact>, Versioned<Property>), DomainError> {
        if tenant.is_blank() || contact_id.is_blank() || property_id.is_blank() {
            return Err(DomainError::Validation(
                "tenantId, contactId and propertyId are required".to_string(),
            ));
        }

        let contact = self
            .records
            .contact(tenant, contact_id)
            .await?
            .ok_or_else(|| DomainError::not_found("contact", contact_id))?;
        let property = self
            .records
            .property(tenant, property_id)
            .await?
            .ok_or_else(|| DomainError::not_found("property", property_id))?;
        Ok((contact, property))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Modality;
    use crate::store::memory::MemoryStore;

    fn tenant() -> TenantId {
        TenantId::new("demo")
    }

    fn property(id: &str) -> Property {
        Property {
            id: PropertyId::new(id),
            tenant_id: tenant(),
            title: "Casa en Surco".to_string(),
            property_type: "casa".to_string(),
            modality: Modality::Sale,
            bedrooms: 4,
            price_usd: 350_000,
            price_pen: 1_300_000,
            featured: false,
            owner_id: None,
        }
    }

    async fn seeded() -> (Arc<MemoryStore>, AssociationService<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        for id in ["C1", "C2"] {
            store
                .create_contact(Contact::new(tenant(), ContactId::new(id), id))
                .await
                .expect("contact");
        }
        store.create_property(property("P1")).await.expect("property");
        (store.clone(), AssociationService::new(store))
    }

    #[tokio::test]
    async fn owner_change_moves_the_mirror() {
        let (store, service) = seeded().await;
        let (c1, p1) = (ContactId::new("C1"), PropertyId::new("P1"));

        let change = service
            .set_association(&tenant(), &c1, &p1, AssociationKind::Owner)
            .await
            .expect("owner");
        assert_eq!(change.previous, None);
        assert_eq!(change.current, Some(AssociationKind::Owner));

        let change = service
            .set_association(&tenant(), &c1, &p1, AssociationKind::Interested)
            .await
            .expect("interested");
        assert_eq!(change.previous, Some(AssociationKind::Owner));

        let property = store.property(&tenant(), &p1).await.unwrap().unwrap();
        assert_eq!(property.doc.owner_id, None);
        let contact = store.contact(&tenant(), &c1).await.unwrap().unwrap();
        assert!(contact.doc.owner_of_property_ids.is_empty());
        assert!(contact.doc.interested_in_property_ids.contains(&p1));
    }

    #[tokio::test]
    async fn new_owner_displaces_previous_owner() {
        let (store, service) = seeded().await;
        let p1 = PropertyId::new("P1");

        service
            .set_association(&tenant(), &ContactId::new("C1"), &p1, AssociationKind::Owner)
            .await
            .expect("first owner");
        service
            .set_association(&tenant(), &ContactId::new("C2"), &p1, AssociationKind::Owner)
            .await
            .expect("second owner");

        let c1 = store
            .contact(&tenant(), &ContactId::new("C1"))
            .await
            .unwrap()
            .unwrap();
        assert!(c1.doc.owner_of_property_ids.is_empty());
        let property = store.property(&tenant(), &p1).await.unwrap().unwrap();
        assert_eq!(property.doc.owner_id, Some(ContactId::new("C2")));
    }

    #[tokio::test]
    async fn missing_documents_are_not_found() {
        let (_, service) = seeded().await;
        let err = service
            .set_association(
                &tenant(),
                &ContactId::new("C9"),
                &PropertyId::new("P1"),
                AssociationKind::Interested,
            )
            .await
            .expect_err("missing contact");
        assert!(matches!(err, DomainError::NotFound { kind: "contact", .. }));

        let err = service
            .disassociate(&tenant(), &ContactId::new("C1"), &PropertyId::new("P9"))
            .await
            .expect_err("missing property");
        assert!(matches!(err, DomainError::NotFound { kind: "property", .. }));
    }

    #[tokio::test]
    async fn repeated_change_does_not_write() {
        let (store, service) = seeded().await;
        let (c1, p1) = (ContactId::new("C1"), PropertyId::new("P1"));
        service
            .set_association(&tenant(), &c1, &p1, AssociationKind::TenantOf)
            .await
            .expect("tenant of");
        let before = store.contact(&tenant(), &c1).await.unwrap().unwrap().version;

        let change = service
            .set_association(&tenant(), &c1, &p1, AssociationKind::TenantOf)
            .await
            .expect("again");
        assert_eq!(change.previous, Some(AssociationKind::TenantOf));
        let after = store.contact(&tenant(), &c1).await.unwrap().unwrap().version;
        assert_eq!(before, after);
    }
}
