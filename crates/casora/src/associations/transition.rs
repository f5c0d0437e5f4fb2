//! Pure transition function of the contact/property association state machine.

use serde::{Deserialize, Serialize};

use crate::domain::{Contact, ContactId, ContactRole, Property, PropertyId};

/// How a contact relates to a property. At most one per pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationKind {
    Owner,
    Interested,
    TenantOf,
}

/// Current association of `contact` with `property_id`.
pub fn current(contact: &Contact, property_id: &PropertyId) -> Option<AssociationKind> {
    if contact.owner_of_property_ids.contains(property_id) {
        Some(AssociationKind::Owner)
    } else if contact.tenant_of_property_id.as_ref() == Some(property_id) {
        Some(AssociationKind::TenantOf)
    } else if contact.interested_in_property_ids.contains(property_id) {
        Some(AssociationKind::Interested)
    } else {
        None
    }
}

/// Documents after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub contact: Contact,
    pub property: Property,
    /// Another contact that owned the property before and must drop it.
    pub displaced_owner: Option<ContactId>,
}

/// Move the (contact, property) pair to `target`; `None` removes every association.
pub fn apply(
    contact: &Contact,
    property: &Property,
    target: Option<AssociationKind>,
) -> Transition {
    let mut contact = contact.clone();
    let mut property = property.clone();
    let property_id = property.id.clone();
    let mut displaced_owner = None;

    contact.owner_of_property_ids.remove(&property_id);
    contact.interested_in_property_ids.remove(&property_id);
    if contact.tenant_of_property_id.as_ref() == Some(&property_id) {
        contact.tenant_of_property_id = None;
    }

    match target {
        Some(AssociationKind::Owner) => {
            contact.owner_of_property_ids.insert(property_id);
            displaced_owner = property
                .owner_id
                .take()
                .filter(|previous| previous != &contact.id);
            property.owner_id = Some(contact.id.clone());
        }
        Some(AssociationKind::Interested) => {
            contact.interested_in_property_ids.insert(property_id);
            clear_owner_mirror(&mut property, &contact.id);
        }
        Some(AssociationKind::TenantOf) => {
            contact.tenant_of_property_id = Some(property_id);
            contact.types.insert(ContactRole::Tenant);
            clear_owner_mirror(&mut property, &contact.id);
        }
        None => clear_owner_mirror(&mut property, &contact.id),
    }

    Transition {
        contact,
        property,
        displaced_owner,
    }
}

fn clear_owner_mirror(property: &mut Property, contact: &ContactId) {
    if property.is_owned_by(contact) {
        property.owner_id = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Modality, TenantId};

    fn contact(id: &str) -> Contact {
        Contact::new(TenantId::new("demo"), ContactId::new(id), "Lucía")
    }

    fn property() -> Property {
        Property {
            id: PropertyId::new("P1"),
            tenant_id: TenantId::new("demo"),
            title: "Dúplex en Barranco".to_string(),
            property_type: "departamento".to_string(),
            modality: Modality::Rental,
            bedrooms: 2,
            price_usd: 900,
            price_pen: 3_400,
            featured: false,
            owner_id: None,
        }
    }

    #[test]
    fn owner_then_interested_is_exclusive() {
        let owned = apply(&contact("C1"), &property(), Some(AssociationKind::Owner));
        assert_eq!(owned.property.owner_id, Some(ContactId::new("C1")));

        let interested = apply(
            &owned.contact,
            &owned.property,
            Some(AssociationKind::Interested),
        );
        let p1 = PropertyId::new("P1");
        assert!(!interested.contact.owner_of_property_ids.contains(&p1));
        assert!(interested.contact.interested_in_property_ids.contains(&p1));
        assert_eq!(interested.property.owner_id, None);
        assert_eq!(
            current(&interested.contact, &p1),
            Some(AssociationKind::Interested)
        );
    }

    #[test]
    fn owner_then_tenant_of_drops_the_owner_mirror() {
        let owned = apply(&contact("C1"), &property(), Some(AssociationKind::Owner));
        let moved = apply(
            &owned.contact,
            &owned.property,
            Some(AssociationKind::TenantOf),
        );
        let p1 = PropertyId::new("P1");
        assert_eq!(moved.property.owner_id, None);
        assert!(!moved.contact.owner_of_property_ids.contains(&p1));
        assert_eq!(moved.contact.tenant_of_property_id, Some(p1));
        assert_eq!(moved.displaced_owner, None);
    }

    #[test]
    fn tenant_of_tags_contact_and_clears_previous_fields() {
        let mut start = contact("C1");
        start.interested_in_property_ids.insert(PropertyId::new("P1"));

        let moved = apply(&start, &property(), Some(AssociationKind::TenantOf));
        assert_eq!(
            moved.contact.tenant_of_property_id,
            Some(PropertyId::new("P1"))
        );
        assert!(moved.contact.interested_in_property_ids.is_empty());
        assert!(moved.contact.types.contains(&ContactRole::Tenant));
    }

    #[test]
    fn tenant_of_replaces_a_previous_tenancy() {
        let mut start = contact("C1");
        start.tenant_of_property_id = Some(PropertyId::new("P0"));

        let moved = apply(&start, &property(), Some(AssociationKind::TenantOf));
        assert_eq!(
            moved.contact.tenant_of_property_id,
            Some(PropertyId::new("P1"))
        );
    }

    #[test]
    fn owner_reports_displaced_owner() {
        let mut owned = property();
        owned.owner_id = Some(ContactId::new("C0"));

        let moved = apply(&contact("C1"), &owned, Some(AssociationKind::Owner));
        assert_eq!(moved.displaced_owner, Some(ContactId::new("C0")));
        assert_eq!(moved.property.owner_id, Some(ContactId::new("C1")));
    }

    #[test]
    fn clearing_keeps_another_contacts_ownership() {
        let mut owned = property();
        owned.owner_id = Some(ContactId::new("C0"));

        let cleared = apply(&contact("C1"), &owned, None);
        assert_eq!(cleared.property.owner_id, Some(ContactId::new("C0")));
    }
}
