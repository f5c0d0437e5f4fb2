use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ClientId, ContactId, PropertyId, RelationId, TenantId, MAX_ID_LEN};

/// The client or CRM contact on one end of a relation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Subject {
    Client(ClientId),
    Contact(ContactId),
}

impl Subject {
    pub fn subject_type(&self) -> SubjectType {
        match self {
            Subject::Client(_) => SubjectType::Client,
            Subject::Contact(_) => SubjectType::Contact,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Subject::Client(id) => id.as_str(),
            Subject::Contact(id) => id.as_str(),
        }
    }

    fn from_parts(subject_type: SubjectType, id: String) -> Self {
        match subject_type {
            SubjectType::Client => Subject::Client(ClientId(id)),
            SubjectType::Contact => Subject::Contact(ContactId(id)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectType {
    Client,
    Contact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationRole {
    Owner,
    Interested,
    Applicant,
    Tenant,
    Buyer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationStatus {
    New,
    Verified,
    Matched,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationSource {
    ClientFavorite,
    AgentLink,
    Import,
}

/// Link between a subject and a property, recorded by `tenant_id`. The property may
/// belong to another tenant (`property_tenant_id`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RelationDocument", into = "RelationDocument")]
pub struct Relation {
    pub id: RelationId,
    pub tenant_id: TenantId,
    pub subject: Subject,
    pub property_tenant_id: TenantId,
    pub property_id: PropertyId,
    pub role: RelationRole,
    pub source: RelationSource,
    pub status: RelationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Identity used for duplicate detection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelationKey {
    pub tenant_id: TenantId,
    pub subject: Subject,
    pub property_tenant_id: TenantId,
    pub property_id: PropertyId,
    pub role: RelationRole,
}

impl Relation {
    pub fn key(&self) -> RelationKey {
        RelationKey {
            tenant_id: self.tenant_id.clone(),
            subject: self.subject.clone(),
            property_tenant_id: self.property_tenant_id.clone(),
            property_id: self.property_id.clone(),
            role: self.role,
        }
    }

    /// Write-side schema check.
    pub fn validate(&self) -> Result<(), String> {
        let blanks = [
            ("id", self.id.is_blank()),
            ("tenantId", self.tenant_id.is_blank()),
            ("subjectId", self.subject.id().trim().is_empty()),
            ("propertyTenantId", self.property_tenant_id.is_blank()),
            ("propertyId", self.property_id.is_blank()),
        ];
        if let Some((field, _)) = blanks.iter().find(|(_, blank)| *blank) {
            return Err(format!("{field} must not be empty"));
        }
        let oversized = [
            ("id", self.id.is_too_long()),
            ("tenantId", self.tenant_id.is_too_long()),
            ("subjectId", self.subject.id().len() > MAX_ID_LEN),
            ("propertyTenantId", self.property_tenant_id.is_too_long()),
            ("propertyId", self.property_id.is_too_long()),
        ];
        if let Some((field, _)) = oversized.iter().find(|(_, long)| *long) {
            return Err(format!("{field} exceeds {MAX_ID_LEN} bytes"));
        }
        if self.updated_at < self.created_at {
            return Err("updatedAt precedes createdAt".to_string());
        }
        Ok(())
    }
}

/// Persisted shape of a relation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RelationDocument {
    id: RelationId,
    tenant_id: TenantId,
    subject_type: SubjectType,
    subject_id: String,
    property_tenant_id: TenantId,
    property_id: PropertyId,
    role: RelationRole,
    source: RelationSource,
    status: RelationStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RelationDocument> for Relation {
    type Error = String;

    fn try_from(doc: RelationDocument) -> Result<Self, Self::Error> {
        let relation = Relation {
            id: doc.id,
            tenant_id: doc.tenant_id,
            subject: Subject::from_parts(doc.subject_type, doc.subject_id),
            property_tenant_id: doc.property_tenant_id,
            property_id: doc.property_id,
            role: doc.role,
            source: doc.source,
            status: doc.status,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        };
        relation.validate()?;
        Ok(relation)
    }
}

impl From<Relation> for RelationDocument {
    fn from(relation: Relation) -> Self {
        RelationDocument {
            id: relation.id,
            tenant_id: relation.tenant_id,
            subject_type: relation.subject.subject_type(),
            subject_id: relation.subject.id().to_string(),
            property_tenant_id: relation.property_tenant_id,
            property_id: relation.property_id,
            role: relation.role,
            source: relation.source,
            status: relation.status,
            created_at: relation.created_at,
            updated_at: relation.updated_at,
        }
    }
}

/// Lookup criteria inside one tenant's relation store. Empty matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationFilter {
    pub subject: Option<Subject>,
    pub property_tenant_id: Option<TenantId>,
    pub property_id: Option<PropertyId>,
    pub role: Option<RelationRole>,
}

impl RelationFilter {
    pub fn matches(&self, relation: &Relation) -> bool {
        self.subject
            .as_ref()
            .map_or(true, |subject| &relation.subject == subject)
            && self
                .property_tenant_id
                .as_ref()
                .map_or(true, |tenant| &relation.property_tenant_id == tenant)
            && self
                .property_id
                .as_ref()
                .map_or(true, |property| &relation.property_id == property)
            && self.role.map_or(true, |role| relation.role == role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn relation() -> Relation {
        let now = Utc::now();
        Relation {
            id: RelationId::new("rel-1"),
            tenant_id: TenantId::new("acme"),
            subject: Subject::Contact(ContactId::new("C9")),
            property_tenant_id: TenantId::new("demo"),
            property_id: PropertyId::new("P1"),
            role: RelationRole::Owner,
            source: RelationSource::AgentLink,
            status: RelationStatus::New,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn serializes_to_flat_persisted_shape() {
        let value = serde_json::to_value(relation()).expect("serializes");
        assert_eq!(value["subjectType"], json!("contact"));
        assert_eq!(value["subjectId"], json!("C9"));
        assert_eq!(value["propertyTenantId"], json!("demo"));
        assert_eq!(value["role"], json!("Owner"));
        assert_eq!(value["source"], json!("agent-link"));
        assert_eq!(value["status"], json!("new"));
    }

    #[test]
    fn rejects_blank_subject_on_read() {
        let mut value = serde_json::to_value(relation()).expect("serializes");
        value["subjectId"] = json!("  ");
        let err = serde_json::from_value::<Relation>(value).expect_err("blank subject");
        assert!(err.to_string().contains("subjectId"));
    }

    #[test]
    fn validate_caps_identifier_length() {
        let mut relation = relation();
        relation.property_id = PropertyId::new("P".repeat(MAX_ID_LEN));
        assert!(relation.validate().is_ok());

        relation.subject = Subject::Client(ClientId::new("c".repeat(MAX_ID_LEN + 1)));
        let reason = relation.validate().expect_err("oversized subject");
        assert!(reason.contains("subjectId"));
    }

    #[test]
    fn rejects_ad_hoc_fields_on_read() {
        let mut value = serde_json::to_value(relation()).expect("serializes");
        value["notes"] = json!("called twice");
        assert!(serde_json::from_value::<Relation>(value).is_err());
    }

    #[test]
    fn filter_matches_on_every_populated_criterion() {
        let relation = relation();
        let mut filter = RelationFilter {
            subject: Some(Subject::Contact(ContactId::new("C9"))),
            ..RelationFilter::default()
        };
        assert!(filter.matches(&relation));

        filter.role = Some(RelationRole::Interested);
        assert!(!filter.matches(&relation));
    }
}
