//! Relationship records linking clients and CRM contacts to properties, possibly
//! across tenants.

pub mod domain;
pub mod router;
pub mod service;

pub use domain::{
    Relation, RelationFilter, RelationKey, RelationRole, RelationSource, RelationStatus, Subject,
    SubjectType,
};
pub use router::relation_router;
pub use service::{AgentLink, FavoriteOutcome, RelationManager};
