//! Exclusive contact/property associations within one tenant.

pub mod router;
pub mod service;
pub mod transition;

pub use router::association_router;
pub use service::{AssociationChange, AssociationService};
pub use transition::AssociationKind;
