//! Cross-tenant portal listing with opaque, resumable cursors.

pub mod cursor;
pub mod query;
pub mod router;
pub mod service;

pub use cursor::{make_cursor, parse_cursor};
pub use query::{ListingQuery, SortKey};
pub use router::{portal_router, PortalRequest};
pub use service::{PortalPage, PortalService};
