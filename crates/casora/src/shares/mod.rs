//! Token-addressable, revocable lists of properties from any tenant.

pub mod domain;
pub mod router;
pub mod service;
pub mod token;

pub use domain::{Share, ShareHandle, SharedProperty, ShareView};
pub use router::share_router;
pub use service::ShareManager;
