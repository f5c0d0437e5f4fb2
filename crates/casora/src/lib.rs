//! Multi-tenant core of the Casora listing platform: host-based tenant routing,
//! cross-tenant relations, contact/property associations, shared lists and the
//! public portal feed.

pub mod associations;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod portal;
pub mod relations;
pub mod shares;
pub mod store;
pub mod telemetry;
pub mod tenancy;
