//! # Rates Hex
//!
//! Application service layer and HTTP adapter for the transfer rates service.
//!
//! ## Architecture
//!
//! - `service` - Application service (cache-aside lookups and response assembly)
//! - `plans` - Eager-load plans for each listing
//! - `inbound/` - HTTP adapter (Axum server)
//! - `openapi` - OpenAPI document served by the Swagger UI
//!
//! The service is generic over `R: ReferenceRepository` and `C: ObjectCache`,
//! allowing different adapters to be injected.

pub mod inbound;
pub mod openapi;
pub mod plans;
pub mod service;


pub use service::{CachePolicy, DefaultService, ReferenceService};
