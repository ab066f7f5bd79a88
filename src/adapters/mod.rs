//! Adapters Layer
//!
//! Inbound adapters drive the application (HTTP API); outbound adapters
//! implement the domain ports (geocoder, cache, document store).

pub mod inbound;
pub mod outbound;
