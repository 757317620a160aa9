//! Configuration for the detection service
//!
//! `AuthDetectConfig` holds every timeout, TTL and limit used by the pool,
//! acquirer, detector, cache and HTTP surface, with a validating builder
//! and environment loading.

pub mod builder;
pub mod env;
pub mod getters;
pub mod types;

pub use builder::AuthDetectConfigBuilder;
pub use types::{ApiKey, AuthDetectConfig};
