//! Adapters between the gateway and its infrastructure.

pub mod error_conversions;
pub mod repository;

pub use repository::EdgeRepository;
