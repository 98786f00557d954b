//! Port traits (interfaces for adapters).
//!
//! The service layer depends on these traits, not on `reqwest` or `sqlx`.

mod gateway;
mod repository;

pub use gateway::{Gateway, GatewayResponse};
pub use repository::PinRepository;
