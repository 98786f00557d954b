//! # Pinpay Hex
//!
//! Application service layer for the Pin Payments integration.
//!
//! ## Architecture
//!
//! - `service/` - Application service (orchestrates gateway calls and persistence)
//!
//! The service is generic over `R: PinRepository` and `G: Gateway`, so the
//! SQLite adapter and the HTTP client can be swapped for in-memory doubles.

pub mod service;


pub use service::PinService;
