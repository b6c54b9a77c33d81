//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.

pub mod checkout_service;
pub mod profile_service;
pub mod qr_service;
pub mod review_service;
pub mod verification_service;
