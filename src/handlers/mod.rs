//! HTTP request handlers (route handlers).
//!
//! Each handler extracts request data, calls into `services`, and returns
//! JSON or an `AppError`.

/// Checkout endpoints
pub mod billing;
/// Health probe
pub mod health;
/// Merchant profile endpoints
pub mod profile;
/// Dashboard QR code management
pub mod qr_codes;
/// Public verification and review endpoints
pub mod verify;
