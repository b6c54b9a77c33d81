//! Data models representing database entities and API payloads.

/// Typed QR appearance settings
pub mod appearance;
/// Hosted checkout sessions and plans
pub mod checkout;
/// Merchant profiles and account status
pub mod profile;
/// QR code records
pub mod qr_code;
/// Post-verification reviews
pub mod review;
/// Verification request/response shapes
pub mod verification;
