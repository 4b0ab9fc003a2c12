//! Authentication for the Parley relay: bearer tokens, password hashing,
//! and the user store.
//!
//! The token service issues HS256 tokens with a subject claim and a fixed
//! expiry window (30 minutes by default). Verification distinguishes
//! expired from malformed tokens so callers can prompt re-authentication
//! instead of rejecting outright.

/// Password hashing and verification.
pub mod password;
/// User records and the user store.
pub mod store;
/// Bearer token issuance and verification.
pub mod token;

pub use password::{hash_password, verify_password};
pub use store::{FileUserStore, User, UserStore};
pub use token::{Claims, TokenService, DEFAULT_TTL_SECS};
