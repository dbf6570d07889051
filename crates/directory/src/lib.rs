//! `topup-directory` — account directory (platform identity to user record).
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns.

pub mod user;

pub use user::{ContactProfile, User};
