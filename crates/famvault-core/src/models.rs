//! Domain models for FamVault.
//!
//! These are the core types shared across all crates.

pub mod admin_user;
pub mod bank_account;
pub mod family_member;
pub mod role;
pub mod tenant;
