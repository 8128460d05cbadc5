//! FamVault Core: domain models, error taxonomy and repository traits
//! shared by every FamVault crate.

pub mod error;
pub mod guard;
pub mod models;
pub mod repository;
