//! Trolley core — domain models, error taxonomy, repository traits,
//! and the scope-based authorization primitives shared by all crates.

pub mod error;
pub mod models;
pub mod password;
pub mod repository;
pub mod scope;
pub mod validate;

pub use error::{TrolleyError, TrolleyResult};
