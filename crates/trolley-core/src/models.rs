//! Domain models for Trolley.
//!
//! These are the core types shared across all crates. Each module
//! defines the entity itself plus its `Create*` and `Update*` input
//! shapes (update structs are all-`Option` merge patches).

pub mod category;
pub mod group;
pub mod item;
pub mod list;
pub mod token;
pub mod user;
