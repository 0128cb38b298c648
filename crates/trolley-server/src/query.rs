//! Query string handling.
//!
//! Filters follow the presence-flag convention: `?active` (any value,
//! or none) switches the filter on, absence switches it off. The same
//! goes for the `with<Relation>` eager-include flags.

use std::collections::HashMap;

use trolley_core::error::TrolleyError;
use trolley_core::repository::MatchOptions;
use uuid::Uuid;

pub type Params = HashMap<String, String>;

/// Presence flag: the key existing at all means "on".
pub fn flag(params: &Params, name: &str) -> bool {
    params.contains_key(name)
}

fn parse_u64(params: &Params, name: &str) -> Result<Option<u64>, TrolleyError> {
    match params.get(name) {
        None => Ok(None),
        Some(value) => value.parse().map(Some).map_err(|_| {
            TrolleyError::bad_request(format!("{name}: '{value}' is not a valid number"))
        }),
    }
}

/// Shared filter and pagination options; entity handlers fill in
/// their own include flags.
pub fn match_options<I: Default>(params: &Params) -> Result<MatchOptions<I>, TrolleyError> {
    Ok(MatchOptions {
        active: flag(params, "active"),
        name: params.get("name").cloned(),
        limit: parse_u64(params, "limit")?,
        offset: parse_u64(params, "offset")?,
        includes: I::default(),
    })
}

/// Parse a path segment as a UUID, failing in the field message
/// convention.
pub fn parse_id(field: &str, value: &str) -> Result<Uuid, TrolleyError> {
    Uuid::parse_str(value)
        .map_err(|_| TrolleyError::bad_request(format!("{field}: '{value}' is not a valid UUID")))
}
