//! Scope matching — the pure authorization decision.
//!
//! A caller's held scope is a space-delimited set of grants. A grant
//! is either the literal `superuser` or `<groupScope>:<role>` where
//! role is `admin` or `regular`. Matching is existential: any single
//! satisfying grant is sufficient, and no match means deny.

use serde::{Deserialize, Serialize};

/// The literal grant that bypasses all other checks.
pub const SUPERUSER: &str = "superuser";

/// Relative authority within one group's scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Regular,
    Admin,
}

/// The access level a route demands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Token optional; any grant for the group (or none, when the
    /// route itself permits anonymous access) is acceptable.
    Any,
    /// An `admin` or `regular` grant for the group.
    Regular,
    /// An `admin` grant for the group (admin implies regular, not the
    /// other way around).
    Admin,
    /// Only the `superuser` grant.
    Superuser,
}

/// A single parsed grant from a held scope string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grant<'a> {
    Superuser,
    Group { scope: &'a str, role: Role },
}

/// Parse the grants out of a space-delimited scope string. Malformed
/// tokens (no colon, unknown role) are dropped; they can never
/// authorize anything.
pub fn grants(held: &str) -> impl Iterator<Item = Grant<'_>> {
    held.split_whitespace().filter_map(|token| {
        if token == SUPERUSER {
            return Some(Grant::Superuser);
        }
        let (scope, role) = token.split_once(':')?;
        let role = match role {
            "admin" => Role::Admin,
            "regular" => Role::Regular,
            _ => return None,
        };
        Some(Grant::Group { scope, role })
    })
}

/// Decide whether `held` authorizes `required` against the group
/// identified by `group_scope`. Fails closed: anything unrecognized
/// is a deny.
pub fn matches(held: &str, group_scope: &str, required: Requirement) -> bool {
    let mut any_superuser = false;
    let mut satisfied = false;

    for grant in grants(held) {
        match grant {
            Grant::Superuser => any_superuser = true,
            Grant::Group { scope, role } => {
                if scope != group_scope {
                    continue;
                }
                satisfied |= match required {
                    Requirement::Any => true,
                    Requirement::Regular => true,
                    Requirement::Admin => role == Role::Admin,
                    Requirement::Superuser => false,
                };
            }
        }
    }

    // Superuser bypasses every scope comparison.
    any_superuser || satisfied
}

/// True when the held scope contains the `superuser` grant.
pub fn is_superuser(held: &str) -> bool {
    grants(held).any(|g| g == Grant::Superuser)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn superuser_matches_everything() {
        assert!(matches("superuser", "scope1", Requirement::Superuser));
        assert!(matches("superuser", "scope1", Requirement::Admin));
        assert!(matches("superuser", "anything", Requirement::Regular));
        assert!(matches("other:regular superuser", "scope1", Requirement::Admin));
    }

    #[test]
    fn superuser_requirement_rejects_group_grants() {
        assert!(!matches("scope1:admin", "scope1", Requirement::Superuser));
        assert!(!matches("scope1:regular", "scope1", Requirement::Superuser));
    }

    #[test]
    fn admin_requirement_needs_admin_grant() {
        assert!(matches("scope1:admin", "scope1", Requirement::Admin));
        assert!(!matches("scope1:regular", "scope1", Requirement::Admin));
    }

    #[test]
    fn admin_implies_regular() {
        assert!(matches("scope1:admin", "scope1", Requirement::Regular));
        assert!(matches("scope1:regular", "scope1", Requirement::Regular));
    }

    #[test]
    fn wrong_scope_never_matches() {
        assert!(!matches("scope2:admin", "scope1", Requirement::Regular));
        assert!(!matches("scope2:admin", "scope1", Requirement::Admin));
        assert!(!matches("scope2:admin scope3:admin", "scope1", Requirement::Any));
    }

    #[test]
    fn matching_is_existential_over_grants() {
        // A non-matching grant next to a matching one does not poison it.
        assert!(matches(
            "scope2:regular scope1:admin",
            "scope1",
            Requirement::Admin
        ));
        // Duplicate grants for the same scope: any satisfying one wins.
        assert!(matches(
            "scope1:regular scope1:admin",
            "scope1",
            Requirement::Admin
        ));
    }

    #[test]
    fn malformed_grants_are_ignored() {
        assert!(!matches("scope1", "scope1", Requirement::Any));
        assert!(!matches("scope1:owner", "scope1", Requirement::Regular));
        assert!(!matches("", "scope1", Requirement::Any));
    }

    #[test]
    fn is_superuser_detects_grant() {
        assert!(is_superuser("scope1:admin superuser"));
        assert!(!is_superuser("scope1:admin"));
        // Only the exact literal counts.
        assert!(!is_superuser("superuser:admin"));
    }
}
