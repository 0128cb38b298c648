//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Unique indexes are the authoritative
//! enforcement of name/scope/token uniqueness; repository pre-checks
//! only exist to produce friendly error messages first.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Groups (tenant roots)
-- =======================================================================
DEFINE TABLE group SCHEMAFULL;
DEFINE FIELD active ON TABLE group TYPE bool DEFAULT true;
DEFINE FIELD name ON TABLE group TYPE string;
DEFINE FIELD scope ON TABLE group TYPE string;
DEFINE FIELD email ON TABLE group TYPE option<string>;
DEFINE FIELD notes ON TABLE group TYPE option<string>;
DEFINE INDEX idx_group_name ON TABLE group COLUMNS name UNIQUE;
DEFINE INDEX idx_group_scope ON TABLE group COLUMNS scope UNIQUE;

-- =======================================================================
-- Categories (group scope)
-- =======================================================================
DEFINE TABLE category SCHEMAFULL;
DEFINE FIELD group_id ON TABLE category TYPE string;
DEFINE FIELD active ON TABLE category TYPE bool DEFAULT true;
DEFINE FIELD name ON TABLE category TYPE string;
DEFINE FIELD notes ON TABLE category TYPE option<string>;
DEFINE FIELD theme ON TABLE category TYPE option<string>;
DEFINE INDEX idx_category_group_name ON TABLE category \
    COLUMNS group_id, name UNIQUE;

-- =======================================================================
-- Lists (group scope)
-- =======================================================================
DEFINE TABLE list SCHEMAFULL;
DEFINE FIELD group_id ON TABLE list TYPE string;
DEFINE FIELD active ON TABLE list TYPE bool DEFAULT true;
DEFINE FIELD name ON TABLE list TYPE string;
DEFINE FIELD notes ON TABLE list TYPE option<string>;
DEFINE FIELD theme ON TABLE list TYPE option<string>;
DEFINE INDEX idx_list_group_name ON TABLE list \
    COLUMNS group_id, name UNIQUE;

-- =======================================================================
-- Items (group scope, assigned to a category)
-- =======================================================================
DEFINE TABLE item SCHEMAFULL;
DEFINE FIELD group_id ON TABLE item TYPE string;
DEFINE FIELD category_id ON TABLE item TYPE string;
DEFINE FIELD active ON TABLE item TYPE bool DEFAULT true;
DEFINE FIELD name ON TABLE item TYPE string;
DEFINE FIELD notes ON TABLE item TYPE option<string>;
DEFINE FIELD theme ON TABLE item TYPE option<string>;
DEFINE INDEX idx_item_group_name ON TABLE item \
    COLUMNS group_id, name UNIQUE;

-- =======================================================================
-- Users (global scope)
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD active ON TABLE user TYPE bool DEFAULT true;
DEFINE FIELD name ON TABLE user TYPE string;
DEFINE FIELD username ON TABLE user TYPE string;
DEFINE FIELD password ON TABLE user TYPE string;
DEFINE FIELD scope ON TABLE user TYPE string;
DEFINE INDEX idx_user_username ON TABLE user COLUMNS username UNIQUE;

-- =======================================================================
-- Access tokens (global scope, scope snapshot at issuance)
-- =======================================================================
DEFINE TABLE access_token SCHEMAFULL;
DEFINE FIELD user_id ON TABLE access_token TYPE string;
DEFINE FIELD token ON TABLE access_token TYPE string;
DEFINE FIELD expires ON TABLE access_token TYPE datetime;
DEFINE FIELD scope ON TABLE access_token TYPE string;
DEFINE INDEX idx_access_token_token ON TABLE access_token \
    COLUMNS token UNIQUE;
DEFINE INDEX idx_access_token_user ON TABLE access_token \
    COLUMNS user_id;

-- =======================================================================
-- Refresh tokens (global scope, linked to an access token)
-- =======================================================================
DEFINE TABLE refresh_token SCHEMAFULL;
DEFINE FIELD user_id ON TABLE refresh_token TYPE string;
DEFINE FIELD token ON TABLE refresh_token TYPE string;
DEFINE FIELD expires ON TABLE refresh_token TYPE datetime;
DEFINE FIELD access_token ON TABLE refresh_token TYPE string;
DEFINE INDEX idx_refresh_token_token ON TABLE refresh_token \
    COLUMNS token UNIQUE;
DEFINE INDEX idx_refresh_token_user ON TABLE refresh_token \
    COLUMNS user_id;
";

/// Apply any migrations newer than the recorded schema version.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_v1_is_nonempty() {
        assert!(!SCHEMA_V1.is_empty());
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }
}
