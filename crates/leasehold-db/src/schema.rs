//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode. Optional columns are
//! declared `option<...>` up front so every query has exactly one shape;
//! nothing checks for columns at runtime.
//!
//! Storage conventions:
//! - Records are keyed by integers allocated from `_sequence`.
//! - User UUIDs are stored as strings.
//! - Calendar dates are stored as `YYYY-MM-DD` strings, so string
//!   comparison is date comparison.
//! - Money is stored as integer cents.
//! - Enums are stored as strings with ASSERT constraints.

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
    name: "property_ledger",
    sql: SCHEMA_V1,
}];

/// Latest schema version known to this build.
pub const SCHEMA_VERSION: u32 = 1;

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Id sequences (one record per table)
-- =======================================================================
DEFINE TABLE _sequence SCHEMAFULL;
DEFINE FIELD value ON TABLE _sequence TYPE int;

-- =======================================================================
-- Properties (global scope)
-- =======================================================================
DEFINE TABLE property SCHEMAFULL;
DEFINE FIELD owner_id ON TABLE property TYPE string;
DEFINE FIELD name ON TABLE property TYPE string;
DEFINE FIELD name_normalized ON TABLE property TYPE string;
DEFINE FIELD portal_label ON TABLE property TYPE option<string>;
DEFINE FIELD status ON TABLE property TYPE string \
    ASSERT $value IN ['Active', 'Inactive'];
DEFINE FIELD created_at ON TABLE property TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE property TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_property_name ON TABLE property \
    COLUMNS name_normalized;
DEFINE INDEX idx_property_owner ON TABLE property \
    COLUMNS owner_id;

-- Portal labels: the record key is the normalized label, which makes the
-- origin-label -> property mapping injective.
DEFINE TABLE portal_label SCHEMAFULL;
DEFINE FIELD property_id ON TABLE portal_label TYPE int;

-- =======================================================================
-- Units (property scope)
-- =======================================================================
DEFINE TABLE unit SCHEMAFULL;
DEFINE FIELD property_id ON TABLE unit TYPE int;
DEFINE FIELD unit_number ON TABLE unit TYPE string;
DEFINE FIELD status ON TABLE unit TYPE string \
    ASSERT $value IN ['Vacant', 'Occupied'];
DEFINE FIELD monthly_rent_cents ON TABLE unit TYPE int \
    ASSERT $value >= 0;
DEFINE FIELD lock_version ON TABLE unit TYPE int DEFAULT 0;
DEFINE FIELD created_at ON TABLE unit TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE unit TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_unit_property_number ON TABLE unit \
    COLUMNS property_id, unit_number UNIQUE;

-- =======================================================================
-- Tenants (global scope, optional property affiliation)
-- =======================================================================
DEFINE TABLE tenant SCHEMAFULL;
DEFINE FIELD user_id ON TABLE tenant TYPE string;
DEFINE FIELD property_id ON TABLE tenant TYPE option<int>;
DEFINE FIELD email ON TABLE tenant TYPE option<string>;
DEFINE FIELD phone_number ON TABLE tenant TYPE option<string>;
DEFINE FIELD created_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_tenant_user ON TABLE tenant \
    COLUMNS user_id UNIQUE;

-- =======================================================================
-- Staff bindings (keyed by user id)
-- =======================================================================
DEFINE TABLE staff_binding SCHEMAFULL;
DEFINE FIELD property_id ON TABLE staff_binding TYPE int;
DEFINE FIELD created_at ON TABLE staff_binding TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Leases (tenant-unit assignments, append-only history)
-- =======================================================================
DEFINE TABLE lease SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update FULL
        FOR delete NONE;
DEFINE FIELD tenant_id ON TABLE lease TYPE int;
DEFINE FIELD unit_id ON TABLE lease TYPE int;
DEFINE FIELD property_id ON TABLE lease TYPE int;
DEFINE FIELD move_in_date ON TABLE lease TYPE string;
DEFINE FIELD move_out_date ON TABLE lease TYPE option<string>;
DEFINE FIELD monthly_rent_cents ON TABLE lease TYPE int \
    ASSERT $value >= 0;
DEFINE FIELD security_deposit_cents ON TABLE lease TYPE option<int>;
DEFINE FIELD renewal_count ON TABLE lease TYPE int DEFAULT 0;
DEFINE FIELD renewed_at ON TABLE lease TYPE option<datetime>;
DEFINE FIELD notice_date ON TABLE lease TYPE option<string>;
DEFINE FIELD terminated_on ON TABLE lease TYPE option<string>;
DEFINE FIELD termination_reason ON TABLE lease TYPE option<string>;
DEFINE FIELD deposit_return_cents ON TABLE lease TYPE option<int>;
DEFINE FIELD deposit_return_date ON TABLE lease TYPE option<string>;
DEFINE FIELD move_in_notes ON TABLE lease TYPE option<string>;
DEFINE FIELD move_out_notes ON TABLE lease TYPE option<string>;
DEFINE FIELD created_at ON TABLE lease TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE lease TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_lease_unit_window ON TABLE lease \
    COLUMNS unit_id, move_in_date;
DEFINE INDEX idx_lease_property ON TABLE lease \
    COLUMNS property_id;
DEFINE INDEX idx_lease_tenant ON TABLE lease \
    COLUMNS tenant_id;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

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

/// Returns the raw schema DDL for version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
