//! Database schema definitions and SQL constants.

/// Current schema version for the database.
///
/// Stored in the metadata table and checked on every open.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// SQL statement to create the metadata table.
pub const CREATE_METADATA_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS metadata (
        key TEXT PRIMARY KEY NOT NULL,
        value TEXT NOT NULL
    )";

/// SQL statement to create the stable bindings table.
///
/// One row per (environment, location, traffic class). A released row stays
/// until the class is bound again, which overwrites it.
pub const CREATE_BINDINGS_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS stable_bindings (
        environment TEXT NOT NULL,
        location TEXT NOT NULL,
        traffic_class TEXT NOT NULL,
        address TEXT NOT NULL,
        allocation_id TEXT NOT NULL,
        bound_resource TEXT,
        state TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        PRIMARY KEY (environment, location, traffic_class)
    )";

/// An address can back at most one active binding.
///
/// Partial unique index, so concurrent runs cannot hand one address to two
/// traffic classes while released rows keep their history.
pub const CREATE_ACTIVE_ADDRESS_INDEX: &str = r"
    CREATE UNIQUE INDEX IF NOT EXISTS idx_stable_bindings_active_address
    ON stable_bindings(address)
    WHERE state != 'released'";

/// SQL statement to create an index for listing by deployment.
pub const CREATE_DEPLOYMENT_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_stable_bindings_deployment \
     ON stable_bindings(environment, location)";

/// SQL statement to select the schema version from the metadata table.
pub const SELECT_SCHEMA_VERSION: &str = "SELECT value FROM metadata WHERE key = 'schema_version'";

/// SQL statement to insert or update the schema version in the metadata table.
pub const INSERT_SCHEMA_VERSION: &str =
    "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?)";

/// Columns selected for a binding row, in `row_to_binding` order.
pub const BINDING_COLUMNS: &str = "environment, location, traffic_class, address, \
     allocation_id, bound_resource, state, created_at, updated_at";

/// SQL statement to insert or overwrite a binding.
pub const UPSERT_BINDING: &str = r"
    INSERT OR REPLACE INTO stable_bindings
    (environment, location, traffic_class, address, allocation_id, bound_resource, state,
     created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
";

/// SQL statement to change the bound resource and state of a binding.
pub const UPDATE_BINDING_STATE: &str = r"
    UPDATE stable_bindings
    SET bound_resource = ?, state = ?, updated_at = ?
    WHERE environment = ? AND location = ? AND traffic_class = ?
";
