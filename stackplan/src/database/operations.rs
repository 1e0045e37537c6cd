//! Row-level operations on the stable bindings table.
//!
//! The `*_simple` functions take any [`Connection`], so they work both on a
//! plain connection and inside a transaction opened by the caller.

use std::net::Ipv4Addr;
use std::time::{Duration, SystemTime};

use rusqlite::{params, Connection, OptionalExtension};

use crate::binding::{BindingKey, BindingState, StableAddress, StableAddressBinding};
use crate::error::{Error, Result};

use super::connection::Database;
use super::schema::{BINDING_COLUMNS, UPDATE_BINDING_STATE, UPSERT_BINDING};

/// Converts a `SystemTime` to Unix epoch seconds for database storage.
///
/// # Errors
///
/// Returns an error if the time is before the Unix epoch.
#[allow(clippy::cast_possible_wrap)]
pub(crate) fn systemtime_to_unix_secs(time: SystemTime) -> Result<i64> {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .map_err(|e| Error::Validation {
            field: "timestamp".into(),
            message: format!("Invalid timestamp: {e}"),
        })
        .map(|d| d.as_secs() as i64)
}

/// Converts Unix epoch seconds from the database to a `SystemTime`.
#[allow(clippy::cast_sign_loss)]
pub(crate) fn unix_secs_to_systemtime(secs: i64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(secs as u64)
}

/// Deserializes a binding from a row selected with [`BINDING_COLUMNS`].
fn row_to_binding(row: &rusqlite::Row<'_>) -> rusqlite::Result<StableAddressBinding> {
    let environment: String = row.get(0)?;
    let location: String = row.get(1)?;
    let traffic_class: String = row.get(2)?;
    let address: String = row.get(3)?;
    let allocation_id: String = row.get(4)?;
    let bound_resource_id: Option<String> = row.get(5)?;
    let state: String = row.get(6)?;
    let created_secs: i64 = row.get(7)?;
    let updated_secs: i64 = row.get(8)?;

    let address: Ipv4Addr = address
        .parse()
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;
    let state: BindingState = state
        .parse()
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(StableAddressBinding {
        key: BindingKey::new(environment, location, traffic_class),
        address: StableAddress::new(address, allocation_id),
        bound_resource_id,
        state,
        created_at: unix_secs_to_systemtime(created_secs),
        updated_at: unix_secs_to_systemtime(updated_secs),
    })
}

fn select_bindings(filter: &str) -> String {
    format!("SELECT {BINDING_COLUMNS} FROM stable_bindings {filter}")
}

impl Database {
    /// Retrieves the binding stored for `key`, in any state.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row cannot be decoded.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use stackplan::binding::BindingKey;
    /// use stackplan::database::{Database, DatabaseConfig};
    ///
    /// let db = Database::open(DatabaseConfig::new("/tmp/bindings.db")).unwrap();
    /// let key = BindingKey::new("beta", "eu-west-1", "streaming-ingest");
    /// let binding = Database::get_binding(db.connection(), &key).unwrap();
    /// ```
    pub fn get_binding(
        conn: &Connection,
        key: &BindingKey,
    ) -> Result<Option<StableAddressBinding>> {
        let sql = select_bindings("WHERE environment = ? AND location = ? AND traffic_class = ?");
        let binding = conn
            .query_row(
                &sql,
                params![key.environment, key.location, key.traffic_class],
                row_to_binding,
            )
            .optional()?;
        Ok(binding)
    }

    /// Finds the active binding currently holding `address`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn find_active_by_address(
        conn: &Connection,
        address: Ipv4Addr,
    ) -> Result<Option<StableAddressBinding>> {
        let sql = select_bindings("WHERE address = ? AND state != 'released'");
        let binding = conn
            .query_row(&sql, params![address.to_string()], row_to_binding)
            .optional()?;
        Ok(binding)
    }

    /// Lists bindings, optionally narrowed to one environment and/or location.
    ///
    /// Results are ordered by environment, location, then traffic class.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_bindings(
        conn: &Connection,
        environment: Option<&str>,
        location: Option<&str>,
    ) -> Result<Vec<StableAddressBinding>> {
        let sql = select_bindings(
            "WHERE (?1 IS NULL OR environment = ?1) AND (?2 IS NULL OR location = ?2) \
             ORDER BY environment, location, traffic_class",
        );
        let mut stmt = conn.prepare(&sql)?;

        let bindings = stmt
            .query_map(params![environment, location], row_to_binding)?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

        Ok(bindings)
    }

    /// Inserts `binding`, replacing any row with the same key.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails, including when another active
    /// binding already holds the address.
    pub fn upsert_binding_simple(conn: &Connection, binding: &StableAddressBinding) -> Result<()> {
        let created_secs = systemtime_to_unix_secs(binding.created_at)?;
        let updated_secs = systemtime_to_unix_secs(binding.updated_at)?;

        conn.execute(
            UPSERT_BINDING,
            params![
                binding.key.environment,
                binding.key.location,
                binding.key.traffic_class,
                binding.address.address.to_string(),
                binding.address.allocation_id,
                binding.bound_resource_id,
                binding.state.as_str(),
                created_secs,
                updated_secs,
            ],
        )?;

        Ok(())
    }

    /// Sets the bound resource and state of the binding at `key`.
    ///
    /// Returns `false` if no row exists for `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn update_binding_state_simple(
        conn: &Connection,
        key: &BindingKey,
        bound_resource_id: Option<&str>,
        state: BindingState,
        at: SystemTime,
    ) -> Result<bool> {
        let updated_secs = systemtime_to_unix_secs(at)?;
        let rows = conn.execute(
            UPDATE_BINDING_STATE,
            params![
                bound_resource_id,
                state.as_str(),
                updated_secs,
                key.environment,
                key.location,
                key.traffic_class,
            ],
        )?;
        Ok(rows > 0)
    }

    /// Verifies database integrity using PRAGMA `integrity_check`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DatabaseCorruption`] if the check reports problems.
    pub fn verify_integrity(&mut self) -> Result<()> {
        let result: String = self
            .conn
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))?;

        if result == "ok" {
            Ok(())
        } else {
            Err(Error::DatabaseCorruption {
                details: format!("Integrity check failed: {result}"),
            })
        }
    }
}
