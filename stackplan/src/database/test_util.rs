//! Shared test utilities for database unit tests.

use std::net::Ipv4Addr;
use std::time::{Duration, SystemTime};

use tempfile::tempdir;

use crate::binding::{BindingKey, BindingState, StableAddress, StableAddressBinding};
use crate::database::{Database, DatabaseConfig};

/// Creates a temporary test database that will be cleaned up automatically.
///
/// # Panics
///
/// Panics if the temporary directory or database cannot be created.
#[must_use]
pub fn create_test_database() -> Database {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.db");
    let db = Database::open(DatabaseConfig::new(path)).unwrap();

    // Keep the directory alive for the lifetime of the test process
    std::mem::forget(dir);

    db
}

/// Creates an allocated binding in `eu-west-1` with whole-second timestamps.
#[must_use]
pub fn create_test_binding(
    environment: &str,
    traffic_class: &str,
    octets: [u8; 4],
) -> StableAddressBinding {
    let at = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
    StableAddressBinding {
        key: BindingKey::new(environment, "eu-west-1", traffic_class),
        address: StableAddress::new(Ipv4Addr::from(octets), format!("eipalloc-{}", octets[3])),
        bound_resource_id: None,
        state: BindingState::Allocated,
        created_at: at,
        updated_at: at,
    }
}
