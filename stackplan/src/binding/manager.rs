//! Endpoint stability management.
//!
//! Every mutation is a read-check-write inside one IMMEDIATE transaction, so
//! two deployment runs racing on the same binding serialize on the store and
//! the loser observes the winner's row.

use std::time::SystemTime;

use rusqlite::Connection;

use crate::database::Database;
use crate::error::{Error, Result};

use super::types::{BindingKey, BindingState, StableAddress, StableAddressBinding};

/// Keeps one persistent address per traffic class that needs one.
///
/// # Examples
///
/// ```no_run
/// use std::net::Ipv4Addr;
/// use stackplan::binding::{BindingKey, EndpointStabilityManager, StableAddress};
/// use stackplan::database::{Database, DatabaseConfig};
///
/// let mut db = Database::open(DatabaseConfig::new("/tmp/bindings.db")).unwrap();
/// let mut manager = EndpointStabilityManager::new(&mut db);
///
/// let key = BindingKey::new("beta", "eu-west-1", "streaming-ingest");
/// let address = StableAddress::new(Ipv4Addr::new(203, 0, 113, 10), "eipalloc-1");
/// manager.allocate(&key, &address).unwrap();
/// manager.associate(&key, "i-0abc").unwrap();
///
/// // instance replaced: same address, new resource
/// manager.reassociate(&key, "i-0abc", "i-0def").unwrap();
/// ```
#[derive(Debug)]
pub struct EndpointStabilityManager<'a> {
    db: &'a mut Database,
}

impl<'a> EndpointStabilityManager<'a> {
    /// Wraps an open binding store.
    pub fn new(db: &'a mut Database) -> Self {
        Self { db }
    }

    /// The stored binding for `key`, in any state.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn get(&self, key: &BindingKey) -> Result<Option<StableAddressBinding>> {
        Database::get_binding(self.db.connection(), key)
    }

    /// The binding for `key` if it still holds its address.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn active(&self, key: &BindingKey) -> Result<Option<StableAddressBinding>> {
        Ok(self.get(key)?.filter(StableAddressBinding::is_active))
    }

    /// All bindings, optionally narrowed to a deployment.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn list(
        &self,
        environment: Option<&str>,
        location: Option<&str>,
    ) -> Result<Vec<StableAddressBinding>> {
        Database::list_bindings(self.db.connection(), environment, location)
    }

    /// Records a freshly allocated address for `key`.
    ///
    /// Idempotent: if `key` is already bound to the same address the existing
    /// binding is returned untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AddressBindingConflict`] if `key` is actively bound to
    /// a different address, or if another key holds `address`.
    pub fn allocate(
        &mut self,
        key: &BindingKey,
        address: &StableAddress,
    ) -> Result<StableAddressBinding> {
        let binding = self
            .db
            .with_immediate_transaction(|tx| record_allocation(tx, key, address))?;
        log::info!("bound {} to {}", key, binding.address);
        Ok(binding)
    }

    /// Imports an address declared in the registry as an allocated binding.
    ///
    /// Same rules as [`EndpointStabilityManager::allocate`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::AddressBindingConflict`] on a mismatch with the store.
    pub fn adopt_literal(
        &mut self,
        key: &BindingKey,
        address: &StableAddress,
    ) -> Result<StableAddressBinding> {
        let binding = self
            .db
            .with_immediate_transaction(|tx| record_allocation(tx, key, address))?;
        log::info!("adopted registry address {} for {}", binding.address, key);
        Ok(binding)
    }

    /// Attaches the bound address to `resource_id`.
    ///
    /// Re-associating the resource already holding the address is a no-op,
    /// and settles a `Reassociated` binding back to `Associated`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `key` has no active binding, and
    /// [`Error::InvalidBindingTransition`] if a different resource holds the
    /// address (use [`EndpointStabilityManager::reassociate`]).
    pub fn associate(
        &mut self,
        key: &BindingKey,
        resource_id: &str,
    ) -> Result<StableAddressBinding> {
        let binding = self.db.with_immediate_transaction(|tx| {
            let mut binding = load_active(tx, key)?;

            if let Some(current) = binding.bound_resource_id.as_deref() {
                if current != resource_id {
                    return Err(Error::InvalidBindingTransition {
                        traffic_class: key.traffic_class.clone(),
                        from: binding.state,
                        to: BindingState::Associated,
                        details: format!("address is held by '{current}'; reassociate it instead"),
                    });
                }
                if binding.state == BindingState::Associated {
                    return Ok(binding);
                }
            }

            transition(tx, &mut binding, Some(resource_id), BindingState::Associated)?;
            Ok(binding)
        })?;

        log::debug!("{} associated with {}", key, resource_id);
        Ok(binding)
    }

    /// Re-points the address from `expected` to `replacement`.
    ///
    /// The address itself never changes. `expected` is checked against the
    /// store inside the transaction, so a concurrent run that already moved
    /// the binding makes this call fail rather than overwrite it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleBinding`] if the stored resource is not
    /// `expected`, or [`Error::NotFound`] if `key` has no active binding.
    pub fn reassociate(
        &mut self,
        key: &BindingKey,
        expected: &str,
        replacement: &str,
    ) -> Result<StableAddressBinding> {
        let binding = self.db.with_immediate_transaction(|tx| {
            let mut binding = load_active(tx, key)?;

            if binding.bound_resource_id.as_deref() != Some(expected) {
                return Err(Error::StaleBinding {
                    traffic_class: key.traffic_class.clone(),
                    expected: expected.to_string(),
                    actual: binding.bound_resource_id,
                });
            }
            if expected == replacement {
                return Ok(binding);
            }

            transition(tx, &mut binding, Some(replacement), BindingState::Reassociated)?;
            Ok(binding)
        })?;

        log::info!(
            "{} re-pointed from {} to {}, keeping {}",
            key,
            expected,
            replacement,
            binding.address
        );
        Ok(binding)
    }

    /// Gives the address back on decommission.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `key` was never bound, and
    /// [`Error::InvalidBindingTransition`] if it is already released.
    pub fn release(&mut self, key: &BindingKey) -> Result<StableAddressBinding> {
        let binding = self.db.with_immediate_transaction(|tx| {
            let mut binding = load(tx, key)?;
            transition(tx, &mut binding, None, BindingState::Released)?;
            Ok(binding)
        })?;

        log::warn!("released {} from {}", binding.address, key);
        Ok(binding)
    }
}

fn load(conn: &Connection, key: &BindingKey) -> Result<StableAddressBinding> {
    Database::get_binding(conn, key)?.ok_or_else(|| Error::NotFound {
        resource: format!("binding {key}"),
    })
}

fn load_active(conn: &Connection, key: &BindingKey) -> Result<StableAddressBinding> {
    let binding = load(conn, key)?;
    if binding.is_active() {
        Ok(binding)
    } else {
        Err(Error::NotFound {
            resource: format!("active binding {key}"),
        })
    }
}

fn transition(
    conn: &Connection,
    binding: &mut StableAddressBinding,
    resource_id: Option<&str>,
    next: BindingState,
) -> Result<()> {
    if !binding.state.can_transition_to(next) {
        return Err(Error::InvalidBindingTransition {
            traffic_class: binding.key.traffic_class.clone(),
            from: binding.state,
            to: next,
            details: String::from("not allowed by the binding lifecycle"),
        });
    }

    let now = SystemTime::now();
    Database::update_binding_state_simple(conn, &binding.key, resource_id, next, now)?;
    binding.bound_resource_id = resource_id.map(str::to_string);
    binding.state = next;
    binding.updated_at = now;
    Ok(())
}

fn record_allocation(
    conn: &Connection,
    key: &BindingKey,
    address: &StableAddress,
) -> Result<StableAddressBinding> {
    let active = Database::get_binding(conn, key)?.filter(StableAddressBinding::is_active);
    if let Some(existing) = active {
        if existing.address.address == address.address {
            return Ok(existing);
        }
        return Err(Error::AddressBindingConflict {
            traffic_class: key.traffic_class.clone(),
            existing: existing.address.address.to_string(),
            requested: address.address.to_string(),
        });
    }

    if let Some(holder) = Database::find_active_by_address(conn, address.address)? {
        return Err(Error::AddressBindingConflict {
            traffic_class: key.traffic_class.clone(),
            existing: format!("{} (held by {})", holder.address.address, holder.key),
            requested: address.address.to_string(),
        });
    }

    let now = SystemTime::now();
    let binding = StableAddressBinding {
        key: key.clone(),
        address: address.clone(),
        bound_resource_id: None,
        state: BindingState::Allocated,
        created_at: now,
        updated_at: now,
    };
    Database::upsert_binding_simple(conn, &binding)?;
    Ok(binding)
}
