//! Authorization seam for permissioned entrypoints.
//!
//! The control loop and its administrative surface are gated by roles, but
//! role administration itself is out of scope. Callers of a permissioned
//! entrypoint are checked through the [`Authorize`] trait; [`RoleTable`] is
//! an in-memory implementation suitable for tests and embedding.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::Address;

/// Roles recognized by the market-operations system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    /// May change configuration, initialize, and trigger emergency paths.
    Admin,
    /// May drive the periodic control loop and oracle updates.
    Heartbeat,
}

/// Error type for authorization checks.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The caller does not hold the required role.
    #[error("caller {caller:02x?} is not authorized for role {role:?}")]
    Unauthorized {
        /// Address that attempted the call.
        caller: Address,
        /// Role the entrypoint requires.
        role: Role,
    },
}

/// Convenience result type for authorization checks.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Policy check consulted by every permissioned entrypoint.
pub trait Authorize {
    /// Verify `caller` holds `role`.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Unauthorized`] if the caller does not hold the role
    fn ensure(&self, caller: Address, role: Role) -> Result<()>;
}

/// In-memory role assignments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleTable {
    grants: BTreeMap<Address, BTreeSet<Role>>,
}

impl RoleTable {
    /// Create an empty role table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `role` to `address`.
    pub fn grant(&mut self, address: Address, role: Role) {
        self.grants.entry(address).or_default().insert(role);
    }

    /// Revoke `role` from `address`.
    pub fn revoke(&mut self, address: Address, role: Role) {
        if let Some(roles) = self.grants.get_mut(&address) {
            roles.remove(&role);
            if roles.is_empty() {
                self.grants.remove(&address);
            }
        }
    }

    /// Return whether `address` holds `role`.
    pub fn holds(&self, address: Address, role: Role) -> bool {
        self.grants
            .get(&address)
            .is_some_and(|roles| roles.contains(&role))
    }
}

impl Authorize for RoleTable {
    fn ensure(&self, caller: Address, role: Role) -> Result<()> {
        if self.holds(caller, role) {
            Ok(())
        } else {
            Err(AuthError::Unauthorized { caller, role })
        }
    }
}
