//! Exclusive-ownership arbitration over the physical pin namespace.
//!
//! The registry never reads or writes hardware state — it only governs
//! who owns which line.  Lifecycle:
//!
//! ```text
//! new / with_table ──▶ register_pin* ──▶ initialize ──▶ acquire/release* ──▶ cleanup
//! ```
//!
//! Invariants:
//! - at most one owner per physical pin at any time;
//! - `acquire` is atomic over its whole request set (all or nothing);
//! - `release` is idempotent and never fails;
//! - `cleanup` runs its work exactly once, later calls are no-ops.

use std::collections::HashMap;

use log::{debug, info, warn};

use crate::controllers::ControllerId;
use crate::error::RegistryError;
use crate::pins::{PinSpec, PinTable};

/// Claim record for one owned line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Claim {
    pub owner: ControllerId,
    pub mode: crate::pins::PinClass,
}

/// Owns the pin assignment table and the claim map.
pub struct PinRegistry {
    table: PinTable,
    /// BCM number → claim.  Keyed by the physical id: two logical names
    /// aliasing one line can never be claimed twice.
    claims: HashMap<u8, Claim>,
    initialized: bool,
    cleaned_up: bool,
}

impl PinRegistry {
    pub fn new() -> Self {
        Self {
            table: PinTable::new(),
            claims: HashMap::new(),
            initialized: false,
            cleaned_up: false,
        }
    }

    /// Build a registry with every entry of `table` pre-registered.
    pub fn with_table(table: PinTable) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        let entries: Vec<(String, PinSpec)> = table
            .iter()
            .map(|(name, spec)| (name.to_owned(), *spec))
            .collect();
        for (name, spec) in entries {
            registry.register_pin(&name, spec)?;
        }
        Ok(registry)
    }

    /// Register a logical pin.  Only allowed before `initialize`; the
    /// table is immutable afterwards.
    pub fn register_pin(&mut self, name: &str, spec: PinSpec) -> Result<(), RegistryError> {
        if self.initialized {
            return Err(RegistryError::InitFailed(
                "pin table is sealed after initialize",
            ));
        }
        if self.table.contains(name) {
            return Err(RegistryError::DuplicateClaim(name.to_owned()));
        }
        debug!("pin registered: {name} (BCM {})", spec.bcm);
        self.table.insert(name, spec);
        Ok(())
    }

    /// Establish the pin namespace.  Fails if the table is inconsistent
    /// (two names on one BCM line) or the registry was already torn down.
    pub fn initialize(&mut self) -> Result<(), RegistryError> {
        if self.cleaned_up {
            return Err(RegistryError::InitFailed("registry already cleaned up"));
        }
        let mut seen: HashMap<u8, &str> = HashMap::new();
        for (name, spec) in self.table.iter() {
            if seen.insert(spec.bcm, name).is_some() {
                return Err(RegistryError::InitFailed(
                    "two logical names assigned to one BCM line",
                ));
            }
        }
        self.initialized = true;
        info!("pin registry initialized ({} lines)", self.table.len());
        Ok(())
    }

    /// Atomically claim every named pin for `owner`.
    ///
    /// Either all pins end up owned by `owner`, or none do.  On conflict
    /// the error names the first pin that could not be claimed and no
    /// claim from this request survives.
    pub fn acquire(&mut self, owner: ControllerId, names: &[&str]) -> Result<(), RegistryError> {
        if !self.initialized {
            return Err(RegistryError::NotInitialized);
        }

        // Validation pass: resolve every name and check availability
        // before mutating anything.  A duplicate name within the request
        // is a conflict with the request itself.
        let mut pending: Vec<(u8, crate::pins::PinClass)> = Vec::with_capacity(names.len());
        for name in names {
            let spec = self
                .table
                .get(name)
                .ok_or_else(|| RegistryError::UnknownPin((*name).to_owned()))?;
            if let Some(claim) = self.claims.get(&spec.bcm) {
                return Err(RegistryError::PinUnavailable {
                    pin: (*name).to_owned(),
                    held_by: claim.owner,
                });
            }
            if pending.iter().any(|(bcm, _)| *bcm == spec.bcm) {
                return Err(RegistryError::PinUnavailable {
                    pin: (*name).to_owned(),
                    held_by: owner,
                });
            }
            pending.push((spec.bcm, spec.class));
        }

        // Commit pass: infallible.
        for (bcm, mode) in pending {
            self.claims.insert(bcm, Claim { owner, mode });
        }
        info!("{owner}: acquired {names:?}");
        Ok(())
    }

    /// Release everything owned by `owner`.  Idempotent, never fails;
    /// releasing with nothing owned is a no-op.
    pub fn release(&mut self, owner: ControllerId) {
        let before = self.claims.len();
        self.claims.retain(|_, claim| claim.owner != owner);
        let released = before - self.claims.len();
        if released > 0 {
            info!("{owner}: released {released} pin(s)");
        }
    }

    /// Tear down the namespace.  Releases every claim and seals the
    /// registry.  The work runs exactly once; later calls are no-ops.
    pub fn cleanup(&mut self) {
        if self.cleaned_up {
            debug!("pin registry cleanup: already done");
            return;
        }
        if !self.claims.is_empty() {
            warn!("cleanup with {} claim(s) still held", self.claims.len());
        }
        self.claims.clear();
        self.initialized = false;
        self.cleaned_up = true;
        info!("pin registry cleaned up");
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn spec(&self, name: &str) -> Option<&PinSpec> {
        self.table.get(name)
    }

    /// Current owner of a logical pin, if claimed.
    pub fn owner_of(&self, name: &str) -> Option<ControllerId> {
        let spec = self.table.get(name)?;
        self.claims.get(&spec.bcm).map(|c| c.owner)
    }

    /// Number of currently claimed physical lines.
    pub fn claimed_count(&self) -> usize {
        self.claims.len()
    }
}

impl Default for PinRegistry {
    fn default() -> Self {
        Self::new()
    }
}
