//! Relationship Coordinator
//!
//! The only writer of the Boat 1:M Load cross references. A load is either
//! `Unassigned` or `Assigned(boat)`; `assign` and `unassign` move it between
//! the two and update both halves of the relationship with separate writes,
//! load first, then boat. There is no rollback: if the second write fails the
//! halves disagree until a later transition touches them.
//!
//! Transitions on the same boat can be serialised through
//! [`RelationshipLocks`]. Lock order is always boat, then load, and no
//! operation holds two boat locks.

use std::sync::Arc;

use dashmap::DashMap;
use marina_core::{
    Boat, BoatId, Load, LoadId, LoadRef, LoadState, MarinaError, MarinaResult,
    RelationshipError, ValidationError,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::boat_registry::BoatRegistry;
use super::load_registry::{LoadInput, LoadRegistry};
use crate::telemetry::metrics;
use crate::types::LinkBuilder;

// ============================================================================
// LOCKS
// ============================================================================

/// Per-boat and per-load async mutexes.
///
/// When disabled every `acquire` returns immediately and concurrent
/// transitions on one boat can lose updates.
#[derive(Debug, Default)]
pub struct RelationshipLocks {
    enabled: bool,
    boats: DashMap<BoatId, Arc<Mutex<()>>>,
    loads: DashMap<LoadId, Arc<Mutex<()>>>,
}

/// Held for the duration of a transition. Releases on drop.
#[derive(Debug, Default)]
#[must_use = "the locks are released as soon as the guard is dropped"]
pub struct RelationshipGuard {
    _held: Vec<OwnedMutexGuard<()>>,
}

impl RelationshipLocks {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Lock `boat` and, if given, `load`, in that order.
    pub async fn acquire(&self, boat: BoatId, load: Option<LoadId>) -> RelationshipGuard {
        if !self.enabled {
            return RelationshipGuard::default();
        }
        let mut held = Vec::with_capacity(2);
        let boat_lock = Arc::clone(&self.boats.entry(boat).or_default());
        held.push(boat_lock.lock_owned().await);
        if let Some(load) = load {
            let load_lock = Arc::clone(&self.loads.entry(load).or_default());
            held.push(load_lock.lock_owned().await);
        }
        RelationshipGuard { _held: held }
    }

    /// Lock `load` alone. Callers may already hold its boat's lock, never the
    /// other way round.
    pub async fn acquire_load(&self, load: LoadId) -> RelationshipGuard {
        if !self.enabled {
            return RelationshipGuard::default();
        }
        let load_lock = Arc::clone(&self.loads.entry(load).or_default());
        RelationshipGuard {
            _held: vec![load_lock.lock_owned().await],
        }
    }

    pub fn forget_boat(&self, boat: BoatId) {
        self.boats.remove(&boat);
    }

    pub fn forget_load(&self, load: LoadId) {
        self.loads.remove(&load);
    }
}

// ============================================================================
// CLEANUP REPORT
// ============================================================================

/// Outcome of releasing every load of a boat that is being deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Back-reference cleared.
    pub released: Vec<LoadId>,
    /// Listed but missing, or already pointing elsewhere. Nothing to do.
    pub skipped: Vec<LoadId>,
    /// Back-reference could not be cleared and still names the deleted boat.
    pub failed: Vec<LoadId>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

// ============================================================================
// COORDINATOR
// ============================================================================

#[derive(Clone)]
pub struct RelationshipCoordinator {
    boats: BoatRegistry,
    loads: LoadRegistry,
    locks: Arc<RelationshipLocks>,
}

impl RelationshipCoordinator {
    pub fn new(boats: BoatRegistry, loads: LoadRegistry, locks: Arc<RelationshipLocks>) -> Self {
        Self {
            boats,
            loads,
            locks,
        }
    }

    pub fn locks(&self) -> &RelationshipLocks {
        &self.locks
    }

    /// Put `load` on `boat`. Legal only while the load is on no boat at all.
    pub async fn assign(
        &self,
        boat_id: BoatId,
        load_id: LoadId,
        links: &LinkBuilder,
    ) -> MarinaResult<(Boat, Load)> {
        let result = self.assign_inner(boat_id, load_id, links).await;
        record("assign", &result);
        result
    }

    async fn assign_inner(
        &self,
        boat_id: BoatId,
        load_id: LoadId,
        links: &LinkBuilder,
    ) -> MarinaResult<(Boat, Load)> {
        let _guard = self.locks.acquire(boat_id, Some(load_id)).await;

        let mut boat = self.boats.get(boat_id).await?;
        let mut load = self.loads.get(load_id).await?;

        if let LoadState::Assigned(current) = load.state() {
            return Err(RelationshipError::AlreadyAssigned {
                load: load_id,
                boat: current,
            }
            .into());
        }

        load.current_boat = Some(boat_id);
        self.loads.save(&load).await?;

        let listed = boat.push_load(LoadRef {
            id: load_id,
            self_link: links.entity(load_id),
        });
        if listed {
            self.boats.save(&boat).await?;
        }

        tracing::debug!(boat_id = %boat_id, load_id = %load_id, "Load assigned");
        Ok((boat, load))
    }

    /// Take `load` off `boat`. Legal only from `Assigned(boat)`.
    pub async fn unassign(&self, boat_id: BoatId, load_id: LoadId) -> MarinaResult<(Boat, Load)> {
        let result = self.unassign_inner(boat_id, load_id).await;
        record("unassign", &result);
        result
    }

    async fn unassign_inner(&self, boat_id: BoatId, load_id: LoadId) -> MarinaResult<(Boat, Load)> {
        let _guard = self.locks.acquire(boat_id, Some(load_id)).await;

        let boat = self.boats.get(boat_id).await?;
        let load = self.loads.get(load_id).await?;
        if load.state() != LoadState::Assigned(boat_id) {
            return Err(RelationshipError::NotAssigned {
                load: load_id,
                boat: boat_id,
            }
            .into());
        }
        self.detach(boat, load).await
    }

    /// Clear both halves. Caller holds the locks and has checked the state.
    async fn detach(&self, mut boat: Boat, mut load: Load) -> MarinaResult<(Boat, Load)> {
        load.current_boat = None;
        self.loads.save(&load).await?;

        if boat.remove_load(load.id) {
            self.boats.save(&boat).await?;
        }

        tracing::debug!(boat_id = %boat.id, load_id = %load.id, "Load unassigned");
        Ok((boat, load))
    }

    /// Clear the back-reference of every load `boat` lists.
    ///
    /// Best effort: a failure on one load does not stop the others. The
    /// caller is expected to hold the boat lock.
    pub async fn release_boat_loads(&self, boat: &Boat) -> CleanupReport {
        let mut report = CleanupReport::default();

        for entry in &boat.loads {
            let _load_guard = self.locks.acquire_load(entry.id).await;
            let outcome = match self.loads.find(entry.id).await {
                Ok(Some(mut load)) if load.current_boat == Some(boat.id) => {
                    load.current_boat = None;
                    self.loads.save(&load).await.map(|()| true)
                }
                Ok(Some(_)) | Ok(None) => Ok(false),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(true) => report.released.push(entry.id),
                Ok(false) => {
                    tracing::warn!(
                        boat_id = %boat.id,
                        load_id = %entry.id,
                        "Listed load is missing or not on this boat"
                    );
                    report.skipped.push(entry.id);
                }
                Err(e) => {
                    tracing::warn!(
                        boat_id = %boat.id,
                        load_id = %entry.id,
                        error = %e,
                        "Failed to release load"
                    );
                    if let Some(m) = metrics() {
                        m.record_cleanup_failure();
                    }
                    report.failed.push(entry.id);
                }
            }
        }

        if let Some(m) = metrics() {
            m.record_transition("release", if report.is_clean() { "ok" } else { "partial" });
        }
        report
    }

    /// Delete a load, taking it off its boat first.
    ///
    /// A back-reference to a boat that no longer exists is logged and
    /// ignored. Store errors abort before the load record is removed.
    pub async fn delete_load(&self, load_id: LoadId) -> MarinaResult<()> {
        loop {
            let expected = self.loads.get(load_id).await?.current_boat;
            let guard = match expected {
                Some(boat_id) => self.locks.acquire(boat_id, Some(load_id)).await,
                None => self.locks.acquire_load(load_id).await,
            };

            let load = self.loads.get(load_id).await?;
            if load.current_boat != expected {
                // Moved between the read and the lock; try again.
                drop(guard);
                continue;
            }

            if let Some(boat_id) = load.current_boat {
                match self.boats.find(boat_id).await? {
                    Some(mut boat) => {
                        // Boat entry first: a failed write leaves both halves in place.
                        if boat.remove_load(load_id) {
                            self.boats.save(&boat).await?;
                        }
                    }
                    None => tracing::warn!(
                        boat_id = %boat_id,
                        load_id = %load_id,
                        "Load points at a missing boat"
                    ),
                }
            }

            self.loads.delete(load_id).await?;
            drop(guard);
            self.locks.forget_load(load_id);
            tracing::info!(load_id = %load_id, "Load deleted");
            return Ok(());
        }
    }

    /// Overwrite a load's attributes, keeping whatever boat it is on.
    ///
    /// `edit` builds the new attributes from the record read under the load
    /// lock, so an assign landing between a caller's read and this write is
    /// never undone.
    pub async fn edit_load<F>(&self, load_id: LoadId, edit: F) -> MarinaResult<Load>
    where
        F: FnOnce(&Load) -> Result<LoadInput, ValidationError>,
    {
        let _guard = self.locks.acquire_load(load_id).await;
        let load = self.loads.get(load_id).await?;
        let input = edit(&load)?;
        self.loads.replace(load_id, input, load.current_boat).await
    }

    /// Full load records for every entry `boat` lists, in list order.
    /// Entries whose load no longer exists are skipped.
    pub async fn loads_on(&self, boat: &Boat) -> MarinaResult<Vec<Load>> {
        let mut loads = Vec::with_capacity(boat.loads.len());
        for entry in &boat.loads {
            match self.loads.find(entry.id).await? {
                Some(load) => loads.push(load),
                None => tracing::warn!(boat_id = %boat.id, load_id = %entry.id, "Listed load is missing"),
            }
        }
        Ok(loads)
    }

    pub async fn lock_boat(&self, boat_id: BoatId) -> RelationshipGuard {
        self.locks.acquire(boat_id, None).await
    }

    pub fn forget_boat(&self, boat_id: BoatId) {
        self.locks.forget_boat(boat_id);
    }
}

fn record<T>(transition: &str, result: &MarinaResult<T>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(MarinaError::Relationship(_)) => "conflict",
        Err(MarinaError::NotFound { .. }) => "not_found",
        Err(_) => "error",
    };
    if let Some(m) = metrics() {
        m.record_transition(transition, outcome);
    }
}
