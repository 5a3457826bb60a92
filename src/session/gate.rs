//! Single-slot guard for in-flight operations.
//!
//! At most one of file selection, region apply and save may be in flight.
//! The gate holds the tag of the running activity; acquiring it hands out a
//! [`LoadPermit`] that releases the gate when dropped, whichever way the
//! operation ends (success, error, early return or unwinding).

use std::sync::{Mutex, MutexGuard, PoisonError};

/// The operation currently holding the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Activity {
    /// Fetching slide metadata for a newly selected file
    Metadata,
    /// Fetching the thumbnail for a newly selected file
    Thumbnail,
    /// Fetching a level-0 region for the current selection
    Region,
    /// Saving the current viewport
    Saving,
}

/// Mutual-exclusion gate shared by the orchestrator and the selection
/// controller.
#[derive(Debug, Default)]
pub struct LoadGate {
    activity: Mutex<Option<Activity>>,
}

impl LoadGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the gate for `activity`, or `None` if it is already held.
    pub fn try_acquire(&self, activity: Activity) -> Option<LoadPermit<'_>> {
        let mut slot = self.slot();
        if slot.is_some() {
            return None;
        }
        *slot = Some(activity);
        Some(LoadPermit { gate: self })
    }

    /// Whether an operation is in flight.
    pub fn is_loading(&self) -> bool {
        self.slot().is_some()
    }

    /// The activity currently holding the gate.
    pub fn activity(&self) -> Option<Activity> {
        *self.slot()
    }

    fn slot(&self) -> MutexGuard<'_, Option<Activity>> {
        // The slot is a plain tag; a panic elsewhere cannot leave it torn.
        self.activity.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Proof of holding the [`LoadGate`]. Dropping it releases the gate.
#[derive(Debug)]
pub struct LoadPermit<'a> {
    gate: &'a LoadGate,
}

impl LoadPermit<'_> {
    /// Move the held gate on to the next step of a multi-step load.
    pub fn advance(&self, activity: Activity) {
        *self.gate.slot() = Some(activity);
    }
}

impl Drop for LoadPermit<'_> {
    fn drop(&mut self) {
        *self.gate.slot() = None;
    }
}
