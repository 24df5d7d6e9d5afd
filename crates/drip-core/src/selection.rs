//! Selection set reconciliation.
//!
//! Selections only grow through `reconcile`: an activity missing from a form
//! submission keeps its record. Pruning is a separate, explicit call to
//! `remove_selection`.

use crate::error::Result;
use crate::store::SelectionStore;
use crate::types::{ActivityId, ScheduleId};
use std::collections::BTreeSet;

/// Insert every requested id not yet recorded for `schedule_id` and return
/// the union of the stored and requested sets.
pub fn reconcile<S: SelectionStore + ?Sized>(
    store: &S,
    schedule_id: ScheduleId,
    requested: &BTreeSet<ActivityId>,
) -> Result<BTreeSet<ActivityId>> {
    let mut selections = store.get_selections(schedule_id)?;
    let missing: Vec<ActivityId> = requested.difference(&selections).copied().collect();
    let mut added = 0usize;
    for id in missing {
        if store.insert_selection(schedule_id, id)? {
            added += 1;
        }
        selections.insert(id);
    }
    tracing::debug!(
        schedule_id,
        requested = requested.len(),
        added,
        total = selections.len(),
        "selections reconciled"
    );
    Ok(selections)
}

/// Drop one activity from a schedule. Returns `false` if it was not selected.
pub fn remove_selection<S: SelectionStore + ?Sized>(
    store: &S,
    schedule_id: ScheduleId,
    activity_id: ActivityId,
) -> Result<bool> {
    let removed = store.remove_selection(schedule_id, activity_id)?;
    if removed {
        tracing::info!(schedule_id, activity_id, "selection removed");
    }
    Ok(removed)
}
