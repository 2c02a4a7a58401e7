//! Checklist progress for a single task.

use serde::Serialize;

use crate::model::ChecklistItem;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
pub struct ChecklistProgress {
    pub completed: usize,
    pub total: usize,
    /// Rounded percentage in `0..=100`; 0 when the checklist is empty.
    pub percentage: u8,
}

impl ChecklistProgress {
    pub fn of(items: &[ChecklistItem]) -> Self {
        let total = items.len();
        let completed = items.iter().filter(|item| item.is_completed).count();
        Self::from_counts(completed, total)
    }

    pub fn from_counts(completed: usize, total: usize) -> Self {
        let completed = completed.min(total);
        let percentage = if total == 0 {
            0
        } else {
            // round half up on integers: (200c + t) / 2t == round(100c / t)
            ((200 * completed + total) / (2 * total)) as u8
        };
        Self {
            completed,
            total,
            percentage,
        }
    }

    /// Tasks without checklist items render no progress bar at all.
    pub fn has_progress_bar(&self) -> bool {
        self.total > 0
    }

    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

/// Whether setting `item_id` to `now_completed` is the toggle that completes
/// the whole checklist.
///
/// Only a false -> true toggle of an item in `items` counts. Toggling the same
/// item off and on again reports the transition again.
pub fn completes_checklist(items: &[ChecklistItem], item_id: &str, now_completed: bool) -> bool {
    if !now_completed {
        return false;
    }
    let Some(target) = items.iter().find(|item| item.id == item_id) else {
        return false;
    };
    if target.is_completed {
        return false;
    }
    items
        .iter()
        .filter(|item| item.id != item_id)
        .all(|item| item.is_completed)
}
