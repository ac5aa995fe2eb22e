// SPDX-License-Identifier: MIT OR Apache-2.0
//! Undo/redo history over committed edits.
//!
//! The history stores the per-clip before/after records that each edit
//! reports, not timeline snapshots. Undoing replays the `before` side of a
//! record, redoing replays the `after` side. Both sides were valid when the
//! edit committed, so replaying them cannot violate the timeline invariants.

use crate::edit::{ClipChange, EditOutcome};
use crate::timeline::Timeline;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Maximum number of edits retained by default
const MAX_HISTORY: usize = 100;

/// Errors from history navigation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    /// The undo stack is empty
    #[error("nothing to undo")]
    NothingToUndo,
    /// The redo stack is empty
    #[error("nothing to redo")]
    NothingToRedo,
}

/// One recorded edit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditRecord {
    /// Human-readable description for UI display
    pub description: String,
    /// Per-clip changes as reported by the edit
    pub changes: Vec<ClipChange>,
}

/// A bounded undo/redo stack of [`EditRecord`]s.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditHistory {
    undo_stack: VecDeque<EditRecord>,
    redo_stack: Vec<EditRecord>,
    max_depth: usize,
}

impl Default for EditHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl EditHistory {
    /// Create a history retaining up to 100 edits
    pub fn new() -> Self {
        Self::with_max_depth(MAX_HISTORY)
    }

    /// Create a history retaining up to `max_depth` edits
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_depth,
        }
    }

    /// Record a committed edit. No-op outcomes are not recorded. Recording
    /// clears the redo stack; the oldest record is dropped past the depth
    /// limit.
    pub fn record(&mut self, description: impl Into<String>, outcome: &EditOutcome) {
        if outcome.is_empty() {
            return;
        }
        self.redo_stack.clear();
        self.undo_stack.push_back(EditRecord {
            description: description.into(),
            changes: outcome.changes.clone(),
        });
        while self.undo_stack.len() > self.max_depth {
            self.undo_stack.pop_front();
        }
    }

    /// Revert the most recent edit
    pub fn undo(&mut self, timeline: &mut Timeline) -> Result<(), HistoryError> {
        let record = self.undo_stack.pop_back().ok_or(HistoryError::NothingToUndo)?;
        apply(timeline, &record, Direction::Backward);
        tracing::debug!(description = %record.description, "undid edit");
        self.redo_stack.push(record);
        Ok(())
    }

    /// Re-apply the most recently undone edit
    pub fn redo(&mut self, timeline: &mut Timeline) -> Result<(), HistoryError> {
        let record = self.redo_stack.pop().ok_or(HistoryError::NothingToRedo)?;
        apply(timeline, &record, Direction::Forward);
        tracing::debug!(description = %record.description, "redid edit");
        self.undo_stack.push_back(record);
        Ok(())
    }

    /// Whether an undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Whether a redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Description of the edit the next undo would revert
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|r| r.description.as_str())
    }

    /// Description of the edit the next redo would re-apply
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.last().map(|r| r.description.as_str())
    }

    /// Drop all recorded edits
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

enum Direction {
    Forward,
    Backward,
}

fn apply(timeline: &mut Timeline, record: &EditRecord, direction: Direction) {
    // restoring a previously committed state, no re-validation needed
    let (overlay, moves): (Vec<_>, Vec<_>) = match direction {
        Direction::Backward => (
            record.changes.iter().map(|c| (c.clip, c.before)).collect(),
            record
                .changes
                .iter()
                .filter(|c| c.layer_before != c.layer_after)
                .filter_map(|c| c.layer_before.map(|l| (c.clip, l)))
                .collect(),
        ),
        Direction::Forward => (
            record.changes.iter().map(|c| (c.clip, c.after)).collect(),
            record
                .changes
                .iter()
                .filter(|c| c.layer_before != c.layer_after)
                .filter_map(|c| c.layer_after.map(|l| (c.clip, l)))
                .collect(),
        ),
    };
    timeline.commit_edit(&overlay, &moves);
}
