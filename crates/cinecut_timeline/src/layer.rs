// SPDX-License-Identifier: MIT OR Apache-2.0
//! Layers: priority bands of non-overlapping clips.

use crate::clip::ClipId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerId(pub Uuid);

impl LayerId {
    /// Create a new random layer ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

/// An ordered list of clips sharing a priority band.
///
/// Invariant: two clips in the same layer that share a track kind never
/// overlap in time. The clip sequence is kept ordered by start position; the
/// timeline re-slots clips after every committed edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    /// Unique layer ID
    pub id: LayerId,
    priority: u32,
    clips: Vec<ClipId>,
}

impl Layer {
    pub(crate) fn new(priority: u32) -> Self {
        Self {
            id: LayerId::new(),
            priority,
            clips: Vec::new(),
        }
    }

    /// Priority band of this layer (0 = topmost)
    pub fn priority(&self) -> u32 {
        self.priority
    }

    /// Clips in this layer, ordered by start position
    pub fn clips(&self) -> &[ClipId] {
        &self.clips
    }

    /// Number of clips in this layer
    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    pub(crate) fn clips_mut(&mut self) -> &mut Vec<ClipId> {
        &mut self.clips
    }
}
