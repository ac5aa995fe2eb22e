// SPDX-License-Identifier: MIT OR Apache-2.0
//! Clips: composite timeline elements spanning one or more tracks.

use crate::element::ElementId;
use crate::layer::LayerId;
use crate::time::{Interval, Time};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClipId(pub Uuid);

impl ClipId {
    /// Create a new random clip ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClipId {
    fn default() -> Self {
        Self::new()
    }
}

/// A logical timeline object grouping one track element per media kind.
///
/// The clip exposes a single (start, duration, in-point) that the timeline
/// propagates to every child element whenever it changes. Children are owned
/// by the clip for its whole lifetime; detaching from a track never destroys
/// them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clip {
    /// Unique clip ID
    pub id: ClipId,
    asset_id: String,
    interval: Interval,
    layer: Option<LayerId>,
    children: Vec<ElementId>,
}

impl Clip {
    pub(crate) fn new(asset_id: impl Into<String>, interval: Interval, layer: LayerId) -> Self {
        Self {
            id: ClipId::new(),
            asset_id: asset_id.into(),
            interval,
            layer: Some(layer),
            children: Vec::new(),
        }
    }

    /// Opaque identifier of the asset this clip plays
    pub fn asset_id(&self) -> &str {
        &self.asset_id
    }

    /// Current interval on the timeline
    pub fn interval(&self) -> Interval {
        self.interval
    }

    /// Start position
    pub fn start(&self) -> Time {
        self.interval.start
    }

    /// Duration
    pub fn duration(&self) -> Time {
        self.interval.duration
    }

    /// Source in-point
    pub fn in_point(&self) -> Time {
        self.interval.in_point
    }

    /// Exclusive end position
    pub fn end(&self) -> Time {
        self.interval.end()
    }

    /// Layer this clip is placed in, if any
    pub fn layer(&self) -> Option<LayerId> {
        self.layer
    }

    /// Child track elements, one per media kind
    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    pub(crate) fn set_interval(&mut self, interval: Interval) {
        self.interval = interval;
    }

    pub(crate) fn set_layer(&mut self, layer: Option<LayerId>) {
        self.layer = layer;
    }

    pub(crate) fn push_child(&mut self, child: ElementId) {
        self.children.push(child);
    }
}
