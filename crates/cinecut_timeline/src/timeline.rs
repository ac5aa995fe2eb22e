// SPDX-License-Identifier: MIT OR Apache-2.0
//! The timeline: owner of layers, tracks, clips and elements, and the unit
//! of temporal consistency.
//!
//! All structural mutation funnels through validated entry points. Invariant
//! checks run against a simulated overlay of candidate intervals before any
//! real structure is touched, so a failed edit leaves the timeline exactly
//! as it was. Derived state (layer ordering, total duration) is recomputed
//! synchronously after each committed mutation.

use crate::clip::{Clip, ClipId};
use crate::edit::{ClipChange, EditOutcome};
use crate::element::{ElementId, TrackElement};
use crate::error::EditError;
use crate::layer::{Layer, LayerId};
use crate::time::{Interval, Time};
use crate::track::{Track, TrackId, TrackKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Candidate intervals for a simulated edit, keyed by clip.
///
/// Kept as a vector so validation and commit walk clips in a deterministic
/// order.
pub(crate) type Overlay = Vec<(ClipId, Interval)>;

pub(crate) fn overlay_get(overlay: &Overlay, clip: ClipId) -> Option<Interval> {
    overlay
        .iter()
        .find(|(id, _)| *id == clip)
        .map(|(_, interval)| *interval)
}

/// A multi-layer, multi-track editing timeline.
///
/// The timeline owns every layer, track, clip and track element. Clips and
/// elements are addressed by id; elements carry only an association to their
/// track, never ownership.
///
/// # Panics
///
/// Methods taking ids panic when the id does not belong to this timeline.
/// That is a programming error (contract violation), distinct from the
/// recoverable [`EditError`] results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Timeline {
    layers: IndexMap<LayerId, Layer>,
    tracks: IndexMap<TrackId, Track>,
    clips: IndexMap<ClipId, Clip>,
    elements: IndexMap<ElementId, TrackElement>,
}

impl Timeline {
    /// Create an empty timeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a layer below all existing layers and return its id
    pub fn append_layer(&mut self) -> LayerId {
        let layer = Layer::new(self.layers.len() as u32);
        let id = layer.id;
        self.layers.insert(id, layer);
        id
    }

    /// Add a track of the given media kind
    pub fn add_track(&mut self, kind: TrackKind) -> TrackId {
        let track = Track::new(kind);
        let id = track.id;
        self.tracks.insert(id, track);
        id
    }

    /// Layers ordered by priority (topmost first)
    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.values()
    }

    /// All tracks
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    /// All clips
    pub fn clips(&self) -> impl Iterator<Item = &Clip> {
        self.clips.values()
    }

    /// Get a layer
    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(&id)
    }

    /// Get a track
    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.get(&id)
    }

    /// Get a clip
    pub fn clip(&self, id: ClipId) -> Option<&Clip> {
        self.clips.get(&id)
    }

    /// Get a track element
    pub fn element(&self, id: ElementId) -> Option<&TrackElement> {
        self.elements.get(&id)
    }

    /// Get a track element mutably.
    ///
    /// Only resource-supplied attributes (`max_duration`) are publicly
    /// mutable on elements; timed state always flows from the parent clip.
    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut TrackElement> {
        self.elements.get_mut(&id)
    }

    /// First track of the given kind, if any
    pub fn track_of_kind(&self, kind: TrackKind) -> Option<TrackId> {
        self.tracks
            .values()
            .find(|t| t.kind.accepts(kind))
            .map(|t| t.id)
    }

    /// Total duration: the maximum end position over all track elements
    pub fn duration(&self) -> Time {
        self.elements.values().map(TrackElement::end).max().unwrap_or(0)
    }

    /// Create a clip in `layer` with one child element per requested kind.
    ///
    /// The clip starts detached from any track; use [`Timeline::attach_clip`]
    /// to bind its children. Fails with [`EditError::OverlapViolation`] if
    /// the interval collides with a clip in the same layer sharing one of
    /// `kinds`.
    ///
    /// # Panics
    ///
    /// Panics if `layer` is unknown or `kinds` is empty.
    pub fn add_clip(
        &mut self,
        layer: LayerId,
        asset_id: impl Into<String>,
        interval: Interval,
        kinds: &[TrackKind],
    ) -> Result<ClipId, EditError> {
        assert!(!kinds.is_empty(), "a clip needs at least one track kind");
        let priority = self.layer_ref(layer).priority();

        // reject collisions with existing clips sharing a kind
        if interval.duration > 0 {
            for other_id in self.layer_ref(layer).clips() {
                let other = self.clip_ref(*other_id);
                let shared = kinds.iter().any(|k| self.clip_has_kind(*other_id, *k));
                if shared && interval.overlaps(&other.interval()) {
                    return Err(EditError::OverlapViolation(*other_id));
                }
            }
        }

        let mut clip = Clip::new(asset_id, interval, layer);
        let clip_id = clip.id;
        let mut dedup: Vec<TrackKind> = Vec::new();
        for kind in kinds {
            if !dedup.contains(kind) {
                dedup.push(*kind);
            }
        }
        for kind in dedup {
            let element = TrackElement::new(clip_id, kind, interval, priority);
            clip.push_child(element.id);
            self.elements.insert(element.id, element);
        }
        self.clips.insert(clip_id, clip);
        self.layer_mut(layer).clips_mut().push(clip_id);
        self.sort_layer(layer);
        tracing::debug!(clip = ?clip_id, ?interval, "added clip");
        Ok(clip_id)
    }

    /// Remove a clip, detaching and destroying its child elements.
    ///
    /// # Panics
    ///
    /// Panics if `clip` is unknown.
    pub fn remove_clip(&mut self, clip: ClipId) {
        self.detach_clip(clip);
        let removed = self
            .clips
            .shift_remove(&clip)
            .unwrap_or_else(|| panic!("clip {clip:?} does not belong to this timeline"));
        for child in removed.children() {
            self.elements.shift_remove(child);
        }
        if let Some(layer) = removed.layer() {
            self.layer_mut(layer).clips_mut().retain(|c| *c != clip);
        }
        tracing::debug!(clip = ?clip, "removed clip");
    }

    /// Bind every detached child of `clip` to a compatible track.
    ///
    /// Validation runs for all children before any binding is committed, so
    /// a failure leaves the clip fully detached (or as attached as it was).
    pub fn attach_clip(&mut self, clip: ClipId) -> Result<(), EditError> {
        let children: Vec<ElementId> = self.clip_ref(clip).children().to_vec();
        let mut plan: Vec<(ElementId, TrackId)> = Vec::new();
        for child in children {
            let element = self.element_ref(child);
            if element.is_attached() {
                continue;
            }
            let kind = element.kind();
            let interval = element.interval();
            let track_id = self
                .track_of_kind(kind)
                .ok_or(EditError::NoCompatibleTrack(kind))?;
            if interval.duration > 0 {
                for other in self.track_ref(track_id).elements() {
                    let occupied = self.element_ref(other);
                    if occupied.clip() != clip && interval.overlaps(&occupied.interval()) {
                        return Err(EditError::OverlapViolation(occupied.clip()));
                    }
                }
            }
            plan.push((child, track_id));
        }
        for (child, track_id) in plan {
            self.elements
                .get_mut(&child)
                .expect("validated above")
                .set_track(Some(track_id));
            self.tracks
                .get_mut(&track_id)
                .expect("validated above")
                .insert(child);
        }
        tracing::debug!(clip = ?clip, "attached clip");
        Ok(())
    }

    /// Release every child of `clip` from its track. Always succeeds; the
    /// elements remain owned by the clip.
    pub fn detach_clip(&mut self, clip: ClipId) {
        let children: Vec<ElementId> = self.clip_ref(clip).children().to_vec();
        for child in children {
            let element = self.elements.get_mut(&child).expect("child of known clip");
            if let Some(track_id) = element.track() {
                element.set_track(None);
                self.tracks
                    .get_mut(&track_id)
                    .expect("attached to known track")
                    .remove(child);
            }
        }
        tracing::debug!(clip = ?clip, "detached clip");
    }

    /// Whether all children of `clip` are bound to tracks
    pub fn is_clip_attached(&self, clip: ClipId) -> bool {
        let c = self.clip_ref(clip);
        !c.children().is_empty()
            && c.children()
                .iter()
                .all(|e| self.element_ref(*e).is_attached())
    }

    /// Move a clip's start, re-validating all invariants
    pub fn set_clip_start(&mut self, clip: ClipId, start: Time) -> Result<(), EditError> {
        let mut interval = self.clip_ref(clip).interval();
        interval.start = start;
        self.set_clip_interval(clip, interval)
    }

    /// Change a clip's duration, re-validating all invariants
    pub fn set_clip_duration(&mut self, clip: ClipId, duration: Time) -> Result<(), EditError> {
        let mut interval = self.clip_ref(clip).interval();
        interval.duration = duration;
        self.set_clip_interval(clip, interval)
    }

    /// Change a clip's in-point, re-validating all invariants
    pub fn set_clip_in_point(&mut self, clip: ClipId, in_point: Time) -> Result<(), EditError> {
        let mut interval = self.clip_ref(clip).interval();
        interval.in_point = in_point;
        self.set_clip_interval(clip, interval)
    }

    /// Set a child's in-point offset relative to its parent clip and
    /// re-propagate, re-validating the in-point range.
    pub fn set_element_in_offset(
        &mut self,
        element: ElementId,
        offset: Time,
    ) -> Result<(), EditError> {
        let clip = self.element_ref(element).clip();
        let interval = self.clip_ref(clip).interval();
        let child_in = interval.in_point + offset;
        if let Some(max) = self.element_ref(element).max_duration() {
            if child_in + interval.duration > max {
                return Err(EditError::InvalidInterval(format!(
                    "in-point {child_in} plus duration {} exceeds available {max}",
                    interval.duration
                )));
            }
        }
        let el = self.elements.get_mut(&element).expect("checked above");
        el.set_in_offset(offset);
        el.set_interval(Interval::new(interval.start, interval.duration, child_in));
        Ok(())
    }

    fn set_clip_interval(&mut self, clip: ClipId, interval: Interval) -> Result<(), EditError> {
        let overlay: Overlay = vec![(clip, interval)];
        self.validate_edit(&[], &overlay, &[])?;
        self.commit_edit(&overlay, &[]);
        Ok(())
    }

    // ---- internal: contract-checked references -------------------------

    pub(crate) fn clip_ref(&self, id: ClipId) -> &Clip {
        self.clips
            .get(&id)
            .unwrap_or_else(|| panic!("clip {id:?} does not belong to this timeline"))
    }

    pub(crate) fn layer_ref(&self, id: LayerId) -> &Layer {
        self.layers
            .get(&id)
            .unwrap_or_else(|| panic!("layer {id:?} does not belong to this timeline"))
    }

    pub(crate) fn element_ref(&self, id: ElementId) -> &TrackElement {
        self.elements
            .get(&id)
            .unwrap_or_else(|| panic!("element {id:?} does not belong to this timeline"))
    }

    fn track_ref(&self, id: TrackId) -> &Track {
        self.tracks
            .get(&id)
            .unwrap_or_else(|| panic!("track {id:?} does not belong to this timeline"))
    }

    fn clip_mut(&mut self, id: ClipId) -> &mut Clip {
        self.clips
            .get_mut(&id)
            .unwrap_or_else(|| panic!("clip {id:?} does not belong to this timeline"))
    }

    fn layer_mut(&mut self, id: LayerId) -> &mut Layer {
        self.layers
            .get_mut(&id)
            .unwrap_or_else(|| panic!("layer {id:?} does not belong to this timeline"))
    }

    pub(crate) fn clip_has_kind(&self, clip: ClipId, kind: TrackKind) -> bool {
        self.clip_ref(clip)
            .children()
            .iter()
            .any(|e| self.element_ref(*e).kind() == kind)
    }

    // ---- internal: simulated validation and commit ---------------------

    /// Validate a simulated edit without mutating anything.
    ///
    /// Checks, in order: in-point bounds for every overlaid clip, the
    /// per-layer no-overlap invariant over the post-move memberships of
    /// `affected` plus every overlaid clip's own layer, and the cross-layer
    /// no-overlap invariant on every track.
    pub(crate) fn validate_edit(
        &self,
        affected: &[LayerId],
        overlay: &Overlay,
        moves: &[(ClipId, LayerId)],
    ) -> Result<(), EditError> {
        for (clip_id, interval) in overlay {
            let clip = self.clip_ref(*clip_id);
            for child in clip.children() {
                let element = self.element_ref(*child);
                let child_in = interval.in_point + element.in_offset();
                if let Some(max) = element.max_duration() {
                    if child_in + interval.duration > max {
                        return Err(EditError::InvalidInterval(format!(
                            "in-point {child_in} plus duration {} exceeds available {max}",
                            interval.duration
                        )));
                    }
                }
            }
        }

        let mut layer_set: Vec<LayerId> = affected.to_vec();
        for (clip_id, _) in overlay {
            if let Some(layer) = self.clip_ref(*clip_id).layer() {
                layer_set.push(layer);
            }
        }
        for (_, target) in moves {
            layer_set.push(*target);
        }
        let mut seen: Vec<LayerId> = Vec::new();
        for layer in layer_set {
            if seen.contains(&layer) {
                continue;
            }
            seen.push(layer);
            self.check_layer(layer, overlay, moves)?;
        }

        for track in self.tracks.values() {
            let spans: Vec<(ClipId, Interval)> = track
                .elements()
                .map(|eid| {
                    let clip = self.element_ref(eid).clip();
                    let interval =
                        overlay_get(overlay, clip).unwrap_or_else(|| self.clip_ref(clip).interval());
                    (clip, interval)
                })
                .collect();
            check_spans(spans)?;
        }
        Ok(())
    }

    fn check_layer(
        &self,
        layer: LayerId,
        overlay: &Overlay,
        moves: &[(ClipId, LayerId)],
    ) -> Result<(), EditError> {
        let mut members: Vec<ClipId> = self.layer_ref(layer).clips().to_vec();
        for (clip_id, target) in moves {
            members.retain(|c| c != clip_id);
            if *target == layer {
                members.push(*clip_id);
            }
        }
        for kind in TrackKind::ALL {
            let spans: Vec<(ClipId, Interval)> = members
                .iter()
                .filter(|c| self.clip_has_kind(**c, kind))
                .map(|c| {
                    let interval =
                        overlay_get(overlay, *c).unwrap_or_else(|| self.clip_ref(*c).interval());
                    (*c, interval)
                })
                .collect();
            check_spans(spans)?;
        }
        Ok(())
    }

    /// Apply a validated edit, propagating intervals to children, moving
    /// clips across layers, and re-sorting every touched layer.
    ///
    /// Callers must have run [`Timeline::validate_edit`] (or be restoring a
    /// previously committed state, as the edit history does).
    pub(crate) fn commit_edit(&mut self, overlay: &Overlay, moves: &[(ClipId, LayerId)]) -> EditOutcome {
        let mut changes: Vec<ClipChange> = Vec::new();
        for (clip_id, interval) in overlay {
            let clip = self.clip_ref(*clip_id);
            let layer_before = clip.layer();
            let layer_after = moves
                .iter()
                .find(|(c, _)| c == clip_id)
                .map(|(_, l)| Some(*l))
                .unwrap_or(layer_before);
            if clip.interval() == *interval && layer_before == layer_after {
                continue;
            }
            changes.push(ClipChange {
                clip: *clip_id,
                before: clip.interval(),
                after: *interval,
                layer_before,
                layer_after,
            });
        }

        let mut touched_layers: Vec<LayerId> = Vec::new();
        for change in &changes {
            self.apply_interval(change.clip, change.after);
            if change.layer_after != change.layer_before {
                self.move_between_layers(change.clip, change.layer_before, change.layer_after);
            }
            for layer in [change.layer_before, change.layer_after].into_iter().flatten() {
                if !touched_layers.contains(&layer) {
                    touched_layers.push(layer);
                }
            }
        }
        for layer in touched_layers {
            self.sort_layer(layer);
        }
        if !changes.is_empty() {
            tracing::debug!(mutated = changes.len(), "committed edit");
        }
        EditOutcome { changes }
    }

    fn apply_interval(&mut self, clip: ClipId, interval: Interval) {
        let children: Vec<ElementId> = self.clip_ref(clip).children().to_vec();
        self.clip_mut(clip).set_interval(interval);
        for child in children {
            let element = self.elements.get_mut(&child).expect("child of known clip");
            let child_in = interval.in_point + element.in_offset();
            element.set_interval(Interval::new(interval.start, interval.duration, child_in));
        }
    }

    fn move_between_layers(&mut self, clip: ClipId, from: Option<LayerId>, to: Option<LayerId>) {
        if let Some(from) = from {
            self.layer_mut(from).clips_mut().retain(|c| *c != clip);
        }
        if let Some(to) = to {
            self.layer_mut(to).clips_mut().push(clip);
            let priority = self.layer_ref(to).priority();
            let children: Vec<ElementId> = self.clip_ref(clip).children().to_vec();
            for child in children {
                self.elements
                    .get_mut(&child)
                    .expect("child of known clip")
                    .set_priority(priority);
            }
        }
        self.clip_mut(clip).set_layer(to);
    }

    fn sort_layer(&mut self, layer: LayerId) {
        let mut clips = self.layer_ref(layer).clips().to_vec();
        clips.sort_by_key(|c| self.clip_ref(*c).start());
        *self.layer_mut(layer).clips_mut() = clips;
    }
}

/// Running-max sweep over start-sorted spans; zero-duration spans never
/// conflict.
fn check_spans(mut spans: Vec<(ClipId, Interval)>) -> Result<(), EditError> {
    spans.retain(|(_, interval)| interval.duration > 0);
    spans.sort_by_key(|(_, interval)| interval.start);
    let mut max_end: Time = 0;
    for (clip, interval) in spans {
        if interval.start < max_end {
            return Err(EditError::OverlapViolation(clip));
        }
        max_end = max_end.max(interval.end());
    }
    Ok(())
}
