// SPDX-License-Identifier: MIT OR Apache-2.0
//! The edit engine: trim, roll, slide, ripple and move.
//!
//! Every operation is transactional. Candidate intervals are computed into a
//! simulated overlay first; the overlay is validated against the layer and
//! track invariants, and only then committed. A failure of any kind leaves
//! the timeline untouched.
//!
//! Operations take an explicit list of affected layers. The engine never
//! infers which layers are "current", but the target clip's own layer is
//! always part of the validation and neighbor search.

use crate::clip::ClipId;
use crate::error::EditError;
use crate::layer::LayerId;
use crate::time::{Edge, Interval, Time};
use crate::timeline::{Overlay, Timeline};
use serde::{Deserialize, Serialize};

/// What to do when a slide would cross a neighbor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlidePolicy {
    /// Clamp to the tightest feasible position
    Clamp,
    /// Fail without mutating
    Reject,
}

/// One clip's before/after state from a committed edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipChange {
    /// The mutated clip
    pub clip: ClipId,
    /// Interval before the edit
    pub before: Interval,
    /// Interval after the edit
    pub after: Interval,
    /// Layer before the edit
    pub layer_before: Option<LayerId>,
    /// Layer after the edit
    pub layer_after: Option<LayerId>,
}

/// Result of a successful edit: the clips actually mutated, with their
/// before/after state for observers and the undo history.
///
/// A no-op edit (for example moving a clip to its current position) succeeds
/// with an empty change set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditOutcome {
    /// Per-clip changes, target first
    pub changes: Vec<ClipChange>,
}

impl EditOutcome {
    /// Whether the edit mutated anything
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Ids of the mutated clips
    pub fn mutated(&self) -> impl Iterator<Item = ClipId> + '_ {
        self.changes.iter().map(|c| c.clip)
    }
}

/// Stateless edit algorithms over a [`Timeline`].
///
/// # Panics
///
/// All operations panic when given a clip or layer id that does not belong
/// to the timeline (contract violation, see [`Timeline`]).
pub struct EditEngine;

impl EditEngine {
    /// Move one edge of `clip` while holding the other fixed.
    ///
    /// A start-edge trim co-adjusts the in-point by the same delta: trimming
    /// forward increases it, trimming backward decreases it. Fails without
    /// mutation if the edge would cross the opposite edge or the in-point
    /// would leave `[0, max]`.
    pub fn trim(
        timeline: &mut Timeline,
        clip: ClipId,
        layers: &[LayerId],
        edge: Edge,
        position: Time,
    ) -> Result<EditOutcome, EditError> {
        check_layers(timeline, layers);
        let cur = placed_interval(timeline, clip)?;
        let new = match edge {
            Edge::Start => {
                if position > cur.end() {
                    return Err(EditError::InvalidInterval(format!(
                        "start edge {position} would cross end {}",
                        cur.end()
                    )));
                }
                let in_point = shift_in_point(cur.in_point, cur.start, position)?;
                Interval::new(position, cur.end() - position, in_point)
            }
            Edge::End => {
                if position < cur.start {
                    return Err(EditError::InvalidInterval(format!(
                        "end edge {position} would cross start {}",
                        cur.start
                    )));
                }
                Interval::new(cur.start, position - cur.start, cur.in_point)
            }
        };
        let overlay: Overlay = vec![(clip, new)];
        timeline.validate_edit(layers, &overlay, &[])?;
        Ok(timeline.commit_edit(&overlay, &[]))
    }

    /// Move the shared edge between `clip` and its abutting neighbor(s),
    /// trading duration across the edge. The outer edges stay fixed, so the
    /// duration sum across the edge is preserved.
    pub fn roll(
        timeline: &mut Timeline,
        clip: ClipId,
        layers: &[LayerId],
        edge: Edge,
        position: Time,
    ) -> Result<EditOutcome, EditError> {
        check_layers(timeline, layers);
        let cur = placed_interval(timeline, clip)?;
        let mut overlay: Overlay = Vec::new();
        match edge {
            Edge::End => {
                if position < cur.start {
                    return Err(EditError::InvalidInterval(format!(
                        "rolled edge {position} would cross start {}",
                        cur.start
                    )));
                }
                let neighbors = abutting_clips(timeline, clip, layers, cur.end(), Edge::Start);
                if neighbors.is_empty() {
                    return Err(EditError::NoAdjacentNeighbor(edge));
                }
                overlay.push((
                    clip,
                    Interval::new(cur.start, position - cur.start, cur.in_point),
                ));
                for neighbor in neighbors {
                    let n = timeline.clip_ref(neighbor).interval();
                    if position > n.end() {
                        return Err(EditError::InvalidInterval(format!(
                            "rolled edge {position} would cross neighbor end {}",
                            n.end()
                        )));
                    }
                    let in_point = shift_in_point(n.in_point, n.start, position)?;
                    overlay.push((neighbor, Interval::new(position, n.end() - position, in_point)));
                }
            }
            Edge::Start => {
                if position > cur.end() {
                    return Err(EditError::InvalidInterval(format!(
                        "rolled edge {position} would cross end {}",
                        cur.end()
                    )));
                }
                let neighbors = abutting_clips(timeline, clip, layers, cur.start, Edge::End);
                if neighbors.is_empty() {
                    return Err(EditError::NoAdjacentNeighbor(edge));
                }
                let in_point = shift_in_point(cur.in_point, cur.start, position)?;
                overlay.push((clip, Interval::new(position, cur.end() - position, in_point)));
                for neighbor in neighbors {
                    let n = timeline.clip_ref(neighbor).interval();
                    if position < n.start {
                        return Err(EditError::InvalidInterval(format!(
                            "rolled edge {position} would cross neighbor start {}",
                            n.start
                        )));
                    }
                    overlay.push((neighbor, Interval::new(n.start, position - n.start, n.in_point)));
                }
            }
        }
        timeline.validate_edit(layers, &overlay, &[])?;
        Ok(timeline.commit_edit(&overlay, &[]))
    }

    /// Reposition `clip` without changing its duration or in-point, between
    /// its left and right neighbors. `policy` selects what happens when the
    /// requested position would cross a neighbor.
    pub fn slide(
        timeline: &mut Timeline,
        clip: ClipId,
        layers: &[LayerId],
        position: Time,
        policy: SlidePolicy,
    ) -> Result<EditOutcome, EditError> {
        check_layers(timeline, layers);
        let cur = placed_interval(timeline, clip)?;

        let mut left: Option<(ClipId, Time)> = None;
        let mut right: Option<(ClipId, Time)> = None;
        for other in sharing_clips(timeline, clip, layers) {
            let interval = timeline.clip_ref(other).interval();
            if interval.end() <= cur.start && left.map_or(true, |(_, e)| interval.end() >= e) {
                left = Some((other, interval.end()));
            }
            if interval.start >= cur.end() && right.map_or(true, |(_, s)| interval.start < s) {
                right = Some((other, interval.start));
            }
        }
        let lo = left.map_or(0, |(_, e)| e);
        let hi = match right {
            // window upper bound leaves room for the clip's own duration
            Some((id, start)) => match start.checked_sub(cur.duration) {
                Some(h) if h >= lo => Some((id, h)),
                _ => return Err(EditError::OverlapViolation(id)),
            },
            None => None,
        };

        let target = if position < lo {
            match policy {
                SlidePolicy::Clamp => lo,
                SlidePolicy::Reject => {
                    let (id, _) = left.ok_or_else(|| {
                        EditError::InvalidInterval(format!("position {position} below zero bound"))
                    })?;
                    return Err(EditError::OverlapViolation(id));
                }
            }
        } else if let Some((id, h)) = hi.filter(|(_, h)| position > *h) {
            match policy {
                SlidePolicy::Clamp => h,
                SlidePolicy::Reject => return Err(EditError::OverlapViolation(id)),
            }
        } else {
            position
        };

        let overlay: Overlay = vec![(clip, Interval::new(target, cur.duration, cur.in_point))];
        timeline.validate_edit(layers, &overlay, &[])?;
        Ok(timeline.commit_edit(&overlay, &[]))
    }

    /// Move the given edge of `clip` and push every clip after it in the
    /// affected layers by the same delta, preserving their durations.
    pub fn ripple(
        timeline: &mut Timeline,
        clip: ClipId,
        layers: &[LayerId],
        edge: Edge,
        position: Time,
    ) -> Result<EditOutcome, EditError> {
        check_layers(timeline, layers);
        let cur = placed_interval(timeline, clip)?;
        let (target_new, threshold, delta) = match edge {
            Edge::End => {
                if position < cur.start {
                    return Err(EditError::InvalidInterval(format!(
                        "end edge {position} would cross start {}",
                        cur.start
                    )));
                }
                let new = Interval::new(cur.start, position - cur.start, cur.in_point);
                (new, cur.end(), position as i128 - cur.end() as i128)
            }
            Edge::Start => {
                let new = Interval::new(position, cur.duration, cur.in_point);
                (new, cur.start, position as i128 - cur.start as i128)
            }
        };

        let mut overlay: Overlay = vec![(clip, target_new)];
        for other in layer_clips(timeline, clip, layers) {
            let interval = timeline.clip_ref(other).interval();
            if interval.start < threshold {
                continue;
            }
            let shifted = interval.start as i128 + delta;
            if shifted < 0 {
                return Err(EditError::InvalidInterval(format!(
                    "ripple would push clip start {} below zero",
                    interval.start
                )));
            }
            overlay.push((
                other,
                Interval::new(shifted as Time, interval.duration, interval.in_point),
            ));
        }
        timeline.validate_edit(layers, &overlay, &[])?;
        Ok(timeline.commit_edit(&overlay, &[]))
    }

    /// Relocate `clip` (with all its child elements) to a new start and,
    /// optionally, a new layer.
    ///
    /// Moving a clip to its current position and layer is a no-op that
    /// succeeds with an empty change set.
    pub fn move_clip(
        timeline: &mut Timeline,
        clip: ClipId,
        layers: &[LayerId],
        new_start: Time,
        new_layer: Option<LayerId>,
    ) -> Result<EditOutcome, EditError> {
        check_layers(timeline, layers);
        let cur = timeline.clip_ref(clip).interval();
        let cur_layer = timeline
            .clip_ref(clip)
            .layer()
            .ok_or(EditError::DetachedElement)?;
        let target_layer = new_layer.unwrap_or(cur_layer);
        let _ = timeline.layer_ref(target_layer);

        if new_start == cur.start && target_layer == cur_layer {
            return Ok(EditOutcome::default());
        }

        let overlay: Overlay = vec![(clip, Interval::new(new_start, cur.duration, cur.in_point))];
        let moves: Vec<(ClipId, LayerId)> = if target_layer != cur_layer {
            vec![(clip, target_layer)]
        } else {
            Vec::new()
        };
        timeline.validate_edit(layers, &overlay, &moves)?;
        Ok(timeline.commit_edit(&overlay, &moves))
    }
}

/// The target's interval; fails if the clip is not placed in a layer.
fn placed_interval(timeline: &Timeline, clip: ClipId) -> Result<Interval, EditError> {
    let c = timeline.clip_ref(clip);
    if c.layer().is_none() {
        return Err(EditError::DetachedElement);
    }
    Ok(c.interval())
}

/// Contract check: every caller-supplied layer must belong to the timeline.
fn check_layers(timeline: &Timeline, layers: &[LayerId]) {
    for layer in layers {
        let _ = timeline.layer_ref(*layer);
    }
}

/// Affected layers plus the target's own layer, deduplicated.
fn search_layers(timeline: &Timeline, clip: ClipId, layers: &[LayerId]) -> Vec<LayerId> {
    let mut out: Vec<LayerId> = Vec::new();
    for layer in layers.iter().copied().chain(timeline.clip_ref(clip).layer()) {
        if !out.contains(&layer) {
            out.push(layer);
        }
    }
    out
}

/// Clips in the search layers other than the target, in layer order.
fn layer_clips(timeline: &Timeline, clip: ClipId, layers: &[LayerId]) -> Vec<ClipId> {
    let mut out: Vec<ClipId> = Vec::new();
    for layer in search_layers(timeline, clip, layers) {
        for other in timeline.layer_ref(layer).clips() {
            if *other != clip && !out.contains(other) {
                out.push(*other);
            }
        }
    }
    out
}

/// Like [`layer_clips`], restricted to clips sharing a track kind with the
/// target.
fn sharing_clips(timeline: &Timeline, clip: ClipId, layers: &[LayerId]) -> Vec<ClipId> {
    use crate::track::TrackKind;
    layer_clips(timeline, clip, layers)
        .into_iter()
        .filter(|other| {
            TrackKind::ALL
                .iter()
                .any(|k| timeline.clip_has_kind(clip, *k) && timeline.clip_has_kind(*other, *k))
        })
        .collect()
}

/// Clips sharing a kind whose given edge sits exactly at `position`.
fn abutting_clips(
    timeline: &Timeline,
    clip: ClipId,
    layers: &[LayerId],
    position: Time,
    edge: Edge,
) -> Vec<ClipId> {
    sharing_clips(timeline, clip, layers)
        .into_iter()
        .filter(|other| {
            let interval = timeline.clip_ref(*other).interval();
            match edge {
                Edge::Start => interval.start == position,
                Edge::End => interval.end() == position,
            }
        })
        .collect()
}

/// Shift an in-point by the delta between two edge positions, failing if it
/// would fall below zero.
fn shift_in_point(in_point: Time, from: Time, to: Time) -> Result<Time, EditError> {
    if to >= from {
        Ok(in_point + (to - from))
    } else {
        in_point
            .checked_sub(from - to)
            .ok_or_else(|| EditError::InvalidInterval("in-point would fall below zero".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::TrackKind;

    /// Layer with clip A `[0, 50)` and clip B `[50, 100)` on one video track.
    fn two_abutting_clips() -> (Timeline, LayerId, ClipId, ClipId) {
        let mut tl = Timeline::new();
        let layer = tl.append_layer();
        tl.add_track(TrackKind::Video);
        let a = tl
            .add_clip(layer, "a", Interval::new(0, 50, 0), &[TrackKind::Video])
            .expect("clip a");
        let b = tl
            .add_clip(layer, "b", Interval::new(50, 50, 0), &[TrackKind::Video])
            .expect("clip b");
        (tl, layer, a, b)
    }

    fn interval(tl: &Timeline, clip: ClipId) -> Interval {
        tl.clip(clip).expect("clip").interval()
    }

    #[test]
    fn roll_moves_shared_edge() {
        let (mut tl, layer, a, b) = two_abutting_clips();
        let outcome = EditEngine::roll(&mut tl, a, &[layer], Edge::End, 70).expect("roll");
        assert_eq!(interval(&tl, a), Interval::new(0, 70, 0));
        assert_eq!(interval(&tl, b), Interval::new(70, 30, 20));
        let mutated: Vec<ClipId> = outcome.mutated().collect();
        assert_eq!(mutated, vec![a, b]);
        // duration sum across the shared edge is preserved
        assert_eq!(interval(&tl, a).duration + interval(&tl, b).duration, 100);
    }

    #[test]
    fn roll_past_neighbor_end_fails_without_mutation() {
        let (mut tl, layer, a, b) = two_abutting_clips();
        let err = EditEngine::roll(&mut tl, a, &[layer], Edge::End, 120).unwrap_err();
        assert!(matches!(err, EditError::InvalidInterval(_)));
        assert_eq!(interval(&tl, a), Interval::new(0, 50, 0));
        assert_eq!(interval(&tl, b), Interval::new(50, 50, 0));
    }

    #[test]
    fn roll_start_edge_fails_when_in_point_would_underflow() {
        let mut tl = Timeline::new();
        let layer = tl.append_layer();
        tl.add_track(TrackKind::Video);
        let a = tl
            .add_clip(layer, "a", Interval::new(0, 50, 0), &[TrackKind::Video])
            .expect("clip a");
        let b = tl
            .add_clip(layer, "b", Interval::new(50, 50, 10), &[TrackKind::Video])
            .expect("clip b");
        // rolling back by 10 is fine (in-point 10 -> 0), 20 underflows
        EditEngine::roll(&mut tl, b, &[layer], Edge::Start, 40).expect("roll within range");
        assert_eq!(interval(&tl, b), Interval::new(40, 60, 0));
        let err = EditEngine::roll(&mut tl, b, &[layer], Edge::Start, 20).unwrap_err();
        assert!(matches!(err, EditError::InvalidInterval(_)));
        assert_eq!(interval(&tl, a), Interval::new(0, 40, 0));
    }

    #[test]
    fn roll_without_neighbor_fails() {
        let mut tl = Timeline::new();
        let layer = tl.append_layer();
        tl.add_track(TrackKind::Video);
        let a = tl
            .add_clip(layer, "a", Interval::new(0, 50, 0), &[TrackKind::Video])
            .expect("clip a");
        tl.add_clip(layer, "b", Interval::new(60, 40, 0), &[TrackKind::Video])
            .expect("gapped clip b");
        assert_eq!(
            EditEngine::roll(&mut tl, a, &[layer], Edge::End, 55),
            Err(EditError::NoAdjacentNeighbor(Edge::End))
        );
    }

    #[test]
    fn trim_start_forward_increases_in_point() {
        let (mut tl, layer, a, _) = two_abutting_clips();
        let outcome = EditEngine::trim(&mut tl, a, &[layer], Edge::Start, 10).expect("trim");
        assert_eq!(interval(&tl, a), Interval::new(10, 40, 10));
        assert_eq!(outcome.mutated().collect::<Vec<_>>(), vec![a]);

        // and backward decreases it again
        EditEngine::trim(&mut tl, a, &[layer], Edge::Start, 0).expect("trim back");
        assert_eq!(interval(&tl, a), Interval::new(0, 50, 0));
    }

    #[test]
    fn trim_start_crossing_end_fails() {
        let (mut tl, layer, a, _) = two_abutting_clips();
        let err = EditEngine::trim(&mut tl, a, &[layer], Edge::Start, 60).unwrap_err();
        assert!(matches!(err, EditError::InvalidInterval(_)));
        assert_eq!(interval(&tl, a), Interval::new(0, 50, 0));
    }

    #[test]
    fn trim_end_into_neighbor_fails() {
        let (mut tl, layer, a, b) = two_abutting_clips();
        let err = EditEngine::trim(&mut tl, a, &[layer], Edge::End, 60).unwrap_err();
        assert_eq!(err, EditError::OverlapViolation(b));
        assert_eq!(interval(&tl, a), Interval::new(0, 50, 0));
    }

    #[test]
    fn trim_end_respects_max_duration() {
        let mut tl = Timeline::new();
        let layer = tl.append_layer();
        tl.add_track(TrackKind::Video);
        let a = tl
            .add_clip(layer, "a", Interval::new(0, 50, 0), &[TrackKind::Video])
            .expect("clip a");
        let child = tl.clip(a).expect("clip").children()[0];
        tl.element_mut(child)
            .expect("child")
            .set_max_duration(Some(55));
        assert!(matches!(
            EditEngine::trim(&mut tl, a, &[layer], Edge::End, 60),
            Err(EditError::InvalidInterval(_))
        ));
        EditEngine::trim(&mut tl, a, &[layer], Edge::End, 55).expect("within bounds");
    }

    #[test]
    fn trim_to_zero_duration_is_allowed() {
        let (mut tl, layer, a, _) = two_abutting_clips();
        EditEngine::trim(&mut tl, a, &[layer], Edge::End, 0).expect("empty clip");
        assert_eq!(interval(&tl, a).duration, 0);
    }

    #[test]
    fn ripple_end_shifts_later_clips_preserving_durations() {
        let (mut tl, layer, a, b) = two_abutting_clips();
        let c = tl
            .add_clip(layer, "c", Interval::new(110, 30, 5), &[TrackKind::Video])
            .expect("clip c");
        EditEngine::ripple(&mut tl, a, &[layer], Edge::End, 70).expect("ripple");
        assert_eq!(interval(&tl, a), Interval::new(0, 70, 0));
        assert_eq!(interval(&tl, b), Interval::new(70, 50, 0));
        assert_eq!(interval(&tl, c), Interval::new(130, 30, 5));
    }

    #[test]
    fn ripple_end_contracts_time() {
        let (mut tl, layer, a, b) = two_abutting_clips();
        EditEngine::ripple(&mut tl, a, &[layer], Edge::End, 30).expect("ripple");
        assert_eq!(interval(&tl, a), Interval::new(0, 30, 0));
        assert_eq!(interval(&tl, b), Interval::new(30, 50, 0));
    }

    #[test]
    fn ripple_start_moves_target_and_later_clips_together() {
        let (mut tl, layer, a, b) = two_abutting_clips();
        EditEngine::ripple(&mut tl, a, &[layer], Edge::Start, 20).expect("ripple");
        assert_eq!(interval(&tl, a), Interval::new(20, 50, 0));
        assert_eq!(interval(&tl, b), Interval::new(70, 50, 0));
    }

    #[test]
    fn ripple_only_touches_affected_layers() {
        let (mut tl, layer, a, _) = two_abutting_clips();
        let other_layer = tl.append_layer();
        let c = tl
            .add_clip(other_layer, "c", Interval::new(60, 20, 0), &[TrackKind::Video])
            .expect("clip c");
        EditEngine::ripple(&mut tl, a, &[layer], Edge::End, 70).expect("ripple");
        assert_eq!(interval(&tl, c), Interval::new(60, 20, 0));
    }

    #[test]
    fn ripple_start_backward_into_earlier_clip_fails() {
        let (mut tl, layer, a, b) = two_abutting_clips();
        // A starts before B's old start, so it does not ripple along
        let err = EditEngine::ripple(&mut tl, b, &[layer], Edge::Start, 0).unwrap_err();
        assert!(matches!(err, EditError::OverlapViolation(_)));
        assert_eq!(interval(&tl, a), Interval::new(0, 50, 0));
        assert_eq!(interval(&tl, b), Interval::new(50, 50, 0));
    }

    #[test]
    fn slide_within_gap_moves_without_duration_change() {
        let mut tl = Timeline::new();
        let layer = tl.append_layer();
        tl.add_track(TrackKind::Video);
        let a = tl
            .add_clip(layer, "a", Interval::new(0, 20, 0), &[TrackKind::Video])
            .expect("clip a");
        let b = tl
            .add_clip(layer, "b", Interval::new(30, 10, 7), &[TrackKind::Video])
            .expect("clip b");
        let c = tl
            .add_clip(layer, "c", Interval::new(80, 20, 0), &[TrackKind::Video])
            .expect("clip c");

        EditEngine::slide(&mut tl, b, &[layer], 50, SlidePolicy::Reject).expect("slide");
        assert_eq!(interval(&tl, b), Interval::new(50, 10, 7));
        assert_eq!(interval(&tl, a), Interval::new(0, 20, 0));
        assert_eq!(interval(&tl, c), Interval::new(80, 20, 0));
    }

    #[test]
    fn slide_clamps_or_rejects_per_policy() {
        let mut tl = Timeline::new();
        let layer = tl.append_layer();
        tl.add_track(TrackKind::Video);
        let a = tl
            .add_clip(layer, "a", Interval::new(0, 20, 0), &[TrackKind::Video])
            .expect("clip a");
        let b = tl
            .add_clip(layer, "b", Interval::new(30, 10, 0), &[TrackKind::Video])
            .expect("clip b");
        let c = tl
            .add_clip(layer, "c", Interval::new(80, 20, 0), &[TrackKind::Video])
            .expect("clip c");

        assert_eq!(
            EditEngine::slide(&mut tl, b, &[layer], 5, SlidePolicy::Reject),
            Err(EditError::OverlapViolation(a))
        );
        assert_eq!(interval(&tl, b).start, 30);

        EditEngine::slide(&mut tl, b, &[layer], 5, SlidePolicy::Clamp).expect("clamped left");
        assert_eq!(interval(&tl, b), Interval::new(20, 10, 0));

        EditEngine::slide(&mut tl, b, &[layer], 95, SlidePolicy::Clamp).expect("clamped right");
        assert_eq!(interval(&tl, b), Interval::new(70, 10, 0));

        assert_eq!(
            EditEngine::slide(&mut tl, b, &[layer], 95, SlidePolicy::Reject),
            Err(EditError::OverlapViolation(c))
        );
    }

    #[test]
    fn move_to_own_position_is_a_successful_noop() {
        let (mut tl, layer, a, _) = two_abutting_clips();
        let outcome =
            EditEngine::move_clip(&mut tl, a, &[layer], 0, Some(layer)).expect("no-op move");
        assert!(outcome.is_empty());
    }

    #[test]
    fn move_rejects_overlap_and_leaves_timeline_unchanged() {
        let (mut tl, layer, a, b) = two_abutting_clips();
        let err = EditEngine::move_clip(&mut tl, a, &[layer], 40, None).unwrap_err();
        assert_eq!(err, EditError::OverlapViolation(b));
        assert_eq!(interval(&tl, a), Interval::new(0, 50, 0));
        assert_eq!(interval(&tl, b), Interval::new(50, 50, 0));
    }

    #[test]
    fn move_across_layers_reslots_and_reprioritizes() {
        let (mut tl, layer, a, b) = two_abutting_clips();
        let layer2 = tl.append_layer();
        let outcome =
            EditEngine::move_clip(&mut tl, a, &[layer, layer2], 20, Some(layer2)).expect("move");
        assert_eq!(outcome.mutated().collect::<Vec<_>>(), vec![a]);
        assert_eq!(tl.clip(a).expect("clip").layer(), Some(layer2));
        assert_eq!(tl.layer(layer).expect("layer").clips(), &[b]);
        assert_eq!(tl.layer(layer2).expect("layer").clips(), &[a]);
        let priority = tl.layer(layer2).expect("layer").priority();
        for child in tl.clip(a).expect("clip").children() {
            assert_eq!(tl.element(*child).expect("child").priority(), priority);
        }
    }

    #[test]
    fn move_into_occupied_layer_slot_fails() {
        let (mut tl, layer, a, _) = two_abutting_clips();
        let layer2 = tl.append_layer();
        let c = tl
            .add_clip(layer2, "c", Interval::new(10, 30, 0), &[TrackKind::Video])
            .expect("clip c");
        let err =
            EditEngine::move_clip(&mut tl, a, &[layer, layer2], 0, Some(layer2)).unwrap_err();
        assert!(matches!(err, EditError::OverlapViolation(_)));
        assert_eq!(tl.clip(a).expect("clip").layer(), Some(layer));
        assert_eq!(interval(&tl, c), Interval::new(10, 30, 0));
    }
}
