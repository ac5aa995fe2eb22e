// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline data model and edit engine for CineCut.
//!
//! This crate provides the editing core:
//! - Layers, tracks, clips and track elements addressed by id
//! - Half-open interval arithmetic with source in-points
//! - Transactional edits (trim, roll, slide, ripple, move) validated against
//!   a simulated overlay before committing
//! - Bounded undo/redo over committed edit records
//!
//! ## Architecture
//!
//! The [`Timeline`] owns all structure and funnels every mutation through
//! invariant validation; [`EditEngine`] implements the multi-clip edit
//! algorithms on top of it. A failed edit never mutates the timeline.

pub mod clip;
pub mod edit;
pub mod element;
pub mod error;
pub mod history;
pub mod layer;
pub mod time;
pub mod timeline;
pub mod track;

pub use clip::{Clip, ClipId};
pub use edit::{ClipChange, EditEngine, EditOutcome, SlidePolicy};
pub use element::{ElementId, TrackElement};
pub use error::EditError;
pub use history::{EditHistory, EditRecord, HistoryError};
pub use layer::{Layer, LayerId};
pub use time::{Edge, Interval, Time};
pub use timeline::Timeline;
pub use track::{Track, TrackId, TrackKind};
