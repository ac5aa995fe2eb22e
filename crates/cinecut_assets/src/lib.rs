// SPDX-License-Identifier: MIT OR Apache-2.0
//! Asset loading and caching for CineCut.
//!
//! This crate provides the media-side services the timeline depends on:
//! - A single-flight [`AssetCache`] deduplicating concurrent loads
//! - An exactly-once completion protocol via [`CompletionTicket`]
//! - Proxy rewriting so a failed or heavyweight id can be served by another
//! - `imagesequence://` URI parsing for still-image sequences
//!
//! The cache is loader-agnostic: anything implementing [`AssetLoader`] can
//! back it, and tests drive it with a hand-resolved loader.

pub mod cache;
pub mod error;
pub mod loader;
pub mod uri;

pub use cache::{Asset, AssetCache, AssetDescriptor, AssetKind, AssetState, LoadResult};
pub use error::AssetError;
pub use loader::{AssetLoader, CompletionTicket, IdRewriter, LoadHandle};
pub use uri::{ImageSequenceUri, IMAGE_SEQUENCE_SCHEME};
