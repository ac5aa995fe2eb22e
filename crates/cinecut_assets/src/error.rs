// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for asset loading and caching.

use thiserror::Error;

/// Errors from asset loading, caching and id parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    /// The loader reported a failure for this asset.
    #[error("failed to load asset: {0}")]
    LoadFailed(String),

    /// Setting the proxy would create a cycle in the proxy chain.
    #[error("proxy chain cycle through {0}")]
    ProxyCycle(String),

    /// A completion arrived for an asset that already left the loading
    /// state.
    #[error("asset {0} was already completed")]
    DuplicateCompletion(String),

    /// The operation references an asset the cache has never seen.
    #[error("unknown asset {0}")]
    UnknownAsset(String),

    /// The cache entry was invalidated while a request was waiting on it.
    #[error("load was cancelled")]
    Cancelled,

    /// An asset id failed to parse.
    #[error("malformed asset URI: {0}")]
    MalformedUri(String),
}
