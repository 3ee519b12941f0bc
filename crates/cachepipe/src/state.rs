// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// Per-key progress through one pipeline execution.
///
/// Variants are ordered; a key only ever moves to a later state.
///
/// ```text
/// Idle -> CacheReadIssued -> CacheHit ----------------------------------------> Resolved
///                         \-> CacheMiss -> FillRequested -> FillSucceeded -> [CachePopulated] -> Resolved
///                                                       \-> FillFailed -------------------------> Resolved
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub(crate) enum FetchState {
    #[default]
    Idle,
    CacheReadIssued,
    CacheHit,
    CacheMiss,
    FillRequested,
    FillSucceeded,
    FillFailed,
    CachePopulated,
    Resolved,
}

impl FetchState {
    pub(crate) fn advance(&mut self, next: Self) {
        debug_assert!(next > *self, "fetch state cannot move from {self:?} to {next:?}");
        *self = next;
    }
}
