// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types shared by every cachepipe crate.

use std::{borrow::Cow, fmt, sync::Arc};

type Cause = Arc<dyn std::error::Error + Send + Sync>;

/// The category of an [`Error`].
///
/// Kinds are scoped to the keys they affect: a failure in one key's fill never
/// changes the outcome of a sibling key in the same batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The backing store does not hold a value for the key.
    NotFound,
    /// The backing store failed to serve the key set the key belonged to.
    BackingStore,
    /// The distributed cache could not be reached.
    CacheUnavailable,
    /// A cached payload could not be decoded.
    Decode,
    /// A value could not be encoded for storage.
    Codec,
    /// The session was cancelled or its deadline elapsed before the key resolved.
    Cancelled,
    /// The key was requested after its session finished.
    SessionFinished,
    /// Any other failure.
    Other,
}

impl ErrorKind {
    /// Returns a short, stable name for this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not found",
            Self::BackingStore => "backing store failure",
            Self::CacheUnavailable => "cache unavailable",
            Self::Decode => "decode failure",
            Self::Codec => "encode failure",
            Self::Cancelled => "cancelled",
            Self::SessionFinished => "session finished",
            Self::Other => "error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error from a cache, loader or pipeline operation.
///
/// The type is cheap to clone so that one outcome can be handed to every caller
/// waiting on the same key. Use [`Error::kind`] to branch on the failure category
/// and [`std::error::Error::source()`] to reach the underlying cause.
///
/// # Example
///
/// ```
/// use cachepipe_tier::{Error, ErrorKind};
///
/// let error = Error::backing_store("connection reset");
/// assert_eq!(error.kind(), ErrorKind::BackingStore);
/// assert!(error.to_string().contains("connection reset"));
/// ```
#[derive(Clone, thiserror::Error)]
#[error("{kind}{}{}", fmt_context(.context.as_deref()), fmt_cause(.source.as_deref()))]
pub struct Error {
    kind: ErrorKind,
    context: Option<Cow<'static, str>>,
    #[source]
    source: Option<Cause>,
}

fn fmt_context(context: Option<&str>) -> String {
    context.map(|c| format!(" ({c})")).unwrap_or_default()
}

fn fmt_cause(cause: Option<&(dyn std::error::Error + Send + Sync)>) -> String {
    cause.map(|c| format!(": {c}")).unwrap_or_default()
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("context", &self.context)
            .field("source", &self.source.as_ref().map(ToString::to_string))
            .finish()
    }
}

impl Error {
    /// Creates an error of the given kind without a cause.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
            source: None,
        }
    }

    /// Creates an error of the given kind caused by `cause`.
    pub fn with_cause(kind: ErrorKind, cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self {
            kind,
            context: None,
            source: Some(Arc::from(cause.into())),
        }
    }

    /// Creates a new error from any type that can be converted to an error.
    ///
    /// This is the public API for creating errors from external crates.
    ///
    /// # Examples
    ///
    /// ```
    /// use cachepipe_tier::Error;
    ///
    /// let error = Error::from_message("operation failed");
    /// ```
    pub fn from_message(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::with_cause(ErrorKind::Other, cause)
    }

    /// The backing store holds no value for `key`.
    #[must_use]
    pub fn not_found(key: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::NotFound).with_context(key)
    }

    /// The backing store failed.
    ///
    /// An error that is already a backing store error is returned unchanged.
    pub fn backing_store(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        let cause = cause.into();
        match cause.downcast::<Self>() {
            Ok(error) if error.kind == ErrorKind::BackingStore => *error,
            Ok(error) => Self::with_cause(ErrorKind::BackingStore, error),
            Err(cause) => Self::with_cause(ErrorKind::BackingStore, cause),
        }
    }

    /// The distributed cache could not be reached.
    pub fn cache_unavailable(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::with_cause(ErrorKind::CacheUnavailable, cause)
    }

    /// A value could not be encoded.
    pub fn codec(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::with_cause(ErrorKind::Codec, cause)
    }

    /// The work was cancelled before it completed.
    #[must_use]
    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled)
    }

    /// The owning session already finished.
    #[must_use]
    pub fn session_finished() -> Self {
        Self::new(ErrorKind::SessionFinished)
    }

    /// Attaches a short human-readable context, such as the affected key.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<Cow<'static, str>>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Returns the category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the attached context, if any.
    #[must_use]
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Returns `true` if the key is absent from the backing store.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    /// Returns `true` if the work was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.kind == ErrorKind::Cancelled
    }
}

impl From<crate::DecodeError> for Error {
    fn from(error: crate::DecodeError) -> Self {
        Self::with_cause(ErrorKind::Decode, error)
    }
}

/// A specialized [`Result`] type for cachepipe operations.
pub type Result<T> = std::result::Result<T, Error>;
