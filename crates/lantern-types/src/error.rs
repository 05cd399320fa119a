//! Error types for the Lantern browser core.
//!
//! The taxonomy distinguishes errors that are surfaced to the user as a
//! notice (`Url`, `InvalidInternalUrl`), errors that are silently
//! swallowed by the input layer (`InvalidIndex`, `NoHistory`, `Empty`),
//! and fetch failures that are rendered as an in-place error page
//! (`Fetch`). None of them are fatal; the session only ends on an
//! explicit user quit.

use std::io;

/// Errors produced by the Lantern browser core.
#[derive(Debug, thiserror::Error)]
pub enum LanternError {
    /// A URL or link reference could not be parsed. Surfaced to the
    /// user as a dismissable notice; the navigation is aborted.
    #[error("URL error: {0}")]
    Url(String),

    /// A link or tab number was out of range. Swallowed by the input
    /// layer, which resets the UI to its prior state.
    #[error("invalid index: {0}")]
    InvalidIndex(usize),

    /// Back/forward was requested at a history boundary. Swallowed.
    #[error("no history in that direction")]
    NoHistory,

    /// History has no current entry yet (fresh blank tab). Swallowed.
    #[error("history is empty")]
    Empty,

    /// An `about:` URL outside the fixed whitelist. Surfaced as a
    /// notice.
    #[error("invalid internal URL: {0}")]
    InvalidInternalUrl(String),

    /// Propagated from the fetch collaborator. Rendered as an error
    /// page in the owning tab rather than aborting it.
    #[error("fetch error: {0}")]
    Fetch(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl LanternError {
    /// Whether the input layer should swallow this error and reset the
    /// UI instead of showing a notice.
    pub fn is_silent(&self) -> bool {
        matches!(
            self,
            LanternError::InvalidIndex(_) | LanternError::NoHistory | LanternError::Empty
        )
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, LanternError>;
