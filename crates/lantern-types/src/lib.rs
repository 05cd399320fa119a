//! Foundation types for the Lantern browser core.
//!
//! This crate holds the pieces every other Lantern crate needs: the
//! [`LanternError`] taxonomy and the [`Url`] type with RFC-3986-style
//! reference resolution.

pub mod error;
pub mod url;

pub use error::{LanternError, Result};
pub use url::Url;
