//! Tab/session navigation core for the Lantern Gemini browser.
//!
//! This crate is the state machine behind the UI: it tracks browsing
//! contexts ([`tab::Tab`]) with their own history and in-flight fetch
//! state, interprets typed commands ([`navigator`]), runs fetches on
//! worker threads ([`fetch::FetchOrchestrator`]), and funnels every
//! mutation through the owned [`session::Session`] so the per-tab and
//! per-session invariants hold.
//!
//! Rendering, networking, caching, and the terminal widget layer are
//! collaborators behind the narrow traits in [`traits`].

pub mod config;
pub mod fetch;
pub mod history;
pub mod navigator;
pub mod page;
pub mod scroll;
pub mod session;
pub mod tab;
pub mod traits;

#[cfg(test)]
pub(crate) mod test_utils;

// -----------------------------------------------------------------------
// Public re-exports
// -----------------------------------------------------------------------

pub use config::SessionConfig;
pub use history::History;
pub use navigator::{Action, CommandContext, classify, resolve_link};
pub use page::{MediaType, Page, PageMode};
pub use session::{Bookmark, Control, Session};
pub use tab::{JobGuard, Tab, TabId, TabMode};
pub use traits::{Cache, Display, Document, Fetcher, Renderer};
