//! Contracts for the collaborators this crate drives but does not
//! implement: the rendering engine, the protocol client, the response
//! cache, and the terminal display surface.

use lantern_types::Result;

use crate::page::MediaType;
use crate::tab::TabId;

/// A fetched document before rendering.
#[derive(Debug, Clone)]
pub struct Document {
    /// Final URL (after any protocol-level redirects).
    pub url: String,
    /// Raw payload bytes.
    pub raw: Vec<u8>,
    /// Media type reported by the protocol client.
    pub mediatype: MediaType,
}

/// Document-to-text rendering engine.
///
/// Pure and deterministic for a given width: the same raw bytes at the
/// same width always yield the same text and link list.
pub trait Renderer: Send + Sync {
    /// Render raw bytes at the given terminal width, returning the
    /// display text and the extracted link URLs in document order.
    fn render(&self, raw: &[u8], mediatype: MediaType, width: u16) -> (String, Vec<String>);
}

/// Network/protocol client; the sole source of new raw content.
///
/// Called from fetch worker threads, never from the UI thread.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Document>;
}

/// Shared response cache. Best-effort: eviction needs no result.
pub trait Cache: Send + Sync {
    /// Drop any cached response for this URL.
    fn invalidate(&self, url: &str);
    /// Drop any cached favicon for this host.
    fn invalidate_favicon(&self, host: &str);
}

/// Terminal display surface, driven only from the UI thread.
///
/// Each tab has an addressable drawable region keyed by its id; the
/// input bar and notice surfaces are shared.
pub trait Display {
    /// Replace the content of a tab's region.
    fn draw(&mut self, tab: TabId, content: &str, selected_link: Option<usize>);
    /// Make a tab's region the visible one.
    fn show_tab(&mut self, tab: TabId);
    /// Remove a closed tab's region.
    fn remove_tab(&mut self, tab: TabId);
    /// Set the shared input bar's label and text.
    fn set_input_bar(&mut self, label: &str, text: &str);
    /// Show a dismissable notice (the single error surface).
    fn notice(&mut self, title: &str, message: &str);
}
