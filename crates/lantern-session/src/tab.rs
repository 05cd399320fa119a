//! A single browsing context: one page, one history, one fetch slot.

use std::sync::{Arc, Mutex, PoisonError};

use crate::history::History;
use crate::page::Page;
use crate::scroll::ScrollState;

/// Stable tab index; also the key for the tab's display surface.
pub type TabId = usize;

/// Load lifecycle of a tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabMode {
    /// Content is displayed and loaded-content commands are live.
    Done,
    /// A fetch is in flight; only the restricted command set is live.
    Loading,
}

/// Saved input-bar contents, restored when a tab becomes visible again.
#[derive(Debug, Clone, Default)]
pub struct InputBarState {
    pub label: String,
    pub text: String,
}

/// Per-tab single-flight guard.
///
/// At most one job of a given kind runs per tab at a time; a second job
/// blocks until the first completes rather than being dropped. The only
/// current user is resize reformatting, where a slow re-render from an
/// earlier resize must not clobber a later one.
#[derive(Debug, Clone, Default)]
pub struct JobGuard(Arc<Mutex<()>>);

impl JobGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `job` while holding the guard.
    pub fn run<T>(&self, job: impl FnOnce() -> T) -> T {
        let _held = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        job()
    }
}

/// An independent browsing context.
///
/// Owned exclusively by the session; all mutation goes through session
/// methods on the UI thread. The fetch sequence number is the
/// supersession mechanism: every navigation bumps it, and a completion
/// is only applied if it still carries the latest number.
#[derive(Debug)]
pub struct Tab {
    pub id: TabId,
    pub page: Page,
    pub history: History,
    pub mode: TabMode,
    pub scroll: ScrollState,
    pub saved_input: InputBarState,
    reformat_guard: JobGuard,
    fetch_seq: u64,
    pending_url: Option<String>,
}

impl Tab {
    /// Create a tab showing the given page (normally the shared
    /// new-tab template) with an empty history.
    pub fn new(id: TabId, page: Page, viewport_rows: usize) -> Self {
        Self {
            id,
            page,
            history: History::new(),
            mode: TabMode::Done,
            scroll: ScrollState::new(viewport_rows),
            saved_input: InputBarState::default(),
            reformat_guard: JobGuard::new(),
            fetch_seq: 0,
            pending_url: None,
        }
    }

    /// Whether the tab is showing real fetched content, as opposed to
    /// the new-tab template or nothing.
    pub fn has_content(&self) -> bool {
        !self.page.raw.is_empty() && !self.page.url.starts_with("about:")
    }

    /// Record the start of a navigation and return its sequence number.
    pub fn begin_fetch(&mut self, url: &str) -> u64 {
        self.fetch_seq += 1;
        self.pending_url = Some(url.to_string());
        self.mode = TabMode::Loading;
        self.fetch_seq
    }

    /// The supersession predicate: is a completion carrying `seq` for
    /// `url` still this tab's latest pending navigation?
    pub fn is_latest_fetch(&self, seq: u64, url: &str) -> bool {
        seq == self.fetch_seq && self.pending_url.as_deref() == Some(url)
    }

    /// Mark the pending navigation finished.
    pub fn finish_fetch(&mut self) {
        self.pending_url = None;
        self.mode = TabMode::Done;
    }

    /// Handle to this tab's reformat guard, for off-thread jobs.
    pub fn reformat_guard(&self) -> JobGuard {
        self.reformat_guard.clone()
    }
}
