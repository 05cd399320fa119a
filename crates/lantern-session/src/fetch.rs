//! Fetch orchestration: worker threads, completion events, reformat
//! jobs.
//!
//! Each navigation runs its fetch on its own thread; the result is sent
//! back over a channel and applied on the UI thread by the session's
//! event pump. There is no cancellation: a superseded fetch runs to
//! completion and its completion event is discarded by the relevance
//! check when applied.

use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;

use lantern_types::Result;

use crate::tab::{JobGuard, TabId};
use crate::traits::{Document, Fetcher, Renderer};

/// Completion events marshaled back to the UI thread.
#[derive(Debug)]
pub enum SessionEvent {
    /// A navigation's fetch finished (successfully or not).
    FetchDone {
        tab: TabId,
        /// Sequence number captured at `begin_fetch` time.
        seq: u64,
        /// The URL the fetch was issued for.
        url: String,
        /// Whether this navigation appends a history entry (false for
        /// reload and history moves).
        push_history: bool,
        result: Result<Document>,
    },
    /// A resize-triggered re-render finished.
    ReformatDone {
        tab: TabId,
        /// URL of the page the raw content came from; the result is
        /// dropped if the tab has navigated away in the meantime.
        url: String,
        width: u16,
        rendered: String,
        links: Vec<String>,
    },
}

/// Runs fetches and reformat jobs off the UI thread.
pub struct FetchOrchestrator {
    fetcher: Arc<dyn Fetcher>,
    tx: Sender<SessionEvent>,
}

impl FetchOrchestrator {
    pub fn new(fetcher: Arc<dyn Fetcher>, tx: Sender<SessionEvent>) -> Self {
        Self { fetcher, tx }
    }

    /// Start an asynchronous fetch for one navigation.
    pub fn spawn_fetch(&self, tab: TabId, seq: u64, url: String, push_history: bool) {
        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.tx.clone();
        thread::spawn(move || {
            log::debug!("tab {tab}: fetching {url} (seq {seq})");
            let result = fetcher.fetch(&url);
            // The session may already be gone on shutdown; a dead
            // channel just drops the result.
            let _ = tx.send(SessionEvent::FetchDone {
                tab,
                seq,
                url,
                push_history,
                result,
            });
        });
    }

    /// Re-render a tab's raw content at a new width on a worker thread.
    ///
    /// The tab's single-flight guard is held across the render, so a
    /// slow re-render from an earlier resize cannot interleave with a
    /// later one; the later job blocks until the earlier finishes.
    #[allow(clippy::too_many_arguments)]
    pub fn spawn_reformat(
        &self,
        tab: TabId,
        guard: JobGuard,
        renderer: Arc<dyn Renderer>,
        url: String,
        raw: Vec<u8>,
        mediatype: crate::page::MediaType,
        width: u16,
    ) {
        let tx = self.tx.clone();
        thread::spawn(move || {
            let (rendered, links) = guard.run(|| renderer.render(&raw, mediatype, width));
            let _ = tx.send(SessionEvent::ReformatDone {
                tab,
                url,
                width,
                rendered,
                links,
            });
        });
    }
}
