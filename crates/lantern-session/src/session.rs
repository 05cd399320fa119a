//! The session: owned tab collection, current-tab index, and every
//! state transition the input layer can trigger.
//!
//! All mutation funnels through methods on [`Session`], on the
//! UI-owning thread. Fetch completions arrive over an internal channel
//! and are applied by [`Session::pump`], so worker threads never touch
//! tab state directly.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, channel};
use std::time::Duration;

use lantern_types::{LanternError, Url};

use crate::config::SessionConfig;
use crate::fetch::{FetchOrchestrator, SessionEvent};
use crate::history::History;
use crate::navigator::{Action, CommandContext, INTERNAL_SCHEME, classify, resolve_link};
use crate::page::{MediaType, Page, PageMode, WIDTH_FORCE_REFLOW};
use crate::tab::{InputBarState, Tab, TabId, TabMode};
use crate::traits::{Cache, Display, Fetcher, Renderer};

/// Internal URLs the session handles itself; anything else under
/// `about:` is rejected before it can reach the fetcher.
const ABOUT_NEWTAB: &str = "about:newtab";
const ABOUT_BOOKMARKS: &str = "about:bookmarks";

/// A bookmarked page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookmark {
    pub url: String,
    pub title: String,
}

/// Whether the application should keep running after an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    /// The last tab was closed; the session is over.
    Quit,
}

/// The tab manager and command router.
pub struct Session {
    config: SessionConfig,
    renderer: Arc<dyn Renderer>,
    cache: Arc<dyn Cache>,
    orchestrator: FetchOrchestrator,
    events: Receiver<SessionEvent>,

    tabs: Vec<Tab>,
    current: usize,

    /// Terminal text width pages are rendered at.
    width: u16,
    /// Visible content rows, for scroll paging.
    viewport_rows: usize,

    /// New-tab template, rendered once at startup and shared by value.
    blank_page: Page,

    bookmarks: Vec<Bookmark>,
}

impl Session {
    /// Build a session with no tabs. The new-tab template is rendered
    /// once here; its force-reflow width makes the first display of
    /// every fresh tab lay it out at the then-current width.
    pub fn new(
        config: SessionConfig,
        renderer: Arc<dyn Renderer>,
        fetcher: Arc<dyn Fetcher>,
        cache: Arc<dyn Cache>,
        width: u16,
        viewport_rows: usize,
    ) -> Self {
        let (tx, events) = channel();
        let orchestrator = FetchOrchestrator::new(fetcher, tx);

        let raw = config.new_tab_content.clone().into_bytes();
        let (rendered, links) = renderer.render(&raw, MediaType::Gemtext, width);
        let blank_page = Page::new(
            ABOUT_NEWTAB,
            raw,
            MediaType::Gemtext,
            rendered,
            links,
            WIDTH_FORCE_REFLOW,
        );

        Self {
            config,
            renderer,
            cache,
            orchestrator,
            events,
            tabs: Vec::new(),
            current: 0,
            width,
            viewport_rows,
            blank_page,
            bookmarks: Vec::new(),
        }
    }

    // -------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------

    pub fn num_tabs(&self) -> usize {
        self.tabs.len()
    }

    pub fn current_index(&self) -> Option<usize> {
        (!self.tabs.is_empty()).then_some(self.current)
    }

    pub fn current_tab(&self) -> Option<&Tab> {
        self.tabs.get(self.current)
    }

    pub fn tab(&self, id: TabId) -> Option<&Tab> {
        self.tabs.get(id)
    }

    pub fn bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    // -------------------------------------------------------------------
    // Tab lifecycle
    // -------------------------------------------------------------------

    /// Open a new tab showing the new-tab template and make it current.
    pub fn new_tab(&mut self, display: &mut dyn Display) {
        let id = self.tabs.len();
        let mut tab = Tab::new(id, self.blank_page.clone(), self.viewport_rows);
        // The template is not a history entry: there is no back-entry
        // until the user's first navigation in this tab.
        debug_assert!(tab.history.position().is_none());
        tab.saved_input = InputBarState::default();
        self.tabs.push(tab);
        self.current = id;

        log::info!("opened tab {id}");
        self.ensure_reflowed(id);
        display.show_tab(id);
        display.set_input_bar("", "");
        self.draw_tab(id, display);
    }

    /// Close the current tab.
    ///
    /// Only the rightmost tab can be closed; for any other tab this is
    /// a no-op. Closing the sole remaining tab ends the session.
    pub fn close_tab(&mut self, display: &mut dyn Display) -> Control {
        if self.tabs.is_empty() {
            return Control::Continue;
        }
        if self.current != self.tabs.len() - 1 {
            // Closing middle tabs would renumber every display region
            // to the right; not supported.
            return Control::Continue;
        }
        if self.tabs.len() == 1 {
            log::info!("closed last tab; quitting");
            return Control::Quit;
        }

        let closed = self.tabs.pop().map(|t| t.id);
        if let Some(id) = closed {
            log::info!("closed tab {id}");
            display.remove_tab(id);
        }
        self.current = self.current.saturating_sub(1);

        let id = self.current;
        self.ensure_reflowed(id);
        display.show_tab(id);
        self.restore_input_bar(display);
        self.draw_tab(id, display);
        Control::Continue
    }

    /// Switch to tab `n`.
    ///
    /// `n` is clamped into `[0, num_tabs - 1]` and then reduced modulo
    /// the tab count, so relative moves like `switch_tab(current + 1)`
    /// are always valid.
    pub fn switch_tab(&mut self, display: &mut dyn Display, n: usize) {
        if self.tabs.is_empty() {
            return;
        }
        let n = n.min(self.tabs.len() - 1);
        self.current = n % self.tabs.len();

        let id = self.current;
        self.ensure_reflowed(id);
        display.show_tab(id);
        self.restore_input_bar(display);
        self.draw_tab(id, display);
    }

    /// Persist the input bar's contents into the current tab, so they
    /// can be restored when the tab becomes visible again.
    pub fn save_input_bar(&mut self, label: &str, text: &str) {
        if let Some(t) = self.tabs.get_mut(self.current) {
            t.saved_input = InputBarState {
                label: label.to_string(),
                text: text.to_string(),
            };
        }
    }

    // -------------------------------------------------------------------
    // Command routing
    // -------------------------------------------------------------------

    /// Interpret a line typed into the input bar.
    pub fn submit_command(&mut self, display: &mut dyn Display, input: &str) {
        let Some(t) = self.current_tab() else {
            return;
        };
        if t.mode == TabMode::Loading {
            return;
        }

        let action = {
            let cx = CommandContext {
                page_url: &t.page.url,
                links: &t.page.links,
                has_content: t.has_content(),
                search_url: &self.config.search_url,
            };
            classify(input, &cx)
        };

        match action {
            Ok(Action::None) => self.restore_input_bar(display),
            Ok(Action::Navigate { url, evict_cache }) => {
                if evict_cache && !url.starts_with(INTERNAL_SCHEME) {
                    self.cache.invalidate(&url);
                }
                self.navigate(display, &url);
            },
            Ok(Action::ActivateLink(i)) => self.activate_link(display, i),
            Ok(Action::OpenLinkNewTab(url)) => {
                self.new_tab(display);
                self.navigate(display, &url);
            },
            Err(e) => {
                display.notice("URL Error", &e.to_string());
                self.restore_input_bar(display);
            },
        }
    }

    /// Activate link number `i` (1-based) on the current page.
    pub fn activate_link(&mut self, display: &mut dyn Display, i: usize) {
        let Some(t) = self.current_tab() else {
            return;
        };
        if t.mode == TabMode::Loading {
            return;
        }
        if i == 0 || i > t.page.links.len() {
            // Out-of-range numbers are swallowed, not surfaced.
            self.restore_input_bar(display);
            return;
        }
        match resolve_link(&t.page.url, &t.page.links[i - 1]) {
            Ok(url) => self.start_fetch(&url, true),
            Err(e) => {
                display.notice("URL Error", &e.to_string());
                self.restore_input_bar(display);
            },
        }
    }

    /// Open the selected link of a link-select-mode page in a new tab;
    /// with no selection, just open a fresh tab.
    pub fn open_selected_in_new_tab(&mut self, display: &mut dyn Display) {
        let selected = self.current_tab().and_then(|t| {
            if t.page.mode == PageMode::LinkSelect {
                let reference = t.page.selected_link_url()?;
                Some(resolve_link(&t.page.url, reference))
            } else {
                None
            }
        });
        match selected {
            Some(Ok(url)) => {
                self.new_tab(display);
                self.navigate(display, &url);
            },
            Some(Err(e)) => display.notice("URL Error", &e.to_string()),
            None => self.new_tab(display),
        }
    }

    // -------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------

    /// Load a URL in the current tab, appending to its history.
    ///
    /// `about:` URLs are intercepted here and never reach the fetcher.
    /// A URL without a scheme is given `gemini://`.
    pub fn navigate(&mut self, display: &mut dyn Display, url: &str) {
        if self.tabs.is_empty() {
            return;
        }
        if url == ABOUT_BOOKMARKS {
            self.show_bookmarks(display);
            return;
        }
        if url == ABOUT_NEWTAB {
            self.show_new_tab_page(display);
            return;
        }
        if url.starts_with(INTERNAL_SCHEME) {
            let e = LanternError::InvalidInternalUrl(url.to_string());
            display.notice("Error", &e.to_string());
            return;
        }

        let url = if url.contains("://") {
            url.to_string()
        } else {
            format!("gemini://{url}")
        };
        self.start_fetch(&url, true);
    }

    /// Re-fetch the current page, bypassing the cache and without
    /// appending a history entry.
    pub fn reload(&mut self) {
        let Some(t) = self.current_tab() else {
            return;
        };
        if !t.has_content() || t.mode == TabMode::Loading {
            return;
        }
        let url = t.page.url.clone();
        self.cache.invalidate(&url);
        if let Some(parsed) = Url::parse(&url) {
            self.cache.invalidate_favicon(&parsed.host);
        }
        log::info!("reloading {url}");
        self.start_fetch(&url, false);
    }

    /// History back. A boundary hit is silently ignored.
    pub fn back(&mut self) {
        self.history_move(History::back);
    }

    /// History forward. A boundary hit is silently ignored.
    pub fn forward(&mut self) {
        self.history_move(History::forward);
    }

    /// Navigate the current tab to the configured home page.
    pub fn home(&mut self, display: &mut dyn Display) {
        let url = self.config.home_url.clone();
        self.navigate(display, &url);
    }

    fn history_move(
        &mut self,
        op: for<'a> fn(&'a mut History) -> lantern_types::Result<&'a str>,
    ) {
        let Some(t) = self.tabs.get_mut(self.current) else {
            return;
        };
        if t.mode == TabMode::Loading {
            return;
        }
        match op(&mut t.history) {
            Ok(url) => {
                // The cursor has already moved; the fetch must not
                // append another entry.
                let url = url.to_string();
                self.start_fetch(&url, false);
            },
            Err(e) => log::debug!("history move ignored: {e}"),
        }
    }

    fn start_fetch(&mut self, url: &str, push_history: bool) {
        let Some(t) = self.tabs.get_mut(self.current) else {
            return;
        };
        let seq = t.begin_fetch(url);
        log::info!("tab {}: navigating to {url}", t.id);
        self.orchestrator
            .spawn_fetch(t.id, seq, url.to_string(), push_history);
    }

    // -------------------------------------------------------------------
    // Scrolling
    // -------------------------------------------------------------------

    pub fn page_up(&mut self) {
        self.scroll_page(true);
    }

    pub fn page_down(&mut self) {
        self.scroll_page(false);
    }

    fn scroll_page(&mut self, up: bool) {
        let rows = self.viewport_rows;
        let Some(t) = self.tabs.get_mut(self.current) else {
            return;
        };
        if t.mode == TabMode::Loading {
            return;
        }
        t.scroll.set_extent(t.page.rendered.lines().count(), rows);
        if up {
            t.scroll.page_up();
        } else {
            t.scroll.page_down();
        }
    }

    // -------------------------------------------------------------------
    // Resize
    // -------------------------------------------------------------------

    /// React to a terminal size change: re-render the visible tab's
    /// page at the new width on a worker thread, serialized by that
    /// tab's reformat guard. Other tabs reflow lazily when they next
    /// become visible, keyed off their stale `render_width`.
    pub fn handle_resize(&mut self, width: u16, viewport_rows: usize) {
        self.width = width;
        self.viewport_rows = viewport_rows;
        let Some(t) = self.current_tab() else {
            return;
        };
        self.orchestrator.spawn_reformat(
            t.id,
            t.reformat_guard(),
            Arc::clone(&self.renderer),
            t.page.url.clone(),
            t.page.raw.clone(),
            t.page.mediatype,
            width,
        );
    }

    // -------------------------------------------------------------------
    // Bookmarks
    // -------------------------------------------------------------------

    /// Bookmark the current page. Duplicate URLs are ignored.
    pub fn add_bookmark(&mut self) {
        let Some(t) = self.current_tab() else {
            return;
        };
        if !t.has_content() {
            return;
        }
        let url = t.page.url.clone();
        if self.bookmarks.iter().any(|b| b.url == url) {
            return;
        }
        let title = page_title(&t.page.raw).unwrap_or_else(|| url.clone());
        log::info!("bookmarked {url}");
        self.bookmarks.push(Bookmark { url, title });
    }

    fn bookmarks_gemtext(&self) -> String {
        let mut out = String::from("# Bookmarks\n\n");
        if self.bookmarks.is_empty() {
            out.push_str("No bookmarks yet.\n");
        }
        for b in &self.bookmarks {
            out.push_str(&format!("=> {} {}\n", b.url, b.title));
        }
        out
    }

    /// Show the generated bookmarks page in the current tab. This is a
    /// real page as far as history is concerned, but never a fetch.
    fn show_bookmarks(&mut self, display: &mut dyn Display) {
        let raw = self.bookmarks_gemtext().into_bytes();
        let (rendered, links) = self
            .renderer
            .render(&raw, MediaType::Gemtext, self.width);
        let page = Page::new(
            ABOUT_BOOKMARKS,
            raw,
            MediaType::Gemtext,
            rendered,
            links,
            i32::from(self.width),
        );
        let rows = self.viewport_rows;
        let current = self.current;
        if let Some(t) = self.tabs.get_mut(current) {
            t.page = page;
            t.scroll.reset();
            t.scroll.set_extent(t.page.rendered.lines().count(), rows);
            t.history.append(ABOUT_BOOKMARKS);
            t.saved_input = InputBarState {
                label: String::new(),
                text: ABOUT_BOOKMARKS.to_string(),
            };
        }
        self.restore_input_bar(display);
        self.draw_tab(current, display);
    }

    /// Re-display the shared new-tab template, without touching
    /// history.
    fn show_new_tab_page(&mut self, display: &mut dyn Display) {
        let blank = self.blank_page.clone();
        let current = self.current;
        if let Some(t) = self.tabs.get_mut(current) {
            t.page = blank;
            t.scroll.reset();
        }
        self.ensure_reflowed(current);
        self.draw_tab(current, display);
    }

    // -------------------------------------------------------------------
    // Event pump
    // -------------------------------------------------------------------

    /// Apply all pending completion events. Call from the UI loop.
    pub fn pump(&mut self, display: &mut dyn Display) -> usize {
        let mut applied = 0;
        while let Ok(ev) = self.events.try_recv() {
            self.apply_event(display, ev);
            applied += 1;
        }
        applied
    }

    /// Wait up to `timeout` for one event, then drain the rest.
    /// Returns whether anything was applied.
    pub fn pump_blocking(&mut self, display: &mut dyn Display, timeout: Duration) -> bool {
        match self.events.recv_timeout(timeout) {
            Ok(ev) => {
                self.apply_event(display, ev);
                self.pump(display);
                true
            },
            Err(_) => false,
        }
    }

    pub(crate) fn apply_event(&mut self, display: &mut dyn Display, ev: SessionEvent) {
        match ev {
            SessionEvent::FetchDone {
                tab,
                seq,
                url,
                push_history,
                result,
            } => self.apply_fetch_done(display, tab, seq, &url, push_history, result),
            SessionEvent::ReformatDone {
                tab,
                url,
                width,
                rendered,
                links,
            } => self.apply_reformat_done(display, tab, &url, width, rendered, links),
        }
    }

    fn apply_fetch_done(
        &mut self,
        display: &mut dyn Display,
        tab: TabId,
        seq: u64,
        url: &str,
        push_history: bool,
        result: lantern_types::Result<crate::traits::Document>,
    ) {
        let width = self.width;
        let rows = self.viewport_rows;
        let renderer = Arc::clone(&self.renderer);
        let current = self.current;

        let Some(t) = self.tabs.get_mut(tab) else {
            log::debug!("fetch completion for closed tab {tab} dropped");
            return;
        };
        if !t.is_latest_fetch(seq, url) {
            log::debug!("tab {tab}: superseded fetch of {url} discarded");
            return;
        }

        let (final_url, raw, mediatype) = match result {
            Ok(doc) => (doc.url, doc.raw, doc.mediatype),
            Err(e) => {
                log::warn!("tab {tab}: fetch of {url} failed: {e}");
                let body = Page::error_gemtext(url, &e.to_string());
                (url.to_string(), body.into_bytes(), MediaType::Gemtext)
            },
        };

        let (rendered, links) = renderer.render(&raw, mediatype, width);
        t.page = Page::new(final_url, raw, mediatype, rendered, links, i32::from(width));
        t.scroll.reset();
        t.scroll.set_extent(t.page.rendered.lines().count(), rows);
        if push_history {
            // History records where the tab ended up: the final URL
            // after any protocol-level redirects, or the attempted URL
            // when the fetch failed and the error page stands in.
            t.history.append(t.page.url.clone());
        }
        t.finish_fetch();
        t.saved_input = InputBarState {
            label: String::new(),
            text: t.page.url.clone(),
        };

        display.draw(t.id, &t.page.rendered, t.page.selected_link);
        // The input bar is shared; only the visible tab may touch it.
        if tab == current {
            display.set_input_bar("", &t.saved_input.text);
        }
    }

    fn apply_reformat_done(
        &mut self,
        display: &mut dyn Display,
        tab: TabId,
        url: &str,
        width: u16,
        rendered: String,
        links: Vec<String>,
    ) {
        let rows = self.viewport_rows;
        let current = self.current;
        let live_width = self.width;
        let Some(t) = self.tabs.get_mut(tab) else {
            return;
        };
        if t.page.url != url {
            log::debug!("tab {tab}: reformat for stale page {url} dropped");
            return;
        }
        // The guard serializes reformat jobs but does not order them; a
        // job from an earlier resize can finish after a later one. Its
        // result is stale the moment the live width moves on.
        if width != live_width {
            log::debug!("tab {tab}: reformat at stale width {width} dropped");
            return;
        }
        t.page.apply_reflow(width, rendered, links);
        t.scroll.set_extent(t.page.rendered.lines().count(), rows);
        if tab == current {
            display.draw(t.id, &t.page.rendered, t.page.selected_link);
        }
    }

    // -------------------------------------------------------------------
    // Internal helpers
    // -------------------------------------------------------------------

    /// Synchronous lazy reflow, for tabs becoming visible with a stale
    /// render width. Holds the same guard as the async reformat path.
    fn ensure_reflowed(&mut self, id: TabId) {
        let width = self.width;
        let rows = self.viewport_rows;
        let renderer = Arc::clone(&self.renderer);
        let Some(t) = self.tabs.get_mut(id) else {
            return;
        };
        if !t.page.needs_reflow(width) {
            return;
        }
        let guard = t.reformat_guard();
        let (rendered, links) =
            guard.run(|| renderer.render(&t.page.raw, t.page.mediatype, width));
        t.page.apply_reflow(width, rendered, links);
        t.scroll.set_extent(t.page.rendered.lines().count(), rows);
    }

    fn draw_tab(&self, id: TabId, display: &mut dyn Display) {
        if let Some(t) = self.tabs.get(id) {
            display.draw(t.id, &t.page.rendered, t.page.selected_link);
        }
    }

    fn restore_input_bar(&self, display: &mut dyn Display) {
        if let Some(t) = self.current_tab() {
            display.set_input_bar(&t.saved_input.label, &t.saved_input.text);
        }
    }
}

/// First `# ` heading of a gemtext document, as a page title.
fn page_title(raw: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(raw).ok()?;
    text.lines().find_map(|l| {
        l.strip_prefix("# ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    })
}
