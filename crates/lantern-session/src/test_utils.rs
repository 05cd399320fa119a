//! Mock collaborators shared by the unit tests.

use std::collections::HashMap;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Mutex, PoisonError};

use lantern_types::{LanternError, Result};

use crate::page::MediaType;
use crate::tab::TabId;
use crate::traits::{Cache, Display, Document, Fetcher, Renderer};

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Opt tests into `RUST_LOG`-controlled logging.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Deterministic line-oriented renderer: prefixes the text with a
/// width marker and extracts `=>` link lines, gemtext style.
pub struct LineRenderer;

impl Renderer for LineRenderer {
    fn render(&self, raw: &[u8], _mediatype: MediaType, width: u16) -> (String, Vec<String>) {
        let text = String::from_utf8_lossy(raw);
        let links = text
            .lines()
            .filter_map(|l| l.strip_prefix("=>"))
            .filter_map(|rest| rest.split_whitespace().next())
            .map(str::to_string)
            .collect();
        (format!("[w{width}]\n{text}"), links)
    }
}

/// One scripted response: the final URL the fetch reports (differs from
/// the requested URL for redirects) and the body.
struct ScriptedPage {
    final_url: String,
    body: String,
}

/// Fetcher that serves a scripted set of pages and records every
/// request it sees. Unknown URLs fail with a fetch error.
#[derive(Default)]
pub struct ScriptedFetcher {
    pages: Mutex<HashMap<String, ScriptedPage>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn with_page(url: &str, gemtext: &str) -> Self {
        let f = Self::default();
        f.add_page(url, gemtext);
        f
    }

    pub fn add_page(&self, url: &str, gemtext: &str) {
        lock(&self.pages).insert(
            url.to_string(),
            ScriptedPage {
                final_url: url.to_string(),
                body: gemtext.to_string(),
            },
        );
    }

    /// Script a redirect: a request for `url` succeeds with a document
    /// whose final URL is `to`.
    pub fn add_redirect(&self, url: &str, to: &str, gemtext: &str) {
        lock(&self.pages).insert(
            url.to_string(),
            ScriptedPage {
                final_url: to.to_string(),
                body: gemtext.to_string(),
            },
        );
    }

    pub fn requests(&self) -> Vec<String> {
        lock(&self.requests).clone()
    }
}

impl Fetcher for ScriptedFetcher {
    fn fetch(&self, url: &str) -> Result<Document> {
        lock(&self.requests).push(url.to_string());
        match lock(&self.pages).get(url) {
            Some(page) => Ok(Document {
                url: page.final_url.clone(),
                raw: page.body.clone().into_bytes(),
                mediatype: MediaType::Gemtext,
            }),
            None => Err(LanternError::Fetch(format!("no route to {url}"))),
        }
    }
}

/// Fetcher that blocks each request until the test releases it through
/// the gate sender, for exercising in-flight states.
pub struct GatedFetcher {
    inner: ScriptedFetcher,
    gate: Mutex<Receiver<()>>,
}

impl GatedFetcher {
    /// Returns the fetcher and the sender that releases one blocked
    /// request per `send`.
    pub fn new(inner: ScriptedFetcher) -> (Self, Sender<()>) {
        let (tx, rx) = channel();
        (
            Self {
                inner,
                gate: Mutex::new(rx),
            },
            tx,
        )
    }
}

impl Fetcher for GatedFetcher {
    fn fetch(&self, url: &str) -> Result<Document> {
        // Hold the gate lock only while waiting for our release token.
        let _ = lock(&self.gate).recv();
        self.inner.fetch(url)
    }
}

/// Cache stub that records invalidations.
#[derive(Default)]
pub struct RecordingCache {
    pub urls: Mutex<Vec<String>>,
    pub favicon_hosts: Mutex<Vec<String>>,
}

impl RecordingCache {
    pub fn invalidated_urls(&self) -> Vec<String> {
        lock(&self.urls).clone()
    }

    pub fn invalidated_favicons(&self) -> Vec<String> {
        lock(&self.favicon_hosts).clone()
    }
}

impl Cache for RecordingCache {
    fn invalidate(&self, url: &str) {
        lock(&self.urls).push(url.to_string());
    }

    fn invalidate_favicon(&self, host: &str) {
        lock(&self.favicon_hosts).push(host.to_string());
    }
}

/// Everything a display was asked to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayCall {
    Draw {
        tab: TabId,
        content: String,
        selected_link: Option<usize>,
    },
    ShowTab(TabId),
    RemoveTab(TabId),
    InputBar {
        label: String,
        text: String,
    },
    Notice {
        title: String,
        message: String,
    },
}

/// Display surface that records calls for assertions.
#[derive(Default)]
pub struct RecordingDisplay {
    pub calls: Vec<DisplayCall>,
}

impl RecordingDisplay {
    pub fn last_draw_for(&self, tab: TabId) -> Option<&str> {
        self.calls.iter().rev().find_map(|c| match c {
            DisplayCall::Draw { tab: t, content, .. } if *t == tab => Some(content.as_str()),
            _ => None,
        })
    }

    pub fn notices(&self) -> Vec<(&str, &str)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                DisplayCall::Notice { title, message } => {
                    Some((title.as_str(), message.as_str()))
                },
                _ => None,
            })
            .collect()
    }

    pub fn last_input_bar(&self) -> Option<(&str, &str)> {
        self.calls.iter().rev().find_map(|c| match c {
            DisplayCall::InputBar { label, text } => Some((label.as_str(), text.as_str())),
            _ => None,
        })
    }

    pub fn visible_tab(&self) -> Option<TabId> {
        self.calls.iter().rev().find_map(|c| match c {
            DisplayCall::ShowTab(t) => Some(*t),
            _ => None,
        })
    }
}

impl Display for RecordingDisplay {
    fn draw(&mut self, tab: TabId, content: &str, selected_link: Option<usize>) {
        self.calls.push(DisplayCall::Draw {
            tab,
            content: content.to_string(),
            selected_link,
        });
    }

    fn show_tab(&mut self, tab: TabId) {
        self.calls.push(DisplayCall::ShowTab(tab));
    }

    fn remove_tab(&mut self, tab: TabId) {
        self.calls.push(DisplayCall::RemoveTab(tab));
    }

    fn set_input_bar(&mut self, label: &str, text: &str) {
        self.calls.push(DisplayCall::InputBar {
            label: label.to_string(),
            text: text.to_string(),
        });
    }

    fn notice(&mut self, title: &str, message: &str) {
        self.calls.push(DisplayCall::Notice {
            title: title.to_string(),
            message: message.to_string(),
        });
    }
}
