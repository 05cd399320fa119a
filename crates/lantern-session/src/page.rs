//! Loaded-document snapshots.

/// Render width value that forces a re-render regardless of the
/// terminal's current width. Used for pages that have never been laid
/// out, such as the shared new-tab template.
pub const WIDTH_FORCE_REFLOW: i32 = -1;

/// Media type of a fetched document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    /// `text/gemini`.
    Gemtext,
    /// Any other `text/*`.
    PlainText,
    /// Anything else; rendered as-is by the render collaborator.
    Unknown,
}

/// Display mode of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMode {
    /// Plain display.
    Normal,
    /// A specific link is highlighted for activation.
    LinkSelect,
}

/// One fetched-and-rendered document snapshot.
///
/// A tab replaces its `Page` wholesale on navigation. The only fields
/// that change in place are `rendered`, `links`, and `render_width`,
/// when a terminal resize forces a reflow of the same raw content.
#[derive(Debug, Clone)]
pub struct Page {
    /// Raw bytes as fetched.
    pub raw: Vec<u8>,
    /// Rendered text at `render_width`.
    pub rendered: String,
    /// Extracted link URLs, externally 1-indexed.
    pub links: Vec<String>,
    /// Source URL.
    pub url: String,
    /// Media type of `raw`.
    pub mediatype: MediaType,
    /// Terminal width `rendered` was produced for, or
    /// [`WIDTH_FORCE_REFLOW`].
    pub render_width: i32,
    /// Display mode.
    pub mode: PageMode,
    /// Selected link index (1-based) in link-select mode.
    pub selected_link: Option<usize>,
}

impl Page {
    /// Build a page from freshly rendered content.
    pub fn new(
        url: impl Into<String>,
        raw: Vec<u8>,
        mediatype: MediaType,
        rendered: String,
        links: Vec<String>,
        render_width: i32,
    ) -> Self {
        Self {
            raw,
            rendered,
            links,
            url: url.into(),
            mediatype,
            render_width,
            mode: PageMode::Normal,
            selected_link: None,
        }
    }

    /// Build the gemtext source for an in-place fetch error page.
    ///
    /// The error is content, not a modal: the tab stays usable and its
    /// history still records the attempted URL.
    pub fn error_gemtext(url: &str, message: &str) -> String {
        format!(
            "# Page Load Error\n\n{message}\n\n=> {url} Try again\n",
        )
    }

    /// Whether this page's stored render width is stale for the given
    /// terminal width.
    pub fn needs_reflow(&self, width: u16) -> bool {
        self.render_width == WIDTH_FORCE_REFLOW || self.render_width != i32::from(width)
    }

    /// Apply a reflow result produced for `width`.
    pub fn apply_reflow(&mut self, width: u16, rendered: String, links: Vec<String>) {
        self.rendered = rendered;
        self.links = links;
        self.render_width = i32::from(width);
    }

    /// The currently selected link URL, in link-select mode.
    pub fn selected_link_url(&self) -> Option<&str> {
        let idx = self.selected_link?;
        self.links.get(idx.checked_sub(1)?).map(String::as_str)
    }
}
