//! Session configuration.
//!
//! Config file discovery lives with the application shell; this module
//! only defines the settings the navigation core consumes and a loader
//! for a TOML table of overrides.

use lantern_types::{LanternError, Result};
use serde::Deserialize;

/// Default new-tab gemtext, rendered once at startup and shared by all
/// new tabs.
pub const DEFAULT_NEW_TAB_CONTENT: &str = "\
# New Tab

You just opened a new tab.

Type a URL, a search query, or a link number in the input bar.
Type .. to go up a directory, and use back/forward for history.

=> about:bookmarks Bookmarks
";

/// Settings consumed by the session core.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Search endpoint; queries are appended percent-escaped after `?`.
    pub search_url: String,
    /// Home page URL.
    pub home_url: String,
    /// Gemtext shown in fresh tabs.
    pub new_tab_content: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            search_url: "gemini://geminispace.info/search".to_string(),
            home_url: "gemini://geminispace.info/".to_string(),
            new_tab_content: DEFAULT_NEW_TAB_CONTENT.to_string(),
        }
    }
}

impl SessionConfig {
    /// Parse a TOML table of overrides; missing keys keep defaults.
    pub fn from_toml(text: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Semantic checks past TOML syntax.
    fn validate(&self) -> Result<()> {
        if self.search_url.trim().is_empty() {
            return Err(LanternError::Config("search_url must not be empty".into()));
        }
        if self.home_url.trim().is_empty() {
            return Err(LanternError::Config("home_url must not be empty".into()));
        }
        Ok(())
    }
}
