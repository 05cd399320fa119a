//! Command classification: what did the user mean by what they typed?
//!
//! A raw input line is interpreted against the current tab's page and
//! turned into exactly one [`Action`]. The function is pure so the
//! classification rules are testable without a UI harness.

use lantern_types::url::query_escape;
use lantern_types::{LanternError, Result, Url};

/// Scheme prefix reserved for app-internal pages.
pub const INTERNAL_SCHEME: &str = "about:";

/// What a command line resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Nothing to do; the input layer restores its prior state.
    None,
    /// Load `url` in the current tab. `evict_cache` is set for manual
    /// URL entry and searches, which always bypass the cache.
    Navigate { url: String, evict_cache: bool },
    /// Activate link number `1..=links.len()` on the current page.
    ActivateLink(usize),
    /// Open this (already resolved) URL in a new tab.
    OpenLinkNewTab(String),
}

/// Read-only view of the state classification runs against.
#[derive(Debug, Clone, Copy)]
pub struct CommandContext<'a> {
    /// URL of the current page.
    pub page_url: &'a str,
    /// Links of the current page, externally 1-indexed.
    pub links: &'a [String],
    /// Whether the current tab shows real fetched content.
    pub has_content: bool,
    /// Configured search endpoint.
    pub search_url: &'a str,
}

/// Classify one input line.
///
/// Priority order: blank, `".."` (directory-up), link number (with the
/// `new:<n>` new-tab form), then the URL-vs-search heuristic. Only a
/// malformed link reference in the `new:` form is an error; everything
/// else that cannot be acted on is a silent [`Action::None`].
pub fn classify(input: &str, cx: &CommandContext<'_>) -> Result<Action> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(Action::None);
    }

    if input == ".." && cx.has_content {
        return Ok(directory_up(cx.page_url));
    }

    if let Ok(i) = input.parse::<usize>() {
        if i >= 1 && i <= cx.links.len() {
            return Ok(Action::ActivateLink(i));
        }
        // Out-of-range link number: not an error the user needs to see.
        return Ok(Action::None);
    }

    if let Some(num) = input.strip_prefix("new:") {
        if num.is_empty() {
            // Bare "new:" has no number; fall through to URL handling.
        } else {
            let Ok(i) = num.parse::<usize>() else {
                return Ok(Action::None);
            };
            if i >= 1 && i <= cx.links.len() {
                let resolved = resolve_link(cx.page_url, &cx.links[i - 1])?;
                return Ok(Action::OpenLinkNewTab(resolved));
            }
            return Ok(Action::None);
        }
    }

    if is_search_query(input) {
        let url = format!("{}?{}", cx.search_url, query_escape(input));
        return Ok(Action::Navigate {
            url,
            evict_cache: true,
        });
    }

    Ok(Action::Navigate {
        url: input.to_string(),
        evict_cache: true,
    })
}

/// Resolve a possibly-relative link reference against the page's URL.
pub fn resolve_link(base: &str, reference: &str) -> Result<String> {
    let base = Url::parse(base)
        .ok_or_else(|| LanternError::Url(format!("page URL could not be parsed: {base}")))?;
    let resolved = base
        .resolve(reference)
        .ok_or_else(|| LanternError::Url(format!("link URL could not be parsed: {reference}")))?;
    Ok(resolved.to_string())
}

/// Directory-style "go up": strip the last path segment of the current
/// URL. Distinct from history-back. A no-op at the host root or when
/// the current URL does not parse.
fn directory_up(page_url: &str) -> Action {
    let Some(parsed) = Url::parse(page_url) else {
        return Action::None;
    };
    match parsed.parent() {
        Some(parent) => Action::Navigate {
            url: parent.to_string(),
            evict_cache: false,
        },
        None => Action::None,
    }
}

/// The URL-vs-search heuristic: a space means search, and so does input
/// with neither `//` nor `.` unless it is an internal URL.
fn is_search_query(input: &str) -> bool {
    input.contains(' ')
        || (!input.contains("//") && !input.contains('.') && !input.starts_with(INTERNAL_SCHEME))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH: &str = "gemini://search.example/search";

    fn cx<'a>(page_url: &'a str, links: &'a [String], has_content: bool) -> CommandContext<'a> {
        CommandContext {
            page_url,
            links,
            has_content,
            search_url: SEARCH,
        }
    }

    fn links(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("/link{i}.gmi")).collect()
    }

    #[test]
    fn blank_input_is_a_no_op() {
        let c = cx("gemini://host/", &[], true);
        assert_eq!(classify("", &c).unwrap(), Action::None);
        assert_eq!(classify("   \t ", &c).unwrap(), Action::None);
    }

    #[test]
    fn directory_up_from_nested_dir() {
        let c = cx("gemini://host/test/foo/", &[], true);
        assert_eq!(
            classify("..", &c).unwrap(),
            Action::Navigate {
                url: "gemini://host/test/".into(),
                evict_cache: false,
            }
        );
    }

    #[test]
    fn directory_up_from_top_level_file() {
        let c = cx("gemini://host/test", &[], true);
        assert_eq!(
            classify("..", &c).unwrap(),
            Action::Navigate {
                url: "gemini://host/".into(),
                evict_cache: false,
            }
        );
    }

    #[test]
    fn directory_up_at_root_is_a_no_op() {
        let c = cx("gemini://host/", &[], true);
        assert_eq!(classify("..", &c).unwrap(), Action::None);
    }

    #[test]
    fn directory_up_clears_query() {
        let c = cx("gemini://host/dir/page.gmi?q=x", &[], true);
        assert_eq!(
            classify("..", &c).unwrap(),
            Action::Navigate {
                url: "gemini://host/dir/".into(),
                evict_cache: false,
            }
        );
    }

    #[test]
    fn directory_up_without_content_is_a_search() {
        // ".." on a blank tab falls through to the heuristic: no space,
        // contains ".", so it is treated as a literal URL.
        let c = cx("about:newtab", &[], false);
        assert_eq!(
            classify("..", &c).unwrap(),
            Action::Navigate {
                url: "..".into(),
                evict_cache: true,
            }
        );
    }

    #[test]
    fn in_range_number_activates_link() {
        let ls = links(5);
        let c = cx("gemini://host/", &ls, true);
        assert_eq!(classify("3", &c).unwrap(), Action::ActivateLink(3));
        assert_eq!(classify("1", &c).unwrap(), Action::ActivateLink(1));
        assert_eq!(classify("5", &c).unwrap(), Action::ActivateLink(5));
    }

    #[test]
    fn out_of_range_number_is_silent() {
        let ls = links(2);
        let c = cx("gemini://host/", &ls, true);
        assert_eq!(classify("3", &c).unwrap(), Action::None);
        assert_eq!(classify("0", &c).unwrap(), Action::None);
    }

    #[test]
    fn new_prefix_opens_link_in_new_tab() {
        let ls = links(5);
        let c = cx("gemini://host/dir/", &ls, true);
        assert_eq!(
            classify("new:3", &c).unwrap(),
            Action::OpenLinkNewTab("gemini://host/link3.gmi".into())
        );
    }

    #[test]
    fn new_prefix_out_of_range_is_silent() {
        let ls = links(2);
        let c = cx("gemini://host/", &ls, true);
        assert_eq!(classify("new:3", &c).unwrap(), Action::None);
    }

    #[test]
    fn new_prefix_without_number_is_silent() {
        let ls = links(2);
        let c = cx("gemini://host/", &ls, true);
        assert_eq!(classify("new:x", &c).unwrap(), Action::None);
    }

    #[test]
    fn new_prefix_unparsable_base_is_an_error() {
        let ls = links(1);
        let c = cx("not a url", &ls, true);
        assert!(matches!(
            classify("new:1", &c),
            Err(LanternError::Url(_))
        ));
    }

    #[test]
    fn spaces_mean_search() {
        let c = cx("gemini://host/", &[], true);
        assert_eq!(
            classify("search terms here", &c).unwrap(),
            Action::Navigate {
                url: format!("{SEARCH}?search%20terms%20here"),
                evict_cache: true,
            }
        );
    }

    #[test]
    fn bare_word_means_search() {
        let c = cx("gemini://host/", &[], true);
        assert_eq!(
            classify("cats", &c).unwrap(),
            Action::Navigate {
                url: format!("{SEARCH}?cats"),
                evict_cache: true,
            }
        );
    }

    #[test]
    fn dotted_input_is_a_literal_url() {
        let c = cx("gemini://host/", &[], true);
        assert_eq!(
            classify("example.org/page", &c).unwrap(),
            Action::Navigate {
                url: "example.org/page".into(),
                evict_cache: true,
            }
        );
    }

    #[test]
    fn double_slash_input_is_a_literal_url() {
        let c = cx("gemini://host/", &[], true);
        assert_eq!(
            classify("gemini://example/page", &c).unwrap(),
            Action::Navigate {
                url: "gemini://example/page".into(),
                evict_cache: true,
            }
        );
    }

    #[test]
    fn internal_urls_are_not_searches() {
        let c = cx("gemini://host/", &[], true);
        assert_eq!(
            classify("about:bookmarks", &c).unwrap(),
            Action::Navigate {
                url: "about:bookmarks".into(),
                evict_cache: true,
            }
        );
    }

    #[test]
    fn resolve_link_relative() {
        assert_eq!(
            resolve_link("gemini://host/a/b.gmi", "c.gmi").unwrap(),
            "gemini://host/a/c.gmi"
        );
    }

    #[test]
    fn resolve_link_bad_base() {
        assert!(matches!(
            resolve_link("nope", "c.gmi"),
            Err(LanternError::Url(_))
        ));
    }
}
