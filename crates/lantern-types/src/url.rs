//! URL parsing and reference resolution (simplified RFC 3986).
//!
//! Covers what a Gemini browser core needs: absolute URLs
//! (`gemini://host/path?query`), internal URLs (`about:` is handled one
//! layer up, before parsing), relative references found in link lines,
//! and the directory-up transform used by the `..` command.

use std::fmt;

/// A parsed URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Url {
    /// Scheme component (e.g. `"gemini"`).
    pub scheme: String,
    /// Host component (e.g. `"example.org"`).
    pub host: String,
    /// Optional explicit port number.
    pub port: Option<u16>,
    /// Path component starting with `/`.
    pub path: String,
    /// Optional query string (without the leading `?`).
    pub query: Option<String>,
    /// Optional fragment (without the leading `#`).
    pub fragment: Option<String>,
}

impl Url {
    /// Parse an absolute URL string.
    ///
    /// Also accepts protocol-relative (`//host/path`) and
    /// fragment-only (`#section`) forms, which only make sense as
    /// inputs to [`Url::resolve`].
    pub fn parse(url: &str) -> Option<Self> {
        let url = url.trim();
        if url.is_empty() {
            return None;
        }

        if let Some(frag) = url.strip_prefix('#') {
            return Some(Url {
                scheme: String::new(),
                host: String::new(),
                port: None,
                path: String::new(),
                query: None,
                fragment: Some(frag.to_string()),
            });
        }

        if let Some(rest) = url.strip_prefix("//") {
            return Self::parse_after_scheme("", rest);
        }

        let idx = url.find("://")?;
        Self::parse_after_scheme(&url[..idx], &url[idx + 3..])
    }

    /// Parse `host[:port]/path?query#fragment` once the scheme has been
    /// stripped.
    fn parse_after_scheme(scheme: &str, rest: &str) -> Option<Url> {
        let (rest, fragment) = match rest.find('#') {
            Some(i) => (&rest[..i], Some(rest[i + 1..].to_string())),
            None => (rest, None),
        };
        let (rest, query) = match rest.find('?') {
            Some(i) => (&rest[..i], Some(rest[i + 1..].to_string())),
            None => (rest, None),
        };
        let (authority, path) = match rest.find('/') {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, "/"),
        };
        if authority.is_empty() {
            return None;
        }

        let (host, port) = match authority.rfind(':') {
            Some(i) => match authority[i + 1..].parse::<u16>() {
                Ok(p) => (&authority[..i], Some(p)),
                Err(_) => (authority, None),
            },
            None => (authority, None),
        };

        Some(Url {
            scheme: scheme.to_lowercase(),
            host: host.to_string(),
            port,
            path: path.to_string(),
            query,
            fragment,
        })
    }

    /// Resolve a relative reference against this base URL.
    ///
    /// Handles absolute URLs (returned as-is), protocol-relative
    /// (`//host/path`), absolute paths (`/path`), relative paths
    /// (`path`, `../path`), query-only (`?q`), and fragment-only
    /// (`#frag`) references.
    pub fn resolve(&self, reference: &str) -> Option<Url> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Some(self.clone());
        }

        if reference.contains("://") {
            return Url::parse(reference);
        }

        if reference.starts_with("//") {
            return Url::parse(&format!("{}:{}", self.scheme, reference));
        }

        if let Some(frag) = reference.strip_prefix('#') {
            let mut out = self.clone();
            out.fragment = Some(frag.to_string());
            return Some(out);
        }

        if let Some(query) = reference.strip_prefix('?') {
            let mut out = self.clone();
            out.query = Some(query.to_string());
            out.fragment = None;
            return Some(out);
        }

        let (rel_path, query, fragment) = split_path_query_fragment(reference);
        let path = if rel_path.starts_with('/') {
            normalize_path(&rel_path)
        } else {
            normalize_path(&format!("{}{}", self.directory(), rel_path))
        };
        Some(Url {
            scheme: self.scheme.clone(),
            host: self.host.clone(),
            port: self.port,
            path,
            query,
            fragment,
        })
    }

    /// The parent directory of this URL, for the `..` command.
    ///
    /// Strips the last path segment, keeps a trailing slash, and drops
    /// any query and fragment. Returns `None` at the host root, where
    /// there is nothing further up.
    pub fn parent(&self) -> Option<Url> {
        if self.path == "/" {
            return None;
        }
        let mut segments: Vec<&str> = self
            .path
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .collect();
        segments.pop();
        let path = if segments.is_empty() {
            "/".to_string()
        } else {
            format!("/{}/", segments.join("/"))
        };
        Some(Url {
            scheme: self.scheme.clone(),
            host: self.host.clone(),
            port: self.port,
            path,
            query: None,
            fragment: None,
        })
    }

    /// The directory portion of the path (up to and including the last
    /// `/`).
    pub fn directory(&self) -> &str {
        match self.path.rfind('/') {
            Some(i) => &self.path[..=i],
            None => "/",
        }
    }

    /// The origin (`scheme://host[:port]`).
    pub fn origin(&self) -> String {
        let mut s = format!("{}://{}", self.scheme, self.host);
        if let Some(port) = self.port {
            s.push_str(&format!(":{port}"));
        }
        s
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }
        write!(f, "{}", self.path)?;
        if let Some(ref q) = self.query {
            write!(f, "?{q}")?;
        }
        if let Some(ref frag) = self.fragment {
            write!(f, "#{frag}")?;
        }
        Ok(())
    }
}

/// Split a path string into `(path, query, fragment)`.
fn split_path_query_fragment(s: &str) -> (String, Option<String>, Option<String>) {
    let (s, fragment) = match s.find('#') {
        Some(i) => (&s[..i], Some(s[i + 1..].to_string())),
        None => (s, None),
    };
    let (path, query) = match s.find('?') {
        Some(i) => (s[..i].to_string(), Some(s[i + 1..].to_string())),
        None => (s.to_string(), None),
    };
    (path, query, fragment)
}

/// Normalize an absolute path, collapsing `.` and `..` segments.
///
/// A trailing slash (or trailing `.`/`..` segment) is preserved as a
/// trailing slash, matching how directory URLs round-trip.
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {},
            ".." => {
                segments.pop();
            },
            s => segments.push(s),
        }
    }
    let trailing_dir = path.ends_with('/') || path.ends_with("/.") || path.ends_with("/..");
    if segments.is_empty() {
        "/".to_string()
    } else if trailing_dir {
        format!("/{}/", segments.join("/"))
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// Percent-encode a search query for use in a URL query string.
///
/// Unreserved characters (RFC 3986 §2.3) pass through; everything else,
/// space and `+` included, is `%XX`-encoded.
pub fn query_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            },
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}
