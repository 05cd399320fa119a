//! Per-tab visited-URL history with a back/forward cursor.

use lantern_types::{LanternError, Result};

/// Ordered list of visited URLs with a movable cursor.
///
/// The cursor is `None` on a fresh blank tab: the tab is showing the
/// new-tab template, which is not itself a history entry, so there is
/// no valid back-entry yet. The first navigation appends entry 0 and
/// points the cursor at it.
///
/// Appending while the cursor is not at the end discards the forward
/// branch first (classic browser semantics).
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<String>,
    pos: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new navigation target and move the cursor to it.
    pub fn append(&mut self, url: impl Into<String>) {
        let keep = self.pos.map_or(0, |p| p + 1);
        self.entries.truncate(keep);
        self.entries.push(url.into());
        self.pos = Some(self.entries.len() - 1);
    }

    /// Move the cursor back one entry and return it.
    pub fn back(&mut self) -> Result<&str> {
        match self.pos {
            Some(p) if p >= 1 => {
                self.pos = Some(p - 1);
                Ok(&self.entries[p - 1])
            },
            _ => Err(LanternError::NoHistory),
        }
    }

    /// Move the cursor forward one entry and return it.
    pub fn forward(&mut self) -> Result<&str> {
        let next = self.pos.map_or(0, |p| p + 1);
        if next < self.entries.len() {
            self.pos = Some(next);
            Ok(&self.entries[next])
        } else {
            Err(LanternError::NoHistory)
        }
    }

    /// The entry under the cursor.
    pub fn current(&self) -> Result<&str> {
        match self.pos {
            Some(p) => Ok(&self.entries[p]),
            None => Err(LanternError::Empty),
        }
    }

    /// Cursor position, `None` meaning "before the first entry".
    pub fn position(&self) -> Option<usize> {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}
