//! The filtered sequence being browsed and its cursor.

use crate::media::MediaId;

/// Ordered ids produced by the current filter, plus the cursor.
///
/// The cursor is `None` exactly when the sequence is empty; otherwise it
/// always points at a valid position. A playlist is never patched in place:
/// a filter change builds a new one through [`PlaylistState::new`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaylistState {
    items: Vec<MediaId>,
    cursor: Option<usize>,
}

impl PlaylistState {
    /// Create a playlist with the cursor at the first item.
    #[must_use]
    pub fn new(items: Vec<MediaId>) -> Self {
        let cursor = if items.is_empty() { None } else { Some(0) };
        Self { items, cursor }
    }

    #[must_use]
    pub const fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn items(&self) -> &[MediaId] {
        &self.items
    }

    /// Id under the cursor.
    #[must_use]
    pub fn current(&self) -> Option<&MediaId> {
        self.cursor.and_then(|i| self.items.get(i))
    }

    /// 1-indexed position and total, for the status line.
    #[must_use]
    pub fn position(&self) -> Option<(usize, usize)> {
        self.cursor.map(|i| (i + 1, self.items.len()))
    }

    /// Move forward one item. Returns `false` at the end (no wraparound).
    pub fn advance(&mut self) -> bool {
        match self.cursor {
            Some(i) if i + 1 < self.items.len() => {
                self.cursor = Some(i + 1);
                true
            }
            _ => false,
        }
    }

    /// Move back one item. Returns `false` at the start (no wraparound).
    pub fn retreat(&mut self) -> bool {
        match self.cursor {
            Some(i) if i > 0 => {
                self.cursor = Some(i - 1);
                true
            }
            _ => false,
        }
    }
}
