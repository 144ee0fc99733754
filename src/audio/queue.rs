//! The engine's play queue.
//!
//! A flat list of items with a cursor. Movement never wraps: stepping past
//! either end leaves the cursor where it was.

use super::types::MediaItem;

#[derive(Debug, Default)]
pub(crate) struct ItemQueue {
    items: Vec<MediaItem>,
    index: Option<usize>,
}

impl ItemQueue {
    pub(crate) fn current(&self) -> Option<&MediaItem> {
        self.index.and_then(|i| self.items.get(i))
    }

    pub(crate) fn index(&self) -> Option<usize> {
        self.index
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    /// Append `items`; the cursor lands on the first item of a previously empty queue.
    pub(crate) fn extend(&mut self, items: Vec<MediaItem>) {
        self.items.extend(items);
        if self.index.is_none() && !self.items.is_empty() {
            self.index = Some(0);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
        self.index = None;
    }

    /// Move the cursor to `index`. Out-of-range indices are refused.
    pub(crate) fn seek_to(&mut self, index: usize) -> bool {
        if index < self.items.len() {
            self.index = Some(index);
            true
        } else {
            false
        }
    }

    /// Step to the following item, returning its index, or `None` at the end.
    pub(crate) fn advance(&mut self) -> Option<usize> {
        let next = self.index? + 1;
        self.seek_to(next).then_some(next)
    }
}
