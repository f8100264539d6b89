//! Single-scan, in-place rewriting of an ordered sequence.
//!
//! A [`Rewriter`] walks a `Vec` front to back. Each call to
//! [`Rewriter::advance`] checks out a [`Window`] over the next element, and
//! that window is the only handle through which the sequence may be edited.
//! Edits are expressed relative to the window so callers never perform
//! index arithmetic themselves:
//!
//! ```text
//!            start        end
//!              v           v
//! [ a  b  c  | d  (e  f) | g  h ]
//!   prepend -^           ^- append
//!              `- replace -'  truncate drops g, h
//! ```
//!
//! Elements spliced into or around the window are never yielded again by the
//! same scan; the next `advance` always resumes just past the window.

/// Rewriter tracks the current window of a single forward scan.
#[derive(Debug)]
pub struct Rewriter<'a, T> {
    target: &'a mut Vec<T>,
    start: usize,
    end: usize,
}

impl<'a, T> Rewriter<'a, T> {
    pub fn new(target: &'a mut Vec<T>) -> Self {
        Self {
            target,
            start: 0,
            end: 0,
        }
    }

    /// Moves the window onto the element following the current window.
    /// Returns `None` once the scan has reached the end of the sequence, and
    /// keeps returning `None` on every later call.
    pub fn advance(&mut self) -> Option<Window<'_, 'a, T>> {
        if self.end >= self.target.len() {
            return None;
        }

        self.start = self.end;
        self.end += 1;
        Some(Window { cursor: self })
    }
}

/// Window is the checked-out range `[start, end)` of a scan. Every mutation
/// of the underlying sequence goes through a window, which borrows the
/// rewriter until it is dropped.
#[derive(Debug)]
pub struct Window<'r, 'a, T> {
    cursor: &'r mut Rewriter<'a, T>,
}

impl<T> Window<'_, '_, T> {
    /// The index at which the window starts.
    pub fn position(&self) -> usize {
        self.cursor.start
    }

    /// The elements currently covered by the window. Immediately after
    /// `advance` this is exactly the yielded element.
    pub fn items(&self) -> &[T] {
        &self.cursor.target[self.cursor.start..self.cursor.end]
    }

    pub fn items_mut(&mut self) -> &mut [T] {
        &mut self.cursor.target[self.cursor.start..self.cursor.end]
    }

    pub fn len(&self) -> usize {
        self.cursor.end - self.cursor.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inserts `items` immediately before the window. The window grows to
    /// cover them so they are not yielded by the next `advance`.
    pub fn prepend(&mut self, items: impl IntoIterator<Item = T>) {
        let start = self.cursor.start;
        let inserted = self.splice_at(start, items);
        self.cursor.end += inserted;
    }

    /// Inserts `items` immediately after the window, extending the window
    /// over them.
    pub fn append(&mut self, items: impl IntoIterator<Item = T>) {
        let end = self.cursor.end;
        let inserted = self.splice_at(end, items);
        self.cursor.end += inserted;
    }

    /// Replaces everything in the window with `items`.
    pub fn replace(&mut self, items: impl IntoIterator<Item = T>) {
        self.replace_with(|_| items);
    }

    /// Removes the window's contents and hands them to `f` by value, then
    /// places whatever `f` returns in their stead.
    pub fn replace_with<F, I>(&mut self, f: F)
    where
        F: FnOnce(Vec<T>) -> I,
        I: IntoIterator<Item = T>,
    {
        let start = self.cursor.start;
        let removed: Vec<T> = self.cursor.target.drain(start..self.cursor.end).collect();
        let inserted = self.splice_at(start, f(removed));
        self.cursor.end = start + inserted;
    }

    /// Removes the window's contents.
    pub fn remove(&mut self) {
        self.replace(std::iter::empty());
    }

    /// Discards every element after the window.
    pub fn truncate(&mut self) {
        self.cursor.target.truncate(self.cursor.end);
    }

    fn splice_at(&mut self, at: usize, items: impl IntoIterator<Item = T>) -> usize {
        let before = self.cursor.target.len();
        self.cursor.target.splice(at..at, items);
        self.cursor.target.len() - before
    }
}
