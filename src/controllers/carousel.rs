// src/controllers/carousel.rs
use crate::errors::ClientError;

/// An ordered list with a wrap-around cursor. Navigation on an empty list is a
/// no-op; the cursor is always `< len` whenever the list is non-empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Carousel<T> {
    items: Vec<T>,
    index: usize,
}

impl<T> Default for Carousel<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: 0,
        }
    }
}

impl<T> Carousel<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items, index: 0 }
    }

    pub fn starting_at(items: Vec<T>, index: usize) -> Result<Self, ClientError> {
        let mut carousel = Self::new(items);
        carousel.jump_to(index)?;
        Ok(carousel)
    }

    pub fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.index = (self.index + 1) % self.items.len();
    }

    pub fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.index = if self.index == 0 {
            self.items.len() - 1
        } else {
            self.index - 1
        };
    }

    pub fn jump_to(&mut self, index: usize) -> Result<(), ClientError> {
        if index >= self.items.len() {
            return Err(ClientError::InvalidIndex {
                index,
                len: self.items.len(),
            });
        }
        self.index = index;
        Ok(())
    }

    /// Swaps in a fresh list, keeping the cursor where it was when it still fits.
    pub fn replace(&mut self, items: Vec<T>) {
        self.items = items;
        if self.index >= self.items.len() {
            self.index = self.items.len().saturating_sub(1);
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.index = 0;
    }

    pub fn current(&self) -> Option<&T> {
        self.items.get(self.index)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// "3 / 7" position label, `None` when empty.
    pub fn position_label(&self) -> Option<String> {
        if self.items.is_empty() {
            None
        } else {
            Some(format!("{} / {}", self.index + 1, self.items.len()))
        }
    }
}
