//! Lookahead over iterators.

use std::iter::FusedIterator;

/// Yields `(item, is_last)`, pulling one element ahead of the consumer.
pub struct WithLast<I: Iterator> {
    inner: I,
    peeked: Option<I::Item>,
    started: bool,
}

impl<I: Iterator> WithLast<I> {
    pub fn new(inner: I) -> Self {
        Self { inner, peeked: None, started: false }
    }
}

impl<I: Iterator> Iterator for WithLast<I> {
    type Item = (I::Item, bool);

    fn next(&mut self) -> Option<Self::Item> {
        // Nothing is pulled from the source before the first call.
        if !self.started {
            self.started = true;
            self.peeked = self.inner.next();
        }
        let current = self.peeked.take()?;
        self.peeked = self.inner.next();
        Some((current, self.peeked.is_none()))
    }
}

impl<I: Iterator> FusedIterator for WithLast<I> {}

pub trait WithLastExt: Iterator + Sized {
    fn with_last(self) -> WithLast<Self> {
        WithLast::new(self)
    }
}

impl<I: Iterator> WithLastExt for I {}
