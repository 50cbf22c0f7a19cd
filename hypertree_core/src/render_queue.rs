// Copyright 2026 the Hypertree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Single-writer, multi-reader stream of graph elements for one generation.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::graph::{LinkIndex, NodeIndex};

/// A reference to one transformed graph element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Element {
    /// A node whose display coordinates are current.
    Node(NodeIndex),
    /// A spanning-tree link.
    TreeLink(LinkIndex),
    /// A non-tree link.
    NontreeLink(LinkIndex),
}

#[derive(Debug)]
struct Inner {
    elements: Vec<Element>,
    complete: bool,
}

/// Append-only element buffer shared between the transformer and renderers.
///
/// Within a generation the element count only grows and readers observe
/// elements in the order they were added. [`clear`](Self::clear) starts a new
/// generation.
#[derive(Debug)]
pub struct RenderQueue {
    capacity: usize,
    inner: Mutex<Inner>,
    changed: Condvar,
}

impl RenderQueue {
    /// Creates a queue holding at most `capacity` elements per generation.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(Inner {
                elements: Vec::with_capacity(capacity),
                complete: false,
            }),
            changed: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the element at `index`, blocking until it has been added.
    ///
    /// Returns `None` once the generation has ended without reaching `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Element> {
        let mut inner = self.lock();
        loop {
            if let Some(e) = inner.elements.get(index) {
                return Some(*e);
            }
            if inner.complete {
                return None;
            }
            inner = self
                .changed
                .wait(inner)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Returns the element at `index` if it has already been added.
    #[must_use]
    pub fn try_get(&self, index: usize) -> Option<Element> {
        self.lock().elements.get(index).copied()
    }

    /// Maximum number of elements per generation.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of elements added in the current generation.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().elements.len()
    }

    /// Whether no elements have been added in the current generation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().elements.is_empty()
    }

    /// Whether the producer has ended the current generation.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.lock().complete
    }

    /// Appends a batch and wakes blocked readers.
    ///
    /// # Panics
    ///
    /// Panics if the batch would exceed the queue capacity.
    pub fn add(&self, batch: &[Element]) {
        if batch.is_empty() {
            return;
        }
        let mut inner = self.lock();
        assert!(
            inner.elements.len() + batch.len() <= self.capacity,
            "render queue overflow: {} + {} > {}",
            inner.elements.len(),
            batch.len(),
            self.capacity
        );
        inner.elements.extend_from_slice(batch);
        drop(inner);
        self.changed.notify_all();
    }

    /// Starts a new, empty generation and wakes blocked readers.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.elements.clear();
        inner.complete = false;
        drop(inner);
        self.changed.notify_all();
    }

    /// Marks the current generation complete and wakes blocked readers.
    pub fn end(&self) {
        self.lock().complete = true;
        self.changed.notify_all();
    }
}
