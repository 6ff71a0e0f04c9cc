//! Recency List Module
//!
//! Doubly-linked list of cache entries stored in a slot arena.
//!
//! Nodes live in a `Vec` and link to each other through `SlotId` indices
//! instead of pointers. Freed slots are recycled through a free list, so a
//! `SlotId` stays valid for as long as its node is in the list.
//!
//! ```text
//!   head (most recent)                      tail (least recent)
//!     │                                          │
//!     ▼                                          ▼
//!   [slot 2] ◄──► [slot 0] ◄──► [slot 3] ◄──► [slot 1]
//! ```

// == Slot Handle ==
/// Stable handle to a node in a [`RecencyList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct SlotId(usize);

#[derive(Debug)]
struct Node<T> {
    value: T,
    prev: Option<SlotId>,
    next: Option<SlotId>,
}

// == Recency List ==
/// Tracks access order for LRU eviction.
///
/// - Front = Most recently used
/// - Back = Least recently used
///
/// Every operation except [`RecencyList::drain`] and iteration is O(1).
#[derive(Debug)]
pub(crate) struct RecencyList<T> {
    slots: Vec<Option<Node<T>>>,
    free: Vec<usize>,
    head: Option<SlotId>,
    tail: Option<SlotId>,
    len: usize,
}

impl<T> Default for RecencyList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RecencyList<T> {
    // == Constructor ==
    /// Creates a new empty list.
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    // == Push Front ==
    /// Inserts a value at the most recently used position.
    pub(crate) fn push_front(&mut self, value: T) -> SlotId {
        let node = Node {
            value,
            prev: None,
            next: self.head,
        };

        let id = match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(node);
                SlotId(index)
            }
            None => {
                self.slots.push(Some(node));
                SlotId(self.slots.len() - 1)
            }
        };

        match self.head {
            Some(old_head) => self.node_mut(old_head).prev = Some(id),
            None => self.tail = Some(id),
        }
        self.head = Some(id);
        self.len += 1;
        id
    }

    // == Move To Front ==
    /// Marks a node as most recently used. Stale handles are ignored.
    pub(crate) fn move_to_front(&mut self, id: SlotId) {
        if self.head == Some(id) || !self.contains(id) {
            return;
        }

        self.unlink(id);
        let old_head = self.head;
        {
            let node = self.node_mut(id);
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(old_head) => self.node_mut(old_head).prev = Some(id),
            None => self.tail = Some(id),
        }
        self.head = Some(id);
    }

    // == Remove ==
    /// Unlinks a node and returns its value, or None for a stale handle.
    pub(crate) fn remove(&mut self, id: SlotId) -> Option<T> {
        if !self.contains(id) {
            return None;
        }

        self.unlink(id);
        let node = self.slots[id.0].take()?;
        self.free.push(id.0);
        self.len -= 1;
        Some(node.value)
    }

    // == Back ==
    /// Returns the handle of the least recently used node.
    pub(crate) fn back(&self) -> Option<SlotId> {
        self.tail
    }

    // == Accessors ==
    pub(crate) fn get(&self, id: SlotId) -> Option<&T> {
        self.slots
            .get(id.0)
            .and_then(Option::as_ref)
            .map(|node| &node.value)
    }

    pub(crate) fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.slots
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .map(|node| &mut node.value)
    }

    /// Checks if a handle points at a live node.
    pub(crate) fn contains(&self, id: SlotId) -> bool {
        matches!(self.slots.get(id.0), Some(Some(_)))
    }

    // == Length ==
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    // == Iteration ==
    /// Iterates values from most to least recently used.
    pub(crate) fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    /// Collects the handles of every node whose value matches `predicate`,
    /// most recently used first.
    pub(crate) fn find_all<F>(&self, mut predicate: F) -> Vec<SlotId>
    where
        F: FnMut(&T) -> bool,
    {
        let mut found = Vec::new();
        let mut cursor = self.head;
        while let Some(id) = cursor {
            let node = self.node(id);
            if predicate(&node.value) {
                found.push(id);
            }
            cursor = node.next;
        }
        found
    }

    // == Drain ==
    /// Empties the list, returning all values from most to least recently used.
    pub(crate) fn drain(&mut self) -> Vec<T> {
        let mut old = std::mem::take(self);
        let mut values = Vec::with_capacity(old.len);
        while let Some(head) = old.head {
            old.head = old.node(head).next;
            if let Some(node) = old.slots[head.0].take() {
                values.push(node.value);
            }
        }
        values
    }

    // == Internal Helpers ==
    fn unlink(&mut self, id: SlotId) {
        let (prev, next) = {
            let node = self.node(id);
            (node.prev, node.next)
        };

        match prev {
            Some(prev) => self.node_mut(prev).next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.node_mut(next).prev = prev,
            None => self.tail = prev,
        }
    }

    // Linked handles always point at occupied slots.
    fn node(&self, id: SlotId) -> &Node<T> {
        match &self.slots[id.0] {
            Some(node) => node,
            None => unreachable!("recency list link points at a free slot"),
        }
    }

    fn node_mut(&mut self, id: SlotId) -> &mut Node<T> {
        match &mut self.slots[id.0] {
            Some(node) => node,
            None => unreachable!("recency list link points at a free slot"),
        }
    }
}

// == Iterator ==
/// Front-to-back iterator over a [`RecencyList`].
pub(crate) struct Iter<'a, T> {
    list: &'a RecencyList<T>,
    cursor: Option<SlotId>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        let node = self.list.node(id);
        self.cursor = node.next;
        Some(&node.value)
    }
}
