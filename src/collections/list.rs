//! Singly linked list over a slot arena.
//!
//! Nodes live in a `Vec` of slots and link to each other by slot index, so
//! the list owns every node without raw pointers. Removed slots go onto a
//! free chain and are reused by later inserts. Every insert reserves its
//! slot with `try_reserve`, which turns allocation failure into an error and
//! leaves the list unchanged.
//!
//! Cursor-based mutation goes through [`CursorMut`], which borrows the list
//! mutably: no other handle can restructure the list while a cursor is live.

use std::fmt;
use std::iter::FusedIterator;

use crate::error::Result;

enum Slot<T> {
    Occupied { value: T, next: Option<usize> },
    Vacant { next_free: Option<usize> },
}

/// Singly linked sequence with O(1) insertion at both ends and O(1)
/// removal at the head.
pub struct List<T> {
    slots: Vec<Slot<T>>,
    head: Option<usize>,
    tail: Option<usize>,
    free: Option<usize>,
    len: usize,
}

impl<T> List<T> {
    /// Create an empty list
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            head: None,
            tail: None,
            free: None,
            len: 0,
        }
    }

    /// Create an empty list with room for `capacity` nodes.
    ///
    /// Inserts never allocate until that many nodes are live.
    pub fn try_with_capacity(capacity: usize) -> Result<Self> {
        let mut list = Self::new();
        list.slots.try_reserve_exact(capacity)?;
        Ok(list)
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Insert `value` at the head
    pub fn insert_first(&mut self, value: T) -> Result<()> {
        let idx = self.alloc(value, self.head)?;
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
        self.len += 1;
        Ok(())
    }

    /// Insert `value` at the tail
    pub fn insert_last(&mut self, value: T) -> Result<()> {
        let idx = self.alloc(value, None)?;
        match self.tail {
            Some(tail) => self.set_next(tail, Some(idx)),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
        self.len += 1;
        Ok(())
    }

    /// Remove and return the head element, `None` when empty
    pub fn remove_first(&mut self) -> Option<T> {
        let head = self.head?;
        let (value, next) = self.release(head);
        self.head = next;
        if next.is_none() {
            self.tail = None;
        }
        self.len -= 1;
        Some(value)
    }

    pub fn peek_first(&self) -> Option<&T> {
        self.head.map(|idx| self.value(idx))
    }

    pub fn peek_last(&self) -> Option<&T> {
        self.tail.map(|idx| self.value(idx))
    }

    /// Borrowing iterator from head to tail
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            next: self.head,
            remaining: self.len,
        }
    }

    /// Cursor positioned at the first element
    pub fn cursor_mut(&mut self) -> CursorMut<'_, T> {
        let current = self.head;
        CursorMut {
            list: self,
            prev: None,
            current,
        }
    }

    /// First element matching `pred`, mutably
    pub fn find_mut(&mut self, mut pred: impl FnMut(&T) -> bool) -> Option<&mut T> {
        let mut cursor = self.head;
        let mut found = None;
        while let Some(idx) = cursor {
            if pred(self.value(idx)) {
                found = Some(idx);
                break;
            }
            cursor = self.next(idx);
        }
        match &mut self.slots[found?] {
            Slot::Occupied { value, .. } => Some(value),
            Slot::Vacant { .. } => None,
        }
    }

    /// Destroy the list, handing every element to `destructor` in list order
    pub fn drain_with(mut self, mut destructor: impl FnMut(T)) {
        while let Some(value) = self.remove_first() {
            destructor(value);
        }
    }

    fn alloc(&mut self, value: T, next: Option<usize>) -> Result<usize> {
        let slot = Slot::Occupied { value, next };
        match self.free {
            Some(idx) => {
                if let Slot::Vacant { next_free } = self.slots[idx] {
                    self.free = next_free;
                }
                self.slots[idx] = slot;
                Ok(idx)
            }
            None => {
                self.slots.try_reserve(1)?;
                self.slots.push(slot);
                Ok(self.slots.len() - 1)
            }
        }
    }

    fn release(&mut self, idx: usize) -> (T, Option<usize>) {
        let vacant = Slot::Vacant {
            next_free: self.free,
        };
        match std::mem::replace(&mut self.slots[idx], vacant) {
            Slot::Occupied { value, next } => {
                self.free = Some(idx);
                (value, next)
            }
            Slot::Vacant { .. } => unreachable!("linked slot {idx} is vacant"),
        }
    }

    fn value(&self, idx: usize) -> &T {
        match &self.slots[idx] {
            Slot::Occupied { value, .. } => value,
            Slot::Vacant { .. } => unreachable!("linked slot {idx} is vacant"),
        }
    }

    fn next(&self, idx: usize) -> Option<usize> {
        match &self.slots[idx] {
            Slot::Occupied { next, .. } => *next,
            Slot::Vacant { .. } => None,
        }
    }

    fn set_next(&mut self, idx: usize, link: Option<usize>) {
        if let Slot::Occupied { next, .. } = &mut self.slots[idx] {
            *next = link;
        }
    }
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for List<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Borrowing iterator over a [`List`]
pub struct Iter<'a, T> {
    list: &'a List<T>,
    next: Option<usize>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.next?;
        match &self.list.slots[idx] {
            Slot::Occupied { value, next } => {
                self.next = *next;
                self.remaining -= 1;
                Some(value)
            }
            Slot::Vacant { .. } => None,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

impl<'a, T> IntoIterator for &'a List<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Consuming iterator over a [`List`]
pub struct IntoIter<T>(List<T>);

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.0.remove_first()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.0.len, Some(self.0.len))
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> IntoIterator for List<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter(self)
    }
}

/// External cursor that can insert and remove at its position.
///
/// The cursor tracks the element before its position, so removal is O(1)
/// and leaves the cursor on the following element.
pub struct CursorMut<'a, T> {
    list: &'a mut List<T>,
    prev: Option<usize>,
    current: Option<usize>,
}

impl<T> CursorMut<'_, T> {
    /// Element under the cursor, `None` past the end
    pub fn current(&self) -> Option<&T> {
        self.current.map(|idx| self.list.value(idx))
    }

    pub fn current_mut(&mut self) -> Option<&mut T> {
        match &mut self.list.slots[self.current?] {
            Slot::Occupied { value, .. } => Some(value),
            Slot::Vacant { .. } => None,
        }
    }

    pub fn is_at_end(&self) -> bool {
        self.current.is_none()
    }

    /// Move to the next element; false when already past the end
    pub fn advance(&mut self) -> bool {
        let Some(idx) = self.current else {
            return false;
        };
        self.prev = Some(idx);
        self.current = self.list.next(idx);
        true
    }

    /// Insert before the cursor's element; the cursor ends up on the new
    /// element. Past the end this appends.
    pub fn insert_before(&mut self, value: T) -> Result<()> {
        let idx = self.list.alloc(value, self.current)?;
        match self.prev {
            Some(prev) => self.list.set_next(prev, Some(idx)),
            None => self.list.head = Some(idx),
        }
        if self.current.is_none() {
            self.list.tail = Some(idx);
        }
        self.current = Some(idx);
        self.list.len += 1;
        Ok(())
    }

    /// Remove the element under the cursor, which then points at the
    /// element that followed it.
    pub fn remove_current(&mut self) -> Option<T> {
        let idx = self.current?;
        let (value, next) = self.list.release(idx);
        match self.prev {
            Some(prev) => self.list.set_next(prev, next),
            None => self.list.head = next,
        }
        if next.is_none() {
            self.list.tail = self.prev;
        }
        self.current = next;
        self.list.len -= 1;
        Some(value)
    }
}
