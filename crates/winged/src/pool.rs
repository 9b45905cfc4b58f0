//! Slot-addressed element storage with free-list reuse.

use std::collections::{BTreeSet, HashMap};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

use crate::types::{Identifier, SlotId, WingedError};

/// Anything stored in a [`Pool`] carries an identifier
pub trait Element {
    fn identifier(&self) -> Identifier;
}

/// Pooled storage.
///
/// Deleted slots go to a free list and the smallest free slot is reused
/// first, so a fresh mesh hands out slots `0, 1, 2, ...` in insertion order.
#[derive(Debug, Clone)]
pub struct Pool<I, T> {
    slots: Vec<Option<T>>,
    free: BTreeSet<u32>,
    lookup: HashMap<Identifier, u32>,
    _id: PhantomData<fn() -> I>,
}

impl<I: SlotId, T: Element> Default for Pool<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: SlotId, T: Element> Pool<I, T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: BTreeSet::new(),
            lookup: HashMap::new(),
            _id: PhantomData,
        }
    }

    /// Slot the next [`Pool::insert`] will use
    pub fn next_slot(&self) -> I {
        I::from_slot(
            self.free
                .first()
                .copied()
                .unwrap_or(self.slots.len() as u32),
        )
    }

    /// Store an element built from the slot it will occupy
    pub fn insert_with(&mut self, build: impl FnOnce(I) -> T) -> I {
        let id = self.next_slot();
        let element = build(id);
        self.lookup.insert(element.identifier(), id.slot());
        if self.free.remove(&id.slot()) {
            self.slots[id.index()] = Some(element);
        } else {
            self.slots.push(Some(element));
        }
        id
    }

    pub fn insert(&mut self, element: T) -> I {
        self.insert_with(|_| element)
    }

    /// Store an element at a specific slot, growing the pool if needed
    pub fn insert_at(&mut self, id: I, element: T) -> Result<(), WingedError> {
        let slot = id.slot();
        if self.contains(id) {
            return Err(WingedError::SlotOccupied {
                kind: I::KIND,
                slot,
            });
        }
        while self.slots.len() <= id.index() {
            self.free.insert(self.slots.len() as u32);
            self.slots.push(None);
        }
        self.free.remove(&slot);
        self.lookup.insert(element.identifier(), slot);
        self.slots[id.index()] = Some(element);
        Ok(())
    }

    pub fn remove(&mut self, id: I) -> Option<T> {
        let element = self.slots.get_mut(id.index())?.take()?;
        self.lookup.remove(&element.identifier());
        self.free.insert(id.slot());
        Some(element)
    }

    pub fn get(&self, id: I) -> Option<&T> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: I) -> Option<&mut T> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: I) -> bool {
        self.get(id).is_some()
    }

    /// Slot of the live element with this identifier
    pub fn resolve(&self, identifier: Identifier) -> Option<I> {
        self.lookup.get(&identifier).map(|&slot| I::from_slot(slot))
    }

    /// Number of live elements
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of slots, live or free
    pub fn num_slots(&self) -> usize {
        self.slots.len()
    }

    pub fn free_slots(&self) -> impl Iterator<Item = I> + '_ {
        self.free.iter().map(|&slot| I::from_slot(slot))
    }

    pub fn ids(&self) -> impl Iterator<Item = I> + '_ {
        self.iter().map(|(id, _)| id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, element)| element.as_ref().map(|e| (I::from_slot(slot as u32), e)))
    }

    /// Some live element, the one with the smallest slot
    pub fn first(&self) -> Option<I> {
        self.ids().next()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.lookup.clear();
    }
}

impl<I: SlotId, T: Element> Index<I> for Pool<I, T> {
    type Output = T;

    /// # Panics
    /// If the slot is free. Holding a dead handle is a logic error.
    fn index(&self, id: I) -> &T {
        match self.get(id) {
            Some(element) => element,
            None => panic!("access to dead {} slot {}", I::KIND, id.slot()),
        }
    }
}

impl<I: SlotId, T: Element> IndexMut<I> for Pool<I, T> {
    fn index_mut(&mut self, id: I) -> &mut T {
        match self.get_mut(id) {
            Some(element) => element,
            None => panic!("access to dead {} slot {}", I::KIND, id.slot()),
        }
    }
}
