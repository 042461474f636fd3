//! Free-list slot arena.
//!
//! Hands out small, stable integer handles for entries that can be removed
//! again (scope tables, IR scope symbols). A freed slot is recycled before
//! the backing store grows, and the lowest freed index is always reused
//! first so handle values stay compact and deterministic.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;
use std::marker::PhantomData;

/// A typed handle into a [`SlotArena`].
pub trait ArenaKey: Copy + Eq {
    fn from_index(index: u32) -> Self;
    fn index(self) -> u32;
}

/// Declare a `u32` newtype usable as an [`ArenaKey`].
#[macro_export]
macro_rules! arena_key {
    ($(#[$meta:meta])* $vis:vis struct $name:ident;) => {
        $(#[$meta])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis struct $name(pub u32);

        impl $crate::arena::ArenaKey for $name {
            #[inline]
            fn from_index(index: u32) -> Self {
                Self(index)
            }

            #[inline]
            fn index(self) -> u32 {
                self.0
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

/// Growable backing store indexed by integer handle, plus a min-heap of
/// freed indices consulted before growing.
pub struct SlotArena<K, T> {
    slots: Vec<Option<T>>,
    free: BinaryHeap<Reverse<u32>>,
    live: usize,
    _key: PhantomData<fn() -> K>,
}

impl<K: ArenaKey, T> SlotArena<K, T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: BinaryHeap::new(),
            live: 0,
            _key: PhantomData,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: BinaryHeap::new(),
            live: 0,
            _key: PhantomData,
        }
    }

    /// Store a value, reusing the lowest freed slot if there is one.
    pub fn alloc(&mut self, value: T) -> K {
        self.live += 1;
        if let Some(Reverse(index)) = self.free.pop() {
            self.slots[index as usize] = Some(value);
            return K::from_index(index);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Some(value));
        K::from_index(index)
    }

    /// Remove a value, making its slot available for reuse.
    pub fn remove(&mut self, key: K) -> Option<T> {
        let slot = self.slots.get_mut(key.index() as usize)?;
        let value = slot.take()?;
        self.free.push(Reverse(key.index()));
        self.live -= 1;
        Some(value)
    }

    #[inline]
    pub fn get(&self, key: K) -> Option<&T> {
        self.slots.get(key.index() as usize).and_then(Option::as_ref)
    }

    #[inline]
    pub fn get_mut(&mut self, key: K) -> Option<&mut T> {
        self.slots.get_mut(key.index() as usize).and_then(Option::as_mut)
    }

    #[inline]
    pub fn contains(&self, key: K) -> bool {
        self.get(key).is_some()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Iterate live entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|v| (K::from_index(i as u32), v)))
    }
}

impl<K: ArenaKey, T> Default for SlotArena<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ArenaKey, T: Clone> Clone for SlotArena<K, T> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            free: self.free.clone(),
            live: self.live,
            _key: PhantomData,
        }
    }
}

impl<K, T> fmt::Debug for SlotArena<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotArena")
            .field("slots", &self.slots.len())
            .field("free", &self.free.len())
            .field("live", &self.live)
            .finish()
    }
}
