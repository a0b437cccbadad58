//! Fixed-capacity slot pool with an index free list.
//!
//! All slots are allocated up front. Unused slots are threaded into a free
//! list by index; acquiring pops the head and releasing pushes the slot
//! back. The pool never grows, so running out of slots is reported to the
//! caller instead.

use thiserror::Error;

/// Errors returned by [`Pool`] operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    #[error("pool exhausted")]
    Exhausted,

    #[error("slot {0} released twice")]
    DoubleFree(usize),

    #[error("slot {0} is out of range")]
    InvalidHandle(usize),

    #[error("slot {0} is not in use")]
    Vacant(usize),
}

#[derive(Debug, Clone)]
enum Slot<T> {
    Free { next: Option<u32> },
    Used(T),
}

/// A fixed number of slots holding values of one type.
#[derive(Debug, Clone)]
pub struct Pool<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<u32>,
    free: usize,
}

impl<T> Pool<T> {
    /// Creates a pool with `capacity` free slots.
    pub fn with_capacity(capacity: u32) -> Self {
        let slots = (0..capacity)
            .map(|i| Slot::Free {
                next: (i + 1 < capacity).then_some(i + 1),
            })
            .collect();
        tracing::debug!(
            capacity,
            slot_size = std::mem::size_of::<Slot<T>>(),
            "pool created"
        );
        Pool {
            slots,
            free_head: (capacity > 0).then_some(0),
            free: capacity as usize,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots available for [`Pool::acquire`].
    #[inline]
    pub fn free(&self) -> usize {
        self.free
    }

    #[inline]
    pub fn in_use(&self) -> usize {
        self.capacity() - self.free
    }

    /// Stores `value` in a free slot and returns the slot index.
    pub fn acquire(&mut self, value: T) -> Result<u32, PoolError> {
        let index = self.free_head.ok_or(PoolError::Exhausted)?;
        let slot = &mut self.slots[index as usize];
        let Slot::Free { next } = *slot else {
            // The free list only ever links free slots.
            return Err(PoolError::Exhausted);
        };
        *slot = Slot::Used(value);
        self.free_head = next;
        self.free -= 1;
        Ok(index)
    }

    /// Returns the slot to the free list, handing back its value.
    pub fn release(&mut self, index: u32) -> Result<T, PoolError> {
        let slot = self
            .slots
            .get_mut(index as usize)
            .ok_or(PoolError::InvalidHandle(index as usize))?;
        if matches!(slot, Slot::Free { .. }) {
            return Err(PoolError::DoubleFree(index as usize));
        }
        let Slot::Used(value) = std::mem::replace(
            slot,
            Slot::Free {
                next: self.free_head,
            },
        ) else {
            return Err(PoolError::DoubleFree(index as usize));
        };
        self.free_head = Some(index);
        self.free += 1;
        Ok(value)
    }

    /// Returns the value in a used slot.
    pub fn get(&self, index: u32) -> Result<&T, PoolError> {
        match self.slots.get(index as usize) {
            Some(Slot::Used(value)) => Ok(value),
            Some(Slot::Free { .. }) => Err(PoolError::Vacant(index as usize)),
            None => Err(PoolError::InvalidHandle(index as usize)),
        }
    }

    pub fn get_mut(&mut self, index: u32) -> Result<&mut T, PoolError> {
        match self.slots.get_mut(index as usize) {
            Some(Slot::Used(value)) => Ok(value),
            Some(Slot::Free { .. }) => Err(PoolError::Vacant(index as usize)),
            None => Err(PoolError::InvalidHandle(index as usize)),
        }
    }
}
