//! # Entity Management
//!
//! Entities are packed 32-bit handles:
//! - An alive flag
//! - A small generation counter for detecting stale references
//! - An id indexing the entity table
//!
//! The table threads its free list through dead slots: a dead slot's id field
//! holds the id of the next free slot.

use std::fmt;

use bytemuck::{Pod, Zeroable};

use crate::error::{EcsError, EcsResult};
use crate::memory::{Arena, ArenaSlice};

const GENERATION_SHIFT: u32 = 1;
const ID_SHIFT: u32 = 4;
const ALIVE_MASK: u32 = 1;
const GENERATION_MASK: u32 = (1 << (ID_SHIFT - GENERATION_SHIFT)) - 1;

/// Number of distinct generations. Generations wrap modulo this value.
pub const GENERATION_COUNT: u32 = GENERATION_MASK + 1;

/// Largest id an entity handle can carry.
pub const MAX_ENTITY_ID: u32 = u32::MAX >> ID_SHIFT;

/// Handle to an entity.
///
/// Bit layout, least significant first:
///
/// ```text
/// | alive: 1 | generation: 3 | id: 28 |
/// ```
///
/// Id 0 is the null entity. Ordering, equality and hashing are those of the
/// packed `u32`, so handles sort by id first.
///
/// The generation only has eight values. A handle kept across eight
/// destroy/create cycles of the same slot compares valid again; that is the
/// bounded guarantee this layout gives.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct EntityHandle(u32);

impl EntityHandle {
    /// The null handle. Never valid.
    pub const NULL: Self = Self(0);

    /// Builds a handle from its parts. Out-of-range values are masked.
    #[inline]
    #[must_use]
    pub const fn from_parts(alive: bool, generation: u32, id: u32) -> Self {
        Self(
            (alive as u32)
                | ((generation & GENERATION_MASK) << GENERATION_SHIFT)
                | ((id & MAX_ENTITY_ID) << ID_SHIFT),
        )
    }

    /// Reinterprets a packed `u32` as a handle.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the packed representation.
    #[inline]
    #[must_use]
    pub const fn to_bits(self) -> u32 {
        self.0
    }

    /// Returns the id portion.
    #[inline]
    #[must_use]
    pub const fn id(self) -> u32 {
        self.0 >> ID_SHIFT
    }

    /// Returns the generation portion.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> GENERATION_SHIFT) & GENERATION_MASK
    }

    /// Returns the alive flag.
    #[inline]
    #[must_use]
    pub const fn is_alive(self) -> bool {
        self.0 & ALIVE_MASK != 0
    }

    /// Checks if this handle has the null id.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.id() == 0
    }

    /// Same handle, dead, one generation later.
    #[inline]
    const fn retired(self, next_free: u32) -> Self {
        Self::from_parts(false, self.generation().wrapping_add(1), next_free)
    }
}

impl fmt::Debug for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityHandle")
            .field("alive", &self.is_alive())
            .field("generation", &self.generation())
            .field("id", &self.id())
            .finish()
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.id(), self.generation())?;
        if !self.is_alive() {
            f.write_str(" (dead)")?;
        }
        Ok(())
    }
}

/// Fixed-capacity entity slots with an intrusive free list.
///
/// Slot 0 is never handed out. Ids are recycled through the free list first;
/// when it is empty they are bumped up to `max_entities`.
#[derive(Debug)]
pub(crate) struct EntityTable {
    /// `max_entities + 1` slots, allocated zeroed.
    slots: ArenaSlice<EntityHandle>,
    /// Maximum capacity.
    max_entities: u32,
    /// Head of the free list, 0 when empty.
    next_free: u32,
    /// Highest id ever issued.
    high_water: u32,
    /// Number of currently alive entities.
    live: u32,
}

impl EntityTable {
    /// Allocates the table from the arena.
    pub(crate) fn new(arena: &mut Arena<'_>, max_entities: u32) -> EcsResult<Self> {
        if max_entities == 0 {
            return Err(EcsError::ZeroCapacity);
        }
        if max_entities > MAX_ENTITY_ID {
            return Err(EcsError::EntityCapacityExceeded { max: MAX_ENTITY_ID });
        }

        let slots = arena.alloc_zeroed::<EntityHandle>(max_entities as usize + 1)?;
        Ok(Self {
            slots,
            max_entities,
            next_free: 0,
            high_water: 0,
            live: 0,
        })
    }

    #[inline]
    pub(crate) const fn max_entities(&self) -> u32 {
        self.max_entities
    }

    #[inline]
    pub(crate) const fn live(&self) -> u32 {
        self.live
    }

    /// Stored slot for `id`, or `None` for ids outside the table.
    #[inline]
    fn stored(&self, arena: &Arena<'_>, id: u32) -> Option<EntityHandle> {
        if id == 0 || id > self.max_entities {
            return None;
        }
        Some(arena.get(self.slots)[id as usize])
    }

    /// Alive flag of the slot the handle points at. Ignores the generation.
    #[inline]
    pub(crate) fn is_alive(&self, arena: &Arena<'_>, handle: EntityHandle) -> bool {
        self.stored(arena, handle.id())
            .is_some_and(EntityHandle::is_alive)
    }

    /// Alive and of the current generation.
    #[inline]
    pub(crate) fn is_valid(&self, arena: &Arena<'_>, handle: EntityHandle) -> bool {
        self.stored(arena, handle.id())
            .is_some_and(|slot| slot.is_alive() && slot.generation() == handle.generation())
    }

    /// Issues a new entity.
    pub(crate) fn create(&mut self, arena: &mut Arena<'_>) -> EcsResult<EntityHandle> {
        let id = if self.next_free != 0 {
            let id = self.next_free;
            self.next_free = arena.get(self.slots)[id as usize].id();
            id
        } else if self.high_water < self.max_entities {
            self.high_water += 1;
            self.high_water
        } else {
            tracing::error!(max = self.max_entities, "entity table exhausted");
            return Err(EcsError::EntityCapacityExceeded {
                max: self.max_entities,
            });
        };

        let slot = &mut arena.get_mut(self.slots)[id as usize];
        *slot = EntityHandle::from_parts(true, slot.generation(), id);
        self.live += 1;
        Ok(*slot)
    }

    /// Kills the slot, bumps its generation and pushes it on the free list.
    ///
    /// The handle must be valid.
    pub(crate) fn destroy(&mut self, arena: &mut Arena<'_>, handle: EntityHandle) {
        debug_assert!(self.is_valid(arena, handle));
        let id = handle.id();
        let slot = &mut arena.get_mut(self.slots)[id as usize];
        *slot = slot.retired(self.next_free);
        self.next_free = id;
        self.live -= 1;
    }
}
