//! # Component Containers
//!
//! One container per component type. Each container is a sparse set built
//! from arena chunks:
//!
//! ```text
//! sparse:          entity id -> slot        (chunked by entity id, lazily)
//! dense data:      slot -> component bytes  (chunked by slot, lazily)
//! dense entities:  slot -> owning entity    (parallel to dense data)
//! ```
//!
//! Live slots are always `1..=alive`. Removing a component moves the last
//! live slot into the hole, so iteration never meets a gap. The vacated tail
//! slot goes on a free list threaded through its own component bytes.
//!
//! These are the unchecked primitives behind [`crate::Ecs`]: entity handles
//! are assumed valid and the container initialized unless stated otherwise.

use std::mem::size_of;
use std::ops::Range;

use bytemuck::{Pod, Zeroable};

use super::component::{ComponentHandle, ComponentTypeId, MIN_COMPONENT_SIZE};
use super::entity::EntityHandle;
use crate::config::EcsConfig;
use crate::error::{EcsError, EcsResult};
use crate::memory::{Arena, ArenaSlice};

/// Alignment of every dense data chunk. One cache line.
pub const DENSE_CHUNK_ALIGN: usize = 64;

/// Arena offset of a chunk plus one. Zero means not allocated yet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(transparent)]
struct ChunkRef(u32);

impl ChunkRef {
    const NONE: Self = Self(0);

    #[allow(clippy::cast_possible_truncation)]
    fn new(offset: usize) -> Self {
        // Arena buffers are capped at u32::MAX bytes, so offset + 1 fits.
        Self(offset as u32 + 1)
    }

    fn resolve<T>(self, len: usize) -> Option<ArenaSlice<T>> {
        let offset = self.0.checked_sub(1)?;
        Some(ArenaSlice::from_raw_parts(offset as usize, len))
    }
}

/// State of a component slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotState {
    /// The slot holds the component of `owner`.
    Occupied {
        /// Entity the component belongs to.
        owner: EntityHandle,
    },
    /// The slot is on the free list.
    Vacant {
        /// Next slot on the free list, 0 at the end.
        next_free: ComponentHandle,
    },
}

/// Sizes every container of a world derives its tables from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ContainerLayout {
    pub(crate) max_entities: usize,
    pub(crate) dense_chunk_bytes: usize,
    pub(crate) sparse_chunk_len: usize,
}

impl ContainerLayout {
    pub(crate) fn from_config(config: &EcsConfig) -> Self {
        Self {
            max_entities: config.max_entities as usize,
            dense_chunk_bytes: config.dense_chunk_bytes as usize,
            sparse_chunk_len: config.sparse_chunk_len as usize,
        }
    }
}

/// Storage for a single component type.
///
/// The struct itself only holds sizes, counters and arena handles; all the
/// tables it points at live in the arena.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct ComponentContainer {
    /// Bytes per component, 0 until first use.
    component_size: usize,
    /// Slots per dense chunk.
    chunk_len: usize,
    /// Entity ids per sparse chunk (power of two).
    sparse_chunk_len: usize,
    sparse_shift: u32,
    sparse_mask: usize,
    /// Chunk references for component bytes.
    dense_data: ArenaSlice<ChunkRef>,
    /// Chunk references for owning entities, parallel to `dense_data`.
    dense_entities: ArenaSlice<ChunkRef>,
    /// Chunk references for the entity id -> slot index.
    sparse: ArenaSlice<ChunkRef>,
    /// Number of live components, also the last live slot.
    alive: u32,
    /// Highest slot ever handed out.
    high_water: u32,
    /// Head of the vacant slot list, 0 when empty.
    free_head: ComponentHandle,
}

impl ComponentContainer {
    #[inline]
    pub(crate) const fn is_initialized(&self) -> bool {
        self.component_size != 0
    }

    #[inline]
    pub(crate) const fn component_size(&self) -> usize {
        self.component_size
    }

    #[inline]
    pub(crate) const fn alive_components(&self) -> u32 {
        self.alive
    }

    /// Fixes the component size and allocates the top-level tables.
    ///
    /// Idempotent for the same size.
    pub(crate) fn ensure(
        &mut self,
        arena: &mut Arena<'_>,
        type_id: ComponentTypeId,
        size: usize,
        layout: &ContainerLayout,
    ) -> EcsResult<()> {
        if self.is_initialized() {
            if self.component_size != size {
                return Err(EcsError::ComponentSizeMismatch {
                    type_id,
                    expected: self.component_size,
                    actual: size,
                });
            }
            return Ok(());
        }

        if size < MIN_COMPONENT_SIZE {
            return Err(EcsError::ComponentTooSmall {
                type_id,
                size,
                min: MIN_COMPONENT_SIZE,
            });
        }

        // Slot 0 is reserved, so ids and slots both span 0..=max_entities.
        let span = layout.max_entities + 1;
        let chunk_len = (layout.dense_chunk_bytes / size).max(1);
        let dense_chunks = span.div_ceil(chunk_len);
        let sparse_chunks = span.div_ceil(layout.sparse_chunk_len);

        // One block for all three tables, so a failure allocates nothing.
        let tables = arena.alloc_zeroed::<ChunkRef>(2 * dense_chunks + sparse_chunks)?;
        let stride = dense_chunks * size_of::<ChunkRef>();
        let dense_data = ArenaSlice::from_raw_parts(tables.offset(), dense_chunks);
        let dense_entities = ArenaSlice::from_raw_parts(tables.offset() + stride, dense_chunks);
        let sparse = ArenaSlice::from_raw_parts(tables.offset() + 2 * stride, sparse_chunks);

        *self = Self {
            component_size: size,
            chunk_len,
            sparse_chunk_len: layout.sparse_chunk_len,
            sparse_shift: layout.sparse_chunk_len.trailing_zeros(),
            sparse_mask: layout.sparse_chunk_len - 1,
            dense_data,
            dense_entities,
            sparse,
            alive: 0,
            high_water: 0,
            free_head: 0,
        };

        tracing::debug!(
            type_id,
            size,
            chunk_len,
            dense_chunks,
            sparse_chunks,
            "component container initialized"
        );
        Ok(())
    }

    // =========================================================================
    // Sparse index
    // =========================================================================

    fn sparse_chunk(&self, arena: &Arena<'_>, entity_id: u32) -> Option<ArenaSlice<ComponentHandle>> {
        let index = entity_id as usize >> self.sparse_shift;
        arena.get(self.sparse)[index].resolve(self.sparse_chunk_len)
    }

    fn ensure_sparse_chunk(
        &self,
        arena: &mut Arena<'_>,
        entity_id: u32,
    ) -> EcsResult<ArenaSlice<ComponentHandle>> {
        if let Some(chunk) = self.sparse_chunk(arena, entity_id) {
            return Ok(chunk);
        }
        let chunk = arena.alloc_zeroed::<ComponentHandle>(self.sparse_chunk_len)?;
        let index = entity_id as usize >> self.sparse_shift;
        arena.get_mut(self.sparse)[index] = ChunkRef::new(chunk.offset());
        Ok(chunk)
    }

    /// Slot holding the entity's component, 0 if it has none.
    ///
    /// Safe to call on an uninitialized container.
    #[inline]
    pub(crate) fn slot_of(&self, arena: &Arena<'_>, entity_id: u32) -> ComponentHandle {
        if !self.is_initialized() {
            return 0;
        }
        self.sparse_chunk(arena, entity_id)
            .map_or(0, |chunk| arena.get(chunk)[entity_id as usize & self.sparse_mask])
    }

    fn write_sparse(&self, arena: &mut Arena<'_>, entity_id: u32, slot: ComponentHandle) {
        let chunk = self.sparse_chunk(arena, entity_id);
        debug_assert!(chunk.is_some(), "sparse chunk missing for entity {entity_id}");
        if let Some(chunk) = chunk {
            arena.get_mut(chunk)[entity_id as usize & self.sparse_mask] = slot;
        }
    }

    // =========================================================================
    // Dense arrays
    // =========================================================================

    #[inline]
    fn dense_position(&self, slot: ComponentHandle) -> (usize, usize) {
        let slot = slot as usize;
        (slot / self.chunk_len, slot % self.chunk_len)
    }

    #[inline]
    fn owner_chunk(&self, arena: &Arena<'_>, chunk: usize) -> Option<ArenaSlice<EntityHandle>> {
        arena.get(self.dense_entities)[chunk].resolve(self.chunk_len)
    }

    /// Makes sure the chunks holding `slot` exist. Returns the data chunk offset.
    fn ensure_dense_chunks(&self, arena: &mut Arena<'_>, slot: ComponentHandle) -> EcsResult<usize> {
        let (chunk, _) = self.dense_position(slot);

        if arena.get(self.dense_entities)[chunk] == ChunkRef::NONE {
            let owners = arena.alloc_zeroed::<EntityHandle>(self.chunk_len)?;
            arena.get_mut(self.dense_entities)[chunk] = ChunkRef::new(owners.offset());
        }

        let data = match arena.get(self.dense_data)[chunk].resolve::<u8>(0) {
            Some(data) => data,
            None => {
                let data =
                    arena.alloc_bytes(self.chunk_len * self.component_size, DENSE_CHUNK_ALIGN)?;
                arena.get_mut(self.dense_data)[chunk] = ChunkRef::new(data.offset());
                data
            }
        };
        Ok(data.offset())
    }

    /// Byte range of a handed-out slot inside the arena.
    pub(crate) fn data_range(&self, arena: &Arena<'_>, slot: ComponentHandle) -> Option<Range<usize>> {
        if slot == 0 || slot > self.high_water {
            return None;
        }
        let (chunk, local) = self.dense_position(slot);
        let data = arena.get(self.dense_data)[chunk].resolve::<u8>(0)?;
        let start = data.offset() + local * self.component_size;
        Some(start..start + self.component_size)
    }

    /// Entity owning `slot`, or the null handle for vacant slots.
    #[inline]
    pub(crate) fn owner_at(&self, arena: &Arena<'_>, slot: ComponentHandle) -> EntityHandle {
        if slot == 0 || slot > self.high_water {
            return EntityHandle::NULL;
        }
        let (chunk, local) = self.dense_position(slot);
        self.owner_chunk(arena, chunk)
            .map_or(EntityHandle::NULL, |owners| arena.get(owners)[local])
    }

    fn set_owner(&self, arena: &mut Arena<'_>, slot: ComponentHandle, owner: EntityHandle) {
        let (chunk, local) = self.dense_position(slot);
        if let Some(owners) = self.owner_chunk(arena, chunk) {
            arena.get_mut(owners)[local] = owner;
        }
    }

    // =========================================================================
    // Free list
    // =========================================================================

    fn read_next_free(&self, arena: &Arena<'_>, slot: ComponentHandle) -> ComponentHandle {
        self.data_range(arena, slot).map_or(0, |range| {
            bytemuck::pod_read_unaligned(&arena.bytes(range)[..MIN_COMPONENT_SIZE])
        })
    }

    fn write_next_free(&self, arena: &mut Arena<'_>, slot: ComponentHandle, next: ComponentHandle) {
        if let Some(range) = self.data_range(arena, slot) {
            arena.bytes_mut(range)[..MIN_COMPONENT_SIZE].copy_from_slice(bytemuck::bytes_of(&next));
        }
    }

    /// Pops a vacant slot or bumps a fresh one.
    fn acquire_slot(&mut self, arena: &mut Arena<'_>) -> EcsResult<(ComponentHandle, Range<usize>)> {
        let slot = if self.free_head == 0 {
            self.high_water + 1
        } else {
            self.free_head
        };

        let base = self.ensure_dense_chunks(arena, slot)?;
        if slot == self.free_head {
            self.free_head = self.read_next_free(arena, slot);
        }
        self.high_water = self.high_water.max(slot);

        let (_, local) = self.dense_position(slot);
        let start = base + local * self.component_size;
        Ok((slot, start..start + self.component_size))
    }

    // =========================================================================
    // Component lifecycle
    // =========================================================================

    /// Gives `entity` a zeroed component and returns its byte range.
    ///
    /// The entity must not already have one.
    pub(crate) fn insert(&mut self, arena: &mut Arena<'_>, entity: EntityHandle) -> EcsResult<Range<usize>> {
        debug_assert_eq!(self.slot_of(arena, entity.id()), 0);

        let sparse = self.ensure_sparse_chunk(arena, entity.id())?;
        let (slot, range) = self.acquire_slot(arena)?;
        debug_assert_eq!(slot, self.alive + 1, "live slots must stay contiguous");

        arena.bytes_mut(range.clone()).fill(0);
        self.set_owner(arena, slot, entity);
        arena.get_mut(sparse)[entity.id() as usize & self.sparse_mask] = slot;
        self.alive += 1;
        Ok(range)
    }

    /// Removes the entity's component, if any, by swapping the last live slot
    /// into its place. Returns whether something was removed.
    pub(crate) fn remove(&mut self, arena: &mut Arena<'_>, entity_id: u32) -> bool {
        let slot = self.slot_of(arena, entity_id);
        if slot == 0 {
            return false;
        }

        let last = self.alive;
        if slot != last {
            let moved = self.owner_at(arena, last);
            if let (Some(src), Some(dst)) = (self.data_range(arena, last), self.data_range(arena, slot)) {
                arena.copy_within(src, dst.start);
            }
            self.set_owner(arena, slot, moved);
            self.write_sparse(arena, moved.id(), slot);
        }

        self.set_owner(arena, last, EntityHandle::NULL);
        self.write_sparse(arena, entity_id, 0);
        self.alive -= 1;
        self.write_next_free(arena, last, self.free_head);
        self.free_head = last;
        true
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Slot handed out at some point and backed by an allocated chunk.
    pub(crate) fn is_handle_valid(&self, arena: &Arena<'_>, slot: ComponentHandle) -> bool {
        self.data_range(arena, slot).is_some()
    }

    /// Tagged view of a slot. `None` for slots never handed out.
    pub(crate) fn slot_state(&self, arena: &Arena<'_>, slot: ComponentHandle) -> Option<SlotState> {
        if !self.is_handle_valid(arena, slot) {
            return None;
        }
        let owner = self.owner_at(arena, slot);
        Some(if owner.is_null() {
            SlotState::Vacant {
                next_free: self.read_next_free(arena, slot),
            }
        } else {
            SlotState::Occupied { owner }
        })
    }
}
