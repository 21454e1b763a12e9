//! # ECS World
//!
//! The central container for all entities and components.
//! Everything it stores lives in one caller-supplied byte buffer.

use std::mem::{align_of, size_of};
use std::ops::Range;

use super::component::{Component, ComponentHandle, ComponentTypeId};
use super::container::{ComponentContainer, ContainerLayout, SlotState, DENSE_CHUNK_ALIGN};
use super::entity::{EntityHandle, EntityTable};
use super::query::ComponentSet;
use crate::config::EcsConfig;
use crate::error::{EcsError, EcsResult};
use crate::memory::Arena;

/// Component type capacity of [`Ecs`] unless chosen otherwise.
pub const DEFAULT_MAX_COMPONENTS: usize = 32;

/// The ECS world.
///
/// Borrows its arena buffer for its whole lifetime. The entity table is
/// allocated up front; component storage is carved out lazily as types and
/// entities first need it. Once the buffer runs out, operations that need
/// more memory fail with [`EcsError::ArenaExhausted`] and leave the world as
/// it was.
///
/// `MAX_COMPONENTS` bounds the component type ids: valid ids are
/// `1..MAX_COMPONENTS`.
///
/// # Example
///
/// ```rust
/// use bytemuck::{Pod, Zeroable};
/// use tessera_core::{define_component, Ecs};
///
/// #[derive(Clone, Copy, Default, Pod, Zeroable)]
/// #[repr(C)]
/// struct Position {
///     x: i32,
///     y: i32,
/// }
/// define_component!(Position, 1);
///
/// let mut buffer = vec![0u8; 1 << 16];
/// let mut ecs = Ecs::new(&mut buffer, 100)?;
///
/// let entity = ecs.new_entity()?;
/// ecs.insert_component(entity, Position { x: 3, y: 4 })?;
///
/// ecs.for_each::<(Position,), _>(|_, (pos,)| pos.x += 1)?;
/// assert_eq!(ecs.get_component::<Position>(entity).map(|p| p.x), Some(4));
/// # Ok::<(), tessera_core::EcsError>(())
/// ```
pub struct Ecs<'a, const MAX_COMPONENTS: usize = DEFAULT_MAX_COMPONENTS> {
    arena: Arena<'a>,
    entities: EntityTable,
    /// Indexed by type id. Slot 0 is never initialized.
    containers: [ComponentContainer; MAX_COMPONENTS],
    layout: ContainerLayout,
}

impl<'a> Ecs<'a> {
    /// Creates a world for up to `max_entities` entities with default tuning.
    ///
    /// # Errors
    ///
    /// - [`EcsError::ZeroCapacity`] if `max_entities` is 0
    /// - [`EcsError::EntityCapacityExceeded`] if it does not fit 28 bits
    /// - [`EcsError::ArenaExhausted`] if the entity table does not fit
    pub fn new(buffer: &'a mut [u8], max_entities: u32) -> EcsResult<Self> {
        Self::build(buffer, &EcsConfig::with_max_entities(max_entities))
    }

    /// Creates a world from an explicit configuration.
    ///
    /// # Errors
    ///
    /// As [`Ecs::new`], plus the errors of [`EcsConfig::validate`].
    pub fn with_config(buffer: &'a mut [u8], config: &EcsConfig) -> EcsResult<Self> {
        Self::build(buffer, config)
    }

    /// Smallest buffer that can host a world with this configuration.
    ///
    /// Only the entity table is accounted for; component storage needs more.
    #[must_use]
    pub fn required_arena_bytes(config: &EcsConfig) -> usize {
        config.entity_table_bytes()
    }
}

impl<'a, const MAX_COMPONENTS: usize> Ecs<'a, MAX_COMPONENTS> {
    /// Creates a world with a custom component type capacity.
    ///
    /// # Errors
    ///
    /// As [`Ecs::with_config`], plus [`EcsError::InvalidConfig`] if
    /// `MAX_COMPONENTS` leaves no usable type id.
    pub fn build(buffer: &'a mut [u8], config: &EcsConfig) -> EcsResult<Self> {
        if MAX_COMPONENTS < 2 {
            return Err(EcsError::InvalidConfig(format!(
                "MAX_COMPONENTS must be at least 2, got {MAX_COMPONENTS}"
            )));
        }
        config.validate()?;

        let mut arena = Arena::new(buffer)?;
        let entities = EntityTable::new(&mut arena, config.max_entities)?;

        tracing::debug!(
            max_entities = config.max_entities,
            max_components = MAX_COMPONENTS,
            arena_bytes = arena.capacity(),
            arena_used = arena.used(),
            "ecs world created"
        );

        Ok(Self {
            arena,
            entities,
            containers: [ComponentContainer::default(); MAX_COMPONENTS],
            layout: ContainerLayout::from_config(config),
        })
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Returns the maximum number of simultaneously alive entities.
    #[inline]
    #[must_use]
    pub const fn max_entities(&self) -> u32 {
        self.entities.max_entities()
    }

    /// Returns the number of currently alive entities.
    #[inline]
    #[must_use]
    pub const fn live_entities(&self) -> u32 {
        self.entities.live()
    }

    /// Returns the component type capacity.
    #[inline]
    #[must_use]
    pub const fn max_component_types(&self) -> usize {
        MAX_COMPONENTS
    }

    /// Bytes of the arena handed out so far.
    #[inline]
    #[must_use]
    pub const fn arena_used(&self) -> usize {
        self.arena.used()
    }

    /// Bytes of the arena still available, ignoring alignment padding.
    #[inline]
    #[must_use]
    pub fn arena_remaining(&self) -> usize {
        self.arena.remaining()
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// Creates an entity with no components.
    ///
    /// Recycles the most recently removed id first.
    ///
    /// # Errors
    ///
    /// [`EcsError::EntityCapacityExceeded`] once `max_entities` are alive.
    pub fn new_entity(&mut self) -> EcsResult<EntityHandle> {
        let entity = self.entities.create(&mut self.arena)?;
        tracing::trace!(%entity, "entity created");
        Ok(entity)
    }

    /// Removes an entity and all of its components.
    ///
    /// # Returns
    ///
    /// `false` if the handle was already invalid, in which case nothing
    /// changes.
    pub fn remove_entity(&mut self, entity: EntityHandle) -> bool {
        if !self.entities.is_valid(&self.arena, entity) {
            tracing::debug!(%entity, "ignoring removal of invalid entity");
            return false;
        }

        for container in self.containers.iter_mut().filter(|c| c.is_initialized()) {
            container.remove(&mut self.arena, entity.id());
        }
        self.entities.destroy(&mut self.arena, entity);

        tracing::trace!(%entity, "entity removed");
        true
    }

    /// Checks that the handle is alive and of the current generation.
    #[inline]
    #[must_use]
    pub fn is_entity_handle_valid(&self, entity: EntityHandle) -> bool {
        self.entities.is_valid(&self.arena, entity)
    }

    /// Checks whether the slot the handle points at holds a live entity.
    ///
    /// Unlike [`Ecs::is_entity_handle_valid`] this ignores the generation, so
    /// a stale handle reports alive once its id has been reused.
    #[inline]
    #[must_use]
    pub fn is_entity_alive(&self, entity: EntityHandle) -> bool {
        self.entities.is_alive(&self.arena, entity)
    }

    // =========================================================================
    // Typed components
    // =========================================================================

    /// Gives the entity a zeroed `T`, or returns the one it already has.
    ///
    /// # Errors
    ///
    /// - [`EcsError::InvalidEntity`] for stale or null handles
    /// - [`EcsError::InvalidComponentType`] if `T::ID` is out of range
    /// - [`EcsError::ComponentTooSmall`] / [`EcsError::ComponentSizeMismatch`]
    ///   if `T` does not fit the container registered under `T::ID`
    /// - [`EcsError::UnsupportedAlignment`] for alignments above 64
    /// - [`EcsError::ArenaExhausted`] if storage cannot be allocated
    pub fn add_component<T: Component>(&mut self, entity: EntityHandle) -> EcsResult<&mut T> {
        let range = self.add_component_bytes(entity, T::ID, size_of::<T>(), align_of::<T>())?;
        bytemuck::try_from_bytes_mut(self.arena.bytes_mut(range)).map_err(|_| {
            EcsError::UnsupportedAlignment {
                type_id: T::ID,
                align: align_of::<T>(),
                max: DENSE_CHUNK_ALIGN,
            }
        })
    }

    /// Gives the entity `value` as its `T`, replacing any existing one.
    ///
    /// # Errors
    ///
    /// As [`Ecs::add_component`].
    pub fn insert_component<T: Component>(
        &mut self,
        entity: EntityHandle,
        value: T,
    ) -> EcsResult<&mut T> {
        let component = self.add_component::<T>(entity)?;
        *component = value;
        Ok(component)
    }

    /// Returns the entity's `T`, if it has one.
    #[inline]
    #[must_use]
    pub fn get_component<T: Component>(&self, entity: EntityHandle) -> Option<&T> {
        let range = self.component_range(entity, T::ID, Some(size_of::<T>()))?;
        bytemuck::try_from_bytes(self.arena.bytes(range)).ok()
    }

    /// Returns the entity's `T` mutably, if it has one.
    #[inline]
    pub fn get_component_mut<T: Component>(&mut self, entity: EntityHandle) -> Option<&mut T> {
        let range = self.component_range(entity, T::ID, Some(size_of::<T>()))?;
        bytemuck::try_from_bytes_mut(self.arena.bytes_mut(range)).ok()
    }

    /// Removes the entity's `T`. Returns whether there was one.
    #[inline]
    pub fn remove_component<T: Component>(&mut self, entity: EntityHandle) -> bool {
        self.remove_component_by_id(entity, T::ID)
    }

    /// Checks whether the entity has a `T`.
    #[inline]
    #[must_use]
    pub fn entity_has_component<T: Component>(&self, entity: EntityHandle) -> bool {
        self.entity_has_component_id(entity, T::ID)
    }

    /// Number of entities with a `T`.
    #[inline]
    #[must_use]
    pub fn component_count<T: Component>(&self) -> u32 {
        self.component_count_by_id(T::ID)
    }

    /// Slot holding the entity's `T`, 0 if none.
    ///
    /// Slots move when other entities lose their `T`, so a handle is only
    /// meaningful until the next removal.
    #[must_use]
    pub fn component_handle<T: Component>(&self, entity: EntityHandle) -> ComponentHandle {
        if !self.entities.is_valid(&self.arena, entity) {
            return 0;
        }
        self.container(T::ID)
            .map_or(0, |container| container.slot_of(&self.arena, entity.id()))
    }

    // =========================================================================
    // Components by runtime id
    // =========================================================================

    /// Removes the component with the given type id. Returns whether there
    /// was one.
    pub fn remove_component_by_id(&mut self, entity: EntityHandle, type_id: ComponentTypeId) -> bool {
        if !self.entities.is_valid(&self.arena, entity) {
            tracing::debug!(%entity, type_id, "ignoring component removal from invalid entity");
            return false;
        }
        match Self::container_index(type_id) {
            Ok(index) => self.containers[index].remove(&mut self.arena, entity.id()),
            Err(error) => {
                tracing::debug!(%entity, %error, "ignoring component removal");
                false
            }
        }
    }

    /// Checks whether the entity has the component with the given type id.
    #[must_use]
    pub fn entity_has_component_id(&self, entity: EntityHandle, type_id: ComponentTypeId) -> bool {
        self.entities.is_valid(&self.arena, entity)
            && self
                .container(type_id)
                .is_some_and(|container| container.slot_of(&self.arena, entity.id()) != 0)
    }

    /// Number of entities with the given component type. 0 for unused types.
    #[must_use]
    pub fn component_count_by_id(&self, type_id: ComponentTypeId) -> u32 {
        self.container(type_id)
            .map_or(0, ComponentContainer::alive_components)
    }

    /// Untyped [`Ecs::add_component`]. The first call for a type id fixes its
    /// size.
    ///
    /// # Errors
    ///
    /// As [`Ecs::add_component`].
    pub fn add_component_raw(
        &mut self,
        entity: EntityHandle,
        type_id: ComponentTypeId,
        size: usize,
    ) -> EcsResult<&mut [u8]> {
        let range = self.add_component_bytes(entity, type_id, size, 1)?;
        Ok(self.arena.bytes_mut(range))
    }

    /// Untyped [`Ecs::get_component`].
    #[must_use]
    pub fn get_component_raw(&self, entity: EntityHandle, type_id: ComponentTypeId) -> Option<&[u8]> {
        let range = self.component_range(entity, type_id, None)?;
        Some(self.arena.bytes(range))
    }

    /// Untyped [`Ecs::get_component_mut`].
    pub fn get_component_raw_mut(
        &mut self,
        entity: EntityHandle,
        type_id: ComponentTypeId,
    ) -> Option<&mut [u8]> {
        let range = self.component_range(entity, type_id, None)?;
        Some(self.arena.bytes_mut(range))
    }

    /// Checks that `handle` is a slot the container has handed out.
    ///
    /// The slot may be vacant; see [`Ecs::component_slot_state`].
    #[must_use]
    pub fn is_component_handle_valid(&self, type_id: ComponentTypeId, handle: ComponentHandle) -> bool {
        self.container(type_id)
            .is_some_and(|container| container.is_handle_valid(&self.arena, handle))
    }

    /// Occupancy of a slot. `None` for slots never handed out.
    #[must_use]
    pub fn component_slot_state(
        &self,
        type_id: ComponentTypeId,
        handle: ComponentHandle,
    ) -> Option<SlotState> {
        self.container(type_id)?.slot_state(&self.arena, handle)
    }

    // =========================================================================
    // Iteration
    // =========================================================================

    /// Calls `f` once for every entity that has all components of `Q`.
    ///
    /// The smallest of the requested containers drives the walk; the others
    /// are probed through their sparse index. `f` works on copies which are
    /// written back after it returns. Visit order follows the driving
    /// container's slots and changes as components are removed.
    ///
    /// # Errors
    ///
    /// - [`EcsError::InvalidComponentType`] if a type id is out of range
    /// - [`EcsError::DuplicateQueryComponent`] if a type appears twice
    /// - [`EcsError::ComponentSizeMismatch`] if a type's size differs from the
    ///   size its id was registered with
    pub fn for_each<Q, F>(&mut self, mut f: F) -> EcsResult<()>
    where
        Q: ComponentSet,
        F: FnMut(EntityHandle, &mut Q),
    {
        let type_ids = Q::TYPE_IDS;
        for (i, &type_id) in type_ids.iter().enumerate() {
            Self::container_index(type_id)?;
            if type_ids[..i].contains(&type_id) {
                return Err(EcsError::DuplicateQueryComponent(type_id));
            }
        }

        for (&type_id, &size) in type_ids.iter().zip(Q::SIZES) {
            let container = &self.containers[type_id as usize];
            if container.is_initialized() && container.component_size() != size {
                let expected = container.component_size();
                tracing::warn!(type_id, expected, actual = size, "for_each size mismatch");
                return Err(EcsError::ComponentSizeMismatch {
                    type_id,
                    expected,
                    actual: size,
                });
            }
        }

        if type_ids
            .iter()
            .any(|&type_id| !self.containers[type_id as usize].is_initialized())
        {
            return Ok(());
        }

        let Some(&driver_id) = type_ids
            .iter()
            .min_by_key(|&&type_id| self.containers[type_id as usize].alive_components())
        else {
            return Ok(());
        };
        // Headers are only read below, component bytes are what changes.
        let driver = self.containers[driver_id as usize];

        for slot in 1..=driver.alive_components() {
            let owner = driver.owner_at(&self.arena, slot);
            if owner.is_null() {
                continue;
            }
            let id = owner.id();

            let has_all = type_ids.iter().all(|&type_id| {
                type_id == driver_id
                    || self.containers[type_id as usize].slot_of(&self.arena, id) != 0
            });
            if !has_all {
                continue;
            }

            let Some(mut values) = Q::fetch(self, id) else {
                continue;
            };
            f(owner, &mut values);
            values.store(self, id);
        }
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn container_index(type_id: ComponentTypeId) -> EcsResult<usize> {
        let index = type_id as usize;
        if type_id == 0 || index >= MAX_COMPONENTS {
            return Err(EcsError::InvalidComponentType {
                type_id,
                max: MAX_COMPONENTS,
            });
        }
        Ok(index)
    }

    #[inline]
    fn container(&self, type_id: ComponentTypeId) -> Option<&ComponentContainer> {
        Self::container_index(type_id)
            .ok()
            .map(|index| &self.containers[index])
    }

    /// Byte range of the entity's component. With `size` set, also requires
    /// the container to hold components of exactly that size.
    fn component_range(
        &self,
        entity: EntityHandle,
        type_id: ComponentTypeId,
        size: Option<usize>,
    ) -> Option<Range<usize>> {
        if !self.entities.is_valid(&self.arena, entity) {
            return None;
        }
        let container = self.container(type_id)?;
        if size.is_some_and(|size| size != container.component_size()) {
            return None;
        }
        container.data_range(&self.arena, container.slot_of(&self.arena, entity.id()))
    }

    fn add_component_bytes(
        &mut self,
        entity: EntityHandle,
        type_id: ComponentTypeId,
        size: usize,
        align: usize,
    ) -> EcsResult<Range<usize>> {
        let result = self.try_add_component_bytes(entity, type_id, size, align);
        if let Err(error) = &result {
            tracing::warn!(%entity, type_id, size, %error, "add_component rejected");
        }
        result
    }

    fn try_add_component_bytes(
        &mut self,
        entity: EntityHandle,
        type_id: ComponentTypeId,
        size: usize,
        align: usize,
    ) -> EcsResult<Range<usize>> {
        if !self.entities.is_valid(&self.arena, entity) {
            return Err(EcsError::InvalidEntity(entity));
        }
        let index = Self::container_index(type_id)?;
        if align > DENSE_CHUNK_ALIGN {
            return Err(EcsError::UnsupportedAlignment {
                type_id,
                align,
                max: DENSE_CHUNK_ALIGN,
            });
        }

        let container = &mut self.containers[index];
        container.ensure(&mut self.arena, type_id, size, &self.layout)?;

        let slot = container.slot_of(&self.arena, entity.id());
        match container.data_range(&self.arena, slot) {
            Some(range) => Ok(range),
            None => container.insert(&mut self.arena, entity),
        }
    }

    /// Copies the component out of its slot.
    pub(crate) fn read_component<T: Component>(&self, entity_id: u32) -> Option<T> {
        let container = self.container(T::ID)?;
        if container.component_size() != size_of::<T>() {
            return None;
        }
        let range = container.data_range(&self.arena, container.slot_of(&self.arena, entity_id))?;
        Some(bytemuck::pod_read_unaligned(self.arena.bytes(range)))
    }

    /// Overwrites the component in its slot. No-op if the entity lacks it.
    pub(crate) fn write_component<T: Component>(&mut self, entity_id: u32, value: T) {
        let Some(container) = self.container(T::ID) else {
            return;
        };
        if container.component_size() != size_of::<T>() {
            return;
        }
        let Some(range) = container.data_range(&self.arena, container.slot_of(&self.arena, entity_id))
        else {
            return;
        };
        self.arena
            .bytes_mut(range)
            .copy_from_slice(bytemuck::bytes_of(&value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::{Pod, Zeroable};

    #[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
    #[repr(C)]
    struct Position {
        x: f32,
        y: f32,
        z: f32,
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
    #[repr(C)]
    struct Velocity {
        x: f32,
        y: f32,
        z: f32,
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
    #[repr(C)]
    struct Tiny(u16);

    crate::define_component!(Position, 1);
    crate::define_component!(Velocity, 2);
    crate::define_component!(Tiny, 3);

    #[test]
    fn test_world_creation() {
        let mut buffer = vec![0u8; 64 * 1024];
        let ecs = Ecs::new(&mut buffer, 1000).unwrap();
        assert_eq!(ecs.max_entities(), 1000);
        assert_eq!(ecs.live_entities(), 0);
        assert_eq!(ecs.max_component_types(), DEFAULT_MAX_COMPONENTS);
        assert!(ecs.arena_used() <= Ecs::required_arena_bytes(&EcsConfig::with_max_entities(1000)));
    }

    #[test]
    fn test_world_creation_errors() {
        let mut buffer = vec![0u8; 64];
        assert_eq!(Ecs::new(&mut buffer, 0).err(), Some(EcsError::ZeroCapacity));
        assert!(matches!(
            Ecs::new(&mut buffer, 1000),
            Err(EcsError::ArenaExhausted { .. })
        ));
        assert!(matches!(
            Ecs::<1>::build(&mut buffer, &EcsConfig::with_max_entities(1)),
            Err(EcsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_spawn_despawn() {
        let mut buffer = vec![0u8; 64 * 1024];
        let mut ecs = Ecs::new(&mut buffer, 100).unwrap();

        let id1 = ecs.new_entity().unwrap();
        assert!(ecs.is_entity_handle_valid(id1));
        let id2 = ecs.new_entity().unwrap();
        assert_eq!(ecs.live_entities(), 2);

        assert!(ecs.remove_entity(id1));
        assert!(!ecs.is_entity_handle_valid(id1));
        assert!(!ecs.remove_entity(id1));
        assert_eq!(ecs.live_entities(), 1);

        // Spawn again - should reuse the slot
        let id3 = ecs.new_entity().unwrap();
        assert_eq!(id3.id(), id1.id());
        assert_ne!(id3, id1);
        assert!(ecs.is_entity_handle_valid(id2));
    }

    #[test]
    fn test_position_update() {
        let mut buffer = vec![0u8; 64 * 1024];
        let mut ecs = Ecs::new(&mut buffer, 10).unwrap();

        let id = ecs.new_entity().unwrap();
        ecs.insert_component(id, Position::default()).unwrap();
        ecs.insert_component(id, Velocity { x: 1.0, y: 2.0, z: 3.0 }).unwrap();

        ecs.for_each::<(Position, Velocity), _>(|_, (pos, vel)| {
            pos.x += vel.x;
            pos.y += vel.y;
            pos.z += vel.z;
        })
        .unwrap();

        let pos = ecs.get_component::<Position>(id).unwrap();
        assert_eq!(*pos, Position { x: 1.0, y: 2.0, z: 3.0 });
    }

    #[test]
    fn test_add_component_is_idempotent() {
        let mut buffer = vec![0u8; 64 * 1024];
        let mut ecs = Ecs::new(&mut buffer, 10).unwrap();
        let id = ecs.new_entity().unwrap();

        ecs.add_component::<Position>(id).unwrap().x = 5.0;
        assert_eq!(ecs.add_component::<Position>(id).unwrap().x, 5.0);
        assert_eq!(ecs.component_count::<Position>(), 1);
    }

    #[test]
    fn test_add_component_rejections() {
        let mut buffer = vec![0u8; 64 * 1024];
        let mut ecs = Ecs::new(&mut buffer, 10).unwrap();
        let id = ecs.new_entity().unwrap();

        assert!(matches!(
            ecs.add_component::<Tiny>(id),
            Err(EcsError::ComponentTooSmall { type_id: 3, size: 2, .. })
        ));
        assert!(matches!(
            ecs.add_component_raw(id, 0, 8),
            Err(EcsError::InvalidComponentType { type_id: 0, .. })
        ));
        assert!(matches!(
            ecs.add_component_raw(id, 32, 8),
            Err(EcsError::InvalidComponentType { type_id: 32, .. })
        ));

        ecs.add_component::<Position>(id).unwrap();
        assert_eq!(
            ecs.add_component_raw(id, Position::ID, 4).unwrap_err(),
            EcsError::ComponentSizeMismatch {
                type_id: 1,
                expected: 12,
                actual: 4
            }
        );

        ecs.remove_entity(id);
        assert_eq!(
            ecs.add_component::<Position>(id).unwrap_err(),
            EcsError::InvalidEntity(id)
        );
    }

    #[test]
    fn test_for_each_rejects_bad_queries() {
        let mut buffer = vec![0u8; 64 * 1024];
        let mut ecs = Ecs::new(&mut buffer, 10).unwrap();
        assert_eq!(
            ecs.for_each::<(Position, Position), _>(|_, _| {}),
            Err(EcsError::DuplicateQueryComponent(1))
        );
        // Unused types match nothing.
        let mut calls = 0;
        ecs.for_each::<(Velocity,), _>(|_, _| calls += 1).unwrap();
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_for_each_rejects_size_mismatch() {
        let mut buffer = vec![0u8; 64 * 1024];
        let mut ecs = Ecs::new(&mut buffer, 10).unwrap();
        let id = ecs.new_entity().unwrap();
        ecs.add_component::<Position>(id).unwrap();
        // Registers id 2 with 8 bytes; Velocity is 12.
        ecs.add_component_raw(id, Velocity::ID, 8).unwrap();

        let mut calls = 0;
        assert_eq!(
            ecs.for_each::<(Position, Velocity), _>(|_, _| calls += 1),
            Err(EcsError::ComponentSizeMismatch {
                type_id: 2,
                expected: 8,
                actual: 12
            })
        );
        assert_eq!(calls, 0);
        ecs.for_each::<(Position,), _>(|_, _| calls += 1).unwrap();
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_small_world_capacity() {
        let mut buffer = vec![0u8; 64 * 1024];
        let mut ecs = Ecs::<4>::build(&mut buffer, &EcsConfig::with_max_entities(2)).unwrap();
        let id = ecs.new_entity().unwrap();
        ecs.add_component::<Position>(id).unwrap();
        assert!(ecs.add_component::<Velocity>(id).is_ok());
        assert!(matches!(
            ecs.add_component_raw(id, 4, 8),
            Err(EcsError::InvalidComponentType { type_id: 4, max: 4 })
        ));
    }
}
