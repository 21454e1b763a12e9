//! # Entity Component System
//!
//! A sparse-set ECS that lives entirely inside one arena.
//!
//! ## Design Philosophy
//!
//! - All storage is carved from the caller's buffer, nothing else allocates
//! - Each component type has its own container with a gap-free dense array
//! - Entity handles carry a generation counter for stale-handle detection
//! - Joins are driven by the smallest requested container

mod component;
mod container;
mod entity;
mod query;
mod world;

pub use component::{Component, ComponentHandle, ComponentTypeId, MIN_COMPONENT_SIZE};
pub use container::{SlotState, DENSE_CHUNK_ALIGN};
pub use entity::{EntityHandle, GENERATION_COUNT, MAX_ENTITY_ID};
pub use query::ComponentSet;
pub use world::{Ecs, DEFAULT_MAX_COMPONENTS};
