//! # TESSERA Core
//!
//! Arena-backed Entity Component System (ECS) designed for:
//! - A single caller-supplied memory buffer as the only allocation source
//! - Stable, generation-checked entity handles
//! - Cache-friendly joins over any combination of component types
//!
//! ## Architecture Rules
//!
//! 1. **One arena** - Every table and chunk is bump-allocated from the buffer
//! 2. **Recycle, never free** - Entity ids and component slots go on free lists
//! 3. **Dense iteration** - Live components of a type are packed at the front
//!
//! ## Example
//!
//! ```rust
//! use bytemuck::{Pod, Zeroable};
//! use tessera_core::{define_component, Ecs};
//!
//! #[derive(Clone, Copy, Default, Pod, Zeroable)]
//! #[repr(C)]
//! struct Health(i32);
//! define_component!(Health, 1);
//!
//! let mut buffer = vec![0u8; 1 << 20];
//! let mut ecs = Ecs::new(&mut buffer, 10_000)?;
//! let entity = ecs.new_entity()?;
//! ecs.insert_component(entity, Health(100))?;
//! assert!(ecs.entity_has_component::<Health>(entity));
//! # Ok::<(), tessera_core::EcsError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod error;
pub mod memory;

pub use config::EcsConfig;
pub use ecs::{
    Component, ComponentHandle, ComponentSet, ComponentTypeId, Ecs, EntityHandle, SlotState,
    DEFAULT_MAX_COMPONENTS,
};
pub use error::{EcsError, EcsResult};
pub use memory::{Arena, ArenaSlice};
