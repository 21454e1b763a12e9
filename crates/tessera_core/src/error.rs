//! # ECS Error Types
//!
//! All errors that can occur in the arena, the entity table and the component
//! containers.

use thiserror::Error;

use crate::ecs::{ComponentTypeId, EntityHandle};

/// Errors that can occur in the ECS.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// The caller-supplied buffer is larger than chunk references can address.
    #[error("arena buffer of {len} bytes exceeds the addressable limit of {max} bytes")]
    ArenaTooLarge {
        /// Length of the rejected buffer.
        len: usize,
        /// Largest supported buffer.
        max: usize,
    },

    /// An allocation did not fit in the arena.
    #[error("arena exhausted: requested {requested} bytes, {remaining} remaining")]
    ArenaExhausted {
        /// Bytes requested, including alignment padding.
        requested: usize,
        /// Bytes left in the arena.
        remaining: usize,
    },

    /// A world was requested with room for zero entities.
    #[error("entity capacity must be greater than zero")]
    ZeroCapacity,

    /// Every entity slot is in use, or the requested capacity exceeds the id space.
    #[error("entity capacity exceeded: maximum {max} entities")]
    EntityCapacityExceeded {
        /// The capacity limit that was hit.
        max: u32,
    },

    /// The handle does not refer to a live entity of the current generation.
    #[error("invalid entity handle: {0}")]
    InvalidEntity(EntityHandle),

    /// The component type id is reserved or out of range.
    #[error("invalid component type id {type_id}: must be in 1..{max}")]
    InvalidComponentType {
        /// The rejected type id.
        type_id: ComponentTypeId,
        /// Exclusive upper bound for type ids.
        max: usize,
    },

    /// The component is too small to hold a free-list node when vacant.
    #[error("component type {type_id} is {size} bytes, at least {min} required")]
    ComponentTooSmall {
        /// The component type id.
        type_id: ComponentTypeId,
        /// Size of the component in bytes.
        size: usize,
        /// Minimum size in bytes.
        min: usize,
    },

    /// A component type id was reused with a different size.
    #[error("component type {type_id} registered with {expected} bytes, got {actual}")]
    ComponentSizeMismatch {
        /// The component type id.
        type_id: ComponentTypeId,
        /// Size fixed by the first use of the type id.
        expected: usize,
        /// Size of the offending request.
        actual: usize,
    },

    /// The component needs a stricter alignment than dense chunks provide.
    #[error("component type {type_id} requires alignment {align}, at most {max} supported")]
    UnsupportedAlignment {
        /// The component type id.
        type_id: ComponentTypeId,
        /// Alignment required by the type.
        align: usize,
        /// Alignment of dense chunks.
        max: usize,
    },

    /// The same component type appears twice in one iteration request.
    #[error("component type {0} requested more than once in a query")]
    DuplicateQueryComponent(ComponentTypeId),

    /// Configuration could not be parsed or is inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for ECS operations.
pub type EcsResult<T> = Result<T, EcsError>;
