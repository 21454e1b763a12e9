//! # Component System
//!
//! Components are pure data containers with no behavior.
//! They must be `Pod` so their bytes can live in arena chunks and be
//! reinterpreted without copies.

use bytemuck::Pod;

/// Small integer identifying a component type. Id 0 is reserved.
pub type ComponentTypeId = u32;

/// Slot of a component inside its container. Slot 0 is reserved.
pub type ComponentHandle = u32;

/// Smallest component size: a vacant slot stores the next free slot in its
/// own bytes.
pub const MIN_COMPONENT_SIZE: usize = std::mem::size_of::<ComponentHandle>();

/// Marker trait for ECS components.
///
/// Components must be:
/// - `Pod`: plain old data, any bit pattern is valid
/// - at least [`MIN_COMPONENT_SIZE`] bytes
///
/// The host program picks the ids. They must start at 1, stay below the
/// world's component capacity and be unique per type for the lifetime of the
/// world.
///
/// # Example
///
/// ```rust
/// use bytemuck::{Pod, Zeroable};
/// use tessera_core::define_component;
///
/// #[derive(Clone, Copy, Default, Pod, Zeroable)]
/// #[repr(C)]
/// struct Position {
///     x: f32,
///     y: f32,
/// }
///
/// define_component!(Position, 1);
/// ```
pub trait Component: Pod {
    /// Unique identifier for this component type.
    const ID: ComponentTypeId;
}

/// Implements [`Component`] for a type with the given id.
///
/// # Example
/// ```ignore
/// define_component!(Velocity, 2);
/// ```
#[macro_export]
macro_rules! define_component {
    ($ty:ty, $id:expr) => {
        impl $crate::ecs::Component for $ty {
            const ID: $crate::ecs::ComponentTypeId = $id;
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::{Pod, Zeroable};

    #[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
    #[repr(C)]
    struct Health {
        current: i32,
        max: i32,
    }

    crate::define_component!(Health, 7);

    #[test]
    fn test_define_component() {
        assert_eq!(Health::ID, 7);
        assert!(std::mem::size_of::<Health>() >= MIN_COMPONENT_SIZE);
    }
}
