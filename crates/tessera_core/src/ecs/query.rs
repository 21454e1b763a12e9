//! # Component Sets
//!
//! Tuples of component types requested together by [`Ecs::for_each`].
//! Implemented for tuples of one to eight components.

use super::component::{Component, ComponentTypeId};
use super::world::Ecs;

/// A tuple of components fetched and written back as a unit.
pub trait ComponentSet: Copy + 'static {
    /// Type ids of the members, in tuple order.
    const TYPE_IDS: &'static [ComponentTypeId];

    /// Byte sizes of the members, in tuple order.
    const SIZES: &'static [usize];

    /// Copies every member out of the world. `None` if any is missing.
    #[doc(hidden)]
    fn fetch<const M: usize>(ecs: &Ecs<'_, M>, entity_id: u32) -> Option<Self>;

    /// Writes every member back into the world.
    #[doc(hidden)]
    fn store<const M: usize>(self, ecs: &mut Ecs<'_, M>, entity_id: u32);
}

macro_rules! impl_component_set {
    ($($name:ident),+) => {
        impl<$($name: Component),+> ComponentSet for ($($name,)+) {
            const TYPE_IDS: &'static [ComponentTypeId] = &[$(<$name as Component>::ID),+];
            const SIZES: &'static [usize] = &[$(std::mem::size_of::<$name>()),+];

            #[inline]
            fn fetch<const M: usize>(ecs: &Ecs<'_, M>, entity_id: u32) -> Option<Self> {
                Some(($(ecs.read_component::<$name>(entity_id)?,)+))
            }

            #[inline]
            #[allow(non_snake_case)]
            fn store<const M: usize>(self, ecs: &mut Ecs<'_, M>, entity_id: u32) {
                let ($($name,)+) = self;
                $(ecs.write_component::<$name>(entity_id, $name);)+
            }
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);
impl_component_set!(A, B, C, D, E);
impl_component_set!(A, B, C, D, E, F);
impl_component_set!(A, B, C, D, E, F, G);
impl_component_set!(A, B, C, D, E, F, G, H);
