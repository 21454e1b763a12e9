//! # Arena Allocator
//!
//! A bump allocator over a caller-supplied byte buffer. It is the only
//! allocation source of a world: the entity table, every container table and
//! every chunk are carved out of it, and nothing is ever handed back.

use std::fmt;
use std::marker::PhantomData;
use std::mem::{align_of, size_of};
use std::ops::Range;

use bytemuck::Pod;

use crate::error::{EcsError, EcsResult};

/// Largest buffer an arena accepts. Chunk references are stored as `u32`.
pub const MAX_ARENA_BYTES: usize = u32::MAX as usize;

/// Typed handle to a region reserved from an [`Arena`].
///
/// This is an offset and an element count, not a pointer: it stays valid for
/// the lifetime of the arena and is resolved through [`Arena::get`] and
/// [`Arena::get_mut`].
pub struct ArenaSlice<T> {
    offset: usize,
    len: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ArenaSlice<T> {
    /// An empty region at offset zero.
    pub const EMPTY: Self = Self::from_raw_parts(0, 0);

    pub(crate) const fn from_raw_parts(offset: usize, len: usize) -> Self {
        Self {
            offset,
            len,
            _marker: PhantomData,
        }
    }

    /// Byte offset of the region from the start of the arena buffer.
    #[inline]
    #[must_use]
    pub const fn offset(self) -> usize {
        self.offset
    }

    /// Number of `T` elements in the region.
    #[inline]
    #[must_use]
    pub const fn len(self) -> usize {
        self.len
    }

    /// Returns `true` if the region holds no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }

    /// Byte range of the region inside the arena buffer.
    #[inline]
    #[must_use]
    pub const fn byte_range(self) -> Range<usize> {
        self.offset..self.offset + self.len * size_of::<T>()
    }
}

impl<T> Clone for ArenaSlice<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ArenaSlice<T> {}

impl<T> Default for ArenaSlice<T> {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl<T> PartialEq for ArenaSlice<T> {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset && self.len == other.len
    }
}

impl<T> Eq for ArenaSlice<T> {}

impl<T> fmt::Debug for ArenaSlice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArenaSlice")
            .field("offset", &self.offset)
            .field("len", &self.len)
            .finish()
    }
}

/// A bump-pointer arena over a borrowed buffer.
///
/// Allocations only move the cursor forward. There is no per-allocation free
/// and no reset: to reuse the memory, drop the arena and build a new one over
/// the same buffer. The buffer itself belongs to the caller.
///
/// Regions are not cleared unless requested with [`Arena::alloc_zeroed`].
///
/// # Thread Safety
///
/// This arena is NOT thread-safe. Use one arena per world.
///
/// # Example
///
/// ```rust
/// use tessera_core::Arena;
///
/// let mut buffer = vec![0u8; 1024];
/// let mut arena = Arena::new(&mut buffer).unwrap();
///
/// let ids = arena.alloc_zeroed::<u32>(16).unwrap();
/// arena.get_mut(ids)[3] = 7;
/// assert_eq!(arena.get(ids)[3], 7);
/// ```
pub struct Arena<'a> {
    /// The caller-owned backing storage.
    buffer: &'a mut [u8],
    /// Current allocation offset.
    cursor: usize,
}

impl<'a> Arena<'a> {
    /// Creates an arena over `buffer`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::ArenaTooLarge`] if the buffer is longer than
    /// [`MAX_ARENA_BYTES`].
    pub fn new(buffer: &'a mut [u8]) -> EcsResult<Self> {
        if buffer.len() > MAX_ARENA_BYTES {
            return Err(EcsError::ArenaTooLarge {
                len: buffer.len(),
                max: MAX_ARENA_BYTES,
            });
        }
        Ok(Self { buffer, cursor: 0 })
    }

    /// Returns the total capacity in bytes.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Returns the current used space in bytes, padding included.
    #[inline]
    #[must_use]
    pub const fn used(&self) -> usize {
        self.cursor
    }

    /// Returns the remaining free space in bytes.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.capacity() - self.cursor
    }

    /// Padding needed to bring the cursor to `align`, measured on real addresses.
    fn padding_for(&self, align: usize) -> usize {
        debug_assert!(align.is_power_of_two());
        let address = self.buffer.as_ptr() as usize + self.cursor;
        address.wrapping_neg() & (align - 1)
    }

    /// Reserves `len` bytes aligned to `align`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::ArenaExhausted`] if the region (plus padding) does
    /// not fit. The cursor is left untouched in that case.
    pub fn alloc_bytes(&mut self, len: usize, align: usize) -> EcsResult<ArenaSlice<u8>> {
        let padding = self.padding_for(align);
        let remaining = self.remaining();
        let requested = padding.saturating_add(len);
        if requested > remaining {
            tracing::error!(requested, remaining, "arena exhausted");
            return Err(EcsError::ArenaExhausted {
                requested,
                remaining,
            });
        }

        let offset = self.cursor + padding;
        self.cursor = offset + len;
        Ok(ArenaSlice::from_raw_parts(offset, len))
    }

    /// Reserves room for `count` contiguous values of `T`.
    ///
    /// The contents are whatever the buffer held before.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::ArenaExhausted`] if the region does not fit.
    pub fn alloc<T: Pod>(&mut self, count: usize) -> EcsResult<ArenaSlice<T>> {
        // An overflowing size is a request no buffer can satisfy.
        let len = size_of::<T>().checked_mul(count).unwrap_or(usize::MAX);
        let bytes = self.alloc_bytes(len, align_of::<T>())?;
        Ok(ArenaSlice::from_raw_parts(bytes.offset(), count))
    }

    /// Reserves room for `count` values of `T` and zero-fills it.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::ArenaExhausted`] if the region does not fit.
    pub fn alloc_zeroed<T: Pod>(&mut self, count: usize) -> EcsResult<ArenaSlice<T>> {
        let slice = self.alloc::<T>(count)?;
        self.bytes_mut(slice.byte_range()).fill(0);
        Ok(slice)
    }

    /// Borrows a typed region.
    ///
    /// # Panics
    ///
    /// Panics if `slice` was not produced by this arena.
    #[inline]
    #[must_use]
    pub fn get<T: Pod>(&self, slice: ArenaSlice<T>) -> &[T] {
        bytemuck::cast_slice(&self.buffer[slice.byte_range()])
    }

    /// Mutably borrows a typed region.
    ///
    /// # Panics
    ///
    /// Panics if `slice` was not produced by this arena.
    #[inline]
    pub fn get_mut<T: Pod>(&mut self, slice: ArenaSlice<T>) -> &mut [T] {
        bytemuck::cast_slice_mut(&mut self.buffer[slice.byte_range()])
    }

    /// Borrows a raw byte range.
    #[inline]
    #[must_use]
    pub fn bytes(&self, range: Range<usize>) -> &[u8] {
        &self.buffer[range]
    }

    /// Mutably borrows a raw byte range.
    #[inline]
    pub fn bytes_mut(&mut self, range: Range<usize>) -> &mut [u8] {
        &mut self.buffer[range]
    }

    /// Copies the bytes in `src` to the region starting at `dest`.
    ///
    /// The regions may overlap.
    #[inline]
    pub fn copy_within(&mut self, src: Range<usize>, dest: usize) {
        self.buffer.copy_within(src, dest);
    }
}

impl fmt::Debug for Arena<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("capacity", &self.capacity())
            .field("used", &self.cursor)
            .finish()
    }
}
