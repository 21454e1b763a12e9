//! # Memory Management
//!
//! The arena every world allocates from.
//!
//! ## Design Philosophy
//!
//! The caller hands over one buffer at startup. After that:
//! - No heap allocations
//! - Nothing is freed individually, everything is recycled in place
//! - Running out of space is an error, never a silent overwrite

mod arena;

pub use arena::{Arena, ArenaSlice, MAX_ARENA_BYTES};
