//! # World Configuration
//!
//! Capacity and chunking knobs for a world. Loaded once at startup, usually
//! from a TOML table:
//!
//! ```toml
//! max_entities = 100000
//! dense_chunk_bytes = 4096
//! sparse_chunk_len = 1024
//! ```

use serde::{Deserialize, Serialize};

use crate::ecs::{EntityHandle, MIN_COMPONENT_SIZE};
use crate::error::{EcsError, EcsResult};

/// Default entity capacity.
pub const DEFAULT_MAX_ENTITIES: u32 = 100_000;

/// Default byte budget of one dense component chunk.
pub const DEFAULT_DENSE_CHUNK_BYTES: u32 = 4096;

/// Default number of entity ids covered by one sparse chunk.
pub const DEFAULT_SPARSE_CHUNK_LEN: u32 = 1024;

/// Tuning knobs for a world.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EcsConfig {
    /// Maximum number of simultaneously alive entities.
    pub max_entities: u32,
    /// Target size of one dense chunk. Slots per chunk is this divided by the
    /// component size.
    pub dense_chunk_bytes: u32,
    /// Entity ids per sparse chunk. Must be a power of two.
    pub sparse_chunk_len: u32,
}

impl Default for EcsConfig {
    fn default() -> Self {
        Self {
            max_entities: DEFAULT_MAX_ENTITIES,
            dense_chunk_bytes: DEFAULT_DENSE_CHUNK_BYTES,
            sparse_chunk_len: DEFAULT_SPARSE_CHUNK_LEN,
        }
    }
}

impl EcsConfig {
    /// Default configuration with a different entity capacity.
    #[must_use]
    pub fn with_max_entities(max_entities: u32) -> Self {
        Self {
            max_entities,
            ..Self::default()
        }
    }

    /// Parses and validates a TOML document. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] if the document does not parse, and
    /// the errors of [`EcsConfig::validate`] otherwise.
    pub fn from_toml_str(source: &str) -> EcsResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| EcsError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the knobs for consistency.
    ///
    /// # Errors
    ///
    /// - [`EcsError::ZeroCapacity`] if `max_entities` is 0
    /// - [`EcsError::InvalidConfig`] if `sparse_chunk_len` is not a power of
    ///   two or `dense_chunk_bytes` cannot hold a single component
    pub fn validate(&self) -> EcsResult<()> {
        if self.max_entities == 0 {
            return Err(EcsError::ZeroCapacity);
        }
        if !self.sparse_chunk_len.is_power_of_two() {
            return Err(EcsError::InvalidConfig(format!(
                "sparse_chunk_len must be a power of two, got {}",
                self.sparse_chunk_len
            )));
        }
        if (self.dense_chunk_bytes as usize) < MIN_COMPONENT_SIZE {
            return Err(EcsError::InvalidConfig(format!(
                "dense_chunk_bytes must be at least {MIN_COMPONENT_SIZE}, got {}",
                self.dense_chunk_bytes
            )));
        }
        Ok(())
    }

    /// Bytes taken by the entity table, the first allocation of every world.
    ///
    /// A buffer smaller than this cannot host a world at all; component
    /// storage comes on top.
    #[must_use]
    pub fn entity_table_bytes(&self) -> usize {
        (self.max_entities as usize + 1) * std::mem::size_of::<EntityHandle>()
            + std::mem::align_of::<EntityHandle>()
    }
}
