//! Tree sizing configuration.
//!
//! Loaded from TOML; every field is optional and falls back to a default
//! sized like a one-megabyte pool per slot kind.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tree::{Edge, Node};

/// Errors that can occur when loading or validating a [`TreeConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The document is not valid TOML or has wrongly typed fields.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    /// A pool was configured without any slots.
    #[error("{0} must be at least 1")]
    ZeroCapacity(&'static str),
    /// The search depth exceeds what traversal stacks are sized for.
    #[error("max_depth {0} exceeds the ceiling of {ceiling}", ceiling = TreeConfig::DEPTH_CEILING)]
    DepthTooLarge(u8),
}

/// Limits for a game tree and the pools backing it.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct TreeConfig {
    /// Deepest level below the root that is ever materialized.
    #[serde(default = "default_max_depth")]
    pub max_depth: u8,
    /// Node slots in the node pool.
    #[serde(default = "default_node_capacity")]
    pub node_capacity: u32,
    /// Edge slots in the edge pool.
    #[serde(default = "default_edge_capacity")]
    pub edge_capacity: u32,
    /// Once fewer than `max_depth + reserve_margin` node slots remain, new
    /// nodes are flagged reserved and released as traversal leaves them.
    #[serde(default = "default_reserve_margin")]
    pub reserve_margin: u32,
}

const POOL_BYTES: usize = 1024 * 1024;

fn default_max_depth() -> u8 {
    3
}

fn default_node_capacity() -> u32 {
    (1 + POOL_BYTES / std::mem::size_of::<Node>()) as u32
}

fn default_edge_capacity() -> u32 {
    (1 + POOL_BYTES / std::mem::size_of::<Edge>()) as u32
}

fn default_reserve_margin() -> u32 {
    50
}

impl Default for TreeConfig {
    fn default() -> Self {
        TreeConfig {
            max_depth: default_max_depth(),
            node_capacity: default_node_capacity(),
            edge_capacity: default_edge_capacity(),
            reserve_margin: default_reserve_margin(),
        }
    }
}

impl TreeConfig {
    /// Hard limit on `max_depth`.
    pub const DEPTH_CEILING: u8 = 16;

    /// Parses and validates a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: TreeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node_capacity == 0 {
            return Err(ConfigError::ZeroCapacity("node_capacity"));
        }
        if self.edge_capacity == 0 {
            return Err(ConfigError::ZeroCapacity("edge_capacity"));
        }
        if self.max_depth > Self::DEPTH_CEILING {
            return Err(ConfigError::DepthTooLarge(self.max_depth));
        }
        Ok(())
    }

    /// Free node slots below which new nodes are materialized as reserved.
    pub fn reserve_threshold(&self) -> usize {
        self.max_depth as usize + self.reserve_margin as usize
    }
}
