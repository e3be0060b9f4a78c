//! Sorter configuration with documented constants
//!
//! All tunables are collected here with explanations of their purpose
//! and how they interact with each other.

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SortError};

/// How include cycles between categories are handled during flattening
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CyclePolicy {
    /// An in-progress category contributes nothing to whoever re-enters it,
    /// so membership on a cycle is asymmetric and follows load order: with
    /// `a` and `b` including each other, `a` (loaded first) resolves to both
    /// item sets while `b` keeps only its own.
    #[default]
    Tolerate,
    /// Reaching an in-progress category fails every category on the cycle.
    Reject,
}

/// Configuration for the sorting engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SorterConfig {
    // === DISCOVERY ===
    /// Half-width of the cube scanned for markers (blocks)
    ///
    /// The label cache visits (2r + 1)^3 positions once per operation,
    /// so this bounds the cost of every sort.
    pub scan_radius: i32,

    /// Marker text identifying the input storage
    pub input_label: String,

    // === ROUTING ===
    /// Minimum number of same-item stacks inside a container item for it
    /// to be routed whole instead of unpacked
    pub uniform_container_threshold: usize,

    /// Global stack size cap, applied on top of each item's own maximum
    pub max_stack_size: u32,

    /// Priority given to categories that do not declare one
    ///
    /// Lower runs first.
    pub default_priority: i32,

    /// Include cycle handling
    pub cycle_policy: CyclePolicy,

    // === AUDIT ===
    /// Events buffered for audit consumers before new ones are dropped
    pub audit_queue_capacity: usize,
}

impl Default for SorterConfig {
    fn default() -> Self {
        Self {
            scan_radius: 32,
            input_label: "[input]".to_string(),
            uniform_container_threshold: 10,
            max_stack_size: 99,
            default_priority: 10,
            cycle_policy: CyclePolicy::Tolerate,
            audit_queue_capacity: 256,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    sorter: SorterConfig,
}

impl SorterConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the `[sorter]` table of a TOML document; missing keys keep defaults
    pub fn parse_toml(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content)?;
        file.sorter.validate()?;
        Ok(file.sorter)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.scan_radius < 0 {
            return Err(SortError::InvalidConfig(format!(
                "scan_radius ({}) must not be negative",
                self.scan_radius
            )));
        }
        if self.max_stack_size == 0 {
            return Err(SortError::InvalidConfig(
                "max_stack_size must be at least 1".into(),
            ));
        }
        if self.uniform_container_threshold == 0 {
            return Err(SortError::InvalidConfig(
                "uniform_container_threshold must be at least 1".into(),
            ));
        }
        if self.input_label.trim().is_empty() {
            return Err(SortError::InvalidConfig("input_label is empty".into()));
        }
        Ok(())
    }
}

// === GLOBAL CONFIG ACCESS ===

use std::sync::OnceLock;

static CONFIG: OnceLock<SorterConfig> = OnceLock::new();

/// Get the global sorter config (initializes with defaults if not set)
pub fn config() -> &'static SorterConfig {
    CONFIG.get_or_init(SorterConfig::default)
}

/// Set the global sorter config (can only be called once)
///
/// Returns Err if config was already set.
pub fn set_config(config: SorterConfig) -> std::result::Result<(), SorterConfig> {
    CONFIG.set(config)
}
