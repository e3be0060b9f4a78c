//! Storage layer - containers, the world interface, and storage discovery

pub mod container;
pub mod discovery;
pub mod label_cache;
pub mod world;

pub use container::{BinGroup, Container};
pub use discovery::{anchor_label, anchored_container, resolve_storage_for, MAX_COLUMN_HEIGHT};
pub use label_cache::{LabelCache, LabelHit, ScanContext};
pub use world::{
    is_anchor_text, normalize_marker_text, Block, GridWorld, Marker, PlacedBlock, World, WorldFile,
};
