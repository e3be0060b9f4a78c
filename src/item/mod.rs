//! Item layer - stacks, metadata, and the item catalog

pub mod catalog;
pub mod stack;

pub use catalog::{EnchantmentDef, ItemCatalog, ItemDef, DEFAULT_MAX_STACK};
pub use stack::{normalize_key, normalize_slot, Contents, ContentsKind, ItemId, ItemMeta, ItemStack};
