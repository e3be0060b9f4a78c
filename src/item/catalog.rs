//! Item catalog - known items, tag groups, and enchantment definitions
//!
//! The catalog is the environment's registry as seen by the sorter. Regex
//! patterns in category definitions expand against `ids()` in catalog order.

use ahash::AHashMap;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::core::error::Result;
use crate::item::stack::{normalize_key, ItemId};

/// Stack size used for items the catalog does not list
pub const DEFAULT_MAX_STACK: u32 = 64;

/// Per-item definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemDef {
    pub max_stack: u32,
}

/// Enchantment definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnchantmentDef {
    pub max_level: u32,
}

/// Registry of item types, tag groups, and enchantments
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    /// Ids in registration order
    order: Vec<ItemId>,
    items: AHashMap<ItemId, ItemDef>,
    tags: AHashMap<String, Vec<ItemId>>,
    enchantments: AHashMap<String, EnchantmentDef>,
}

impl ItemCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an item; re-registering updates its definition in place
    pub fn add_item(&mut self, id: impl Into<ItemId>, max_stack: u32) -> &mut Self {
        let id = id.into();
        if !self.items.contains_key(&id) {
            self.order.push(id.clone());
        }
        self.items.insert(id, ItemDef { max_stack });
        self
    }

    /// Register a tag group; members are normalized item ids
    pub fn add_tag<I, S>(&mut self, key: &str, members: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let members = members.into_iter().map(|m| ItemId::new(m.as_ref())).collect();
        self.tags.insert(normalize_key(key), members);
        self
    }

    pub fn add_enchantment(&mut self, id: &str, max_level: u32) -> &mut Self {
        self.enchantments
            .insert(normalize_key(id), EnchantmentDef { max_level });
        self
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.items.contains_key(id)
    }

    /// All known ids in registration order
    pub fn ids(&self) -> &[ItemId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Per-type maximum stack size
    pub fn max_stack(&self, id: &ItemId) -> u32 {
        self.items
            .get(id)
            .map(|def| def.max_stack)
            .unwrap_or(DEFAULT_MAX_STACK)
    }

    /// Effective stack limit: the per-type maximum capped at the global maximum
    pub fn stack_limit(&self, id: &ItemId, global_max: u32) -> u32 {
        self.max_stack(id).min(global_max).max(1)
    }

    /// Members of a tag group
    ///
    /// An unknown tag resolves to an empty set with a warning, never an error.
    pub fn tag_members(&self, key: &str) -> Vec<ItemId> {
        let key = normalize_key(key.trim_start_matches('#'));
        match self.tags.get(&key) {
            Some(members) => members.clone(),
            None => {
                tracing::warn!("Unknown item tag '#{}', treating as empty", key);
                Vec::new()
            }
        }
    }

    pub fn enchantment(&self, id: &str) -> Option<&EnchantmentDef> {
        self.enchantments.get(&normalize_key(id))
    }

    /// Load a catalog from a TOML file
    pub fn load_from_toml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Parse a catalog from a TOML string
    ///
    /// ```toml
    /// [items]
    /// "minecraft:stone" = { max_stack = 64 }
    /// "minecraft:diamond_sword" = 1
    ///
    /// [tags]
    /// "minecraft:logs" = ["oak_log", "birch_log"]
    ///
    /// [enchantments]
    /// "minecraft:sharpness" = { max_level = 5 }
    /// ```
    pub fn parse_toml(content: &str) -> Result<Self> {
        let data: TomlCatalog = toml::from_str(content)?;

        let mut catalog = Self::new();
        for (id, item) in data.items {
            catalog.add_item(ItemId::new(&id), item.max_stack());
        }
        for (key, members) in data.tags {
            catalog.add_tag(&key, members);
        }
        for (id, enchantment) in data.enchantments {
            catalog.add_enchantment(&id, enchantment.max_level);
        }
        Ok(catalog)
    }
}

/// TOML representation of a catalog file
///
/// `BTreeMap` keeps item registration order deterministic (sorted by id).
#[derive(Debug, Deserialize)]
struct TomlCatalog {
    #[serde(default)]
    items: BTreeMap<String, TomlItem>,
    #[serde(default)]
    tags: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    enchantments: BTreeMap<String, TomlEnchantment>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TomlItem {
    MaxStack(u32),
    Table {
        #[serde(default = "default_max_stack")]
        max_stack: u32,
    },
}

impl TomlItem {
    fn max_stack(&self) -> u32 {
        match self {
            TomlItem::MaxStack(n) => *n,
            TomlItem::Table { max_stack } => *max_stack,
        }
    }
}

fn default_max_stack() -> u32 {
    DEFAULT_MAX_STACK
}

#[derive(Debug, Deserialize)]
struct TomlEnchantment {
    max_level: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_catalog() {
        let catalog = ItemCatalog::parse_toml(
            r#"
            [items]
            "minecraft:stone" = { max_stack = 64 }
            "diamond_sword" = 1
            "ender_pearl" = {}

            [tags]
            "minecraft:logs" = ["oak_log", "birch_log"]

            [enchantments]
            sharpness = { max_level = 5 }
            "#,
        )
        .unwrap();

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.max_stack(&ItemId::new("diamond_sword")), 1);
        assert_eq!(catalog.max_stack(&ItemId::new("ender_pearl")), 64);
        assert_eq!(catalog.tag_members("#logs").len(), 2);
        assert_eq!(catalog.enchantment("minecraft:sharpness").unwrap().max_level, 5);
    }

    #[test]
    fn test_unknown_tag_is_empty() {
        let catalog = ItemCatalog::new();
        assert!(catalog.tag_members("#nothing").is_empty());
    }

    #[test]
    fn test_stack_limit_is_capped() {
        let mut catalog = ItemCatalog::new();
        catalog.add_item("stone", 64).add_item("pearl", 16).add_item("weird", 500);
        assert_eq!(catalog.stack_limit(&ItemId::new("stone"), 99), 64);
        assert_eq!(catalog.stack_limit(&ItemId::new("pearl"), 99), 16);
        assert_eq!(catalog.stack_limit(&ItemId::new("weird"), 99), 99);
        assert_eq!(catalog.stack_limit(&ItemId::new("unlisted"), 32), 32);
    }

    #[test]
    fn test_registration_order_is_kept() {
        let mut catalog = ItemCatalog::new();
        catalog.add_item("b", 64).add_item("a", 64).add_item("b", 16);
        let ids: Vec<&str> = catalog.ids().iter().map(ItemId::as_str).collect();
        assert_eq!(ids, vec!["minecraft:b", "minecraft:a"]);
        assert_eq!(catalog.max_stack(&ItemId::new("b")), 16);
    }
}
