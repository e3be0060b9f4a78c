//! Item stacks - typed quantities with optional metadata and nested contents

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Namespace applied to identifiers written without one
pub const DEFAULT_NAMESPACE: &str = "minecraft";

/// Namespaced item identifier (`namespace:path`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ItemId(String);

impl ItemId {
    /// Normalize an identifier: trimmed, lowercase, default namespace
    pub fn new(raw: &str) -> Self {
        Self(normalize_key(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn namespace(&self) -> &str {
        self.0.split_once(':').map(|(ns, _)| ns).unwrap_or(DEFAULT_NAMESPACE)
    }

    pub fn path(&self) -> &str {
        self.0.split_once(':').map(|(_, p)| p).unwrap_or(&self.0)
    }
}

/// Trim, lowercase, and add the default namespace to a registry key
pub fn normalize_key(raw: &str) -> String {
    let key = raw.trim().to_lowercase();
    if key.contains(':') {
        key
    } else {
        format!("{}:{}", DEFAULT_NAMESPACE, key)
    }
}

impl From<String> for ItemId {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<&str> for ItemId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<ItemId> for String {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metadata that distinguishes otherwise identical items
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemMeta {
    /// Enchantment id -> level
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub enchantments: BTreeMap<String, u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_name: Option<String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub damage: u32,
    /// Potion-like variant marker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub potion: Option<String>,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

/// Shape of a container item's nested storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum ContentsKind {
    /// Ordered, slot-bounded storage (shulker-box style)
    Box { slots: usize },
    /// Unordered storage capped by total item count (bundle style)
    Bundle { capacity: u32 },
}

/// Nested stacks carried by a container item
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Contents {
    pub kind: ContentsKind,
    #[serde(default)]
    pub stacks: Vec<ItemStack>,
}

impl Contents {
    pub fn new(kind: ContentsKind, stacks: Vec<ItemStack>) -> Self {
        Self {
            kind,
            stacks: stacks.into_iter().filter(|s| !s.is_empty()).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.iter().all(ItemStack::is_empty)
    }
}

/// A typed quantity of one item
///
/// A count of zero is the canonical empty stack; storage never holds one
/// (see [`normalize_slot`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemStack {
    pub id: ItemId,
    pub count: u32,
    #[serde(default, skip_serializing_if = "is_default_meta")]
    pub meta: ItemMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents: Option<Contents>,
}

fn is_default_meta(meta: &ItemMeta) -> bool {
    *meta == ItemMeta::default()
}

impl ItemStack {
    pub fn new(id: impl Into<ItemId>, count: u32) -> Self {
        Self {
            id: id.into(),
            count,
            meta: ItemMeta::default(),
            contents: None,
        }
    }

    pub fn with_enchantment(mut self, enchantment: &str, level: u32) -> Self {
        self.meta
            .enchantments
            .insert(normalize_key(enchantment), level);
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.meta.custom_name = Some(name.to_string());
        self
    }

    pub fn with_potion(mut self, potion: &str) -> Self {
        self.meta.potion = Some(normalize_key(potion));
        self
    }

    pub fn with_damage(mut self, damage: u32) -> Self {
        self.meta.damage = damage;
        self
    }

    pub fn with_contents(mut self, kind: ContentsKind, stacks: Vec<ItemStack>) -> Self {
        self.contents = Some(Contents::new(kind, stacks));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Mergeable: same item, same metadata, same nested contents
    pub fn is_compatible(&self, other: &ItemStack) -> bool {
        self.id == other.id && self.meta == other.meta && self.contents == other.contents
    }

    /// True for container items, even when their contents are empty
    pub fn is_compound(&self) -> bool {
        self.contents.is_some()
    }

    /// Nested stacks, empty for plain items
    pub fn nested(&self) -> &[ItemStack] {
        self.contents
            .as_ref()
            .map(|c| c.stacks.as_slice())
            .unwrap_or(&[])
    }

    /// The single item id shared by at least `threshold` nested stacks, if
    /// every non-empty nested stack has that id
    pub fn uniform_contents(&self, threshold: usize) -> Option<&ItemId> {
        let mut stacks = self.nested().iter().filter(|s| !s.is_empty());
        let first = stacks.next()?;
        let mut seen = 1;
        for stack in stacks {
            if stack.id != first.id {
                return None;
            }
            seen += 1;
        }
        (seen >= threshold).then_some(&first.id)
    }

    /// Replace nested stacks, keeping the contents kind
    ///
    /// With no stacks left the contents become an explicitly empty value,
    /// never `None`.
    pub fn replace_nested(&mut self, stacks: Vec<ItemStack>) {
        if let Some(contents) = self.contents.as_mut() {
            *contents = Contents::new(contents.kind, stacks);
        }
    }

    /// Remove `amount` items, returning how many were removed
    pub fn shrink(&mut self, amount: u32) -> u32 {
        let removed = amount.min(self.count);
        self.count -= removed;
        removed
    }

    /// Move up to `amount` items into a new compatible stack
    pub fn split(&mut self, amount: u32) -> ItemStack {
        let taken = self.shrink(amount);
        self.with_count(taken)
    }

    /// A compatible copy holding `count` items
    pub fn with_count(&self, count: u32) -> ItemStack {
        ItemStack {
            count,
            ..self.clone()
        }
    }

    /// Total items including everything nested inside containers
    pub fn total_of(&self, id: &ItemId) -> u32 {
        let own = if &self.id == id { self.count } else { 0 };
        own + self.nested().iter().map(|s| s.total_of(id)).sum::<u32>()
    }
}

impl std::fmt::Display for ItemStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x {}", self.count, self.id)?;
        if let Some(name) = &self.meta.custom_name {
            write!(f, " \"{}\"", name)?;
        }
        Ok(())
    }
}

/// Canonicalize a slot: a zero-count stack is stored as `None`
pub fn normalize_slot(slot: Option<ItemStack>) -> Option<ItemStack> {
    slot.filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_id_normalization() {
        assert_eq!(ItemId::new(" Stone ").as_str(), "minecraft:stone");
        assert_eq!(ItemId::new("mymod:Gear").as_str(), "mymod:gear");
        assert_eq!(ItemId::new("mymod:gear").namespace(), "mymod");
        assert_eq!(ItemId::new("stone").path(), "stone");
    }

    #[test]
    fn test_compatibility_requires_equal_meta() {
        let plain = ItemStack::new("diamond_sword", 1);
        let sharp = ItemStack::new("diamond_sword", 1).with_enchantment("sharpness", 5);
        assert!(!plain.is_compatible(&sharp));
        assert!(sharp.is_compatible(&sharp.with_count(1)));
        assert!(!plain.is_compatible(&plain.clone().with_name("Blade")));

        let worn = plain.clone().with_damage(12);
        assert!(!plain.is_compatible(&worn));
        assert!(worn.is_compatible(&ItemStack::new("diamond_sword", 1).with_damage(12)));
    }

    #[test]
    fn test_normalize_slot_drops_empty() {
        assert_eq!(normalize_slot(Some(ItemStack::new("stone", 0))), None);
        assert!(normalize_slot(Some(ItemStack::new("stone", 1))).is_some());
    }

    #[test]
    fn test_uniform_contents_threshold() {
        let kind = ContentsKind::Box { slots: 27 };
        let full = ItemStack::new("shulker_box", 1)
            .with_contents(kind, (0..10).map(|_| ItemStack::new("cobblestone", 64)).collect());
        assert_eq!(full.uniform_contents(10), Some(&ItemId::new("cobblestone")));

        let short = ItemStack::new("shulker_box", 1)
            .with_contents(kind, (0..9).map(|_| ItemStack::new("cobblestone", 64)).collect());
        assert_eq!(short.uniform_contents(10), None);

        let mut mixed: Vec<ItemStack> = (0..10).map(|_| ItemStack::new("cobblestone", 64)).collect();
        mixed.push(ItemStack::new("dirt", 1));
        let mixed = ItemStack::new("shulker_box", 1).with_contents(kind, mixed);
        assert_eq!(mixed.uniform_contents(10), None);
    }

    #[test]
    fn test_replace_nested_keeps_explicit_empty() {
        let mut bundle = ItemStack::new("bundle", 1).with_contents(
            ContentsKind::Bundle { capacity: 64 },
            vec![ItemStack::new("string", 3)],
        );
        bundle.replace_nested(Vec::new());
        let contents = bundle.contents.as_ref().unwrap();
        assert!(contents.is_empty());
        assert!(bundle.is_compound());
    }

    #[test]
    fn test_shrink_and_total() {
        let mut stack = ItemStack::new("stone", 10);
        assert_eq!(stack.shrink(4), 4);
        assert_eq!(stack.count, 6);
        assert_eq!(stack.shrink(100), 6);
        assert!(stack.is_empty());

        let mut pile = ItemStack::new("stone", 10).with_name("Pile");
        let part = pile.split(4);
        assert_eq!((part.count, pile.count), (4, 6));
        assert!(part.is_compatible(&pile));
        assert_eq!(pile.split(20).count, 6);

        let nested = ItemStack::new("shulker_box", 1).with_contents(
            ContentsKind::Box { slots: 27 },
            vec![ItemStack::new("stone", 5), ItemStack::new("stone", 7)],
        );
        assert_eq!(nested.total_of(&ItemId::new("stone")), 12);
    }
}
