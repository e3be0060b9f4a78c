//! Category nodes - named classification rules

use ahash::AHashSet;
use regex::Regex;

use crate::category::filter::{filters_match, Filter};
use crate::item::{ItemCatalog, ItemId, ItemStack};

/// One entry of a category's `items` list
#[derive(Debug, Clone)]
pub enum ItemPattern {
    /// A single catalog item
    Exact(ItemId),
    /// Every member of a tag group (normalized key, no `#`)
    Tag(String),
    /// Adds catalog ids containing a regex match
    Match(Regex),
    /// Keeps only ids containing a regex match
    Filter(Regex),
}

/// A named classification rule
#[derive(Debug, Clone)]
pub struct Category {
    pub name: String,
    pub items: Vec<ItemPattern>,
    /// Names of included categories
    pub includes: Vec<String>,
    /// AND-combined stack filters
    pub filters: Vec<Filter>,
    /// Lower runs first
    pub priority: i32,
    /// Configuration unit the category came from
    pub source: String,
    /// Memoized membership, `None` until flattened
    pub(crate) resolved: Option<AHashSet<ItemId>>,
}

impl Category {
    pub fn new(name: &str, priority: i32) -> Self {
        Self {
            name: normalize_category_name(name),
            items: Vec::new(),
            includes: Vec::new(),
            filters: Vec::new(),
            priority,
            source: String::new(),
            resolved: None,
        }
    }

    /// Explicitly listed item ids
    pub fn explicit(&self) -> AHashSet<ItemId> {
        self.items
            .iter()
            .filter_map(|p| match p {
                ItemPattern::Exact(id) => Some(id.clone()),
                _ => None,
            })
            .collect()
    }

    /// Resolved membership, available after flattening
    pub fn resolved(&self) -> Option<&AHashSet<ItemId>> {
        self.resolved.as_ref()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    /// Whether every filter accepts the stack
    pub fn accepts(&self, stack: &ItemStack, catalog: &ItemCatalog) -> bool {
        filters_match(&self.filters, stack, catalog)
    }

    /// Membership from this node's own patterns, before includes
    ///
    /// Exact ids, tags, and `Match` patterns add ids; each `Filter` pattern
    /// then intersects the running set.
    pub(crate) fn own_items(&self, catalog: &ItemCatalog) -> AHashSet<ItemId> {
        let mut set = AHashSet::new();
        for pattern in &self.items {
            match pattern {
                ItemPattern::Exact(id) => {
                    set.insert(id.clone());
                }
                ItemPattern::Tag(key) => set.extend(catalog.tag_members(key)),
                ItemPattern::Match(re) => set.extend(
                    catalog
                        .ids()
                        .iter()
                        .filter(|id| re.is_match(id.as_str()))
                        .cloned(),
                ),
                ItemPattern::Filter(_) => {}
            }
        }
        for pattern in &self.items {
            if let ItemPattern::Filter(re) = pattern {
                set.retain(|id| re.is_match(id.as_str()));
            }
        }
        set
    }
}

/// Category names compare trimmed and lowercase, like marker text
pub fn normalize_category_name(name: &str) -> String {
    name.trim().to_lowercase()
}
