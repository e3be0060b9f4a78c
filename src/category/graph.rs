//! Category graph - loading, include flattening, and lookup
//!
//! Categories are kept in load order. Flattening resolves every node's
//! membership once and builds a reverse index from item id to the
//! categories containing it, ordered by `(priority, load order)`.

use ahash::{AHashMap, AHashSet};
use std::path::Path;

use crate::category::definition::{normalize_category_name, Category};
use crate::category::loader::parse_categories;
use crate::core::config::{CyclePolicy, SorterConfig};
use crate::core::error::{Result, SortError};
use crate::item::{ItemCatalog, ItemId, ItemStack};

/// Outcome of a flatten pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlattenReport {
    /// Categories with a resolved membership
    pub resolved: usize,
    /// Categories that match no item
    pub empty: Vec<String>,
    /// Include cycles that failed resolution (reject policy only)
    pub cycles: Vec<Vec<String>>,
}

/// Per-category overview
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CategorySummary {
    pub name: String,
    pub priority: i32,
    pub items: usize,
    pub includes: Vec<String>,
}

/// Named classification rules and their resolved membership
#[derive(Debug, Clone)]
pub struct CategoryGraph {
    categories: Vec<Category>,
    index: AHashMap<String, usize>,
    /// Item id -> category indices ordered by (priority, load order)
    by_item: AHashMap<ItemId, Vec<usize>>,
    /// Category index -> include cycle that failed it
    failures: AHashMap<usize, Vec<usize>>,
    policy: CyclePolicy,
    default_priority: i32,
}

impl CategoryGraph {
    pub fn new(config: &SorterConfig) -> Self {
        Self {
            categories: Vec::new(),
            index: AHashMap::new(),
            by_item: AHashMap::new(),
            failures: AHashMap::new(),
            policy: config.cycle_policy,
            default_priority: config.default_priority,
        }
    }

    /// Load one configuration unit, returning how many categories it defined
    ///
    /// A redefinition replaces the earlier category in place. Loading after
    /// a flatten discards every resolved membership.
    pub fn load(&mut self, source: &str, content: &str, catalog: &ItemCatalog) -> Result<usize> {
        let parsed = parse_categories(source, content, catalog, self.default_priority)?;
        let count = parsed.len();
        for category in parsed {
            self.insert(category);
        }
        tracing::info!("Loaded {} categories from {}", count, source);
        Ok(count)
    }

    /// Load a configuration unit from disk
    pub fn load_file(&mut self, path: &Path, catalog: &ItemCatalog) -> Result<usize> {
        let content = std::fs::read_to_string(path)?;
        self.load(&path.display().to_string(), &content, catalog)
    }

    /// Add or replace a category
    pub fn insert(&mut self, category: Category) {
        self.invalidate();
        match self.index.get(&category.name) {
            Some(&idx) => {
                tracing::warn!(
                    "Category '{}' from {} replaces the definition from {}",
                    category.name,
                    category.source,
                    self.categories[idx].source
                );
                self.categories[idx] = category;
            }
            None => {
                self.index.insert(category.name.clone(), self.categories.len());
                self.categories.push(category);
            }
        }
    }

    fn invalidate(&mut self) {
        for category in &mut self.categories {
            category.resolved = None;
        }
        self.by_item.clear();
        self.failures.clear();
    }

    pub fn get(&self, name: &str) -> Option<&Category> {
        self.index
            .get(&normalize_category_name(name))
            .map(|&idx| &self.categories[idx])
    }

    /// Categories in load order
    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Resolve one category's membership (memoized)
    pub fn resolve(&mut self, name: &str, catalog: &ItemCatalog) -> Result<&AHashSet<ItemId>> {
        let name = normalize_category_name(name);
        let idx = *self
            .index
            .get(&name)
            .ok_or_else(|| SortError::invalid_category(&name, "not defined"))?;

        if let Err(members) = self.resolve_index(idx, catalog, &mut Vec::new()) {
            return Err(self.cycle_error(&members));
        }
        if let Some(members) = self.failures.get(&idx) {
            return Err(self.cycle_error(members));
        }
        self.categories[idx]
            .resolved
            .as_ref()
            .ok_or_else(|| SortError::invalid_category(&name, "unresolved"))
    }

    /// Resolve `idx`, with `stack` holding the categories currently in progress
    ///
    /// Under the reject policy a cycle fails with its member indices; every
    /// member resolves to the empty set and the error travels up until it
    /// leaves the cycle.
    fn resolve_index(
        &mut self,
        idx: usize,
        catalog: &ItemCatalog,
        stack: &mut Vec<usize>,
    ) -> std::result::Result<(), Vec<usize>> {
        if self.categories[idx].resolved.is_some() {
            return Ok(());
        }
        if let Some(pos) = stack.iter().position(|&i| i == idx) {
            let members = stack[pos..].to_vec();
            return match self.policy {
                CyclePolicy::Tolerate => {
                    tracing::warn!(
                        "Include cycle {}, using the partial membership of '{}'",
                        self.cycle_path(&members),
                        self.categories[idx].name
                    );
                    Ok(())
                }
                CyclePolicy::Reject => Err(members),
            };
        }

        stack.push(idx);
        let mut set = self.categories[idx].own_items(catalog);
        let includes = self.categories[idx].includes.clone();

        for include in includes {
            let Some(&child) = self.index.get(&include) else {
                tracing::warn!(
                    "Category '{}' includes undefined category '{}'",
                    self.categories[idx].name,
                    include
                );
                continue;
            };
            match self.resolve_index(child, catalog, stack) {
                Ok(()) => {
                    // An in-progress child has no membership yet and adds nothing
                    if let Some(items) = &self.categories[child].resolved {
                        set.extend(items.iter().cloned());
                    }
                }
                Err(members) if members.contains(&idx) => {
                    stack.pop();
                    self.categories[idx].resolved = Some(AHashSet::new());
                    self.failures.insert(idx, members.clone());
                    return Err(members);
                }
                Err(members) => {
                    tracing::warn!(
                        "Category '{}' skips include '{}': {}",
                        self.categories[idx].name,
                        include,
                        self.cycle_error(&members)
                    );
                }
            }
        }

        stack.pop();
        self.categories[idx].resolved = Some(set);
        Ok(())
    }

    fn cycle_path(&self, members: &[usize]) -> String {
        let mut names: Vec<&str> = members
            .iter()
            .map(|&i| self.categories[i].name.as_str())
            .collect();
        if let Some(first) = names.first().copied() {
            names.push(first);
        }
        names.join(" -> ")
    }

    fn cycle_error(&self, members: &[usize]) -> SortError {
        let mut path: Vec<String> = members
            .iter()
            .map(|&i| self.categories[i].name.clone())
            .collect();
        if let Some(first) = path.first().cloned() {
            path.push(first);
        }
        SortError::CycleDetected { path }
    }

    /// Resolve every category once and rebuild the reverse index
    ///
    /// Calling this again without loading anything yields the same result.
    pub fn flatten(&mut self, catalog: &ItemCatalog) -> FlattenReport {
        for idx in 0..self.categories.len() {
            if let Err(members) = self.resolve_index(idx, catalog, &mut Vec::new()) {
                tracing::warn!("{}", self.cycle_error(&members));
            }
        }

        self.by_item.clear();
        for (idx, category) in self.categories.iter().enumerate() {
            for id in category.resolved.iter().flatten() {
                self.by_item.entry(id.clone()).or_default().push(idx);
            }
        }
        let categories = &self.categories;
        for indices in self.by_item.values_mut() {
            indices.sort_by_key(|&i| (categories[i].priority, i));
        }

        let mut report = FlattenReport {
            resolved: self.categories.iter().filter(|c| c.is_resolved()).count(),
            ..FlattenReport::default()
        };
        for (idx, category) in self.categories.iter().enumerate() {
            if self.failures.contains_key(&idx) {
                continue;
            }
            if category.resolved.as_ref().map_or(true, |s| s.is_empty()) {
                tracing::warn!("Category '{}' matches no items", category.name);
                report.empty.push(category.name.clone());
            }
        }
        let mut seen: AHashSet<Vec<usize>> = AHashSet::new();
        for members in self.failures.values() {
            let mut key = members.clone();
            key.sort_unstable();
            if seen.insert(key) {
                if let SortError::CycleDetected { path } = self.cycle_error(members) {
                    report.cycles.push(path);
                }
            }
        }
        report.cycles.sort();
        report
    }

    /// Categories whose membership contains `id`, by ascending priority
    ///
    /// Equal priorities keep load order. Empty before `flatten`.
    pub fn matching_categories(&self, id: &ItemId) -> Vec<&Category> {
        self.by_item
            .get(id)
            .map(|indices| indices.iter().map(|&i| &self.categories[i]).collect())
            .unwrap_or_default()
    }

    /// As [`matching_categories`](Self::matching_categories), keeping only
    /// categories whose filters all accept the stack
    pub fn matching_categories_for(&self, stack: &ItemStack, catalog: &ItemCatalog) -> Vec<&Category> {
        self.matching_categories(&stack.id)
            .into_iter()
            .filter(|c| c.accepts(stack, catalog))
            .collect()
    }

    pub fn summary(&self) -> Vec<CategorySummary> {
        self.categories
            .iter()
            .map(|c| CategorySummary {
                name: c.name.clone(),
                priority: c.priority,
                items: c.resolved.as_ref().map_or(0, |s| s.len()),
                includes: c.includes.clone(),
            })
            .collect()
    }
}
