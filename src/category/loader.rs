//! Load category definitions from TOML
//!
//! Every top-level table is one category:
//!
//! ```toml
//! [tools]
//! items = ["diamond_pickaxe", "#minecraft:axes", { match = "_shovel$" }]
//! includes = ["weapons"]
//! filters = [{ enchanted = "any" }, { "!name" = "any" }]
//! priority = 5
//! ```
//!
//! A malformed category is skipped with a warning; its siblings still load.

use regex::Regex;

use crate::category::definition::{normalize_category_name, Category, ItemPattern};
use crate::category::filter::Filter;
use crate::core::error::{Result, SortError};
use crate::item::{normalize_key, ItemCatalog, ItemId};

const KNOWN_KEYS: [&str; 4] = ["items", "includes", "filters", "priority"];

/// Parse one configuration unit into categories
///
/// Only a document that is not valid TOML fails as a whole.
pub fn parse_categories(
    source: &str,
    content: &str,
    catalog: &ItemCatalog,
    default_priority: i32,
) -> Result<Vec<Category>> {
    let document: toml::Table = content.parse()?;

    let mut categories = Vec::with_capacity(document.len());
    for (name, value) in &document {
        match parse_category(name, value, catalog, default_priority) {
            Ok(mut category) => {
                category.source = source.to_string();
                categories.push(category);
            }
            Err(e) => {
                tracing::warn!("Skipping category '{}' from {}: {}", name, source, e);
            }
        }
    }
    Ok(categories)
}

/// Parse a single category table
pub fn parse_category(
    name: &str,
    value: &toml::Value,
    catalog: &ItemCatalog,
    default_priority: i32,
) -> Result<Category> {
    let invalid = |reason: String| SortError::invalid_category(name, reason);

    if normalize_category_name(name).is_empty() {
        return Err(invalid("empty category name".into()));
    }
    let table = value
        .as_table()
        .ok_or_else(|| invalid(format!("expected a table, got {}", value.type_str())))?;

    if let Some(key) = table.keys().find(|k| !KNOWN_KEYS.contains(&k.as_str())) {
        return Err(invalid(format!("unknown key '{}'", key)));
    }

    let mut category = Category::new(name, default_priority);

    if let Some(priority) = table.get("priority") {
        let priority = priority
            .as_integer()
            .and_then(|p| i32::try_from(p).ok())
            .ok_or_else(|| invalid(format!("priority must be an integer, got {}", priority)))?;
        category.priority = priority;
    }

    if let Some(items) = table.get("items") {
        let items = items
            .as_array()
            .ok_or_else(|| invalid("items must be an array".into()))?;
        for entry in items {
            category
                .items
                .push(parse_item_pattern(entry, catalog).map_err(|e| invalid(e.to_string()))?);
        }
    }

    if let Some(includes) = table.get("includes") {
        let includes = includes
            .as_array()
            .ok_or_else(|| invalid("includes must be an array".into()))?;
        for include in includes {
            let include = include
                .as_str()
                .map(normalize_category_name)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| invalid(format!("bad include {}", include)))?;
            category.includes.push(include);
        }
    }

    if let Some(filters) = table.get("filters") {
        category.filters = parse_filters(filters, catalog).map_err(|e| invalid(e.to_string()))?;
    }

    Ok(category)
}

fn parse_item_pattern(entry: &toml::Value, catalog: &ItemCatalog) -> Result<ItemPattern> {
    match entry {
        toml::Value::String(raw) => {
            let raw = raw.trim();
            if let Some(tag) = raw.strip_prefix('#') {
                if tag.trim().is_empty() {
                    return Err(SortError::InvalidFilter("empty tag reference".into()));
                }
                return Ok(ItemPattern::Tag(normalize_key(tag)));
            }
            let id = ItemId::new(raw);
            if raw.is_empty() || !catalog.contains(&id) {
                return Err(SortError::UnknownItem(raw.to_string()));
            }
            Ok(ItemPattern::Exact(id))
        }
        toml::Value::Table(table) => {
            let mut entries = table.iter();
            let (key, value) = match (entries.next(), entries.next()) {
                (Some(only), None) => only,
                _ => {
                    return Err(SortError::InvalidFilter(
                        "pattern entries take exactly one of 'match' or 'filter'".into(),
                    ))
                }
            };
            let pattern = value
                .as_str()
                .filter(|p| !p.is_empty())
                .ok_or_else(|| SortError::InvalidFilter(format!("'{}' needs a pattern string", key)))?;
            let regex = Regex::new(pattern).map_err(|source| SortError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
            match key.as_str() {
                "match" => Ok(ItemPattern::Match(regex)),
                "filter" => Ok(ItemPattern::Filter(regex)),
                other => Err(SortError::InvalidFilter(format!(
                    "unknown pattern key '{}'",
                    other
                ))),
            }
        }
        other => Err(SortError::InvalidFilter(format!(
            "item entries must be strings or tables, got {}",
            other.type_str()
        ))),
    }
}

/// Filters are a table of key/value pairs or an array of such tables
fn parse_filters(value: &toml::Value, catalog: &ItemCatalog) -> Result<Vec<Filter>> {
    let tables: Vec<&toml::Table> = match value {
        toml::Value::Table(table) => vec![table],
        toml::Value::Array(entries) => entries
            .iter()
            .map(|e| {
                e.as_table()
                    .ok_or_else(|| SortError::InvalidFilter(format!("filter entries must be tables, got {}", e)))
            })
            .collect::<Result<_>>()?,
        other => {
            return Err(SortError::InvalidFilter(format!(
                "filters must be a table or array, got {}",
                other.type_str()
            )))
        }
    };

    let mut filters = Vec::new();
    for table in tables {
        if table.is_empty() {
            return Err(SortError::InvalidFilter("empty filter entry".into()));
        }
        for (key, value) in table {
            filters.push(Filter::parse(key, value, catalog)?);
        }
    }
    Ok(filters)
}
