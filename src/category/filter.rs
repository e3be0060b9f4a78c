//! Filter predicates over item stacks
//!
//! A category's effective filter is the AND of its listed predicates.
//! Configuration keys prefixed with `!` produce the negated predicate.

use crate::core::error::{Result, SortError};
use crate::item::{normalize_key, ItemCatalog, ItemStack};

/// Sentinel value matching any present attribute
pub const ANY: &str = "any";

/// Case-insensitive attribute comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeMatch {
    /// Attribute is present with any value
    Any,
    /// Attribute equals this value (stored lowercase)
    Exact(String),
}

impl AttributeMatch {
    pub fn parse(value: &str) -> Self {
        let value = value.trim().to_lowercase();
        if value == ANY {
            AttributeMatch::Any
        } else {
            AttributeMatch::Exact(value)
        }
    }

    fn matches(&self, attribute: Option<&str>, normalize: fn(&str) -> String) -> bool {
        match (self, attribute) {
            (_, None) => false,
            (AttributeMatch::Any, Some(_)) => true,
            (AttributeMatch::Exact(expected), Some(actual)) => normalize(expected) == normalize(actual),
        }
    }
}

/// How an enchantment filter inspects a stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnchantMode {
    /// Carries at least one enchantment
    Any,
    /// Carries an enchantment at its maximum level
    Max,
    /// Carries this specific enchantment (normalized id)
    Single(String),
}

/// A boolean test over a stack's attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    CustomName(AttributeMatch),
    Potion(AttributeMatch),
    /// Per-type maximum stack size is not 1
    Stackable,
    Enchanted(EnchantMode),
    Not(Box<Filter>),
}

fn normalize_name(value: &str) -> String {
    value.trim().to_lowercase()
}

impl Filter {
    /// Build an enchantment filter for one enchantment id
    ///
    /// Fails when the catalog does not know the enchantment.
    pub fn single_enchantment(id: &str, catalog: &ItemCatalog) -> Result<Filter> {
        if catalog.enchantment(id).is_none() {
            return Err(SortError::UnknownEnchantment(normalize_key(id)));
        }
        Ok(Filter::Enchanted(EnchantMode::Single(normalize_key(id))))
    }

    pub fn negate(self) -> Filter {
        Filter::Not(Box::new(self))
    }

    /// Build a filter from one configuration entry
    pub fn parse(key: &str, value: &toml::Value, catalog: &ItemCatalog) -> Result<Filter> {
        let (negated, base) = match key.trim().strip_prefix('!') {
            Some(rest) => (true, rest.trim()),
            None => (false, key.trim()),
        };

        let filter = match base.to_lowercase().as_str() {
            "name" => attribute_filter(base, value, Filter::CustomName)?,
            "potion" => attribute_filter(base, value, Filter::Potion)?,
            "stackable" => match value {
                toml::Value::Boolean(true) => Filter::Stackable,
                toml::Value::Boolean(false) => Filter::Stackable.negate(),
                other => {
                    return Err(SortError::InvalidFilter(format!(
                        "'stackable' expects a boolean, got {}",
                        other
                    )))
                }
            },
            "enchanted" | "enchantment" => match value {
                toml::Value::Boolean(true) => Filter::Enchanted(EnchantMode::Any),
                toml::Value::Boolean(false) => Filter::Enchanted(EnchantMode::Any).negate(),
                toml::Value::String(s) => {
                    let s = non_empty(base, s)?;
                    match s.to_lowercase().as_str() {
                        ANY => Filter::Enchanted(EnchantMode::Any),
                        "max" => Filter::Enchanted(EnchantMode::Max),
                        _ => Filter::single_enchantment(s, catalog)?,
                    }
                }
                other => {
                    return Err(SortError::InvalidFilter(format!(
                        "'{}' expects a string or boolean, got {}",
                        base, other
                    )))
                }
            },
            _ => return Err(SortError::InvalidFilter(format!("unknown filter key '{}'", key))),
        };

        Ok(if negated { filter.negate() } else { filter })
    }

    /// Evaluate against a stack; empty stacks fail every non-negated filter
    pub fn matches(&self, stack: &ItemStack, catalog: &ItemCatalog) -> bool {
        match self {
            Filter::Not(inner) => !inner.matches(stack, catalog),
            _ if stack.is_empty() => false,
            Filter::CustomName(m) => m.matches(stack.meta.custom_name.as_deref(), normalize_name),
            Filter::Potion(m) => m.matches(stack.meta.potion.as_deref(), normalize_key),
            Filter::Stackable => catalog.max_stack(&stack.id) != 1,
            Filter::Enchanted(EnchantMode::Any) => !stack.meta.enchantments.is_empty(),
            Filter::Enchanted(EnchantMode::Max) => {
                stack.meta.enchantments.iter().any(|(id, level)| {
                    catalog
                        .enchantment(id)
                        .map_or(false, |def| *level >= def.max_level)
                })
            }
            Filter::Enchanted(EnchantMode::Single(id)) => stack.meta.enchantments.contains_key(id),
        }
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let show = |m: &AttributeMatch| match m {
            AttributeMatch::Any => ANY.to_string(),
            AttributeMatch::Exact(v) => v.clone(),
        };
        match self {
            Filter::CustomName(m) => write!(f, "name={}", show(m)),
            Filter::Potion(m) => write!(f, "potion={}", show(m)),
            Filter::Stackable => write!(f, "stackable"),
            Filter::Enchanted(EnchantMode::Any) => write!(f, "enchanted=any"),
            Filter::Enchanted(EnchantMode::Max) => write!(f, "enchanted=max"),
            Filter::Enchanted(EnchantMode::Single(id)) => write!(f, "enchanted={}", id),
            Filter::Not(inner) => write!(f, "!{}", inner),
        }
    }
}

/// AND of all filters; an empty list accepts everything
pub fn filters_match(filters: &[Filter], stack: &ItemStack, catalog: &ItemCatalog) -> bool {
    filters.iter().all(|f| f.matches(stack, catalog))
}

fn non_empty<'v>(key: &str, value: &'v str) -> Result<&'v str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(SortError::InvalidFilter(format!("'{}' has an empty value", key)))
    } else {
        Ok(trimmed)
    }
}

fn attribute_filter(
    key: &str,
    value: &toml::Value,
    build: fn(AttributeMatch) -> Filter,
) -> Result<Filter> {
    match value {
        toml::Value::String(s) => Ok(build(AttributeMatch::parse(non_empty(key, s)?))),
        toml::Value::Boolean(true) => Ok(build(AttributeMatch::Any)),
        toml::Value::Boolean(false) => Ok(build(AttributeMatch::Any).negate()),
        other => Err(SortError::InvalidFilter(format!(
            "'{}' expects a string or boolean, got {}",
            key, other
        ))),
    }
}
