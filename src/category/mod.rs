//! Category layer - filters, rule definitions, and the category graph

pub mod definition;
pub mod filter;
pub mod graph;
pub mod loader;
pub mod registry;

pub use definition::{normalize_category_name, Category, ItemPattern};
pub use filter::{filters_match, AttributeMatch, EnchantMode, Filter};
pub use graph::{CategoryGraph, CategorySummary, FlattenReport};
pub use loader::{parse_categories, parse_category};
pub use registry::{CategoryRegistry, ConfigSource};
