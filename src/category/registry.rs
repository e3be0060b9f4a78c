//! Process-wide category graph with atomic reload
//!
//! Readers take an `Arc` snapshot and keep using it for a whole sort, so a
//! reload never exposes a half-built graph: the replacement is loaded and
//! flattened first, then swapped in under the write lock.

use std::sync::{Arc, RwLock};

use crate::category::graph::{CategoryGraph, FlattenReport};
use crate::core::config::SorterConfig;
use crate::core::error::Result;
use crate::item::ItemCatalog;

/// A named configuration unit
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub name: String,
    pub content: String,
}

impl ConfigSource {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

pub struct CategoryRegistry {
    current: RwLock<Arc<CategoryGraph>>,
}

impl CategoryRegistry {
    pub fn new(graph: CategoryGraph) -> Self {
        Self {
            current: RwLock::new(Arc::new(graph)),
        }
    }

    /// Build and flatten a graph from configuration units
    pub fn build(
        sources: &[ConfigSource],
        catalog: &ItemCatalog,
        config: &SorterConfig,
    ) -> Result<(CategoryGraph, FlattenReport)> {
        let mut graph = CategoryGraph::new(config);
        for source in sources {
            graph.load(&source.name, &source.content, catalog)?;
        }
        let report = graph.flatten(catalog);
        Ok((graph, report))
    }

    /// The graph in effect right now
    pub fn snapshot(&self) -> Arc<CategoryGraph> {
        let guard = self
            .current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    /// Replace the graph wholesale
    ///
    /// On error the previous graph stays in effect.
    pub fn reload(
        &self,
        sources: &[ConfigSource],
        catalog: &ItemCatalog,
        config: &SorterConfig,
    ) -> Result<FlattenReport> {
        let (graph, report) = Self::build(sources, catalog, config)?;
        let count = graph.len();
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::new(graph);
        tracing::info!("Reloaded {} categories", count);
        Ok(report)
    }
}
