//! The sorting engine
//!
//! One `Sorter` serves one operation: it holds exclusive access to the world
//! and builds the label cache at most once. Stacks are classified through
//! the flattened category graph and routed column by column in priority
//! order. Container items are sorted from the inside out, and anything that
//! could not be placed comes back in its original nesting.

use crate::category::{Category, CategoryGraph};
use crate::core::config::{config, SorterConfig};
use crate::core::types::BlockPos;
use crate::item::{ItemCatalog, ItemId, ItemStack};
use crate::sorting::distribute::distribute;
use crate::sorting::result::{MoveRecord, SortResult};
use crate::storage::{anchored_container, resolve_storage_for, BinGroup, ScanContext, World};

pub struct Sorter<'a, W: World + ?Sized> {
    graph: &'a CategoryGraph,
    catalog: &'a ItemCatalog,
    config: SorterConfig,
    world: &'a mut W,
    scan: ScanContext,
    moves: Vec<MoveRecord>,
}

impl<'a, W: World + ?Sized> Sorter<'a, W> {
    /// A sorter centred on `center`, using the global config
    ///
    /// The graph must already be flattened; an unflattened graph matches
    /// nothing.
    pub fn new(
        graph: &'a CategoryGraph,
        catalog: &'a ItemCatalog,
        world: &'a mut W,
        center: BlockPos,
    ) -> Self {
        let config = config().clone();
        let scan = ScanContext::new(center, config.scan_radius);
        Self {
            graph,
            catalog,
            config,
            world,
            scan,
            moves: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: SorterConfig) -> Self {
        self.scan = ScanContext::new(self.scan.center(), config.scan_radius);
        self.config = config;
        self
    }

    /// Sort a collection of stacks into labelled storage
    pub fn sort(&mut self, stacks: Vec<ItemStack>, preview: bool) -> SortResult {
        let result = self.sort_all(stacks, preview);
        tracing::info!(
            "Sorted {} items into {} categories ({} unmatched, {} overflowed, {} leftover stacks{})",
            result.moved,
            result.per_category.len(),
            result.unmatched.len(),
            result.overflowed.len(),
            result.leftovers.len(),
            if preview { ", preview" } else { "" }
        );
        result
    }

    fn sort_all(&mut self, stacks: Vec<ItemStack>, preview: bool) -> SortResult {
        let mut result = SortResult::default();
        for stack in stacks {
            self.sort_stack(stack, preview, &mut result);
        }
        result
    }

    fn sort_stack(&mut self, mut stack: ItemStack, preview: bool, result: &mut SortResult) {
        if stack.is_empty() {
            return;
        }

        if stack.is_compound() {
            let threshold = self.config.uniform_container_threshold;
            if let Some(inner) = stack.uniform_contents(threshold).cloned() {
                // Routed whole by what it holds; filters are not consulted
                let categories = self.category_names(self.graph.matching_categories(&inner));
                tracing::debug!("Routing {} whole as {}", stack.id, inner);
                self.route(stack, &inner, categories, preview, result);
                return;
            }

            if !stack.nested().is_empty() {
                let inner = self.sort_all(stack.nested().to_vec(), preview);
                result.absorb(&inner);
                let has_leftovers = !inner.leftovers.is_empty();
                if !preview {
                    stack.replace_nested(inner.leftovers);
                }
                if has_leftovers {
                    result.leftovers.push(stack);
                    return;
                }
            }
        }

        let categories =
            self.category_names(self.graph.matching_categories_for(&stack, self.catalog));
        let id = stack.id.clone();
        self.route(stack, &id, categories, preview, result);
    }

    fn category_names(&self, categories: Vec<&Category>) -> Vec<String> {
        categories.into_iter().map(|c| c.name.clone()).collect()
    }

    /// Offer the stack to each category's column in order
    fn route(
        &mut self,
        mut stack: ItemStack,
        key: &ItemId,
        categories: Vec<String>,
        preview: bool,
        result: &mut SortResult,
    ) {
        let Some(first) = categories.first().cloned() else {
            result.record_unmatched(key);
            result.leftovers.push(stack);
            return;
        };

        for category in &categories {
            if stack.is_empty() {
                break;
            }
            let cache = self.scan.labels(&*self.world);
            let groups = resolve_storage_for(&*self.world, cache, category);
            if groups.is_empty() {
                continue;
            }

            let placed = distribute(
                &mut *self.world,
                self.catalog,
                self.config.max_stack_size,
                &mut stack,
                &groups,
                preview,
            );
            if placed.moved == 0 {
                continue;
            }
            result.record_move(category, placed.moved);
            if let Some(destination) = placed.destination {
                tracing::debug!("{} x{} -> {} at {}", stack.id, placed.moved, category, destination);
                self.moves.push(MoveRecord {
                    item: stack.id.clone(),
                    count: placed.moved,
                    category: category.clone(),
                    destination,
                    partial: !stack.is_empty(),
                    preview,
                });
            }
        }

        if !stack.is_empty() {
            tracing::debug!("{} x{} did not fit in {}", stack.id, stack.count, first);
            result.overflowed.insert(first);
            result.leftovers.push(stack);
        }
    }

    /// The bin group carrying the input marker, if any
    fn input_group(&mut self) -> Option<BinGroup> {
        let cache = self.scan.labels(&*self.world);
        let pos = anchored_container(&*self.world, cache, &self.config.input_label)?;
        Some(BinGroup::at(&*self.world, pos))
    }

    /// Sort everything in the input storage
    ///
    /// Leftovers go back into the input's free slots. In preview the input
    /// is read but not emptied.
    pub fn sort_input(&mut self, preview: bool) -> SortResult {
        let Some(group) = self.input_group() else {
            tracing::warn!(
                "No {} storage within {} blocks of {}",
                self.config.input_label,
                self.config.scan_radius,
                self.scan.center()
            );
            return SortResult::default();
        };

        let mut stacks = Vec::new();
        for &pos in &group.positions {
            if preview {
                if let Some(container) = self.world.container_at(pos) {
                    stacks.extend(container.stacks().cloned());
                }
            } else if let Some(container) = self.world.container_at_mut(pos) {
                stacks.extend(container.take_all());
            }
        }

        let result = self.sort(stacks, preview);
        if !preview {
            self.restore(&group, &result.leftovers);
        }
        result
    }

    fn restore(&mut self, group: &BinGroup, leftovers: &[ItemStack]) {
        'stacks: for stack in leftovers {
            let mut pending = stack.clone();
            for &pos in &group.positions {
                let Some(container) = self.world.container_at_mut(pos) else {
                    continue;
                };
                match container.insert(pending) {
                    Ok(_) => continue 'stacks,
                    Err(back) => pending = back,
                }
            }
            tracing::error!("No room to return {} to the input storage", pending);
        }
    }

    /// Every container in range holding `id`, nearest first
    pub fn locate(&mut self, id: &ItemId) -> Vec<(BlockPos, u32)> {
        let center = self.scan.center();
        let positions = self.scan.labels(&*self.world).containers().to_vec();

        let mut found: Vec<(BlockPos, u32)> = positions
            .into_iter()
            .filter_map(|pos| {
                let container = self.world.container_at(pos)?;
                let total: u32 = container.stacks().map(|s| s.total_of(id)).sum();
                (total > 0).then_some((pos, total))
            })
            .collect();
        found.sort_by_key(|(pos, _)| (pos.distance_squared(&center), *pos));
        found
    }

    /// Moves recorded so far
    pub fn moves(&self) -> &[MoveRecord] {
        &self.moves
    }

    pub fn take_moves(&mut self) -> Vec<MoveRecord> {
        std::mem::take(&mut self.moves)
    }
}
