//! Sort outcomes handed to reporting and audit consumers

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::core::types::BlockPos;
use crate::item::{ItemId, ItemStack};

/// Aggregate result of one sort
///
/// Unmatched items and overflowing categories are ordinary outcomes, not
/// errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SortResult {
    /// Items placed (or placeable, in preview)
    pub moved: u32,
    /// Item ids no category claimed
    pub unmatched: BTreeSet<String>,
    /// Categories whose storage could not take everything routed to them
    pub overflowed: BTreeSet<String>,
    /// Stacks that were not fully placed, in their original nesting
    pub leftovers: Vec<ItemStack>,
    /// Category name -> items moved into it
    pub per_category: BTreeMap<String, u32>,
}

impl SortResult {
    /// Merge counters from a nested run; leftovers stay with the caller
    pub fn absorb(&mut self, other: &SortResult) {
        self.moved += other.moved;
        self.unmatched.extend(other.unmatched.iter().cloned());
        self.overflowed.extend(other.overflowed.iter().cloned());
        for (category, count) in &other.per_category {
            *self.per_category.entry(category.clone()).or_insert(0) += count;
        }
    }

    pub(crate) fn record_move(&mut self, category: &str, count: u32) {
        if count == 0 {
            return;
        }
        self.moved += count;
        *self.per_category.entry(category.to_string()).or_insert(0) += count;
    }

    pub(crate) fn record_unmatched(&mut self, id: &ItemId) {
        self.unmatched.insert(id.to_string());
    }

    /// Nothing unmatched, nothing overflowed, nothing left over
    pub fn is_clean(&self) -> bool {
        self.unmatched.is_empty() && self.overflowed.is_empty() && self.leftovers.is_empty()
    }

    /// Items still in leftovers, counting nested contents
    pub fn leftover_count(&self) -> u32 {
        fn count(stack: &ItemStack) -> u32 {
            stack.count + stack.nested().iter().map(count).sum::<u32>()
        }
        self.leftovers.iter().map(count).sum()
    }
}

/// One `distribute` outcome, for audit consumers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveRecord {
    pub item: ItemId,
    pub count: u32,
    pub category: String,
    /// First container that received items
    pub destination: BlockPos,
    /// The stack was not fully placed by this move
    pub partial: bool,
    pub preview: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absorb_merges_counters_only() {
        let mut outer = SortResult::default();
        outer.record_move("ores", 5);

        let mut inner = SortResult::default();
        inner.record_move("ores", 3);
        inner.record_move("wood", 2);
        inner.record_unmatched(&ItemId::new("bedrock"));
        inner.overflowed.insert("wood".into());
        inner.leftovers.push(ItemStack::new("bedrock", 1));

        outer.absorb(&inner);
        assert_eq!(outer.moved, 10);
        assert_eq!(outer.per_category["ores"], 8);
        assert_eq!(outer.per_category["wood"], 2);
        assert!(outer.unmatched.contains("minecraft:bedrock"));
        assert!(outer.overflowed.contains("wood"));
        assert!(outer.leftovers.is_empty());
    }

    #[test]
    fn test_zero_moves_are_not_recorded() {
        let mut result = SortResult::default();
        result.record_move("ores", 0);
        assert!(result.per_category.is_empty());
        assert!(result.is_clean());
    }
}
