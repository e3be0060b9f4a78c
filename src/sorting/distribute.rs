//! Two-phase distribution of one stack into a storage column
//!
//! Per bin group, in column order: first top up compatible partial stacks,
//! then fill empty slots with new stacks capped at the effective stack limit.
//! Stops as soon as the stack is placed. A full column is final; nothing
//! spills into another column.

use crate::core::types::BlockPos;
use crate::item::{ItemCatalog, ItemStack};
use crate::storage::{BinGroup, World};

/// What one distribution placed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Distribution {
    pub moved: u32,
    /// First container that received items
    pub destination: Option<BlockPos>,
}

/// Place as much of `stack` as fits, shrinking it by the amount placed
///
/// In preview the same amounts are computed but no container is touched.
pub fn distribute<W: World + ?Sized>(
    world: &mut W,
    catalog: &ItemCatalog,
    global_max: u32,
    stack: &mut ItemStack,
    groups: &[BinGroup],
    preview: bool,
) -> Distribution {
    let limit = catalog.stack_limit(&stack.id, global_max);
    let mut result = Distribution::default();

    for group in groups {
        if stack.is_empty() {
            break;
        }

        // Phase 1: merge into compatible partial stacks
        for &pos in &group.positions {
            let Some(container) = world.container_at_mut(pos) else {
                continue;
            };
            for slot in container.slots_mut() {
                if stack.is_empty() {
                    break;
                }
                let Some(existing) = slot.as_mut() else {
                    continue;
                };
                if !existing.is_compatible(stack) || existing.count >= limit {
                    continue;
                }
                let added = (limit - existing.count).min(stack.count);
                if !preview {
                    existing.count += added;
                }
                stack.shrink(added);
                result.moved += added;
                result.destination.get_or_insert(pos);
            }
        }

        // Phase 2: fill empty slots
        for &pos in &group.positions {
            if stack.is_empty() {
                break;
            }
            let Some(container) = world.container_at_mut(pos) else {
                continue;
            };
            for slot in container.slots_mut() {
                if stack.is_empty() {
                    break;
                }
                if slot.is_some() {
                    continue;
                }
                let part = stack.split(limit);
                result.moved += part.count;
                if !preview {
                    *slot = Some(part);
                }
                result.destination.get_or_insert(pos);
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Container, GridWorld};

    fn catalog() -> ItemCatalog {
        let mut catalog = ItemCatalog::new();
        catalog
            .add_item("stone", 64)
            .add_item("ender_pearl", 16)
            .add_item("diamond_sword", 1);
        catalog
    }

    fn single(world: &mut GridWorld, pos: BlockPos, slots: Vec<Option<ItemStack>>) -> BinGroup {
        let mut container = Container::with_capacity(slots.len());
        for (i, slot) in slots.into_iter().enumerate() {
            container.set_slot(i, slot);
        }
        world.place_container(pos, container);
        BinGroup::at(&*world, pos)
    }

    #[test]
    fn test_merge_before_fill() {
        let mut world = GridWorld::new();
        let pos = BlockPos::new(0, 0, 0);
        let group = single(&mut world, pos, vec![None, Some(ItemStack::new("stone", 40))]);

        let mut stack = ItemStack::new("stone", 20);
        let result = distribute(&mut world, &catalog(), 99, &mut stack, &[group], false);

        assert_eq!(result.moved, 20);
        assert!(stack.is_empty());
        let chest = world.container_at(pos).unwrap();
        assert!(chest.slot(0).is_none());
        assert_eq!(chest.slot(1).unwrap().count, 60);
    }

    #[test]
    fn test_overflowing_merge_fills_empty_slot() {
        let mut world = GridWorld::new();
        let pos = BlockPos::new(0, 0, 0);
        let group = single(&mut world, pos, vec![None, Some(ItemStack::new("stone", 60))]);

        let mut stack = ItemStack::new("stone", 10);
        distribute(&mut world, &catalog(), 99, &mut stack, &[group], false);

        let chest = world.container_at(pos).unwrap();
        assert_eq!(chest.slot(1).unwrap().count, 64);
        assert_eq!(chest.slot(0).unwrap().count, 6);
    }

    #[test]
    fn test_incompatible_partial_is_skipped() {
        let mut world = GridWorld::new();
        let pos = BlockPos::new(0, 0, 0);
        let named = ItemStack::new("stone", 10).with_name("Special");
        let group = single(&mut world, pos, vec![Some(named), None]);

        let mut stack = ItemStack::new("stone", 5);
        distribute(&mut world, &catalog(), 99, &mut stack, &[group], false);

        let chest = world.container_at(pos).unwrap();
        assert_eq!(chest.slot(0).unwrap().count, 10);
        assert_eq!(chest.slot(1).unwrap().count, 5);
    }

    #[test]
    fn test_new_stacks_respect_limits() {
        let mut world = GridWorld::new();
        let pos = BlockPos::new(0, 0, 0);
        let group = single(&mut world, pos, vec![None, None, None]);

        let mut pearls = ItemStack::new("ender_pearl", 40);
        let result = distribute(&mut world, &catalog(), 99, &mut pearls, &[group], false);
        assert_eq!(result.moved, 40);

        let counts: Vec<u32> = world
            .container_at(pos)
            .unwrap()
            .stacks()
            .map(|s| s.count)
            .collect();
        assert_eq!(counts, vec![16, 16, 8]);
    }

    #[test]
    fn test_global_cap_applies() {
        let mut world = GridWorld::new();
        let pos = BlockPos::new(0, 0, 0);
        let group = single(&mut world, pos, vec![None, None]);

        let mut stone = ItemStack::new("stone", 64);
        distribute(&mut world, &catalog(), 32, &mut stone, &[group], false);
        let chest = world.container_at(pos).unwrap();
        assert_eq!(chest.slot(0).unwrap().count, 32);
        assert_eq!(chest.slot(1).unwrap().count, 32);
    }

    #[test]
    fn test_full_column_reports_partial() {
        let mut world = GridWorld::new();
        let pos = BlockPos::new(0, 0, 0);
        let group = single(&mut world, pos, vec![Some(ItemStack::new("stone", 60))]);

        let mut stone = ItemStack::new("stone", 10);
        let result = distribute(&mut world, &catalog(), 99, &mut stone, &[group], false);
        assert_eq!(result.moved, 4);
        assert_eq!(stone.count, 6);
        assert_eq!(result.destination, Some(pos));
    }

    #[test]
    fn test_groups_fill_in_order() {
        let mut world = GridWorld::new();
        let low = single(&mut world, BlockPos::new(0, 0, 0), vec![None]);
        let high = single(&mut world, BlockPos::new(0, 1, 0), vec![Some(ItemStack::new("stone", 1))]);

        let mut stone = ItemStack::new("stone", 70);
        distribute(&mut world, &catalog(), 99, &mut stone, &[low, high], false);
        assert_eq!(world.container_at(BlockPos::new(0, 0, 0)).unwrap().slot(0).unwrap().count, 64);
        assert_eq!(world.container_at(BlockPos::new(0, 1, 0)).unwrap().slot(0).unwrap().count, 7);
    }

    #[test]
    fn test_preview_does_not_mutate() {
        let mut world = GridWorld::new();
        let pos = BlockPos::new(0, 0, 0);
        let group = single(&mut world, pos, vec![Some(ItemStack::new("stone", 50)), None]);
        let before = world.container_at(pos).unwrap().clone();

        let mut stone = ItemStack::new("stone", 100);
        let result = distribute(&mut world, &catalog(), 99, &mut stone, &[group], true);
        assert_eq!(result.moved, 78);
        assert_eq!(stone.count, 22);
        assert_eq!(world.container_at(pos).unwrap(), &before);
    }

    #[test]
    fn test_unstackable_items_take_one_slot_each() {
        let mut world = GridWorld::new();
        let pos = BlockPos::new(0, 0, 0);
        let group = single(&mut world, pos, vec![Some(ItemStack::new("diamond_sword", 1)), None]);

        let mut sword = ItemStack::new("diamond_sword", 1);
        distribute(&mut world, &catalog(), 99, &mut sword, &[group], false);
        let chest = world.container_at(pos).unwrap();
        assert_eq!(chest.slot(0).unwrap().count, 1);
        assert_eq!(chest.slot(1).unwrap().count, 1);
    }
}
