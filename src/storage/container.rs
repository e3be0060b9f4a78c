//! Storage units - fixed-slot containers and the bin groups built from them

use serde::{Deserialize, Serialize};

use crate::core::types::BlockPos;
use crate::item::{normalize_slot, ItemStack};
use crate::storage::world::World;

/// A fixed number of slots, each empty or holding one stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    slots: Vec<Option<ItemStack>>,
    /// The other half of a double container
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner: Option<BlockPos>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl Container {
    pub fn with_capacity(slots: usize) -> Self {
        Self {
            slots: vec![None; slots],
            partner: None,
            owner: None,
        }
    }

    pub fn with_owner(mut self, owner: &str) -> Self {
        self.owner = Some(owner.to_string());
        self
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn slot(&self, index: usize) -> Option<&ItemStack> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Write a slot; zero-count stacks are stored as empty
    pub fn set_slot(&mut self, index: usize, stack: Option<ItemStack>) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = normalize_slot(stack);
        }
    }

    /// Raw slot access for in-place merging; callers only ever grow counts
    pub(crate) fn slots_mut(&mut self) -> impl Iterator<Item = &mut Option<ItemStack>> {
        self.slots.iter_mut()
    }

    /// Occupied slots in order
    pub fn stacks(&self) -> impl Iterator<Item = &ItemStack> {
        self.slots.iter().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn free_slots(&self) -> usize {
        self.slots.iter().filter(|s| s.is_none()).count()
    }

    /// Empty every slot, returning the stacks in slot order
    pub fn take_all(&mut self) -> Vec<ItemStack> {
        self.slots.iter_mut().filter_map(Option::take).collect()
    }

    /// Put a stack in the first empty slot, handing it back when full
    pub fn insert(&mut self, stack: ItemStack) -> Result<usize, ItemStack> {
        if stack.is_empty() {
            return Ok(0);
        }
        match self.slots.iter().position(Option::is_none) {
            Some(index) => {
                self.slots[index] = Some(stack);
                Ok(index)
            }
            None => Err(stack),
        }
    }

    /// Drop any zero-count stacks that came from outside (fixtures)
    pub fn normalize(&mut self) {
        for slot in &mut self.slots {
            *slot = normalize_slot(slot.take());
        }
    }
}

/// One container, or a doubled pair addressed as a single destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BinGroup {
    /// Primary position first, then its partner
    pub positions: Vec<BlockPos>,
}

impl BinGroup {
    /// The group containing `pos`; empty when there is no container there
    pub fn at<W: World + ?Sized>(world: &W, pos: BlockPos) -> Self {
        let mut positions = Vec::with_capacity(2);
        if let Some(container) = world.container_at(pos) {
            positions.push(pos);
            if let Some(partner) = container.partner.filter(|p| *p != pos) {
                if world.is_container(partner) {
                    positions.push(partner);
                }
            }
        }
        Self { positions }
    }

    pub fn primary(&self) -> Option<BlockPos> {
        self.positions.first().copied()
    }

    pub fn contains(&self, pos: &BlockPos) -> bool {
        self.positions.contains(pos)
    }

    pub fn is_double(&self) -> bool {
        self.positions.len() == 2
    }

    /// Total slots across the group
    pub fn capacity<W: World + ?Sized>(&self, world: &W) -> usize {
        self.positions
            .iter()
            .filter_map(|p| world.container_at(*p))
            .map(Container::capacity)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::world::GridWorld;

    #[test]
    fn test_set_slot_normalizes_empty() {
        let mut chest = Container::with_capacity(3);
        chest.set_slot(0, Some(ItemStack::new("stone", 0)));
        assert!(chest.slot(0).is_none());
        chest.set_slot(1, Some(ItemStack::new("stone", 5)));
        assert_eq!(chest.slot(1).unwrap().count, 5);
        // Out of range writes are ignored
        chest.set_slot(9, Some(ItemStack::new("stone", 5)));
        assert_eq!(chest.capacity(), 3);
    }

    #[test]
    fn test_insert_and_take_all() {
        let mut chest = Container::with_capacity(2);
        assert_eq!(chest.insert(ItemStack::new("stone", 1)), Ok(0));
        assert_eq!(chest.insert(ItemStack::new("dirt", 1)), Ok(1));
        assert!(chest.insert(ItemStack::new("sand", 1)).is_err());
        assert_eq!(chest.free_slots(), 0);

        let taken = chest.take_all();
        assert_eq!(taken.len(), 2);
        assert!(chest.is_empty());
    }

    #[test]
    fn test_owner_survives_serialization() {
        let mut chest = Container::with_capacity(2).with_owner("steve");
        chest.set_slot(1, Some(ItemStack::new("stone", 3)));

        let json = serde_json::to_string(&chest).unwrap();
        let loaded: Container = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.owner.as_deref(), Some("steve"));
        assert_eq!(loaded, chest);

        let unowned = serde_json::to_string(&Container::with_capacity(1)).unwrap();
        assert!(!unowned.contains("owner"));
    }

    #[test]
    fn test_bin_group_for_double_container() {
        let mut world = GridWorld::new();
        let a = BlockPos::new(0, 64, 0);
        let b = BlockPos::new(1, 64, 0);
        world.place_double_container(a, b, 27);

        let group = BinGroup::at(&world, b);
        assert!(group.is_double());
        assert_eq!(group.primary(), Some(b));
        assert_eq!(group.capacity(&world), 54);

        let single = BlockPos::new(5, 64, 5);
        world.place_container(single, Container::with_capacity(27));
        assert_eq!(BinGroup::at(&world, single).capacity(&world), 27);
        assert!(BinGroup::at(&world, BlockPos::new(9, 9, 9)).positions.is_empty());
    }
}
