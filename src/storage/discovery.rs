//! Storage discovery - from a category's anchor marker down its column
//!
//! The `[name]` marker is mounted on the top container of the column. The
//! walk goes down through contiguous containers and stops before a lower
//! container that has its own bracketed marker beside it, since that one
//! starts the next column.

use crate::category::normalize_category_name;
use crate::core::types::BlockPos;
use crate::storage::container::BinGroup;
use crate::storage::label_cache::LabelCache;
use crate::storage::world::World;

/// Upper bound on how many groups one column may hold
pub const MAX_COLUMN_HEIGHT: usize = 384;

/// Anchor text for a category
pub fn anchor_label(category: &str) -> String {
    format!("[{}]", normalize_category_name(category))
}

/// The container an anchor marker is mounted on, if it is one
pub fn anchored_container<W: World + ?Sized>(
    world: &W,
    cache: &LabelCache,
    label: &str,
) -> Option<BlockPos> {
    let hit = cache.find_anchor(label)?;
    world
        .marker_at(hit.pos)
        .and_then(|marker| marker.attached_to)
        .filter(|pos| world.is_container(*pos))
}

/// Bin groups for a category, bottommost first
///
/// Empty when the category has no anchor or the anchor is not mounted on a
/// container.
pub fn resolve_storage_for<W: World + ?Sized>(
    world: &W,
    cache: &LabelCache,
    category: &str,
) -> Vec<BinGroup> {
    let label = anchor_label(category);
    let Some(mut current) = anchored_container(world, cache, &label) else {
        tracing::debug!("No storage anchor for {}", label);
        return Vec::new();
    };

    let mut groups = Vec::new();
    loop {
        groups.push(BinGroup::at(world, current));
        if groups.len() >= MAX_COLUMN_HEIGHT {
            break;
        }

        let below = current.down();
        if !world.is_container(below) {
            break;
        }
        let lower = BinGroup::at(world, below);
        if has_adjacent_anchor(world, &lower) {
            break;
        }
        current = below;
    }

    groups.reverse();
    groups
}

/// Whether any horizontal neighbour of the group carries `[...]` text
fn has_adjacent_anchor<W: World + ?Sized>(world: &W, group: &BinGroup) -> bool {
    group.positions.iter().any(|pos| {
        pos.horizontal_neighbors()
            .iter()
            .filter(|n| !group.contains(n))
            .any(|n| world.marker_at(*n).map_or(false, |m| m.has_anchor_text()))
    })
}
