//! Per-operation index of marker text and container positions
//!
//! Built with one pass over the cube around the operation's center and then
//! only read. Mutating the world during the operation does not refresh it.

use ahash::AHashMap;

use crate::core::types::BlockPos;
use crate::storage::world::{normalize_marker_text, World};

/// The nearest marker carrying a given line of text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelHit {
    pub pos: BlockPos,
    pub distance_sq: i64,
}

#[derive(Debug, Clone, Default)]
pub struct LabelCache {
    center: BlockPos,
    radius: i32,
    labels: AHashMap<String, LabelHit>,
    /// Container positions in scan order
    containers: Vec<BlockPos>,
}

impl LabelCache {
    /// Scan the cube `[center - radius, center + radius]` (inclusive)
    pub fn build<W: World + ?Sized>(world: &W, center: BlockPos, radius: i32) -> Self {
        let mut cache = Self {
            center,
            radius,
            ..Self::default()
        };

        // Clamped at the coordinate limits
        let span = |c: i32| c.saturating_sub(radius)..=c.saturating_add(radius);
        for x in span(center.x) {
            for y in span(center.y) {
                for z in span(center.z) {
                    let pos = BlockPos::new(x, y, z);
                    if world.is_container(pos) {
                        cache.containers.push(pos);
                    }
                    if let Some(marker) = world.marker_at(pos) {
                        for line in marker.lines() {
                            cache.record(line, pos);
                        }
                    }
                }
            }
        }

        tracing::debug!(
            "Label cache around {} (r={}): {} labels, {} containers",
            center,
            radius,
            cache.labels.len(),
            cache.containers.len()
        );
        cache
    }

    /// Keep the occurrence nearest the center; the first one found wins ties
    fn record(&mut self, line: &str, pos: BlockPos) {
        let text = normalize_marker_text(line);
        if text.is_empty() {
            return;
        }
        let hit = LabelHit {
            pos,
            distance_sq: pos.distance_squared(&self.center),
        };
        self.labels
            .entry(text)
            .and_modify(|existing| {
                if hit.distance_sq < existing.distance_sq {
                    *existing = hit;
                }
            })
            .or_insert(hit);
    }

    /// Nearest marker with this text (case and surrounding whitespace ignored)
    pub fn find_anchor(&self, text: &str) -> Option<&LabelHit> {
        self.labels.get(&normalize_marker_text(text))
    }

    /// Every container position inside the scanned cube
    pub fn containers(&self) -> &[BlockPos] {
        &self.containers
    }

    pub fn center(&self) -> BlockPos {
        self.center
    }

    pub fn radius(&self) -> i32 {
        self.radius
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }
}

/// Owns the label cache for one operation, building it on first use
#[derive(Debug)]
pub struct ScanContext {
    center: BlockPos,
    radius: i32,
    cache: Option<LabelCache>,
}

impl ScanContext {
    pub fn new(center: BlockPos, radius: i32) -> Self {
        Self {
            center,
            radius,
            cache: None,
        }
    }

    pub fn labels<W: World + ?Sized>(&mut self, world: &W) -> &LabelCache {
        let (center, radius) = (self.center, self.radius);
        self.cache
            .get_or_insert_with(|| LabelCache::build(world, center, radius))
    }

    pub fn is_built(&self) -> bool {
        self.cache.is_some()
    }

    pub fn center(&self) -> BlockPos {
        self.center
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::container::Container;
    use crate::storage::world::{GridWorld, Marker};

    #[test]
    fn test_nearest_marker_wins() {
        let mut world = GridWorld::new();
        let center = BlockPos::new(0, 64, 0);
        world.place_marker(BlockPos::new(5, 64, 0), Marker::new("[Tools]"));
        world.place_marker(BlockPos::new(2, 64, 0), Marker::new("  [tools]  "));
        world.place_marker(BlockPos::new(-2, 64, 0), Marker::new("[tools]"));

        let cache = LabelCache::build(&world, center, 8);
        let hit = cache.find_anchor("[TOOLS]").unwrap();
        assert_eq!(hit.distance_sq, 4);
        // Scan order is x ascending, so the tie keeps x = -2
        assert_eq!(hit.pos, BlockPos::new(-2, 64, 0));
    }

    #[test]
    fn test_back_face_and_radius() {
        let mut world = GridWorld::new();
        let center = BlockPos::new(0, 0, 0);
        world.place_marker(
            BlockPos::new(1, 0, 0),
            Marker {
                front: vec![String::new(), "   ".into()],
                back: vec!["[ores]".into()],
                attached_to: None,
            },
        );
        world.place_marker(BlockPos::new(4, 0, 0), Marker::new("[far]"));
        world.place_container(BlockPos::new(0, 1, 0), Container::with_capacity(27));

        let cache = LabelCache::build(&world, center, 3);
        assert!(cache.find_anchor("[ores]").is_some());
        assert!(cache.find_anchor("[far]").is_none());
        assert_eq!(cache.label_count(), 1);
        assert_eq!(cache.containers(), &[BlockPos::new(0, 1, 0)]);

        let edge = LabelCache::build(&world, center, 4);
        assert!(edge.find_anchor("[far]").is_some());
    }

    #[test]
    fn test_scan_clamps_at_coordinate_limits() {
        let mut world = GridWorld::new();
        let high = BlockPos::new(i32::MAX, 0, i32::MIN);
        world.place_marker(BlockPos::new(i32::MAX - 1, 0, i32::MIN), Marker::new("[edge]"));
        world.place_container(high, Container::with_capacity(9));

        let cache = LabelCache::build(&world, high, 2);
        let hit = cache.find_anchor("[edge]").unwrap();
        assert_eq!(hit.distance_sq, 1);
        assert_eq!(cache.containers(), &[high]);
    }

    #[test]
    fn test_scan_context_builds_once() {
        let mut world = GridWorld::new();
        world.place_marker(BlockPos::new(1, 0, 0), Marker::new("[a]"));
        let mut scan = ScanContext::new(BlockPos::new(0, 0, 0), 2);
        assert!(!scan.is_built());
        assert!(scan.labels(&world).find_anchor("[a]").is_some());

        world.place_marker(BlockPos::new(0, 1, 0), Marker::new("[b]"));
        assert!(scan.is_built());
        assert!(scan.labels(&world).find_anchor("[b]").is_none());
    }
}
