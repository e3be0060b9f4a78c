//! Integration tests for the sorting pipeline
//!
//! These tests run the demo fixtures in `data/` end to end:
//! - catalog and category loading
//! - input discovery, classification, and routing
//! - leftovers returned to the input with their nesting intact

use chestward::category::{CategoryGraph, CategoryRegistry, ConfigSource};
use chestward::core::{BlockPos, SorterConfig};
use chestward::item::{ItemCatalog, ItemId, ItemStack};
use chestward::sorting::Sorter;
use chestward::storage::{Container, GridWorld, Marker, World};
use proptest::prelude::*;
use std::path::PathBuf;

fn data(file: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data").join(file)
}

fn demo_config() -> SorterConfig {
    let content = std::fs::read_to_string(data("sorter.toml")).unwrap();
    SorterConfig::parse_toml(&content).unwrap()
}

fn demo_setup() -> (ItemCatalog, CategoryGraph, GridWorld) {
    let catalog = ItemCatalog::load_from_toml(&data("items.toml")).unwrap();
    let content = std::fs::read_to_string(data("categories.toml")).unwrap();
    let sources = vec![ConfigSource::new("categories.toml", content)];
    let (graph, report) = CategoryRegistry::build(&sources, &catalog, &demo_config()).unwrap();
    assert!(report.cycles.is_empty());
    let world = GridWorld::load_from_file(&data("world.json")).unwrap();
    (catalog, graph, world)
}

fn input_pos() -> BlockPos {
    BlockPos::new(0, 64, 0)
}

// ============================================================================
// Demo world
// ============================================================================

#[test]
fn test_demo_world_sort_input() {
    let (catalog, graph, mut world) = demo_setup();

    let mut sorter = Sorter::new(&graph, &catalog, &mut world, input_pos()).with_config(demo_config());
    let result = sorter.sort_input(false);
    let moves = sorter.take_moves();

    // stone 40 + oak_log 20 + two tools + cobblestone 32 from the box
    assert_eq!(result.moved, 94);
    assert_eq!(result.per_category.get("stone"), Some(&72));
    assert_eq!(result.per_category.get("logs"), Some(&20));
    assert_eq!(result.per_category.get("enchanted_gear"), Some(&1));
    assert_eq!(result.per_category.get("tools"), Some(&1));
    assert!(!result.per_category.contains_key("building"));
    assert!(result.unmatched.contains("minecraft:dirt"));
    assert!(result.overflowed.is_empty());
    assert_eq!(moves.len(), 5);

    // The lower chest of the stone column fills first
    let bottom = world.container_at(BlockPos::new(3, 63, 0)).unwrap();
    assert_eq!(bottom.slot(0).unwrap().count, 40);
    assert_eq!(bottom.slot(1).unwrap().id, ItemId::new("cobblestone"));
    assert!(world.container_at(BlockPos::new(3, 64, 0)).unwrap().is_empty());

    // Leftovers are back in the input, box still holding its dirt
    let input: Vec<&ItemStack> = world.container_at(input_pos()).unwrap().stacks().collect();
    assert_eq!(input.len(), 2);
    assert_eq!(input[0], &ItemStack::new("dirt", 10));
    assert_eq!(input[1].id, ItemId::new("shulker_box"));
    assert_eq!(input[1].nested(), &[ItemStack::new("dirt", 4)]);
}

#[test]
fn test_demo_world_preview_changes_nothing() {
    let (catalog, graph, mut world) = demo_setup();
    let before = world.to_json().unwrap();

    let mut sorter = Sorter::new(&graph, &catalog, &mut world, input_pos()).with_config(demo_config());
    let result = sorter.sort_input(true);

    assert_eq!(result.moved, 94);
    assert!(sorter.moves().iter().all(|m| m.preview));
    assert_eq!(world.to_json().unwrap(), before);
}

#[test]
fn test_resorting_leftovers_moves_nothing() {
    let (catalog, graph, mut world) = demo_setup();
    Sorter::new(&graph, &catalog, &mut world, input_pos())
        .with_config(demo_config())
        .sort_input(false);

    let mut reloaded = GridWorld::from_json(&world.to_json().unwrap()).unwrap();
    let mut sorter =
        Sorter::new(&graph, &catalog, &mut reloaded, input_pos()).with_config(demo_config());
    let again = sorter.sort_input(false);

    assert_eq!(again.moved, 0);
    assert!(again.unmatched.contains("minecraft:dirt"));
    assert_eq!(again.leftovers.len(), 2);
}

#[test]
fn test_demo_world_locate() {
    let (catalog, graph, mut world) = demo_setup();
    let mut sorter = Sorter::new(&graph, &catalog, &mut world, input_pos()).with_config(demo_config());

    // Input chest holds 10 loose dirt and 4 inside the box
    let found = sorter.locate(&ItemId::new("dirt"));
    assert_eq!(found, vec![(input_pos(), 14)]);
}

// ============================================================================
// Properties
// ============================================================================

fn stone_world(slots: usize) -> (ItemCatalog, CategoryGraph, GridWorld) {
    let mut catalog = ItemCatalog::new();
    catalog.add_item("stone", 64);

    let config = SorterConfig::default();
    let mut graph = CategoryGraph::new(&config);
    graph.load("inline", "[stone]\nitems = [\"stone\"]\n", &catalog).unwrap();
    graph.flatten(&catalog);

    let mut world = GridWorld::new();
    let pos = BlockPos::new(0, 64, 0);
    world.place_container(pos, Container::with_capacity(slots));
    world.place_marker(BlockPos::new(0, 64, 1), Marker::new("[stone]").attached_to(pos));
    (catalog, graph, world)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_items_are_conserved(
        counts in prop::collection::vec(1u32..=200, 1..12),
        slots in 1usize..6,
    ) {
        let (catalog, graph, mut world) = stone_world(slots);
        let config = SorterConfig { scan_radius: 2, ..SorterConfig::default() };
        let total: u32 = counts.iter().sum();
        let stacks: Vec<ItemStack> = counts.iter().map(|&c| ItemStack::new("stone", c)).collect();

        let mut sorter = Sorter::new(&graph, &catalog, &mut world, BlockPos::new(0, 64, 0))
            .with_config(config);
        let result = sorter.sort(stacks, false);

        prop_assert_eq!(result.moved + result.leftover_count(), total);
        let stored: u32 = world
            .container_at(BlockPos::new(0, 64, 0))
            .unwrap()
            .stacks()
            .map(|s| s.count)
            .sum();
        prop_assert_eq!(stored, result.moved);
        prop_assert!(stored <= slots as u32 * 64);
    }
}
