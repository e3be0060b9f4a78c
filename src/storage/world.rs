//! Environment queries - markers and containers by position
//!
//! `World` is the narrow interface the label cache, storage discovery, and
//! the sorter need from the environment. `GridWorld` is an in-memory
//! implementation that also loads from JSON fixtures.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::error::Result;
use crate::core::types::BlockPos;
use crate::storage::container::Container;

/// Lines per marker face
pub const MARKER_LINES: usize = 4;

/// A text label in the world (sign-like, two faces)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    #[serde(default)]
    pub front: Vec<String>,
    #[serde(default)]
    pub back: Vec<String>,
    /// Block the marker is mounted on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attached_to: Option<BlockPos>,
}

impl Marker {
    pub fn new(text: &str) -> Self {
        Self {
            front: vec![text.to_string()],
            back: Vec::new(),
            attached_to: None,
        }
    }

    pub fn attached_to(mut self, pos: BlockPos) -> Self {
        self.attached_to = Some(pos);
        self
    }

    /// Up to four lines from each face, front first
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.front
            .iter()
            .take(MARKER_LINES)
            .chain(self.back.iter().take(MARKER_LINES))
            .map(String::as_str)
    }

    /// Whether any line looks like `[name]`
    pub fn has_anchor_text(&self) -> bool {
        self.lines().any(|line| is_anchor_text(&normalize_marker_text(line)))
    }
}

/// Marker text compares trimmed and lowercase
pub fn normalize_marker_text(text: &str) -> String {
    text.trim().to_lowercase()
}

/// `[something]` with a non-empty name
pub fn is_anchor_text(text: &str) -> bool {
    text.len() > 2 && text.starts_with('[') && text.ends_with(']')
}

pub trait World {
    fn marker_at(&self, pos: BlockPos) -> Option<&Marker>;

    fn container_at(&self, pos: BlockPos) -> Option<&Container>;

    fn container_at_mut(&mut self, pos: BlockPos) -> Option<&mut Container>;

    fn is_container(&self, pos: BlockPos) -> bool {
        self.container_at(pos).is_some()
    }
}

/// What occupies a position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Container(Container),
    Marker(Marker),
}

/// In-memory world keyed by position
#[derive(Debug, Clone, Default)]
pub struct GridWorld {
    blocks: AHashMap<BlockPos, Block>,
}

impl GridWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn place_container(&mut self, pos: BlockPos, container: Container) {
        self.blocks.insert(pos, Block::Container(container));
    }

    /// Place two linked containers with `slots` slots each
    pub fn place_double_container(&mut self, a: BlockPos, b: BlockPos, slots: usize) {
        let mut left = Container::with_capacity(slots);
        left.partner = Some(b);
        let mut right = Container::with_capacity(slots);
        right.partner = Some(a);
        self.place_container(a, left);
        self.place_container(b, right);
    }

    pub fn place_marker(&mut self, pos: BlockPos, marker: Marker) {
        self.blocks.insert(pos, Block::Marker(marker));
    }

    pub fn remove(&mut self, pos: BlockPos) -> Option<Block> {
        self.blocks.remove(&pos)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Load a world from a JSON fixture string
    pub fn from_json(json: &str) -> Result<Self> {
        let file: WorldFile = serde_json::from_str(json)?;
        Ok(Self::from(file))
    }

    /// Load a world from a JSON fixture on disk
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Serialize to the fixture format, blocks ordered by position
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&WorldFile::from(self))?)
    }
}

impl World for GridWorld {
    fn marker_at(&self, pos: BlockPos) -> Option<&Marker> {
        match self.blocks.get(&pos) {
            Some(Block::Marker(marker)) => Some(marker),
            _ => None,
        }
    }

    fn container_at(&self, pos: BlockPos) -> Option<&Container> {
        match self.blocks.get(&pos) {
            Some(Block::Container(container)) => Some(container),
            _ => None,
        }
    }

    fn container_at_mut(&mut self, pos: BlockPos) -> Option<&mut Container> {
        match self.blocks.get_mut(&pos) {
            Some(Block::Container(container)) => Some(container),
            _ => None,
        }
    }
}

/// JSON fixture format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldFile {
    pub blocks: Vec<PlacedBlock>,
}

/// A block at a position
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacedBlock {
    pub pos: BlockPos,
    #[serde(flatten)]
    pub block: Block,
}

impl From<WorldFile> for GridWorld {
    fn from(file: WorldFile) -> Self {
        let mut world = GridWorld::new();
        for placed in file.blocks {
            let block = match placed.block {
                Block::Container(mut container) => {
                    container.normalize();
                    Block::Container(container)
                }
                other => other,
            };
            world.blocks.insert(placed.pos, block);
        }
        world
    }
}

impl From<&GridWorld> for WorldFile {
    fn from(world: &GridWorld) -> Self {
        let mut blocks: Vec<PlacedBlock> = world
            .blocks
            .iter()
            .map(|(pos, block)| PlacedBlock {
                pos: *pos,
                block: block.clone(),
            })
            .collect();
        blocks.sort_by_key(|b| b.pos);
        WorldFile { blocks }
    }
}
