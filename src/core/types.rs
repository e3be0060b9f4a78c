//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Integer block position in the world
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Wraps at the coordinate limits instead of panicking
    pub fn offset(&self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x.wrapping_add(dx),
            y: self.y.wrapping_add(dy),
            z: self.z.wrapping_add(dz),
        }
    }

    pub fn down(&self) -> Self {
        self.offset(0, -1, 0)
    }

    pub fn up(&self) -> Self {
        self.offset(0, 1, 0)
    }

    /// The four neighbours sharing a vertical face (north, south, west, east)
    pub fn horizontal_neighbors(&self) -> [BlockPos; 4] {
        [
            self.offset(0, 0, -1),
            self.offset(0, 0, 1),
            self.offset(-1, 0, 0),
            self.offset(1, 0, 0),
        ]
    }

    pub fn distance_squared(&self, other: &Self) -> i64 {
        let dx = self.x as i64 - other.x as i64;
        let dy = self.y as i64 - other.y as i64;
        let dz = self.z as i64 - other.z as i64;
        dx * dx + dy * dy + dz * dz
    }
}

impl std::fmt::Display for BlockPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}

impl std::str::FromStr for BlockPos {
    type Err = String;

    /// Parse `x,y,z`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(format!("expected x,y,z but got '{}'", s));
        }
        let coord = |p: &str| {
            p.parse::<i32>()
                .map_err(|e| format!("bad coordinate '{}': {}", p, e))
        };
        Ok(Self::new(coord(parts[0])?, coord(parts[1])?, coord(parts[2])?))
    }
}
