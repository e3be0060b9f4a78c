//! Sorting layer - routing stacks into category storage

pub mod distribute;
pub mod engine;
pub mod result;

pub use distribute::{distribute, Distribution};
pub use engine::Sorter;
pub use result::{MoveRecord, SortResult};
