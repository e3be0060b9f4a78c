//! Chestward - category-driven item sorting into labelled storage

pub mod audit;
pub mod category;
pub mod core;
pub mod item;
pub mod sorting;
pub mod storage;
