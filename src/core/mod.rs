pub mod config;
pub mod error;
pub mod types;

pub use config::{config, set_config, CyclePolicy, SorterConfig};
pub use error::{Result, SortError};
pub use types::BlockPos;
