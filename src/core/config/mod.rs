pub mod model;

pub use model::{RelaunchConfig, DEFAULT_GC_TYPE, DEFAULT_MAX_MEMORY};
