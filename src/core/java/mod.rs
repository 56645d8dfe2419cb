pub mod memory;
pub mod runtime;

pub use memory::{memory_ceiling_mb, parse_memory_mb};
pub use runtime::{check_minimum, find_java_binary, inspect_java_binary, is_java_executable};
pub use runtime::{JavaInstallation, MIN_JAVA_MAJOR};
