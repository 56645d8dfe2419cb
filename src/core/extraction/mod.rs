pub mod bundle;
pub mod cache;

pub use bundle::Bundle;
pub use cache::{ensure_extracted, CacheEntry, ExtractionCache};
