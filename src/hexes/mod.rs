pub mod assembler;
pub mod cache;
pub mod fill;

// Re-exports for convenience
pub use assembler::{AssembledHexes, HexSetAssembler};
pub use cache::{CacheOutcome, CacheStats, GridCache, GridCellKey, HexList};
pub use fill::{compute_cell, fill_bounds};
