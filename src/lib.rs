//! # hexfog
//!
//! Incrementally reveals a map as areas are visited, using hexagonal cells to
//! discretize location.
//!
//! The engine resolves a display resolution from the viewport span, tiles the
//! world into cacheable grid cells, assembles the hexes covering an
//! overscanned viewport from that cache, and merges the visited subset into
//! holes of a single fog polygon. A prefetch scheduler keeps the cache warm
//! ahead of panning.

pub mod background;
pub mod core;
pub mod fog;
pub mod hexes;
pub mod prelude;
pub mod runtime;
pub mod session;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    config::{FogConfig, FogProfile},
    geo::{LatLng, LatLngBounds, Region},
    resolution::{ResolutionSelector, ResolutionTuning},
};

pub use background::{
    PanDirection, PrefetchPlan, PrefetchReport, PrefetchScheduler, ViewportThrottle,
};

pub use fog::{
    FogDiagnostics, FogEngine, FogPolygon, FogResult, MemoryLocationHistory, MemoryVisitedStore,
    VisitedResolver, VisitedStore,
};

pub use hexes::{GridCache, GridCellKey, HexSetAssembler};

pub use session::FogSession;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, FogError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum FogError {
    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error type alias for convenience
pub type Error = FogError;
