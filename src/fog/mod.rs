pub mod engine;
pub mod polygon;
pub mod visited;

pub use engine::{FogDiagnostics, FogEngine, FogResult};
pub use polygon::{FogOutcome, FogPolygon, FogPolygonBuilder, Ring};
pub use visited::{
    LocationHistory, LocationSample, MemoryLocationHistory, MemoryVisitedStore, ResolvedVisited,
    VisitRecorder, VisitedResolver, VisitedStore,
};
