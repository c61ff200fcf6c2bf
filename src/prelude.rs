//! Prelude module for common hexfog types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use hexfog::prelude::*;`

pub use crate::core::{
    config::{FogConfig, FogPassConfig, FogProfile, PrefetchConfig},
    geo::{LatLng, LatLngBounds, Region},
    resolution::{ResolutionSelector, ResolutionTuning},
};

pub use crate::hexes::{AssembledHexes, GridCache, GridCellKey, HexSetAssembler};

pub use crate::fog::{
    FogEngine, FogOutcome, FogPolygon, FogResult, LocationHistory, LocationSample,
    MemoryLocationHistory, MemoryVisitedStore, VisitRecorder, VisitedResolver, VisitedStore,
};

pub use crate::background::{PanDirection, PrefetchPlan, PrefetchScheduler, ViewportThrottle};

pub use crate::runtime::{runtime, spawn, AsyncHandle, AsyncSpawner};

pub use crate::session::FogSession;

pub use crate::{Error as FogError, Result};

pub use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet, FxHasher};

pub use h3o::{CellIndex, Resolution};
