//! A fog session wires the engine to the external stores and the viewport
//! event stream: throttled viewport handling, dirty-tracked visited
//! resolution, fog computation and deferred prefetching.

use crate::background::{PrefetchScheduler, ViewportThrottle};
use crate::core::config::FogConfig;
use crate::core::geo::{LatLng, Region};
use crate::fog::{
    FogEngine, FogResult, LocationHistory, VisitRecorder, VisitedResolver, VisitedStore,
};
use crate::hexes::GridCache;
use crate::prelude::{Arc, Instant};
use crate::Result;
use h3o::CellIndex;

pub struct FogSession {
    engine: FogEngine,
    visited: Arc<dyn VisitedStore>,
    recorder: VisitRecorder,
    resolver: VisitedResolver,
    throttle: ViewportThrottle,
    prefetch: PrefetchScheduler,
    last_region: Option<Region>,
}

impl FogSession {
    pub fn new(
        config: FogConfig,
        visited: Arc<dyn VisitedStore>,
        history: Arc<dyn LocationHistory>,
    ) -> Result<Self> {
        config.validate()?;
        let engine = FogEngine::new(config.clone(), GridCache::new());
        let prefetch = PrefetchScheduler::new(engine.assembler().clone(), config.prefetch.clone());

        Ok(Self {
            recorder: VisitRecorder::new(visited.clone(), history),
            visited,
            resolver: VisitedResolver::new(),
            throttle: ViewportThrottle::new(config.throttle_interval()),
            prefetch,
            engine,
            last_region: None,
        })
    }

    pub fn engine(&self) -> &FogEngine {
        &self.engine
    }

    pub fn resolver(&self) -> &VisitedResolver {
        &self.resolver
    }

    pub fn prefetch(&self) -> &PrefetchScheduler {
        &self.prefetch
    }

    pub fn has_pending_viewport(&self) -> bool {
        self.throttle.has_pending()
    }

    /// When a deferred viewport can be flushed
    pub fn pending_deadline(&self) -> Option<Instant> {
        self.throttle.deadline()
    }

    /// Handles a viewport notification. Returns `None` when the change was
    /// deferred because it arrived inside the throttle interval.
    ///
    /// Every valid change reschedules the prefetch, deferred or not, so a
    /// pending pass for a stale viewport never runs.
    pub async fn on_viewport_change(&mut self, region: Region) -> Result<Option<FogResult>> {
        let resolution = self.engine.resolution_for(&region)?;
        self.prefetch.schedule(region, resolution);

        match self.throttle.offer(region, Instant::now()) {
            Some(region) => self.render(region).await.map(Some),
            None => Ok(None),
        }
    }

    /// Computes fog for the deferred viewport once its interval has passed
    pub async fn flush_pending(&mut self) -> Result<Option<FogResult>> {
        match self.throttle.flush(Instant::now()) {
            Some(region) => self.render(region).await.map(Some),
            None => Ok(None),
        }
    }

    /// Recomputes fog for the last rendered viewport, e.g. after new visits
    pub async fn refresh(&mut self) -> Result<Option<FogResult>> {
        match self.last_region {
            Some(region) => self.render(region).await.map(Some),
            None => Ok(None),
        }
    }

    pub async fn record_location(&self, position: LatLng, timestamp_ms: i64) -> Result<CellIndex> {
        self.recorder.record(position, timestamp_ms).await
    }

    async fn render(&mut self, region: Region) -> Result<FogResult> {
        let resolution = self.engine.resolution_for(&region)?;
        let visited = self.resolver.resolve(self.visited.as_ref(), resolution).await?;
        let result = self.engine.compute_fog(&region, &visited)?;

        self.last_region = Some(region);
        Ok(result)
    }
}
