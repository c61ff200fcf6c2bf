//! Visited hexes: the external stores they live in, recording of new
//! location fixes, and resolution of the stored fine hexes to the current
//! display resolution.

use crate::core::constants::STORAGE_RESOLUTION;
use crate::core::geo::LatLng;
use crate::prelude::{Arc, HashSet, Mutex};
use crate::{FogError, Result};
use async_trait::async_trait;
use h3o::{CellIndex, Resolution};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// Append-only set of visited hexes at the storage resolution
#[async_trait]
pub trait VisitedStore: Send + Sync {
    async fn list(&self) -> Result<Vec<CellIndex>>;

    /// Adds a hex, returning `false` when it was already present
    async fn add(&self, hex: CellIndex) -> Result<bool>;

    /// Bumped on every successful insertion of a new hex
    fn version(&self) -> u64;
}

/// A single raw location fix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub timestamp_ms: i64,
    pub position: LatLng,
}

/// Time-ordered history of raw location fixes
#[async_trait]
pub trait LocationHistory: Send + Sync {
    async fn record(&self, sample: LocationSample) -> Result<()>;

    /// Samples with `start_ms <= timestamp_ms <= end_ms`, oldest first
    async fn query_by_time_range(&self, start_ms: i64, end_ms: i64)
        -> Result<Vec<LocationSample>>;
}

#[derive(Debug, Default)]
pub struct MemoryVisitedStore {
    cells: RwLock<HashSet<CellIndex>>,
    version: AtomicU64,
}

impl MemoryVisitedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cells(cells: impl IntoIterator<Item = CellIndex>) -> Self {
        let store = Self::default();
        if let Ok(mut set) = store.cells.write() {
            set.extend(cells);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.cells.read().map(|set| set.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl VisitedStore for MemoryVisitedStore {
    async fn list(&self) -> Result<Vec<CellIndex>> {
        let cells = self
            .cells
            .read()
            .map_err(|_| FogError::Store("visited store lock poisoned".to_string()))?;
        Ok(cells.iter().copied().collect())
    }

    async fn add(&self, hex: CellIndex) -> Result<bool> {
        let mut cells = self
            .cells
            .write()
            .map_err(|_| FogError::Store("visited store lock poisoned".to_string()))?;
        let inserted = cells.insert(hex);
        if inserted {
            self.version.fetch_add(1, Ordering::SeqCst);
        }
        Ok(inserted)
    }

    fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
pub struct MemoryLocationHistory {
    samples: Mutex<Vec<LocationSample>>,
}

impl MemoryLocationHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LocationHistory for MemoryLocationHistory {
    async fn record(&self, sample: LocationSample) -> Result<()> {
        let mut samples = self
            .samples
            .lock()
            .map_err(|_| FogError::Store("location history lock poisoned".to_string()))?;
        // Fixes may arrive out of order from background delivery
        let index = samples.partition_point(|s| s.timestamp_ms <= sample.timestamp_ms);
        samples.insert(index, sample);
        Ok(())
    }

    async fn query_by_time_range(
        &self,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<LocationSample>> {
        let samples = self
            .samples
            .lock()
            .map_err(|_| FogError::Store("location history lock poisoned".to_string()))?;
        Ok(samples
            .iter()
            .filter(|s| s.timestamp_ms >= start_ms && s.timestamp_ms <= end_ms)
            .copied()
            .collect())
    }
}

/// Turns location fixes into visited hexes
#[derive(Clone)]
pub struct VisitRecorder {
    visited: Arc<dyn VisitedStore>,
    history: Arc<dyn LocationHistory>,
    resolution: Resolution,
}

impl VisitRecorder {
    pub fn new(visited: Arc<dyn VisitedStore>, history: Arc<dyn LocationHistory>) -> Self {
        Self {
            visited,
            history,
            resolution: STORAGE_RESOLUTION,
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Stores the raw fix and marks its storage-resolution hex as visited
    pub async fn record(&self, position: LatLng, timestamp_ms: i64) -> Result<CellIndex> {
        let ll = h3o::LatLng::new(position.lat, position.lng)
            .map_err(|err| FogError::InvalidCoordinates(err.to_string()))?;
        let hex = ll.to_cell(self.resolution);

        self.history
            .record(LocationSample {
                timestamp_ms,
                position,
            })
            .await?;
        if self.visited.add(hex).await? {
            log::debug!("new visited hex {} at {:?}", hex, position);
        }
        Ok(hex)
    }
}

/// Resolved visited set together with what it was derived from
#[derive(Debug, Clone)]
pub struct ResolvedVisited {
    pub resolution: Resolution,
    pub store_version: u64,
    pub cells: Arc<HashSet<CellIndex>>,
}

/// Maps stored visited hexes to the display resolution, recomputing only
/// when the store version or the resolution changed since the last call
#[derive(Debug, Default)]
pub struct VisitedResolver {
    current: Option<ResolvedVisited>,
    recomputations: u64,
}

impl VisitedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ancestors of `cells` at `resolution`. Cells already coarser than the
    /// target are kept unchanged since they cannot be refined.
    pub fn resolve_cells(
        cells: impl IntoIterator<Item = CellIndex>,
        resolution: Resolution,
    ) -> HashSet<CellIndex> {
        cells
            .into_iter()
            .map(|cell| cell.parent(resolution).unwrap_or(cell))
            .collect()
    }

    pub fn is_stale(&self, store_version: u64, resolution: Resolution) -> bool {
        match &self.current {
            Some(current) => {
                current.store_version != store_version || current.resolution != resolution
            }
            None => true,
        }
    }

    pub async fn resolve(
        &mut self,
        store: &dyn VisitedStore,
        resolution: Resolution,
    ) -> Result<ResolvedVisited> {
        let version = store.version();
        if let Some(current) = &self.current {
            if !self.is_stale(version, resolution) {
                return Ok(current.clone());
            }
        }

        let stored = store.list().await?;
        let cells = Self::resolve_cells(stored, resolution);
        log::debug!(
            "resolved {} visited hexes at resolution {:?} (store version {})",
            cells.len(),
            resolution,
            version
        );

        let resolved = ResolvedVisited {
            resolution,
            store_version: version,
            cells: Arc::new(cells),
        };
        self.current = Some(resolved.clone());
        self.recomputations += 1;
        Ok(resolved)
    }

    /// Forces the next `resolve` to recompute
    pub fn invalidate(&mut self) {
        self.current = None;
    }

    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell_at(lat: f64, lng: f64, resolution: Resolution) -> CellIndex {
        h3o::LatLng::new(lat, lng).unwrap().to_cell(resolution)
    }

    #[test]
    fn test_resolve_cells_identity_at_storage_resolution() {
        let cell = cell_at(37.42, -88.31, Resolution::Ten);
        let resolved = VisitedResolver::resolve_cells([cell], Resolution::Ten);
        assert!(resolved.contains(&cell));
        assert_eq!(resolved.len(), 1);
    }

    #[test]
    fn test_resolve_cells_maps_to_ancestors() {
        let a = cell_at(37.42, -88.31, Resolution::Ten);
        let siblings: Vec<CellIndex> = a
            .parent(Resolution::Nine)
            .unwrap()
            .children(Resolution::Ten)
            .collect();
        assert!(siblings.len() > 1);

        let resolved = VisitedResolver::resolve_cells(siblings, Resolution::Six);
        assert_eq!(resolved.len(), 1);
        assert!(resolved.contains(&a.parent(Resolution::Six).unwrap()));
    }

    #[tokio::test]
    async fn test_resolver_recomputes_only_on_change() {
        let store = MemoryVisitedStore::new();
        store.add(cell_at(10.0, 10.0, Resolution::Ten)).await.unwrap();

        let mut resolver = VisitedResolver::new();
        resolver.resolve(&store, Resolution::Eight).await.unwrap();
        resolver.resolve(&store, Resolution::Eight).await.unwrap();
        assert_eq!(resolver.recomputations(), 1);

        resolver.resolve(&store, Resolution::Nine).await.unwrap();
        assert_eq!(resolver.recomputations(), 2);

        // Re-adding an existing hex does not dirty the store
        assert!(!store.add(cell_at(10.0, 10.0, Resolution::Ten)).await.unwrap());
        resolver.resolve(&store, Resolution::Nine).await.unwrap();
        assert_eq!(resolver.recomputations(), 2);

        store.add(cell_at(11.0, 11.0, Resolution::Ten)).await.unwrap();
        let resolved = resolver.resolve(&store, Resolution::Nine).await.unwrap();
        assert_eq!(resolver.recomputations(), 3);
        assert_eq!(resolved.cells.len(), 2);

        resolver.invalidate();
        resolver.resolve(&store, Resolution::Nine).await.unwrap();
        assert_eq!(resolver.recomputations(), 4);
    }

    #[tokio::test]
    async fn test_history_orders_and_filters_by_time() {
        let history = MemoryLocationHistory::new();
        for (ts, lat) in [(300, 3.0), (100, 1.0), (200, 2.0)] {
            history
                .record(LocationSample {
                    timestamp_ms: ts,
                    position: LatLng::new(lat, 0.0),
                })
                .await
                .unwrap();
        }

        let all = history.query_by_time_range(0, 1_000).await.unwrap();
        let stamps: Vec<i64> = all.iter().map(|s| s.timestamp_ms).collect();
        assert_eq!(stamps, vec![100, 200, 300]);

        let window = history.query_by_time_range(150, 300).await.unwrap();
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].position.lat, 2.0);
    }

    #[tokio::test]
    async fn test_recorder_stores_fix_and_hex() {
        let visited = Arc::new(MemoryVisitedStore::new());
        let history = Arc::new(MemoryLocationHistory::new());
        let recorder = VisitRecorder::new(visited.clone(), history.clone());

        let hex = recorder.record(LatLng::new(37.42, -88.31), 1_000).await.unwrap();
        assert_eq!(hex.resolution(), STORAGE_RESOLUTION);
        recorder.record(LatLng::new(37.42, -88.31), 2_000).await.unwrap();

        assert_eq!(visited.len(), 1);
        assert_eq!(visited.version(), 1);
        assert_eq!(history.query_by_time_range(0, 5_000).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_recorder_rejects_invalid_position() {
        let recorder = VisitRecorder::new(
            Arc::new(MemoryVisitedStore::new()),
            Arc::new(MemoryLocationHistory::new()),
        );
        let err = recorder
            .record(LatLng::new(f64::NAN, 0.0), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, FogError::InvalidCoordinates(_)));
    }
}
