use crate::core::config::PrefetchConfig;
use crate::core::geo::{LatLng, Region};
use crate::hexes::HexSetAssembler;
use crate::prelude::{Arc, Mutex};
use crate::runtime::{self, AsyncHandle};
use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use h3o::Resolution;
use serde::Serialize;

/// Pan direction per axis: -1, 0 or 1
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PanDirection {
    pub lat: i8,
    pub lng: i8,
}

impl PanDirection {
    pub fn new(lat: i8, lng: i8) -> Self {
        Self { lat, lng }
    }

    /// Compares viewport centers; movement smaller than `noise_ratio` of the
    /// current span on an axis counts as no movement on that axis
    pub fn detect(previous: LatLng, current: &Region, noise_ratio: f64) -> Self {
        fn axis(delta: f64, threshold: f64) -> i8 {
            if delta > threshold {
                1
            } else if delta < -threshold {
                -1
            } else {
                0
            }
        }

        Self {
            lat: axis(
                current.center.lat - previous.lat,
                current.lat_span * noise_ratio,
            ),
            lng: axis(
                current.center.lng - previous.lng,
                current.lng_span * noise_ratio,
            ),
        }
    }

    pub fn is_still(&self) -> bool {
        self.lat == 0 && self.lng == 0
    }
}

/// The regions a prefetch pass warms
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrefetchPlan {
    pub resolution: Resolution,
    pub wide: Region,
    pub wide_multiplier: f64,
    pub direction: PanDirection,
    pub directional: Option<Region>,
}

impl PrefetchPlan {
    pub fn for_viewport(
        previous: Option<LatLng>,
        current: &Region,
        resolution: Resolution,
        config: &PrefetchConfig,
    ) -> Self {
        let direction = previous
            .map(|previous| PanDirection::detect(previous, current, config.noise_ratio))
            .unwrap_or_default();

        let directional = (config.directional && !direction.is_still()).then(|| {
            current
                .offset_by_spans(direction.lat as f64, direction.lng as f64)
                .scaled(config.directional_span_factor)
        });

        Self {
            resolution,
            wide: *current,
            wide_multiplier: config.wide_multiplier,
            direction,
            directional,
        }
    }

    /// Runs the plan against the assembler, filling the shared cache
    pub fn execute(&self, assembler: &HexSetAssembler) -> PrefetchReport {
        let wide = assembler.assemble(&self.wide, self.resolution, self.wide_multiplier);
        let mut report = PrefetchReport {
            center: self.wide.center,
            direction: self.direction,
            hexes: wide.len(),
            cells: wide.keys.len(),
            hits: wide.hits,
            misses: wide.misses,
        };

        if let Some(region) = &self.directional {
            let ahead = assembler.assemble(region, self.resolution, 1.0);
            report.hexes += ahead.len();
            report.cells += ahead.keys.len();
            report.hits += ahead.hits;
            report.misses += ahead.misses;
        }
        report
    }
}

/// Summary of one completed prefetch pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrefetchReport {
    pub center: LatLng,
    pub direction: PanDirection,
    pub hexes: usize,
    pub cells: usize,
    pub hits: usize,
    pub misses: usize,
}

#[derive(Default)]
struct SchedulerState {
    previous_center: Option<LatLng>,
    pending: Option<Box<dyn AsyncHandle>>,
}

/// Warms the grid cache around a settled viewport and ahead of panning.
///
/// Each `schedule` call replaces the pending pass, so only the latest
/// viewport within the delay window is prefetched.
pub struct PrefetchScheduler {
    assembler: HexSetAssembler,
    config: PrefetchConfig,
    state: Mutex<SchedulerState>,
    subscribers: Arc<Mutex<Vec<UnboundedSender<PrefetchReport>>>>,
}

impl PrefetchScheduler {
    pub fn new(assembler: HexSetAssembler, config: PrefetchConfig) -> Self {
        Self {
            assembler,
            config,
            state: Mutex::new(SchedulerState::default()),
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn config(&self) -> &PrefetchConfig {
        &self.config
    }

    /// Receives a report after every completed prefetch pass
    pub fn subscribe(&self) -> UnboundedReceiver<PrefetchReport> {
        let (tx, rx) = unbounded();
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.push(tx);
        }
        rx
    }

    /// Schedules a deferred prefetch for `region`, superseding any pending one
    pub fn schedule(&self, region: Region, resolution: Resolution) -> Option<PrefetchPlan> {
        if !self.config.enabled {
            return None;
        }

        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        let plan =
            PrefetchPlan::for_viewport(state.previous_center, &region, resolution, &self.config);
        state.previous_center = Some(region.center);

        if let Some(pending) = state.pending.take() {
            if !pending.is_finished() {
                log::debug!("superseding pending prefetch");
                pending.cancel();
            }
        }

        let assembler = self.assembler.clone();
        let subscribers = self.subscribers.clone();
        let delay = self.config.delay();
        let task_plan = plan.clone();
        state.pending = Some(runtime::spawn(async move {
            runtime::async_delay(delay).await;
            let report = task_plan.execute(&assembler);
            log::debug!(
                "prefetch at {:?} dir {:?}: {} hexes, {} cells ({} hits / {} misses)",
                report.center,
                report.direction,
                report.hexes,
                report.cells,
                report.hits,
                report.misses
            );
            if let Ok(mut subscribers) = subscribers.lock() {
                subscribers.retain(|tx| tx.unbounded_send(report.clone()).is_ok());
            }
        }));

        Some(plan)
    }

    /// Cancels the pending pass, if any
    pub fn cancel(&self) {
        if let Ok(mut state) = self.state.lock() {
            if let Some(pending) = state.pending.take() {
                pending.cancel();
            }
        }
    }
}

impl Drop for PrefetchScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_detection() {
        let region = Region::from_parts(0.5, 0.0, 1.0, 1.0);
        let direction = PanDirection::detect(LatLng::new(0.0, 0.0), &region, 0.1);
        assert_eq!(direction, PanDirection::new(1, 0));

        let region = Region::from_parts(-0.05, -0.3, 1.0, 1.0);
        let direction = PanDirection::detect(LatLng::new(0.0, 0.0), &region, 0.1);
        assert_eq!(direction, PanDirection::new(0, -1));
    }

    #[test]
    fn test_directional_region_offsets_one_span() {
        let config = PrefetchConfig::default();
        let region = Region::from_parts(0.5, 0.0, 1.0, 1.0);
        let plan = PrefetchPlan::for_viewport(
            Some(LatLng::new(0.0, 0.0)),
            &region,
            Resolution::Five,
            &config,
        );

        let ahead = plan.directional.unwrap();
        assert_eq!(ahead.center, LatLng::new(1.5, 0.0));
        assert_eq!(ahead.lat_span, 2.0);
        assert_eq!(ahead.lng_span, 2.0);
        assert_eq!(plan.wide, region);
    }

    #[test]
    fn test_no_directional_region_without_movement() {
        let config = PrefetchConfig::default();
        let region = Region::from_parts(0.01, 0.0, 1.0, 1.0);
        let still = PrefetchPlan::for_viewport(
            Some(LatLng::new(0.0, 0.0)),
            &region,
            Resolution::Five,
            &config,
        );
        assert!(still.directional.is_none());

        let first = PrefetchPlan::for_viewport(None, &region, Resolution::Five, &config);
        assert!(first.direction.is_still());
        assert!(first.directional.is_none());
    }
}
