//! Headless driver for the fog engine.
//!
//! Walks a short path through a town, recording visits, then pans the
//! viewport along it and prints each fog result as JSON. An optional first
//! argument names a JSON config file.

use anyhow::Context;
use futures::StreamExt;
use hexfog::prelude::*;
use std::time::Duration;

const START: (f64, f64) = (37.4200, -88.3100);
const WALK_STEPS: usize = 60;
const STEP_DEG: f64 = 0.0004;

fn load_config() -> anyhow::Result<FogConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {path}"))?;
            Ok(FogConfig::from_json_str(&json)?)
        }
        None => Ok(FogProfile::Balanced.resolve()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = load_config()?;
    let visited = Arc::new(MemoryVisitedStore::new());
    let history = Arc::new(MemoryLocationHistory::new());
    let mut session = FogSession::new(config, visited.clone(), history.clone())?;

    let mut prefetch_reports = session.prefetch().subscribe();
    tokio::spawn(async move {
        while let Some(report) = prefetch_reports.next().await {
            log::info!(
                "prefetch warmed {} cells ({} new) around {:?}",
                report.cells,
                report.misses,
                report.center
            );
        }
    });

    // Walk north-east, one fix every 10 seconds
    for step in 0..WALK_STEPS {
        let position = LatLng::new(
            START.0 + step as f64 * STEP_DEG,
            START.1 + step as f64 * STEP_DEG * 0.5,
        );
        session
            .record_location(position, step as i64 * 10_000)
            .await?;
    }
    log::info!("recorded {} visited hexes", visited.len());

    let path = history.query_by_time_range(0, i64::MAX).await?;
    log::info!("location history holds {} fixes", path.len());

    // Pan along the walk at two zoom levels
    for span in [0.01, 0.1] {
        for step in (0..WALK_STEPS).step_by(15) {
            let region = Region::from_parts(
                START.0 + step as f64 * STEP_DEG,
                START.1 + step as f64 * STEP_DEG * 0.5,
                span,
                span,
            );
            let result = match session.on_viewport_change(region).await? {
                Some(result) => Some(result),
                None => {
                    if let Some(deadline) = session.pending_deadline() {
                        tokio::time::sleep_until(deadline.into()).await;
                    }
                    session.flush_pending().await?
                }
            };
            if let Some(result) = result {
                println!("{}", serde_json::to_string(&result.diagnostics)?);
            }
            tokio::time::sleep(Duration::from_millis(120)).await;
        }
    }

    let stats = session.engine().cache().stats();
    log::info!(
        "grid cache: {} entries, {} hits, {} misses",
        stats.entries,
        stats.hits,
        stats.misses
    );
    Ok(())
}
