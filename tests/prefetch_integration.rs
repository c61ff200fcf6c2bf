#[cfg(test)]
mod prefetch_tests {
    use futures::StreamExt;
    use hexfog::prelude::*;
    use std::time::Duration;

    fn scheduler(cache: &GridCache, delay_ms: u64) -> PrefetchScheduler {
        let assembler = HexSetAssembler::new(cache.clone(), ResolutionSelector::default());
        let config = PrefetchConfig {
            delay_ms,
            ..PrefetchConfig::default()
        };
        PrefetchScheduler::new(assembler, config)
    }

    #[tokio::test]
    async fn test_prefetch_warms_cache_for_later_fog() {
        let cache = GridCache::new();
        let prefetch = scheduler(&cache, 10);
        let mut reports = prefetch.subscribe();

        let region = Region::from_parts(37.42, -88.31, 0.01, 0.01);
        prefetch.schedule(region, Resolution::Ten);

        let report = tokio::time::timeout(Duration::from_secs(10), reports.next())
            .await
            .expect("prefetch should complete")
            .expect("channel open");
        assert!(report.misses > 0);
        assert!(!cache.is_empty());

        // The fog pass over the same viewport is now served entirely from cache
        let engine = FogEngine::new(FogConfig::default(), cache.clone());
        let visited = hexfog::fog::ResolvedVisited {
            resolution: Resolution::Ten,
            store_version: 0,
            cells: Arc::new(HashSet::default()),
        };
        let result = engine.compute_fog(&region, &visited).unwrap();
        assert_eq!(result.diagnostics.cache_misses, 0);
    }

    #[tokio::test]
    async fn test_newer_viewport_supersedes_pending_prefetch() {
        let cache = GridCache::new();
        let prefetch = scheduler(&cache, 40);
        let mut reports = prefetch.subscribe();

        let stale = Region::from_parts(37.42, -88.31, 0.01, 0.01);
        let fresh = Region::from_parts(37.44, -88.31, 0.01, 0.01);
        prefetch.schedule(stale, Resolution::Ten);
        prefetch.schedule(fresh, Resolution::Ten);

        let report = tokio::time::timeout(Duration::from_secs(10), reports.next())
            .await
            .expect("prefetch should complete")
            .expect("channel open");
        assert_eq!(report.center, fresh.center);
        // Moved north by two spans: warm-ahead goes north
        assert_eq!(report.direction, PanDirection::new(1, 0));

        // No second report for the stale viewport
        let extra = tokio::time::timeout(Duration::from_millis(200), reports.next()).await;
        assert!(extra.is_err());
    }

    #[test]
    fn test_directional_plan_warms_cells_beyond_wide_region() {
        let cache = GridCache::new();
        let assembler = HexSetAssembler::new(cache.clone(), ResolutionSelector::default());
        let cell_size = assembler.selector().cell_size(Resolution::Ten);

        // Panning north by two spans
        let previous = LatLng::new(37.4034, -88.3077);
        let region = Region::from_parts(37.4234, -88.3077, 0.01, 0.01);
        let plan = PrefetchPlan::for_viewport(
            Some(previous),
            &region,
            Resolution::Ten,
            &PrefetchConfig::default(),
        );
        let ahead = plan.directional.expect("moving viewport has a directional region");
        assert_eq!(plan.direction, PanDirection::new(1, 0));

        let report = plan.execute(&assembler);
        assert!(report.misses > 0);

        let wide_keys = assembler.cell_keys(&plan.wide, Resolution::Ten, plan.wide_multiplier);
        let ahead_keys = assembler.cell_keys(&ahead, Resolution::Ten, 1.0);
        let beyond: Vec<_> = ahead_keys
            .iter()
            .filter(|key| !wide_keys.contains(key))
            .collect();
        assert!(!beyond.is_empty());
        assert!(beyond.iter().all(|key| cache.contains(key)));

        let center_key =
            GridCellKey::containing(ahead.center.lat, ahead.center.lng, Resolution::Ten, cell_size);
        assert!(cache.contains(&center_key));

        // The row along the far edge of the warm-ahead region
        let far_key = GridCellKey::new(Resolution::Ten, 3744, -8831);
        assert!(!wide_keys.contains(&far_key));
        assert!(cache.contains(&far_key));
    }

    #[tokio::test]
    async fn test_disabled_prefetch_schedules_nothing() {
        let cache = GridCache::new();
        let assembler = HexSetAssembler::new(cache.clone(), ResolutionSelector::default());
        let prefetch = PrefetchScheduler::new(
            assembler,
            PrefetchConfig {
                enabled: false,
                ..PrefetchConfig::default()
            },
        );
        let plan = prefetch.schedule(Region::from_parts(1.0, 1.0, 0.01, 0.01), Resolution::Ten);
        assert!(plan.is_none());
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(cache.is_empty());
    }
}
