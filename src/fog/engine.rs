use crate::core::config::FogConfig;
use crate::core::geo::Region;
use crate::fog::polygon::{FogPolygon, FogPolygonBuilder};
use crate::fog::visited::{ResolvedVisited, VisitedResolver};
use crate::hexes::{AssembledHexes, GridCache, HexSetAssembler};
use crate::{FogError, Result};
use h3o::Resolution;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::time::{Duration, Instant};

/// Per-pass measurements, attached to every result and logged for slow passes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FogDiagnostics {
    pub resolution: u8,
    pub grid_cells: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub superset_hexes: usize,
    pub visited_hexes: usize,
    pub hole_count: usize,
    pub resolve_ms: f64,
    pub assemble_ms: f64,
    pub merge_ms: f64,
    pub total_ms: f64,
}

/// What the rendering layer receives for one viewport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FogResult {
    pub polygons: Vec<FogPolygon>,
    pub status: Option<String>,
    pub resolution: Resolution,
    pub diagnostics: FogDiagnostics,
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// Computes fog polygons for viewports, sharing one grid cache
#[derive(Debug, Clone)]
pub struct FogEngine {
    config: FogConfig,
    assembler: HexSetAssembler,
    builder: FogPolygonBuilder,
}

impl FogEngine {
    pub fn new(config: FogConfig, cache: GridCache) -> Self {
        let assembler = HexSetAssembler::new(cache, config.selector());
        let builder =
            FogPolygonBuilder::new(config.fog.outer_boundary_bounds(), config.fog.hex_cap);
        Self {
            config,
            assembler,
            builder,
        }
    }

    pub fn with_config(config: FogConfig) -> Self {
        Self::new(config, GridCache::new())
    }

    pub fn config(&self) -> &FogConfig {
        &self.config
    }

    pub fn assembler(&self) -> &HexSetAssembler {
        &self.assembler
    }

    pub fn cache(&self) -> &GridCache {
        self.assembler.cache()
    }

    /// Display resolution for a region, rejecting malformed regions
    pub fn resolution_for(&self, region: &Region) -> Result<Resolution> {
        if !region.is_valid() {
            return Err(FogError::InvalidRegion(format!("{region:?}")));
        }
        Ok(self.assembler.selector().select(region.zoom_span()))
    }

    /// Fog for `region` given the visited set resolved for the same viewport.
    ///
    /// A visited set resolved at another resolution is remapped here so the
    /// pass never mixes resolutions.
    pub fn compute_fog(&self, region: &Region, visited: &ResolvedVisited) -> Result<FogResult> {
        let started = Instant::now();
        let resolution = self.resolution_for(region)?;

        let visited_cells = if visited.resolution == resolution {
            Cow::Borrowed(visited.cells.as_ref())
        } else {
            log::debug!(
                "remapping visited set from {:?} to {:?}",
                visited.resolution,
                resolution
            );
            Cow::Owned(VisitedResolver::resolve_cells(
                visited.cells.iter().copied(),
                resolution,
            ))
        };
        let resolved_at = Instant::now();

        let assembled: AssembledHexes =
            self.assembler
                .assemble(region, resolution, self.config.fog.overscan);
        let assembled_at = Instant::now();

        let outcome = self.builder.build(&assembled.hexes, &visited_cells);
        let finished = Instant::now();

        let visited_near = outcome.visited_hexes();
        let status = outcome.status();
        let polygons = outcome.into_polygons();

        let diagnostics = FogDiagnostics {
            resolution: u8::from(resolution),
            grid_cells: assembled.keys.len(),
            cache_hits: assembled.hits,
            cache_misses: assembled.misses,
            superset_hexes: assembled.len(),
            visited_hexes: visited_near,
            hole_count: polygons.iter().map(|p| p.holes.len()).sum(),
            resolve_ms: millis(resolved_at - started),
            assemble_ms: millis(assembled_at - resolved_at),
            merge_ms: millis(finished - assembled_at),
            total_ms: millis(finished - started),
        };

        if finished - started > self.config.fog.slow_pass_budget() {
            log::warn!(
                "slow fog pass: {:.1}ms at res {} ({} hexes, {} visited, {} cells, {} hits / {} misses; resolve {:.1}ms, assemble {:.1}ms, merge {:.1}ms)",
                diagnostics.total_ms,
                diagnostics.resolution,
                diagnostics.superset_hexes,
                diagnostics.visited_hexes,
                diagnostics.grid_cells,
                diagnostics.cache_hits,
                diagnostics.cache_misses,
                diagnostics.resolve_ms,
                diagnostics.assemble_ms,
                diagnostics.merge_ms,
            );
        }
        if let Some(status) = &status {
            log::info!("fog hidden: {}", status);
        }

        Ok(FogResult {
            polygons,
            status,
            resolution,
            diagnostics,
        })
    }
}
