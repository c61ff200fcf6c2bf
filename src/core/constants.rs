//! Engine-wide tuning constants for the fog pipeline.
//! Keeping them in a single place makes it easier to tweak magic numbers.

use h3o::Resolution;

/// Resolution at which visited hexes are recorded and stored.
pub const STORAGE_RESOLUTION: Resolution = Resolution::Ten;

/// Coarsest resolution the selector will ever return.
pub const COARSEST_DISPLAY_RESOLUTION: Resolution = Resolution::Four;

/// Fog is hidden rather than rendered once a viewport needs more hexes than this.
pub const DEFAULT_HEX_CAP: usize = 10_000;

/// A fog pass slower than this emits a diagnostic event.
pub const SLOW_PASS_BUDGET_MS: u64 = 20;

/// Span multiplier applied to the viewport for the fog pass itself.
pub const FOG_OVERSCAN: f64 = 1.5;

/// Span multiplier for the wide cache-warming prefetch.
pub const PREFETCH_WIDE_MULTIPLIER: f64 = 3.0;

/// Span growth for the directional warm-ahead region.
pub const PREFETCH_DIRECTIONAL_SPAN_FACTOR: f64 = 2.0;

/// Pan movement below this fraction of the span counts as noise.
pub const PAN_NOISE_RATIO: f64 = 0.1;

/// Delay between a viewport settling and the prefetch firing.
pub const PREFETCH_DELAY_MS: u64 = 50;

/// Viewport changes closer together than this are coalesced.
pub const VIEWPORT_THROTTLE_MS: u64 = 100;

/// Default fixed outer boundary of the fog polygon (south, west, north, east).
/// Covers continental North America; see DESIGN.md for the known limitation.
pub const DEFAULT_OUTER_BOUNDARY: (f64, f64, f64, f64) = (10.0, -170.0, 75.0, -50.0);
