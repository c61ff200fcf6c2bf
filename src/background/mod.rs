pub mod prefetch;
pub mod throttle;

pub use prefetch::{PanDirection, PrefetchPlan, PrefetchReport, PrefetchScheduler};
pub use throttle::ViewportThrottle;
