//! Data models and the dashboard core.
//!
//! This module holds everything that is not transport or rendering: series
//! storage, scrub windows, alert limits, target grouping, push-event routing,
//! and the session object that ties them together.
//!
//! ## Submodules
//!
//! - [`sample`]: one point of a series ([`Sample`])
//! - [`series`]: bounded ring buffer of samples ([`SeriesBuffer`])
//! - [`window`]: scrub cursor and live/history mode ([`WindowController`])
//! - [`threshold`]: per-metric alert limits ([`ThresholdMonitor`])
//! - [`grouping`]: parent/child grouping of target URLs ([`group_targets`])
//! - [`router`]: push-frame parsing ([`UpdateRouter`])
//! - [`session`]: the mutable dashboard state ([`DashboardSession`])
//!
//! ## Data Flow
//!
//! ```text
//! push frame (JSON)          bulk history (API)
//!        │                           │
//!        ▼                           ▼
//! UpdateRouter::route()     apply_*_history(token)
//!        │                           │
//!        └──────────┬────────────────┘
//!                   ▼
//!          DashboardSession
//!                   │
//!                   ├──▶ SeriesBuffer::append / prepend
//!                   ├──▶ WindowController::on_buffer_grow
//!                   └──▶ ThresholdMonitor::evaluate
//! ```

pub mod grouping;
pub mod history;
pub mod metric;
pub mod router;
pub mod sample;
pub mod series;
pub mod session;
pub mod stats;
pub mod threshold;
pub mod window;

pub use grouping::{group_targets, MonitorTarget, TargetGroup};
pub use history::{ProbeRecord, SystemHistory, ThreadRecord};
pub use metric::{SeriesKey, SystemMetric};
pub use router::{PushEvent, RouteError, RoutedEvent, UpdateRouter};
pub use sample::{ProbeTiming, Sample, SampleMeta, SampleValue, ThreadCounts};
pub use series::{BatchOrder, SeriesBuffer, SeriesKind};
pub use session::{DashboardSession, SeriesView, ViewToken};
pub use stats::{LatencyGrade, ProbeResult, SystemStats};
pub use threshold::{is_breached, ThresholdMonitor};
pub use window::WindowController;
