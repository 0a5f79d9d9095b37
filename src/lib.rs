//! # pulsar-watch
//!
//! A terminal dashboard and library for Pulsar, an uptime monitor that
//! probes URLs and reports host metrics.
//!
//! The dashboard keeps a bounded, time-ordered series per displayed metric.
//! Each series is seeded once from bulk history, then extended by live push
//! events, and can be scrubbed back in time while new data keeps arriving.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Application                          │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌─────────┐ │
//! │  │  app    │───▶│   data   │───▶│   ui    │───▶│ Terminal│ │
//! │  │ (state) │    │ (session)│    │(render) │    │         │ │
//! │  └──┬───┬──┘    └──────────┘    └─────────┘    └─────────┘ │
//! │     │   │                                                   │
//! │     ▼   ▼                                                   │
//! │  ┌──────────┐ ┌─────────┐                                   │
//! │  │  source  │ │  fetch  │◀── api (Connect JSON over HTTP)   │
//! │  │  (push)  │ │ (bulk)  │                                   │
//! │  └──────────┘ └─────────┘                                   │
//! │   WsSource | StreamSource | FileSource | ChannelSource      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`app`]**: Application state, view navigation, and user interaction logic
//! - **[`source`]**: Push channel abstraction ([`EventSource`] trait) with
//!   WebSocket, TCP relay, replay file, and in-process channel implementations
//! - **[`data`]**: Series buffers, scrub windows, push routing, target grouping,
//!   alert limits, and the [`DashboardSession`] that ties them together
//! - **[`api`]**: Client for the Pulsar monitor service
//! - **[`fetch`]**: Runs API calls on the tokio runtime and hands results back
//! - **[`store`]**: Persistence of alert limits
//! - **[`config`]**: Layered settings (defaults, file, environment, flags)
//! - **[`ui`]**: Terminal rendering using ratatui
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Connect to a local Pulsar server
//! pulsar-watch --api-url http://localhost:8081
//!
//! # Replay a capture of push frames
//! pulsar-watch --replay capture.jsonl
//! ```
//!
//! ### As a library with channel source
//!
//! ```
//! use pulsar_watch::{App, ChannelSource, DashboardSession, MemoryStore, ThresholdMonitor};
//!
//! let (tx, source) = ChannelSource::create("in-process");
//! let session = DashboardSession::new(ThresholdMonitor::new(Box::new(MemoryStore::new())));
//! let mut app = App::new(Box::new(source), session);
//!
//! tx.try_send(r#"{"type":"system","data":{"cpu":{"percent":12.5}}}"#.to_string()).unwrap();
//! app.tick();
//! assert_eq!(app.session.latest_system().unwrap().cpu.percent, 12.5);
//! ```
//!
//! ### Driving the session directly
//!
//! ```
//! use pulsar_watch::{DashboardSession, MemoryStore, SeriesKey, SystemMetric, ThresholdMonitor};
//!
//! let mut session = DashboardSession::new(ThresholdMonitor::new(Box::new(MemoryStore::new())));
//! session.mount_system();
//! session.ingest(r#"{"type":"system","data":{"cpu":{"percent":40}}}"#);
//!
//! let cpu = session.view(&SeriesKey::System(SystemMetric::Cpu)).unwrap();
//! assert_eq!(cpu.buffer.len(), 1);
//! assert!(cpu.window.is_live());
//! ```
//!
//! ### With a stream source (TCP, etc.)
//!
//! ```no_run
//! use pulsar_watch::StreamSource;
//!
//! # tokio_test::block_on(async {
//! let source = StreamSource::connect("localhost:9000").await.unwrap();
//! # });
//! ```

pub mod api;
pub mod app;
pub mod config;
pub mod data;
pub mod events;
pub mod fetch;
pub mod source;
pub mod store;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use data::{
    DashboardSession, MonitorTarget, ProbeResult, SeriesBuffer, SeriesKey, SystemMetric,
    SystemStats, ThresholdMonitor, WindowController,
};
pub use source::{ChannelSource, EventSource, FileSource, StreamSource, WsSource};
pub use store::{JsonFileStore, MemoryStore, PreferenceStore};
