//! Terminal UI rendering using ratatui.
//!
//! This module contains all the view-specific rendering logic for the TUI.
//! Each view is implemented in its own submodule with a `render` function.
//!
//! ## Submodules
//!
//! - [`system`]: Host metric widgets with gauges, sparklines and alert flags
//! - [`targets`]: Grouped table of probed URLs with their latest result
//! - [`detail`]: Modal overlay with the scrubbable chart of one series
//! - [`common`]: Shared components (header, tabs, status bar, prompts, help)
//! - [`theme`]: Light/dark theme support with terminal auto-detection
//!
//! ## Rendering Architecture
//!
//! The main loop in `main.rs` calls into these modules based on the current view:
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ Header (common::render_header)       │
//! ├──────────────────────────────────────┤
//! │ Tabs (common::render_tabs)           │
//! ├──────────────────────────────────────┤
//! │                                      │
//! │ View Content                         │
//! │ (system/targets::render)             │
//! │                                      │
//! ├──────────────────────────────────────┤
//! │ Status Bar (common::render_status)   │
//! └──────────────────────────────────────┘
//!         ↑
//!    Overlays rendered on top:
//!    - detail::render_overlay
//!    - common::render_input
//!    - common::render_help
//! ```

pub mod common;
pub mod detail;
pub mod system;
pub mod targets;
pub mod theme;

pub use theme::Theme;
