//! Sampling and rate-estimation engine for a status-bar network
//! throughput indicator.
//!
//! This crate owns the logic between the platform's raw byte counters
//! and a passive render surface:
//!
//! - **[`TrafficMonitor`]** — Entry point for embedders.
//!   [`spawn()`](TrafficMonitor::spawn) starts a single task that owns
//!   all mutable state and processes every event — periodic ticks, link
//!   changes, config and connectivity updates — strictly in arrival
//!   order through one queue. Ticks are self-scheduled and cancelled on
//!   screen-off, doze, or detach.
//!
//! - **[`LinkRegistry`]** — The set of live network attachments, fed by
//!   the platform's link-change notifier. Latches a changed flag so
//!   the sampler can suppress the meaningless delta that follows any
//!   topology change.
//!
//! - **[`RateSampler`]** — Sums cumulative tx/rx counters across all
//!   registered interfaces (plus hardware-offload aggregates) and turns
//!   deltas into a kbps estimate, debouncing duplicate ticks and
//!   carrying the previous estimate across counter resets.
//!
//! - **[`policy`]** — Pure decision table from rates + config +
//!   connectivity to a [`DisplayFrame`]: visibility, formatted text,
//!   arrow drawable, text size class, and the next refresh delay.
//!
//! - **[`FrameStream`]** — Subscription handle vended to the render
//!   surface. Frames are deduplicated at the source; `changed()` /
//!   `into_stream()` expose them reactively.
//!
//! The byte-counter reader is injected via [`CounterSource`]; settings
//! arrive as wholesale [`DisplayConfig`] snapshots. The crate performs
//! no I/O of its own and keeps no history — only the state needed for
//! the current display tick.

pub mod config;
pub mod error;
pub mod model;
pub mod monitor;
pub mod policy;
pub mod registry;
pub mod sampler;
pub mod source;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{DisplayConfig, Mode, Placement, Unit};
pub use error::CoreError;
pub use model::{DisplayFrame, DrawableState, Link, LinkId, RateEstimate, TextSizeClass};
pub use monitor::TrafficMonitor;
pub use policy::{Decision, decide, format_rate};
pub use registry::LinkRegistry;
pub use sampler::RateSampler;
pub use source::{CounterSource, OffloadStats};
pub use stream::{FrameStream, FrameWatchStream};
