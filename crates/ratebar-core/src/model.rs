// ── Core identity and display types ──
//
// LinkId and Link identify live network attachments as reported by the
// platform's link-change notifier. DisplayFrame is what the render
// surface consumes — it carries everything the surface needs and
// nothing it doesn't.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── LinkId ──────────────────────────────────────────────────────────

/// Opaque handle for a network attachment, unique per attachment.
///
/// The platform notifier hands these out; the core never interprets the
/// value beyond identity. A re-attached network arrives under a fresh
/// handle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct LinkId(u64);

impl LinkId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link#{}", self.0)
    }
}

impl From<u64> for LinkId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

// ── Link ────────────────────────────────────────────────────────────

/// A live network attachment tracked by handle and interface name.
///
/// A link whose interface name is unknown (`None`) contributes nothing
/// to the byte counters — it is tracked only so a later update can fill
/// the name in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub id: LinkId,
    pub interface: Option<String>,
}

// ── RateEstimate ────────────────────────────────────────────────────

/// Current throughput estimate in kilobits per second.
///
/// Derived on each tick; valid only until the next tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateEstimate {
    pub tx_kbps: u64,
    pub rx_kbps: u64,
}

impl RateEstimate {
    pub const ZERO: Self = Self {
        tx_kbps: 0,
        rx_kbps: 0,
    };
}

// ── Display surface types ───────────────────────────────────────────

/// Which traffic arrow glyph the surface should show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawableState {
    #[default]
    None,
    UpAndDown,
    UpOnly,
    DownOnly,
}

/// Text size class for the rendered indicator.
///
/// Two stacked values need a smaller face than a single line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSizeClass {
    #[default]
    SingleLine,
    MultiLine,
}

/// One complete display decision, emitted on every processed event.
///
/// The surface is passive: it reflects the latest frame and applies no
/// logic of its own. `is_active` and `text` are exposed separately from
/// `visible` so an external placement rule can re-derive visibility for
/// a slot the core doesn't know about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayFrame {
    pub visible: bool,
    pub is_active: bool,
    pub text: String,
    pub drawable: DrawableState,
    pub text_size: TextSizeClass,
}
