// ── Display policy ──
//
// Pure function from (rates, config, connectivity, attachment) to one
// display frame plus the next refresh delay. No state: the monitor owns
// the state machine, this module owns the decision table.

use std::time::Duration;

use crate::config::{DisplayConfig, Mode, Placement, Unit};
use crate::model::{DisplayFrame, DrawableState, RateEstimate, TextSizeClass};

/// Outcome of one policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub frame: DisplayFrame,
    /// Delay until the next periodic tick, or `None` when the indicator
    /// is disabled and no further sampling should be scheduled.
    pub next_delay: Option<Duration>,
}

/// Evaluate the display decision for the current rates and state.
pub fn decide(
    rates: RateEstimate,
    config: &DisplayConfig,
    connectivity_available: bool,
    attached: bool,
) -> Decision {
    let enabled = config.mode != Mode::Disabled && connectivity_available;
    let show_upstream = config.mode.shows_upstream();
    let show_downstream = config.mode.shows_downstream();

    // Strictly above: a threshold of zero shows any nonzero traffic.
    let threshold = config.auto_hide_threshold_kbps;
    let above_threshold = (show_upstream && rates.tx_kbps > threshold)
        || (show_downstream && rates.rx_kbps > threshold);

    let is_active =
        attached && (!config.auto_hide || (connectivity_available && above_threshold));

    let mut text = String::new();
    let mut text_size = TextSizeClass::SingleLine;
    if enabled && is_active {
        if show_upstream {
            text.push_str(&format_rate(rates.tx_kbps, config.units, config.show_units));
        }
        if show_upstream && show_downstream {
            text.push('\n');
            text_size = TextSizeClass::MultiLine;
        }
        if show_downstream {
            text.push_str(&format_rate(rates.rx_kbps, config.units, config.show_units));
        }
    }

    let visible = is_active && !text.is_empty() && config.placement == Placement::StatusBar;

    let drawable = if enabled && !config.hide_arrows {
        match config.mode {
            Mode::BothStreams => DrawableState::UpAndDown,
            Mode::UpstreamOnly => DrawableState::UpOnly,
            Mode::DownstreamOnly => DrawableState::DownOnly,
            Mode::Disabled => DrawableState::None,
        }
    } else {
        DrawableState::None
    };

    let next_delay = (enabled && attached).then_some(config.refresh_interval);

    Decision {
        frame: DisplayFrame {
            visible,
            is_active,
            text,
            drawable,
            text_size,
        },
        next_delay,
    }
}

/// Format a kbps value in the configured unit.
///
/// Kilobits and kilobytes render as integers; megabits get one decimal
/// and megabytes two. The label is appended with a single space only
/// when `show_units` is set.
#[allow(clippy::as_conversions, clippy::cast_precision_loss)]
pub fn format_rate(kbps: u64, units: Unit, show_units: bool) -> String {
    let (value, label) = match units {
        Unit::Kilobits => (format!("{kbps}"), "kb/s"),
        Unit::Megabits => (format!("{:.1}", kbps as f64 / 1_000.0), "Mb/s"),
        Unit::Kilobytes => (format!("{}", kbps / 8), "kB/s"),
        Unit::Megabytes => (format!("{:.2}", kbps as f64 / 8_000.0), "MB/s"),
    };

    if show_units {
        format!("{value} {label}")
    } else {
        value
    }
}
