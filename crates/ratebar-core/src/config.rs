// ── Display configuration snapshots ──
//
// These types describe *what* the indicator should show and how often
// to sample. They never touch disk — the surrounding shell owns
// persistence and hands in a fresh immutable snapshot on any settings
// change. There is no partial mutation: a snapshot is replaced
// wholesale, which keeps out-of-band settings writes from racing the
// event loop.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Which traffic direction(s) the indicator renders.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Mode {
    #[default]
    BothStreams,
    UpstreamOnly,
    DownstreamOnly,
    Disabled,
}

impl Mode {
    /// True when upstream throughput is part of the rendered output.
    pub fn shows_upstream(self) -> bool {
        matches!(self, Self::UpstreamOnly | Self::BothStreams)
    }

    /// True when downstream throughput is part of the rendered output.
    pub fn shows_downstream(self) -> bool {
        matches!(self, Self::DownstreamOnly | Self::BothStreams)
    }
}

/// Unit the rendered value is expressed in.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Unit {
    Kilobits,
    #[default]
    Megabits,
    Kilobytes,
    Megabytes,
}

/// Where the surrounding shell has placed the indicator.
///
/// Placement is an external concern — the shell applies it, the core
/// merely folds it into the `visible` bit of each frame. Only the
/// status-bar slot ever shows the indicator.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Placement {
    #[default]
    Hidden,
    QuickSettingsHeader,
    StatusBar,
}

/// Immutable settings snapshot consumed by the display policy.
///
/// Defaults mirror the stock settings of the status-bar indicator this
/// engine drives: both streams, auto-hide on with a zero threshold,
/// megabits with unit labels, a two-second refresh cadence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub mode: Mode,
    pub auto_hide: bool,
    pub auto_hide_threshold_kbps: u64,
    pub units: Unit,
    pub show_units: bool,
    pub refresh_interval: Duration,
    pub hide_arrows: bool,
    pub placement: Placement,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            mode: Mode::BothStreams,
            auto_hide: true,
            auto_hide_threshold_kbps: 0,
            units: Unit::Megabits,
            show_units: true,
            refresh_interval: Duration::from_secs(2),
            hide_arrows: false,
            placement: Placement::Hidden,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn mode_stream_selection() {
        assert!(Mode::BothStreams.shows_upstream());
        assert!(Mode::BothStreams.shows_downstream());
        assert!(Mode::UpstreamOnly.shows_upstream());
        assert!(!Mode::UpstreamOnly.shows_downstream());
        assert!(!Mode::DownstreamOnly.shows_upstream());
        assert!(Mode::DownstreamOnly.shows_downstream());
        assert!(!Mode::Disabled.shows_upstream());
        assert!(!Mode::Disabled.shows_downstream());
    }

    #[test]
    fn enum_string_round_trip() {
        assert_eq!(Mode::UpstreamOnly.to_string(), "upstream_only");
        assert_eq!("downstream_only".parse::<Mode>().unwrap(), Mode::DownstreamOnly);
        assert_eq!(Unit::Megabits.to_string(), "megabits");
        assert_eq!("status_bar".parse::<Placement>().unwrap(), Placement::StatusBar);
    }

    #[test]
    fn config_serde_snapshot() {
        let config = DisplayConfig {
            mode: Mode::DownstreamOnly,
            auto_hide: false,
            auto_hide_threshold_kbps: 10,
            units: Unit::Kilobytes,
            show_units: false,
            refresh_interval: Duration::from_secs(4),
            hide_arrows: true,
            placement: Placement::StatusBar,
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: DisplayConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn defaults_match_stock_settings() {
        let config = DisplayConfig::default();
        assert_eq!(config.mode, Mode::BothStreams);
        assert!(config.auto_hide);
        assert_eq!(config.auto_hide_threshold_kbps, 0);
        assert_eq!(config.units, Unit::Megabits);
        assert!(config.show_units);
        assert_eq!(config.refresh_interval, Duration::from_secs(2));
        assert!(!config.hide_arrows);
    }
}
