// ── Throughput sampling ──
//
// Converts cumulative byte counters into a kbps estimate once per
// refresh interval. All the subtlety is in what *not* to report:
// early double-delivered ticks, deltas spanning a link-set change, and
// counter resets each have their own carve-out below.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, trace};

use crate::model::RateEstimate;
use crate::registry::LinkRegistry;
use crate::source::CounterSource;

/// Fraction of the refresh interval below which a tick is considered a
/// duplicate delivery and ignored.
const EARLY_TICK_FRACTION: f64 = 0.95;

/// Delta-based rate estimator over the registered link set.
///
/// Holds the previous sample (aggregate tx/rx bytes and its timestamp)
/// and the last good estimate. Single instance, mutated only during
/// tick processing on the event-loop task.
#[derive(Debug)]
pub struct RateSampler {
    refresh_interval: Duration,
    last_tx_bytes: u64,
    last_rx_bytes: u64,
    last_sample_at: Option<Instant>,
    estimate: RateEstimate,
}

impl RateSampler {
    pub fn new(refresh_interval: Duration) -> Self {
        Self {
            refresh_interval,
            last_tx_bytes: 0,
            last_rx_bytes: 0,
            last_sample_at: None,
            estimate: RateEstimate::ZERO,
        }
    }

    /// The estimate produced by the most recent valid tick.
    pub fn estimate(&self) -> RateEstimate {
        self.estimate
    }

    /// Adopt a new refresh cadence (config change). The in-flight
    /// baseline is kept — the next tick simply measures against it.
    pub fn set_refresh_interval(&mut self, refresh_interval: Duration) {
        self.refresh_interval = refresh_interval;
    }

    /// Process one periodic tick at `now`.
    ///
    /// Sums counters across the registry's distinct interface names
    /// plus the offload aggregate, computes deltas against the previous
    /// sample, and updates the estimate according to the validity
    /// rules. Returns the (possibly carried-forward) estimate.
    pub fn tick(
        &mut self,
        now: Instant,
        registry: &mut LinkRegistry,
        source: &impl CounterSource,
    ) -> RateEstimate {
        // Debounce: a tick landing well short of the cadence is a
        // double delivery after a reschedule. Keep everything,
        // including the baseline timestamp.
        if let Some(last) = self.last_sample_at {
            let elapsed = now.duration_since(last);
            if elapsed < self.refresh_interval.mul_f64(EARLY_TICK_FRACTION) {
                trace!(?elapsed, "early tick ignored");
                return self.estimate;
            }
        }

        let mut tx_bytes: u64 = 0;
        let mut rx_bytes: u64 = 0;
        for interface in registry.interface_names() {
            let tx = source.tx_bytes(interface);
            let rx = source.rx_bytes(interface);
            trace!(interface, tx, rx, "interface counters");
            tx_bytes = tx_bytes.saturating_add(tx);
            rx_bytes = rx_bytes.saturating_add(rx);
        }
        let offload = source.offload_stats();
        tx_bytes = tx_bytes.saturating_add(offload.tx_bytes);
        rx_bytes = rx_bytes.saturating_add(offload.rx_bytes);

        // Read-and-clear happens on every tick that got past the
        // debounce, whether or not a delta can be computed.
        let set_changed = registry.consume_changed();

        if let Some(last) = self.last_sample_at {
            let time_delta = now.duration_since(last);
            if set_changed {
                // The contributing set is not what the baseline saw, so
                // the raw delta is meaningless. Report one zero-rate
                // interval rather than a spike.
                debug!("link set changed, forcing zero rates for this interval");
                self.estimate = RateEstimate::ZERO;
            } else if !time_delta.is_zero() {
                match (
                    tx_bytes.checked_sub(self.last_tx_bytes),
                    rx_bytes.checked_sub(self.last_rx_bytes),
                ) {
                    (Some(tx_delta), Some(rx_delta)) => {
                        self.estimate = RateEstimate {
                            tx_kbps: kbps(tx_delta, time_delta),
                            rx_kbps: kbps(rx_delta, time_delta),
                        };
                    }
                    _ => {
                        // Counter reset. Carry the previous estimate
                        // forward; the baselines below re-anchor on the
                        // new values.
                        debug!("counter went backwards, keeping previous estimate");
                    }
                }
            }
        }

        self.last_tx_bytes = tx_bytes;
        self.last_rx_bytes = rx_bytes;
        self.last_sample_at = Some(now);

        self.estimate
    }
}

/// bytes over `dt` → kilobits per second, truncated.
#[allow(
    clippy::as_conversions,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn kbps(delta_bytes: u64, dt: Duration) -> u64 {
    (delta_bytes as f64 * 8.0 / 1000.0 / dt.as_secs_f64()) as u64
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::model::LinkId;
    use crate::source::OffloadStats;

    /// Fixed-value counter source for driving the sampler by hand.
    #[derive(Default)]
    struct FakeCounters {
        interfaces: HashMap<String, (u64, u64)>,
        offload: OffloadStats,
    }

    impl FakeCounters {
        fn set(&mut self, interface: &str, tx: u64, rx: u64) {
            self.interfaces.insert(interface.into(), (tx, rx));
        }
    }

    impl CounterSource for FakeCounters {
        fn tx_bytes(&self, interface: &str) -> u64 {
            self.interfaces.get(interface).map_or(0, |c| c.0)
        }

        fn rx_bytes(&self, interface: &str) -> u64 {
            self.interfaces.get(interface).map_or(0, |c| c.1)
        }

        fn offload_stats(&self) -> OffloadStats {
            self.offload
        }
    }

    const INTERVAL: Duration = Duration::from_secs(2);

    fn registry_with_eth0() -> LinkRegistry {
        let mut registry = LinkRegistry::new();
        registry.add_or_update(LinkId::new(1), Some("eth0".into()));
        registry
    }

    #[tokio::test(start_paused = true)]
    async fn steady_state_rates_follow_the_delta_formula() {
        let mut registry = registry_with_eth0();
        let mut source = FakeCounters::default();
        let mut sampler = RateSampler::new(INTERVAL);

        let t0 = Instant::now();
        source.set("eth0", 1_000, 2_000);
        // Baseline tick: initial latch forces a changed-set pass.
        assert_eq!(sampler.tick(t0, &mut registry, &source), RateEstimate::ZERO);

        // 500_000 tx bytes over 2s = 500_000 * 8 / 1000 / 2 = 2000 kbps.
        source.set("eth0", 501_000, 252_000);
        let estimate = sampler.tick(t0 + INTERVAL, &mut registry, &source);
        assert_eq!(estimate.tx_kbps, 2_000);
        assert_eq!(estimate.rx_kbps, 1_000);
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_interval_normalizes_to_one_second() {
        let mut registry = registry_with_eth0();
        let mut source = FakeCounters::default();
        let mut sampler = RateSampler::new(INTERVAL);

        let t0 = Instant::now();
        sampler.tick(t0, &mut registry, &source);

        // Same byte delta over 4s yields half the rate.
        source.set("eth0", 500_000, 0);
        let estimate = sampler.tick(t0 + INTERVAL * 2, &mut registry, &source);
        assert_eq!(estimate.tx_kbps, 1_000);
    }

    #[tokio::test(start_paused = true)]
    async fn offload_counters_are_added_to_the_sums() {
        let mut registry = registry_with_eth0();
        let mut source = FakeCounters::default();
        let mut sampler = RateSampler::new(INTERVAL);

        let t0 = Instant::now();
        sampler.tick(t0, &mut registry, &source);

        // All movement is on the offload counters.
        source.offload = OffloadStats {
            tx_bytes: 250_000,
            rx_bytes: 500_000,
        };
        let estimate = sampler.tick(t0 + INTERVAL, &mut registry, &source);
        assert_eq!(estimate.tx_kbps, 1_000);
        assert_eq!(estimate.rx_kbps, 2_000);
    }

    #[tokio::test(start_paused = true)]
    async fn early_tick_is_a_no_op() {
        let mut registry = registry_with_eth0();
        let mut source = FakeCounters::default();
        let mut sampler = RateSampler::new(INTERVAL);

        let t0 = Instant::now();
        sampler.tick(t0, &mut registry, &source);
        source.set("eth0", 500_000, 500_000);
        let steady = sampler.tick(t0 + INTERVAL, &mut registry, &source);

        // Fired at 5% of the interval: estimate and baseline untouched.
        source.set("eth0", 9_000_000, 9_000_000);
        let early = sampler.tick(
            t0 + INTERVAL + Duration::from_millis(100),
            &mut registry,
            &source,
        );
        assert_eq!(early, steady);

        // The next on-cadence tick measures from the *old* baseline,
        // proving the early tick did not advance it.
        let next = sampler.tick(t0 + INTERVAL * 2, &mut registry, &source);
        assert_eq!(next.tx_kbps, (9_000_000 - 500_000) * 8 / 1000 / 2);
    }

    #[tokio::test(start_paused = true)]
    async fn link_set_change_forces_one_zero_interval() {
        let mut registry = registry_with_eth0();
        let mut source = FakeCounters::default();
        let mut sampler = RateSampler::new(INTERVAL);

        let t0 = Instant::now();
        sampler.tick(t0, &mut registry, &source);
        source.set("eth0", 500_000, 500_000);
        let steady = sampler.tick(t0 + INTERVAL, &mut registry, &source);
        assert!(steady.tx_kbps > 0);

        // A new link joins; its counters make the raw delta jump.
        registry.add_or_update(LinkId::new(2), Some("wlan0".into()));
        source.set("wlan0", 77_000_000, 77_000_000);
        let blip = sampler.tick(t0 + INTERVAL * 2, &mut registry, &source);
        assert_eq!(blip, RateEstimate::ZERO);

        // One interval later the rebased delta is valid again.
        source.set("eth0", 750_000, 750_000);
        let resumed = sampler.tick(t0 + INTERVAL * 3, &mut registry, &source);
        assert_eq!(resumed.tx_kbps, 1_000);
        assert_eq!(resumed.rx_kbps, 1_000);
    }

    #[tokio::test(start_paused = true)]
    async fn counter_reset_carries_estimate_and_rebases() {
        let mut registry = registry_with_eth0();
        let mut source = FakeCounters::default();
        let mut sampler = RateSampler::new(INTERVAL);

        let t0 = Instant::now();
        source.set("eth0", 10_000_000, 10_000_000);
        sampler.tick(t0, &mut registry, &source);
        source.set("eth0", 10_500_000, 10_500_000);
        let steady = sampler.tick(t0 + INTERVAL, &mut registry, &source);
        assert_eq!(steady.tx_kbps, 2_000);

        // Interface reinitialized: counters restart near zero.
        source.set("eth0", 1_000, 1_000);
        let carried = sampler.tick(t0 + INTERVAL * 2, &mut registry, &source);
        assert_eq!(carried, steady);

        // Baseline was re-anchored at the reset value.
        source.set("eth0", 251_000, 501_000);
        let fresh = sampler.tick(t0 + INTERVAL * 3, &mut registry, &source);
        assert_eq!(fresh.tx_kbps, 1_000);
        assert_eq!(fresh.rx_kbps, 2_000);
    }

    #[tokio::test(start_paused = true)]
    async fn unnamed_links_contribute_nothing() {
        let mut registry = LinkRegistry::new();
        registry.add_or_update(LinkId::new(1), None);
        let mut source = FakeCounters::default();
        source.set("eth0", 999_999, 999_999);
        let mut sampler = RateSampler::new(INTERVAL);

        let t0 = Instant::now();
        sampler.tick(t0, &mut registry, &source);
        let estimate = sampler.tick(t0 + INTERVAL, &mut registry, &source);
        assert_eq!(estimate, RateEstimate::ZERO);
    }
}
