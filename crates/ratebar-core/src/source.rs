// ── Byte counter source ──
//
// The OS-level counter reader, injected by the embedder. Reads are
// synchronous and cheap; the sampler calls them once per distinct
// interface name per tick, from the event-loop task only.

/// Aggregate counters for traffic forwarded by hardware offload.
///
/// Offloaded forwarding bypasses the per-interface accounting, so these
/// bytes never show up in `tx_bytes`/`rx_bytes` and must be added on
/// top of the per-interface sums.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OffloadStats {
    pub tx_bytes: u64,
    pub rx_bytes: u64,
}

/// Cumulative byte counters, per interface plus the offload aggregate.
///
/// Counters are expected to be monotonic per interface under normal
/// operation. Resets happen (an interface reinitializes and restarts
/// from zero) and are tolerated by the sampler. Absence of data for an
/// interface reads as 0 — implementations must not fail.
pub trait CounterSource: Send + 'static {
    /// Cumulative transmitted bytes for `interface`.
    fn tx_bytes(&self, interface: &str) -> u64;

    /// Cumulative received bytes for `interface`.
    fn rx_bytes(&self, interface: &str) -> u64;

    /// Aggregate hardware-offload counters, not attributable to any
    /// single interface.
    fn offload_stats(&self) -> OffloadStats {
        OffloadStats::default()
    }
}
