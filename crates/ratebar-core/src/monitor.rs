// ── Traffic monitor ──
//
// The single serialized event queue from the concurrency contract:
// periodic ticks, link add/remove events, and recompute requests are
// all funneled into one mpsc channel and processed one at a time by
// the monitor task. The registry and sample state are owned by that
// task and never touched from another context.
//
// Ticks are self-scheduled: after each evaluation the task arms a
// sleep guarded by a child cancellation token, and cancels the
// previous one first so a reschedule can never produce duplicate
// ticks. Screen-off, doze, and detach cancel the pending tick
// immediately and suppress scheduling until the surface is back.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::DisplayConfig;
use crate::error::CoreError;
use crate::model::{DisplayFrame, LinkId, RateEstimate};
use crate::policy::{self, Decision};
use crate::registry::LinkRegistry;
use crate::sampler::RateSampler;
use crate::source::CounterSource;
use crate::stream::FrameStream;

const EVENT_CHANNEL_SIZE: usize = 64;

// ── Events ──────────────────────────────────────────────────────────

/// Everything the monitor task reacts to, in arrival order.
#[derive(Debug)]
enum Event {
    /// Periodic refresh: sample counters, then re-evaluate the display.
    Tick,
    /// Re-evaluate the display without sampling.
    Refresh,
    /// Link-change notifier: a link appeared or its properties changed.
    LinkUpdated {
        id: LinkId,
        interface: Option<String>,
    },
    /// Link-change notifier: a link went away.
    LinkLost { id: LinkId },
    /// Settings changed; the snapshot is replaced wholesale.
    ConfigChanged(DisplayConfig),
    ConnectivityChanged(bool),
    ScreenStateChanged { awake: bool },
    Attached,
    Detached,
}

// ── TrafficMonitor ──────────────────────────────────────────────────

/// Handle to a running traffic monitor.
///
/// Cheaply cloneable. Link-change notifications go through the
/// non-blocking `link_updated`/`link_lost` funnel (safe to call from a
/// foreign notifier context); everything else is async and awaits
/// queue capacity. The render surface subscribes via [`frames()`]
/// and passively reflects each emitted [`DisplayFrame`].
///
/// [`frames()`]: TrafficMonitor::frames
#[derive(Clone)]
pub struct TrafficMonitor {
    inner: Arc<MonitorInner>,
}

struct MonitorInner {
    event_tx: mpsc::Sender<Event>,
    frame_rx: watch::Receiver<DisplayFrame>,
    config: Arc<ArcSwap<DisplayConfig>>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl TrafficMonitor {
    /// Spawn the monitor task with an initial configuration and a
    /// counter source.
    ///
    /// The monitor starts detached, screen-awake, and without
    /// connectivity; the embedder feeds in the real state via
    /// [`attach`](Self::attach) and friends. Must be called from within
    /// a tokio runtime.
    pub fn spawn(config: DisplayConfig, source: impl CounterSource) -> Self {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_SIZE);
        let (frame_tx, frame_rx) = watch::channel(DisplayFrame::default());
        let shared_config = Arc::new(ArcSwap::from_pointee(config.clone()));
        let cancel = CancellationToken::new();

        let task = MonitorTask {
            sampler: RateSampler::new(config.refresh_interval),
            registry: LinkRegistry::new(),
            source,
            config: Arc::new(config),
            shared_config: Arc::clone(&shared_config),
            connectivity_available: false,
            screen_awake: true,
            attached: false,
            frame_tx,
            event_tx: event_tx.clone(),
            pending_tick: None,
            cancel: cancel.clone(),
        };
        let handle = tokio::spawn(task.run(event_rx));

        Self {
            inner: Arc::new(MonitorInner {
                event_tx,
                frame_rx,
                config: shared_config,
                cancel,
                task: Mutex::new(Some(handle)),
            }),
        }
    }

    // ── Link-change notifier funnel ──────────────────────────────

    /// A link appeared or its interface name changed.
    ///
    /// Non-blocking: safe to call from the notifier's own context.
    pub fn link_updated(&self, id: LinkId, interface: Option<String>) -> Result<(), CoreError> {
        self.try_send(Event::LinkUpdated { id, interface })
    }

    /// A link was lost. Unknown handles are a silent no-op downstream.
    pub fn link_lost(&self, id: LinkId) -> Result<(), CoreError> {
        self.try_send(Event::LinkLost { id })
    }

    // ── State inputs ─────────────────────────────────────────────

    /// Replace the configuration snapshot and re-evaluate the display.
    pub async fn update_config(&self, config: DisplayConfig) -> Result<(), CoreError> {
        self.send(Event::ConfigChanged(config)).await
    }

    /// Report whether any network is currently reachable.
    pub async fn set_connectivity(&self, available: bool) -> Result<(), CoreError> {
        self.send(Event::ConnectivityChanged(available)).await
    }

    /// Report the display waking or sleeping. Doze counts as asleep.
    pub async fn set_screen_awake(&self, awake: bool) -> Result<(), CoreError> {
        self.send(Event::ScreenStateChanged { awake }).await
    }

    /// The surface is attached and wants frames.
    pub async fn attach(&self) -> Result<(), CoreError> {
        self.send(Event::Attached).await
    }

    /// The surface detached; sampling stops until re-attach.
    pub async fn detach(&self) -> Result<(), CoreError> {
        self.send(Event::Detached).await
    }

    /// Force a display re-evaluation without waiting for the next tick.
    pub async fn refresh_now(&self) -> Result<(), CoreError> {
        self.send(Event::Refresh).await
    }

    // ── Observation ──────────────────────────────────────────────

    /// Subscribe to display frames.
    pub fn frames(&self) -> FrameStream {
        FrameStream::new(self.inner.frame_rx.clone())
    }

    /// The most recently emitted frame.
    pub fn latest_frame(&self) -> DisplayFrame {
        self.inner.frame_rx.borrow().clone()
    }

    /// The configuration snapshot currently in effect.
    pub fn config(&self) -> Arc<DisplayConfig> {
        self.inner.config.load_full()
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Stop the monitor task and wait for it to finish. Idempotent.
    pub async fn shutdown(&self) -> Result<(), CoreError> {
        self.inner.cancel.cancel();
        if let Some(handle) = self.inner.task.lock().await.take() {
            handle
                .await
                .map_err(|e| CoreError::TaskFailed(e.to_string()))?;
        }
        Ok(())
    }

    // ── Private helpers ──────────────────────────────────────────

    fn try_send(&self, event: Event) -> Result<(), CoreError> {
        match self.inner.event_tx.try_send(event) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(event)) => {
                // Dropping under backpressure is tolerated: the registry
                // latches on removals even for unknown handles, so a
                // lost add cannot mask a later structural change.
                warn!(?event, "event queue full, dropping event");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(CoreError::MonitorClosed),
        }
    }

    async fn send(&self, event: Event) -> Result<(), CoreError> {
        self.inner
            .event_tx
            .send(event)
            .await
            .map_err(|_| CoreError::MonitorClosed)
    }
}

// ── Monitor task ────────────────────────────────────────────────────

struct MonitorTask<S> {
    source: S,
    registry: LinkRegistry,
    sampler: RateSampler,
    config: Arc<DisplayConfig>,
    shared_config: Arc<ArcSwap<DisplayConfig>>,
    connectivity_available: bool,
    screen_awake: bool,
    attached: bool,
    frame_tx: watch::Sender<DisplayFrame>,
    event_tx: mpsc::Sender<Event>,
    /// Guard for the currently scheduled tick, if any.
    pending_tick: Option<CancellationToken>,
    cancel: CancellationToken,
}

impl<S: CounterSource> MonitorTask<S> {
    async fn run(mut self, mut rx: mpsc::Receiver<Event>) {
        debug!("traffic monitor task started");
        let cancel = self.cancel.clone();
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                event = rx.recv() => {
                    let Some(event) = event else { break };
                    self.handle_event(event);
                }
            }
        }
        self.cancel_pending_tick();
        debug!("traffic monitor task stopped");
    }

    fn handle_event(&mut self, event: Event) {
        trace!(?event, "processing event");
        match event {
            Event::Tick => {
                // A tick queued before a screen-off or detach was
                // processed must not restart sampling.
                if !(self.attached && self.screen_awake) {
                    debug!("tick while idle, ignored");
                    return;
                }
                let rates = self
                    .sampler
                    .tick(Instant::now(), &mut self.registry, &self.source);
                self.publish(rates);
            }
            Event::Refresh => {
                let rates = self.sampler.estimate();
                self.publish(rates);
            }
            Event::LinkUpdated { id, interface } => {
                self.registry.add_or_update(id, interface);
            }
            Event::LinkLost { id } => {
                self.registry.remove(id);
            }
            Event::ConfigChanged(config) => {
                self.sampler.set_refresh_interval(config.refresh_interval);
                let config = Arc::new(config);
                self.shared_config.store(Arc::clone(&config));
                self.config = config;
                debug!("configuration snapshot replaced");
                let rates = self.sampler.estimate();
                self.publish(rates);
            }
            Event::ConnectivityChanged(available) => {
                if self.connectivity_available != available {
                    info!(available, "connectivity changed");
                }
                self.connectivity_available = available;
                let rates = self.sampler.estimate();
                self.publish(rates);
            }
            Event::ScreenStateChanged { awake } => {
                self.screen_awake = awake;
                if awake {
                    let rates = self.sampler.estimate();
                    self.publish(rates);
                } else {
                    debug!("screen off, cancelling pending tick");
                    self.cancel_pending_tick();
                }
            }
            Event::Attached => {
                self.attached = true;
                let rates = self.sampler.estimate();
                self.publish(rates);
            }
            Event::Detached => {
                self.attached = false;
                self.cancel_pending_tick();
                let rates = self.sampler.estimate();
                self.publish(rates);
            }
        }
    }

    /// Run the display policy, emit the frame if it changed, and
    /// reschedule the next tick.
    fn publish(&mut self, rates: RateEstimate) {
        let Decision { frame, next_delay } = policy::decide(
            rates,
            &self.config,
            self.connectivity_available,
            self.attached,
        );

        let emitted = self.frame_tx.send_if_modified(|current| {
            if *current == frame {
                false
            } else {
                *current = frame.clone();
                true
            }
        });
        trace!(emitted, visible = frame.visible, "display evaluated");

        // Always cancel before arming: one pending tick at most.
        self.cancel_pending_tick();
        if self.screen_awake {
            if let Some(delay) = next_delay {
                self.schedule_tick(delay);
            }
        }
    }

    fn schedule_tick(&mut self, delay: Duration) {
        let guard = self.cancel.child_token();
        self.pending_tick = Some(guard.clone());
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = guard.cancelled() => {}
                () = tokio::time::sleep(delay) => {
                    let _ = event_tx.send(Event::Tick).await;
                }
            }
        });
    }

    fn cancel_pending_tick(&mut self) {
        if let Some(guard) = self.pending_tick.take() {
            guard.cancel();
        }
    }
}
