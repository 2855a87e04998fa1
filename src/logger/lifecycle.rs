use crate::buffer::{BulkBuffer, FlushOutcome};
use crate::domain::LogError;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::task::TaskTracker;
use tokio_util::task::task_tracker::TaskTrackerToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Accepting messages.
    Active,
    /// Refusing messages, finishing buffered or queued work.
    Draining,
    /// Terminal.
    Stopped,
}

impl LifecycleState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => LifecycleState::Active,
            1 => LifecycleState::Draining,
            _ => LifecycleState::Stopped,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            LifecycleState::Active => 0,
            LifecycleState::Draining => 1,
            LifecycleState::Stopped => 2,
        }
    }
}

/// Shared shutdown bookkeeping of a logger.
///
/// Admission and shutdown are linearized through the `active` lock: a call
/// admitted before [`begin_shutdown`](Self::begin_shutdown) holds an
/// in-flight token, and [`drain`](Self::drain) waits for every such token
/// before the final flush. Admitted calls therefore complete normally and
/// land in a batch that is actually sent.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    active: RwLock<bool>,
    state: AtomicU8,
    ticker: Mutex<Option<FlushTicker>>,
    in_flight: TaskTracker,
}

impl Lifecycle {
    pub(crate) fn new(ticker: Option<FlushTicker>) -> Self {
        Self {
            active: RwLock::new(true),
            state: AtomicU8::new(LifecycleState::Active.as_u8()),
            ticker: Mutex::new(ticker),
            in_flight: TaskTracker::new(),
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        *self.active.read()
    }

    pub(crate) fn ensure_active(&self) -> Result<(), LogError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(LogError::ShuttingDown)
        }
    }

    /// Admits one call. The token must live until the call's line is in the
    /// buffer.
    pub(crate) fn admit(&self) -> Result<TaskTrackerToken, LogError> {
        let active = self.active.read();
        if !*active {
            return Err(LogError::ShuttingDown);
        }
        Ok(self.in_flight.token())
    }

    pub(crate) fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Refuses new work from now on and hands out the ticker, if still running.
    pub(crate) fn begin_shutdown(&self) -> Option<FlushTicker> {
        {
            let mut active = self.active.write();
            *active = false;
            self.in_flight.close();
        }
        let _ = self.state.compare_exchange(
            LifecycleState::Active.as_u8(),
            LifecycleState::Draining.as_u8(),
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        info!("shutdown requested, refusing new messages");
        self.ticker.lock().take()
    }

    pub(crate) fn finish_shutdown(&self) {
        self.state
            .store(LifecycleState::Stopped.as_u8(), Ordering::Release);
        info!("logger stopped");
    }

    /// Bulk shutdown, after [`begin_shutdown`](Self::begin_shutdown): stop
    /// the ticker and wait for its acknowledgement, wait for admitted appends,
    /// then flush whatever is still buffered.
    pub(crate) async fn drain(
        &self,
        ticker: Option<FlushTicker>,
        buffer: &BulkBuffer,
    ) -> FlushOutcome {
        if let Some(ticker) = ticker {
            ticker.stop().await;
        }
        self.in_flight.wait().await;
        debug!("admitted appends settled, final flush");

        let outcome = buffer.flush().await;
        self.finish_shutdown();
        outcome
    }
}

/// Background task flushing a bulk buffer on a fixed interval.
///
/// Failures of these flushes have no caller to report to: the affected
/// messages are logged as dropped and are lost.
#[derive(Debug)]
pub(crate) struct FlushTicker {
    stop: oneshot::Sender<()>,
    stopped: oneshot::Receiver<()>,
}

impl FlushTicker {
    /// Starts flushing every `interval_ms` milliseconds. A non-positive
    /// interval disables periodic flushing.
    pub(crate) fn start(buffer: Arc<BulkBuffer>, interval_ms: i64) -> Option<Self> {
        if interval_ms <= 0 {
            debug!("periodic flushing disabled");
            return None;
        }

        let period = Duration::from_millis(interval_ms as u64);
        let (stop, mut stop_rx) = oneshot::channel::<()>();
        let (stopped_tx, stopped) = oneshot::channel();

        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            debug!(interval_ms, "periodic flushing started");

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        if let Err(e) = buffer.flush().await {
                            warn!(
                                dropped = e.failed_messages.len(),
                                error = %e.error,
                                "periodic flush failed, messages dropped"
                            );
                        }
                    }
                }
            }

            debug!("periodic flushing stopped");
            let _ = stopped_tx.send(());
        });

        Some(Self { stop, stopped })
    }

    /// Signals the task and waits for its acknowledgement.
    pub(crate) async fn stop(self) {
        let _ = self.stop.send(());
        let _ = self.stopped.await;
    }
}
