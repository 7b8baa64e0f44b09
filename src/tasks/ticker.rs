//! Per-second countdown task

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{
    sync::oneshot,
    time::{interval, MissedTickBehavior},
};
use tracing::debug;

use crate::state::{AppState, TickOutcome};

/// Time between two ticks of a running countdown
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Counts a tick loop as alive until it is dropped
#[derive(Debug)]
pub struct LiveTicker {
    live: Arc<AtomicUsize>,
}

impl LiveTicker {
    pub fn new(live: Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        Self { live }
    }
}

impl Drop for LiveTicker {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Background task that ticks the countdown once per second until it is
/// cancelled, replaced, or its phase ends.
///
/// The first tick happens immediately. Cancellation is only observed between
/// ticks, never in the middle of one.
pub async fn ticker_task(
    state: Arc<AppState>,
    generation: u64,
    mut cancel_rx: oneshot::Receiver<()>,
    _live: LiveTicker,
) {
    debug!("Tick loop {} running", generation);

    let mut interval = interval(TICK_PERIOD);
    // After a stall, tick once and realign instead of replaying missed ticks
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;

            // Fires on an explicit cancel or when the handle is dropped
            _ = &mut cancel_rx => {
                debug!("Tick loop {} cancelled", generation);
                break;
            }

            _ = interval.tick() => {
                match state.tick(generation) {
                    TickOutcome::Continue => {}
                    TickOutcome::PhaseEnded => {
                        debug!("Tick loop {} finished its phase", generation);
                        break;
                    }
                    TickOutcome::Stale => {
                        debug!("Tick loop {} was replaced", generation);
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_ticker_counts_until_dropped() {
        let live = Arc::new(AtomicUsize::new(0));
        let first = LiveTicker::new(Arc::clone(&live));
        let second = LiveTicker::new(Arc::clone(&live));
        assert_eq!(live.load(Ordering::SeqCst), 2);

        drop(first);
        assert_eq!(live.load(Ordering::SeqCst), 1);
        drop(second);
        assert_eq!(live.load(Ordering::SeqCst), 0);
    }
}
