//! Main application state management

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::{
    sync::{oneshot, watch},
    time::Instant,
};
use tracing::{debug, info, warn};

use super::{ClockFace, Phase, PhaseEndPolicy, TickerHandle, TimerSettings, TimerState, Weight};
use crate::{
    alarm::Alarm,
    tasks::{ticker_task, LiveTicker},
};

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Still counting down
    Continue,
    /// Deadline reached, phase flipped; this loop is done
    PhaseEnded,
    /// The loop was cancelled or replaced; nothing was touched
    Stale,
}

/// Read-only view of the timer for status reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub phase: Phase,
    pub running: bool,
    pub policy: PhaseEndPolicy,
    pub work_interval_secs: u64,
    pub rest_interval_secs: u64,
    pub remaining_secs: Option<u64>,
    pub clock: ClockFace,
}

/// Main application state: the countdown, its display channel and the alarm
#[derive(Debug)]
pub struct AppState {
    /// Countdown state; every read or write of the timer goes through this lock
    pub timer_state: Mutex<TimerState>,
    pub policy: PhaseEndPolicy,
    alarm: Arc<dyn Alarm>,
    /// Channel the display surfaces watch
    pub face_tx: watch::Sender<ClockFace>,
    /// Keep the receiver alive to prevent channel closure
    pub _face_rx: watch::Receiver<ClockFace>,
    live_tickers: Arc<AtomicUsize>,
    /// Server metadata
    pub start_time: std::time::Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Mutex<Option<String>>,
    pub last_action_time: Mutex<Option<DateTime<Utc>>>,
}

impl AppState {
    /// Create the startup state: idle, work phase selected, nothing ticking
    pub fn new(settings: TimerSettings, alarm: Arc<dyn Alarm>, port: u16, host: String) -> Self {
        let timer_state = TimerState::new(&settings);
        let (face_tx, face_rx) = watch::channel(timer_state.face.clone());

        Self {
            timer_state: Mutex::new(timer_state),
            policy: settings.policy,
            alarm,
            face_tx,
            _face_rx: face_rx,
            live_tickers: Arc::new(AtomicUsize::new(0)),
            start_time: std::time::Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
        }
    }

    /// Subscribe to clock face updates
    pub fn subscribe(&self) -> watch::Receiver<ClockFace> {
        self.face_tx.subscribe()
    }

    /// What the display currently shows
    pub fn clock_face(&self) -> ClockFace {
        self.lock_timer().face.clone()
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        let timer = self.lock_timer();
        TimerSnapshot {
            phase: timer.phase,
            running: timer.is_running(),
            policy: self.policy,
            work_interval_secs: timer.work_interval.as_secs(),
            rest_interval_secs: timer.rest_interval.as_secs(),
            remaining_secs: timer.remaining(Instant::now()).map(|left| left.as_secs()),
            clock: timer.face.clone(),
        }
    }

    /// Number of tick loops that have not exited yet
    pub fn live_tickers(&self) -> usize {
        self.live_tickers.load(Ordering::SeqCst)
    }

    /// Set the interval of the current phase; a running countdown picks it up immediately
    pub fn select_interval(&self, interval: Duration) {
        let mut timer = self.lock_timer();
        timer.set_current_interval(interval);
        timer.deadline = Instant::now() + interval;
        timer.face.set_time_left(interval);
        let phase = timer.phase;
        self.publish(&timer);
        drop(timer);

        info!("{:?} interval set to {} minutes", phase, interval.as_secs() / 60);
        self.record_action("interval");
    }

    /// Show an arbitrary remaining time without moving the deadline
    pub fn set_time_left(&self, time_left: Duration) {
        let mut timer = self.lock_timer();
        timer.face.set_time_left(time_left);
        self.publish(&timer);
    }

    /// Start counting down `phase`, replacing any running countdown
    pub fn start(self: &Arc<Self>, phase: Phase) {
        let mut timer = self.lock_timer();
        if timer.cancel_ticker() {
            debug!("Cancelled previous tick loop");
        }
        timer.enter_phase(phase, Instant::now());
        self.arm_ticker(&mut timer);
        let interval = timer.interval(phase);
        self.publish(&timer);
        drop(timer);

        info!("Started {:?} phase for {} minutes", phase, interval.as_secs() / 60);
        self.record_action(match phase {
            Phase::Work => "start-work",
            Phase::Rest => "start-rest",
        });
    }

    /// Stop counting down; configured intervals are kept
    pub fn stop(&self) {
        let mut timer = self.lock_timer();
        let was_running = timer.cancel_ticker();
        timer.face.label.clear();
        timer.face.delimiter = Weight::Bright;
        self.publish(&timer);
        drop(timer);

        if was_running {
            info!("Timer stopped");
        } else {
            debug!("Stop requested while idle");
        }
        self.record_action("stop");
    }

    /// End the current phase now, as if its deadline had passed
    pub fn skip(self: &Arc<Self>) {
        let mut timer = self.lock_timer();
        self.end_phase(&mut timer, Instant::now());
        drop(timer);
        self.record_action("skip");
    }

    /// One evaluation of the countdown for the loop identified by `generation`
    pub fn tick(self: &Arc<Self>, generation: u64) -> TickOutcome {
        let mut timer = self.lock_timer();
        if !timer.is_current(generation) {
            return TickOutcome::Stale;
        }

        timer.face.delimiter = timer.face.delimiter.flip();

        let now = Instant::now();
        if timer.deadline <= now {
            self.end_phase(&mut timer, now);
            return TickOutcome::PhaseEnded;
        }

        let time_left = timer.deadline - now;
        timer.face.set_time_left(time_left);
        self.publish(&timer);
        TickOutcome::Continue
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self
            .last_action
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let last_action_time = *self
            .last_action_time
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        (last_action, last_action_time)
    }

    fn lock_timer(&self) -> MutexGuard<'_, TimerState> {
        self.timer_state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Push the current face to every display; called with the lock held so
    /// updates reach the channel in the order they were made.
    fn publish(&self, timer: &TimerState) {
        if let Err(e) = self.face_tx.send(timer.face.clone()) {
            warn!("Failed to send clock face update: {}", e);
        }
    }

    fn arm_ticker(self: &Arc<Self>, timer: &mut TimerState) {
        let generation = timer.next_generation();
        let (cancel_tx, cancel_rx) = oneshot::channel();
        timer.ticker = Some(TickerHandle::new(generation, cancel_tx));

        let live = LiveTicker::new(Arc::clone(&self.live_tickers));
        tokio::spawn(ticker_task(Arc::clone(self), generation, cancel_rx, live));
        debug!("Armed tick loop generation {}", generation);
    }

    fn end_phase(self: &Arc<Self>, timer: &mut TimerState, now: Instant) {
        let was_running = timer.cancel_ticker();
        self.alarm.ring();

        let next = timer.phase.opposite();
        timer.enter_phase(next, now);
        if was_running && self.policy == PhaseEndPolicy::AutoCycle {
            self.arm_ticker(timer);
        }
        self.publish(timer);

        info!(
            "Phase ended, {:?} is next ({} minutes)",
            next,
            timer.interval(next).as_secs() / 60
        );
    }

    fn record_action(&self, action: &str) {
        *self.last_action.lock().unwrap_or_else(PoisonError::into_inner) = Some(action.to_string());
        *self
            .last_action_time
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    const MINUTE: Duration = Duration::from_secs(60);

    #[derive(Debug, Default)]
    struct RecordingAlarm {
        rings: AtomicUsize,
    }

    impl Alarm for RecordingAlarm {
        fn ring(&self) {
            self.rings.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl RecordingAlarm {
        fn rings(&self) -> usize {
            self.rings.load(Ordering::SeqCst)
        }
    }

    fn app(settings: TimerSettings) -> (Arc<AppState>, Arc<RecordingAlarm>) {
        let alarm = Arc::new(RecordingAlarm::default());
        let state = AppState::new(settings, alarm.clone(), 0, "127.0.0.1".to_string());
        (Arc::new(state), alarm)
    }

    fn short_settings(policy: PhaseEndPolicy) -> TimerSettings {
        TimerSettings {
            work: 5 * MINUTE,
            rest: 5 * MINUTE,
            policy,
        }
    }

    #[test]
    fn select_interval_only_touches_current_phase() {
        let (state, _) = app(TimerSettings::default());
        state.select_interval(30 * MINUTE);
        {
            let timer = state.timer_state.lock().unwrap();
            assert_eq!(timer.work_interval, 30 * MINUTE);
            assert_eq!(timer.rest_interval, 15 * MINUTE);
        }
        assert_eq!(state.clock_face().minutes, "30");

        state.timer_state.lock().unwrap().phase = Phase::Rest;
        state.select_interval(45 * MINUTE);
        let timer = state.timer_state.lock().unwrap();
        assert_eq!(timer.work_interval, 30 * MINUTE);
        assert_eq!(timer.rest_interval, 45 * MINUTE);
    }

    #[test]
    fn startup_shows_sixty_minutes_idle() {
        let (state, _) = app(TimerSettings::default());
        let snapshot = state.snapshot();
        assert_eq!(snapshot.phase, Phase::Work);
        assert!(!snapshot.running);
        assert_eq!(snapshot.rest_interval_secs, 15 * 60);
        assert_eq!(snapshot.remaining_secs, None);
        assert_eq!(snapshot.clock.label, "");
        assert_eq!(snapshot.clock.minutes, "60");
        assert_eq!(snapshot.clock.seconds, "00");
        assert_eq!(snapshot.clock.delimiter, Weight::Bright);
    }

    #[tokio::test(start_paused = true)]
    async fn start_rest_from_startup() {
        let (state, _) = app(TimerSettings::default());
        state.start(Phase::Rest);

        let snapshot = state.snapshot();
        assert_eq!(snapshot.clock.label, "REST");
        assert_eq!(snapshot.clock.minutes, "15");
        assert_eq!(snapshot.clock.seconds, "00");
        assert!(snapshot.running);
        assert_eq!(state.live_tickers(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_shows_full_work_interval() {
        let (state, _) = app(TimerSettings::default());
        state.start(Phase::Work);
        sleep(Duration::from_millis(1)).await;

        let face = state.clock_face();
        assert_eq!(face.label, "FOCUS");
        assert_eq!(face.minutes, "60");
        assert_eq!(face.seconds, "00");
        assert_eq!(face.delimiter, Weight::Dim);
    }

    #[tokio::test(start_paused = true)]
    async fn delimiter_blinks_every_tick() {
        let (state, _) = app(TimerSettings::default());
        state.start(Phase::Work);
        sleep(Duration::from_millis(1)).await;
        assert_eq!(state.clock_face().delimiter, Weight::Dim);

        sleep(Duration::from_secs(1)).await;
        let face = state.clock_face();
        assert_eq!(face.delimiter, Weight::Bright);
        assert_eq!((face.minutes.as_str(), face.seconds.as_str()), ("59", "59"));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_clock_ticks_once_instead_of_bursting() {
        let (state, _) = app(TimerSettings::default());
        state.start(Phase::Work);
        sleep(Duration::from_millis(1)).await;
        assert_eq!(state.clock_face().delimiter, Weight::Dim);

        tokio::time::advance(Duration::from_millis(4_100)).await;
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }

        let face = state.clock_face();
        assert_eq!(face.delimiter, Weight::Bright);
        assert_eq!((face.minutes.as_str(), face.seconds.as_str()), ("59", "56"));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_flips_phase_and_waits_for_start() {
        let (state, alarm) = app(TimerSettings {
            work: 5 * MINUTE,
            rest: 15 * MINUTE,
            policy: PhaseEndPolicy::AwaitStart,
        });
        state.start(Phase::Work);
        sleep(5 * MINUTE + Duration::from_millis(1)).await;

        let snapshot = state.snapshot();
        assert_eq!(snapshot.phase, Phase::Rest);
        assert_eq!(snapshot.clock.label, "REST");
        assert_eq!(snapshot.clock.minutes, "15");
        assert_eq!(snapshot.clock.seconds, "00");
        assert!(!snapshot.running);
        assert_eq!(state.live_tickers(), 0);
        assert_eq!(alarm.rings(), 1);

        let deadline = state.timer_state.lock().unwrap().deadline;
        let left = deadline - Instant::now();
        assert!(left > 15 * MINUTE - Duration::from_secs(1) && left <= 15 * MINUTE);

        // Nothing fires again without a new start.
        sleep(20 * MINUTE).await;
        assert_eq!(alarm.rings(), 1);
        assert_eq!(state.snapshot().phase, Phase::Rest);
    }

    #[tokio::test(start_paused = true)]
    async fn auto_cycle_keeps_counting_through_phases() {
        let (state, alarm) = app(short_settings(PhaseEndPolicy::AutoCycle));
        state.start(Phase::Work);

        sleep(5 * MINUTE + Duration::from_millis(1)).await;
        let snapshot = state.snapshot();
        assert_eq!(snapshot.phase, Phase::Rest);
        assert!(snapshot.running);
        assert_eq!(state.live_tickers(), 1);
        assert_eq!(alarm.rings(), 1);

        sleep(MINUTE).await;
        assert_eq!(state.clock_face().minutes, " 4");

        sleep(4 * MINUTE).await;
        let snapshot = state.snapshot();
        assert_eq!(snapshot.phase, Phase::Work);
        assert_eq!(snapshot.clock.label, "FOCUS");
        assert!(snapshot.running);
        assert_eq!(state.live_tickers(), 1);
        assert_eq!(alarm.rings(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_clears_label_and_silences_updates() {
        let (state, _) = app(TimerSettings::default());
        state.start(Phase::Work);
        sleep(Duration::from_millis(2_500)).await;

        state.stop();
        let face = state.clock_face();
        assert_eq!(face.label, "");
        assert_eq!(face.delimiter, Weight::Bright);
        assert!(!state.snapshot().running);

        let mut rx = state.subscribe();
        let _ = rx.borrow_and_update();
        sleep(Duration::from_secs(5)).await;
        assert!(!rx.has_changed().unwrap());
        assert_eq!(state.live_tickers(), 0);
        assert_eq!(state.timer_state.lock().unwrap().work_interval, 60 * MINUTE);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_while_idle_is_harmless() {
        let (state, _) = app(TimerSettings::default());
        state.stop();
        let face = state.clock_face();
        assert_eq!(face.label, "");
        assert_eq!(face.delimiter, Weight::Bright);
        assert_eq!(face.minutes, "60");
    }

    #[tokio::test(start_paused = true)]
    async fn restarting_leaves_a_single_tick_loop() {
        let (state, _) = app(TimerSettings::default());
        state.start(Phase::Work);
        state.start(Phase::Work);
        sleep(Duration::from_millis(10)).await;
        assert_eq!(state.live_tickers(), 1);

        // One loop means one flip per second.
        let before = state.clock_face().delimiter;
        sleep(Duration::from_secs(1)).await;
        assert_eq!(state.clock_face().delimiter, before.flip());
        assert_eq!(state.live_tickers(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_change_applies_to_running_countdown() {
        let (state, _) = app(TimerSettings::default());
        state.start(Phase::Work);
        sleep(Duration::from_millis(10_500)).await;

        state.select_interval(5 * MINUTE);
        assert_eq!(state.clock_face().minutes, " 5");
        assert!(state.snapshot().running);

        sleep(Duration::from_secs(1)).await;
        let face = state.clock_face();
        assert_eq!((face.minutes.as_str(), face.seconds.as_str()), (" 4", "59"));
        assert_eq!(face.label, "FOCUS");
    }

    #[tokio::test(start_paused = true)]
    async fn skip_while_idle_flips_without_running() {
        let (state, alarm) = app(short_settings(PhaseEndPolicy::AutoCycle));
        state.skip();

        let snapshot = state.snapshot();
        assert_eq!(snapshot.phase, Phase::Rest);
        assert_eq!(snapshot.clock.label, "REST");
        assert!(!snapshot.running);
        assert_eq!(alarm.rings(), 1);
        assert_eq!(state.get_last_action().0.as_deref(), Some("skip"));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_generation_is_ignored() {
        let (state, _) = app(TimerSettings::default());
        state.start(Phase::Work);
        let generation = state.timer_state.lock().unwrap().generation;
        state.start(Phase::Rest);

        assert_eq!(state.tick(generation), TickOutcome::Stale);
        assert_eq!(state.clock_face().label, "REST");
    }

    #[test]
    fn set_time_left_only_changes_the_display() {
        let (state, _) = app(TimerSettings::default());
        let deadline = state.timer_state.lock().unwrap().deadline;
        state.set_time_left(Duration::from_secs(90));

        let face = state.clock_face();
        assert_eq!((face.minutes.as_str(), face.seconds.as_str()), (" 1", "30"));
        assert_eq!(state.timer_state.lock().unwrap().deadline, deadline);
    }
}
