//! Countdown timers derived from server timestamps
//!
//! Two ticker tasks at most: one for the next scheduled check (which also
//! refreshes the "last check" age) and one for the live-mode auto-disable.
//! Restarting a timer aborts the previous task first, and ticks carry a
//! generation so a tick queued by an aborted task is discarded.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const YEAR: u64 = 365 * DAY;

/// Polling interval actually in force.
pub fn effective_interval(check_interval: u64, live_mode: bool, live_mode_interval: u64) -> u64 {
    if live_mode {
        live_mode_interval
    } else {
        check_interval
    }
}

/// Whole seconds from `since` to `now`, clamped at zero.
pub fn elapsed_seconds(since: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    (now - since).num_seconds().max(0) as u64
}

/// Seconds until the next check: `effective − (elapsed mod effective)`.
///
/// Lies in `1..=effective`; a zero interval is treated as one second.
pub fn next_check_remaining(elapsed: u64, effective: u64) -> u64 {
    let effective = effective.max(1);
    effective - (elapsed % effective)
}

/// Seconds left until `end`, clamped at zero.
pub fn seconds_until(end: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    (end - now).num_seconds().max(0) as u64
}

/// `MM:SS`, minutes are not capped.
pub fn format_seconds(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / MINUTE, seconds % MINUTE)
}

/// Relative age using the two largest units, from years down to seconds.
pub fn format_age(seconds: u64) -> String {
    if seconds < MINUTE {
        format!("{}s", seconds)
    } else if seconds < HOUR {
        format!("{}m {}s", seconds / MINUTE, seconds % MINUTE)
    } else if seconds < DAY {
        format!("{}h {}m", seconds / HOUR, (seconds % HOUR) / MINUTE)
    } else if seconds < YEAR {
        format!("{}d {}h", seconds / DAY, (seconds % DAY) / HOUR)
    } else {
        format!("{}y {}d", seconds / YEAR, (seconds % YEAR) / DAY)
    }
}

/// Which ticker produced a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    NextCheck,
    LiveMode,
}

/// One tick from a ticker task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerTick {
    pub kind: TimerKind,
    pub generation: u64,
}

/// Next-check countdown at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextCheckSnapshot {
    pub elapsed: u64,
    pub remaining: u64,
    pub effective: u64,
    /// Set when the countdown wrapped since the previous poll
    pub expired: bool,
}

#[derive(Debug)]
struct NextCheckTimer {
    last_check: DateTime<Utc>,
    effective: u64,
    last_period: Option<u64>,
    generation: u64,
    handle: JoinHandle<()>,
}

impl NextCheckTimer {
    fn snapshot(&self, now: DateTime<Utc>) -> (NextCheckSnapshot, u64) {
        let effective = self.effective.max(1);
        let elapsed = elapsed_seconds(self.last_check, now);
        let period = elapsed / effective;
        let snapshot = NextCheckSnapshot {
            elapsed,
            remaining: next_check_remaining(elapsed, effective),
            effective,
            expired: self.last_period.is_some_and(|last| period > last),
        };
        (snapshot, period)
    }
}

#[derive(Debug)]
struct LiveModeTimer {
    end: DateTime<Utc>,
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

/// Owner of the countdown ticker tasks.
#[derive(Debug)]
pub struct CountdownEngine {
    period: Duration,
    ticks: mpsc::UnboundedSender<TimerTick>,
    generation: u64,
    next_check: Option<NextCheckTimer>,
    live_mode: Option<LiveModeTimer>,
}

impl CountdownEngine {
    pub fn new(period: Duration, ticks: mpsc::UnboundedSender<TimerTick>) -> Self {
        Self {
            period,
            ticks,
            generation: 0,
            next_check: None,
            live_mode: None,
        }
    }

    fn spawn_ticker(&mut self, kind: TimerKind) -> (u64, JoinHandle<()>) {
        self.generation += 1;
        let generation = self.generation;
        let period = self.period;
        let ticks = self.ticks.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                interval.tick().await;
                if ticks.send(TimerTick { kind, generation }).is_err() {
                    break;
                }
            }
        });
        (generation, handle)
    }

    /// Restart the next-check ticker. Without a last check timestamp no
    /// ticker runs.
    pub fn restart_next_check(&mut self, last_check: Option<DateTime<Utc>>, effective: u64) {
        self.stop_next_check();
        let Some(last_check) = last_check else {
            return;
        };

        let (generation, handle) = self.spawn_ticker(TimerKind::NextCheck);
        self.next_check = Some(NextCheckTimer {
            last_check,
            effective,
            last_period: None,
            generation,
            handle,
        });
    }

    /// Restart the live-mode ticker. Returns whether the countdown is visible.
    pub fn restart_live_mode(&mut self, live_mode: bool, end: Option<DateTime<Utc>>) -> bool {
        self.stop_live_mode();
        match (live_mode, end) {
            (true, Some(end)) => {
                let (generation, handle) = self.spawn_ticker(TimerKind::LiveMode);
                self.live_mode = Some(LiveModeTimer {
                    end,
                    generation,
                    handle: Some(handle),
                });
                true
            }
            _ => false,
        }
    }

    pub fn stop_next_check(&mut self) {
        if let Some(timer) = self.next_check.take() {
            timer.handle.abort();
        }
    }

    pub fn stop_live_mode(&mut self) {
        if let Some(timer) = self.live_mode.take() {
            if let Some(handle) = timer.handle {
                handle.abort();
            }
        }
    }

    /// Whether a tick comes from a ticker that is still current.
    pub fn is_current(&self, tick: &TimerTick) -> bool {
        match tick.kind {
            TimerKind::NextCheck => self
                .next_check
                .as_ref()
                .is_some_and(|t| t.generation == tick.generation),
            TimerKind::LiveMode => self
                .live_mode
                .as_ref()
                .is_some_and(|t| t.generation == tick.generation && t.handle.is_some()),
        }
    }

    /// Compute the next-check countdown and note whether it wrapped.
    pub fn poll_next_check(&mut self, now: DateTime<Utc>) -> Option<NextCheckSnapshot> {
        let timer = self.next_check.as_mut()?;
        let (snapshot, period) = timer.snapshot(now);
        timer.last_period = Some(period);
        Some(snapshot)
    }

    /// Like [`poll_next_check`](Self::poll_next_check) but leaves a wrap
    /// pending for the next poll.
    pub fn peek_next_check(&self, now: DateTime<Utc>) -> Option<NextCheckSnapshot> {
        self.next_check.as_ref().map(|timer| timer.snapshot(now).0)
    }

    /// Seconds left in live mode. Reaching zero stops the ticker but keeps
    /// the countdown visible at `00:00`.
    pub fn poll_live_mode(&mut self, now: DateTime<Utc>) -> Option<u64> {
        let timer = self.live_mode.as_mut()?;
        let remaining = seconds_until(timer.end, now);
        if remaining == 0 {
            if let Some(handle) = timer.handle.take() {
                handle.abort();
            }
        }
        Some(remaining)
    }

    /// Number of ticker tasks still running.
    pub fn active_timers(&self) -> usize {
        let next = self
            .next_check
            .as_ref()
            .is_some_and(|t| !t.handle.is_finished());
        let live = self
            .live_mode
            .as_ref()
            .and_then(|t| t.handle.as_ref())
            .is_some_and(|h| !h.is_finished());
        usize::from(next) + usize::from(live)
    }

    pub fn shutdown(&mut self) {
        self.stop_next_check();
        self.stop_live_mode();
    }
}

impl Drop for CountdownEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_effective_interval() {
        assert_eq!(effective_interval(30, false, 60), 30);
        assert_eq!(effective_interval(30, true, 60), 60);
        assert_eq!(effective_interval(900, true, 60), 60);
    }

    #[test]
    fn test_next_check_ninety_five_seconds_ago() {
        let elapsed = elapsed_seconds(at(0), at(95));
        let remaining = next_check_remaining(elapsed, 60);
        assert_eq!(remaining, 25);
        assert_eq!(format_seconds(remaining), "00:25");
    }

    #[test]
    fn test_next_check_zero_interval_does_not_panic() {
        assert_eq!(next_check_remaining(10, 0), 1);
    }

    #[test]
    fn test_elapsed_clamps_future_timestamps() {
        assert_eq!(elapsed_seconds(at(10), at(0)), 0);
        assert_eq!(seconds_until(at(0), at(10)), 0);
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(0), "00:00");
        assert_eq!(format_seconds(61), "01:01");
        assert_eq!(format_seconds(3600), "60:00");
    }

    #[test]
    fn test_format_age_units() {
        assert_eq!(format_age(35), "35s");
        assert_eq!(format_age(95), "1m 35s");
        assert_eq!(format_age(2 * HOUR + 5 * MINUTE + 9), "2h 5m");
        assert_eq!(format_age(3 * DAY + 4 * HOUR), "3d 4h");
        assert_eq!(format_age(YEAR + 12 * DAY), "1y 12d");
    }

    #[tokio::test]
    async fn test_restart_replaces_ticker() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut engine = CountdownEngine::new(Duration::from_secs(1), tx);

        engine.restart_next_check(Some(at(0)), 60);
        let first = TimerTick {
            kind: TimerKind::NextCheck,
            generation: engine.generation,
        };
        engine.restart_next_check(Some(at(5)), 60);
        tokio::task::yield_now().await;

        assert!(!engine.is_current(&first));
        assert_eq!(engine.active_timers(), 1);

        assert!(engine.restart_live_mode(true, Some(at(600))));
        assert_eq!(engine.active_timers(), 2);

        engine.restart_live_mode(true, Some(at(900)));
        assert_eq!(engine.active_timers(), 2);
    }

    #[tokio::test]
    async fn test_no_timestamp_means_no_ticker() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut engine = CountdownEngine::new(Duration::from_secs(1), tx);

        engine.restart_next_check(None, 60);
        assert_eq!(engine.active_timers(), 0);
        assert!(engine.poll_next_check(at(0)).is_none());

        assert!(!engine.restart_live_mode(false, Some(at(60))));
        assert!(!engine.restart_live_mode(true, None));
        assert_eq!(engine.active_timers(), 0);
    }

    #[tokio::test]
    async fn test_poll_detects_wrap() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut engine = CountdownEngine::new(Duration::from_secs(1), tx);
        engine.restart_next_check(Some(at(0)), 60);

        let first = engine.poll_next_check(at(58)).unwrap();
        assert_eq!(first.remaining, 2);
        assert!(!first.expired);

        let second = engine.poll_next_check(at(59)).unwrap();
        assert!(!second.expired);

        let wrapped = engine.poll_next_check(at(60)).unwrap();
        assert_eq!(wrapped.remaining, 60);
        assert!(wrapped.expired);
    }

    #[tokio::test]
    async fn test_peek_leaves_wrap_for_next_poll() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut engine = CountdownEngine::new(Duration::from_secs(1), tx);
        engine.restart_next_check(Some(at(0)), 60);
        engine.poll_next_check(at(59)).unwrap();

        let peeked = engine.peek_next_check(at(60)).unwrap();
        assert!(peeked.expired);
        assert_eq!(peeked.remaining, 60);

        assert!(engine.poll_next_check(at(61)).unwrap().expired);
        assert!(!engine.poll_next_check(at(62)).unwrap().expired);
    }

    #[tokio::test]
    async fn test_live_mode_stops_at_zero() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut engine = CountdownEngine::new(Duration::from_secs(1), tx);
        engine.restart_live_mode(true, Some(at(30)));

        assert_eq!(engine.poll_live_mode(at(0)), Some(30));
        assert_eq!(engine.poll_live_mode(at(45)), Some(0));
        tokio::task::yield_now().await;
        assert_eq!(engine.active_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_emits_current_generation() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut engine = CountdownEngine::new(Duration::from_secs(1), tx);
        engine.restart_next_check(Some(at(0)), 60);

        let tick = rx.recv().await.unwrap();
        assert_eq!(tick.kind, TimerKind::NextCheck);
        assert!(engine.is_current(&tick));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_remaining_within_period(elapsed in 0u64..10_000_000, effective in 1u64..100_000) {
                let remaining = next_check_remaining(elapsed, effective);
                prop_assert!(remaining >= 1 && remaining <= effective);
                prop_assert_eq!((elapsed + remaining) % effective, 0);
            }

            #[test]
            fn prop_format_seconds_roundtrips(secs in 0u64..360_000) {
                let text = format_seconds(secs);
                let (m, s) = text.split_once(':').unwrap();
                prop_assert_eq!(s.len(), 2);
                let total = m.parse::<u64>().unwrap() * 60 + s.parse::<u64>().unwrap();
                prop_assert_eq!(total, secs);
            }
        }
    }
}
