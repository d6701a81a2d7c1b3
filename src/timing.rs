use std::time::{Duration, Instant};

/// How often live WPM/accuracy are rederived while the timer runs.
pub const RECOMPUTE_INTERVAL: Duration = Duration::from_secs(1);

/// Wall-clock state of a session timer.
///
/// `Running` carries the anchor instant from which elapsed time is measured;
/// resuming re-anchors it so time accumulated before a pause is preserved
/// exactly. `Paused` carries that accumulated time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Stopped,
    Running { anchor: Instant },
    Paused { accumulated: Duration },
}

/// Accumulates per-word character counts and derives live metrics on a fixed
/// cadence.
///
/// All methods take `now` explicitly; nothing here reads the clock, which
/// keeps pause/resume arithmetic testable without sleeping. The recompute
/// cadence anchor is held only while Running and released on every transition
/// out of Running, so no recompute can fire against a paused or finished
/// session.
#[derive(Debug, Clone)]
pub struct MetricsTracker {
    timer: TimerState,
    ever_started: bool,
    correct_chars: usize,
    total_chars: usize,
    wpm: u32,
    accuracy: u32,
    last_recompute: Option<Instant>,
}

impl Default for MetricsTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self {
            timer: TimerState::Stopped,
            ever_started: false,
            correct_chars: 0,
            total_chars: 0,
            wpm: 0,
            accuracy: 0,
            last_recompute: None,
        }
    }

    /// Starts the timer on the first keystroke of the session. Later calls
    /// are no-ops: metrics count from first input, not per word and not from
    /// content load.
    pub fn start(&mut self, now: Instant) {
        if self.ever_started {
            return;
        }
        self.ever_started = true;
        self.timer = TimerState::Running { anchor: now };
        self.last_recompute = Some(now);
    }

    /// Snapshots elapsed time and releases the recompute cadence.
    pub fn pause(&mut self, now: Instant) {
        if let TimerState::Running { anchor } = self.timer {
            self.recompute(now);
            self.timer = TimerState::Paused {
                accumulated: now.duration_since(anchor),
            };
            self.last_recompute = None;
        }
    }

    /// Re-anchors the timer so pre-pause elapsed time carries over exactly.
    pub fn resume(&mut self, now: Instant) {
        if let TimerState::Paused { accumulated } = self.timer {
            self.timer = TimerState::Running {
                anchor: now - accumulated,
            };
            self.last_recompute = Some(now);
        }
    }

    /// Ends the session: derives final metrics and stops the timer.
    pub fn finish(&mut self, now: Instant) {
        self.recompute(now);
        self.timer = TimerState::Stopped;
        self.last_recompute = None;
    }

    /// Active (unpaused) time since the first keystroke.
    pub fn elapsed(&self, now: Instant) -> Duration {
        match self.timer {
            TimerState::Stopped => Duration::ZERO,
            TimerState::Running { anchor } => now.duration_since(anchor),
            TimerState::Paused { accumulated } => accumulated,
        }
    }

    /// Credits one submitted word to the session counters. Counters only grow;
    /// they reset at session start, never at chunk boundaries.
    pub fn record_word(&mut self, score: crate::matcher::WordScore) {
        self.correct_chars += score.correct_chars;
        self.total_chars += score.expected_len;
    }

    /// Rederives metrics if the cadence interval has passed. Ticks arriving
    /// while not Running are ignored.
    pub fn on_tick(&mut self, now: Instant) {
        if !matches!(self.timer, TimerState::Running { .. }) {
            return;
        }
        match self.last_recompute {
            Some(last) if now.duration_since(last) < RECOMPUTE_INTERVAL => {}
            _ => {
                self.recompute(now);
                self.last_recompute = Some(now);
            }
        }
    }

    fn recompute(&mut self, now: Instant) {
        let minutes = self.elapsed(now).as_secs_f64() / 60.0;
        let raw_wpm = if minutes > 0.0 {
            (self.correct_chars as f64 / 5.0) / minutes
        } else {
            0.0
        };
        self.wpm = if raw_wpm.is_finite() {
            raw_wpm.round().max(0.0) as u32
        } else {
            0
        };

        self.accuracy = if self.total_chars > 0 {
            let pct = (self.correct_chars as f64 / self.total_chars as f64) * 100.0;
            pct.round().max(0.0) as u32
        } else {
            0
        };
    }

    pub fn wpm(&self) -> u32 {
        self.wpm
    }

    pub fn accuracy(&self) -> u32 {
        self.accuracy
    }

    pub fn correct_chars(&self) -> usize {
        self.correct_chars
    }

    pub fn total_chars(&self) -> usize {
        self.total_chars
    }

    pub fn has_started(&self) -> bool {
        self.ever_started
    }

    pub fn is_running(&self) -> bool {
        matches!(self.timer, TimerState::Running { .. })
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.timer, TimerState::Paused { .. })
    }

    pub fn timer_state(&self) -> TimerState {
        self.timer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::WordScore;
    use assert_matches::assert_matches;

    fn at(base: Instant, ms: u64) -> Instant {
        base + Duration::from_millis(ms)
    }

    #[test]
    fn starts_only_once() {
        let base = Instant::now();
        let mut tracker = MetricsTracker::new();
        assert!(!tracker.has_started());

        tracker.start(at(base, 0));
        assert!(tracker.is_running());

        // A later start() must not re-anchor the timer
        tracker.start(at(base, 5_000));
        assert_eq!(tracker.elapsed(at(base, 6_000)), Duration::from_secs(6));
    }

    #[test]
    fn pause_snapshots_elapsed_exactly_once() {
        let base = Instant::now();
        let mut tracker = MetricsTracker::new();
        tracker.start(at(base, 0));
        tracker.pause(at(base, 10_000));

        assert_matches!(
            tracker.timer_state(),
            TimerState::Paused { accumulated } if accumulated == Duration::from_secs(10)
        );
        // Elapsed is frozen while paused
        assert_eq!(tracker.elapsed(at(base, 60_000)), Duration::from_secs(10));
    }

    #[test]
    fn resume_preserves_elapsed_across_pause() {
        let base = Instant::now();
        let mut tracker = MetricsTracker::new();
        tracker.start(at(base, 0));
        tracker.pause(at(base, 10_000));
        // A long idle gap while paused must not count
        tracker.resume(at(base, 300_000));

        let elapsed = tracker.elapsed(at(base, 305_000));
        assert!(elapsed >= Duration::from_millis(15_000));
        assert!(elapsed < Duration::from_millis(15_100));
    }

    #[test]
    fn pause_when_not_running_is_a_no_op() {
        let base = Instant::now();
        let mut tracker = MetricsTracker::new();
        tracker.pause(at(base, 1_000));
        assert_matches!(tracker.timer_state(), TimerState::Stopped);

        tracker.start(at(base, 2_000));
        tracker.pause(at(base, 3_000));
        tracker.pause(at(base, 9_000));
        assert_eq!(tracker.elapsed(at(base, 9_000)), Duration::from_secs(1));
    }

    #[test]
    fn resume_when_not_paused_is_a_no_op() {
        let base = Instant::now();
        let mut tracker = MetricsTracker::new();
        tracker.resume(at(base, 1_000));
        assert_matches!(tracker.timer_state(), TimerState::Stopped);
    }

    #[test]
    fn cadence_held_only_while_running() {
        let base = Instant::now();
        let mut tracker = MetricsTracker::new();
        tracker.start(at(base, 0));
        tracker.record_word(WordScore {
            correct_chars: 5,
            expected_len: 5,
        });

        tracker.pause(at(base, 2_000));
        let wpm_at_pause = tracker.wpm();

        // Ticks while paused must not recompute
        tracker.record_word(WordScore {
            correct_chars: 50,
            expected_len: 50,
        });
        tracker.on_tick(at(base, 100_000));
        assert_eq!(tracker.wpm(), wpm_at_pause);
    }

    #[test]
    fn tick_recomputes_once_per_interval() {
        let base = Instant::now();
        let mut tracker = MetricsTracker::new();
        tracker.start(at(base, 0));
        tracker.record_word(WordScore {
            correct_chars: 10,
            expected_len: 10,
        });

        // Within the interval: no recompute yet
        tracker.on_tick(at(base, 500));
        assert_eq!(tracker.wpm(), 0);

        // Past the interval: 10 chars in 1s -> 120 wpm
        tracker.on_tick(at(base, 1_000));
        assert_eq!(tracker.wpm(), 120);
    }

    #[test]
    fn wpm_counts_correct_chars_in_five_char_words() {
        let base = Instant::now();
        let mut tracker = MetricsTracker::new();
        tracker.start(at(base, 0));
        // 25 correct chars = 5 conventional words
        tracker.record_word(WordScore {
            correct_chars: 25,
            expected_len: 30,
        });
        tracker.on_tick(at(base, 60_000));
        assert_eq!(tracker.wpm(), 5);
    }

    #[test]
    fn zero_elapsed_yields_zero_wpm() {
        let base = Instant::now();
        let mut tracker = MetricsTracker::new();
        tracker.start(at(base, 0));
        tracker.record_word(WordScore {
            correct_chars: 5,
            expected_len: 5,
        });
        tracker.finish(at(base, 0));
        assert_eq!(tracker.wpm(), 0);
    }

    #[test]
    fn zero_total_chars_yields_zero_accuracy() {
        let base = Instant::now();
        let mut tracker = MetricsTracker::new();
        tracker.start(at(base, 0));
        tracker.finish(at(base, 5_000));
        assert_eq!(tracker.accuracy(), 0);
    }

    #[test]
    fn accuracy_is_cumulative_over_the_session() {
        let base = Instant::now();
        let mut tracker = MetricsTracker::new();
        tracker.start(at(base, 0));
        tracker.record_word(WordScore {
            correct_chars: 0,
            expected_len: 5,
        });
        tracker.record_word(WordScore {
            correct_chars: 5,
            expected_len: 5,
        });
        tracker.finish(at(base, 10_000));
        // Early mistakes keep weighing in: 5/10 = 50%
        assert_eq!(tracker.accuracy(), 50);
    }

    #[test]
    fn finish_stops_the_timer_and_keeps_final_metrics() {
        let base = Instant::now();
        let mut tracker = MetricsTracker::new();
        tracker.start(at(base, 0));
        tracker.record_word(WordScore {
            correct_chars: 5,
            expected_len: 5,
        });
        tracker.finish(at(base, 60_000));

        assert_matches!(tracker.timer_state(), TimerState::Stopped);
        assert_eq!(tracker.wpm(), 1);
        assert_eq!(tracker.accuracy(), 100);

        // Ticks after the session ends change nothing
        tracker.on_tick(at(base, 120_000));
        assert_eq!(tracker.wpm(), 1);
    }
}
