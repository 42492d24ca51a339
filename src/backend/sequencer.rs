//! Countdown-driven capture of a fixed number of stills.
//!
//! The sequencer never reads a clock itself; callers pass `now` in, which
//! keeps every transition reproducible.

use std::time::{Duration, Instant};

#[cfg(feature = "fast_animations")]
const TIMING_DIVISOR: u32 = 10;
#[cfg(not(feature = "fast_animations"))]
const TIMING_DIVISOR: u32 = 1;

pub const COUNTDOWN_FROM: u32 = 3;
pub const COUNTDOWN_TICK: Duration = Duration::from_millis(1000 / TIMING_DIVISOR as u64);
pub const NEXT_PHOTO_DELAY: Duration = Duration::from_millis(1500 / TIMING_DIVISOR as u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    Idle,
    Countdown { remaining: u32, next_tick: Instant },
    /// Waiting for the caller to grab a still.
    Capturing,
    /// Pause between two photos.
    Waiting { until: Instant },
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerAction {
    Capture,
}

#[derive(Debug, Clone)]
pub struct CaptureSequencer {
    slot_count: usize,
    photos: Vec<Vec<u8>>,
    state: SequencerState,
}

impl CaptureSequencer {
    pub fn new(slot_count: usize) -> Self {
        CaptureSequencer {
            slot_count,
            photos: Vec::with_capacity(slot_count),
            state: SequencerState::Idle,
        }
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    pub fn photos(&self) -> &[Vec<u8>] {
        &self.photos
    }

    pub fn is_done(&self) -> bool {
        self.state == SequencerState::Done
    }

    /// The number to show on screen while counting down.
    pub fn countdown(&self) -> Option<u32> {
        match self.state {
            SequencerState::Countdown { remaining, .. } => Some(remaining),
            _ => None,
        }
    }

    /// Starts the countdown for the next photo. Returns `false` and does
    /// nothing unless the sequencer is idle.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.state != SequencerState::Idle || self.photos.len() >= self.slot_count {
            return false;
        }
        self.begin_countdown(now);
        true
    }

    fn begin_countdown(&mut self, now: Instant) {
        log::debug!(
            "Counting down for photo {}/{}",
            self.photos.len() + 1,
            self.slot_count
        );
        self.state = SequencerState::Countdown {
            remaining: COUNTDOWN_FROM,
            next_tick: now + COUNTDOWN_TICK,
        };
    }

    /// Advances timers. Returns [`SequencerAction::Capture`] exactly once per
    /// photo, on the final countdown tick.
    pub fn poll(&mut self, now: Instant) -> Option<SequencerAction> {
        match self.state {
            SequencerState::Countdown {
                remaining,
                next_tick,
            } if now >= next_tick => {
                if remaining <= 1 {
                    self.state = SequencerState::Capturing;
                    Some(SequencerAction::Capture)
                } else {
                    self.state = SequencerState::Countdown {
                        remaining: remaining - 1,
                        next_tick: next_tick + COUNTDOWN_TICK,
                    };
                    None
                }
            }
            SequencerState::Waiting { until } if now >= until => {
                self.begin_countdown(now);
                None
            }
            _ => None,
        }
    }

    /// Appends a captured photo and schedules the next one, if any.
    pub fn photo_captured(&mut self, photo: Vec<u8>, now: Instant) {
        if self.state != SequencerState::Capturing {
            log::warn!("Dropping a photo delivered outside of a capture ({:?})", self.state);
            return;
        }
        self.photos.push(photo);
        log::info!("Captured photo {}/{}", self.photos.len(), self.slot_count);
        self.state = if self.photos.len() >= self.slot_count {
            SequencerState::Done
        } else {
            SequencerState::Waiting {
                until: now + NEXT_PHOTO_DELAY,
            }
        };
    }

    /// Abandons the in-flight capture. Photos taken so far are kept and
    /// [`start`](Self::start) may be called again.
    pub fn capture_failed(&mut self) {
        if self.state == SequencerState::Capturing {
            self.state = SequencerState::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_countdown(sequencer: &mut CaptureSequencer, start: Instant) -> Instant {
        let mut now = start;
        for expected in (2..=COUNTDOWN_FROM).rev() {
            now += COUNTDOWN_TICK;
            assert_eq!(sequencer.poll(now), None);
            assert_eq!(sequencer.countdown(), Some(expected - 1));
        }
        now += COUNTDOWN_TICK;
        assert_eq!(sequencer.poll(now), Some(SequencerAction::Capture));
        assert_eq!(sequencer.state(), SequencerState::Capturing);
        now
    }

    #[test]
    fn counts_down_then_captures() {
        let start = Instant::now();
        let mut sequencer = CaptureSequencer::new(4);
        assert!(sequencer.start(start));
        assert_eq!(sequencer.countdown(), Some(3));

        // nothing happens before a full tick has passed
        assert_eq!(sequencer.poll(start + COUNTDOWN_TICK / 2), None);
        assert_eq!(sequencer.countdown(), Some(3));

        run_countdown(&mut sequencer, start);
    }

    #[test]
    fn start_is_ignored_while_busy() {
        let start = Instant::now();
        let mut sequencer = CaptureSequencer::new(2);
        assert!(sequencer.start(start));
        assert!(!sequencer.start(start + COUNTDOWN_TICK));
        assert_eq!(sequencer.countdown(), Some(3));

        let now = run_countdown(&mut sequencer, start);
        assert!(!sequencer.start(now));
    }

    #[test]
    fn takes_exactly_slot_count_photos_in_order() {
        let mut now = Instant::now();
        let mut sequencer = CaptureSequencer::new(3);
        sequencer.start(now);

        for i in 0..3u8 {
            now = run_countdown(&mut sequencer, now);
            sequencer.photo_captured(vec![i], now);
            if i < 2 {
                assert!(matches!(sequencer.state(), SequencerState::Waiting { .. }));
                // the pause must elapse before the next countdown
                assert_eq!(sequencer.poll(now + NEXT_PHOTO_DELAY / 2), None);
                assert!(matches!(sequencer.state(), SequencerState::Waiting { .. }));
                now += NEXT_PHOTO_DELAY;
                assert_eq!(sequencer.poll(now), None);
                assert_eq!(sequencer.countdown(), Some(COUNTDOWN_FROM));
            }
        }

        assert!(sequencer.is_done());
        assert!(!sequencer.start(now));
        assert_eq!(sequencer.poll(now + NEXT_PHOTO_DELAY * 10), None);
        assert_eq!(sequencer.photos(), &[vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn photos_outside_a_capture_are_dropped() {
        let now = Instant::now();
        let mut sequencer = CaptureSequencer::new(1);
        sequencer.photo_captured(vec![1], now);
        assert!(sequencer.photos().is_empty());
        assert_eq!(sequencer.state(), SequencerState::Idle);
    }

    #[test]
    fn failed_capture_returns_to_idle_and_can_resume() {
        let start = Instant::now();
        let mut sequencer = CaptureSequencer::new(2);
        sequencer.start(start);
        let now = run_countdown(&mut sequencer, start);
        sequencer.capture_failed();
        assert_eq!(sequencer.state(), SequencerState::Idle);

        assert!(sequencer.start(now));
        let now = run_countdown(&mut sequencer, now);
        sequencer.photo_captured(vec![7], now);
        assert_eq!(sequencer.photos(), &[vec![7]]);
    }
}
