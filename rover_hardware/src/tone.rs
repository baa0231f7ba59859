//! Tone sequencing for a single buzzer.
//!
//! A buzzer can only sound one frequency at a time, so requests are queued and
//! played back to back. Timing is driven entirely by `service(now_ms)`: a tone
//! starts on the first service after it reaches the head of the queue and runs
//! for its full duration from that instant.

use std::collections::VecDeque;

/// Requests beyond this many waiting tones are dropped.
pub const TONE_QUEUE_CAPACITY: usize = 4;

/// What the buzzer driver has to do after a `service` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuzzerStep {
    Start { frequency_hz: u32 },
    Silence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Playing {
    frequency_hz: u32,
    duration_ms: u32,
    until_ms: u64,
}

#[derive(Debug, Default)]
pub struct ToneQueue {
    pending: VecDeque<(u32, u32)>,
    playing: Option<Playing>,
    silence_requested: bool,
}

impl ToneQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a tone. Frequency 0 cancels everything.
    ///
    /// A request identical to the tone it would follow is dropped, so a tone
    /// re-requested every cycle (a held alarm) repeats instead of piling up.
    pub fn push(&mut self, frequency_hz: u32, duration_ms: u32) {
        if frequency_hz == 0 {
            self.pending.clear();
            self.silence_requested = self.playing.is_some();
            self.playing = None;
            return;
        }
        let tail = self
            .pending
            .back()
            .copied()
            .or_else(|| self.playing.map(|p| (p.frequency_hz, p.duration_ms)));
        if tail == Some((frequency_hz, duration_ms)) {
            return;
        }
        if self.pending.len() >= TONE_QUEUE_CAPACITY {
            tracing::trace!(frequency_hz, duration_ms, "tone queue full; dropped");
            return;
        }
        self.pending.push_back((frequency_hz, duration_ms));
    }

    /// Advance to `now_ms`; returns the buzzer change to apply, if any.
    pub fn service(&mut self, now_ms: u64) -> Option<BuzzerStep> {
        let mut ended = std::mem::take(&mut self.silence_requested);
        if self.playing.is_some_and(|p| now_ms >= p.until_ms) {
            self.playing = None;
            ended = true;
        }
        if self.playing.is_none() {
            if let Some((frequency_hz, duration_ms)) = self.pending.pop_front() {
                self.playing = Some(Playing {
                    frequency_hz,
                    duration_ms,
                    until_ms: now_ms.saturating_add(u64::from(duration_ms)),
                });
                return Some(BuzzerStep::Start { frequency_hz });
            }
        }
        ended.then_some(BuzzerStep::Silence)
    }

    pub fn is_idle(&self) -> bool {
        self.playing.is_none() && self.pending.is_empty()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}
