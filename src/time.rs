//! Frame timing for the animation loop.
//!
//! Tracks elapsed and delta time in milliseconds, counts FPS over a rolling
//! one-second window, and turns the measured frame rate into the adaptive
//! factor the stage clock is scaled by: a struggling machine gets slower
//! stage cycling instead of dropped stages.
//!
//! # Example
//!
//! ```ignore
//! use plexfield::time::Clock;
//!
//! let mut clock = Clock::new();
//! // In the frame callback:
//! let timing = clock.tick();
//! field.advance(timing, &mut geometry);
//! ```

use std::time::Instant;

/// Longest delta a single frame may report, in milliseconds. A long stall
/// (tab hidden, debugger pause) resumes smoothly instead of jumping.
const MAX_DELTA_MS: f32 = 100.0;

/// Per-frame timing handed to the field.
///
/// Tests construct this directly; the windowed loop gets it from
/// [`Clock::tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTiming {
    /// Milliseconds since the clock started.
    pub elapsed_ms: f32,
    /// Milliseconds since the previous frame, clamped to 100 ms.
    pub delta_ms: f32,
    /// Stage-clock multiplier derived from the frame rate.
    pub adaptive_factor: f32,
}

impl FrameTiming {
    /// Fixed-step timing for deterministic tests: 60 FPS frames, no
    /// adaptive slowdown.
    pub fn fixed(frame: u64) -> Self {
        let step = 1000.0 / 60.0;
        Self {
            elapsed_ms: frame as f32 * step,
            delta_ms: step,
            adaptive_factor: 1.0,
        }
    }
}

/// Wall-clock frame timer.
#[derive(Debug)]
pub struct Clock {
    start: Instant,
    last_frame: Instant,
    elapsed_ms: f32,
    frame_count: u64,
    fps: f32,
    fps_window_frames: u64,
    fps_window_start: Instant,
    paused: bool,
}

impl Clock {
    /// Create a clock starting from now. FPS reads 60 until the first
    /// one-second window completes.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            elapsed_ms: 0.0,
            frame_count: 0,
            fps: 60.0,
            fps_window_frames: 0,
            fps_window_start: now,
            paused: false,
        }
    }

    /// Advance the clock one frame and return the timing for it.
    ///
    /// While paused the delta is zero and elapsed time holds still, so a
    /// paused field neither moves nor cycles stages.
    pub fn tick(&mut self) -> FrameTiming {
        let now = Instant::now();

        if self.paused {
            self.last_frame = now;
            return FrameTiming {
                elapsed_ms: self.elapsed_ms,
                delta_ms: 0.0,
                adaptive_factor: self.adaptive_factor(),
            };
        }

        let delta_ms =
            (now.duration_since(self.last_frame).as_secs_f32() * 1000.0).min(MAX_DELTA_MS);
        self.last_frame = now;
        self.elapsed_ms += delta_ms;
        self.frame_count += 1;
        self.fps_window_frames += 1;

        let window = now.duration_since(self.fps_window_start).as_secs_f32();
        if window >= 1.0 {
            self.fps = self.fps_window_frames as f32 / window;
            self.fps_window_frames = 0;
            self.fps_window_start = now;
        }

        FrameTiming {
            elapsed_ms: self.elapsed_ms,
            delta_ms,
            adaptive_factor: self.adaptive_factor(),
        }
    }

    /// Milliseconds of unpaused run time.
    #[inline]
    pub fn elapsed_ms(&self) -> f32 {
        self.elapsed_ms
    }

    /// Frames ticked since start.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Frames per second measured over the last window.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Stage-clock multiplier for the measured frame rate: full speed above
    /// 45 FPS, three-quarter speed above 30, half below that.
    pub fn adaptive_factor(&self) -> f32 {
        adaptive_factor(self.fps)
    }

    /// Whether the clock is paused.
    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Pause time progression; subsequent ticks report zero deltas.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume after a pause without replaying the paused span.
    pub fn resume(&mut self) {
        self.last_frame = Instant::now();
        self.paused = false;
    }

    /// Toggle between paused and running.
    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Seconds since the clock was created, including paused time.
    pub fn wall_seconds(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

/// Stage-clock multiplier for a measured frame rate.
pub fn adaptive_factor(fps: f32) -> f32 {
    if fps < 30.0 {
        0.5
    } else if fps < 45.0 {
        0.75
    } else {
        1.0
    }
}
