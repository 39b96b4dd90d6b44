//! Animation frame model and playback driver.
//!
//! [`FrameModel`] turns the animation variables and `animation` settings of
//! a run into a frame count and maps an ever-increasing absolute frame
//! counter onto 1-based logical frames (ping-ponging for `cycle`).
//!
//! [`AnimationDriver`] is the clock. The host calls [`AnimationDriver::tick`]
//! from its frame callback with a monotonic timestamp; the driver measures
//! how often it is being called and advances by `target_fps / measured_fps`
//! frames per tick, so wall-clock speed does not depend on how long each
//! frame takes to draw.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::hcode::AnimationSymbolTable;
use crate::lcode::defaults;
use crate::lcode::{AnimationStruct, Control};
use crate::log::{debug, trace};

/// Slack for the fractional frame accumulator, so that a run of
/// `0.9999999` advances still lands on whole frames
const ACCUMULATOR_SLACK: f64 = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameModel {
    frames_per_loop: usize,
    frames_per_rep: usize,
    abs_max_frame: usize,
    control: Control,
}

impl FrameModel {
    /// A variable without a final value counts as [`defaults::MAX_FRAMES`]
    pub fn new(vars: &AnimationSymbolTable, settings: &AnimationStruct) -> Self {
        let frames_per_loop = vars
            .iter()
            .map(|(_, var)| var.frame_count().unwrap_or(defaults::MAX_FRAMES))
            .max()
            .unwrap_or(1);
        FrameModel::from_loop(frames_per_loop, settings.control, settings.reps)
    }

    /// `reps: None` repeats until the frame cap
    pub fn from_loop(frames_per_loop: usize, control: Control, reps: Option<usize>) -> Self {
        let frames_per_loop = frames_per_loop.clamp(1, defaults::MAX_FRAMES);
        let frames_per_rep = match control {
            Control::Loop => frames_per_loop,
            Control::Cycle if frames_per_loop >= 2 => 2 * frames_per_loop - 2,
            Control::Cycle => 1,
        };
        let total = reps
            .map_or(usize::MAX, |r| r.saturating_mul(frames_per_rep))
            .min(defaults::MAX_FRAMES);
        FrameModel {
            frames_per_loop,
            frames_per_rep,
            abs_max_frame: total.saturating_sub(1),
            control,
        }
    }

    pub fn frames_per_loop(&self) -> usize {
        self.frames_per_loop
    }

    pub fn frames_per_rep(&self) -> usize {
        self.frames_per_rep
    }

    /// Last valid absolute frame (0-based)
    pub fn abs_max_frame(&self) -> usize {
        self.abs_max_frame
    }

    pub fn control(&self) -> Control {
        self.control
    }

    /// Map a 0-based absolute frame to a 1-based logical frame
    pub fn logical_frame(&self, abs_frame: usize) -> usize {
        let mut frame = abs_frame % self.frames_per_rep;
        if self.control == Control::Cycle && frame >= self.frames_per_loop {
            frame = self.frames_per_rep - frame;
        }
        frame + 1
    }
}

/// Cross-thread request to stop playback. The driver notices it on its
/// next tick; a frame already being drawn is allowed to finish.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Running,
}

/// Measures how often the host ticks
#[derive(Clone, Copy, Debug, PartialEq)]
enum FrameRateEstimator {
    /// No tick seen yet
    Bootstrap,
    Steady { start: Duration, total_frames: u64 },
}

impl FrameRateEstimator {
    /// Record a tick; returns the average tick rate once one is known
    fn record(&mut self, now: Duration) -> Option<f64> {
        match self {
            FrameRateEstimator::Bootstrap => {
                debug!(?now, "frame rate estimator started");
                *self = FrameRateEstimator::Steady {
                    start: now,
                    total_frames: 0,
                };
                None
            }
            FrameRateEstimator::Steady { start, total_frames } => {
                *total_frames += 1;
                let elapsed = now.saturating_sub(*start).as_secs_f64();
                (elapsed > 0.0).then(|| *total_frames as f64 / elapsed)
            }
        }
    }
}

/// What the host should do after a tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// Nothing new to draw
    Idle,
    /// Run the script for this logical frame and redraw
    Frame(usize),
    /// Draw this last logical frame; playback has stopped
    Finished(usize),
}

#[derive(Debug)]
pub struct AnimationDriver {
    model: FrameModel,
    speed: f64,
    state: PlaybackState,
    abs_frame: usize,
    accumulator: f64,
    estimator: FrameRateEstimator,
    stop: StopHandle,
}

impl AnimationDriver {
    pub fn new(model: FrameModel, speed: f64) -> Self {
        AnimationDriver {
            model,
            speed: if speed.is_finite() && speed > 0.0 { speed } else { 1.0 },
            state: PlaybackState::Stopped,
            abs_frame: 0,
            accumulator: 0.0,
            estimator: FrameRateEstimator::Bootstrap,
            stop: StopHandle::default(),
        }
    }

    pub fn model(&self) -> &FrameModel {
        &self.model
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == PlaybackState::Running
    }

    pub fn abs_frame(&self) -> usize {
        self.abs_frame
    }

    pub fn current_frame(&self) -> usize {
        self.model.logical_frame(self.abs_frame)
    }

    pub fn target_fps(&self) -> f64 {
        defaults::BASE_FPS * self.speed
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Start or resume; playback that already reached the end restarts
    pub fn play(&mut self) {
        if self.abs_frame >= self.model.abs_max_frame() {
            self.abs_frame = 0;
        }
        self.stop.reset();
        self.estimator = FrameRateEstimator::Bootstrap;
        self.accumulator = 0.0;
        self.state = PlaybackState::Running;
    }

    pub fn pause(&mut self) {
        self.state = PlaybackState::Stopped;
    }

    /// Stop and rewind
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.abs_frame = 0;
    }

    /// Jump to an absolute frame (clamped)
    pub fn seek(&mut self, abs_frame: usize) -> usize {
        self.abs_frame = abs_frame.min(self.model.abs_max_frame());
        self.accumulator = 0.0;
        self.current_frame()
    }

    /// Advance the clock. `now` is any monotonic timestamp.
    pub fn tick(&mut self, now: Duration) -> Tick {
        if self.stop.is_stop_requested() {
            self.stop.reset();
            self.state = PlaybackState::Stopped;
        }
        if self.state == PlaybackState::Stopped {
            return Tick::Idle;
        }

        let bootstrapping = self.estimator == FrameRateEstimator::Bootstrap;
        let Some(measured) = self.estimator.record(now) else {
            // First tick after play shows where we are; a repeated
            // timestamp has nothing new to show
            return if bootstrapping {
                Tick::Frame(self.current_frame())
            } else {
                Tick::Idle
            };
        };
        if measured > 0.0 && measured.is_finite() {
            self.accumulator += self.target_fps() / measured;
        } else {
            self.accumulator += 1.0;
        }
        let steps = (self.accumulator + ACCUMULATOR_SLACK).floor();
        if steps < 1.0 {
            return Tick::Idle;
        }
        self.accumulator -= steps;

        let next = self.abs_frame.saturating_add(steps as usize);
        if next >= self.model.abs_max_frame() {
            self.abs_frame = self.model.abs_max_frame();
            self.state = PlaybackState::Stopped;
            debug!(frame = self.abs_frame, "animation finished");
            return Tick::Finished(self.current_frame());
        }
        self.abs_frame = next;
        trace!(abs = self.abs_frame, logical = self.current_frame(), measured, "animation tick");
        Tick::Frame(self.current_frame())
    }
}
