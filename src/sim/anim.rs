//! Animation timing state machine
//!
//! Decoupled from drawing: exposes only the current discrete step and whether
//! a non-looping sequence has finished.

use serde::{Deserialize, Serialize};

use crate::config::AnimSpec;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Animator {
    spec: AnimSpec,
    elapsed_ms: f32,
    step: u32,
    finished: bool,
}

impl Animator {
    pub fn new(spec: AnimSpec) -> Self {
        Self {
            spec,
            elapsed_ms: 0.0,
            step: 0,
            finished: false,
        }
    }

    /// Swap in a new sequence and restart it
    pub fn play(&mut self, spec: AnimSpec) {
        self.spec = spec;
        self.reset();
    }

    pub fn reset(&mut self) {
        self.elapsed_ms = 0.0;
        self.step = 0;
        self.finished = false;
    }

    pub fn update(&mut self, dt: f32) {
        if self.finished || self.spec.frame_ms <= 0.0 {
            return;
        }
        self.elapsed_ms += dt * 1000.0;

        let frames = self.spec.frames.max(1);
        while self.elapsed_ms >= self.spec.frame_ms && !self.finished {
            self.elapsed_ms -= self.spec.frame_ms;
            self.step += 1;
            if self.step >= frames {
                if self.spec.looping {
                    self.step = 0;
                } else {
                    self.step = frames - 1;
                    self.finished = true;
                }
            }
        }
    }

    pub fn step(&self) -> u32 {
        self.step
    }

    /// Only ever true for non-looping sequences
    pub fn finished(&self) -> bool {
        self.finished
    }
}
