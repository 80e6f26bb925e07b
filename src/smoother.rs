//! Moving-average smoothing of landmark frames.

use std::collections::VecDeque;

use crate::landmarks::{LANDMARK_COUNT, LandmarkFrame, Point3};

pub const DEFAULT_WINDOW: usize = 5;

#[derive(Debug, Clone)]
pub struct TemporalSmoother {
    window: usize,
    frames: VecDeque<LandmarkFrame>,
}

impl Default for TemporalSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl TemporalSmoother {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            frames: VecDeque::with_capacity(window),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Append `raw` (evicting the oldest frame past the window) and return the
    /// element-wise mean of everything buffered. x, y and z are averaged the
    /// same way. Handedness follows the newest frame.
    pub fn push(&mut self, raw: LandmarkFrame) -> LandmarkFrame {
        let handedness = raw.handedness;
        if self.frames.len() == self.window {
            self.frames.pop_front();
        }
        self.frames.push_back(raw);

        let n = self.frames.len() as f32;
        let mut acc = [Point3::default(); LANDMARK_COUNT];
        for frame in &self.frames {
            for (sum, p) in acc.iter_mut().zip(frame.points()) {
                sum.x += p.x;
                sum.y += p.y;
                sum.z += p.z;
            }
        }
        for p in acc.iter_mut() {
            p.x /= n;
            p.y /= n;
            p.z /= n;
        }
        LandmarkFrame::new(acc, handedness)
    }

    /// Drop all buffered frames; called on a detection gap so the next hand is
    /// not averaged with the last one.
    pub fn reset(&mut self) {
        self.frames.clear();
    }
}
