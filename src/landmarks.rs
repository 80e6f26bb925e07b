//! Hand landmark frames as delivered by the external hand tracker.
//!
//! A frame always holds exactly [`LANDMARK_COUNT`] points; the type enforces it
//! so the detectors can index fixed landmarks without bounds checks failing at
//! runtime.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_TIP: usize = 20;

pub const FINGERTIPS: [usize; 5] = [THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];
pub const PALM_BASE: [usize; 5] = [WRIST, INDEX_MCP, MIDDLE_MCP, RING_MCP, PINKY_MCP];

#[derive(Debug, Error, PartialEq)]
pub enum FrameError {
    #[error("landmark frame must have {LANDMARK_COUNT} points, got {got}")]
    WrongCardinality { got: usize },
    #[error("landmark {index} has a non-finite coordinate")]
    NonFinite { index: usize },
}

/// Pixel x/y plus normalized depth z (smaller = closer to the camera).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Planar (x, y) distance; depth is ignored.
    pub fn distance_xy(&self, other: &Point3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkFrame {
    points: [Point3; LANDMARK_COUNT],
    pub handedness: Option<Handedness>,
}

impl LandmarkFrame {
    pub fn new(points: [Point3; LANDMARK_COUNT], handedness: Option<Handedness>) -> Self {
        Self { points, handedness }
    }

    /// Build a frame from tracker output, rejecting anything that is not
    /// exactly 21 finite points.
    pub fn from_points(points: &[Point3], handedness: Option<Handedness>) -> Result<Self, FrameError> {
        let arr: [Point3; LANDMARK_COUNT] = points
            .try_into()
            .map_err(|_| FrameError::WrongCardinality { got: points.len() })?;
        if let Some(index) = arr.iter().position(|p| !p.is_finite()) {
            return Err(FrameError::NonFinite { index });
        }
        Ok(Self::new(arr, handedness))
    }

    pub fn points(&self) -> &[Point3; LANDMARK_COUNT] {
        &self.points
    }

    pub fn point(&self, index: usize) -> Point3 {
        self.points[index]
    }

    pub fn thumb_tip(&self) -> Point3 {
        self.points[THUMB_TIP]
    }

    pub fn index_tip(&self) -> Point3 {
        self.points[INDEX_TIP]
    }

    /// Thumb-to-index fingertip distance in pixels.
    pub fn pinch_distance(&self) -> f32 {
        self.thumb_tip().distance_xy(&self.index_tip())
    }

    /// Mean of the wrist and the four finger MCP joints.
    pub fn palm_center(&self) -> Point3 {
        let n = PALM_BASE.len() as f32;
        let (sx, sy, sz) = PALM_BASE.iter().fold((0.0, 0.0, 0.0), |(x, y, z), &i| {
            let p = self.points[i];
            (x + p.x, y + p.y, z + p.z)
        });
        Point3::new(sx / n, sy / n, sz / n)
    }

    /// Wrist to middle-finger MCP distance, used to normalize openness.
    pub fn hand_size(&self) -> f32 {
        self.points[WRIST].distance_xy(&self.points[MIDDLE_MCP])
    }

    /// Average fingertip distance from the palm center divided by hand size.
    /// Returns `None` for a degenerate hand (zero size).
    pub fn openness(&self) -> Option<f32> {
        let size = self.hand_size();
        if size <= f32::EPSILON {
            return None;
        }
        let center = self.palm_center();
        let total: f32 = FINGERTIPS
            .iter()
            .map(|&i| self.points[i].distance_xy(&center))
            .sum();
        Some(total / FINGERTIPS.len() as f32 / size)
    }

    pub fn is_open(&self, threshold: f32) -> bool {
        self.openness().is_some_and(|o| o > threshold)
    }

    #[cfg(test)]
    pub(crate) fn set(&mut self, index: usize, p: Point3) {
        self.points[index] = p;
    }
}

// ── Test helpers ───────────────────────────────────────────

/// A flat synthetic hand: palm joints around (`cx`, `cy`) with a 100px hand
/// size, fingertips curled onto the palm. Tests move individual joints from
/// here.
#[cfg(test)]
pub(crate) fn test_hand(cx: f32, cy: f32) -> LandmarkFrame {
    let mut points = [Point3::new(cx, cy, 0.0); LANDMARK_COUNT];
    points[WRIST] = Point3::new(cx, cy + 50.0, 0.0);
    points[INDEX_MCP] = Point3::new(cx - 20.0, cy - 20.0, 0.0);
    points[MIDDLE_MCP] = Point3::new(cx, cy - 50.0, 0.0);
    points[RING_MCP] = Point3::new(cx + 20.0, cy - 20.0, 0.0);
    points[PINKY_MCP] = Point3::new(cx, cy + 40.0, 0.0);
    for tip in FINGERTIPS {
        points[tip] = Point3::new(cx, cy, 0.0);
    }
    // thumb and index apart so the default pinch state is "open"
    points[THUMB_TIP] = Point3::new(cx - 60.0, cy, 0.0);
    points[INDEX_TIP] = Point3::new(cx + 60.0, cy, 0.0);
    LandmarkFrame::new(points, Some(Handedness::Right))
}
