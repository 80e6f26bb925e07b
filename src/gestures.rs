//! Gesture recognition from smoothed hand landmarks.
//!
//! Each processed frame runs the detectors in priority order
//! (pinch → tap → swipe → palm); the first candidate wins. Candidates go
//! through a debounce ring buffer and a global cooldown before they are
//! confirmed and handed to the caller.

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::{
    collections::VecDeque,
    fmt,
    str::FromStr,
    time::{Duration, Instant},
};

use crate::landmarks::{LandmarkFrame, Point3};

const POSITION_HISTORY: usize = 10;
const SWIPE_MIN_SAMPLES: usize = 3;

const PINCH_CONFIDENCE: f32 = 0.9;
const SWIPE_CONFIDENCE: f32 = 0.8;
const TAP_CONFIDENCE: f32 = 0.7;
const PALM_CONFIDENCE: f32 = 0.85;

// ── Gesture types ──────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureType {
    /// Thumb and index closing together.
    #[serde(alias = "pinch_zoom_out")]
    PinchIn,
    /// Thumb and index spreading apart.
    #[serde(alias = "pinch_zoom_in")]
    PinchOut,
    SwipeLeft,
    SwipeRight,
    SwipeUp,
    SwipeDown,
    /// Index fingertip pushed toward the camera.
    Tap,
    PalmOpen,
    PalmClose,
}

impl GestureType {
    pub const ALL: [GestureType; 9] = [
        Self::PinchIn,
        Self::PinchOut,
        Self::SwipeLeft,
        Self::SwipeRight,
        Self::SwipeUp,
        Self::SwipeDown,
        Self::Tap,
        Self::PalmOpen,
        Self::PalmClose,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PinchIn => "pinch_in",
            Self::PinchOut => "pinch_out",
            Self::SwipeLeft => "swipe_left",
            Self::SwipeRight => "swipe_right",
            Self::SwipeUp => "swipe_up",
            Self::SwipeDown => "swipe_down",
            Self::Tap => "tap",
            Self::PalmOpen => "palm_open",
            Self::PalmClose => "palm_close",
        }
    }
}

impl fmt::Display for GestureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GestureType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let g = match s.trim().to_ascii_lowercase().as_str() {
            "pinch_in" | "pinch_zoom_out" => Self::PinchIn,
            "pinch_out" | "pinch_zoom_in" => Self::PinchOut,
            "swipe_left" => Self::SwipeLeft,
            "swipe_right" => Self::SwipeRight,
            "swipe_up" => Self::SwipeUp,
            "swipe_down" => Self::SwipeDown,
            "tap" => Self::Tap,
            "palm_open" => Self::PalmOpen,
            "palm_close" => Self::PalmClose,
            other => return Err(other.to_string()),
        };
        Ok(g)
    }
}

/// Measurements attached to a gesture. Fields a detector does not produce
/// stay at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GestureParams {
    /// Pinch: thumb-index distance. Swipe: displacement magnitude. Pixels.
    pub distance: f32,
    /// Swipe speed in pixels per second.
    pub velocity: f32,
    /// Tap: frame-to-frame index fingertip depth change (negative = toward camera).
    pub z_change: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Gesture {
    pub kind: GestureType,
    pub confidence: f32,
    pub params: GestureParams,
    pub timestamp: Instant,
}

impl Gesture {
    pub fn new(kind: GestureType, confidence: f32, params: GestureParams) -> Self {
        Self {
            kind,
            confidence,
            params,
            timestamp: Instant::now(),
        }
    }
}

// ── Config ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct RecognizerConfig {
    pub pinch_close: f32,
    pub pinch_open: f32,
    pub swipe_distance: f32,
    pub swipe_min_velocity: f32,
    pub swipe_direction_tolerance: f32,
    pub tap_z: f32,
    pub palm_open: f32,
    pub cooldown: Duration,
    pub debounce_frames: usize,
    pub min_confidence: f32,
    pub history_len: usize,
    pub target_fps: f32,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            pinch_close: 30.0,
            pinch_open: 100.0,
            swipe_distance: 100.0,
            swipe_min_velocity: 50.0,
            swipe_direction_tolerance: 0.3,
            tap_z: 0.05,
            palm_open: 0.3,
            cooldown: Duration::from_millis(500),
            debounce_frames: 2,
            min_confidence: 0.6,
            history_len: 5,
            target_fps: 30.0,
        }
    }
}

// ── Per-hand temporal state ────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Posture {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    kind: GestureType,
    confidence: f32,
    params: GestureParams,
}

/// Detector memory for one tracked hand.
///
/// Pinch and palm transitions key off the raw per-frame classification: a
/// transition latches its gesture as a candidate for as long as the hand stays
/// in the new posture, so the debouncer can see it on consecutive frames.
#[derive(Debug, Clone, Default)]
pub struct RecognizerState {
    prev_pinch: Option<Posture>,
    pending_pinch: Option<(GestureType, Posture)>,
    prev_palm: Option<Posture>,
    pending_palm: Option<(GestureType, Posture)>,
    prev_index_z: Option<f32>,
    positions: VecDeque<Point3>,
}

impl RecognizerState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn push_position(&mut self, p: Point3) {
        if self.positions.len() == POSITION_HISTORY {
            self.positions.pop_front();
        }
        self.positions.push_back(p);
    }

    fn detect(&mut self, frame: &LandmarkFrame, cfg: &RecognizerConfig) -> Option<Candidate> {
        if let Some(c) = self.detect_pinch(frame, cfg) {
            return Some(c);
        }
        if let Some(c) = self.detect_tap(frame, cfg) {
            return Some(c);
        }
        if let Some(c) = classify_swipe(&self.positions, cfg) {
            return Some(c);
        }
        self.detect_palm(frame, cfg)
    }

    fn detect_pinch(&mut self, frame: &LandmarkFrame, cfg: &RecognizerConfig) -> Option<Candidate> {
        let distance = frame.pinch_distance();
        let current = if distance < cfg.pinch_close {
            Some(Posture::Closed)
        } else if distance > cfg.pinch_open {
            Some(Posture::Open)
        } else {
            None
        };

        match (self.prev_pinch, current) {
            (Some(Posture::Open), Some(Posture::Closed)) => {
                self.pending_pinch = Some((GestureType::PinchIn, Posture::Closed));
            }
            (Some(Posture::Closed), Some(Posture::Open)) => {
                self.pending_pinch = Some((GestureType::PinchOut, Posture::Open));
            }
            _ => {}
        }
        if self.pending_pinch.is_some_and(|(_, target)| current != Some(target)) {
            self.pending_pinch = None;
        }
        // dead zone keeps the previous posture
        if current.is_some() {
            self.prev_pinch = current;
        }

        self.pending_pinch.map(|(kind, _)| Candidate {
            kind,
            confidence: PINCH_CONFIDENCE,
            params: GestureParams {
                distance,
                ..Default::default()
            },
        })
    }

    fn detect_tap(&mut self, frame: &LandmarkFrame, cfg: &RecognizerConfig) -> Option<Candidate> {
        let z = frame.index_tip().z;
        let prev = self.prev_index_z.replace(z)?;
        let z_change = z - prev;
        (z_change < -cfg.tap_z).then(|| Candidate {
            kind: GestureType::Tap,
            confidence: TAP_CONFIDENCE,
            params: GestureParams {
                z_change,
                ..Default::default()
            },
        })
    }

    fn detect_palm(&mut self, frame: &LandmarkFrame, cfg: &RecognizerConfig) -> Option<Candidate> {
        let current = if frame.is_open(cfg.palm_open) {
            Posture::Open
        } else {
            Posture::Closed
        };

        match (self.prev_palm, current) {
            (Some(Posture::Closed), Posture::Open) => {
                self.pending_palm = Some((GestureType::PalmOpen, Posture::Open));
            }
            (Some(Posture::Open), Posture::Closed) => {
                self.pending_palm = Some((GestureType::PalmClose, Posture::Closed));
            }
            _ => {}
        }
        if self.pending_palm.is_some_and(|(_, target)| target != current) {
            self.pending_palm = None;
        }
        self.prev_palm = Some(current);

        self.pending_palm.map(|(kind, _)| Candidate {
            kind,
            confidence: PALM_CONFIDENCE,
            params: GestureParams::default(),
        })
    }

    fn on_confirmed(&mut self, kind: GestureType) {
        self.pending_pinch = None;
        self.pending_palm = None;
        if matches!(
            kind,
            GestureType::SwipeLeft | GestureType::SwipeRight | GestureType::SwipeUp | GestureType::SwipeDown
        ) {
            self.positions.clear();
        }
    }
}

/// Swipe classification over the buffered palm-center history (oldest vs
/// newest sample, x/y only). Diagonal motion without a dominant axis is
/// rejected rather than snapped to the nearer axis.
fn classify_swipe(positions: &VecDeque<Point3>, cfg: &RecognizerConfig) -> Option<Candidate> {
    if positions.len() < SWIPE_MIN_SAMPLES {
        return None;
    }
    let first = positions.front()?;
    let last = positions.back()?;
    let dx = last.x - first.x;
    let dy = last.y - first.y;
    let distance = (dx * dx + dy * dy).sqrt();
    let elapsed = positions.len() as f32 / cfg.target_fps;
    let velocity = if elapsed > 0.0 { distance / elapsed } else { 0.0 };

    if distance < cfg.swipe_distance || velocity < cfg.swipe_min_velocity {
        return None;
    }

    let (ax, ay) = (dx.abs(), dy.abs());
    let dominance = 1.0 + cfg.swipe_direction_tolerance;
    let kind = if ax > ay {
        if ax <= ay * dominance {
            return None;
        }
        if dx > 0.0 {
            GestureType::SwipeRight
        } else {
            GestureType::SwipeLeft
        }
    } else {
        if ay <= ax * dominance {
            return None;
        }
        // image y grows downward
        if dy > 0.0 {
            GestureType::SwipeDown
        } else {
            GestureType::SwipeUp
        }
    };

    Some(Candidate {
        kind,
        confidence: SWIPE_CONFIDENCE,
        params: GestureParams {
            distance,
            velocity,
            z_change: 0.0,
        },
    })
}

// ── Debounce + cooldown ────────────────────────────────────

/// Requires `capacity` consecutive identical candidates before confirming,
/// and gates every confirmation behind a cooldown shared by all gesture types.
#[derive(Debug, Clone)]
pub struct Debouncer {
    capacity: usize,
    buffer: VecDeque<GestureType>,
    cooldown: Duration,
    last_confirmed: Option<Instant>,
}

impl Debouncer {
    pub fn new(capacity: usize, cooldown: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            buffer: VecDeque::with_capacity(capacity),
            cooldown,
            last_confirmed: None,
        }
    }

    pub fn cooling_down(&self, now: Instant) -> bool {
        self.last_confirmed
            .is_some_and(|t| now.saturating_duration_since(t) < self.cooldown)
    }

    /// Feed one candidate; returns true when the buffer is full of `kind`.
    /// The buffer is emptied on confirmation.
    pub fn push(&mut self, kind: GestureType, now: Instant) -> bool {
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(kind);

        if self.buffer.len() == self.capacity && self.buffer.iter().all(|k| *k == kind) {
            self.buffer.clear();
            self.last_confirmed = Some(now);
            return true;
        }
        false
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

// ── Recognizer ─────────────────────────────────────────────

#[derive(Debug)]
pub struct Recognizer {
    config: RecognizerConfig,
    state: RecognizerState,
    debounce: Debouncer,
    history: VecDeque<Gesture>,
}

impl Recognizer {
    pub fn new(config: RecognizerConfig) -> Self {
        let debounce = Debouncer::new(config.debounce_frames, config.cooldown);
        Self {
            history: VecDeque::with_capacity(config.history_len),
            config,
            state: RecognizerState::default(),
            debounce,
        }
    }

    pub fn config(&self) -> &RecognizerConfig {
        &self.config
    }

    /// Swap in new thresholds. Temporal state starts over as after a
    /// detection gap; the cooldown clock is kept.
    pub fn set_config(&mut self, config: RecognizerConfig) {
        let last = self.debounce.last_confirmed;
        self.debounce = Debouncer::new(config.debounce_frames, config.cooldown);
        self.debounce.last_confirmed = last;
        self.state.reset();
        while self.history.len() > config.history_len {
            self.history.pop_front();
        }
        self.config = config;
    }

    pub fn recognize(&mut self, frame: Option<&LandmarkFrame>) -> Option<Gesture> {
        self.recognize_at(frame, Instant::now())
    }

    /// Process one frame observed at `now`. `None` means no hand this frame
    /// and clears all temporal state.
    pub fn recognize_at(&mut self, frame: Option<&LandmarkFrame>, now: Instant) -> Option<Gesture> {
        let Some(frame) = frame else {
            self.state.reset();
            self.debounce.clear();
            return None;
        };

        if self.debounce.cooling_down(now) {
            return None;
        }

        self.state.push_position(frame.palm_center());

        let candidate = self
            .state
            .detect(frame, &self.config)
            .filter(|c| c.confidence >= self.config.min_confidence);

        let Some(candidate) = candidate else {
            self.debounce.clear();
            return None;
        };
        trace!("candidate {} ({:.2})", candidate.kind, candidate.confidence);

        if !self.debounce.push(candidate.kind, now) {
            return None;
        }

        self.state.on_confirmed(candidate.kind);
        let gesture = Gesture {
            kind: candidate.kind,
            confidence: candidate.confidence,
            params: candidate.params,
            timestamp: now,
        };
        debug!(
            "gesture {} conf={:.2} params={:?}",
            gesture.kind, gesture.confidence, gesture.params
        );

        if self.config.history_len > 0 {
            if self.history.len() == self.config.history_len {
                self.history.pop_front();
            }
            self.history.push_back(gesture.clone());
        }
        Some(gesture)
    }

    /// Most recent confirmed gestures, oldest first.
    pub fn recent(&self) -> impl Iterator<Item = &Gesture> {
        self.history.iter()
    }
}

// ── Test helpers ───────────────────────────────────────────

#[cfg(test)]
fn hand_with_pinch(distance: f32) -> LandmarkFrame {
    use crate::landmarks::{INDEX_TIP, THUMB_TIP, test_hand};
    let mut f = test_hand(320.0, 240.0);
    f.set(THUMB_TIP, Point3::new(320.0 - distance / 2.0, 240.0, 0.0));
    f.set(INDEX_TIP, Point3::new(320.0 + distance / 2.0, 240.0, 0.0));
    f
}

#[cfg(test)]
fn open_hand() -> LandmarkFrame {
    use crate::landmarks::{INDEX_TIP, MIDDLE_TIP, PINKY_TIP, RING_TIP, THUMB_TIP, test_hand};
    let mut f = test_hand(320.0, 240.0);
    // spread fingers, thumb and index still pinched shut
    f.set(THUMB_TIP, Point3::new(310.0, 150.0, 0.0));
    f.set(INDEX_TIP, Point3::new(330.0, 150.0, 0.0));
    f.set(MIDDLE_TIP, Point3::new(340.0, 150.0, 0.0));
    f.set(RING_TIP, Point3::new(380.0, 160.0, 0.0));
    f.set(PINKY_TIP, Point3::new(410.0, 180.0, 0.0));
    f
}

#[cfg(test)]
fn hand_at(x: f32, y: f32) -> LandmarkFrame {
    crate::landmarks::test_hand(x, y)
}

#[cfg(test)]
fn hand_with_index_z(z: f32) -> LandmarkFrame {
    use crate::landmarks::INDEX_TIP;
    let mut f = test_hand_default();
    let tip = f.index_tip();
    f.set(INDEX_TIP, Point3::new(tip.x, tip.y, z));
    f
}

#[cfg(test)]
fn test_hand_default() -> LandmarkFrame {
    crate::landmarks::test_hand(320.0, 240.0)
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_millis(33);

    /// Feed frames one per 33ms starting at `t0`; returns per-frame output.
    fn feed(
        rec: &mut Recognizer,
        t0: Instant,
        frames: &[Option<LandmarkFrame>],
    ) -> Vec<Option<GestureType>> {
        frames
            .iter()
            .enumerate()
            .map(|(i, f)| {
                rec.recognize_at(f.as_ref(), t0 + FRAME * i as u32)
                    .map(|g| g.kind)
            })
            .collect()
    }

    fn config(debounce: usize) -> RecognizerConfig {
        RecognizerConfig {
            debounce_frames: debounce,
            ..Default::default()
        }
    }

    #[test]
    fn test_no_hand_never_emits() {
        let mut rec = Recognizer::new(RecognizerConfig::default());
        let t0 = Instant::now();
        let frames = vec![None; 50];
        assert!(feed(&mut rec, t0, &frames).iter().all(Option::is_none));
    }

    #[test]
    fn test_pinch_in_confirmed_once() {
        let mut rec = Recognizer::new(config(2));
        let t0 = Instant::now();
        let frames: Vec<_> = [120.0, 60.0, 25.0, 20.0, 20.0, 20.0]
            .iter()
            .map(|d| Some(hand_with_pinch(*d)))
            .collect();
        let out = feed(&mut rec, t0, &frames);
        assert_eq!(
            out,
            vec![None, None, None, Some(GestureType::PinchIn), None, None]
        );

        // still pinched after the cooldown: no new transition, no new gesture
        let later = t0 + Duration::from_secs(2);
        assert!(feed(&mut rec, later, &frames[3..]).iter().all(Option::is_none));
    }

    #[test]
    fn test_pinch_out_after_release() {
        let mut rec = Recognizer::new(config(2));
        let t0 = Instant::now();
        let frames: Vec<_> = [20.0, 20.0, 70.0, 110.0, 130.0]
            .iter()
            .map(|d| Some(hand_with_pinch(*d)))
            .collect();
        let out = feed(&mut rec, t0, &frames);
        assert_eq!(out[4], Some(GestureType::PinchOut));
        assert_eq!(out.iter().flatten().count(), 1);
    }

    #[test]
    fn test_pinch_params_carry_distance() {
        let mut rec = Recognizer::new(config(1));
        let t0 = Instant::now();
        rec.recognize_at(Some(&hand_with_pinch(140.0)), t0);
        let g = rec
            .recognize_at(Some(&hand_with_pinch(12.0)), t0 + FRAME)
            .expect("pinch");
        assert_eq!(g.kind, GestureType::PinchIn);
        assert!((g.params.distance - 12.0).abs() < 1e-3);
        assert!((g.confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_dead_zone_breaks_pinch_latch() {
        let mut rec = Recognizer::new(config(2));
        let t0 = Instant::now();
        // open → closed (candidate) → dead zone → closed again (no transition)
        let frames: Vec<_> = [120.0, 20.0, 60.0, 20.0, 20.0]
            .iter()
            .map(|d| Some(hand_with_pinch(*d)))
            .collect();
        assert!(feed(&mut rec, t0, &frames).iter().all(Option::is_none));
    }

    #[test]
    fn test_noisy_frame_flips_pinch_state() {
        let mut rec = Recognizer::new(config(2));
        let t0 = Instant::now();
        // a single closed frame is not confirmed, but it still moves the raw
        // pinch state, so the return to open reads as a pinch-out
        let frames: Vec<_> = [120.0, 20.0, 120.0, 120.0]
            .iter()
            .map(|d| Some(hand_with_pinch(*d)))
            .collect();
        let out = feed(&mut rec, t0, &frames);
        assert_eq!(out, vec![None, None, None, Some(GestureType::PinchOut)]);
    }

    #[test]
    fn test_cooldown_blocks_other_gestures() {
        let mut rec = Recognizer::new(config(2));
        let t0 = Instant::now();
        let pinch: Vec<_> = [120.0, 60.0, 25.0, 20.0]
            .iter()
            .map(|d| Some(hand_with_pinch(*d)))
            .collect();
        let out = feed(&mut rec, t0, &pinch);
        assert_eq!(out[3], Some(GestureType::PinchIn));
        let confirmed_at = t0 + FRAME * 3;

        // palm opens right away, still inside the cooldown window
        let open: Vec<_> = (0..5).map(|_| Some(open_hand())).collect();
        let during = feed(&mut rec, confirmed_at + FRAME, &open);
        assert!(during.iter().all(Option::is_none));

        // first eligible frames after the cooldown pick up the transition
        let after = feed(&mut rec, confirmed_at + Duration::from_millis(500), &open[..2]);
        assert_eq!(after, vec![None, Some(GestureType::PalmOpen)]);
    }

    #[test]
    fn test_palm_close_after_open() {
        let mut rec = Recognizer::new(config(2));
        let t0 = Instant::now();
        let frames = vec![
            Some(open_hand()),
            Some(open_hand()),
            Some(hand_with_pinch(20.0)),
            Some(hand_with_pinch(20.0)),
        ];
        let out = feed(&mut rec, t0, &frames);
        assert_eq!(out, vec![None, None, None, Some(GestureType::PalmClose)]);
    }

    #[test]
    fn test_swipe_right_from_palm_history() {
        let mut rec = Recognizer::new(config(2));
        let t0 = Instant::now();
        let frames: Vec<_> = [0.0, 20.0, 50.0, 110.0, 140.0]
            .iter()
            .map(|x| Some(hand_at(200.0 + x, 240.0)))
            .collect();
        let out = feed(&mut rec, t0, &frames);
        assert_eq!(out, vec![None, None, None, None, Some(GestureType::SwipeRight)]);
        assert!(rec.state.positions.is_empty());
    }

    #[test]
    fn test_swipe_up_and_down() {
        let mut rec = Recognizer::new(config(1));
        let t0 = Instant::now();
        let up: Vec<_> = [0.0, -60.0, -130.0]
            .iter()
            .map(|y| Some(hand_at(320.0, 300.0 + y)))
            .collect();
        assert_eq!(feed(&mut rec, t0, &up)[2], Some(GestureType::SwipeUp));

        let down: Vec<_> = [0.0, 60.0, 130.0]
            .iter()
            .map(|y| Some(hand_at(320.0, 100.0 + y)))
            .collect();
        let later = t0 + Duration::from_secs(1);
        assert_eq!(feed(&mut rec, later, &down)[2], Some(GestureType::SwipeDown));
    }

    #[test]
    fn test_classify_swipe_scenario() {
        let cfg = RecognizerConfig::default();
        let positions: VecDeque<Point3> = [0.0, 20.0, 50.0, 110.0]
            .iter()
            .map(|x| Point3::new(*x, 0.0, 0.0))
            .collect();
        let c = classify_swipe(&positions, &cfg).expect("swipe");
        assert_eq!(c.kind, GestureType::SwipeRight);
        assert!((c.params.distance - 110.0).abs() < 1e-3);
        assert!((c.params.velocity - 825.0).abs() < 1e-2);
    }

    #[test]
    fn test_classify_swipe_needs_three_samples() {
        let cfg = RecognizerConfig::default();
        let positions: VecDeque<Point3> = [Point3::new(0.0, 0.0, 0.0), Point3::new(500.0, 0.0, 0.0)]
            .into_iter()
            .collect();
        assert!(classify_swipe(&positions, &cfg).is_none());
    }

    #[test]
    fn test_diagonal_swipe_rejected() {
        let cfg = RecognizerConfig::default();
        for (dx, dy) in [(150.0, 135.0), (-150.0, 120.0), (200.0, -170.0), (130.0, 150.0)] {
            let positions: VecDeque<Point3> = (0..4)
                .map(|i| {
                    let t = i as f32 / 3.0;
                    Point3::new(dx * t, dy * t, 0.0)
                })
                .collect();
            assert!(
                classify_swipe(&positions, &cfg).is_none(),
                "diagonal ({dx}, {dy}) should not swipe"
            );
        }

        let mut rec = Recognizer::new(config(1));
        let t0 = Instant::now();
        let frames: Vec<_> = (0..8)
            .map(|i| Some(hand_at(100.0 + 40.0 * i as f32, 100.0 + 38.0 * i as f32)))
            .collect();
        assert!(feed(&mut rec, t0, &frames).iter().all(Option::is_none));
    }

    #[test]
    fn test_slow_swipe_rejected() {
        let cfg = RecognizerConfig {
            swipe_min_velocity: 1000.0,
            ..Default::default()
        };
        let positions: VecDeque<Point3> = [0.0, 50.0, 120.0]
            .iter()
            .map(|x| Point3::new(*x, 0.0, 0.0))
            .collect();
        // 120px over 3 frames at 30fps = 1200 px/s
        assert!(classify_swipe(&positions, &cfg).is_some());
        let positions: VecDeque<Point3> = (0..10).map(|i| Point3::new(12.0 * i as f32, 0.0, 0.0)).collect();
        // 108px over 10 frames = 324 px/s
        assert!(classify_swipe(&positions, &cfg).is_none());
    }

    #[test]
    fn test_tap_on_fast_forward_motion() {
        let mut rec = Recognizer::new(config(2));
        let t0 = Instant::now();
        let frames: Vec<_> = [0.0, -0.06, -0.12]
            .iter()
            .map(|z| Some(hand_with_index_z(*z)))
            .collect();
        let out = feed(&mut rec, t0, &frames);
        assert_eq!(out, vec![None, None, Some(GestureType::Tap)]);
    }

    #[test]
    fn test_tap_updates_depth_without_firing() {
        let mut rec = Recognizer::new(config(1));
        let t0 = Instant::now();
        // two slow steps of 0.03 never exceed the 0.05 threshold
        let frames: Vec<_> = [0.0, -0.03, -0.06]
            .iter()
            .map(|z| Some(hand_with_index_z(*z)))
            .collect();
        assert!(feed(&mut rec, t0, &frames).iter().all(Option::is_none));
    }

    #[test]
    fn test_debounce_requires_consecutive_frames() {
        let mut rec = Recognizer::new(config(3));
        let t0 = Instant::now();
        let frames: Vec<_> = [0.0, -0.06, -0.12, -0.12, -0.18, -0.24, -0.30]
            .iter()
            .map(|z| Some(hand_with_index_z(*z)))
            .collect();
        let out = feed(&mut rec, t0, &frames);
        assert_eq!(
            out,
            vec![None, None, None, None, None, None, Some(GestureType::Tap)]
        );
    }

    #[test]
    fn test_gap_resets_temporal_state() {
        let mut rec = Recognizer::new(config(2));
        let t0 = Instant::now();
        let frames = vec![
            Some(hand_with_pinch(120.0)),
            None,
            Some(hand_with_pinch(20.0)),
            Some(hand_with_pinch(20.0)),
        ];
        assert!(feed(&mut rec, t0, &frames).iter().all(Option::is_none));
    }

    #[test]
    fn test_gap_drops_stored_index_depth() {
        let t0 = Instant::now();
        let mut rec = Recognizer::new(config(1));
        let joined = [Some(hand_with_index_z(0.0)), Some(hand_with_index_z(-0.1))];
        assert_eq!(feed(&mut rec, t0, &joined), vec![None, Some(GestureType::Tap)]);

        let mut rec = Recognizer::new(config(1));
        let split = [
            Some(hand_with_index_z(0.0)),
            None,
            Some(hand_with_index_z(-0.1)),
        ];
        assert!(feed(&mut rec, t0, &split).iter().all(Option::is_none));
    }

    #[test]
    fn test_gap_drops_palm_history() {
        let t0 = Instant::now();
        let mut rec = Recognizer::new(config(1));
        let joined: Vec<_> = [200.0, 260.0, 300.0]
            .iter()
            .map(|x| Some(hand_at(*x, 240.0)))
            .collect();
        assert_eq!(
            feed(&mut rec, t0, &joined),
            vec![None, None, Some(GestureType::SwipeRight)]
        );

        // same travel, but only 80px of it after the hand reappears
        let mut rec = Recognizer::new(config(1));
        let split = [
            Some(hand_at(200.0, 240.0)),
            Some(hand_at(260.0, 240.0)),
            None,
            Some(hand_at(300.0, 240.0)),
            Some(hand_at(340.0, 240.0)),
            Some(hand_at(380.0, 240.0)),
        ];
        assert!(feed(&mut rec, t0, &split).iter().all(Option::is_none));
    }

    #[test]
    fn test_min_confidence_filters_taps() {
        let mut rec = Recognizer::new(RecognizerConfig {
            debounce_frames: 1,
            min_confidence: 0.75,
            ..Default::default()
        });
        let t0 = Instant::now();
        let frames: Vec<_> = [0.0, -0.1, -0.2]
            .iter()
            .map(|z| Some(hand_with_index_z(*z)))
            .collect();
        assert!(feed(&mut rec, t0, &frames).iter().all(Option::is_none));
    }

    #[test]
    fn test_history_is_bounded() {
        let mut rec = Recognizer::new(RecognizerConfig {
            debounce_frames: 1,
            history_len: 2,
            ..Default::default()
        });
        let mut t = Instant::now();
        for _ in 0..3 {
            rec.recognize_at(Some(&hand_with_index_z(0.0)), t);
            t += FRAME;
            assert!(rec.recognize_at(Some(&hand_with_index_z(-0.1)), t).is_some());
            t += Duration::from_secs(1);
            rec.recognize_at(None, t);
        }
        assert_eq!(rec.recent().count(), 2);
    }

    #[test]
    fn test_set_config_resets_state() {
        let mut rec = Recognizer::new(config(2));
        let t0 = Instant::now();
        rec.recognize_at(Some(&hand_with_pinch(120.0)), t0);
        rec.set_config(config(1));
        // previous open posture is gone, so this is not a transition
        assert!(rec.recognize_at(Some(&hand_with_pinch(20.0)), t0 + FRAME).is_none());
        assert_eq!(rec.config().debounce_frames, 1);
    }

    #[test]
    fn test_gesture_type_names_roundtrip() {
        for g in GestureType::ALL {
            assert_eq!(g.as_str().parse::<GestureType>(), Ok(g));
        }
        assert_eq!("pinch_zoom_out".parse::<GestureType>(), Ok(GestureType::PinchIn));
        assert_eq!("pinch_zoom_in".parse::<GestureType>(), Ok(GestureType::PinchOut));
        assert!("wave".parse::<GestureType>().is_err());
    }
}
