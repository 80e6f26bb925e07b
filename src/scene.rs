//! Reference scene controllers.
//!
//! [`ObjectScene`] is the state of a single spinning object. [`GlobeScene`]
//! drives a globe camera and queues [`BridgeMessage`]s for whatever renders
//! it; the queue is the hand-off point and is drained by the caller.

use log::debug;
use serde::{Deserialize, Serialize};
use std::{collections::VecDeque, time::Duration};

use crate::actions::{ControlAction, SceneController, SelectPosition};

// ── Object scene ───────────────────────────────────────────

pub const OBJECT_ZOOM_MIN: f32 = 1.0;
pub const OBJECT_ZOOM_MAX: f32 = 10.0;
pub const OBJECT_ZOOM_DEFAULT: f32 = 3.0;
/// Idle spin around Y while not paused.
pub const AUTO_SPIN_DEG_PER_SEC: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Cube,
    Pyramid,
    Sphere,
    Torus,
}

impl Shape {
    pub fn next(self) -> Self {
        match self {
            Self::Cube => Self::Pyramid,
            Self::Pyramid => Self::Sphere,
            Self::Sphere => Self::Torus,
            Self::Torus => Self::Cube,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectScene {
    /// Degrees around X (tilt).
    pub rotation_x: f32,
    /// Degrees around Y (spin).
    pub rotation_y: f32,
    pub zoom: f32,
    pub shape: Shape,
    /// Stops the idle spin.
    pub paused: bool,
    pub selections: u32,
}

impl ObjectScene {
    /// Advance the idle spin by `dt`.
    pub fn tick(&mut self, dt: Duration) {
        if !self.paused {
            self.rotation_y += AUTO_SPIN_DEG_PER_SEC * dt.as_secs_f32();
        }
    }
}

impl Default for ObjectScene {
    fn default() -> Self {
        Self {
            rotation_x: 0.0,
            rotation_y: 0.0,
            zoom: OBJECT_ZOOM_DEFAULT,
            shape: Shape::Cube,
            paused: false,
            selections: 0,
        }
    }
}

impl SceneController for ObjectScene {
    fn apply(&mut self, action: &ControlAction) {
        match *action {
            ControlAction::ZoomIn { factor, .. } => {
                self.zoom = (self.zoom * factor).clamp(OBJECT_ZOOM_MIN, OBJECT_ZOOM_MAX);
            }
            ControlAction::ZoomOut { factor, .. } => {
                self.zoom = (self.zoom / factor).clamp(OBJECT_ZOOM_MIN, OBJECT_ZOOM_MAX);
            }
            ControlAction::RotateLeft { amount, .. } => self.rotation_y -= amount,
            ControlAction::RotateRight { amount, .. } => self.rotation_y += amount,
            ControlAction::TiltUp { amount, .. } => self.rotation_x -= amount,
            ControlAction::TiltDown { amount, .. } => self.rotation_x += amount,
            ControlAction::Select { .. } => {
                self.shape = self.shape.next();
                self.selections += 1;
            }
            ControlAction::ResetView { .. } => *self = Self::default(),
            ControlAction::PauseToggle => self.paused = !self.paused,
        }
        debug!(
            "object: {:?} rot=({:.1}, {:.1}) zoom={:.2} paused={}",
            self.shape, self.rotation_x, self.rotation_y, self.zoom, self.paused
        );
    }

    fn name(&self) -> &'static str {
        "object"
    }
}

// ── Globe scene ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct GlobeConfig {
    /// Closest allowed camera altitude in meters.
    pub zoom_min: f64,
    /// Farthest allowed camera altitude in meters.
    pub zoom_max: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    /// Fly-to duration attached to incremental camera updates.
    pub transition_secs: f32,
}

impl Default for GlobeConfig {
    fn default() -> Self {
        Self {
            zoom_min: 1_000.0,
            zoom_max: 20_000_000.0,
            latitude: 40.7128,
            longitude: -74.0060,
            altitude: 10_000_000.0,
            transition_secs: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    /// Degrees in `[0, 360)`.
    pub heading: f64,
    /// Degrees in `[-90, 0]`; -90 looks straight down. Tilting up looks
    /// further down at the globe, tilting down moves toward the horizon.
    pub pitch: f64,
    pub roll: f64,
}

impl Camera {
    fn home(config: &GlobeConfig) -> Self {
        Self {
            latitude: config.latitude,
            longitude: config.longitude,
            altitude: config.altitude.clamp(config.zoom_min, config.zoom_max),
            heading: 0.0,
            pitch: -90.0,
            roll: 0.0,
        }
    }
}

/// Outbound messages for the globe renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeMessage {
    CameraUpdate { camera: Camera, duration: f32 },
    Click { position: SelectPosition },
    PauseToggle,
}

#[derive(Debug, Clone)]
pub struct GlobeScene {
    config: GlobeConfig,
    camera: Camera,
    outbox: VecDeque<BridgeMessage>,
}

impl GlobeScene {
    pub fn new(config: GlobeConfig) -> Self {
        let camera = Camera::home(&config);
        Self {
            config,
            camera,
            outbox: VecDeque::new(),
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn config(&self) -> &GlobeConfig {
        &self.config
    }

    /// Swap limits and home position. The current camera is re-clamped, not
    /// reset.
    pub fn set_config(&mut self, config: GlobeConfig) {
        self.camera.altitude = self.camera.altitude.clamp(config.zoom_min, config.zoom_max);
        self.config = config;
    }

    pub fn pending(&self) -> usize {
        self.outbox.len()
    }

    /// Take every queued message, oldest first.
    pub fn drain(&mut self) -> Vec<BridgeMessage> {
        self.outbox.drain(..).collect()
    }

    fn camera_moved(&mut self, duration: f32) {
        self.outbox.push_back(BridgeMessage::CameraUpdate {
            camera: self.camera,
            duration,
        });
    }
}

fn wrap_degrees(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}

impl SceneController for GlobeScene {
    fn apply(&mut self, action: &ControlAction) {
        let step = self.config.transition_secs;
        match *action {
            ControlAction::ZoomIn { factor, .. } => {
                self.camera.altitude = (self.camera.altitude / f64::from(factor))
                    .clamp(self.config.zoom_min, self.config.zoom_max);
                self.camera_moved(step);
            }
            ControlAction::ZoomOut { factor, .. } => {
                self.camera.altitude = (self.camera.altitude * f64::from(factor))
                    .clamp(self.config.zoom_min, self.config.zoom_max);
                self.camera_moved(step);
            }
            ControlAction::RotateLeft { amount, .. } => {
                self.camera.heading = wrap_degrees(self.camera.heading - f64::from(amount));
                self.camera_moved(step);
            }
            ControlAction::RotateRight { amount, .. } => {
                self.camera.heading = wrap_degrees(self.camera.heading + f64::from(amount));
                self.camera_moved(step);
            }
            ControlAction::TiltUp { amount, .. } => {
                self.camera.pitch = (self.camera.pitch - f64::from(amount)).clamp(-90.0, 0.0);
                self.camera_moved(step);
            }
            ControlAction::TiltDown { amount, .. } => {
                self.camera.pitch = (self.camera.pitch + f64::from(amount)).clamp(-90.0, 0.0);
                self.camera_moved(step);
            }
            ControlAction::Select { position, .. } => {
                self.outbox.push_back(BridgeMessage::Click { position });
            }
            ControlAction::ResetView { duration } => {
                self.camera = Camera::home(&self.config);
                self.camera_moved(duration);
            }
            ControlAction::PauseToggle => self.outbox.push_back(BridgeMessage::PauseToggle),
        }
        debug!(
            "globe: alt={:.0} heading={:.1} pitch={:.1}",
            self.camera.altitude, self.camera.heading, self.camera.pitch
        );
    }

    fn name(&self) -> &'static str {
        "globe"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rotate_left(amount: f32) -> ControlAction {
        ControlAction::RotateLeft {
            amount,
            velocity: 0.0,
            sensitivity: 1.0,
        }
    }

    fn tilt_up(amount: f32) -> ControlAction {
        ControlAction::TiltUp {
            amount,
            velocity: 0.0,
            sensitivity: 1.0,
        }
    }

    fn zoom_in(factor: f32) -> ControlAction {
        ControlAction::ZoomIn {
            factor,
            sensitivity: 1.0,
        }
    }

    fn zoom_out(factor: f32) -> ControlAction {
        ControlAction::ZoomOut {
            factor,
            sensitivity: 1.0,
        }
    }

    #[test]
    fn test_object_zoom_is_clamped() {
        let mut scene = ObjectScene::default();
        for _ in 0..20 {
            scene.apply(&zoom_in(1.2));
        }
        assert_eq!(scene.zoom, OBJECT_ZOOM_MAX);
        for _ in 0..40 {
            scene.apply(&zoom_out(1.2));
        }
        assert_eq!(scene.zoom, OBJECT_ZOOM_MIN);
    }

    #[test]
    fn test_object_rotation_and_tilt_signs() {
        let mut scene = ObjectScene::default();
        scene.apply(&rotate_left(30.0));
        scene.apply(&tilt_up(12.0));
        assert_eq!(scene.rotation_y, -30.0);
        assert_eq!(scene.rotation_x, -12.0);
        scene.apply(&ControlAction::RotateRight {
            amount: 45.0,
            velocity: 0.0,
            sensitivity: 1.0,
        });
        assert_eq!(scene.rotation_y, 15.0);
    }

    #[test]
    fn test_object_select_cycles_shapes_and_reset_restores() {
        let mut scene = ObjectScene::default();
        let select = ControlAction::Select {
            position: SelectPosition::Center,
            z_change: -0.1,
        };
        let mut seen = vec![scene.shape];
        for _ in 0..4 {
            scene.apply(&select);
            seen.push(scene.shape);
        }
        assert_eq!(
            seen,
            [Shape::Cube, Shape::Pyramid, Shape::Sphere, Shape::Torus, Shape::Cube]
        );

        scene.apply(&ControlAction::PauseToggle);
        assert!(scene.paused);
        scene.apply(&ControlAction::ResetView { duration: 0.5 });
        assert_eq!(scene, ObjectScene::default());
    }

    #[test]
    fn test_object_idle_spin_stops_when_paused() {
        let mut scene = ObjectScene::default();
        scene.tick(Duration::from_millis(500));
        assert!((scene.rotation_y - 10.0).abs() < 1e-4);

        scene.apply(&ControlAction::PauseToggle);
        scene.tick(Duration::from_secs(2));
        assert!((scene.rotation_y - 10.0).abs() < 1e-4);

        scene.apply(&ControlAction::PauseToggle);
        scene.tick(Duration::from_secs(1));
        assert!((scene.rotation_y - 30.0).abs() < 1e-4);
    }

    #[test]
    fn test_globe_zoom_clamps_to_limits() {
        let mut globe = GlobeScene::new(GlobeConfig::default());
        globe.apply(&zoom_in(1.2));
        assert!((globe.camera().altitude - 10_000_000.0 / 1.2).abs() < 1.0);

        for _ in 0..200 {
            globe.apply(&zoom_in(1.2));
        }
        assert_eq!(globe.camera().altitude, 1_000.0);
        for _ in 0..200 {
            globe.apply(&zoom_out(1.2));
        }
        assert_eq!(globe.camera().altitude, 20_000_000.0);
    }

    #[test]
    fn test_globe_heading_wraps() {
        let mut globe = GlobeScene::new(GlobeConfig::default());
        globe.apply(&rotate_left(30.0));
        assert!((globe.camera().heading - 330.0).abs() < 1e-9);
        globe.apply(&ControlAction::RotateRight {
            amount: 50.0,
            velocity: 0.0,
            sensitivity: 1.0,
        });
        assert!((globe.camera().heading - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_globe_pitch_clamps() {
        let mut globe = GlobeScene::new(GlobeConfig::default());
        globe.apply(&tilt_up(15.0));
        assert_eq!(globe.camera().pitch, -90.0);

        globe.apply(&ControlAction::TiltDown {
            amount: 15.0,
            velocity: 0.0,
            sensitivity: 1.0,
        });
        assert_eq!(globe.camera().pitch, -75.0);
        globe.apply(&tilt_up(10.0));
        assert_eq!(globe.camera().pitch, -85.0);

        for _ in 0..10 {
            globe.apply(&ControlAction::TiltDown {
                amount: 15.0,
                velocity: 0.0,
                sensitivity: 1.0,
            });
        }
        assert_eq!(globe.camera().pitch, 0.0);
    }

    #[test]
    fn test_globe_queues_bridge_messages() {
        let mut globe = GlobeScene::new(GlobeConfig::default());
        globe.apply(&zoom_out(1.2));
        globe.apply(&ControlAction::Select {
            position: SelectPosition::Center,
            z_change: -0.08,
        });
        globe.apply(&ControlAction::PauseToggle);
        globe.apply(&ControlAction::ResetView { duration: 2.0 });
        assert_eq!(globe.pending(), 4);

        let msgs = globe.drain();
        assert_eq!(globe.pending(), 0);
        assert!(matches!(msgs[0], BridgeMessage::CameraUpdate { duration, .. } if duration == 0.5));
        assert_eq!(
            msgs[1],
            BridgeMessage::Click {
                position: SelectPosition::Center
            }
        );
        assert_eq!(msgs[2], BridgeMessage::PauseToggle);
        match &msgs[3] {
            BridgeMessage::CameraUpdate { camera, duration } => {
                assert_eq!(*duration, 2.0);
                assert_eq!(camera.altitude, 10_000_000.0);
                assert_eq!(camera.pitch, -90.0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_bridge_message_json_shape() {
        let v = serde_json::to_value(BridgeMessage::Click {
            position: SelectPosition::Center,
        })
        .unwrap();
        assert_eq!(v, serde_json::json!({"type": "click", "position": "center"}));
    }

    #[test]
    fn test_set_config_reclamps_altitude() {
        let mut globe = GlobeScene::new(GlobeConfig::default());
        globe.set_config(GlobeConfig {
            zoom_max: 5_000_000.0,
            ..Default::default()
        });
        assert_eq!(globe.camera().altitude, 5_000_000.0);
    }
}
