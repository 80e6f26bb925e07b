//! Control actions and the scene controller seam they are applied through.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The fixed action vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    ZoomIn,
    ZoomOut,
    RotateLeft,
    RotateRight,
    TiltUp,
    TiltDown,
    Select,
    ResetView,
    PauseToggle,
}

impl ActionKind {
    pub const ALL: [ActionKind; 9] = [
        Self::ZoomIn,
        Self::ZoomOut,
        Self::RotateLeft,
        Self::RotateRight,
        Self::TiltUp,
        Self::TiltDown,
        Self::Select,
        Self::ResetView,
        Self::PauseToggle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ZoomIn => "zoom_in",
            Self::ZoomOut => "zoom_out",
            Self::RotateLeft => "rotate_left",
            Self::RotateRight => "rotate_right",
            Self::TiltUp => "tilt_up",
            Self::TiltDown => "tilt_down",
            Self::Select => "select",
            Self::ResetView => "reset_view",
            Self::PauseToggle => "pause_toggle",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s.trim())
            .ok_or_else(|| s.to_string())
    }
}

/// Logical target of a `select`. Only the screen center is produced today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectPosition {
    Center,
}

/// One action for a scene controller. Values are unclamped deltas and
/// factors; range limits belong to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlAction {
    ZoomIn { factor: f32, sensitivity: f32 },
    ZoomOut { factor: f32, sensitivity: f32 },
    RotateLeft { amount: f32, velocity: f32, sensitivity: f32 },
    RotateRight { amount: f32, velocity: f32, sensitivity: f32 },
    TiltUp { amount: f32, velocity: f32, sensitivity: f32 },
    TiltDown { amount: f32, velocity: f32, sensitivity: f32 },
    Select { position: SelectPosition, z_change: f32 },
    ResetView { duration: f32 },
    PauseToggle,
}

impl ControlAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::ZoomIn { .. } => ActionKind::ZoomIn,
            Self::ZoomOut { .. } => ActionKind::ZoomOut,
            Self::RotateLeft { .. } => ActionKind::RotateLeft,
            Self::RotateRight { .. } => ActionKind::RotateRight,
            Self::TiltUp { .. } => ActionKind::TiltUp,
            Self::TiltDown { .. } => ActionKind::TiltDown,
            Self::Select { .. } => ActionKind::Select,
            Self::ResetView { .. } => ActionKind::ResetView,
            Self::PauseToggle => ActionKind::PauseToggle,
        }
    }
}

/// Anything that can consume [`ControlAction`]s. Nothing is reported back.
pub trait SceneController {
    fn apply(&mut self, action: &ControlAction);

    fn name(&self) -> &'static str;
}
