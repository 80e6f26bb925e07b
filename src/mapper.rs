//! Gesture → control action translation.

use log::info;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use crate::actions::{ActionKind, ControlAction, SelectPosition};
use crate::gestures::{Gesture, GestureType};

#[derive(Debug, Error, PartialEq)]
pub enum MapperError {
    #[error("unknown gesture '{0}'")]
    UnknownGesture(String),
}

/// Per-gesture enable flag, sensitivity and bound action.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureBinding {
    pub enabled: bool,
    pub sensitivity: f32,
    pub action: ActionKind,
}

impl GestureBinding {
    pub fn default_for(kind: GestureType) -> Self {
        let (action, sensitivity) = match kind {
            GestureType::PinchIn => (ActionKind::ZoomOut, 0.5),
            GestureType::PinchOut => (ActionKind::ZoomIn, 0.5),
            GestureType::SwipeLeft => (ActionKind::RotateLeft, 0.2),
            GestureType::SwipeRight => (ActionKind::RotateRight, 0.2),
            GestureType::SwipeUp => (ActionKind::TiltUp, 0.1),
            GestureType::SwipeDown => (ActionKind::TiltDown, 0.1),
            GestureType::Tap => (ActionKind::Select, 1.0),
            GestureType::PalmOpen => (ActionKind::ResetView, 1.0),
            GestureType::PalmClose => (ActionKind::PauseToggle, 1.0),
        };
        Self {
            enabled: true,
            sensitivity,
            action,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapperConfig {
    /// Multiplicative zoom factor per pinch.
    pub zoom_step: f32,
    /// Degrees of rotation per pixel of swipe.
    pub rotation_sensitivity: f32,
    /// Degrees of tilt per pixel of swipe.
    pub pan_sensitivity: f32,
    /// Camera transition time carried by `reset_view`.
    pub transition_secs: f32,
    pub bindings: BTreeMap<GestureType, GestureBinding>,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            zoom_step: 1.2,
            rotation_sensitivity: 0.2,
            pan_sensitivity: 0.1,
            transition_secs: 0.5,
            bindings: GestureType::ALL
                .into_iter()
                .map(|g| (g, GestureBinding::default_for(g)))
                .collect(),
        }
    }
}

pub type MappingFn = Box<dyn Fn(&Gesture) -> Option<ControlAction> + Send + Sync>;

pub struct GestureMapper {
    config: MapperConfig,
    overrides: HashMap<GestureType, MappingFn>,
}

impl GestureMapper {
    pub fn new(config: MapperConfig) -> Self {
        Self {
            config,
            overrides: HashMap::new(),
        }
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Replace the configuration; custom overrides stay registered.
    pub fn set_config(&mut self, config: MapperConfig) {
        self.config = config;
    }

    /// Translate a confirmed gesture. `None` when the gesture is disabled or
    /// has nothing bound.
    pub fn map(&self, gesture: &Gesture) -> Option<ControlAction> {
        let binding = self.config.bindings.get(&gesture.kind);
        if binding.is_some_and(|b| !b.enabled) {
            return None;
        }
        if let Some(custom) = self.overrides.get(&gesture.kind) {
            return custom(gesture);
        }
        let binding = binding?;
        Some(derive_action(binding, gesture, &self.config))
    }

    pub fn set_custom_mapping<F>(&mut self, kind: GestureType, f: F)
    where
        F: Fn(&Gesture) -> Option<ControlAction> + Send + Sync + 'static,
    {
        self.overrides.insert(kind, Box::new(f));
        info!("custom mapping set for {kind}");
    }

    pub fn clear_custom_mapping(&mut self, kind: GestureType) -> bool {
        self.overrides.remove(&kind).is_some()
    }

    pub fn set_enabled(&mut self, kind: GestureType, enabled: bool) {
        self.config
            .bindings
            .entry(kind)
            .or_insert_with(|| GestureBinding::default_for(kind))
            .enabled = enabled;
    }

    pub fn enable(&mut self, name: &str) -> Result<GestureType, MapperError> {
        let kind = parse_gesture(name)?;
        self.set_enabled(kind, true);
        info!("enabled gesture {kind}");
        Ok(kind)
    }

    pub fn disable(&mut self, name: &str) -> Result<GestureType, MapperError> {
        let kind = parse_gesture(name)?;
        self.set_enabled(kind, false);
        info!("disabled gesture {kind}");
        Ok(kind)
    }

    pub fn is_enabled(&self, kind: GestureType) -> bool {
        self.config.bindings.get(&kind).is_some_and(|b| b.enabled)
    }

    pub fn has_custom_mapping(&self, kind: GestureType) -> bool {
        self.overrides.contains_key(&kind)
    }

    pub fn available_actions(&self) -> &'static [ActionKind] {
        &ActionKind::ALL
    }

    /// Human-readable table of the effective mappings, one row per gesture.
    pub fn describe(&self) -> Vec<String> {
        GestureType::ALL
            .iter()
            .map(|kind| {
                let (mark, target) = match self.config.bindings.get(kind) {
                    Some(b) => (if b.enabled { '✓' } else { '✗' }, b.action.as_str()),
                    None => ('✗', "-"),
                };
                let target = if self.has_custom_mapping(*kind) {
                    "custom"
                } else {
                    target
                };
                format!("{mark} {:<12} -> {target}", kind.as_str())
            })
            .collect()
    }
}

fn parse_gesture(name: &str) -> Result<GestureType, MapperError> {
    name.parse()
        .map_err(|_| MapperError::UnknownGesture(name.to_string()))
}

/// Parameters follow the bound action, not the gesture that triggered it.
fn derive_action(binding: &GestureBinding, g: &Gesture, cfg: &MapperConfig) -> ControlAction {
    let sensitivity = binding.sensitivity;
    let p = g.params;
    match binding.action {
        ActionKind::ZoomIn => ControlAction::ZoomIn {
            factor: cfg.zoom_step,
            sensitivity,
        },
        ActionKind::ZoomOut => ControlAction::ZoomOut {
            factor: cfg.zoom_step,
            sensitivity,
        },
        ActionKind::RotateLeft => ControlAction::RotateLeft {
            amount: p.distance * cfg.rotation_sensitivity,
            velocity: p.velocity,
            sensitivity,
        },
        ActionKind::RotateRight => ControlAction::RotateRight {
            amount: p.distance * cfg.rotation_sensitivity,
            velocity: p.velocity,
            sensitivity,
        },
        ActionKind::TiltUp => ControlAction::TiltUp {
            amount: p.distance * cfg.pan_sensitivity,
            velocity: p.velocity,
            sensitivity,
        },
        ActionKind::TiltDown => ControlAction::TiltDown {
            amount: p.distance * cfg.pan_sensitivity,
            velocity: p.velocity,
            sensitivity,
        },
        ActionKind::Select => ControlAction::Select {
            position: SelectPosition::Center,
            z_change: p.z_change,
        },
        ActionKind::ResetView => ControlAction::ResetView {
            duration: cfg.transition_secs,
        },
        ActionKind::PauseToggle => ControlAction::PauseToggle,
    }
}
