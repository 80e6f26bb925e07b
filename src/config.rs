use anyhow::{Context, Result, anyhow, bail};
use directories::UserDirs;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    actions::ActionKind,
    gestures::{GestureType, RecognizerConfig},
    mapper::{GestureBinding, MapperConfig},
    scene::GlobeConfig,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Meta {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Thresholds {
    pub pinch_close: f32,
    pub pinch_open: f32,
    pub swipe_distance: f32,
    pub swipe_min_velocity: f32,
    pub swipe_direction_tolerance: f32,
    pub tap_z: f32,
    pub palm_open: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        let r = RecognizerConfig::default();
        Self {
            pinch_close: r.pinch_close,
            pinch_open: r.pinch_open,
            swipe_distance: r.swipe_distance,
            swipe_min_velocity: r.swipe_min_velocity,
            swipe_direction_tolerance: r.swipe_direction_tolerance,
            tap_z: r.tap_z,
            palm_open: r.palm_open,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Stabilization {
    pub cooldown_ms: u64,
    pub debounce_frames: usize,
    pub smoothing_window: usize,
    pub min_confidence: f32,
    pub history_len: usize,
    pub target_fps: f32,
}

impl Default for Stabilization {
    fn default() -> Self {
        Self {
            cooldown_ms: 500,
            debounce_frames: 2,
            smoothing_window: 5,
            min_confidence: 0.6,
            history_len: 5,
            target_fps: 30.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Controls {
    pub zoom_step: f32,
    pub rotation_sensitivity: f32,
    pub pan_sensitivity: f32,
    pub transition_secs: f32,
}

impl Default for Controls {
    fn default() -> Self {
        let m = MapperConfig::default();
        Self {
            zoom_step: m.zoom_step,
            rotation_sensitivity: m.rotation_sensitivity,
            pan_sensitivity: m.pan_sensitivity,
            transition_secs: m.transition_secs,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Globe {
    pub zoom_min: f64,
    pub zoom_max: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

impl Default for Globe {
    fn default() -> Self {
        let g = GlobeConfig::default();
        Self {
            zoom_min: g.zoom_min,
            zoom_max: g.zoom_max,
            latitude: g.latitude,
            longitude: g.longitude,
            altitude: g.altitude,
        }
    }
}

/// Overrides for one gesture; anything left out keeps the built-in binding.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GestureEntry {
    pub enabled: Option<bool>,
    pub sensitivity: Option<f32>,
    pub action: Option<ActionKind>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Profile {
    pub meta: Meta,
    pub thresholds: Thresholds,
    pub stabilization: Stabilization,
    pub controls: Controls,
    pub globe: Globe,
    /// Keyed by gesture name; the older binding names (`pinch_zoom_out`, ...)
    /// are accepted too.
    pub gestures: BTreeMap<String, GestureEntry>,
}

impl Profile {
    pub fn parse(text: &str) -> Result<Self> {
        let profile: Profile = toml::from_str(text)?;
        validate_profile(&profile)?;
        Ok(profile)
    }

    pub fn recognizer_config(&self) -> RecognizerConfig {
        let t = &self.thresholds;
        let s = &self.stabilization;
        RecognizerConfig {
            pinch_close: t.pinch_close,
            pinch_open: t.pinch_open,
            swipe_distance: t.swipe_distance,
            swipe_min_velocity: t.swipe_min_velocity,
            swipe_direction_tolerance: t.swipe_direction_tolerance,
            tap_z: t.tap_z,
            palm_open: t.palm_open,
            cooldown: Duration::from_millis(s.cooldown_ms),
            debounce_frames: s.debounce_frames,
            min_confidence: s.min_confidence,
            history_len: s.history_len,
            target_fps: s.target_fps,
        }
    }

    pub fn smoothing_window(&self) -> usize {
        self.stabilization.smoothing_window
    }

    pub fn mapper_config(&self) -> Result<MapperConfig> {
        let c = &self.controls;
        Ok(MapperConfig {
            zoom_step: c.zoom_step,
            rotation_sensitivity: c.rotation_sensitivity,
            pan_sensitivity: c.pan_sensitivity,
            transition_secs: c.transition_secs,
            bindings: self.gesture_bindings()?,
        })
    }

    pub fn globe_config(&self) -> GlobeConfig {
        let g = &self.globe;
        GlobeConfig {
            zoom_min: g.zoom_min,
            zoom_max: g.zoom_max,
            latitude: g.latitude,
            longitude: g.longitude,
            altitude: g.altitude,
            transition_secs: self.controls.transition_secs,
        }
    }

    /// Built-in bindings with this profile's per-gesture overrides applied.
    pub fn gesture_bindings(&self) -> Result<BTreeMap<GestureType, GestureBinding>> {
        let mut out: BTreeMap<GestureType, GestureBinding> = GestureType::ALL
            .into_iter()
            .map(|g| (g, GestureBinding::default_for(g)))
            .collect();
        let mut seen = BTreeMap::new();
        for (key, entry) in &self.gestures {
            let kind: GestureType = key
                .parse()
                .map_err(|_| anyhow!("gestures.{key}: unknown gesture"))?;
            if let Some(prev) = seen.insert(kind, key) {
                bail!("gestures.{key}: duplicates gestures.{prev}");
            }
            let binding = out
                .get_mut(&kind)
                .ok_or_else(|| anyhow!("gestures.{key}: no built-in binding"))?;
            if let Some(enabled) = entry.enabled {
                binding.enabled = enabled;
            }
            if let Some(sensitivity) = entry.sensitivity {
                binding.sensitivity = sensitivity;
            }
            if let Some(action) = entry.action {
                binding.action = action;
            }
        }
        Ok(out)
    }
}

pub fn default_profile_text() -> &'static str {
    include_str!("../profiles/default.toml")
}

pub fn validate_profile(p: &Profile) -> Result<()> {
    let t = &p.thresholds;
    for (key, v) in [
        ("pinch_close", t.pinch_close),
        ("pinch_open", t.pinch_open),
        ("swipe_distance", t.swipe_distance),
        ("swipe_min_velocity", t.swipe_min_velocity),
        ("tap_z", t.tap_z),
        ("palm_open", t.palm_open),
    ] {
        if !(v.is_finite() && v > 0.0) {
            bail!("thresholds.{key} must be positive, got {v}");
        }
    }
    if t.pinch_close >= t.pinch_open {
        bail!(
            "thresholds.pinch_close ({}) must be below thresholds.pinch_open ({})",
            t.pinch_close,
            t.pinch_open
        );
    }
    if !(0.0..=1.0).contains(&t.swipe_direction_tolerance) {
        bail!("thresholds.swipe_direction_tolerance must be in [0, 1]");
    }

    let s = &p.stabilization;
    if !(1..=10).contains(&s.debounce_frames) {
        bail!("stabilization.debounce_frames must be in 1..=10, got {}", s.debounce_frames);
    }
    if !(3..=10).contains(&s.smoothing_window) {
        bail!("stabilization.smoothing_window must be in 3..=10, got {}", s.smoothing_window);
    }
    if !(0.0..=1.0).contains(&s.min_confidence) {
        bail!("stabilization.min_confidence must be in [0, 1]");
    }
    if !(s.target_fps.is_finite() && s.target_fps > 0.0) {
        bail!("stabilization.target_fps must be positive");
    }

    let c = &p.controls;
    if !(c.zoom_step.is_finite() && c.zoom_step > 1.0) {
        bail!("controls.zoom_step must be greater than 1, got {}", c.zoom_step);
    }
    if c.transition_secs < 0.0 {
        bail!("controls.transition_secs must not be negative");
    }

    let g = &p.globe;
    if !(g.zoom_min > 0.0 && g.zoom_min < g.zoom_max) {
        bail!("globe.zoom_min must be positive and below globe.zoom_max");
    }
    if !(-90.0..=90.0).contains(&g.latitude) || !(-180.0..=180.0).contains(&g.longitude) {
        bail!("globe latitude/longitude out of range");
    }

    for (key, entry) in &p.gestures {
        if entry.sensitivity.is_some_and(|v| !(v.is_finite() && v >= 0.0)) {
            bail!("gestures.{key}.sensitivity must not be negative");
        }
    }
    p.gesture_bindings()?;
    Ok(())
}

pub fn load_file(path: &Path) -> Result<Profile> {
    let txt = fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read {}: {e}", path.display()))?;
    Profile::parse(&txt).with_context(|| format!("invalid profile {}", path.display()))
}

/// Profile directory layout: `<dir>/profiles/<name>.toml` plus an `active`
/// file naming the selected profile.
#[derive(Debug, Clone)]
pub struct ConfigState {
    pub active_name: String,
    pub profile: Profile,
    pub profiles_dir: PathBuf,
    pub active_ptr: PathBuf,
}

pub fn config_dir() -> Result<PathBuf> {
    let dirs = UserDirs::new().ok_or_else(|| anyhow!("cannot determine home directory"))?;
    Ok(dirs.home_dir().join(".config").join("gesturectl"))
}

impl ConfigState {
    pub fn load_or_install_default() -> Result<Self> {
        Self::open(&config_dir()?)
    }

    pub fn open(dir: &Path) -> Result<Self> {
        let profiles_dir = dir.join("profiles");
        fs::create_dir_all(&profiles_dir)
            .with_context(|| format!("failed to create {}", profiles_dir.display()))?;

        let def_path = profiles_dir.join("default.toml");
        if !def_path.exists() {
            fs::write(&def_path, default_profile_text())?;
            info!("installed default profile at {}", def_path.display());
        }

        let active_ptr = dir.join("active");
        if !active_ptr.exists() {
            fs::write(&active_ptr, b"default")?;
        }

        let active_name = fs::read_to_string(&active_ptr)?.trim().to_string();
        let profile = load_file(&profiles_dir.join(format!("{active_name}.toml")))?;
        info!("loaded profile '{active_name}'");

        Ok(Self {
            active_name,
            profile,
            profiles_dir,
            active_ptr,
        })
    }

    pub fn active_path(&self) -> PathBuf {
        self.profile_path(&self.active_name)
    }

    pub fn profile_path(&self, name: &str) -> PathBuf {
        self.profiles_dir.join(format!("{name}.toml"))
    }

    pub fn reload(&mut self) -> Result<()> {
        self.profile = load_file(&self.active_path())?;
        Ok(())
    }

    /// Point `active` at `name`. Nothing changes if that profile fails to load.
    pub fn set_active(&mut self, name: &str) -> Result<()> {
        let p = self.profile_path(name);
        if !p.exists() {
            bail!("profile not found: {}", p.display());
        }
        let profile = load_file(&p)?;
        fs::write(&self.active_ptr, name.as_bytes())?;
        self.active_name = name.to_string();
        self.profile = profile;
        Ok(())
    }

    pub fn list_profiles(&self) -> Vec<String> {
        let mut v: Vec<String> = fs::read_dir(&self.profiles_dir)
            .into_iter()
            .flatten()
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "toml"))
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        v.sort();
        v
    }
}

/// Everything a profile resolves to, for `check`.
pub fn profile_report(profile: &Profile, source: &Path) -> Result<serde_json::Value> {
    let recognizer = profile.recognizer_config();
    let mapper = profile.mapper_config()?;
    let bindings: BTreeMap<&str, &GestureBinding> = mapper
        .bindings
        .iter()
        .map(|(g, b)| (g.as_str(), b))
        .collect();
    Ok(serde_json::json!({
        "source": source,
        "name": profile.meta.name,
        "thresholds": profile.thresholds,
        "stabilization": profile.stabilization,
        "cooldown_ms": recognizer.cooldown.as_millis() as u64,
        "controls": profile.controls,
        "globe": profile.globe,
        "bindings": bindings,
    }))
}
