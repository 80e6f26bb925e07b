//! Host loop: landmark source → smoother → recognizer → mapper → scene.

use anyhow::{Result, bail};
use log::{debug, error, info, warn};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use serde::Serialize;
use std::{
    io::{BufRead, Write},
    path::{Path, PathBuf},
    str::FromStr,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver},
    },
    time::{Duration, Instant},
};

use crate::{
    actions::{ControlAction, SceneController},
    config::{self, Profile},
    gestures::{Gesture, GestureType, Recognizer},
    input::{FrameReader, InputFrame},
    mapper::GestureMapper,
    recorder::GestureRecorder,
    scene::{BridgeMessage, GlobeScene, ObjectScene},
    smoother::TemporalSmoother,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SceneChoice {
    #[default]
    Object,
    Globe,
}

impl FromStr for SceneChoice {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "object" | "cube" => Ok(Self::Object),
            "globe" | "earth" => Ok(Self::Globe),
            other => bail!("unknown scene '{other}' (expected object or globe)"),
        }
    }
}

enum Scene {
    Object(ObjectScene),
    Globe(GlobeScene),
}

impl Scene {
    fn controller(&mut self) -> &mut dyn SceneController {
        match self {
            Scene::Object(s) => s as &mut dyn SceneController,
            Scene::Globe(s) => s,
        }
    }

    fn tick(&mut self, dt: Duration) {
        if let Scene::Object(s) = self {
            s.tick(dt);
        }
    }

    fn drain(&mut self) -> Vec<BridgeMessage> {
        match self {
            Scene::Object(_) => Vec::new(),
            Scene::Globe(s) => s.drain(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub scene: SceneChoice,
    pub record: bool,
    /// Play the recorded session back through the mapper once input ends.
    pub replay: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub scene: &'static str,
    pub frames: usize,
    pub hands: usize,
    pub gestures: usize,
    pub actions: usize,
    pub skipped_lines: usize,
    pub reloads: usize,
    pub replayed: usize,
    pub recent: Vec<GestureType>,
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum OutputLine<'a> {
    Action {
        t_ms: Option<u64>,
        gesture: GestureType,
        action: &'a ControlAction,
        replayed: bool,
    },
    Bridge {
        message: &'a BridgeMessage,
    },
}

/// Maps frame timestamps onto `Instant`s so recorded streams replay with
/// their original timing. Frames without `t_ms` use the wall clock.
struct Clock {
    origin: Instant,
    last: Option<Instant>,
}

impl Clock {
    fn at(&self, t_ms: Option<u64>) -> Instant {
        t_ms.map_or_else(Instant::now, |t| self.origin + Duration::from_millis(t))
    }

    /// Time since the previous frame; zero for the first one.
    fn advance(&mut self, now: Instant) -> Duration {
        let dt = self
            .last
            .map_or(Duration::ZERO, |prev| now.saturating_duration_since(prev));
        self.last = Some(now);
        dt
    }
}

pub struct Pipeline {
    smoother: TemporalSmoother,
    recognizer: Recognizer,
    mapper: GestureMapper,
    scene: Scene,
    recorder: GestureRecorder,
    options: RunOptions,
    clock: Clock,
    summary: RunSummary,
}

impl Pipeline {
    pub fn new(profile: &Profile, options: RunOptions) -> Result<Self> {
        let scene = match options.scene {
            SceneChoice::Object => Scene::Object(ObjectScene::default()),
            SceneChoice::Globe => Scene::Globe(GlobeScene::new(profile.globe_config())),
        };
        Ok(Self {
            smoother: TemporalSmoother::new(profile.smoothing_window()),
            recognizer: Recognizer::new(profile.recognizer_config()),
            mapper: GestureMapper::new(profile.mapper_config()?),
            scene,
            recorder: GestureRecorder::new(),
            options,
            clock: Clock {
                origin: Instant::now(),
                last: None,
            },
            summary: RunSummary::default(),
        })
    }

    pub fn mapper_mut(&mut self) -> &mut GestureMapper {
        &mut self.mapper
    }

    /// Swap in a new profile. Counts as a detection gap.
    pub fn apply_profile(&mut self, profile: &Profile) -> Result<()> {
        let mapper = profile.mapper_config()?;
        self.mapper.set_config(mapper);
        self.recognizer.set_config(profile.recognizer_config());
        self.smoother = TemporalSmoother::new(profile.smoothing_window());
        if let Scene::Globe(g) = &mut self.scene {
            g.set_config(profile.globe_config());
        }
        Ok(())
    }

    /// Run one input frame through the whole chain, writing any resulting
    /// action to `out`.
    pub fn process<W: Write>(&mut self, input: &InputFrame, out: &mut W) -> Result<()> {
        self.summary.frames += 1;
        let now = self.clock.at(input.t_ms);
        let dt = self.clock.advance(now);
        self.scene.tick(dt);

        let smoothed = match &input.frame {
            Some(raw) => {
                self.summary.hands += 1;
                Some(self.smoother.push(raw.clone()))
            }
            None => {
                self.smoother.reset();
                None
            }
        };

        let gesture = match input.t_ms {
            Some(_) => self.recognizer.recognize_at(smoothed.as_ref(), now),
            None => self.recognizer.recognize(smoothed.as_ref()),
        };
        let Some(gesture) = gesture else {
            return Ok(());
        };
        self.summary.gestures += 1;
        self.recorder.record(&gesture);
        self.dispatch(&gesture, input.t_ms, false, out)
    }

    fn dispatch<W: Write>(
        &mut self,
        gesture: &Gesture,
        t_ms: Option<u64>,
        replayed: bool,
        out: &mut W,
    ) -> Result<()> {
        let Some(action) = self.mapper.map(gesture) else {
            debug!("{} not mapped (disabled)", gesture.kind);
            return Ok(());
        };
        debug!("{} -> {:?}", gesture.kind, action);
        self.scene.controller().apply(&action);
        self.summary.actions += 1;

        write_line(
            out,
            &OutputLine::Action {
                t_ms,
                gesture: gesture.kind,
                action: &action,
                replayed,
            },
        )?;
        for message in self.scene.drain() {
            write_line(out, &OutputLine::Bridge { message: &message })?;
        }
        out.flush()?;
        Ok(())
    }

    fn reload(&mut self, path: &Path) {
        let result = config::load_file(path).and_then(|p| self.apply_profile(&p));
        match result {
            Ok(()) => {
                self.summary.reloads += 1;
                info!("profile reloaded from {}", path.display());
            }
            Err(e) => error!("reload failed, keeping previous profile: {e:#}"),
        }
    }

    /// Drive the pipeline until input ends or `stop` is raised.
    pub fn run<R: BufRead, W: Write>(
        mut self,
        mut frames: FrameReader<R>,
        out: &mut W,
        stop: &AtomicBool,
        watch: Option<&ProfileWatcher>,
    ) -> Result<RunSummary> {
        self.summary.scene = self.scene.controller().name();
        info!("pipeline started (scene: {})", self.summary.scene);
        if self.options.record {
            self.recorder.start_recording(self.clock.origin);
        }

        while !stop.load(Ordering::Relaxed) {
            if let Some(w) = watch {
                if w.changed() {
                    self.reload(w.path());
                }
            }
            let Some(next) = frames.next() else {
                break;
            };
            self.process(&next?, out)?;
        }
        if stop.load(Ordering::Relaxed) {
            info!("stop requested");
        }
        self.summary.skipped_lines = frames.skipped();

        if self.options.record {
            self.recorder.stop_recording();
        }
        if self.options.replay {
            self.replay(out)?;
        }

        self.summary.recent = self.recognizer.recent().map(|g| g.kind).collect();
        let s = &self.summary;
        info!(
            "pipeline stopped: {} frames, {} with hand, {} gestures, {} actions",
            s.frames, s.hands, s.gestures, s.actions
        );
        Ok(self.summary)
    }

    fn replay<W: Write>(&mut self, out: &mut W) -> Result<()> {
        if !self.recorder.start_playback() {
            warn!("nothing recorded to replay");
            return Ok(());
        }
        while let Some(entry) = self.recorder.next() {
            self.summary.replayed += 1;
            self.dispatch(&entry.to_gesture(), Some(entry.at_ms), true, out)?;
        }
        Ok(())
    }
}

fn write_line<W: Write>(out: &mut W, line: &OutputLine<'_>) -> Result<()> {
    serde_json::to_writer(&mut *out, line)?;
    out.write_all(b"\n")?;
    Ok(())
}

/// Watches one profile file for changes.
pub struct ProfileWatcher {
    path: PathBuf,
    rx: Receiver<notify::Result<notify::Event>>,
    _watcher: RecommendedWatcher,
}

impl ProfileWatcher {
    pub fn new(path: &Path) -> Result<Self> {
        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(tx)?;
        // editors often replace the file, so watch its directory
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        info!("watching {} for changes", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            rx,
            _watcher: watcher,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True if the file was written since the last call.
    pub fn changed(&self) -> bool {
        let mut hit = false;
        while let Ok(res) = self.rx.try_recv() {
            match res {
                Ok(ev) => {
                    let relevant = ev.kind.is_modify() || ev.kind.is_create();
                    if relevant && ev.paths.iter().any(|p| p.file_name() == self.path.file_name()) {
                        hit = true;
                    }
                }
                Err(e) => warn!("profile watch error: {e}"),
            }
        }
        hit
    }
}
