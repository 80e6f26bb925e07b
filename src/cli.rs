use anyhow::{Context, Result, anyhow, bail};
use log::info;
use pico_args::Arguments;
use signal_hook::consts::{SIGINT, SIGTERM};
use std::{
    env, io,
    path::PathBuf,
    sync::{Arc, atomic::AtomicBool},
};

use crate::{
    config::{self, ConfigState, Profile},
    input::{self, FrameReader},
    mapper::GestureMapper,
    pipeline::{Pipeline, ProfileWatcher, RunOptions, SceneChoice},
};

pub fn run() -> Result<()> {
    let mut pargs = Arguments::from_env();

    if env::args().len() == 1 {
        print_help();
        return Ok(());
    }

    if pargs.contains("-h") || pargs.contains("--help") {
        print_help();
        return Ok(());
    }

    let subcmd: Option<String> = pargs.free_from_str().ok();

    match subcmd.as_deref() {
        Some("help") => {
            let topic: Option<String> = pargs.free_from_str().ok();
            if let Some(t) = topic {
                print_subcmd_help(&t);
            } else {
                print_help();
            }
            Ok(())
        }

        Some("run") => {
            let input: Option<PathBuf> = pargs.opt_value_from_str("--input")?;
            let scene: SceneChoice = pargs.opt_value_from_str("--scene")?.unwrap_or_default();
            let source = ProfileSource::from_args(&mut pargs)?;
            let watch = pargs.contains("--watch");
            let record = pargs.contains("--record");
            let replay = pargs.contains("--replay");
            let enable: Vec<String> = pargs.values_from_str("--enable")?;
            let disable: Vec<String> = pargs.values_from_str("--disable")?;
            finish(pargs)?;

            if replay && !record {
                bail!("--replay needs --record");
            }
            let (profile, path) = source.load()?;
            let options = RunOptions {
                scene,
                record,
                replay,
            };
            let toggles = Toggles { enable, disable };
            run_pipeline(&profile, &path, input, options, &toggles, watch)
        }

        Some("mappings") => {
            let source = ProfileSource::from_args(&mut pargs)?;
            finish(pargs)?;
            let (profile, path) = source.load()?;
            let mapper = GestureMapper::new(profile.mapper_config()?);
            println!("profile: {}", path.display());
            for row in mapper.describe() {
                println!("  {row}");
            }
            Ok(())
        }

        Some("actions") => {
            finish(pargs)?;
            let mapper = GestureMapper::new(Default::default());
            for a in mapper.available_actions() {
                println!("{a}");
            }
            Ok(())
        }

        Some("list") => {
            finish(pargs)?;
            let state = ConfigState::load_or_install_default()?;
            let list: Vec<String> = state
                .list_profiles()
                .into_iter()
                .map(|p| {
                    if p == state.active_name {
                        format!("{p} *")
                    } else {
                        p
                    }
                })
                .collect();
            print_response(&serde_json::json!({
                "profiles": list,
                "active": state.active_name,
                "dir": state.profiles_dir,
            }));
            Ok(())
        }

        Some("use") => {
            let name: String = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: gesturectl use <profile_name>"))?;
            finish(pargs)?;
            let mut state = ConfigState::load_or_install_default()?;
            state.set_active(&name)?;
            print_response(&serde_json::json!({"active_profile": state.active_name}));
            Ok(())
        }

        Some("check") => {
            let source = ProfileSource::from_args(&mut pargs)?;
            finish(pargs)?;
            let (profile, path) = source.load()?;
            print_response(&config::profile_report(&profile, &path)?);
            Ok(())
        }

        Some(other) => {
            eprintln!("unknown subcommand: {other}\n");
            print_help();
            Ok(())
        }

        None => {
            print_help();
            Ok(())
        }
    }
}

enum ProfileSource {
    Active,
    Named(String),
    File(PathBuf),
}

impl ProfileSource {
    fn from_args(pargs: &mut Arguments) -> Result<Self> {
        let name: Option<String> = pargs.opt_value_from_str("--profile")?;
        let file: Option<PathBuf> = pargs.opt_value_from_str("--profile-file")?;
        match (name, file) {
            (Some(_), Some(_)) => bail!("--profile and --profile-file are mutually exclusive"),
            (Some(n), None) => Ok(Self::Named(n)),
            (None, Some(f)) => Ok(Self::File(f)),
            (None, None) => Ok(Self::Active),
        }
    }

    fn load(self) -> Result<(Profile, PathBuf)> {
        match self {
            Self::File(path) => Ok((config::load_file(&path)?, path)),
            Self::Active => {
                let state = ConfigState::load_or_install_default()?;
                let path = state.active_path();
                Ok((state.profile, path))
            }
            Self::Named(name) => {
                let state = ConfigState::load_or_install_default()?;
                let path = state.profile_path(&name);
                Ok((config::load_file(&path)?, path))
            }
        }
    }
}

/// Per-run gesture switches applied on top of the profile.
struct Toggles {
    enable: Vec<String>,
    disable: Vec<String>,
}

fn run_pipeline(
    profile: &Profile,
    profile_path: &std::path::Path,
    input: Option<PathBuf>,
    options: RunOptions,
    toggles: &Toggles,
    watch: bool,
) -> Result<()> {
    let stop = Arc::new(AtomicBool::new(false));
    for sig in [SIGINT, SIGTERM] {
        signal_hook::flag::register(sig, Arc::clone(&stop))
            .context("failed to install signal handler")?;
    }

    let watcher = if watch {
        Some(ProfileWatcher::new(profile_path)?)
    } else {
        None
    };

    let reader = FrameReader::new(input::open(input.as_deref())?);
    let mut pipeline = Pipeline::new(profile, options)?;
    for name in &toggles.enable {
        pipeline.mapper_mut().enable(name)?;
    }
    for name in &toggles.disable {
        pipeline.mapper_mut().disable(name)?;
    }
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let summary = pipeline.run(reader, &mut out, &stop, watcher.as_ref())?;
    info!("summary: {}", serde_json::to_string(&summary)?);
    Ok(())
}

fn finish(pargs: Arguments) -> Result<()> {
    let rest = pargs.finish();
    if !rest.is_empty() {
        bail!("unexpected arguments: {rest:?}");
    }
    Ok(())
}

fn print_help() {
    println!(
        r#"gesturectl - hand gesture recognition for 3D scene control

USAGE:
  gesturectl help [command]        Show general or command-specific help
  gesturectl run [options]         Recognize gestures from JSON-lines landmark frames
  gesturectl mappings [--profile NAME | --profile-file PATH]
                                   Show the gesture -> action table
  gesturectl actions               List the action vocabulary
  gesturectl list                  List profiles
  gesturectl use <name>            Switch active profile
  gesturectl check [--profile NAME | --profile-file PATH]
                                   Validate a profile and print what it resolves to

TIPS:
  - Profiles: ~/.config/gesturectl/profiles
  - Active profile pointer: ~/.config/gesturectl/active
  - RUST_LOG=debug shows every gesture and action
"#
    );
}

fn print_subcmd_help(cmd: &str) {
    match cmd {
        "run" => println!(
            "usage: gesturectl run [--input FILE] [--scene object|globe]\n\
             \x20                     [--profile NAME | --profile-file PATH]\n\
             \x20                     [--watch] [--record [--replay]]\n\
             \x20                     [--enable GESTURE]... [--disable GESTURE]...\n\
             Reads frames from FILE (stdin if omitted or '-'), one per line:\n\
             \x20 null | {{\"t_ms\": 33, \"handedness\": \"Right\", \"landmarks\": [[x, y, z], ...21]}}\n\
             Writes actions (and globe bridge messages) to stdout as JSON lines.\n\
             --watch reloads the profile when it changes; the last good profile is kept on error.\n\
             --record keeps confirmed gestures; --replay plays them back once input ends."
        ),
        "mappings" => println!(
            "usage: gesturectl mappings [--profile NAME | --profile-file PATH]\nShows each gesture, its bound action, and whether it is enabled."
        ),
        "actions" => println!("usage: gesturectl actions\nLists every action a gesture can be bound to."),
        "list" => {
            println!("usage: gesturectl list\nLists available profiles; marks active with '*'.")
        }
        "use" => println!("usage: gesturectl use <name>\nSwitches active profile to <name>."),
        "check" => println!(
            "usage: gesturectl check [--profile NAME | --profile-file PATH]\nValidates a profile and prints thresholds, stabilization and bindings."
        ),
        _ => {
            eprintln!("unknown command: {cmd}\n");
            print_help();
        }
    }
}

fn print_response(v: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(v).unwrap_or_default());
}
