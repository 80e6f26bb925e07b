//! In-memory gesture recording and playback.

use log::info;
use serde::Serialize;
use std::time::{Duration, Instant};

use crate::gestures::{Gesture, GestureParams, GestureType};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedGesture {
    pub kind: GestureType,
    pub params: GestureParams,
    /// Offset from the start of the recording.
    pub at_ms: u64,
}

impl RecordedGesture {
    /// Rebuild a gesture for the mapper. Confidence is not recorded.
    pub fn to_gesture(&self) -> Gesture {
        Gesture::new(self.kind, 1.0, self.params)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub gestures: Vec<RecordedGesture>,
}

#[derive(Debug, Default)]
pub struct GestureRecorder {
    started: Option<Instant>,
    current: Vec<RecordedGesture>,
    sessions: Vec<Session>,
    playback: Option<(usize, usize)>,
}

impl GestureRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_recording(&self) -> bool {
        self.started.is_some()
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_some()
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// Begin a fresh recording, discarding anything unsaved.
    pub fn start_recording(&mut self, now: Instant) {
        self.started = Some(now);
        self.current.clear();
        info!("recording started");
    }

    /// Stop recording; a non-empty take is saved as a new session.
    pub fn stop_recording(&mut self) -> Option<&Session> {
        self.started.take()?;
        if self.current.is_empty() {
            return None;
        }
        let gestures = std::mem::take(&mut self.current);
        info!("recording saved ({} gestures)", gestures.len());
        self.sessions.push(Session { gestures });
        self.sessions.last()
    }

    pub fn record(&mut self, gesture: &Gesture) {
        let Some(started) = self.started else {
            return;
        };
        let at = gesture.timestamp.saturating_duration_since(started);
        self.current.push(RecordedGesture {
            kind: gesture.kind,
            params: gesture.params,
            at_ms: duration_ms(at),
        });
    }

    /// Play back the most recently saved session. Returns `false` when there
    /// is nothing to play.
    pub fn start_playback(&mut self) -> bool {
        match self.sessions.len() {
            0 => false,
            n => {
                self.playback = Some((n - 1, 0));
                info!("playback started");
                true
            }
        }
    }

    pub fn stop_playback(&mut self) {
        if self.playback.take().is_some() {
            info!("playback stopped");
        }
    }

    /// Next gesture of the session being played; playback stops itself after
    /// the last one.
    pub fn next(&mut self) -> Option<RecordedGesture> {
        let (session, index) = self.playback?;
        let gestures = &self.sessions[session].gestures;
        let entry = gestures.get(index).cloned();
        if index + 1 >= gestures.len() {
            self.stop_playback();
        } else {
            self.playback = Some((session, index + 1));
        }
        entry
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
