//! Landmark source: JSON-lines frames from a file or stdin.
//!
//! Each non-blank line is either `null` (no hand) or an object
//! `{"t_ms": 33, "handedness": "Right", "landmarks": [[x, y, z], ...]}` where
//! `t_ms` and `handedness` are optional and `landmarks` may be `null`.

use anyhow::{Context, Result, anyhow};
use log::{trace, warn};
use serde::Deserialize;
use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};
use thiserror::Error;

use crate::landmarks::{FrameError, Handedness, LandmarkFrame, Point3};

#[derive(Debug, Deserialize)]
struct FrameRecord {
    #[serde(default)]
    t_ms: Option<u64>,
    #[serde(default)]
    handedness: Option<Handedness>,
    #[serde(default)]
    landmarks: Option<Vec<[f32; 3]>>,
}

#[derive(Debug, Error)]
pub enum LineError {
    /// Not JSON, or not the expected shape. The line can be skipped.
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
    /// Well-formed but violates the landmark contract.
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// One line of input.
#[derive(Debug, Clone, PartialEq)]
pub struct InputFrame {
    /// Capture time in milliseconds since the start of the stream.
    pub t_ms: Option<u64>,
    pub frame: Option<LandmarkFrame>,
}

pub fn parse_line(line: &str) -> Result<InputFrame, LineError> {
    let Some(record) = serde_json::from_str::<Option<FrameRecord>>(line)? else {
        return Ok(InputFrame {
            t_ms: None,
            frame: None,
        });
    };
    let frame = match record.landmarks {
        Some(lm) => {
            let points: Vec<Point3> = lm.iter().map(|&[x, y, z]| Point3::new(x, y, z)).collect();
            Some(LandmarkFrame::from_points(&points, record.handedness)?)
        }
        None => None,
    };
    Ok(InputFrame {
        t_ms: record.t_ms,
        frame,
    })
}

/// Iterates frames; malformed lines are logged and skipped, contract
/// violations end the stream with an error.
pub struct FrameReader<R> {
    lines: io::Lines<R>,
    line_no: usize,
    skipped: usize,
}

impl<R: BufRead> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            skipped: 0,
        }
    }

    /// Lines dropped because they were not valid frames.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl<R: BufRead> Iterator for FrameReader<R> {
    type Item = Result<InputFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(l) => l,
                Err(e) => return Some(Err(anyhow!("read failed after line {}: {e}", self.line_no))),
            };
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            match parse_line(&line) {
                Ok(f) => {
                    trace!("line {}: t_ms={:?} hand={}", self.line_no, f.t_ms, f.frame.is_some());
                    return Some(Ok(f));
                }
                Err(LineError::Malformed(e)) => {
                    warn!("line {}: skipping malformed frame: {e}", self.line_no);
                    self.skipped += 1;
                }
                Err(e @ LineError::Frame(_)) => {
                    return Some(Err(anyhow!(e).context(format!("line {}", self.line_no))));
                }
            }
        }
    }
}

/// `None` or `-` reads stdin.
pub fn open(path: Option<&Path>) -> Result<Box<dyn BufRead>> {
    match path {
        Some(p) if p != Path::new("-") => {
            let f = File::open(p).with_context(|| format!("failed to open {}", p.display()))?;
            Ok(Box::new(BufReader::new(f)))
        }
        _ => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}
