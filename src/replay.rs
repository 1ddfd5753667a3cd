//! Runs recorded contact events (one JSON object per line) through an engine.

use anyhow::{Result, anyhow};
use log::{debug, info};
use serde::Serialize;
use std::{fs, path::Path};

use crate::contact::ContactEvent;
use crate::engine::{EngineConfig, GestureEngine};
use crate::gestures::{EngineWarning, GestureEvent, GestureSink, GestureState};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplayRecord {
    Gesture { line: usize, event: GestureEvent },
    Warning { line: usize, warning: EngineWarning },
    Rejected { line: usize, error: String },
}

#[derive(Debug, Default)]
struct ReplaySink {
    line: usize,
    records: Vec<ReplayRecord>,
}

impl GestureSink for ReplaySink {
    fn on_gesture(&mut self, event: GestureEvent) {
        self.records.push(ReplayRecord::Gesture {
            line: self.line,
            event,
        });
    }

    fn on_warning(&mut self, warning: EngineWarning) {
        self.records.push(ReplayRecord::Warning {
            line: self.line,
            warning,
        });
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayReport {
    pub records: Vec<ReplayRecord>,
    pub final_state: GestureState,
    pub live_contacts: usize,
}

impl ReplayReport {
    pub fn gestures(&self) -> impl Iterator<Item = &GestureEvent> {
        self.records.iter().filter_map(|r| match r {
            ReplayRecord::Gesture { event, .. } => Some(event),
            _ => None,
        })
    }
}

/// Blank lines and lines starting with `#` are skipped. A malformed line
/// aborts the replay; a rejected duplicate start is recorded and skipped.
pub fn replay_str(text: &str, config: EngineConfig) -> Result<ReplayReport> {
    let mut engine = GestureEngine::new(config, ReplaySink::default());

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let raw = raw.trim();
        if raw.is_empty() || raw.starts_with('#') {
            continue;
        }
        let event: ContactEvent = serde_json::from_str(raw)
            .map_err(|e| anyhow!("line {line}: invalid contact event: {e}"))?;
        debug!("line {line}: {event:?}");

        engine.sink_mut().line = line;
        if let Err(e) = engine.handle(event) {
            engine.sink_mut().records.push(ReplayRecord::Rejected {
                line,
                error: e.to_string(),
            });
        }
    }

    let final_state = engine.state();
    let live_contacts = engine.contacts().len();
    if live_contacts > 0 {
        info!("replay ended with {live_contacts} contact(s) still down ({final_state:?})");
    }
    Ok(ReplayReport {
        records: engine.into_sink().records,
        final_state,
        live_contacts,
    })
}

pub fn replay_file(path: &Path, config: EngineConfig) -> Result<ReplayReport> {
    let text = fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read {}: {e}", path.display()))?;
    replay_str(&text, config).map_err(|e| anyhow!("{}: {e}", path.display()))
}
