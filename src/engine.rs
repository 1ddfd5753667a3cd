//! Contact table plus the tap/swipe/pinch state machine.
//!
//! The table size drives everything: one live contact is classified as a
//! tap or swipe, two or more as a pinch over the two lowest ids. State is
//! recomputed on every start and end, never carried over from an earlier
//! decision, so a contact joining a swipe turns it into a pinch at once.

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use crate::contact::{Contact, ContactEvent, ContactId, ContactSample, ContactTable, Point};
use crate::drag::{DragConstraint, Extent, Rect};
use crate::error::EngineError;
use crate::gestures::{EngineWarning, GestureEvent, GestureSink, GestureState};

pub const DEFAULT_SWIPE_THRESHOLD_PX: f32 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// A lone contact becomes a swipe once `max(|dx|, |dy|)` exceeds this.
    pub swipe_threshold_px: f32,
    /// Emit `DragUpdated` on every move after a swipe has started.
    pub continuous_swipe_feedback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drag_bounds: Option<Rect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drag_extent: Option<Extent>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            swipe_threshold_px: DEFAULT_SWIPE_THRESHOLD_PX,
            continuous_swipe_feedback: false,
            drag_bounds: None,
            drag_extent: None,
        }
    }
}

impl EngineConfig {
    /// Clamp applied to drag feedback; needs both bounds and extent.
    pub fn drag_constraint(&self) -> Option<DragConstraint> {
        match (self.drag_bounds, self.drag_extent) {
            (Some(bounds), Some(extent)) => Some(DragConstraint { bounds, extent }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PinchPair {
    first: ContactId,
    second: ContactId,
    start_distance: f32,
    warned: bool,
}

impl PinchPair {
    fn contains(&self, id: ContactId) -> bool {
        self.first == id || self.second == id
    }
}

pub struct GestureEngine<S: GestureSink> {
    config: EngineConfig,
    contacts: ContactTable,
    state: GestureState,
    pair: Option<PinchPair>,
    // lone contact left behind by a multi-contact gesture; never reported as a tap
    residual: bool,
    sink: S,
}

impl<S: GestureSink> GestureEngine<S> {
    pub fn new(config: EngineConfig, sink: S) -> Self {
        Self {
            config,
            contacts: ContactTable::new(),
            state: GestureState::Idle,
            pair: None,
            residual: false,
            sink,
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn contacts(&self) -> &ContactTable {
        &self.contacts
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Takes effect from the next event; live contacts keep their baselines.
    pub fn set_config(&mut self, config: EngineConfig) {
        self.config = config;
    }

    /// Ids of the contacts whose distance drives the pinch scale.
    pub fn pinch_pair(&self) -> Option<(ContactId, ContactId)> {
        self.pair.map(|p| (p.first, p.second))
    }

    pub fn pinch_start_distance(&self) -> Option<f32> {
        self.pair.map(|p| p.start_distance)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn handle(&mut self, event: ContactEvent) -> Result<(), EngineError> {
        match event {
            ContactEvent::Start(s) => return self.on_contact_start(s),
            ContactEvent::Move(s) => self.on_contact_move(s),
            ContactEvent::End { id, timestamp } => self.on_contact_end(id, timestamp),
            ContactEvent::Cancel { id, timestamp } => self.on_contact_cancel(id, timestamp),
        }
        Ok(())
    }

    pub fn on_contact_start(&mut self, sample: ContactSample) -> Result<(), EngineError> {
        if !self.contacts.insert(&sample) {
            warn!("rejected duplicate start for live contact {}", sample.id);
            return Err(EngineError::DuplicateContact { id: sample.id });
        }
        self.residual = false;

        if self.contacts.len() == 1 {
            self.set_state(GestureState::SingleActive);
        } else {
            self.refresh_pair();
            self.set_state(GestureState::MultiActive);
        }
        Ok(())
    }

    /// Moves for unknown ids are late deliveries and are ignored.
    pub fn on_contact_move(&mut self, sample: ContactSample) {
        let Some(contact) = self.contacts.get_mut(sample.id) else {
            trace!("dropping move for unknown contact {}", sample.id);
            return;
        };
        contact.current_position = sample.position();

        if self.contacts.len() == 1 {
            self.track_single();
        } else {
            self.track_pinch();
        }
    }

    /// Ends for unknown ids are ignored.
    pub fn on_contact_end(&mut self, id: ContactId, timestamp: u64) {
        let Some(removed) = self.contacts.remove(id) else {
            trace!("dropping end for unknown contact {id}");
            return;
        };
        let was_pair = self.pair.is_some_and(|p| p.contains(id));

        match self.contacts.len() {
            0 => {
                self.finish_single(&removed, timestamp);
                self.pair = None;
                self.residual = false;
                self.set_state(GestureState::Idle);
            }
            1 => {
                if self.state == GestureState::Pinching && was_pair {
                    self.sink.on_gesture(GestureEvent::PinchEnded);
                }
                self.pair = None;
                if let Some(rest) = self.contacts.single_mut() {
                    rest.rebaseline(timestamp);
                }
                self.residual = true;
                self.set_state(GestureState::SingleActive);
            }
            _ => {
                if was_pair {
                    self.refresh_pair();
                    self.set_state(GestureState::MultiActive);
                }
            }
        }
    }

    /// Platform cancellation; classified exactly like an end.
    pub fn on_contact_cancel(&mut self, id: ContactId, timestamp: u64) {
        self.on_contact_end(id, timestamp);
    }

    /// Drops every contact and returns to `Idle`. Emits nothing.
    pub fn reset(&mut self) {
        if !self.contacts.is_empty() {
            debug!("reset with {} live contact(s)", self.contacts.len());
        }
        self.contacts.clear();
        self.pair = None;
        self.residual = false;
        self.set_state(GestureState::Idle);
    }

    fn set_state(&mut self, next: GestureState) {
        if self.state != next {
            debug!("gesture state {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    /// Re-selects the two lowest ids. An unchanged pair keeps its baseline.
    fn refresh_pair(&mut self) {
        let Some((first, second)) = self.contacts.lowest_pair() else {
            self.pair = None;
            return;
        };
        if self
            .pair
            .is_some_and(|p| p.first == first && p.second == second)
        {
            return;
        }

        let start_distance = match (self.contacts.get(first), self.contacts.get(second)) {
            (Some(a), Some(b)) => a.start_position.distance(b.start_position),
            _ => 0.0,
        };
        debug!("pinch pair ({first}, {second}) baseline {start_distance:.2}");
        self.pair = Some(PinchPair {
            first,
            second,
            start_distance,
            warned: false,
        });
    }

    fn track_single(&mut self) {
        let Some(contact) = self.contacts.single_mut() else {
            return;
        };
        let start = contact.start_position;
        let (dx, dy) = contact.delta();
        match self.state {
            GestureState::SingleActive => {
                if dx.abs().max(dy.abs()) > self.config.swipe_threshold_px {
                    self.set_state(GestureState::Swiping);
                }
            }
            GestureState::Swiping if self.config.continuous_swipe_feedback => {
                let (dx, dy) = match self.config.drag_constraint() {
                    Some(c) => {
                        let clamped = c.clamp(Point::new(start.x + dx, start.y + dy));
                        (clamped.x - start.x, clamped.y - start.y)
                    }
                    None => (dx, dy),
                };
                self.sink.on_gesture(GestureEvent::DragUpdated { dx, dy });
            }
            _ => {}
        }
    }

    fn track_pinch(&mut self) {
        let Some(mut pair) = self.pair else {
            return;
        };
        let current = match (self.contacts.get(pair.first), self.contacts.get(pair.second)) {
            (Some(a), Some(b)) => a.current_position.distance(b.current_position),
            _ => return,
        };

        let scale = if pair.start_distance == 0.0 {
            if !pair.warned {
                pair.warned = true;
                let warning = EngineWarning::DegeneratePinch {
                    first: pair.first,
                    second: pair.second,
                };
                warn!("{warning}");
                self.sink.on_warning(warning);
            }
            1.0
        } else {
            current / pair.start_distance
        };
        self.pair = Some(pair);

        self.set_state(GestureState::Pinching);
        self.sink.on_gesture(GestureEvent::PinchUpdated { scale });
    }

    fn finish_single(&mut self, removed: &Contact, timestamp: u64) {
        match self.state {
            GestureState::Swiping => {
                let (dx, dy) = removed.delta();
                self.sink.on_gesture(GestureEvent::SwipeDetected {
                    dx,
                    dy,
                    duration_ms: timestamp.saturating_sub(removed.start_time),
                });
            }
            GestureState::SingleActive if !self.residual => {
                self.sink.on_gesture(GestureEvent::TapDetected);
            }
            _ => {}
        }
    }
}
