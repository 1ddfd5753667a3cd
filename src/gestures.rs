//! Gesture events, engine states and the sink they are reported to.

use serde::Serialize;
use std::fmt;

use crate::contact::ContactId;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GestureEvent {
    TapDetected,
    SwipeDetected { dx: f32, dy: f32, duration_ms: u64 },
    PinchUpdated { scale: f32 },
    PinchEnded,
    DragUpdated { dx: f32, dy: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeDirection {
    Left,
    Right,
    Up,
    Down,
}

impl GestureEvent {
    /// Dominant axis wins; ties go horizontal. `None` for non-swipes.
    pub fn swipe_direction(&self) -> Option<SwipeDirection> {
        let GestureEvent::SwipeDetected { dx, dy, .. } = *self else {
            return None;
        };
        Some(if dx.abs() >= dy.abs() {
            if dx > 0.0 {
                SwipeDirection::Right
            } else {
                SwipeDirection::Left
            }
        } else if dy > 0.0 {
            SwipeDirection::Down
        } else {
            SwipeDirection::Up
        })
    }
}

impl fmt::Display for GestureEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GestureEvent::TapDetected => write!(f, "tap"),
            GestureEvent::SwipeDetected { dx, dy, duration_ms } => {
                write!(f, "swipe dx={dx:.1} dy={dy:.1} in {duration_ms}ms")
            }
            GestureEvent::PinchUpdated { scale } => write!(f, "pinch scale={scale:.3}"),
            GestureEvent::PinchEnded => write!(f, "pinch ended"),
            GestureEvent::DragUpdated { dx, dy } => write!(f, "drag dx={dx:.1} dy={dy:.1}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureState {
    #[default]
    Idle,
    SingleActive,
    Swiping,
    MultiActive,
    Pinching,
}

/// Non-fatal conditions the engine recovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineWarning {
    /// Pair started at the same point; scale is reported as 1.0.
    DegeneratePinch { first: ContactId, second: ContactId },
}

impl fmt::Display for EngineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineWarning::DegeneratePinch { first, second } => write!(
                f,
                "contacts {first} and {second} share a start point; pinch scale held at 1.0"
            ),
        }
    }
}

/// Receives everything the engine classifies.
pub trait GestureSink {
    fn on_gesture(&mut self, event: GestureEvent);

    fn on_warning(&mut self, _warning: EngineWarning) {}
}

impl<F> GestureSink for F
where
    F: FnMut(GestureEvent),
{
    fn on_gesture(&mut self, event: GestureEvent) {
        self(event)
    }
}

/// Collects events and warnings in arrival order.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    pub events: Vec<GestureEvent>,
    pub warnings: Vec<EngineWarning>,
}

impl GestureSink for Recorder {
    fn on_gesture(&mut self, event: GestureEvent) {
        self.events.push(event);
    }

    fn on_warning(&mut self, warning: EngineWarning) {
        self.warnings.push(warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn swipe(dx: f32, dy: f32) -> GestureEvent {
        GestureEvent::SwipeDetected {
            dx,
            dy,
            duration_ms: 0,
        }
    }

    #[test]
    fn swipe_direction_by_dominant_axis() {
        assert_eq!(swipe(20.0, 3.0).swipe_direction(), Some(SwipeDirection::Right));
        assert_eq!(swipe(-20.0, 3.0).swipe_direction(), Some(SwipeDirection::Left));
        assert_eq!(swipe(2.0, 30.0).swipe_direction(), Some(SwipeDirection::Down));
        assert_eq!(swipe(2.0, -30.0).swipe_direction(), Some(SwipeDirection::Up));
        assert_eq!(swipe(-15.0, 15.0).swipe_direction(), Some(SwipeDirection::Left));
        assert_eq!(GestureEvent::TapDetected.swipe_direction(), None);
    }

    #[test]
    fn serializes_with_kind_tag() {
        let v = serde_json::to_value(GestureEvent::PinchUpdated { scale: 2.0 }).unwrap();
        assert_eq!(v, serde_json::json!({"kind": "pinch_updated", "scale": 2.0}));
        let v = serde_json::to_value(GestureEvent::TapDetected).unwrap();
        assert_eq!(v, serde_json::json!({"kind": "tap_detected"}));
    }

    #[test]
    fn closures_are_sinks() {
        let mut seen = 0;
        {
            let mut sink = |_: GestureEvent| seen += 1;
            sink.on_gesture(GestureEvent::PinchEnded);
            sink.on_warning(EngineWarning::DegeneratePinch {
                first: 1,
                second: 2,
            });
        }
        assert_eq!(seen, 1);
    }
}
