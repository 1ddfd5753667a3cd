//! Multi-contact gesture recognition.
//!
//! [`GestureEngine`] consumes abstract contact events (start, move, end,
//! cancel) from any input source and reports taps, swipes, pinches and drag
//! feedback to an injected [`GestureSink`]. The remaining modules adapt Linux
//! multitouch devices and recorded event files to that protocol.

pub mod config;
pub mod contact;
pub mod drag;
pub mod engine;
pub mod error;
pub mod gestures;
pub mod input;
pub mod pipeline;
pub mod replay;
pub mod tracker;

pub use contact::{Contact, ContactEvent, ContactId, ContactSample, ContactTable, Point};
pub use drag::{DragConstraint, Extent, Rect, clamp_position};
pub use engine::{EngineConfig, GestureEngine};
pub use error::EngineError;
pub use gestures::{
    EngineWarning, GestureEvent, GestureSink, GestureState, Recorder, SwipeDirection,
};
