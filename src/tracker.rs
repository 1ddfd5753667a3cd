//! Multitouch slot tracking (protocol B) turned into contact events.
//!
//! The kernel reports per-slot tracking ids and positions, then closes each
//! frame with SYN_REPORT. Changes are buffered per slot and flushed as
//! start/move/end events when the frame closes, so a new touch is started
//! with the position delivered in the same frame.

use crate::contact::{ContactEvent, ContactId, ContactSample};

const MAX_SLOTS: usize = 10;

#[derive(Debug, Clone, Default)]
struct SlotState {
    tracking_id: i32, // -1 = inactive
    x: f32,
    y: f32,
    active: bool,
    // pending for the current frame
    started: bool,
    moved: bool,
    ended: Option<i32>,
}

#[derive(Debug)]
pub struct Tracker {
    slots: Vec<SlotState>,
    cur_slot: usize,
    // device axis ranges
    x_min: i32,
    x_max: i32,
    y_min: i32,
    y_max: i32,
    // output surface
    width: f32,
    height: f32,
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new()
    }
}

impl Tracker {
    pub fn new() -> Self {
        Self {
            slots: vec![
                SlotState {
                    tracking_id: -1,
                    ..SlotState::default()
                };
                MAX_SLOTS
            ],
            cur_slot: 0,
            x_min: 0,
            x_max: 4096,
            y_min: 0,
            y_max: 4096,
            width: 4096.0,
            height: 4096.0,
        }
    }

    pub fn set_norm_ranges(&mut self, x_min: i32, x_max: i32, y_min: i32, y_max: i32) {
        self.x_min = x_min;
        self.x_max = x_max.max(x_min.saturating_add(1));
        self.y_min = y_min;
        self.y_max = y_max.max(y_min.saturating_add(1));
    }

    /// Size of the coordinate space contact positions are scaled into.
    pub fn set_surface(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.active).count()
    }

    /// Forgets every slot without emitting anything. Touches still down are
    /// ignored until they lift and a new tracking id arrives.
    pub fn reset(&mut self) {
        for s in self.slots.iter_mut() {
            *s = SlotState {
                tracking_id: -1,
                ..SlotState::default()
            };
        }
    }

    pub fn on_slot(&mut self, slot: i32) {
        self.cur_slot = slot.clamp(0, (self.slots.len() as i32) - 1) as usize;
    }

    pub fn on_tracking_id(&mut self, tracking_id: i32) {
        let s = &mut self.slots[self.cur_slot];
        if s.active && s.tracking_id != tracking_id {
            // release, or a new touch reusing the slot before its release was seen
            if s.started {
                // started and ended within one frame; the engine never saw it
                s.started = false;
            } else {
                s.ended = Some(s.tracking_id);
            }
            s.active = false;
            s.moved = false;
        }
        if tracking_id >= 0 && !s.active {
            s.tracking_id = tracking_id;
            s.active = true;
            s.started = true;
        } else if tracking_id < 0 {
            s.tracking_id = -1;
        }
    }

    pub fn on_pos_x(&mut self, raw: i32) {
        let x = normalize(raw, self.x_min, self.x_max) * self.width;
        let s = &mut self.slots[self.cur_slot];
        if s.x != x {
            s.x = x;
            s.moved = true;
        }
    }

    pub fn on_pos_y(&mut self, raw: i32) {
        let y = normalize(raw, self.y_min, self.y_max) * self.height;
        let s = &mut self.slots[self.cur_slot];
        if s.y != y {
            s.y = y;
            s.moved = true;
        }
    }

    /// Closes the frame. Ends come first so a reused id can start again.
    pub fn on_syn_report(&mut self, timestamp: u64) -> Vec<ContactEvent> {
        let mut out = Vec::new();

        for s in self.slots.iter_mut() {
            if let Some(old) = s.ended.take() {
                out.push(ContactEvent::End {
                    id: old as ContactId,
                    timestamp,
                });
            }
        }
        for s in self.slots.iter_mut() {
            if !s.active {
                s.started = false;
                s.moved = false;
                continue;
            }
            let sample = ContactSample::new(s.tracking_id as ContactId, s.x, s.y, timestamp);
            if s.started {
                out.push(ContactEvent::Start(sample));
            } else if s.moved {
                out.push(ContactEvent::Move(sample));
            }
            s.started = false;
            s.moved = false;
        }
        out
    }
}

/// Maps `raw` into 0..=1 over `min..max`; widened so full-range axes cannot overflow.
fn normalize(raw: i32, min: i32, max: i32) -> f32 {
    let span = (i64::from(max) - i64::from(min)).max(1);
    ((i64::from(raw) - i64::from(min)) as f64 / span as f64).clamp(0.0, 1.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> Tracker {
        let mut t = Tracker::new();
        // quarter scale keeps the arithmetic exact
        t.set_norm_ranges(0, 1024, 0, 1024);
        t.set_surface(256.0, 256.0);
        t
    }

    #[test]
    fn touch_down_move_up() {
        let mut t = tracker();
        t.on_slot(0);
        t.on_tracking_id(7);
        t.on_pos_x(40);
        t.on_pos_y(80);
        assert_eq!(
            t.on_syn_report(0),
            vec![ContactEvent::Start(ContactSample::new(7, 10.0, 20.0, 0))]
        );
        assert_eq!(t.active_count(), 1);

        t.on_pos_x(200);
        assert_eq!(
            t.on_syn_report(8),
            vec![ContactEvent::Move(ContactSample::new(7, 50.0, 20.0, 8))]
        );

        // unchanged position is not a move
        t.on_pos_x(200);
        assert!(t.on_syn_report(16).is_empty());

        t.on_tracking_id(-1);
        assert_eq!(
            t.on_syn_report(24),
            vec![ContactEvent::End {
                id: 7,
                timestamp: 24
            }]
        );
        assert_eq!(t.active_count(), 0);
    }

    #[test]
    fn second_slot_starts_independently() {
        let mut t = tracker();
        t.on_slot(0);
        t.on_tracking_id(1);
        t.on_pos_x(0);
        t.on_pos_y(0);
        t.on_syn_report(0);

        t.on_slot(1);
        t.on_tracking_id(2);
        t.on_pos_x(1024);
        t.on_pos_y(1024);
        assert_eq!(
            t.on_syn_report(5),
            vec![ContactEvent::Start(ContactSample::new(2, 256.0, 256.0, 5))]
        );
        assert_eq!(t.active_count(), 2);
    }

    #[test]
    fn reused_slot_ends_before_starting() {
        let mut t = tracker();
        t.on_slot(0);
        t.on_tracking_id(3);
        t.on_pos_x(40);
        t.on_pos_y(40);
        t.on_syn_report(0);

        t.on_tracking_id(4);
        t.on_pos_x(120);
        assert_eq!(
            t.on_syn_report(10),
            vec![
                ContactEvent::End {
                    id: 3,
                    timestamp: 10
                },
                ContactEvent::Start(ContactSample::new(4, 30.0, 10.0, 10)),
            ]
        );
    }

    #[test]
    fn full_i32_axis_range_does_not_overflow() {
        let mut t = Tracker::new();
        t.set_norm_ranges(i32::MIN, i32::MAX, i32::MIN, i32::MAX);
        t.set_surface(256.0, 256.0);
        t.on_tracking_id(1);
        t.on_pos_x(i32::MAX);
        t.on_pos_y(i32::MIN);
        assert_eq!(
            t.on_syn_report(0),
            vec![ContactEvent::Start(ContactSample::new(1, 256.0, 0.0, 0))]
        );

        // degenerate range collapses to a single-unit span
        t.set_norm_ranges(i32::MAX, i32::MAX, 0, 1024);
        t.on_pos_x(0);
        t.on_pos_x(i32::MAX);
        assert_eq!(
            t.on_syn_report(5),
            vec![ContactEvent::Move(ContactSample::new(1, 0.0, 0.0, 5))]
        );
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let mut t = tracker();
        t.on_slot(42);
        t.on_tracking_id(1);
        t.on_pos_x(-50);
        t.on_pos_y(5000);
        assert_eq!(
            t.on_syn_report(0),
            vec![ContactEvent::Start(ContactSample::new(1, 0.0, 256.0, 0))]
        );
    }
}
