//! Contacts and the table of currently active contacts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier issued by the input source, unique among live contacts.
pub type ContactId = u32;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// One raw sample as delivered by the input source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactSample {
    pub id: ContactId,
    pub x: f32,
    pub y: f32,
    pub timestamp: u64,
}

impl ContactSample {
    pub fn new(id: ContactId, x: f32, y: f32, timestamp: u64) -> Self {
        Self { id, x, y, timestamp }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// The four entry calls of the engine as data, so sources can queue them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContactEvent {
    Start(ContactSample),
    Move(ContactSample),
    End { id: ContactId, timestamp: u64 },
    Cancel { id: ContactId, timestamp: u64 },
}

impl ContactEvent {
    pub fn id(&self) -> ContactId {
        match self {
            ContactEvent::Start(s) | ContactEvent::Move(s) => s.id,
            ContactEvent::End { id, .. } | ContactEvent::Cancel { id, .. } => *id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
    pub id: ContactId,
    pub start_position: Point,
    pub current_position: Point,
    pub start_time: u64,
}

impl Contact {
    fn from_sample(s: &ContactSample) -> Self {
        Self {
            id: s.id,
            start_position: s.position(),
            current_position: s.position(),
            start_time: s.timestamp,
        }
    }

    /// Displacement from the baseline.
    pub fn delta(&self) -> (f32, f32) {
        (
            self.current_position.x - self.start_position.x,
            self.current_position.y - self.start_position.y,
        )
    }

    /// Makes the current position the new baseline.
    pub(crate) fn rebaseline(&mut self, timestamp: u64) {
        self.start_position = self.current_position;
        self.start_time = timestamp;
    }
}

/// Live contacts keyed by id. Ordered so the lowest ids come first.
#[derive(Debug, Clone, Default)]
pub struct ContactTable {
    contacts: BTreeMap<ContactId, Contact>,
}

impl ContactTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn contains(&self, id: ContactId) -> bool {
        self.contacts.contains_key(&id)
    }

    pub fn get(&self, id: ContactId) -> Option<&Contact> {
        self.contacts.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: ContactId) -> Option<&mut Contact> {
        self.contacts.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Contact> {
        self.contacts.values()
    }

    /// Returns false and leaves the table alone if the id is already live.
    pub(crate) fn insert(&mut self, sample: &ContactSample) -> bool {
        if self.contacts.contains_key(&sample.id) {
            return false;
        }
        self.contacts.insert(sample.id, Contact::from_sample(sample));
        true
    }

    pub(crate) fn remove(&mut self, id: ContactId) -> Option<Contact> {
        self.contacts.remove(&id)
    }

    pub(crate) fn clear(&mut self) {
        self.contacts.clear();
    }

    /// The lone contact when exactly one is live.
    pub(crate) fn single_mut(&mut self) -> Option<&mut Contact> {
        if self.contacts.len() == 1 {
            self.contacts.values_mut().next()
        } else {
            None
        }
    }

    /// The two lowest live ids.
    pub fn lowest_pair(&self) -> Option<(ContactId, ContactId)> {
        let mut ids = self.contacts.keys().copied();
        match (ids.next(), ids.next()) {
            (Some(a), Some(b)) => Some((a, b)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_rejects_live_id() {
        let mut t = ContactTable::new();
        assert!(t.insert(&ContactSample::new(1, 0.0, 0.0, 0)));
        assert!(!t.insert(&ContactSample::new(1, 5.0, 5.0, 10)));
        assert_eq!(t.len(), 1);
        assert_eq!(t.get(1).unwrap().start_position, Point::new(0.0, 0.0));
    }

    #[test]
    fn lowest_pair_ignores_insertion_order() {
        let mut t = ContactTable::new();
        t.insert(&ContactSample::new(7, 0.0, 0.0, 0));
        assert_eq!(t.lowest_pair(), None);
        t.insert(&ContactSample::new(3, 0.0, 0.0, 0));
        t.insert(&ContactSample::new(5, 0.0, 0.0, 0));
        assert_eq!(t.lowest_pair(), Some((3, 5)));
        t.remove(3);
        assert_eq!(t.lowest_pair(), Some((5, 7)));
    }

    #[test]
    fn contact_event_json_shape() {
        let ev: ContactEvent =
            serde_json::from_str(r#"{"kind":"start","id":4,"x":1.5,"y":2.0,"timestamp":9}"#)
                .unwrap();
        assert_eq!(ev, ContactEvent::Start(ContactSample::new(4, 1.5, 2.0, 9)));

        let ev: ContactEvent =
            serde_json::from_str(r#"{"kind":"cancel","id":4,"timestamp":12}"#).unwrap();
        assert_eq!(ev, ContactEvent::Cancel { id: 4, timestamp: 12 });
        assert_eq!(ev.id(), 4);
    }

    #[test]
    fn distance_is_euclidean() {
        assert_eq!(Point::new(0.0, 0.0).distance(Point::new(3.0, 4.0)), 5.0);
    }
}
