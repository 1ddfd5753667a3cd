use gesturectl::replay::{ReplayRecord, replay_str};
use gesturectl::{
    ContactSample, EngineConfig, EngineError, EngineWarning, Extent, GestureEngine, GestureEvent,
    GestureState, Point, Rect, Recorder, SwipeDirection, clamp_position,
};

#[test]
fn tap_swipe_pinch_session() {
    let script = r#"
# tap
{"kind":"start","id":1,"x":0,"y":0,"timestamp":0}
{"kind":"end","id":1,"timestamp":50}
# swipe right
{"kind":"start","id":1,"x":0,"y":0,"timestamp":1000}
{"kind":"move","id":1,"x":20,"y":0,"timestamp":1050}
{"kind":"end","id":1,"timestamp":1100}
# pinch out, then lift the second finger and the first
{"kind":"start","id":1,"x":0,"y":0,"timestamp":2000}
{"kind":"start","id":2,"x":10,"y":0,"timestamp":2000}
{"kind":"move","id":2,"x":20,"y":0,"timestamp":2016}
{"kind":"end","id":2,"timestamp":2032}
{"kind":"cancel","id":1,"timestamp":2048}
"#;
    let report = replay_str(script, EngineConfig::default()).unwrap();
    let gestures: Vec<GestureEvent> = report.gestures().copied().collect();
    assert_eq!(
        gestures,
        vec![
            GestureEvent::TapDetected,
            GestureEvent::SwipeDetected {
                dx: 20.0,
                dy: 0.0,
                duration_ms: 100
            },
            GestureEvent::PinchUpdated { scale: 2.0 },
            GestureEvent::PinchEnded,
        ]
    );
    assert_eq!(gestures[1].swipe_direction(), Some(SwipeDirection::Right));
    assert_eq!(report.final_state, GestureState::Idle);
}

#[test]
fn degenerate_pinch_reports_warning() {
    let script = r#"
{"kind":"start","id":1,"x":3,"y":3,"timestamp":0}
{"kind":"start","id":2,"x":3,"y":3,"timestamp":0}
{"kind":"move","id":1,"x":0,"y":0,"timestamp":10}
"#;
    let report = replay_str(script, EngineConfig::default()).unwrap();
    assert_eq!(
        report.records,
        vec![
            ReplayRecord::Warning {
                line: 4,
                warning: EngineWarning::DegeneratePinch {
                    first: 1,
                    second: 2
                }
            },
            ReplayRecord::Gesture {
                line: 4,
                event: GestureEvent::PinchUpdated { scale: 1.0 }
            },
        ]
    );
    assert_eq!(report.final_state, GestureState::Pinching);
    assert_eq!(report.live_contacts, 2);
}

#[test]
fn engine_behind_a_mutex() {
    use std::sync::{Arc, Mutex};

    let engine = Arc::new(Mutex::new(GestureEngine::new(
        EngineConfig::default(),
        Recorder::default(),
    )));
    let worker = {
        let engine = engine.clone();
        std::thread::spawn(move || {
            let mut e = engine.lock().unwrap();
            e.on_contact_start(ContactSample::new(1, 0.0, 0.0, 0)).unwrap();
            e.on_contact_end(1, 10);
        })
    };
    worker.join().unwrap();

    let mut e = engine.lock().unwrap();
    assert_eq!(e.sink().events, vec![GestureEvent::TapDetected]);
    assert_eq!(
        e.on_contact_start(ContactSample::new(1, 0.0, 0.0, 20)),
        Ok(())
    );
    assert_eq!(
        e.on_contact_start(ContactSample::new(1, 0.0, 0.0, 30)),
        Err(EngineError::DuplicateContact { id: 1 })
    );
    e.reset();
    assert_eq!(e.state(), GestureState::Idle);
}

#[test]
fn clamp_keeps_extent_inside() {
    let bounds = Rect {
        left: 0.0,
        top: 0.0,
        right: 200.0,
        bottom: 200.0,
    };
    let extent = Extent {
        width: 50.0,
        height: 50.0,
    };
    assert_eq!(
        clamp_position(Point::new(195.0, 195.0), bounds, extent),
        Point::new(150.0, 150.0)
    );
}
