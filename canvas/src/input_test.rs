#![allow(clippy::float_cmp)]

use uuid::Uuid;

use super::*;

#[test]
fn default_state_is_idle() {
    assert!(InputState::default().is_idle());
    assert_eq!(InputState::default().marquee_rect(), None);
}

#[test]
fn marquee_rect_is_normalized() {
    let state = InputState::Marquee { anchor: Point::new(50.0, 40.0), current: Point::new(10.0, 60.0), base: vec![] };
    assert_eq!(state.marquee_rect(), Some(Rect::new(10.0, 40.0, 40.0, 20.0)));
}

#[test]
fn dragging_is_not_idle() {
    let state = InputState::DraggingLayer {
        id: Uuid::new_v4(),
        start: Point::new(0.0, 0.0),
        orig_x_pct: 50.0,
        orig_y_pct: 50.0,
        container: Rect::new(0.0, 0.0, 100.0, 100.0),
    };
    assert!(!state.is_idle());
    assert_eq!(state.marquee_rect(), None);
}

#[test]
fn drag_pct_converts_pixels_to_percent() {
    // +10% of an 800px container.
    assert_eq!(drag_pct(50.0, 80.0, 800.0), 60.0);
}

#[test]
fn drag_pct_clamps_to_canvas() {
    assert_eq!(drag_pct(95.0, 400.0, 800.0), 100.0);
    assert_eq!(drag_pct(5.0, -400.0, 800.0), 0.0);
}

#[test]
fn drag_pct_with_empty_container_keeps_origin() {
    assert_eq!(drag_pct(42.0, 10.0, 0.0), 42.0);
}

#[test]
fn delete_keys() {
    assert!(Key("Delete".into()).is_delete());
    assert!(Key("Backspace".into()).is_delete());
    assert!(!Key("Enter".into()).is_delete());
    assert!(Key("Escape".into()).is("Escape"));
}
