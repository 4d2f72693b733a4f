#![allow(clippy::float_cmp)]

use uuid::Uuid;

use super::*;
use crate::doc::{Layer, ShapeKind};
use crate::hit::HitMask;

// =============================================================
// Helpers
// =============================================================

/// Container sits at (100, 50) on screen and is 1000x500.
const ORIGIN: (f64, f64) = (100.0, 50.0);

fn screen(x: f64, y: f64) -> Point {
    Point::new(ORIGIN.0 + x, ORIGIN.1 + y)
}

fn layer_at(x_pct: f64, y_pct: f64) -> Layer {
    let mut layer = Layer::shape(ShapeKind::Rectangle);
    layer.x_pct = x_pct;
    layer.y_pct = y_pct;
    layer.width_pct = 10.0;
    layer.height_pct = 10.0;
    layer
}

fn text_at(x_pct: f64, y_pct: f64, text: &str) -> Layer {
    let mut layer = Layer::text(text);
    layer.x_pct = x_pct;
    layer.y_pct = y_pct;
    layer.width_pct = 20.0;
    layer.height_pct = 10.0;
    layer
}

fn engine_with(layers: Vec<Layer>) -> EngineCore {
    let mut doc = Document::new("bg.png");
    doc.layers = layers;
    let mut engine = EngineCore::new(doc);
    engine.set_container(Rect::new(ORIGIN.0, ORIGIN.1, 1000.0, 500.0));
    engine
}

fn no_mods() -> Modifiers {
    Modifiers::default()
}

fn shift() -> Modifiers {
    Modifiers { shift: true, ..Modifiers::default() }
}

fn click(engine: &mut EngineCore, x: f64, y: f64, modifiers: Modifiers) -> Vec<Action> {
    let mut actions = engine.on_pointer_down(screen(x, y), Button::Primary, modifiers);
    actions.extend(engine.on_pointer_up(screen(x, y), Button::Primary, modifiers));
    actions
}

fn drag(engine: &mut EngineCore, from: (f64, f64), to: (f64, f64)) -> Vec<Action> {
    let mut actions = engine.on_pointer_down(screen(from.0, from.1), Button::Primary, no_mods());
    actions.extend(engine.on_pointer_move(screen(to.0, to.1), no_mods()));
    actions.extend(engine.on_pointer_up(screen(to.0, to.1), Button::Primary, no_mods()));
    actions
}

fn pos(engine: &EngineCore, id: LayerId) -> (f64, f64) {
    let layer = engine.document().layer(&id).unwrap();
    (layer.x_pct, layer.y_pct)
}

// =============================================================
// Dragging layers
// =============================================================

#[test]
fn pointer_down_on_layer_selects_and_captures() {
    let layer = layer_at(50.0, 50.0);
    let id = layer.id;
    let mut engine = engine_with(vec![layer]);
    let actions = engine.on_pointer_down(screen(500.0, 250.0), Button::Primary, no_mods());
    assert!(actions.contains(&Action::SelectionChanged(vec![id])));
    assert!(actions.contains(&Action::CapturePointer));
    assert!(matches!(engine.input, InputState::DraggingLayer { id: drag_id, .. } if drag_id == id));
}

#[test]
fn drag_moves_by_container_percentage() {
    let layer = layer_at(50.0, 50.0);
    let id = layer.id;
    let mut engine = engine_with(vec![layer]);
    // +100px of a 1000px-wide container is +10%; -50px of 500px is -10%.
    let actions = drag(&mut engine, (500.0, 250.0), (600.0, 200.0));
    assert_eq!(pos(&engine, id), (60.0, 40.0));
    assert!(actions.contains(&Action::LayerUpdated { id, patch: LayerPatch::position(60.0, 40.0) }));
    assert!(actions.contains(&Action::ReleasePointer));
    assert!(engine.input.is_idle());
}

#[test]
fn drag_is_measured_from_gesture_start() {
    let layer = layer_at(50.0, 50.0);
    let id = layer.id;
    let mut engine = engine_with(vec![layer]);
    engine.on_pointer_down(screen(500.0, 250.0), Button::Primary, no_mods());
    engine.on_pointer_move(screen(550.0, 250.0), no_mods());
    engine.on_pointer_move(screen(520.0, 250.0), no_mods());
    assert_eq!(pos(&engine, id), (52.0, 50.0));
}

#[test]
fn drag_clamps_to_canvas_bounds() {
    let layer = layer_at(95.0, 5.0);
    let id = layer.id;
    let mut engine = engine_with(vec![layer]);
    drag(&mut engine, (950.0, 25.0), (1900.0, -400.0));
    assert_eq!(pos(&engine, id), (100.0, 0.0));
}

#[test]
fn container_is_frozen_for_the_gesture() {
    let layer = layer_at(50.0, 50.0);
    let id = layer.id;
    let mut engine = engine_with(vec![layer]);
    engine.on_pointer_down(screen(500.0, 250.0), Button::Primary, no_mods());
    engine.set_container(Rect::new(ORIGIN.0, ORIGIN.1, 2000.0, 1000.0));
    engine.on_pointer_move(screen(600.0, 250.0), no_mods());
    assert_eq!(pos(&engine, id), (60.0, 50.0));
}

#[test]
fn locked_layer_cannot_be_dragged() {
    let mut layer = layer_at(50.0, 50.0);
    layer.locked = true;
    let id = layer.id;
    let mut engine = engine_with(vec![layer]);
    drag(&mut engine, (500.0, 250.0), (700.0, 250.0));
    assert_eq!(pos(&engine, id), (50.0, 50.0));
    assert!(engine.selection().is_empty());
}

#[test]
fn secondary_button_is_ignored() {
    let layer = layer_at(50.0, 50.0);
    let mut engine = engine_with(vec![layer]);
    let actions = engine.on_pointer_down(screen(500.0, 250.0), Button::Secondary, no_mods());
    assert!(actions.is_empty());
    assert!(engine.input.is_idle());
}

#[test]
fn pointer_move_while_idle_does_nothing() {
    let mut engine = engine_with(vec![layer_at(50.0, 50.0)]);
    assert!(engine.on_pointer_move(screen(10.0, 10.0), no_mods()).is_empty());
    assert!(engine.on_pointer_up(screen(10.0, 10.0), Button::Primary, no_mods()).is_empty());
}

// =============================================================
// Selection
// =============================================================

#[test]
fn shift_click_toggles_membership() {
    let a = layer_at(20.0, 50.0);
    let b = layer_at(80.0, 50.0);
    let (a_id, b_id) = (a.id, b.id);
    let mut engine = engine_with(vec![a, b]);
    click(&mut engine, 200.0, 250.0, no_mods());
    click(&mut engine, 800.0, 250.0, shift());
    assert_eq!(engine.selection(), &[a_id, b_id]);
    click(&mut engine, 200.0, 250.0, shift());
    assert_eq!(engine.selection(), &[b_id]);
}

#[test]
fn marquee_selects_intersecting_layers() {
    let a = layer_at(20.0, 50.0);
    let b = layer_at(80.0, 50.0);
    let a_id = a.id;
    let mut engine = engine_with(vec![a, b]);
    engine.on_pointer_down(screen(10.0, 10.0), Button::Primary, no_mods());
    engine.on_pointer_move(screen(400.0, 400.0), no_mods());
    assert_eq!(engine.marquee_rect(), Some(Rect::new(10.0, 10.0, 390.0, 390.0)));
    let actions = engine.on_pointer_up(screen(400.0, 400.0), Button::Primary, no_mods());
    assert_eq!(engine.selection(), &[a_id]);
    assert!(actions.contains(&Action::SelectionChanged(vec![a_id])));
    assert!(actions.contains(&Action::ReleasePointer));
    assert_eq!(engine.marquee_rect(), None);
}

#[test]
fn shift_marquee_extends_selection() {
    let a = layer_at(20.0, 50.0);
    let b = layer_at(80.0, 50.0);
    let (a_id, b_id) = (a.id, b.id);
    let mut engine = engine_with(vec![a, b]);
    click(&mut engine, 200.0, 250.0, no_mods());
    engine.on_pointer_down(screen(600.0, 10.0), Button::Primary, shift());
    engine.on_pointer_move(screen(990.0, 490.0), shift());
    engine.on_pointer_up(screen(990.0, 490.0), Button::Primary, shift());
    assert_eq!(engine.selection(), &[a_id, b_id]);
}

#[test]
fn click_on_empty_space_clears_selection() {
    let a = layer_at(20.0, 50.0);
    let a_id = a.id;
    let mut engine = engine_with(vec![a]);
    click(&mut engine, 200.0, 250.0, no_mods());
    assert_eq!(engine.selection(), &[a_id]);
    let actions = click(&mut engine, 900.0, 50.0, no_mods());
    assert!(engine.selection().is_empty());
    assert!(actions.contains(&Action::SelectionChanged(vec![])));
}

#[test]
fn tiny_marquee_around_small_layer_selects_it() {
    // 1x1 px box centred at (500, 250).
    let mut a = layer_at(50.0, 50.0);
    a.width_pct = 0.1;
    a.height_pct = 0.2;
    let a_id = a.id;
    let mut engine = engine_with(vec![a]);
    let actions = drag(&mut engine, (498.5, 248.5), (501.0, 251.0));
    assert_eq!(engine.selection(), &[a_id]);
    assert!(actions.contains(&Action::SelectionChanged(vec![a_id])));
}

#[test]
fn tiny_marquee_over_nothing_still_clears() {
    let a = layer_at(20.0, 50.0);
    let mut engine = engine_with(vec![a]);
    click(&mut engine, 200.0, 250.0, no_mods());
    drag(&mut engine, (900.0, 50.0), (902.0, 52.0));
    assert!(engine.selection().is_empty());
}

#[test]
fn marquee_skips_locked_layers() {
    let mut a = layer_at(20.0, 50.0);
    a.locked = true;
    let mut engine = engine_with(vec![a]);
    drag(&mut engine, (0.0, 0.0), (1000.0, 500.0));
    assert!(engine.selection().is_empty());
}

// =============================================================
// Cutout dragging
// =============================================================

fn engine_with_cutout(layers: Vec<Layer>) -> EngineCore {
    let mut engine = engine_with(layers);
    engine.dispatch(Intent::SetCutout { url: Some("cut.png".into()) });
    engine.set_cutout_hit_mask(HitMask::new(2, 1, vec![255, 0]));
    engine
}

#[test]
fn dragging_cutout_moves_only_the_mask() {
    let layer = layer_at(80.0, 50.0);
    let mut engine = engine_with_cutout(vec![layer]);
    let layers_before = engine.document().layers.clone();
    let actions = drag(&mut engine, (100.0, 100.0), (50.0, 150.0));
    assert_eq!(engine.document().mask_translate_x_pct, -5.0);
    assert_eq!(engine.document().mask_translate_y_pct, 10.0);
    assert!(actions.contains(&Action::MaskMoved { x_pct: -5.0, y_pct: 10.0 }));
    assert_eq!(engine.document().layers, layers_before);
}

#[test]
fn mask_drag_is_not_clamped() {
    let mut engine = engine_with_cutout(vec![]);
    drag(&mut engine, (100.0, 100.0), (-1900.0, 100.0));
    assert_eq!(engine.document().mask_translate_x_pct, -200.0);
}

#[test]
fn locked_mask_starts_a_marquee() {
    let mut engine = engine_with_cutout(vec![]);
    engine.dispatch(Intent::ToggleMaskLock);
    engine.on_pointer_down(screen(100.0, 100.0), Button::Primary, no_mods());
    assert!(matches!(engine.input, InputState::Marquee { .. }));
}

// =============================================================
// Text editing
// =============================================================

#[test]
fn double_click_opens_editor_with_text() {
    let t = text_at(50.0, 50.0, "Hello");
    let id = t.id;
    let mut engine = engine_with(vec![t]);
    let actions = engine.on_double_click(screen(500.0, 250.0));
    assert!(actions.contains(&Action::EditTextRequested { id, text: "Hello".into() }));
    assert_eq!(engine.editing(), Some(id));
}

#[test]
fn double_click_on_shape_does_nothing() {
    let mut engine = engine_with(vec![layer_at(50.0, 50.0)]);
    assert!(engine.on_double_click(screen(500.0, 250.0)).is_empty());
    assert_eq!(engine.editing(), None);
}

#[test]
fn enter_edits_single_selected_text_layer() {
    let t = text_at(50.0, 50.0, "Hi");
    let id = t.id;
    let mut engine = engine_with(vec![t]);
    click(&mut engine, 500.0, 250.0, no_mods());
    let actions = engine.on_key_down(&Key("Enter".into()), no_mods());
    assert!(actions.contains(&Action::EditTextRequested { id, text: "Hi".into() }));
}

#[test]
fn enter_with_multiple_selected_does_nothing() {
    let a = text_at(20.0, 50.0, "a");
    let b = text_at(80.0, 50.0, "b");
    let ids = vec![a.id, b.id];
    let mut engine = engine_with(vec![a, b]);
    engine.dispatch(Intent::SelectLayers { ids });
    assert!(engine.on_key_down(&Key("Enter".into()), no_mods()).is_empty());
    assert_eq!(engine.editing(), None);
}

#[test]
fn escape_while_editing_blurs_then_commit_applies() {
    let t = text_at(50.0, 50.0, "old");
    let id = t.id;
    let mut engine = engine_with(vec![t]);
    engine.on_double_click(screen(500.0, 250.0));

    let actions = engine.on_key_down(&Key("Escape".into()), no_mods());
    assert_eq!(actions, vec![Action::BlurTextEditor { id }]);
    assert_eq!(engine.editing(), Some(id));

    // 100px tall in a 500px container is 20%.
    let actions = engine.commit_text("new\ntext".into(), 100.0);
    assert_eq!(engine.editing(), None);
    let layer = engine.document().layer(&id).unwrap();
    assert_eq!(layer.as_text().unwrap().text, "new\ntext");
    assert_eq!(layer.height_pct, 20.0);
    assert!(actions.iter().any(|a| matches!(a, Action::LayerUpdated { id: updated, .. } if *updated == id)));
}

#[test]
fn commit_with_unknown_height_keeps_box() {
    let t = text_at(50.0, 50.0, "old");
    let id = t.id;
    let mut engine = engine_with(vec![t]);
    engine.on_double_click(screen(500.0, 250.0));
    engine.commit_text("new".into(), 0.0);
    assert_eq!(engine.document().layer(&id).unwrap().height_pct, 10.0);
}

#[test]
fn commit_without_edit_is_noop() {
    let mut engine = engine_with(vec![text_at(50.0, 50.0, "x")]);
    assert!(engine.commit_text("y".into(), 10.0).is_empty());
}

#[test]
fn pointer_down_elsewhere_blurs_editor() {
    let t = text_at(50.0, 50.0, "x");
    let id = t.id;
    let mut engine = engine_with(vec![t]);
    engine.on_double_click(screen(500.0, 250.0));
    let actions = engine.on_pointer_down(screen(10.0, 10.0), Button::Primary, no_mods());
    assert_eq!(actions.first(), Some(&Action::BlurTextEditor { id }));
}

#[test]
fn keys_while_editing_belong_to_editor() {
    let t = text_at(50.0, 50.0, "x");
    let id = t.id;
    let mut engine = engine_with(vec![t]);
    engine.on_double_click(screen(500.0, 250.0));
    assert!(engine.on_key_down(&Key("Delete".into()), no_mods()).is_empty());
    assert!(engine.document().layer(&id).is_some());
}

// =============================================================
// Keyboard
// =============================================================

#[test]
fn escape_clears_selection() {
    let a = layer_at(50.0, 50.0);
    let mut engine = engine_with(vec![a]);
    click(&mut engine, 500.0, 250.0, no_mods());
    let actions = engine.on_key_down(&Key("Escape".into()), no_mods());
    assert!(engine.selection().is_empty());
    assert!(actions.contains(&Action::SelectionChanged(vec![])));
}

#[test]
fn delete_removes_selected_layers() {
    let a = layer_at(20.0, 50.0);
    let b = layer_at(80.0, 50.0);
    let (a_id, b_id) = (a.id, b.id);
    let mut engine = engine_with(vec![a, b]);
    click(&mut engine, 200.0, 250.0, no_mods());
    let actions = engine.on_key_down(&Key("Backspace".into()), no_mods());
    assert!(actions.contains(&Action::LayersRemoved(vec![a_id])));
    assert!(engine.document().layer(&a_id).is_none());
    assert!(engine.document().layer(&b_id).is_some());
    assert!(engine.selection().is_empty());
}

#[test]
fn delete_with_empty_selection_does_nothing() {
    let mut engine = engine_with(vec![layer_at(50.0, 50.0)]);
    assert!(engine.on_key_down(&Key("Delete".into()), no_mods()).is_empty());
    assert_eq!(engine.document().layers.len(), 1);
}

// =============================================================
// Dispatch
// =============================================================

#[test]
fn dispatch_reports_updates_and_render() {
    let a = layer_at(50.0, 50.0);
    let id = a.id;
    let mut engine = engine_with(vec![a]);
    let patch = LayerPatch { rotation_deg: Some(15.0), ..LayerPatch::default() };
    let actions = engine.dispatch(Intent::UpdateLayer { id, patch: patch.clone() });
    assert_eq!(actions, vec![Action::LayerUpdated { id, patch }, Action::RenderNeeded]);
}

#[test]
fn dispatch_missing_id_returns_nothing() {
    let mut engine = engine_with(vec![]);
    assert!(engine.dispatch(Intent::RemoveLayer { id: Uuid::new_v4() }).is_empty());
}
