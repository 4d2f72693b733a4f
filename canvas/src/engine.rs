//! Interactive editor core.
//!
//! `EngineCore` turns pointer and keyboard events into intents against a
//! [`DocStore`] and returns [`Action`]s for the host to act on. It holds no
//! reference to any UI toolkit, so the whole gesture logic is testable as
//! plain Rust.
//!
//! Pointer events arrive in screen pixels. The container rect (the on-screen
//! box the composition is shown in) converts them to container-relative
//! pixels, and the container size converts pixel deltas to percentages.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use tracing::debug;

use crate::consts::MARQUEE_CLICK_SLOP_PX;
use crate::doc::{Document, LayerId, LayerPatch};
use crate::geometry::{Point, Rect, px_to_pct};
use crate::hit::{HitMask, HitTarget, hit_test, marquee_hits};
use crate::input::{Button, InputState, Key, Modifiers, drag_pct};
use crate::store::{DocStore, Intent};

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    LayerUpdated { id: LayerId, patch: LayerPatch },
    LayersRemoved(Vec<LayerId>),
    SelectionChanged(Vec<LayerId>),
    MaskMoved { x_pct: f64, y_pct: f64 },
    /// Open the in-place editor over a text layer, seeded with its text.
    EditTextRequested { id: LayerId, text: String },
    /// Close the in-place editor; the host answers with [`EngineCore::commit_text`].
    BlurTextEditor { id: LayerId },
    /// Attach global move/up listeners for the gesture that just started.
    CapturePointer,
    /// Detach the listeners attached for the last gesture.
    ReleasePointer,
    RenderNeeded,
}

/// Editor state and gesture logic.
#[derive(Debug, Clone)]
pub struct EngineCore {
    pub store: DocStore,
    pub input: InputState,
    container: Rect,
    cutout_mask: Option<HitMask>,
}

impl EngineCore {
    #[must_use]
    pub fn new(doc: Document) -> Self {
        Self { store: DocStore::new(doc), input: InputState::Idle, container: Rect::default(), cutout_mask: None }
    }

    // --- Host inputs ---

    /// Update the on-screen container rect (screen pixels).
    pub fn set_container(&mut self, rect: Rect) {
        self.container = rect;
    }

    /// Install (or drop) the alpha grid used to hit the cutout.
    pub fn set_cutout_hit_mask(&mut self, mask: Option<HitMask>) {
        self.cutout_mask = mask;
    }

    /// Apply an intent from outside the gesture handlers (toolbar, panels).
    pub fn dispatch(&mut self, intent: Intent) -> Vec<Action> {
        let mut actions = Vec::new();
        let before = self.store.selection().to_vec();
        let patch = match &intent {
            Intent::UpdateLayer { id, patch } => Some((*id, patch.clone())),
            _ => None,
        };
        if !self.store.apply(intent) {
            return actions;
        }
        if let Some((id, patch)) = patch {
            actions.push(Action::LayerUpdated { id, patch });
        }
        self.push_selection_change(&before, &mut actions);
        actions.push(Action::RenderNeeded);
        actions
    }

    // --- Queries ---

    #[must_use]
    pub fn document(&self) -> &Document {
        self.store.document()
    }

    #[must_use]
    pub fn selection(&self) -> &[LayerId] {
        self.store.selection()
    }

    #[must_use]
    pub fn editing(&self) -> Option<LayerId> {
        self.store.editing()
    }

    #[must_use]
    pub fn container(&self) -> Rect {
        self.container
    }

    /// Active marquee rectangle in container-relative pixels.
    #[must_use]
    pub fn marquee_rect(&self) -> Option<Rect> {
        self.input.marquee_rect()
    }

    // --- Pointer ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        let mut actions = Vec::new();
        if button != Button::Primary || !self.input.is_idle() {
            return actions;
        }
        let local = self.to_local(screen_pt);
        let hit = hit_test(self.store.document(), self.cutout_mask.as_ref(), local, self.container.size());

        if let Some(editing) = self.store.editing() {
            if hit != Some(HitTarget::Layer(editing)) {
                actions.push(Action::BlurTextEditor { id: editing });
            }
        }

        match hit {
            Some(HitTarget::Layer(id)) => self.begin_layer_drag(id, screen_pt, modifiers, &mut actions),
            Some(HitTarget::Cutout) => {
                let doc = self.store.document();
                self.input = InputState::DraggingMask {
                    start: screen_pt,
                    orig_x_pct: doc.mask_translate_x_pct,
                    orig_y_pct: doc.mask_translate_y_pct,
                    container: self.container,
                };
                actions.push(Action::CapturePointer);
            }
            None => {
                let base = if modifiers.shift { self.store.selection().to_vec() } else { Vec::new() };
                self.input = InputState::Marquee { anchor: local, current: local, base };
                actions.push(Action::CapturePointer);
            }
        }
        actions
    }

    fn begin_layer_drag(&mut self, id: LayerId, screen_pt: Point, modifiers: Modifiers, actions: &mut Vec<Action>) {
        let before = self.store.selection().to_vec();
        if modifiers.shift && self.store.is_selected(&id) {
            let rest: Vec<LayerId> = before.iter().copied().filter(|s| *s != id).collect();
            self.store.apply(Intent::SelectLayers { ids: rest });
            self.push_selection_change(&before, actions);
            actions.push(Action::RenderNeeded);
            return;
        }
        if modifiers.shift {
            let mut ids = before.clone();
            ids.push(id);
            self.store.apply(Intent::SelectLayers { ids });
        } else if !self.store.is_selected(&id) {
            self.store.apply(Intent::SelectLayer { id: Some(id) });
        }
        self.push_selection_change(&before, actions);

        let Some(layer) = self.store.layer(&id) else {
            return;
        };
        self.input = InputState::DraggingLayer {
            id,
            start: screen_pt,
            orig_x_pct: layer.x_pct,
            orig_y_pct: layer.y_pct,
            container: self.container,
        };
        actions.push(Action::CapturePointer);
        actions.push(Action::RenderNeeded);
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, _modifiers: Modifiers) -> Vec<Action> {
        let mut actions = Vec::new();
        match &mut self.input {
            InputState::Idle => {}
            InputState::DraggingLayer { id, start, orig_x_pct, orig_y_pct, container } => {
                let id = *id;
                let x = drag_pct(*orig_x_pct, screen_pt.x - start.x, container.width);
                let y = drag_pct(*orig_y_pct, screen_pt.y - start.y, container.height);
                let patch = LayerPatch::position(x, y);
                if self.store.apply(Intent::UpdateLayer { id, patch: patch.clone() }) {
                    actions.push(Action::LayerUpdated { id, patch });
                    actions.push(Action::RenderNeeded);
                }
            }
            InputState::DraggingMask { start, orig_x_pct, orig_y_pct, container } => {
                let x_pct = *orig_x_pct + px_to_pct(screen_pt.x - start.x, container.width);
                let y_pct = *orig_y_pct + px_to_pct(screen_pt.y - start.y, container.height);
                if self.store.apply(Intent::SetMaskOffset { x_pct, y_pct }) {
                    actions.push(Action::MaskMoved { x_pct, y_pct });
                    actions.push(Action::RenderNeeded);
                }
            }
            InputState::Marquee { current, .. } => {
                *current = Point::new(screen_pt.x - self.container.x, screen_pt.y - self.container.y);
                actions.push(Action::RenderNeeded);
            }
        }
        actions
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point, _button: Button, _modifiers: Modifiers) -> Vec<Action> {
        let mut actions = Vec::new();
        let state = std::mem::take(&mut self.input);
        if state.is_idle() {
            return actions;
        }
        if let InputState::Marquee { anchor, base, .. } = state {
            let current = self.to_local(screen_pt);
            let rect = Rect::from_corners(anchor, current);
            let before = self.store.selection().to_vec();
            let hits = marquee_hits(self.store.document(), &rect, self.container.size());
            // A tiny marquee over nothing is a click on empty space.
            let is_click = hits.is_empty() && rect.width < MARQUEE_CLICK_SLOP_PX && rect.height < MARQUEE_CLICK_SLOP_PX;
            if is_click {
                if base.is_empty() {
                    self.store.apply(Intent::SelectLayer { id: None });
                }
            } else {
                let mut ids = base;
                for id in hits {
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
                debug!(count = ids.len(), "marquee selection");
                self.store.apply(Intent::SelectLayers { ids });
            }
            self.push_selection_change(&before, &mut actions);
        }
        actions.push(Action::ReleasePointer);
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Double-click opens the text editor on a text layer.
    pub fn on_double_click(&mut self, screen_pt: Point) -> Vec<Action> {
        let local = self.to_local(screen_pt);
        match hit_test(self.store.document(), self.cutout_mask.as_ref(), local, self.container.size()) {
            Some(HitTarget::Layer(id)) => self.start_edit(id),
            _ => Vec::new(),
        }
    }

    // --- Keyboard ---

    pub fn on_key_down(&mut self, key: &Key, _modifiers: Modifiers) -> Vec<Action> {
        if let Some(id) = self.store.editing() {
            // The in-place editor owns every other key while it is open.
            if key.is("Escape") {
                return vec![Action::BlurTextEditor { id }];
            }
            return Vec::new();
        }

        if key.is("Enter") {
            let target = match self.store.selection() {
                [id] if self.store.layer(id).is_some_and(|l| l.as_text().is_some()) => Some(*id),
                _ => None,
            };
            return target.map(|id| self.start_edit(id)).unwrap_or_default();
        }
        if key.is("Escape") {
            return self.dispatch(Intent::SelectLayer { id: None });
        }
        if key.is_delete() {
            return self.delete_selection();
        }
        Vec::new()
    }

    fn delete_selection(&mut self) -> Vec<Action> {
        let ids = self.store.selection().to_vec();
        if ids.is_empty() {
            return Vec::new();
        }
        let mut removed = Vec::with_capacity(ids.len());
        for id in ids {
            if self.store.apply(Intent::RemoveLayer { id }) {
                removed.push(id);
            }
        }
        vec![
            Action::LayersRemoved(removed),
            Action::SelectionChanged(self.store.selection().to_vec()),
            Action::RenderNeeded,
        ]
    }

    // --- Text editing ---

    fn start_edit(&mut self, id: LayerId) -> Vec<Action> {
        let mut actions = Vec::new();
        let before = self.store.selection().to_vec();
        if !self.store.apply(Intent::StartEditText { id }) {
            return actions;
        }
        let text = self.store.layer(&id).and_then(|l| l.as_text()).map(|t| t.display_text()).unwrap_or_default();
        self.push_selection_change(&before, &mut actions);
        actions.push(Action::EditTextRequested { id, text });
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Commit the in-place editor's content and its measured height (screen
    /// pixels), then close the edit. A non-positive height leaves the box as is.
    pub fn commit_text(&mut self, text: String, measured_height_px: f64) -> Vec<Action> {
        let mut actions = Vec::new();
        let Some(id) = self.store.editing() else {
            return actions;
        };
        let height_pct = px_to_pct(measured_height_px, self.container.height);
        let patch = LayerPatch {
            text: Some(text),
            rich_text: Some(None),
            height_pct: (height_pct > 0.0).then_some(height_pct),
            ..LayerPatch::default()
        };
        if self.store.apply(Intent::UpdateLayer { id, patch: patch.clone() }) {
            actions.push(Action::LayerUpdated { id, patch });
        }
        self.store.apply(Intent::StopEditText);
        actions.push(Action::RenderNeeded);
        actions
    }

    // --- Helpers ---

    fn to_local(&self, screen_pt: Point) -> Point {
        Point::new(screen_pt.x - self.container.x, screen_pt.y - self.container.y)
    }

    fn push_selection_change(&self, before: &[LayerId], actions: &mut Vec<Action>) {
        let now = self.store.selection();
        if now != before {
            actions.push(Action::SelectionChanged(now.to_vec()));
        }
    }
}
