//! Layer-model intents and the in-memory store that applies them.
//!
//! Every mutation of a composition goes through [`Intent`], a closed union
//! handled by one exhaustive reducer ([`DocStore::apply`]). The store owns
//! the [`Document`] plus the session-only state that does not belong in the
//! saved project: the current selection and the text layer being edited.
//!
//! Every intent is safe against a missing id: it is a logged no-op and
//! `apply` returns `false`. Input that would break the document's invariants
//! (duplicate layer ids, non-finite or non-positive geometry) is rejected the
//! same way.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::doc::{Document, Layer, LayerId, LayerPatch};
use crate::geometry::validate_geometry;

/// Stacking move within a layer's own `aboveMask` bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReorderDirection {
    /// One step toward the top.
    Forward,
    /// One step toward the bottom.
    Backward,
    /// To the top of the bucket.
    Front,
    /// To the bottom of the bucket.
    Back,
}

/// Every mutation the layer model accepts.
///
/// On the wire an intent is `{"type": "addLayer", ...}` with camelCase fields,
/// matching the document format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Intent {
    /// Insert a layer at the top (end) or bottom (start) of the list.
    /// Omitting `atTop` inserts at the top.
    AddLayer {
        layer: Layer,
        #[serde(default = "at_top_default")]
        at_top: bool,
    },
    UpdateLayer { id: LayerId, patch: LayerPatch },
    RemoveLayer { id: LayerId },
    Reorder { id: LayerId, direction: ReorderDirection },
    /// Replace the selection with one layer, or clear it.
    SelectLayer { id: Option<LayerId> },
    /// Replace the selection with a marquee result.
    SelectLayers { ids: Vec<LayerId> },
    SetMaskOffset { x_pct: f64, y_pct: f64 },
    StartEditText { id: LayerId },
    StopEditText,
    ToggleLock { id: LayerId },
    ToggleHide { id: LayerId },
    ToggleMaskLock,
    /// Swap in a replacement background (e.g. an upscaled version).
    SetBackground { url: String, key: Option<String> },
    /// Attach or drop the cutout produced by segmentation.
    SetCutout { url: Option<String> },
    /// Replace the whole document (e.g. loading a saved project).
    LoadDocument { document: Document },
}

fn at_top_default() -> bool {
    true
}

/// Authoritative in-memory state for one editing session.
#[derive(Debug, Clone)]
pub struct DocStore {
    doc: Document,
    selection: Vec<LayerId>,
    editing: Option<LayerId>,
}

impl DocStore {
    #[must_use]
    pub fn new(doc: Document) -> Self {
        Self { doc, selection: Vec::new(), editing: None }
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Frozen copy for export.
    #[must_use]
    pub fn snapshot(&self) -> Document {
        self.doc.clone()
    }

    #[must_use]
    pub fn selection(&self) -> &[LayerId] {
        &self.selection
    }

    #[must_use]
    pub fn is_selected(&self, id: &LayerId) -> bool {
        self.selection.contains(id)
    }

    /// The text layer currently open in the in-place editor.
    #[must_use]
    pub fn editing(&self) -> Option<LayerId> {
        self.editing
    }

    #[must_use]
    pub fn layer(&self, id: &LayerId) -> Option<&Layer> {
        self.doc.layer(id)
    }

    /// Apply one intent. Returns `true` when state changed.
    pub fn apply(&mut self, intent: Intent) -> bool {
        match intent {
            Intent::AddLayer { layer, at_top } => self.add_layer(layer, at_top),
            Intent::UpdateLayer { id, patch } => self.update_layer(&id, &patch),
            Intent::RemoveLayer { id } => self.remove_layer(&id),
            Intent::Reorder { id, direction } => self.reorder(&id, direction),
            Intent::SelectLayer { id } => self.select_layer(id),
            Intent::SelectLayers { ids } => self.select_layers(ids),
            Intent::SetMaskOffset { x_pct, y_pct } => self.set_mask_offset(x_pct, y_pct),
            Intent::StartEditText { id } => self.start_edit_text(id),
            Intent::StopEditText => self.editing.take().is_some(),
            Intent::ToggleLock { id } => self.toggle_lock(&id),
            Intent::ToggleHide { id } => self.toggle_hide(&id),
            Intent::ToggleMaskLock => {
                self.doc.mask_locked = !self.doc.mask_locked;
                true
            }
            Intent::SetBackground { url, key } => {
                self.doc.background_url = url;
                self.doc.background_key = key;
                true
            }
            Intent::SetCutout { url } => {
                if url.is_none() {
                    self.doc.mask_translate_x_pct = 0.0;
                    self.doc.mask_translate_y_pct = 0.0;
                }
                self.doc.cutout_url = url;
                true
            }
            Intent::LoadDocument { document } => self.load_document(document),
        }
    }

    fn load_document(&mut self, document: Document) -> bool {
        let mut seen = HashSet::with_capacity(document.layers.len());
        if let Some(dup) = document.layers.iter().find(|l| !seen.insert(l.id)) {
            warn!(id = %dup.id, "load_document: duplicate layer id, document rejected");
            return false;
        }
        self.doc = document;
        self.selection.clear();
        self.editing = None;
        true
    }

    fn add_layer(&mut self, layer: Layer, at_top: bool) -> bool {
        if self.doc.index_of(&layer.id).is_some() {
            debug!(id = %layer.id, "add_layer: duplicate id ignored");
            return false;
        }
        if let Err(err) = validate_geometry(&layer) {
            warn!(id = %layer.id, error = %err, "add_layer: invalid geometry rejected");
            return false;
        }
        if at_top {
            self.doc.layers.push(layer);
        } else {
            self.doc.layers.insert(0, layer);
        }
        true
    }

    fn update_layer(&mut self, id: &LayerId, patch: &LayerPatch) -> bool {
        let Some(layer) = self.doc.layer_mut(id) else {
            debug!(%id, "update_layer: missing id");
            return false;
        };
        let mut next = layer.clone();
        patch.apply_to(&mut next);
        if let Err(err) = validate_geometry(&next) {
            warn!(%id, error = %err, "update_layer: patch would leave invalid geometry");
            return false;
        }
        *layer = next;
        let hidden = layer.hidden;
        if hidden {
            self.forget(id);
        }
        true
    }

    fn remove_layer(&mut self, id: &LayerId) -> bool {
        let Some(idx) = self.doc.index_of(id) else {
            debug!(%id, "remove_layer: missing id");
            return false;
        };
        self.doc.layers.remove(idx);
        self.forget(id);
        true
    }

    /// Drop `id` from selection and end its text edit.
    fn forget(&mut self, id: &LayerId) {
        self.selection.retain(|s| s != id);
        if self.editing.as_ref() == Some(id) {
            self.editing = None;
        }
    }

    fn reorder(&mut self, id: &LayerId, direction: ReorderDirection) -> bool {
        let Some(idx) = self.doc.index_of(id) else {
            debug!(%id, "reorder: missing id");
            return false;
        };
        let above = self.doc.layers[idx].above_mask;
        // Indices of this layer's bucket, in paint order.
        let slots: Vec<usize> = self
            .doc
            .layers
            .iter()
            .enumerate()
            .filter(|(_, l)| l.above_mask == above)
            .map(|(i, _)| i)
            .collect();
        let Some(pos) = slots.iter().position(|&i| i == idx) else {
            return false;
        };
        let last = slots.len() - 1;
        let target = match direction {
            ReorderDirection::Forward => (pos + 1).min(last),
            ReorderDirection::Backward => pos.saturating_sub(1),
            ReorderDirection::Front => last,
            ReorderDirection::Back => 0,
        };
        if target == pos {
            return false;
        }
        // Bubble through bucket slots only, so the other bucket never moves.
        if target > pos {
            for k in pos..target {
                self.doc.layers.swap(slots[k], slots[k + 1]);
            }
        } else {
            for k in (target..pos).rev() {
                self.doc.layers.swap(slots[k], slots[k + 1]);
            }
        }
        true
    }

    fn select_layer(&mut self, id: Option<LayerId>) -> bool {
        let next = match id {
            Some(id) if self.is_selectable(&id) => vec![id],
            Some(id) => {
                debug!(%id, "select_layer: missing or hidden id");
                return false;
            }
            None => Vec::new(),
        };
        if next == self.selection {
            return false;
        }
        self.selection = next;
        true
    }

    fn select_layers(&mut self, ids: Vec<LayerId>) -> bool {
        let mut next: Vec<LayerId> = Vec::with_capacity(ids.len());
        for id in ids {
            if self.is_selectable(&id) && !next.contains(&id) {
                next.push(id);
            }
        }
        if next == self.selection {
            return false;
        }
        self.selection = next;
        true
    }

    fn is_selectable(&self, id: &LayerId) -> bool {
        self.doc.layer(id).is_some_and(|l| !l.hidden)
    }

    fn set_mask_offset(&mut self, x_pct: f64, y_pct: f64) -> bool {
        if !x_pct.is_finite() || !y_pct.is_finite() {
            return false;
        }
        self.doc.mask_translate_x_pct = x_pct;
        self.doc.mask_translate_y_pct = y_pct;
        true
    }

    fn start_edit_text(&mut self, id: LayerId) -> bool {
        let editable = self
            .doc
            .layer(&id)
            .is_some_and(|l| l.as_text().is_some() && l.is_interactive());
        if !editable {
            debug!(%id, "start_edit_text: not an editable text layer");
            return false;
        }
        self.editing = Some(id);
        if !self.selection.contains(&id) {
            self.selection = vec![id];
        }
        true
    }

    fn toggle_lock(&mut self, id: &LayerId) -> bool {
        let Some(layer) = self.doc.layer_mut(id) else {
            debug!(%id, "toggle_lock: missing id");
            return false;
        };
        layer.locked = !layer.locked;
        if layer.locked && self.editing.as_ref() == Some(id) {
            self.editing = None;
        }
        true
    }

    fn toggle_hide(&mut self, id: &LayerId) -> bool {
        let Some(layer) = self.doc.layer_mut(id) else {
            debug!(%id, "toggle_hide: missing id");
            return false;
        };
        layer.hidden = !layer.hidden;
        if layer.hidden {
            self.forget(id);
        }
        true
    }
}
