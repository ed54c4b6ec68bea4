use std::fmt;
use std::rc::Rc;

use thiserror::Error;
use uuid::Uuid;

use crate::draw::DrawContext;
use crate::viewport::Viewport;

/// Identifies a layer entry inside a map's layer list.
pub type LayerId = Uuid;

#[derive(Error, Debug)]
pub enum LayerError {
    #[error("Layer render failed: {0}")]
    Render(String),
}

/// Something a map can paint.
///
/// By the time `render` runs, the viewport transform has already been
/// applied to `ctx`, so implementations draw in map coordinates. The call
/// is wrapped in `save` / `restore`; it must return with the state stack
/// at the depth it found it.
pub trait Layer {
    fn render(&self, ctx: &mut dyn DrawContext, viewport: &Viewport) -> Result<(), LayerError>;

    /// Name used in log output.
    fn name(&self) -> &str {
        "layer"
    }
}

/// A shared layer paired with the id it was registered under.
#[derive(Clone)]
pub struct LayerEntry {
    pub id: LayerId,
    pub layer: Rc<dyn Layer>,
}

impl LayerEntry {
    pub fn new(layer: Rc<dyn Layer>) -> Self {
        Self {
            id: Uuid::new_v4(),
            layer,
        }
    }
}

impl fmt::Debug for LayerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerEntry")
            .field("id", &self.id)
            .field("name", &self.layer.name())
            .finish()
    }
}

/// Ordered paint list. Index 0 is drawn first, so later layers end up on top.
#[derive(Debug, Clone, Default)]
pub struct LayerStack {
    layers: Vec<LayerEntry>,
}

impl LayerStack {
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Append on top of every existing layer.
    pub fn push(&mut self, layer: Rc<dyn Layer>) -> LayerId {
        let entry = LayerEntry::new(layer);
        let id = entry.id;
        self.layers.push(entry);
        id
    }

    /// Insert at `index` in paint order, clamped to the end of the list.
    pub fn insert(&mut self, index: usize, layer: Rc<dyn Layer>) -> LayerId {
        let entry = LayerEntry::new(layer);
        let id = entry.id;
        let index = index.min(self.layers.len());
        self.layers.insert(index, entry);
        id
    }

    pub fn remove(&mut self, id: LayerId) -> Option<Rc<dyn Layer>> {
        let index = self.position(id)?;
        Some(self.layers.remove(index).layer)
    }

    fn position(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|e| e.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LayerEntry> {
        self.layers.iter()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn clear(&mut self) {
        self.layers.clear();
    }
}
